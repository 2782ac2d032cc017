//! HTTP handlers for the purchases API.

pub mod purchases;
