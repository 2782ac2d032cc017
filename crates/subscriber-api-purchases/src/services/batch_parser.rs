//! Splitting of raw batch bodies into numbered rows.

use crate::models::RawRow;

/// One non-blank line of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLine {
    /// 1-based position in the body, blank lines included.
    pub number: usize,
    /// Tab-split fields with empty strings mapped to `None`.
    pub fields: RawRow,
}

/// Split a batch body into lines.
///
/// Lines are separated by `\n`. A line is skipped only when it is empty
/// before carriage returns are stripped, so a lone `\r` still yields a
/// (malformed) row.
pub fn split_batch(body: &str) -> impl Iterator<Item = BatchLine> + '_ {
    body.split('\n')
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(index, line)| BatchLine {
            number: index + 1,
            fields: split_fields(line),
        })
}

/// Strip carriage returns, split on tabs and map empty fields to `None`.
pub fn split_fields(line: &str) -> RawRow {
    line.replace('\r', "")
        .split('\t')
        .map(|field| (!field.is_empty()).then(|| field.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_numbers_count_blank_lines() {
        let lines: Vec<_> = split_batch("a\tb\n\nc\n").collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[1].number, 3);
    }

    #[test]
    fn test_trailing_newline_is_ignored() {
        assert_eq!(split_batch("a\n").count(), 1);
        assert_eq!(split_batch("").count(), 0);
        assert_eq!(split_batch("\n\n").count(), 0);
    }

    #[test]
    fn test_carriage_returns_are_stripped() {
        let lines: Vec<_> = split_batch("a\tb\r\nc\r\td\r\n").collect();
        assert_eq!(
            lines[0].fields,
            vec![Some("a".to_string()), Some("b".to_string())]
        );
        assert_eq!(
            lines[1].fields,
            vec![Some("c".to_string()), Some("d".to_string())]
        );
    }

    #[test]
    fn test_lone_carriage_return_is_a_row() {
        let lines: Vec<_> = split_batch("\r\n").collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].fields, vec![None]);
    }

    #[test]
    fn test_empty_fields_become_none() {
        assert_eq!(
            split_fields("a\t\tc\t"),
            vec![Some("a".to_string()), None, Some("c".to_string()), None]
        );
    }

    #[test]
    fn test_spaces_are_kept() {
        assert_eq!(split_fields(" \t1 Main St"), vec![
            Some(" ".to_string()),
            Some("1 Main St".to_string())
        ]);
    }
}
