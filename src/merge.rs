//! Incremental result merging and duplicate-key blanking.

use std::collections::HashSet;

use crate::types::{OutputRow, Subject};

/// Fold one freshly scraped record into the accumulated table.
///
/// A subject with no discovered emails still gets a single row with an
/// empty email field, so every processed subject appears in the output.
/// Otherwise the subject expands to one row per email. Existing rows
/// keep their stored order; new rows append after them, then blanking is
/// recomputed over the whole sequence.
pub fn merge_record(
    existing: Vec<OutputRow>,
    subject: &Subject,
    emails: &[String],
) -> Vec<OutputRow> {
    let identifier = subject.padded_identifier();

    let mut table = existing;
    if emails.is_empty() {
        table.push(OutputRow::new(subject.name.clone(), identifier, ""));
    } else {
        for email in emails {
            table.push(OutputRow::new(
                subject.name.clone(),
                identifier.clone(),
                email.clone(),
            ));
        }
    }
    blank_repeated_keys(&mut table);
    table
}

/// Clear name and identifier on every row whose key appeared in any
/// earlier row, not just the immediately preceding one. Keys are
/// compared as stored, so rows blanked by a prior pass carry the empty
/// key and stay blank.
fn blank_repeated_keys(rows: &mut [OutputRow]) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    for row in rows {
        if !seen.insert((row.name.clone(), row.identifier.clone())) {
            row.name.clear();
            row.identifier.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emails(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_emails_yields_single_blank_email_row() {
        let subject = Subject::new("Bob", 2);
        let table = merge_record(Vec::new(), &subject, &[]);
        assert_eq!(table, vec![OutputRow::new("Bob", "00000002", "")]);
    }

    #[test]
    fn test_one_row_per_email_with_repeats_blanked() {
        let subject = Subject::new("Alice", 1);
        let found = emails(&["a@x.com", "b@x.com", "c@x.com"]);
        let table = merge_record(Vec::new(), &subject, &found);

        assert_eq!(table.len(), 3);
        assert_eq!(table[0], OutputRow::new("Alice", "00000001", "a@x.com"));
        assert_eq!(table[1], OutputRow::new("", "", "b@x.com"));
        assert_eq!(table[2], OutputRow::new("", "", "c@x.com"));
    }

    #[test]
    fn test_distinct_subjects_both_keep_their_keys() {
        let table = merge_record(Vec::new(), &Subject::new("Alice", 1), &emails(&["a@x.com"]));
        let table = merge_record(table, &Subject::new("Bob", 2), &emails(&["b@y.com"]));

        assert_eq!(table[0], OutputRow::new("Alice", "00000001", "a@x.com"));
        assert_eq!(table[1], OutputRow::new("Bob", "00000002", "b@y.com"));
    }

    #[test]
    fn test_rerun_appends_and_blanks_second_batch() {
        // Merging the same record twice does not deduplicate emails;
        // the second batch persists with its key entirely blanked.
        let subject = Subject::new("Alice", 1);
        let found = emails(&["a@x.com", "a2@x.com"]);
        let table = merge_record(Vec::new(), &subject, &found);
        let table = merge_record(table, &subject, &found);

        assert_eq!(table.len(), 4);
        assert_eq!(table[0], OutputRow::new("Alice", "00000001", "a@x.com"));
        assert_eq!(table[1], OutputRow::new("", "", "a2@x.com"));
        assert_eq!(table[2], OutputRow::new("", "", "a@x.com"));
        assert_eq!(table[3], OutputRow::new("", "", "a2@x.com"));
    }

    #[test]
    fn test_non_contiguous_repeat_is_blanked() {
        // "Anywhere earlier", not just the adjacent row
        let subject_a = Subject::new("Alice", 1);
        let table = merge_record(Vec::new(), &subject_a, &emails(&["a@x.com"]));
        let table = merge_record(table, &Subject::new("Bob", 2), &emails(&["b@y.com"]));
        let table = merge_record(table, &subject_a, &emails(&["a3@x.com"]));

        assert_eq!(table.len(), 3);
        assert_eq!(table[2], OutputRow::new("", "", "a3@x.com"));
    }

    #[test]
    fn test_two_subject_end_to_end_table() {
        let table = merge_record(
            Vec::new(),
            &Subject::new("Alice", 1),
            &emails(&["a@x.com", "a2@x.com"]),
        );
        let table = merge_record(table, &Subject::new("Bob", 2), &[]);

        assert_eq!(
            table,
            vec![
                OutputRow::new("Alice", "00000001", "a@x.com"),
                OutputRow::new("", "", "a2@x.com"),
                OutputRow::new("Bob", "00000002", ""),
            ]
        );
    }
}
