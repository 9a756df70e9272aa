//! Search query construction and progressive narrowing.
//!
//! When a query turns up no emails, it is narrowed one step at a time:
//! long queries collapse to first + second-to-last + last word, then the
//! leading word is dropped. Two words or fewer cannot be narrowed.

use crate::types::Subject;

/// Maximum total search attempts per subject (initial query plus
/// fallbacks). The chain never loops and never revisits a query.
pub const MAX_ATTEMPTS: usize = 3;

/// Build the initial query: display name followed by the zero-padded
/// identifier.
pub fn initial_query(subject: &Subject) -> String {
    format!("{} {}", subject.name, subject.padded_identifier())
}

/// Narrow a failed query one step, or signal exhaustion.
///
/// Two or fewer words are terminal regardless of how that count was
/// reached.
pub fn next_fallback_query(prev: &str) -> Option<String> {
    let tokens: Vec<&str> = prev.split_whitespace().collect();
    match tokens.len() {
        n if n >= 4 => Some(format!(
            "{} {} {}",
            tokens[0],
            tokens[n - 2],
            tokens[n - 1]
        )),
        3 => Some(format!("{} {}", tokens[1], tokens[2])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_query_pads_identifier() {
        let subject = Subject::new("Jane Doe", 7);
        assert_eq!(initial_query(&subject), "Jane Doe 00000007");
    }

    #[test]
    fn test_fallback_keeps_first_and_last_two() {
        // 5 tokens: first, second-to-last, last
        assert_eq!(
            next_fallback_query("Jane Doe Something Else 00000007").as_deref(),
            Some("Jane Else 00000007")
        );
    }

    #[test]
    fn test_fallback_drops_leading_word_at_three() {
        assert_eq!(
            next_fallback_query("Jane Else 00000007").as_deref(),
            Some("Else 00000007")
        );
    }

    #[test]
    fn test_two_words_are_terminal() {
        assert_eq!(next_fallback_query("Else 00000007"), None);
        assert_eq!(next_fallback_query("00000007"), None);
        assert_eq!(next_fallback_query(""), None);
    }

    #[test]
    fn test_chain_from_long_query_takes_two_steps() {
        let first = next_fallback_query("Jane Alice Doe Something Else 00000007").unwrap();
        assert_eq!(first, "Jane Else 00000007");
        let second = next_fallback_query(&first).unwrap();
        assert_eq!(second, "Else 00000007");
        assert_eq!(next_fallback_query(&second), None);
    }
}
