use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use tracing::info;

/// Email-address shape: word-delimited local part, `@`, dotted domain
/// with an alphabetic top-level label of at least two characters.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("email pattern compiles")
});

/// Scan arbitrary text for email-shaped substrings, deduplicated in
/// first-seen order.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut emails = Vec::new();
    for found in EMAIL_PATTERN.find_iter(text) {
        if seen.insert(found.as_str()) {
            emails.push(found.as_str().to_string());
        }
    }
    emails
}

/// Reduce a page to its visible text, whitespace-normalized.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let text: String = document.root_element().text().collect::<Vec<_>>().join(" ");

    // Collapse runs of whitespace to single spaces
    let mut cleaned = String::new();
    let mut prev_was_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_was_space && !cleaned.is_empty() {
                cleaned.push(' ');
                prev_was_space = true;
            }
        } else {
            cleaned.push(c);
            prev_was_space = false;
        }
    }
    cleaned.trim().to_string()
}

/// Print the emails found in a local HTML or text file, one per line.
pub fn run_extract(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let emails = extract_emails(&html_to_text(&content));
    info!("Found email id: {:?}", emails);

    if emails.is_empty() {
        println!("No emails found in {}", path.display());
    } else {
        for email in &emails {
            println!("{}", email);
        }
    }
    Ok(())
}
