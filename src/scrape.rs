use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};

use crate::extract::{extract_emails, html_to_text};
use crate::fetch::{PageFetcher, ProxyPool, RetryPolicy};
use crate::merge::merge_record;
use crate::query::{initial_query, next_fallback_query, MAX_ATTEMPTS};
use crate::store;
use crate::types::Subject;

/// Explicit run configuration; there is no ambient state beyond the
/// output file itself.
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub proxies: Option<PathBuf>,
    pub fresh: bool,
    pub retry_limit: usize,
    pub retry_base_ms: u64,
    pub quiet: bool,
}

pub fn run_scrape(config: &RunConfig) -> Result<()> {
    let subjects = store::read_subjects(&config.input)?;
    if subjects.is_empty() {
        println!("No subjects in {}", config.input.display());
        return Ok(());
    }

    let proxies = match &config.proxies {
        Some(path) => Some(ProxyPool::load(path)?),
        None => None,
    };
    let policy = RetryPolicy::new(
        config.retry_limit,
        Duration::from_millis(config.retry_base_ms),
    );
    let fetcher = PageFetcher::new(proxies, policy);

    let output_path = if config.fresh {
        store::fresh_output_path(&config.output)
    } else {
        config.output.clone()
    };

    let total = subjects.len();
    for (index, subject) in subjects.iter().enumerate() {
        if !config.quiet {
            println!(
                "[{:02}/{:02}] Searching: {} {}",
                index + 1,
                total,
                subject.name,
                subject.padded_identifier()
            );
        }

        let emails = match discover_emails(&fetcher, subject) {
            Ok(emails) => emails,
            Err(err) => {
                error!(
                    "Giving up on {} {}: {:#}",
                    subject.name,
                    subject.padded_identifier(),
                    err
                );
                eprintln!("  Error: {:#}", err);
                continue;
            }
        };

        if !config.quiet {
            if emails.is_empty() {
                println!("  No emails found");
            } else {
                println!("  Found {}: {}", emails.len(), emails.join(", "));
            }
        }

        // Read-modify-write the whole table so progress survives the run
        let table = store::read_table(&output_path)?;
        let table = merge_record(table, subject, &emails);
        if store::write_table_with_prompt(&output_path, &table)? {
            info!("Saved {} rows to {}", table.len(), output_path.display());
        }
    }

    if !config.quiet {
        println!("Done! Results in {}", output_path.display());
    }
    Ok(())
}

/// Walk the query chain for one subject until emails turn up or the
/// chain is exhausted. At most three attempts; queries never repeat.
fn discover_emails(fetcher: &PageFetcher, subject: &Subject) -> Result<Vec<String>> {
    let mut query = initial_query(subject);
    for attempt in 1..=MAX_ATTEMPTS {
        let page = fetcher.fetch_search_page(&query)?;
        let emails = extract_emails(&html_to_text(&page));
        if !emails.is_empty() {
            info!("Found email id: {:?}", emails);
            return Ok(emails);
        }
        if attempt == MAX_ATTEMPTS {
            break;
        }
        match next_fallback_query(&query) {
            Some(narrowed) => query = narrowed,
            None => break,
        }
    }
    Ok(Vec::new())
}
