//! Search-page fetching with proxy rotation and bounded retry.

use std::fs;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rand::{thread_rng, Rng};
use tracing::{info, warn};

pub const SEARCH_URL: &str = "https://www.google.com/search";

const USER_AGENT: &str = "Mozilla/5.0 (compatible; EmailScrape/0.1)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded retry with exponential backoff. Replaces the retry-forever
/// loop this tool once relied on; exhausting the cap is an error the
/// caller sees.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    limit: usize,
    base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(limit: usize, base_delay: Duration) -> Self {
        Self {
            limit: limit.max(1),
            base_delay_ms: base_delay.as_millis().max(1) as u64,
        }
    }

    /// Backoff before retrying after the given 1-based failed attempt.
    fn backoff(&self, attempt: usize) -> Duration {
        let doublings = attempt.saturating_sub(1).min(16) as u32;
        Duration::from_millis(self.base_delay_ms.saturating_mul(1 << doublings))
    }
}

/// One outbound proxy endpoint from the rotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProxyEntry {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl ProxyEntry {
    fn url(&self) -> String {
        format!(
            "http://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Pool of outbound proxies; a random entry is chosen per attempt.
pub struct ProxyPool {
    entries: Vec<ProxyEntry>,
}

impl ProxyPool {
    /// Load a pool from a file of `host:port:username:password` lines.
    /// Blank lines and `#` comments are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read proxy file: {}", path.display()))?;
        let entries = parse_proxy_lines(&content)
            .with_context(|| format!("Failed to parse proxy file: {}", path.display()))?;
        if entries.is_empty() {
            bail!("No proxies found in {}", path.display());
        }
        info!("Loaded {} proxies from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    fn choose(&self) -> &ProxyEntry {
        let idx = thread_rng().gen_range(0..self.entries.len());
        &self.entries[idx]
    }
}

fn parse_proxy_lines(content: &str) -> Result<Vec<ProxyEntry>> {
    let mut entries = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() != 4 {
            bail!(
                "Line {}: expected host:port:username:password, got {:?}",
                lineno + 1,
                line
            );
        }
        let port: u16 = parts[1]
            .parse()
            .with_context(|| format!("Line {}: invalid port {:?}", lineno + 1, parts[1]))?;
        entries.push(ProxyEntry {
            host: parts[0].to_string(),
            port,
            username: parts[2].to_string(),
            password: parts[3].to_string(),
        });
    }
    Ok(entries)
}

/// Fetches search result pages, one fresh client (and fresh randomly
/// chosen proxy) per attempt.
pub struct PageFetcher {
    proxies: Option<ProxyPool>,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(proxies: Option<ProxyPool>, policy: RetryPolicy) -> Self {
        Self { proxies, policy }
    }

    /// Fetch the result page for a query, retrying up to the policy cap.
    pub fn fetch_search_page(&self, query: &str) -> Result<String> {
        info!("Searching: {}", query);
        let mut attempt = 0usize;
        let mut rng = thread_rng();
        loop {
            attempt += 1;
            match self.try_fetch(query) {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if attempt >= self.policy.limit {
                        return Err(err).with_context(|| {
                            format!("Search failed after {} attempts: {}", attempt, query)
                        });
                    }
                    warn!("Request failed ({:#}), trying again", err);
                    let jitter = rng.gen_range(0..=self.policy.base_delay_ms);
                    sleep(self.policy.backoff(attempt) + Duration::from_millis(jitter));
                }
            }
        }
    }

    fn try_fetch(&self, query: &str) -> Result<String> {
        let client = self.build_client()?;
        let response = client
            .get(SEARCH_URL)
            .query(&[("q", query)])
            .send()
            .with_context(|| format!("Failed to fetch search page for: {}", query))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Search returned status {}", status);
        }
        response.text().context("Failed to read search response")
    }

    fn build_client(&self) -> Result<reqwest::blocking::Client> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT);

        if let Some(pool) = &self.proxies {
            let entry = pool.choose();
            info!("Proxy in use: {}:{}", entry.host, entry.port);
            builder = builder.proxy(
                reqwest::Proxy::all(entry.url())
                    .with_context(|| format!("Invalid proxy {}:{}", entry.host, entry.port))?,
            );
        }

        builder.build().context("Failed to build HTTP client")
    }
}
