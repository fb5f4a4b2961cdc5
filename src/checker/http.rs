// src/checker/http.rs
// =============================================================================
// This module checks if web links are alive by making HTTP requests.
//
// Key functionality:
// - Every distinct URL is fetched at most ONCE per run, no matter how many
//   documents link to it. Results live in a shared cache.
// - Concurrent checks of the same URL don't race: the first one fetches,
//   the others wait for its answer.
// - Only HTTP 200 proves a link alive. Rate limiting (HTTP 429) and other
//   2xx answers are retried, with backoff for 429, up to 5 attempts.
// - The exclusions file can declare HTTP/429 and HTTP/403 acceptable.
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - tokio::sync::OnceCell: A value computed once; everyone else awaits it
// - Arc: Shared ownership, so a cache slot outlives the lock that found it
// =============================================================================

use parking_lot::Mutex;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use super::finding::{Finding, Findings};
use crate::error::Result;
use crate::exclusions::ExclusionStore;

/// How many times a URL is tried before giving up.
pub const MAX_ATTEMPTS: usize = 5;

/// Pause between two attempts at the same URL, on top of any backoff.
const SETTLE_DELAY: Duration = Duration::from_millis(100);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The resolved answer for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlOutcome {
    /// The server answered with this status code
    Status(u16),
    /// No definitive answer within the retry budget
    Unresolved,
}

// A slot that is present but not yet initialized is a pending fetch.
type Slot = Arc<OnceCell<UrlOutcome>>;

/// URL -> outcome, shared by every check in a run.
#[derive(Debug, Default)]
pub struct UrlCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl UrlCache {
    /// Returns the slot for `url`, creating an empty (pending) one if needed.
    /// Lookup and insertion happen under one lock, so two callers always get
    /// the same slot.
    fn slot(&self, url: &str) -> Slot {
        self.slots.lock().entry(url.to_string()).or_default().clone()
    }

    /// The resolved outcome for `url`, if any.
    pub fn get(&self, url: &str) -> Option<UrlOutcome> {
        self.slots.lock().get(url).and_then(|slot| slot.get().copied())
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks web links, remembering every answer for the rest of the run.
#[derive(Debug)]
pub struct UrlValidator {
    client: Client,
    cache: UrlCache,
    ignore_429: bool,
    ignore_403: bool,
    max_attempts: usize,
    settle_delay: Duration,
}

impl UrlValidator {
    /// Creates a validator sending `user_agent` and honoring the HTTP
    /// sentinels found in `rules`.
    pub fn new(user_agent: &str, rules: &ExclusionStore) -> Result<Self> {
        // We reuse this client for all requests (connection pooling)
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            cache: UrlCache::default(),
            ignore_429: rules.ignores_429(),
            ignore_403: rules.ignores_403(),
            max_attempts: MAX_ATTEMPTS,
            settle_delay: SETTLE_DELAY,
        })
    }

    /// Overrides the pause between attempts (tests use a tiny one).
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn cache(&self) -> &UrlCache {
        &self.cache
    }

    /// Checks `url`, linked from `file` (already relative to the crawl root).
    ///
    /// Returns whether the link is acceptable. A broken link is recorded in
    /// `findings`, once per call, so every referencing document gets its own
    /// finding even though the network is only asked once.
    pub async fn validate(&self, url: &str, file: &str, findings: &Findings) -> bool {
        let slot = self.cache.slot(url);
        let outcome = *slot.get_or_init(|| self.fetch(url, file)).await;

        match outcome {
            UrlOutcome::Status(status) if self.is_acceptable(status) => true,
            UrlOutcome::Status(status) => {
                findings.push(Finding::UrlUnreachable {
                    url: url.to_string(),
                    file: file.to_string(),
                    status,
                });
                false
            }
            UrlOutcome::Unresolved => {
                findings.push(Finding::UrlUnresolved {
                    url: url.to_string(),
                    file: file.to_string(),
                    attempts: self.max_attempts,
                });
                false
            }
        }
    }

    fn is_acceptable(&self, status: u16) -> bool {
        match status {
            200 => true,
            429 => self.ignore_429,
            403 => self.ignore_403,
            _ => false,
        }
    }

    // The network phase. Only ever runs once per URL per run.
    async fn fetch(&self, url: &str, file: &str) -> UrlOutcome {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Not a valid URL {}: {}", url, e);
                return UrlOutcome::Unresolved;
            }
        };

        info!("Verifying {} for {}", url, file);
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                info!("Retrying {} for {}, attempt #{}", url, file, attempt);
            }

            let mut backoff = Duration::ZERO;
            match self.client.get(parsed.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::OK {
                        return UrlOutcome::Status(status.as_u16());
                    }
                    if status.is_success() {
                        // 204, 206 and friends are neither proof nor failure
                        debug!("HTTP/{} for {}, trying again", status.as_u16(), url);
                    } else if status != StatusCode::TOO_MANY_REQUESTS || self.ignore_429 {
                        // a definitive error answer
                        return UrlOutcome::Status(status.as_u16());
                    } else {
                        backoff = rate_limit_backoff(&response, attempt, self.max_attempts, url);
                    }
                }
                Err(e) => {
                    debug!("Request to {} failed: {}", url, e);
                }
            }

            if attempt + 1 < self.max_attempts {
                tokio::time::sleep(self.settle_delay + backoff).await;
            }
        }

        UrlOutcome::Unresolved
    }
}

// How long to wait after a 429, from the response's Retry-After header.
fn rate_limit_backoff(
    response: &reqwest::Response,
    attempt: usize,
    max_attempts: usize,
    url: &str,
) -> Duration {
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let backoff = backoff_for(attempt, max_attempts, retry_after);
    info!(
        "HTTP/429 for {}, requested retry after {}s, sleeping for {:.1}s",
        url,
        retry_after,
        backoff.as_secs_f64()
    );
    backoff
}

// The server's Retry-After hint, scaled up as attempts go by.
fn backoff_for(attempt: usize, max_attempts: usize, retry_after_secs: u64) -> Duration {
    let scale = (attempt + 1) as f64 / max_attempts as f64;
    Duration::from_secs_f64(retry_after_secs as f64 * scale)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a OnceCell per URL instead of a plain HashMap<String, u16>?
//    - With a plain map, two tasks could both see "no entry" and both fetch
//    - Here the map only hands out slots; the slot itself guarantees that
//      exactly one initializer runs while everyone else awaits its result
//    - Waiting is a real async wait, not a sleep-and-poll loop
//
// 2. Why is the Mutex never held across an .await?
//    - slot() clones the Arc and drops the lock immediately
//    - Holding a blocking lock across an await could stall the runtime
//
// 3. What does *slot.get_or_init(...).await do?
//    - get_or_init returns &UrlOutcome; UrlOutcome is Copy so we deref it
// -----------------------------------------------------------------------------
