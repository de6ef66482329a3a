//! Store key derivation
//!
//! Keys look like `images/{stamp}-{filename}` where runs of whitespace in the
//! filename become a single hyphen. Uniqueness comes from the stamp, so the
//! stamp source must never hand out the same value twice.

use regex::Regex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

pub const KEY_PREFIX: &str = "images/";

/// Source of per-attempt uniqueness stamps.
pub trait StampSource: Send + Sync {
    /// A value strictly greater than every value previously returned.
    fn next_stamp(&self) -> u64;
}

/// Wall-clock milliseconds, bumped forward when two calls land in the same
/// millisecond or the clock steps backwards.
#[derive(Debug, Default)]
pub struct MonotonicStamps {
    last: AtomicU64,
}

impl MonotonicStamps {
    pub fn new() -> Self {
        Self::default()
    }

    fn now_millis() -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

impl StampSource for MonotonicStamps {
    fn next_stamp(&self) -> u64 {
        let now = Self::now_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => last = observed,
            }
        }
    }
}

/// Key of one blob, owned by a single ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn derive(stamp: u64, filename: &str) -> Self {
        Self(format!("{}{}-{}", KEY_PREFIX, stamp, sanitize_filename(filename)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoreKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[\s/\\]+").expect("separator pattern is valid"))
}

/// Replace each run of whitespace or path separators with `-`.
/// The result is always a single key segment.
pub fn sanitize_filename(filename: &str) -> String {
    separators().replace_all(filename.trim(), "-").into_owned()
}
