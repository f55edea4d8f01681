//! Character-quota accounting for the translation service.

use tracing::{debug, warn};

use crate::Translator;

/// Character usage reported by the translation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub used: u64,
    pub limit: u64,
}

impl Usage {
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}

/// Remaining character budget, refreshed before each paper and decremented
/// as chunks are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaTracker {
    remaining: u64,
}

impl QuotaTracker {
    pub fn new(remaining: u64) -> Self {
        Self { remaining }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Whether `chars` characters fit in the remaining budget.
    pub fn can_afford(&self, chars: u64) -> bool {
        self.remaining >= chars
    }

    pub fn consume(&mut self, chars: u64) {
        self.remaining = self.remaining.saturating_sub(chars);
    }

    /// Replace the budget with a freshly fetched value.
    pub fn refresh(&mut self, remaining: u64) {
        self.remaining = remaining;
    }
}

/// Remaining characters according to the service, or `fallback_limit` when
/// usage cannot be read.
pub async fn remaining_quota<T: Translator>(translator: &T, fallback_limit: u64) -> u64 {
    match translator.usage().await {
        Ok(usage) => {
            debug!(used = usage.used, limit = usage.limit, "translation usage");
            usage.remaining()
        }
        Err(e) => {
            warn!(
                error = %e,
                fallback_limit,
                "could not read translation usage, assuming fallback limit"
            );
            fallback_limit
        }
    }
}
