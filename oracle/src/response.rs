//! Oracle response tallying

use aerosure_core::{Address, StatusCode, Timestamp};
use std::collections::HashMap;

/// One accepted oracle response
#[derive(Debug, Clone)]
pub struct OracleResponse {
    pub oracle: Address,
    pub code: StatusCode,
    pub received_at: Timestamp,
}

/// Response collection for one status request
///
/// At most one response per oracle is ever counted; later submissions from
/// the same oracle are reported back as duplicates, not recorded.
#[derive(Debug, Default)]
pub struct ResponseTally {
    responses: Vec<OracleResponse>,
    counts: HashMap<StatusCode, usize>,
}

impl ResponseTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a response; returns the new count for `code`, or None when
    /// this oracle already responded
    pub fn record(&mut self, oracle: Address, code: StatusCode) -> Option<usize> {
        if self.has_responded(&oracle) {
            return None;
        }

        self.responses.push(OracleResponse {
            oracle,
            code,
            received_at: Timestamp::now(),
        });
        let count = self.counts.entry(code).or_insert(0);
        *count += 1;
        Some(*count)
    }

    pub fn has_responded(&self, oracle: &Address) -> bool {
        self.responses.iter().any(|r| r.oracle == *oracle)
    }

    pub fn count_for(&self, code: StatusCode) -> usize {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    /// Total distinct oracles counted
    pub fn total(&self) -> usize {
        self.responses.len()
    }

    /// Code with the most responses so far
    pub fn leader(&self) -> Option<(StatusCode, usize)> {
        self.counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(code, count)| (*code, *count))
    }

    pub fn responses(&self) -> &[OracleResponse] {
        &self.responses
    }

    /// Reset for a re-opened request
    pub fn clear(&mut self) {
        self.responses.clear();
        self.counts.clear();
    }
}
