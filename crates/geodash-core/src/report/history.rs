// ── Report history ──

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::model::ReportRecord;

/// The most recent report summaries, oldest evicted first.
#[derive(Debug)]
pub struct ReportHistory {
    limit: usize,
    records: Mutex<VecDeque<ReportRecord>>,
}

impl ReportHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            records: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, record: ReportRecord) {
        if self.limit == 0 {
            return;
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        while records.len() >= self.limit {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Oldest first.
    pub fn records(&self) -> Vec<ReportRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
