//! Rolling activity log shown at the bottom of the dashboard.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use log::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub at: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

/// Keeps the most recent `capacity` entries; every entry is also forwarded
/// to the `log` facade.
#[derive(Debug)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => error!("{}", message),
            Severity::Info | Severity::Success => info!("{}", message),
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ActivityEntry {
            at: Local::now(),
            severity,
            message,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Severity::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ActivityEntry> {
        self.entries.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_most_recent_entries() {
        let mut log = ActivityLog::new(50);
        for i in 0..60 {
            log.info(format!("entry {}", i));
        }
        assert_eq!(log.len(), 50);
        assert_eq!(log.entries().next().unwrap().message, "entry 10");
        assert_eq!(log.last().unwrap().message, "entry 59");
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = ActivityLog::default();
        log.error("boom");
        log.clear();
        assert!(log.is_empty());
    }
}
