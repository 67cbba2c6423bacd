use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for one mirror run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorReport {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Items yielded by the source listing, errors included.
    pub listed: u64,
    /// Objects passed over without any lookup: inside the skip count, or
    /// the run key's own safety marker.
    pub excluded: u64,
    /// Objects whose destination content hash already matched.
    pub skipped: u64,
    /// Objects written to the destination.
    pub copied: u64,
    /// Bytes written to the destination.
    pub bytes_copied: u64,
    /// Per-object errors reported during the run.
    pub errors: u64,
}

impl MirrorReport {
    pub(crate) fn begin(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            elapsed: Duration::ZERO,
            listed: 0,
            excluded: 0,
            skipped: 0,
            copied: 0,
            bytes_copied: 0,
            errors: 0,
        }
    }

    /// Returns `true` if no object failed.
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

impl fmt::Display for MirrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "copied {} objects. {} errors. duration: {:?}",
            self.copied, self.errors, self.elapsed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line() {
        let mut report = MirrorReport::begin(Utc::now());
        report.copied = 2;
        report.errors = 1;
        report.elapsed = Duration::from_millis(1500);
        assert_eq!(report.to_string(), "copied 2 objects. 1 errors. duration: 1.5s");
        assert!(!report.is_clean());
    }

    #[test]
    fn serializes_counters() {
        let report = MirrorReport::begin(Utc::now());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["copied"], 0);
        assert_eq!(json["errors"], 0);
        assert!(json.get("started_at").is_some());
    }
}
