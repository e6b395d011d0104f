//! Severity levels and the persistence threshold
//!
//! Pure mapping from level names to ranks. No I/O happens here, so the policy
//! can be exercised without a store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordinal severity of a suite log event
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    /// All levels, least severe first
    pub const ALL: [Severity; 4] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
    ];

    /// Parse a level name, ignoring case and surrounding whitespace
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Severity::Debug),
            "INFO" => Some(Severity::Info),
            "WARNING" => Some(Severity::Warning),
            "ERROR" => Some(Severity::Error),
            _ => None,
        }
    }

    /// Resolve a level name, falling back to `Info` for unknown names.
    ///
    /// The returned flag is `false` when the name was not recognized.
    pub fn normalize(name: &str) -> (Self, bool) {
        match Self::parse(name) {
            Some(level) => (level, true),
            None => (Severity::Info, false),
        }
    }

    /// Uppercase name as stored in the log
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }

    /// Lowercase name as used by the settings record
    pub fn setting_name(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Severity::Debug => 0,
            Severity::Info => 1,
            Severity::Warning => 2,
            Severity::Error => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank of a level name; unknown names rank as `INFO`
pub fn rank(level: &str) -> u8 {
    Severity::normalize(level).0.rank()
}

/// Whether an event at `incoming` passes the configured `minimum`.
///
/// Ties are inclusive.
pub fn should_persist(incoming: &str, minimum: &str) -> bool {
    rank(incoming) >= rank(minimum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_known_levels() {
        assert_eq!(rank("DEBUG"), 0);
        assert_eq!(rank("INFO"), 1);
        assert_eq!(rank("WARNING"), 2);
        assert_eq!(rank("ERROR"), 3);
    }

    #[test]
    fn test_rank_is_case_insensitive() {
        assert_eq!(rank("debug"), 0);
        assert_eq!(rank("Warning"), 2);
        assert_eq!(rank(" error "), 3);
    }

    #[test]
    fn test_rank_unknown_is_info() {
        assert_eq!(rank("bogus"), 1);
        assert_eq!(rank(""), 1);
        // Only the full name is accepted
        assert_eq!(rank("WARN"), 1);
    }

    #[test]
    fn test_should_persist_matches_rank_order() {
        for incoming in Severity::ALL {
            for minimum in Severity::ALL {
                assert_eq!(
                    should_persist(incoming.as_str(), minimum.setting_name()),
                    incoming.rank() >= minimum.rank(),
                    "incoming={} minimum={}",
                    incoming,
                    minimum
                );
            }
        }
    }

    #[test]
    fn test_should_persist_unknown_behaves_like_info() {
        assert!(should_persist("bogus", "info"));
        assert_eq!(
            should_persist("bogus", "warning"),
            should_persist("info", "warning")
        );
        assert!(!should_persist("bogus", "error"));
    }

    #[test]
    fn test_should_persist_unknown_minimum_is_info() {
        assert!(!should_persist("DEBUG", "verbose"));
        assert!(should_persist("INFO", "verbose"));
    }

    #[test]
    fn test_normalize_reports_recognition() {
        assert_eq!(Severity::normalize("error"), (Severity::Error, true));
        assert_eq!(Severity::normalize("FATAL"), (Severity::Info, false));
    }

    #[test]
    fn test_ordering_follows_rank() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_serde_uses_uppercase_names() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
        let parsed: Severity = serde_json::from_str("\"DEBUG\"").unwrap();
        assert_eq!(parsed, Severity::Debug);
    }
}
