//! The status enum shared by Posting and JobRecord.

use serde::{Deserialize, Serialize};

/// Lifecycle status. The same identifiers apply to both `Posting` and
/// `JobRecord`; some transitions are only ever reached on one of the two
/// (e.g. a `Posting` has no `tries_remaining`, so it never bounces back
/// from `errored_out`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Waiting,
    Executing,
    Done,
    ErroredOut,
    Paused,
    Cancelled,
}

impl Status {
    /// `done`, `errored_out`, `cancelled` — no further transitions occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Done | Status::ErroredOut | Status::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Waiting => "waiting",
            Status::Executing => "executing",
            Status::Done => "done",
            Status::ErroredOut => "errored_out",
            Status::Paused => "paused",
            Status::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for Status {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Status::Waiting),
            "executing" => Ok(Status::Executing),
            "done" => Ok(Status::Done),
            "errored_out" => Ok(Status::ErroredOut),
            "paused" => Ok(Status::Paused),
            "cancelled" => Ok(Status::Cancelled),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(Status::Done.is_terminal());
        assert!(Status::ErroredOut.is_terminal());
        assert!(Status::Cancelled.is_terminal());
        assert!(!Status::Waiting.is_terminal());
        assert!(!Status::Executing.is_terminal());
        assert!(!Status::Paused.is_terminal());
    }

    #[test]
    fn round_trips_through_str() {
        for s in [
            Status::Waiting,
            Status::Executing,
            Status::Done,
            Status::ErroredOut,
            Status::Paused,
            Status::Cancelled,
        ] {
            let parsed: Status = s.as_str().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }
}
