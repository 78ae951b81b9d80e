//! Resource kinds and lifecycle states.
//!
//! Builds and jobs share one state enumeration. The command layer only reads
//! these states; transitions are performed by the workers that consume the
//! queue.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of resource a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Repository,
    Build,
    Job,
    Branch,
    Cron,
}

impl ResourceKind {
    /// Name used in error bodies and representations.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::Build => "build",
            Self::Job => "job",
            Self::Branch => "branch",
            Self::Cron => "cron",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a build or a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Created,
    Received,
    Queued,
    Started,
    Passed,
    Failed,
    Errored,
    Canceled,
}

impl State {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Received => "received",
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Errored => "errored",
            Self::Canceled => "canceled",
        }
    }

    /// `passed`, `failed`, `errored` and `canceled` end a lifecycle.
    pub const fn is_finished(self) -> bool {
        matches!(
            self,
            Self::Passed | Self::Failed | Self::Errored | Self::Canceled
        )
    }

    /// `received`, `queued` and `started`. A `created` build or job is
    /// neither running nor finished.
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Received | Self::Queued | Self::Started)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored state string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for State {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "received" => Ok(Self::Received),
            "queued" => Ok(Self::Queued),
            "started" => Ok(Self::Started),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "errored" => Ok(Self::Errored),
            "canceled" => Ok(Self::Canceled),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

/// How often a cron fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CronInterval {
    Daily,
    Weekly,
    Monthly,
}

impl CronInterval {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Seconds until the first run after creation.
    pub const fn period_secs(self) -> i64 {
        const DAY: i64 = 24 * 60 * 60;
        match self {
            Self::Daily => DAY,
            Self::Weekly => 7 * DAY,
            Self::Monthly => 30 * DAY,
        }
    }

    /// Parse a caller-supplied interval. Only the three lowercase names are
    /// accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

impl fmt::Display for CronInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
