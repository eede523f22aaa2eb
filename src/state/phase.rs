/// Crawl phase definitions for the engine state machine
///
/// The engine moves strictly forward: `Idle → Running → Draining → Done`.
/// `Running → Done` is also allowed for a cancelled run, and `Idle → Done`
/// for a run torn down before it started.
use std::fmt;

/// Represents the lifecycle phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Engine constructed, no URL processed yet
    Idle,

    /// Main loop is popping and processing frontier entries
    Running,

    /// Frontier is empty; the session is being closed and state flushed
    Draining,

    /// Teardown finished
    Done,
}

impl CrawlPhase {
    /// Returns true if the engine may move from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Done)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Done)
                | (Self::Draining, Self::Done)
        )
    }

    /// Returns true once teardown has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
