//! Worker lifecycle state.
//!
//! ```text
//! New ──install──▶ Installing ──ok──▶ Waiting ──activate──▶ Activating ──▶ Active
//!  ▲                   │
//!  └──── Redundant ◀───┘ priming failed
//! ```
//!
//! Transitions are pure; the I/O each phase performs lives on [`super::Worker`].

use std::fmt;

use pantry_core::Error;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    New,
    Installing,
    Waiting,
    Activating,
    Active,
    /// Install failed; this version will never activate.
    Redundant,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::New => "new",
            Phase::Installing => "installing",
            Phase::Waiting => "waiting",
            Phase::Activating => "activating",
            Phase::Active => "active",
            Phase::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of one worker version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerState {
    pub phase: Phase,
    /// Identifier of the version this worker carries.
    pub version: String,
    /// Identifier that was active before this worker took over, if any.
    pub previous_version: Option<String>,
    pub skip_waiting: bool,
    pub clients_claimed: bool,
}

impl WorkerState {
    pub fn new(version: impl Into<String>, previous_version: Option<String>) -> Self {
        Self {
            phase: Phase::New,
            version: version.into(),
            previous_version,
            skip_waiting: false,
            clients_claimed: false,
        }
    }

    /// The version currently controlling clients.
    pub fn active_version(&self) -> Option<&str> {
        match self.phase {
            Phase::Active => Some(&self.version),
            _ => self.previous_version.as_deref(),
        }
    }

    pub fn begin_install(&mut self) -> Result<(), Error> {
        self.require(&[Phase::New, Phase::Redundant], "new or redundant")?;
        self.phase = Phase::Installing;
        Ok(())
    }

    /// Successful priming signals skip-waiting right away.
    pub fn install_succeeded(&mut self) -> Result<(), Error> {
        self.require(&[Phase::Installing], "installing")?;
        self.phase = Phase::Waiting;
        self.skip_waiting = true;
        Ok(())
    }

    pub fn install_failed(&mut self) -> Result<(), Error> {
        self.require(&[Phase::Installing], "installing")?;
        self.phase = Phase::Redundant;
        Ok(())
    }

    pub fn begin_activate(&mut self) -> Result<(), Error> {
        self.require(&[Phase::Waiting], "waiting")?;
        self.phase = Phase::Activating;
        Ok(())
    }

    pub fn activated(&mut self) -> Result<(), Error> {
        self.require(&[Phase::Activating], "activating")?;
        self.phase = Phase::Active;
        self.clients_claimed = true;
        Ok(())
    }

    /// Storage failed mid-activation; the version goes back to waiting.
    pub fn activation_failed(&mut self) -> Result<(), Error> {
        self.require(&[Phase::Activating], "activating")?;
        self.phase = Phase::Waiting;
        Ok(())
    }

    /// Record a skip-waiting request; returns whether activation can start now.
    pub fn request_skip_waiting(&mut self) -> bool {
        self.skip_waiting = true;
        self.phase == Phase::Waiting
    }

    fn require(&self, allowed: &[Phase], expected: &str) -> Result<(), Error> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(Error::InvalidState { expected: expected.to_string(), actual: self.phase.to_string() })
        }
    }
}
