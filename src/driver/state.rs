//! Rung lifecycle states and checked transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one rung.
///
/// `Planned -> Encoding -> Encoded -> Fragmenting -> Done`, with `Failed`
/// reachable from `Planned`, `Encoding` and `Fragmenting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RungState {
    Planned,
    Encoding,
    Encoded,
    Fragmenting,
    Done,
    Failed,
}

impl RungState {
    pub fn can_transition_to(self, next: RungState) -> bool {
        use RungState::*;
        matches!(
            (self, next),
            (Planned, Encoding)
                | (Encoding, Encoded)
                | (Encoded, Fragmenting)
                | (Fragmenting, Done)
                | (Planned | Encoding | Fragmenting, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RungState::Done | RungState::Failed)
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: RungState) -> Result<(), StateError> {
        if !self.can_transition_to(next) {
            return Err(StateError {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for RungState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RungState::Planned => "planned",
            RungState::Encoding => "encoding",
            RungState::Encoded => "encoded",
            RungState::Fragmenting => "fragmenting",
            RungState::Done => "done",
            RungState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid rung state transition: {from} -> {to}")]
pub struct StateError {
    pub from: RungState,
    pub to: RungState,
}

impl From<StateError> for dashladder_av::Error {
    fn from(err: StateError) -> Self {
        dashladder_av::Error::Workspace(err.to_string())
    }
}
