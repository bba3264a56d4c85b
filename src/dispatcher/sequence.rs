//! Guards against stale responses and duplicate submissions

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::CommandKind;
use crate::error::CommandError;

/// A slice of state that a fetch replaces as a whole
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fetched {
    Tasks,
    Users,
}

/// Identifies one fetch of a [`Fetched`] slice
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    slice: Fetched,
    number: u64,
}

impl Ticket {
    pub fn slice(&self) -> Fetched { self.slice }
}

/// Numbers fetches, so that only the response to the latest request of a slice gets applied
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: HashMap<Fetched, u64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request. Every older ticket of this slice becomes stale
    pub fn issue(&mut self, slice: Fetched) -> Ticket {
        let number = self.latest.entry(slice).or_insert(0);
        *number += 1;
        Ticket { slice, number: *number }
    }

    /// Make every ticket issued so far for this slice stale
    pub fn invalidate(&mut self, slice: Fetched) {
        *self.latest.entry(slice).or_insert(0) += 1;
    }

    /// Whether no request for the same slice was issued after this one
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest.get(&ticket.slice) == Some(&ticket.number)
    }
}

/// The commands currently waiting for the server
#[derive(Debug, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<CommandKind>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a command as started, or refuse if the same kind of command has not finished yet.
    ///
    /// The command counts as in flight until the returned guard is dropped, which also covers commands that are abandoned before they complete.
    pub fn begin(&self, kind: CommandKind) -> Result<InFlightGuard, CommandError> {
        if lock(&self.active).insert(kind) {
            Ok(InFlightGuard { active: Arc::clone(&self.active), kind })
        } else {
            Err(CommandError::AlreadyInFlight(kind))
        }
    }

    pub fn is_active(&self, kind: CommandKind) -> bool {
        lock(&self.active).contains(&kind)
    }
}

/// Keeps a command marked as in flight while it is alive
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<CommandKind>>>,
    kind: CommandKind,
}

impl InFlightGuard {
    pub fn kind(&self) -> CommandKind { self.kind }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.kind);
    }
}

fn lock(active: &Mutex<HashSet<CommandKind>>) -> MutexGuard<'_, HashSet<CommandKind>> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
