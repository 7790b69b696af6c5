// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The external contract a local process supervisor must satisfy to be
//! mirrored into a lookup service by a [`crate::client::RegistrationClient`].
//!
//! No concrete supervisor lives in this crate — it is the process-spawning
//! engine the node daemon wraps, out of scope here. Tests drive the
//! adapter and client against a small in-test double.

use gaffer_core::Pid;

/// One job the supervisor currently has loaded, with its live pids.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedJob {
    pub name: String,
    pub pids: Vec<Pid>,
}

/// An event the supervisor reports as local process state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SupervisorEvent {
    JobLoaded { name: String },
    JobUnloaded { name: String },
    ProcessSpawned { name: String, pid: Pid },
    ProcessExited { name: String, pid: Pid },
}

/// Callback a supervisor invokes for every event after a snapshot is taken.
pub type SupervisorSink = Box<dyn FnMut(SupervisorEvent) + Send>;

/// A local process supervisor, as seen by the registration client.
///
/// The single method is deliberate: snapshot and subscription must happen
/// inside one critical section on the supervisor's side, or an event for a
/// pid could be delivered (and dropped, since nothing is subscribed yet) or
/// double-delivered (once in the snapshot, once as a post-subscribe event)
/// around the moment the snapshot is taken.
pub trait Supervisor: Send + Sync {
    /// Atomically capture the current set of loaded jobs and their live
    /// pids, and register `sink` to receive every event from this instant
    /// onward. Events for pids already present in the returned snapshot
    /// must not be replayed.
    fn snapshot_and_subscribe(&self, sink: SupervisorSink) -> Vec<LoadedJob>;
}
