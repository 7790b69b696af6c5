// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translates [`SupervisorEvent`]s into the protocol verbs a
//! [`crate::client::RegistrationClient`] sends to a lookup service.

use crate::supervisor::SupervisorEvent;
use gaffer_wire::Verb;

/// The supervisor → verb mapping: job_loaded/job_unloaded/process_spawned/
/// process_exited become add_job/remove_job/add_process/remove_process.
pub fn translate(event: SupervisorEvent) -> Verb {
    match event {
        SupervisorEvent::JobLoaded { name } => Verb::AddJob { name },
        SupervisorEvent::JobUnloaded { name } => Verb::RemoveJob { name },
        SupervisorEvent::ProcessSpawned { name, pid } => Verb::AddProcess { name, pid },
        SupervisorEvent::ProcessExited { name, pid } => Verb::RemoveProcess { name, pid },
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
