// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The registry: an in-memory, event-emitting directory of nodes, sessions,
//! jobs, and process identifiers.
//!
//! All operations are synchronous and non-suspending; the caller (the
//! lookup endpoint's connection loop) is responsible for keeping every
//! mutation on a single scheduling context so no internal locking is
//! required here.

use crate::bus::{Bus, SubscriptionId};
use crate::clock::{Clock, SystemClock};
use crate::conn::ConnId;
use crate::error::RegistryError;
use crate::event::Event;
use crate::node::{session_of, Node, Pid};
use crate::remote_job::RemoteJob;
use indexmap::IndexMap;
use std::collections::HashMap;

/// In-memory directory of nodes, sessions, jobs, and processes.
///
/// Generic over [`Clock`] so tests can drive `created_at`/`updated_at`
/// deterministically; production code uses the default [`SystemClock`].
pub struct Registry<C: Clock = SystemClock> {
    clock: C,
    nodes: IndexMap<ConnId, Node>,
    /// `(hostname, port) -> conn_id` for identified nodes, enforcing
    /// uniqueness without a linear scan on every `identify`.
    host_port_index: HashMap<(String, u16), ConnId>,
    /// job_name -> ordered list of conn_ids currently hosting it. The key
    /// order is the job name's first-appearance order fleet-wide; the
    /// `Vec` order is the order nodes added the job.
    job_order: IndexMap<String, Vec<ConnId>>,
    /// (conn_id, job_name) -> pids currently believed live for that row.
    job_pids: HashMap<(ConnId, String), Vec<Pid>>,
    bus: Bus,
}

impl Registry<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Registry<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Registry<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            nodes: IndexMap::new(),
            host_port_index: HashMap::new(),
            job_order: IndexMap::new(),
            job_pids: HashMap::new(),
            bus: Bus::new(),
        }
    }

    // -- subscriptions --------------------------------------------------

    pub fn bind_all(&mut self, callback: impl FnMut(&Event) + Send + 'static) -> SubscriptionId {
        self.bus.bind_all(callback)
    }

    pub fn bind(
        &mut self,
        event: &'static str,
        callback: impl FnMut(&Event) + Send + 'static,
    ) -> SubscriptionId {
        self.bus.bind(event, callback)
    }

    pub fn unbind(&mut self, id: SubscriptionId) {
        self.bus.unbind(id)
    }

    fn emit(&mut self, event: Event) {
        self.bus.dispatch(&event);
    }

    // -- node lifecycle ---------------------------------------------------

    /// Insert a new, unidentified node. Fails [`RegistryError::DuplicateNode`]
    /// if `conn_id` is already present.
    pub fn add_node(&mut self, conn_id: ConnId) -> Result<(), RegistryError> {
        if self.nodes.contains_key(&conn_id) {
            return Err(RegistryError::DuplicateNode);
        }
        let node = Node::new(conn_id, self.clock.epoch_ms());
        self.nodes.insert(conn_id, node.clone());
        self.emit(Event::AddNode { node });
        Ok(())
    }

    /// Remove a node, cascading removal of every job it held. No-op if
    /// `conn_id` is unknown.
    ///
    /// For each held job, drains its pids (emitting `remove_process` per
    /// pid, in `add_process` order) before emitting that job's `remove_job`,
    /// so a subscriber tracking process-level state sees a clean unwind
    /// rather than jobs vanishing with live pids still attached. A final
    /// `remove_node` carries the now-empty-sessions snapshot.
    pub fn remove_node(&mut self, conn_id: ConnId) {
        let Some(node) = self.nodes.get(&conn_id) else { return };
        for (_session, job_name) in node.job_pairs() {
            let pids = self
                .job_pids
                .get(&(conn_id, job_name.clone()))
                .cloned()
                .unwrap_or_default();
            for pid in pids {
                // `remove_process` is idempotent on an absent pid, so this
                // cannot fail once we know the row existed above.
                let _ = self.remove_process(conn_id, &job_name, pid);
            }
            // The node is guaranteed to hold this job; a JobNotFound here
            // would indicate a sessions/job_order desync.
            let _ = self.remove_job(conn_id, &job_name);
        }

        let Some(mut node) = self.nodes.shift_remove(&conn_id) else { return };
        if node.identified {
            self.host_port_index.remove(&(node.hostname.clone(), node.port));
        }
        node.sessions.clear();
        self.emit(Event::RemoveNode { node });
    }

    /// Complete identification of a connection. Fails [`RegistryError::NoIdent`]
    /// if `conn_id` is unknown, [`RegistryError::AlreadyIdentified`] if already
    /// identified, or [`RegistryError::IdentExists`] if another identified
    /// node already owns `(hostname, port)`.
    #[allow(clippy::expect_used)]
    pub fn identify(
        &mut self,
        conn_id: ConnId,
        hostname: impl Into<String>,
        port: u16,
        broadcast_address: impl Into<String>,
        version: f64,
    ) -> Result<(), RegistryError> {
        let hostname = hostname.into();
        let broadcast_address = broadcast_address.into();

        if !self.nodes.contains_key(&conn_id) {
            return Err(RegistryError::NoIdent);
        }
        if self.nodes[&conn_id].identified {
            return Err(RegistryError::AlreadyIdentified);
        }
        if self.host_port_index.contains_key(&(hostname.clone(), port)) {
            return Err(RegistryError::IdentExists);
        }

        let node = self.nodes.get_mut(&conn_id).expect("checked above");
        node.hostname = hostname.clone();
        node.port = port;
        node.broadcast_address = broadcast_address;
        node.version = version;
        node.identified = true;
        node.updated_at_ms = self.clock.epoch_ms();
        self.host_port_index.insert((hostname, port), conn_id);

        let snapshot = self.nodes[&conn_id].clone();
        self.emit(Event::Identify { node: snapshot });
        Ok(())
    }

    /// Heartbeat: bump `updated_at` and emit `update`. Fails
    /// [`RegistryError::NoIdent`] if `conn_id` is unknown.
    pub fn update(&mut self, conn_id: ConnId) -> Result<(), RegistryError> {
        let node = self.nodes.get_mut(&conn_id).ok_or(RegistryError::NoIdent)?;
        node.updated_at_ms = self.clock.epoch_ms();
        let snapshot = node.clone();
        self.emit(Event::Update { node: snapshot });
        Ok(())
    }

    /// Immutable snapshot of an identified node. Fails
    /// [`RegistryError::NoIdent`] if unknown or not yet identified.
    pub fn get_node(&self, conn_id: ConnId) -> Result<Node, RegistryError> {
        match self.nodes.get(&conn_id) {
            Some(node) if node.identified => Ok(node.clone()),
            _ => Err(RegistryError::NoIdent),
        }
    }

    // -- jobs -------------------------------------------------------------

    /// Register `job_name` (canonical `"<session>.<name>"`) under `conn_id`.
    /// Fails [`RegistryError::NoIdent`] if the node isn't identified, or
    /// [`RegistryError::AlreadyRegistered`] if it already holds this job.
    pub fn add_job(
        &mut self,
        conn_id: ConnId,
        job_name: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let job_name = job_name.into();
        let session = session_of(&job_name).unwrap_or(job_name.as_str()).to_string();

        let node = self.nodes.get_mut(&conn_id).filter(|n| n.identified).ok_or(
            RegistryError::NoIdent,
        )?;
        if node.sessions.get(&session).is_some_and(|jobs| jobs.contains(&job_name)) {
            return Err(RegistryError::AlreadyRegistered);
        }
        node.sessions.entry(session).or_default().insert(job_name.clone());

        self.job_order.entry(job_name.clone()).or_default().push(conn_id);
        self.job_pids.insert((conn_id, job_name.clone()), Vec::new());

        let snapshot = self.nodes[&conn_id].clone();
        self.emit(Event::AddJob { job_name, node: snapshot });
        Ok(())
    }

    /// Remove `job_name` from `conn_id`. Fails [`RegistryError::JobNotFound`]
    /// if the node does not hold this job.
    ///
    /// Prunes the empty session/job-order entries this removal leaves
    /// behind: an emptied per-session job set, an emptied session, and an
    /// emptied fleet-wide job-order entry.
    pub fn remove_job(
        &mut self,
        conn_id: ConnId,
        job_name: impl AsRef<str>,
    ) -> Result<(), RegistryError> {
        let job_name = job_name.as_ref();
        let session = session_of(job_name).unwrap_or(job_name).to_string();

        let node = self.nodes.get_mut(&conn_id).ok_or(RegistryError::JobNotFound)?;
        let Some(jobs) = node.sessions.get_mut(&session) else {
            return Err(RegistryError::JobNotFound);
        };
        if !jobs.shift_remove(job_name) {
            return Err(RegistryError::JobNotFound);
        }
        if jobs.is_empty() {
            node.sessions.shift_remove(&session);
        }

        if let Some(conns) = self.job_order.get_mut(job_name) {
            conns.retain(|c| *c != conn_id);
            if conns.is_empty() {
                self.job_order.shift_remove(job_name);
            }
        }
        self.job_pids.remove(&(conn_id, job_name.to_string()));

        self.emit(Event::RemoveJob { job_name: job_name.to_string() });
        Ok(())
    }

    // -- processes ----------------------------------------------------------

    /// Append `pid` to the row for `(conn_id, job_name)`. Fails
    /// [`RegistryError::NoIdent`] if the node isn't identified, or
    /// [`RegistryError::JobNotFound`] if it doesn't hold the job.
    ///
    /// Appends unconditionally: the same pid may be recorded twice if the
    /// caller reports it twice. A stricter caller wanting dedup should check
    /// the existing pids before calling this.
    #[allow(clippy::expect_used)]
    pub fn add_process(
        &mut self,
        conn_id: ConnId,
        job_name: impl AsRef<str>,
        pid: Pid,
    ) -> Result<(), RegistryError> {
        let job_name = job_name.as_ref();
        let identified = self.nodes.get(&conn_id).is_some_and(|n| n.identified);
        if !identified {
            return Err(RegistryError::NoIdent);
        }
        if !self.nodes[&conn_id].holds_job(job_name) {
            return Err(RegistryError::JobNotFound);
        }
        self.job_pids
            .get_mut(&(conn_id, job_name.to_string()))
            .expect("job_pids row exists whenever a node holds the job")
            .push(pid);
        self.emit(Event::AddProcess { job_name: job_name.to_string(), pid });
        Ok(())
    }

    /// Remove `pid` from the row for `(conn_id, job_name)`, if present.
    /// Fails [`RegistryError::NoIdent`] / [`RegistryError::JobNotFound`]
    /// exactly as [`Registry::add_process`] does. A missing `pid` is not an
    /// error: the call silently succeeds without emitting an event.
    #[allow(clippy::expect_used)]
    pub fn remove_process(
        &mut self,
        conn_id: ConnId,
        job_name: impl AsRef<str>,
        pid: Pid,
    ) -> Result<(), RegistryError> {
        let job_name = job_name.as_ref();
        let identified = self.nodes.get(&conn_id).is_some_and(|n| n.identified);
        if !identified {
            return Err(RegistryError::NoIdent);
        }
        if !self.nodes[&conn_id].holds_job(job_name) {
            return Err(RegistryError::JobNotFound);
        }
        let pids = self
            .job_pids
            .get_mut(&(conn_id, job_name.to_string()))
            .expect("job_pids row exists whenever a node holds the job");
        if let Some(pos) = pids.iter().position(|p| *p == pid) {
            pids.remove(pos);
            self.emit(Event::RemoveProcess { job_name: job_name.to_string(), pid });
        }
        Ok(())
    }

    // -- queries ------------------------------------------------------------

    /// All [`RemoteJob`] rows for `job_name`, in fleet-wide add order. Fails
    /// [`RegistryError::JobNotFound`] if no node currently holds this job.
    pub fn find_job(&self, job_name: &str) -> Result<Vec<RemoteJob>, RegistryError> {
        let conns = self.job_order.get(job_name).ok_or(RegistryError::JobNotFound)?;
        Ok(conns
            .iter()
            .map(|conn_id| RemoteJob {
                name: job_name.to_string(),
                node: *conn_id,
                pids: self.job_pids[&(*conn_id, job_name.to_string())].clone(),
            })
            .collect())
    }

    /// Derived view: session-id → job-name → ordered `RemoteJob`s. Insertion
    /// order of both the session keys and the job-name keys matches the
    /// order `add_job` first introduced them fleet-wide.
    #[allow(clippy::expect_used)]
    pub fn sessions(&self) -> IndexMap<String, IndexMap<String, Vec<RemoteJob>>> {
        let mut out: IndexMap<String, IndexMap<String, Vec<RemoteJob>>> = IndexMap::new();
        for job_name in self.job_order.keys() {
            let session = session_of(job_name).unwrap_or(job_name.as_str()).to_string();
            let rows = self.find_job(job_name).expect("job_order key always resolves");
            out.entry(session).or_default().insert(job_name.clone(), rows);
        }
        out
    }

    /// Derived view: job-name → ordered `RemoteJob`s, across the whole fleet.
    #[allow(clippy::expect_used)]
    pub fn jobs(&self) -> IndexMap<String, Vec<RemoteJob>> {
        self.job_order
            .keys()
            .map(|name| (name.clone(), self.find_job(name).expect("job_order key always resolves")))
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
