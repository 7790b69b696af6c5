// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fan-out of [`Event`]s.
//!
//! Delivery is synchronous, on the caller's thread, at the point of the
//! registry mutation that produced the event. Subscribers must not block:
//! the canonical consumer (the lookup endpoint's streaming subscriber)
//! pushes the payload onto its own outbound buffer and returns immediately.
//!
//! A subscriber that panics cannot corrupt registry state: each callback
//! runs inside `catch_unwind` and a panic is logged and swallowed.

use crate::event::Event;
use std::panic::{self, AssertUnwindSafe};

/// Handle returned by [`Bus::bind_all`] / [`Bus::bind`], used to [`Bus::unbind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

enum Selector {
    All,
    Only(&'static str),
}

struct Subscriber {
    id: SubscriptionId,
    selector: Selector,
    callback: Box<dyn FnMut(&Event) + Send>,
}

/// Registry of event subscribers and the dispatch logic that fans events
/// out to them.
#[derive(Default)]
pub struct Bus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event.
    pub fn bind_all(&mut self, callback: impl FnMut(&Event) + Send + 'static) -> SubscriptionId {
        self.insert(Selector::All, callback)
    }

    /// Subscribe to events named `event` only (see [`Event::name`]).
    pub fn bind(
        &mut self,
        event: &'static str,
        callback: impl FnMut(&Event) + Send + 'static,
    ) -> SubscriptionId {
        self.insert(Selector::Only(event), callback)
    }

    /// Remove a subscription. No-op if `id` is unknown (already unbound).
    pub fn unbind(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|s| s.id != id);
    }

    fn insert(
        &mut self,
        selector: Selector,
        callback: impl FnMut(&Event) + Send + 'static,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push(Subscriber { id, selector, callback: Box::new(callback) });
        id
    }

    /// Deliver `event` to every matching subscriber, in subscription order.
    pub(crate) fn dispatch(&mut self, event: &Event) {
        for subscriber in &mut self.subscribers {
            let matches = match subscriber.selector {
                Selector::All => true,
                Selector::Only(name) => name == event.name(),
            };
            if !matches {
                continue;
            }
            let callback = &mut subscriber.callback;
            let result = panic::catch_unwind(AssertUnwindSafe(|| callback(event)));
            if result.is_err() {
                tracing::error!(event = event.name(), "event subscriber panicked, dropping");
            }
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
