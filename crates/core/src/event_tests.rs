// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::conn::ConnId;

fn node() -> Node {
    Node::new(ConnId::from_raw(1), 0)
}

#[test]
fn names_match_wire_verbs() {
    assert_eq!(Event::AddNode { node: node() }.name(), "add_node");
    assert_eq!(Event::RemoveNode { node: node() }.name(), "remove_node");
    assert_eq!(Event::Identify { node: node() }.name(), "identify");
    assert_eq!(Event::Update { node: node() }.name(), "update");
    assert_eq!(Event::AddJob { job_name: "a.job1".into(), node: node() }.name(), "add_job");
    assert_eq!(Event::RemoveJob { job_name: "a.job1".into() }.name(), "remove_job");
    assert_eq!(Event::AddProcess { job_name: "a.job1".into(), pid: 1 }.name(), "add_process");
    assert_eq!(
        Event::RemoveProcess { job_name: "a.job1".into(), pid: 1 }.name(),
        "remove_process"
    );
}

#[test]
fn serializes_with_tagged_event_field() {
    let json = serde_json::to_value(Event::AddProcess { job_name: "a.job1".into(), pid: 7 })
        .expect("serialize");
    assert_eq!(json["event"], "add_process");
    assert_eq!(json["job_name"], "a.job1");
    assert_eq!(json["pid"], 7);
}
