// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn ok_response_serializes_result_field() {
    let json = serde_json::to_value(Response::ok("1")).unwrap();
    assert_eq!(json["msgid"], "1");
    assert_eq!(json["result"], "ok");
}

#[test]
fn err_response_serializes_nested_error() {
    let json =
        serde_json::to_value(Response::err("2", ErrorBody::bad_request("missing msg"))).unwrap();
    assert_eq!(json["msgid"], "2");
    assert_eq!(json["error"]["code"], "bad_request");
    assert_eq!(json["error"]["reason"], "missing msg");
}

#[test]
fn registry_error_maps_to_matching_code() {
    let body: ErrorBody = RegistryError::JobNotFound.into();
    assert_eq!(body.code, "job_not_found");
}

#[test]
fn roundtrips_through_json() {
    let resp = Response::err("3", ErrorBody::connection_lost());
    let raw = serde_json::to_string(&resp).unwrap();
    let back: Response = serde_json::from_str(&raw).unwrap();
    assert_eq!(resp, back);
}
