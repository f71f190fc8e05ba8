/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Deserialize, Serialize};
use vardict::builtin::{dict, vdict, Map, VarMap, Variant};

fn serde_roundtrip<T>(value: &T, expected_json: &str)
where
    T: for<'a> Deserialize<'a> + Serialize + PartialEq + std::fmt::Debug,
{
    let json: String = serde_json::to_string(value).unwrap();
    let back: T = serde_json::from_str(json.as_str()).unwrap();

    assert_eq!(back, *value, "serde round-trip changes value");
    assert_eq!(
        json, expected_json,
        "value does not conform to expected JSON"
    );
}

#[test]
fn serde_typed_map() {
    let value: Map<String, i64> = dict! { "b": 2, "a": 1 };

    serde_roundtrip(&value, r#"{"b":2,"a":1}"#);
}

#[test]
fn serde_var_map() {
    let value = vdict! { "flag": true, "n": Variant::nil(), "list": vec![1, 2] };

    serde_roundtrip(&value, r#"{"flag":true,"n":null,"list":[1,2]}"#);
}

#[test]
fn serde_nested_var_map() {
    let json = r#"{"outer":{"inner":1.5}}"#;
    let value: VarMap = serde_json::from_str(json).unwrap();

    let outer = value.index(&Variant::from("outer")).to::<VarMap>();
    assert_eq!(outer.index(&Variant::from("inner")), Variant::Float(1.5));
    assert_eq!(serde_json::to_string(&value).unwrap(), json);
}

#[test]
fn serde_rejects_cyclic_var_map() {
    let mut value = VarMap::new();
    let alias = Variant::Dictionary(value.any());
    value.set_index(Variant::from("self"), alias).unwrap();

    let err = serde_json::to_string(&value).unwrap_err();
    assert!(err.to_string().contains("max recursion depth"), "{err}");
}
