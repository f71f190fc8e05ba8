/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::env;

fn main() {
    println!("cargo::rerun-if-changed=build.rs");
    println!("cargo::rustc-check-cfg=cfg(safeguards_strict)");
    println!("cargo::rustc-check-cfg=cfg(safeguards_balanced)");
    println!("cargo::rustc-check-cfg=cfg(published_docs)");

    emit_safeguard_cfgs();
}

/// Maps Cargo features and the build profile onto the `safeguards_*` cfgs read by `assertions.rs`.
///
/// | level      | enabled when                                              |
/// |------------|-----------------------------------------------------------|
/// | balanced   | always, unless `safeguards-disengaged` is set             |
/// | strict     | debug builds or `safeguards-strict`, unless disengaged    |
fn emit_safeguard_cfgs() {
    let disengaged = env::var_os("CARGO_FEATURE_SAFEGUARDS_DISENGAGED").is_some();
    if disengaged {
        return;
    }

    println!("cargo::rustc-cfg=safeguards_balanced");

    let debug_build = env::var("PROFILE").is_ok_and(|profile| profile == "debug");
    let strict_feature = env::var_os("CARGO_FEATURE_SAFEGUARDS_STRICT").is_some();
    if debug_build || strict_feature {
        println!("cargo::rustc-cfg=safeguards_strict");
    }
}
