/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Integration tests for `vardict`, exercising the public API only.
//!
//! Run with `cargo test -p itest`, or `cargo test -p itest --features serde` to include the serialization tests.

#[cfg(test)]
mod builtin_tests;
mod framework;

pub use framework::{expect_panic, init_logging, suppress_panic_log, CountingAlloc};
