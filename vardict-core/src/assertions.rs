/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Runtime assertion macros with different safeguard levels, and trace output.
//!
//! The levels are configured in `build.rs`: `safeguards_balanced` is on unless the `safeguards-disengaged` feature is set,
//! `safeguards_strict` additionally requires a debug build or the `safeguards-strict` feature.

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Runtime assertions - strict mode

/// Acts like `assert!` when `safeguards_strict` is enabled (default in debug builds), and becomes a no-op otherwise.
#[macro_export]
macro_rules! strict_assert {
    ($($arg:tt)*) => {
        #[cfg(safeguards_strict)]
        assert!($($arg)*);
    };
}

/// Acts like `assert_eq!` when `safeguards_strict` is enabled (default in debug builds), and becomes a no-op otherwise.
#[macro_export]
macro_rules! strict_assert_eq {
    ($actual:expr, $expected:expr) => {
        #[cfg(safeguards_strict)]
        assert_eq!($actual, $expected);
    };
    ($actual:expr, $expected:expr, $($arg:tt)*) => {
        #[cfg(safeguards_strict)]
        assert_eq!($actual, $expected, $($arg)*);
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Runtime assertions - balanced mode

/// Acts like `assert!` when `safeguards_balanced` is enabled, and becomes a no-op otherwise.
#[macro_export]
macro_rules! balanced_assert {
    ($($arg:tt)*) => {
        #[cfg(safeguards_balanced)]
        assert!($($arg)*);
    };
}

/// Acts like `assert_eq!` when `safeguards_balanced` is enabled, and becomes a no-op otherwise.
#[macro_export]
macro_rules! balanced_assert_eq {
    ($actual:expr, $expected:expr) => {
        #[cfg(safeguards_balanced)]
        assert_eq!($actual, $expected);
    };
    ($actual:expr, $expected:expr, $($arg:tt)*) => {
        #[cfg(safeguards_balanced)]
        assert_eq!($actual, $expected, $($arg)*);
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Trace output

/// Trace output, routed through the `log` facade at `trace` level.
#[macro_export]
macro_rules! out {
    ()                          => ();
    ($fmt:literal)              => ($crate::__log::trace!(target: "vardict", $fmt));
    ($fmt:literal, $($arg:tt)*) => ($crate::__log::trace!(target: "vardict", $fmt, $($arg)*));
}
