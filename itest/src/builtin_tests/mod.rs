/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod containers {
    mod adapt_test;
    mod functions_test;
    mod map_test;
    mod slot_store_test;
    mod variant_test;
}

#[cfg(feature = "serde")]
mod serde_test;
