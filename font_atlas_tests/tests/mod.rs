// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `font_atlas`.
//!
//! - The `util` module contains shared utility functions that are needed by different
//!   test modules.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests, so shared helpers only need to be defined once.
//! - Put new tests into the module of their "topic" (packing, residency, fallback, ...), and
//!   start test names with that topic, e.g. `packing_wraps_to_next_shelf`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod packing;
mod residency;
mod scale;
mod util;
