// Copyright 2025 the Font Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterizer and page texture backends.

#[cfg(feature = "vello_cpu")]
pub mod vello_cpu;
