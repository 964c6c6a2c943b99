// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Export side: turns values into the self-describing id stream.

mod fields;
mod session;

pub use session::ExportSession;
