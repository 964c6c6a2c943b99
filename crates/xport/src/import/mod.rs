// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Import side: rebuilds values and their sharing from the id stream.

mod fields;
mod session;

pub use session::ImportSession;
