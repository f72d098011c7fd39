// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! catpol CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Command handlers and the embedded engine behind `catpol`

pub mod commands;
pub mod embedded;
