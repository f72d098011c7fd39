// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain model of the view policy engine.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Resource addressing, action taxonomy, rules, evaluation and
//!   the view aggregate. No I/O happens below this module.

pub mod resource_uri;
pub mod operation;
pub mod rule;
pub mod policy;
pub mod validation;
pub mod view;
pub mod events;
pub mod repository;
pub mod engine_config;
