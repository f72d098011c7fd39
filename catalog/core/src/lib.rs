// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Catalog Policy Core
//!
//! View policy evaluation engine for a multi-tenant resource catalog.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Decide Allow or Deny for an operation on a hierarchically
//!   addressed resource, given the rule set of the caller's view

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
