// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod authorization;
pub mod view_service;

// Re-export use cases for convenience
pub use authorization::{authorize, AuthorizationService, PolicyRequest, ResourceKind};
pub use view_service::{StandardViewService, ViewError, ViewService};
