// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod repositories;
pub mod event_bus;
pub mod view_document_parser;
