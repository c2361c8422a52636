// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules over the single-writer connection.

pub mod agents;
pub mod conversations;
pub mod handoff;
pub mod messages;
pub mod queue;
