// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration Tests
//!
//! End-to-end session workflows against the in-memory relay and backend.

#[path = "../common/mod.rs"]
mod common;

mod history_race_test;
mod session_workflow_test;
