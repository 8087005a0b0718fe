//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce the headless
//! discipline of `hud-core`:
//! - No clock reads in production code (the host injects `now`)
//! - No threads, async runtimes, or locks in the coordinator
//!
//! These tests are designed to catch violations early in the development cycle.

#![allow(dead_code)]

pub fn placeholder() {
    // Placeholder to make this a valid library
}
