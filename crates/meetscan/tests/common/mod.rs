//! Shared test utilities for meetscan integration tests.
//!
//! This module provides:
//! - `FakeMailSource`, an in-memory `MailSource` with call counters
//! - `FakeMessage` builders for mailbox contents
//! - `TestHarness` wiring an in-memory store to an `IngestPipeline`

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::*;
