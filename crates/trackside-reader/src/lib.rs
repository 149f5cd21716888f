//! Reader collaborator boundary.
//!
//! The physical MFRC522 driver lives outside this workspace; the agent only
//! needs one operation from it: poll once, get a raw tag value or nothing.
//! [`TagReader`] is that contract, and [`MockReader`] is a programmable
//! stand-in for tests and hardware-free runs.
//!
//! Traits use native `async fn` methods (Edition 2024 RPITIT), so no
//! `async_trait` macro is needed.

#![allow(async_fn_in_trait)]

mod mock;

pub use mock::{MockReader, MockReaderHandle};

use trackside_core::{RawRead, Result};

/// A proximity-card reader.
///
/// `poll_tag` must be non-blocking or short-blocking; the orchestrator calls
/// it once per loop iteration and paces itself.
pub trait TagReader {
    /// Poll once for a tag.
    ///
    /// Returns `Ok(None)` when no tag is present or the read was invalid.
    ///
    /// # Errors
    /// Returns an error only for device-level faults (e.g. the reader went
    /// away); the caller recovers by pausing and re-polling.
    async fn poll_tag(&mut self) -> Result<Option<RawRead>>;
}
