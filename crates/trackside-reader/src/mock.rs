//! Mock reader for tests and hardware-free development.

use crate::TagReader;
use tokio::sync::mpsc;
use trackside_core::{Error, RawRead, Result};

/// Control events sent from the handle to the reader.
#[derive(Debug, Clone, Copy)]
enum TagEvent {
    Presented(RawRead),
    Removed,
}

/// Mock proximity-card reader.
///
/// Simulates a reader by tracking which tag, if any, is currently held
/// against it. The paired [`MockReaderHandle`] presents and removes tags.
///
/// # Examples
///
/// ```
/// use trackside_reader::{MockReader, TagReader};
/// use trackside_core::RawRead;
///
/// #[tokio::main]
/// async fn main() -> trackside_core::Result<()> {
///     let (mut reader, handle) = MockReader::new();
///
///     handle.present_tag(RawRead::new(0x1A2B3C)).await;
///     assert_eq!(reader.poll_tag().await?, Some(RawRead::new(0x1A2B3C)));
///
///     handle.remove_tag().await;
///     assert_eq!(reader.poll_tag().await?, None);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    event_rx: mpsc::Receiver<TagEvent>,
    current: Option<RawRead>,
}

impl MockReader {
    /// Create a mock reader and its control handle.
    pub fn new() -> (Self, MockReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let reader = Self {
            event_rx,
            current: None,
        };
        (reader, MockReaderHandle { event_tx })
    }
}

impl TagReader for MockReader {
    async fn poll_tag(&mut self) -> Result<Option<RawRead>> {
        // Drain pending events so the poll reflects the latest tag position.
        loop {
            match self.event_rx.try_recv() {
                Ok(TagEvent::Presented(raw)) => self.current = Some(raw),
                Ok(TagEvent::Removed) => self.current = None,
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return Err(Error::Reader("mock reader handle dropped".to_string()));
                }
            }
        }
        Ok(self.current)
    }
}

/// Control handle for a [`MockReader`].
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    event_tx: mpsc::Sender<TagEvent>,
}

impl MockReaderHandle {
    /// Hold a tag against the reader. It stays until removed or replaced.
    pub async fn present_tag(&self, raw: RawRead) {
        let _ = self.event_tx.send(TagEvent::Presented(raw)).await;
    }

    /// Take the current tag off the reader.
    pub async fn remove_tag(&self) {
        let _ = self.event_tx.send(TagEvent::Removed).await;
    }
}
