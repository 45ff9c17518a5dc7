//! Destinations for rendered universe buffers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use lantern_core::{SinkError, UniverseId};

/// Receives each universe buffer once per frame.
///
/// Implementations wrap the physical protocol (Art-Net, sACN, a USB
/// interface). Errors are transient: the server logs them and offers the
/// next frame's buffer as usual.
pub trait UniverseSink: Send {
    /// Accept `buffer` as the current contents of `universe`.
    fn update_universe(&mut self, buffer: &[u8], universe: UniverseId) -> Result<(), SinkError>;
}

/// Discards every buffer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl UniverseSink for NullSink {
    fn update_universe(&mut self, _buffer: &[u8], _universe: UniverseId) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Recorded {
    latest: BTreeMap<UniverseId, Vec<u8>>,
    updates: u64,
}

/// Keeps the latest buffer per universe.
///
/// Clones share the same record, so one clone can be moved into the
/// server while another is inspected from a different thread.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Recorded>>,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last buffer received for `universe`.
    pub fn latest(&self, universe: UniverseId) -> Option<Vec<u8>> {
        let recorded = self.inner.lock().ok()?;
        recorded.latest.get(&universe).cloned()
    }

    /// Total `update_universe` calls.
    pub fn updates(&self) -> u64 {
        self.inner.lock().map(|r| r.updates).unwrap_or(0)
    }
}

impl UniverseSink for MemorySink {
    fn update_universe(&mut self, buffer: &[u8], universe: UniverseId) -> Result<(), SinkError> {
        let mut recorded = self.inner.lock().map_err(|_| SinkError::Unavailable {
            reason: "memory sink lock poisoned".into(),
        })?;
        recorded.updates += 1;
        let slot = recorded.latest.entry(universe).or_default();
        slot.clear();
        slot.extend_from_slice(buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_latest_per_universe() {
        let mut sink = MemorySink::new();
        let view = sink.clone();
        sink.update_universe(&[1, 2, 3], UniverseId(1)).unwrap();
        sink.update_universe(&[9], UniverseId(2)).unwrap();
        sink.update_universe(&[4, 5], UniverseId(1)).unwrap();
        assert_eq!(view.latest(UniverseId(1)), Some(vec![4, 5]));
        assert_eq!(view.latest(UniverseId(2)), Some(vec![9]));
        assert_eq!(view.latest(UniverseId(3)), None);
        assert_eq!(view.updates(), 3);
    }

    #[test]
    fn null_sink_accepts_everything() {
        assert!(NullSink.update_universe(&[0; 512], UniverseId(0)).is_ok());
    }
}
