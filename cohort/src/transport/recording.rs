use crate::error::{CohortError, Result};
use crate::transport::Channel;
use crate::types::{Rank, Tag};
use std::sync::Mutex;

/// Direction of a recorded channel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Send,
    Recv,
}

/// One completed `send` or `recv` on a [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub kind: EventKind,
    pub peer: Rank,
    pub tag: Tag,
    pub len: usize,
}

/// Wraps a channel and records every operation it performs, in call order.
///
/// Events are appended when the operation starts, so a rank that hangs in
/// `recv` still shows what it was waiting for.
pub struct RecordingChannel<C> {
    inner: C,
    events: Mutex<Vec<ChannelEvent>>,
}

impl<C: Channel> RecordingChannel<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<ChannelEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of sends recorded so far.
    pub fn sends(&self) -> usize {
        self.count(EventKind::Send)
    }

    /// Number of receives recorded so far.
    pub fn recvs(&self) -> usize {
        self.count(EventKind::Recv)
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .map(|events| events.iter().filter(|e| e.kind == kind).count())
            .unwrap_or(0)
    }

    fn record(&self, event: ChannelEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| CohortError::LockPoisoned("recording channel"))?
            .push(event);
        Ok(())
    }
}

impl<C: Channel> Channel for RecordingChannel<C> {
    fn send(&self, dest: Rank, tag: Tag, payload: &[u8]) -> Result<()> {
        self.record(ChannelEvent {
            kind: EventKind::Send,
            peer: dest,
            tag,
            len: payload.len(),
        })?;
        self.inner.send(dest, tag, payload)
    }

    fn recv(&self, src: Rank, tag: Tag) -> Result<Vec<u8>> {
        self.record(ChannelEvent {
            kind: EventKind::Recv,
            peer: src,
            tag,
            len: 0,
        })?;
        let payload = self.inner.recv(src, tag)?;
        if let Ok(mut events) = self.events.lock()
            && let Some(last) = events
                .iter_mut()
                .rev()
                .find(|e| e.kind == EventKind::Recv && e.peer == src && e.tag == tag)
        {
            last.len = payload.len();
        }
        Ok(payload)
    }
}
