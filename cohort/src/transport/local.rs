use crate::error::{CohortError, Result};
use crate::group::Group;
use crate::transport::Channel;
use crate::types::{Rank, Tag};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// When `LocalChannel::send` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// As soon as the message is queued for the receiver.
    #[default]
    Buffered,
    /// Only after the receiver has taken the message out of the channel.
    ///
    /// No message is ever buffered on behalf of a sender, so any protocol
    /// that relies on buffering to make progress deadlocks. Useful for
    /// proving that a message pattern is deadlock-free.
    Rendezvous,
}

struct Envelope {
    tag: Tag,
    payload: Vec<u8>,
    /// Fired when the receiver takes the message (rendezvous only).
    ack: Option<oneshot::Sender<()>>,
}

/// Receiving end of one (src -> this rank) link.
///
/// Messages that arrive for a tag nobody is waiting on yet are parked in
/// `pending` until a matching `recv`.
struct Inbox {
    rx: mpsc::UnboundedReceiver<Envelope>,
    pending: HashMap<Tag, VecDeque<Envelope>>,
}

impl Inbox {
    fn new(rx: mpsc::UnboundedReceiver<Envelope>) -> Self {
        Self {
            rx,
            pending: HashMap::new(),
        }
    }

    /// Next message carrying `tag`, or `None` once the sender is gone.
    fn next_for(&mut self, tag: Tag) -> Option<Envelope> {
        if let Some(queue) = self.pending.get_mut(&tag)
            && let Some(env) = queue.pop_front()
        {
            return Some(env);
        }
        loop {
            let env = self.rx.blocking_recv()?;
            if env.tag == tag {
                return Some(env);
            }
            self.pending.entry(env.tag).or_default().push_back(env);
        }
    }
}

/// In-process channel: one endpoint per rank of a fully connected mesh.
///
/// Every ordered pair of ranks gets its own queue, so dropping an endpoint
/// disconnects exactly the links that start at it: peers blocked in `recv`
/// from that rank get [`CohortError::PeerDisconnected`] instead of hanging.
///
/// Endpoints are meant to be driven from plain threads (one per rank).
/// `send`/`recv` block the calling thread and must not be called from
/// inside an async runtime.
pub struct LocalChannel {
    group: Group,
    delivery: Delivery,
    /// Indexed by destination rank.
    outboxes: Vec<mpsc::UnboundedSender<Envelope>>,
    /// Indexed by source rank.
    inboxes: Vec<Mutex<Inbox>>,
}

impl LocalChannel {
    /// Build a mesh of `size` endpoints; element `i` belongs to rank `i`.
    pub fn mesh(size: u32, delivery: Delivery) -> Result<Vec<Self>> {
        let groups = Group::all(size)?;
        let n = size as usize;

        let mut outboxes: Vec<Vec<mpsc::UnboundedSender<Envelope>>> =
            (0..n).map(|_| Vec::with_capacity(n)).collect();
        let mut inboxes: Vec<Vec<Option<Mutex<Inbox>>>> =
            (0..n).map(|_| (0..n).map(|_| None).collect()).collect();

        for (src, out) in outboxes.iter_mut().enumerate() {
            for inbox_row in inboxes.iter_mut() {
                let (tx, rx) = mpsc::unbounded_channel();
                out.push(tx);
                inbox_row[src] = Some(Mutex::new(Inbox::new(rx)));
            }
        }

        let endpoints = groups
            .into_iter()
            .zip(outboxes.into_iter().zip(inboxes))
            .map(|(group, (outboxes, inboxes))| LocalChannel {
                group,
                delivery,
                outboxes,
                inboxes: inboxes.into_iter().flatten().collect(),
            })
            .collect();
        Ok(endpoints)
    }

    /// Mesh of `size` buffered endpoints.
    pub fn buffered(size: u32) -> Result<Vec<Self>> {
        Self::mesh(size, Delivery::Buffered)
    }

    /// Mesh of `size` rendezvous endpoints.
    pub fn rendezvous(size: u32) -> Result<Vec<Self>> {
        Self::mesh(size, Delivery::Rendezvous)
    }

    pub fn rank(&self) -> Rank {
        self.group.rank()
    }

    pub fn world_size(&self) -> u32 {
        self.group.size()
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// Group membership of this endpoint.
    pub fn group(&self) -> Group {
        self.group
    }

    fn check_peer(&self, peer: Rank) -> Result<()> {
        if peer >= self.group.size() {
            return Err(CohortError::UnknownPeer { rank: peer });
        }
        Ok(())
    }
}

impl Channel for LocalChannel {
    fn send(&self, dest: Rank, tag: Tag, payload: &[u8]) -> Result<()> {
        self.check_peer(dest)?;

        let (ack, taken) = match self.delivery {
            Delivery::Buffered => (None, None),
            Delivery::Rendezvous => {
                let (tx, rx) = oneshot::channel();
                (Some(tx), Some(rx))
            }
        };

        self.outboxes[dest as usize]
            .send(Envelope {
                tag,
                payload: payload.to_vec(),
                ack,
            })
            .map_err(|_| CohortError::PeerDisconnected { rank: dest })?;

        if let Some(taken) = taken {
            taken
                .blocking_recv()
                .map_err(|_| CohortError::PeerDisconnected { rank: dest })?;
        }
        Ok(())
    }

    fn recv(&self, src: Rank, tag: Tag) -> Result<Vec<u8>> {
        self.check_peer(src)?;

        let env = {
            let mut inbox = self.inboxes[src as usize]
                .lock()
                .map_err(|_| CohortError::LockPoisoned("local inbox"))?;
            inbox
                .next_for(tag)
                .ok_or(CohortError::PeerDisconnected { rank: src })?
        };

        if let Some(ack) = env.ack {
            // The sender may have given up already; nothing to report then.
            let _ = ack.send(());
        }
        Ok(env.payload)
    }
}

impl std::fmt::Debug for LocalChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalChannel")
            .field("rank", &self.group.rank())
            .field("size", &self.group.size())
            .field("delivery", &self.delivery)
            .finish()
    }
}
