use crate::config::CohortConfig;
use crate::error::{CohortError, Result};
use crate::group::Group;
use crate::transport::Channel;
use crate::types::{PROTOCOL_VERSION, Rank, Tag};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};

type TagReceiver = Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>;

/// Shared state between a link's recv loop and its receivers.
///
/// When a frame arrives before anyone asked for its tag, the payload is
/// parked in `pending`. When a receiver registers, pending payloads are
/// flushed into the new channel first.
#[derive(Default)]
struct RecvState {
    senders: HashMap<Tag, mpsc::UnboundedSender<Vec<u8>>>,
    pending: HashMap<Tag, Vec<Vec<u8>>>,
    /// Set once the connection is gone; late receivers get pending data
    /// and then end-of-stream.
    closed: bool,
}

/// One established connection to a peer.
struct PeerLink {
    writer: Mutex<OwnedWriteHalf>,
    state: Arc<Mutex<RecvState>>,
    receivers: Mutex<HashMap<Tag, TagReceiver>>,
    _recv_handle: tokio::task::JoinHandle<()>,
}

impl PeerLink {
    fn spawn(
        handle: &tokio::runtime::Handle,
        peer: Rank,
        stream: TcpStream,
        max_frame_bytes: usize,
    ) -> Self {
        let (reader, writer) = stream.into_split();
        let state = Arc::new(Mutex::new(RecvState::default()));
        let recv_state = Arc::clone(&state);
        let recv_handle = handle.spawn(async move {
            recv_loop(peer, reader, recv_state, max_frame_bytes).await;
        });
        Self {
            writer: Mutex::new(writer),
            state,
            receivers: Mutex::new(HashMap::new()),
            _recv_handle: recv_handle,
        }
    }

    /// Write a tagged frame: `[tag: u64 LE][len: u64 LE][payload]`.
    async fn write_frame(&self, tag: Tag, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(&tag.to_le_bytes())
            .await
            .map_err(|e| CohortError::transport_with_source("tcp write tag", e))?;
        writer
            .write_all(&(data.len() as u64).to_le_bytes())
            .await
            .map_err(|e| CohortError::transport_with_source("tcp write len", e))?;
        writer
            .write_all(data)
            .await
            .map_err(|e| CohortError::transport_with_source("tcp write payload", e))?;
        writer
            .flush()
            .await
            .map_err(|e| CohortError::transport_with_source("tcp flush", e))?;
        Ok(())
    }

    /// Get or create the receiver for `tag`.
    async fn tag_receiver(&self, tag: Tag) -> TagReceiver {
        let mut receivers = self.receivers.lock().await;
        if let Some(rx) = receivers.get(&tag) {
            return Arc::clone(rx);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut st = self.state.lock().await;
            if let Some(parked) = st.pending.remove(&tag) {
                for payload in parked {
                    let _ = tx.send(payload);
                }
            }
            // A closed link keeps no sender, so the receiver drains and ends.
            if !st.closed {
                st.senders.insert(tag, tx);
            }
        }

        let rx = Arc::new(Mutex::new(rx));
        receivers.insert(tag, Arc::clone(&rx));
        rx
    }
}

/// Background loop: read frames and route them by tag.
async fn recv_loop(
    peer: Rank,
    mut reader: OwnedReadHalf,
    state: Arc<Mutex<RecvState>>,
    max_frame_bytes: usize,
) {
    let mut tag_buf = [0u8; 8];
    let mut len_buf = [0u8; 8];
    loop {
        if let Err(e) = reader.read_exact(&mut tag_buf).await {
            tracing::debug!(peer, "tcp recv loop ended: {e}");
            break;
        }
        if let Err(e) = reader.read_exact(&mut len_buf).await {
            tracing::debug!(peer, "tcp recv loop ended reading len: {e}");
            break;
        }
        let tag = u64::from_le_bytes(tag_buf);
        let len = u64::from_le_bytes(len_buf) as usize;

        if len > max_frame_bytes {
            tracing::warn!(peer, len, max_frame_bytes, "tcp frame too large, closing connection");
            break;
        }

        let mut payload = vec![0u8; len];
        if let Err(e) = reader.read_exact(&mut payload).await {
            tracing::debug!(peer, "tcp recv loop ended reading payload: {e}");
            break;
        }

        let mut st = state.lock().await;
        match st.senders.get(&tag) {
            Some(tx) => {
                if let Err(mpsc::error::SendError(payload)) = tx.send(payload) {
                    // Receiver dropped; keep the data for a later registration.
                    st.senders.remove(&tag);
                    st.pending.entry(tag).or_default().push(payload);
                }
            }
            None => st.pending.entry(tag).or_default().push(payload),
        }
    }

    let mut st = state.lock().await;
    st.closed = true;
    st.senders.clear();
}

async fn write_handshake(stream: &mut TcpStream, rank: Rank) -> Result<()> {
    let mut hello = [0u8; 6];
    hello[..2].copy_from_slice(&PROTOCOL_VERSION.to_le_bytes());
    hello[2..].copy_from_slice(&rank.to_le_bytes());
    stream.write_all(&hello).await?;
    stream.flush().await?;
    Ok(())
}

async fn read_handshake(stream: &mut TcpStream, world_size: u32) -> Result<Rank> {
    let mut hello = [0u8; 6];
    stream.read_exact(&mut hello).await?;
    let version = u16::from_le_bytes([hello[0], hello[1]]);
    if version != PROTOCOL_VERSION {
        tracing::warn!(
            local = PROTOCOL_VERSION,
            remote = version,
            "tcp handshake version mismatch"
        );
        return Err(CohortError::ProtocolMismatch {
            local: PROTOCOL_VERSION,
            remote: version,
        });
    }
    let rank = Rank::from_le_bytes([hello[2], hello[3], hello[4], hello[5]]);
    if rank >= world_size {
        return Err(CohortError::InvalidRank { rank, world_size });
    }
    Ok(rank)
}

async fn connect_with_retry(addr: SocketAddr, backoff: std::time::Duration) -> TcpStream {
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return stream,
            Err(e) => {
                tracing::trace!(%addr, "peer not reachable yet: {e}");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Connect every pair of ranks exactly once.
///
/// Rank `r` dials every lower rank and accepts a connection from every
/// higher rank. Each side announces its rank in the handshake.
async fn form_mesh(
    group: Group,
    listener: std::net::TcpListener,
    addrs: &[SocketAddr],
    config: &CohortConfig,
) -> Result<HashMap<Rank, TcpStream>> {
    let rank = group.rank();
    let world = group.size();
    listener.set_nonblocking(true)?;
    let listener = TcpListener::from_std(listener)?;
    let connected = AtomicU32::new(0);

    let accept = async {
        let mut inbound = HashMap::new();
        while (inbound.len() as u32) < world - rank - 1 {
            let (mut stream, from) = listener.accept().await?;
            stream.set_nodelay(true)?;
            let peer = read_handshake(&mut stream, world).await?;
            if peer <= rank || inbound.contains_key(&peer) {
                tracing::warn!(rank, peer, %from, "unexpected handshake");
                return Err(CohortError::ConnectionFailed {
                    rank: peer,
                    reason: format!("unexpected connection from rank {peer}"),
                });
            }
            write_handshake(&mut stream, rank).await?;
            inbound.insert(peer, stream);
            connected.fetch_add(1, Ordering::Relaxed);
        }
        Ok::<_, CohortError>(inbound)
    };

    let dial = async {
        let mut outbound = HashMap::new();
        for peer in 0..rank {
            let mut stream = connect_with_retry(addrs[peer as usize], config.connect_backoff).await;
            stream.set_nodelay(true)?;
            write_handshake(&mut stream, rank).await?;
            let echoed = read_handshake(&mut stream, world).await?;
            if echoed != peer {
                return Err(CohortError::ConnectionFailed {
                    rank: peer,
                    reason: format!("address of rank {peer} answered as rank {echoed}"),
                });
            }
            outbound.insert(peer, stream);
            connected.fetch_add(1, Ordering::Relaxed);
        }
        Ok::<_, CohortError>(outbound)
    };

    match tokio::time::timeout(config.connect_timeout, async { tokio::try_join!(accept, dial) })
        .await
    {
        Ok(Ok((mut inbound, outbound))) => {
            inbound.extend(outbound);
            Ok(inbound)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(CohortError::MeshFormationTimeout {
            connected: connected.load(Ordering::Relaxed),
            expected: world - 1,
        }),
    }
}

/// Channel over a full mesh of TCP connections.
///
/// Async I/O runs on a private tokio runtime; `send` and `recv` block the
/// calling thread on it. Each peer connection carries
/// `[tag: u64 LE][len: u64 LE][payload]` frames, and a background task per
/// peer demultiplexes them by tag.
pub struct TcpChannel {
    group: Group,
    links: HashMap<Rank, PeerLink>,
    // Declared last: links must drop before the runtime that drives them.
    rt: tokio::runtime::Runtime,
}

impl TcpChannel {
    /// Listen on `addrs[rank]` and connect to every other rank.
    ///
    /// `addrs` lists one listening address per rank, identical on every rank.
    pub fn connect(group: Group, addrs: &[SocketAddr], config: &CohortConfig) -> Result<Self> {
        let own = addrs.get(group.rank() as usize).ok_or_else(|| {
            CohortError::InvalidConfig(format!(
                "{} addresses given for a group of {}",
                addrs.len(),
                group.size()
            ))
        })?;
        let listener = std::net::TcpListener::bind(own)?;
        Self::with_listener(group, listener, addrs, config)
    }

    /// Like [`connect`](Self::connect) with a listener the caller already bound.
    pub fn with_listener(
        group: Group,
        listener: std::net::TcpListener,
        addrs: &[SocketAddr],
        config: &CohortConfig,
    ) -> Result<Self> {
        config.validate()?;
        if addrs.len() != group.size() as usize {
            return Err(CohortError::InvalidConfig(format!(
                "{} addresses given for a group of {}",
                addrs.len(),
                group.size()
            )));
        }

        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.io_threads)
            .thread_name("cohort-io")
            .enable_all()
            .build()
            .map_err(|e| CohortError::transport_with_source("tokio runtime", e))?;

        let streams = rt.block_on(form_mesh(group, listener, addrs, config))?;
        tracing::debug!(rank = group.rank(), peers = streams.len(), "tcp mesh formed");

        let links = streams
            .into_iter()
            .map(|(peer, stream)| {
                let link = PeerLink::spawn(rt.handle(), peer, stream, config.max_frame_bytes);
                (peer, link)
            })
            .collect();

        Ok(Self { group, links, rt })
    }

    pub fn group(&self) -> Group {
        self.group
    }

    fn link(&self, peer: Rank) -> Result<&PeerLink> {
        self.links
            .get(&peer)
            .ok_or(CohortError::UnknownPeer { rank: peer })
    }
}

impl Channel for TcpChannel {
    fn send(&self, dest: Rank, tag: Tag, payload: &[u8]) -> Result<()> {
        let link = self.link(dest)?;
        self.rt.block_on(link.write_frame(tag, payload))
    }

    fn recv(&self, src: Rank, tag: Tag) -> Result<Vec<u8>> {
        let link = self.link(src)?;
        self.rt.block_on(async {
            let rx = link.tag_receiver(tag).await;
            let mut rx = rx.lock().await;
            rx.recv()
                .await
                .ok_or(CohortError::PeerDisconnected { rank: src })
        })
    }
}

impl std::fmt::Debug for TcpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpChannel")
            .field("rank", &self.group.rank())
            .field("size", &self.group.size())
            .field("peers", &self.links.len())
            .finish()
    }
}
