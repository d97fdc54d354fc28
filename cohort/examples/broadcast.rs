//! Broadcast over a loopback TCP group of 5 ranks.
//!
//! Rank 2 broadcasts a greeting; every rank prints what it received, then all
//! ranks meet at a barrier.
//!
//! ```bash
//! RUST_LOG=cohort=trace cargo run --example broadcast
//! ```

use cohort::{CohortConfig, Communicator, Group};
use std::net::{SocketAddr, TcpListener};
use tracing_subscriber::EnvFilter;

fn main() -> cohort::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let world_size = 5u32;
    let root = 2;

    // Reserve a free port per rank up front so every rank knows every address.
    let listeners = (0..world_size)
        .map(|_| TcpListener::bind("127.0.0.1:0"))
        .collect::<std::io::Result<Vec<_>>>()?;
    let addrs = listeners
        .iter()
        .map(TcpListener::local_addr)
        .collect::<std::io::Result<Vec<SocketAddr>>>()?;

    let handles: Vec<_> = listeners
        .into_iter()
        .enumerate()
        .map(|(rank, listener)| {
            let addrs = addrs.clone();
            std::thread::spawn(move || {
                let group = Group::new(rank as u32, world_size)?;
                let config = CohortConfig::from_env();
                let channel =
                    cohort::TcpChannel::with_listener(group, listener, &addrs, &config)?;
                let comm = Communicator::with_config(group, channel, config);

                let greeting: Vec<u8> = if comm.rank() == root {
                    b"hello from the root".to_vec()
                } else {
                    Vec::new()
                };
                let received = comm.broadcast(greeting, root)?;
                comm.barrier()?;
                cohort::Result::Ok((comm.rank(), received))
            })
        })
        .collect();

    for h in handles {
        let (rank, msg) = h.join().expect("rank thread panicked")?;
        println!("rank {rank}: {}", String::from_utf8_lossy(&msg));
    }

    Ok(())
}
