use cohort::transport::TcpChannel;
use cohort::{CohortConfig, Communicator, Group, ReduceOp};
use std::net::{SocketAddr, TcpListener};

use super::helpers::init_tracing;

/// Form a loopback TCP group and run `f` on every rank.
fn run_tcp<F, R>(size: u32, f: F) -> Vec<R>
where
    F: Fn(Communicator<TcpChannel>) -> R + Send + Sync + Clone + 'static,
    R: Send + 'static,
{
    init_tracing();
    let listeners: Vec<_> = (0..size)
        .map(|_| TcpListener::bind("127.0.0.1:0").unwrap())
        .collect();
    let addrs: Vec<SocketAddr> = listeners.iter().map(|l| l.local_addr().unwrap()).collect();

    let handles: Vec<_> = listeners
        .into_iter()
        .enumerate()
        .map(|(rank, listener)| {
            let addrs = addrs.clone();
            let f = f.clone();
            std::thread::spawn(move || {
                let group = Group::new(rank as u32, size).unwrap();
                let config = CohortConfig::default();
                let channel = TcpChannel::with_listener(group, listener, &addrs, &config).unwrap();
                f(Communicator::with_config(group, channel, config))
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_tcp_broadcast_and_all_reduce() {
    let results = run_tcp(4, |comm| {
        let b = comm.broadcast(comm.rank() * 7, 3).unwrap();
        let s = comm.all_reduce_op(u64::from(comm.rank()) + 1, ReduceOp::Sum).unwrap();
        comm.barrier().unwrap();
        (b, s)
    });
    assert_eq!(results, vec![(21, 10); 4]);
}

#[test]
fn test_tcp_non_power_of_two() {
    let results = run_tcp(3, |comm| {
        let v: Vec<f64> = vec![f64::from(comm.rank()); 1024];
        let out = comm.all_reduce_op(v, ReduceOp::Max).unwrap();
        let root = comm.reduce_op(comm.rank(), ReduceOp::Min, 2).unwrap();
        comm.barrier().unwrap();
        (out.iter().all(|&x| x == 2.0), root)
    });
    assert_eq!(results, vec![(true, None), (true, None), (true, Some(0))]);
}
