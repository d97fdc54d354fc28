use cohort::transport::Delivery;
use cohort::CohortConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use super::helpers::{run_collective, run_collective_with};

#[test]
fn test_barrier_4_nodes() {
    run_collective(4, |comm| comm.barrier().unwrap());
}

#[test]
fn test_barrier_2_nodes_double() {
    run_collective(2, |comm| {
        comm.barrier().unwrap();
        comm.barrier().unwrap();
    });
}

#[test]
fn test_nobody_leaves_early() {
    for size in [3u32, 5, 8] {
        let arrived = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&arrived);
        let config = CohortConfig::default();
        let seen = run_collective_with(size, Delivery::Rendezvous, config, move |comm| {
            counter.fetch_add(1, Ordering::SeqCst);
            comm.barrier().unwrap();
            counter.load(Ordering::SeqCst)
        });
        assert!(seen.iter().all(|&n| n == size), "size {size}: {seen:?}");
    }
}
