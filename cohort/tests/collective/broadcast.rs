use cohort::transport::Delivery;
use cohort::CohortConfig;

use super::helpers::{run_collective, run_collective_with};

#[test]
fn test_broadcast_from_nonzero_root() {
    let results = run_collective(4, |comm| {
        let value: u64 = if comm.rank() == 2 { 42 } else { 0 };
        comm.broadcast(value, 2).unwrap()
    });
    assert_eq!(results, vec![42; 4]);
}

#[test]
fn test_broadcast_vector_from_root_0() {
    let results = run_collective(3, |comm| {
        let data: Vec<f32> = if comm.rank() == 0 {
            vec![42.0, 43.0, 44.0, 45.0]
        } else {
            vec![0.0; 4]
        };
        comm.broadcast(data, 0).unwrap()
    });
    for (rank, data) in results.iter().enumerate() {
        assert_eq!(data, &vec![42.0, 43.0, 44.0, 45.0], "rank {rank} broadcast failed");
    }
}

#[test]
fn test_broadcast_non_root_shape_is_ignored() {
    let results = run_collective(5, |comm| {
        let data: Vec<i32> = if comm.rank() == 0 { vec![7, 8, 9] } else { Vec::new() };
        comm.broadcast(data, 0).unwrap()
    });
    assert!(results.iter().all(|d| d == &vec![7, 8, 9]));
}

#[test]
fn test_broadcast_single_rank() {
    let results = run_collective(1, |comm| comm.broadcast(5u8, 0).unwrap());
    assert_eq!(results, vec![5]);
}

#[test]
fn test_broadcast_every_root_rendezvous() {
    for size in 1..=9u32 {
        for root in 0..size {
            let config = CohortConfig::default();
            let results = run_collective_with(size, Delivery::Rendezvous, config, move |comm| {
                let value = [comm.rank(), root * 10];
                comm.broadcast(value, root).unwrap()
            });
            assert!(
                results.iter().all(|v| *v == [root, root * 10]),
                "size {size} root {root}: {results:?}"
            );
        }
    }
}

#[test]
fn test_back_to_back_broadcasts_keep_order() {
    let results = run_collective(6, |comm| {
        (0..4u32)
            .map(|round| {
                let root = round % comm.size();
                comm.broadcast(comm.rank() * 100 + round, root).unwrap()
            })
            .collect::<Vec<_>>()
    });
    for out in results {
        assert_eq!(out, vec![0, 101, 202, 303]);
    }
}

#[test]
fn test_repeated_broadcast_is_stable() {
    let results = run_collective(5, |comm| {
        let value: i64 = if comm.rank() == 4 { -17 } else { comm.rank().into() };
        let first = comm.broadcast(value, 4).unwrap();
        let second = comm.broadcast(value, 4).unwrap();
        (first, second)
    });
    assert_eq!(results, vec![(-17, -17); 5]);
}
