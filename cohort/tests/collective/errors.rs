use cohort::transport::Delivery;
use cohort::{AllReduceAlgorithm, CohortConfig, CohortError, Communicator, ReduceOp};
use std::sync::{Arc, Barrier};

use super::helpers::{run_collective, run_collective_with, run_recorded};

#[test]
fn test_invalid_root_sends_nothing() {
    let ranks = run_recorded(3, Delivery::Rendezvous, CohortConfig::default(), |comm| {
        let err = comm.broadcast(1u32, 3).unwrap_err();
        assert!(matches!(
            err,
            CohortError::InvalidRoot {
                root: 3,
                world_size: 3,
                ..
            }
        ));
        comm.reduce_op(1u32, ReduceOp::Sum, 9).unwrap_err()
    });
    for (err, events) in ranks {
        assert!(err.is_configuration());
        assert!(events.is_empty());
    }
}

#[test]
fn test_mismatched_shapes_fail() {
    let results = run_collective(2, |comm| {
        let len = comm.rank() as usize + 1;
        comm.all_reduce_op(vec![1.0f32; len], ReduceOp::Sum)
    });
    assert!(results.iter().all(Result::is_err));
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(CohortError::BufferSizeMismatch { .. })))
    );
}

#[test]
fn test_mismatched_shapes_fail_every_rank_while_peers_stay_up() {
    let config = CohortConfig {
        all_reduce: AllReduceAlgorithm::Butterfly,
        ..CohortConfig::default()
    };
    // Nobody drops its channel until every rank has returned.
    let done = Arc::new(Barrier::new(2));
    let results = run_collective_with(2, Delivery::Rendezvous, config, move |comm| {
        let len = comm.rank() as usize + 1;
        let out = comm.all_reduce_op(vec![1.0f32; len], ReduceOp::Sum);
        done.wait();
        out
    });
    for result in results {
        assert!(matches!(result, Err(CohortError::BufferSizeMismatch { .. })));
    }
}

#[test]
fn test_vanished_peer_is_reported() {
    let mut comms = Communicator::local(2).unwrap();
    drop(comms.pop());
    let err = comms[0].broadcast(0u64, 1).unwrap_err();
    assert!(matches!(
        err,
        CohortError::CollectiveFailed {
            operation: "broadcast",
            rank: 1,
            ..
        }
    ));
}

#[test]
fn test_group_size_zero_rejected() {
    assert!(matches!(
        Communicator::local(0),
        Err(CohortError::InvalidGroupSize { size: 0 })
    ));
}
