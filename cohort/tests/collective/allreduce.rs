use cohort::transport::Delivery;
use cohort::ReduceOp;

use super::helpers::{ALGORITHMS, run_collective, run_collective_with, with_algorithm};

#[test]
fn test_sum_over_five_ranks() {
    for algorithm in ALGORITHMS {
        let results = run_collective_with(5, Delivery::Buffered, with_algorithm(algorithm), |comm| {
            comm.all_reduce_op(u64::from(comm.rank()) + 1, ReduceOp::Sum)
                .unwrap()
        });
        assert_eq!(results, vec![15; 5], "{algorithm}");
    }
}

#[test]
fn test_min_and_max_over_three_ranks() {
    const VALUES: [i32; 3] = [7, 2, 9];
    for algorithm in ALGORITHMS {
        let results = run_collective_with(3, Delivery::Buffered, with_algorithm(algorithm), |comm| {
            let v = VALUES[comm.rank() as usize];
            let min = comm.all_reduce_op(v, ReduceOp::Min).unwrap();
            let max = comm.all_reduce_op(v, ReduceOp::Max).unwrap();
            (min, max)
        });
        assert_eq!(results, vec![(2, 9); 3], "{algorithm}");
    }
}

#[test]
fn test_single_rank_returns_input() {
    for algorithm in ALGORITHMS {
        let results = run_collective_with(1, Delivery::Buffered, with_algorithm(algorithm), |comm| {
            comm.all_reduce(17i16, |a, b| a * b).unwrap()
        });
        assert_eq!(results, vec![17]);
    }
}

#[test]
fn test_float_sum_within_tolerance() {
    let results = run_collective(6, |comm| {
        let v = 0.1f64 * f64::from(comm.rank() + 1);
        comm.all_reduce_op(v, ReduceOp::Sum).unwrap()
    });
    for r in &results {
        assert!((r - 2.1).abs() < 1e-9, "got {r}");
    }
}

#[test]
fn test_float_sum_agrees_across_group_sizes() {
    for size in 1..=9u32 {
        for algorithm in ALGORITHMS {
            let config = with_algorithm(algorithm);
            let results = run_collective_with(size, Delivery::Buffered, config, move |comm| {
                comm.all_reduce_op(1.0f64 / f64::from(size), ReduceOp::Sum).unwrap()
            });
            for r in results {
                assert!((r - 1.0).abs() < 1e-9, "{algorithm} size {size}: {r}");
            }
        }
    }
}

#[test]
fn test_float_results_identical_on_every_rank() {
    for algorithm in ALGORITHMS {
        for size in [2u32, 4, 7, 8] {
            let results =
                run_collective_with(size, Delivery::Buffered, with_algorithm(algorithm), |comm| {
                    let v = 1.0f64 / f64::from(comm.rank() + 3);
                    comm.all_reduce_op(v, ReduceOp::Sum).unwrap().to_bits()
                });
            assert!(
                results.windows(2).all(|w| w[0] == w[1]),
                "{algorithm} size {size}: {results:?}"
            );
        }
    }
}

#[test]
fn test_vector_elementwise() {
    for algorithm in ALGORITHMS {
        let results = run_collective_with(4, Delivery::Buffered, with_algorithm(algorithm), |comm| {
            let r = comm.rank() as i64;
            comm.all_reduce_op(vec![r, 10 * r, -r], ReduceOp::Sum).unwrap()
        });
        assert!(results.iter().all(|v| v == &vec![6, 60, -6]), "{algorithm}");
    }
}

#[test]
fn test_custom_operator() {
    // Bitwise OR of one-hot masks gathers every rank's bit.
    let results = run_collective(7, |comm| {
        comm.all_reduce(1u32 << comm.rank(), |a, b| a | b).unwrap()
    });
    assert_eq!(results, vec![0b111_1111; 7]);
}

#[test]
fn test_every_size_every_algorithm_rendezvous() {
    for algorithm in ALGORITHMS {
        for size in 1..=9u32 {
            let results =
                run_collective_with(size, Delivery::Rendezvous, with_algorithm(algorithm), |comm| {
                    comm.all_reduce_op(comm.rank(), ReduceOp::Sum).unwrap()
                });
            let expected = size * (size - 1) / 2;
            assert!(
                results.iter().all(|&v| v == expected),
                "{algorithm} size {size}: {results:?}"
            );
        }
    }
}

#[test]
fn test_bool_and_or() {
    let results = run_collective(3, |comm| {
        let mine = comm.rank() != 1;
        let all = comm.all_reduce_op(mine, ReduceOp::Min).unwrap();
        let any = comm.all_reduce_op(mine, ReduceOp::Max).unwrap();
        (all, any)
    });
    assert_eq!(results, vec![(false, true); 3]);
}
