use cohort::ReduceOp;

use super::helpers::run_collective;

#[test]
fn test_reduce_only_root_gets_result() {
    for root in 0..5u32 {
        let results = run_collective(5, move |comm| {
            comm.reduce_op(comm.rank() + 1, ReduceOp::Sum, root).unwrap()
        });
        for (rank, out) in results.iter().enumerate() {
            if rank as u32 == root {
                assert_eq!(*out, Some(15));
            } else {
                assert_eq!(*out, None, "rank {rank} root {root}");
            }
        }
    }
}

#[test]
fn test_reduce_vector_product() {
    let results = run_collective(3, |comm| {
        let r = comm.rank() as u16 + 2;
        comm.reduce_op([r, 1, r], ReduceOp::Prod, 1).unwrap()
    });
    assert_eq!(results, vec![None, Some([24, 1, 24]), None]);
}
