//! All-reduce across 4 in-process ranks.
//!
//! Each rank starts with its own vector. After `all_reduce_op(Sum)`, every
//! rank holds the element-wise sum of all inputs.
//!
//! ```bash
//! COHORT_ALLREDUCE_ALGORITHM=doubling RUST_LOG=cohort=debug cargo run --example allreduce
//! ```

use cohort::{CohortConfig, Communicator, Delivery, ReduceOp};
use tracing_subscriber::EnvFilter;

fn main() -> cohort::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let world_size = 4u32;
    let count = 8usize;
    let config = CohortConfig::from_env();
    let comms = Communicator::local_with(world_size, Delivery::Buffered, config)?;

    let handles: Vec<_> = comms
        .into_iter()
        .map(|comm| {
            std::thread::spawn(move || {
                let rank = comm.rank();
                let data = vec![rank as f32; count];
                let data = comm.all_reduce_op(data, ReduceOp::Sum)?;
                cohort::Result::Ok((rank, comm.resolved_all_reduce(), data))
            })
        })
        .collect();

    for h in handles {
        let (rank, algorithm, data) = h.join().expect("rank thread panicked")?;
        println!("rank {rank} ({algorithm}): {data:?}");
    }
    // Output (all ranks identical):
    // rank 0 (butterfly): [6.0, 6.0, 6.0, 6.0, 6.0, 6.0, 6.0, 6.0]
    // rank 1 (butterfly): [6.0, 6.0, 6.0, 6.0, 6.0, 6.0, 6.0, 6.0]
    // ...

    Ok(())
}
