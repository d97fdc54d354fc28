use cohort::transport::{ChannelEvent, Delivery, LocalChannel, RecordingChannel};
use cohort::{AllReduceAlgorithm, CohortConfig, Communicator};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

/// A collective that has not finished by then is treated as deadlocked.
pub const DEADLINE: Duration = Duration::from_secs(30);

pub const ALGORITHMS: [AllReduceAlgorithm; 4] = [
    AllReduceAlgorithm::Auto,
    AllReduceAlgorithm::Butterfly,
    AllReduceAlgorithm::FoldedButterfly,
    AllReduceAlgorithm::Doubling,
];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Run `f` once per rank of a buffered in-process group, each on its own
/// thread, and return the results indexed by rank.
pub fn run_collective<F, R>(world_size: u32, f: F) -> Vec<R>
where
    F: Fn(Communicator<LocalChannel>) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    run_collective_with(world_size, Delivery::Buffered, CohortConfig::default(), f)
}

/// Like [`run_collective`] with explicit delivery mode and config.
pub fn run_collective_with<F, R>(
    world_size: u32,
    delivery: Delivery,
    config: CohortConfig,
    f: F,
) -> Vec<R>
where
    F: Fn(Communicator<LocalChannel>) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    init_tracing();
    let comms = Communicator::local_with(world_size, delivery, config).unwrap();
    run_ranks(comms, f)
}

/// Like [`run_collective_with`], but every rank's channel records its
/// traffic. Returns each rank's result together with its event log.
pub fn run_recorded<F, R>(
    world_size: u32,
    delivery: Delivery,
    config: CohortConfig,
    f: F,
) -> Vec<(R, Vec<ChannelEvent>)>
where
    F: Fn(&Communicator<RecordingChannel<LocalChannel>>) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    init_tracing();
    let comms: Vec<_> = LocalChannel::mesh(world_size, delivery)
        .unwrap()
        .into_iter()
        .map(|ch| {
            let group = ch.group();
            Communicator::with_config(group, RecordingChannel::new(ch), config.clone())
        })
        .collect();
    run_ranks(comms, move |comm| {
        let out = f(&comm);
        (out, comm.channel().events())
    })
}

fn run_ranks<C, F, R>(comms: Vec<Communicator<C>>, f: F) -> Vec<R>
where
    C: cohort::Channel + Send + 'static,
    F: Fn(Communicator<C>) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    let world = comms.len();
    let f = Arc::new(f);
    let (tx, rx) = mpsc::channel();
    for comm in comms {
        let f = Arc::clone(&f);
        let tx = tx.clone();
        std::thread::spawn(move || {
            let rank = comm.rank() as usize;
            let out = f(comm);
            let _ = tx.send((rank, out));
        });
    }
    drop(tx);

    let mut results: Vec<Option<R>> = (0..world).map(|_| None).collect();
    for _ in 0..world {
        let (rank, out) = rx
            .recv_timeout(DEADLINE)
            .expect("a rank panicked or the collective deadlocked");
        results[rank] = Some(out);
    }
    results.into_iter().map(Option::unwrap).collect()
}

/// Buffered communicator config that pins the all-reduce engine.
pub fn with_algorithm(algorithm: AllReduceAlgorithm) -> CohortConfig {
    CohortConfig::default().with_all_reduce(algorithm)
}

