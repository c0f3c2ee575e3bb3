/// Concurrency management for VarFlow.
/// Configures the thread pool used for parallel multi-file indexing.

use anyhow::Result;

/// Initialize the global rayon thread pool with controlled worker count.
/// Reserves ~50% of CPU capacity so the hosting editor/selection surface
/// stays responsive while indexing runs.
pub fn init_thread_pool() -> Result<()> {
    let cores = num_cpus::get();
    let workers = std::cmp::max(1, cores / 2);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    println!(
        "[VarFlow] Initialized thread pool: {} workers (system has {} cores)",
        workers, cores
    );

    Ok(())
}
