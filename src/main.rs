//! Timed LRU - demo workload
//!
//! Builds a cache from environment configuration, drives it from several
//! threads with a mix of puts, gets, refreshes and removes, then prints a
//! JSON statistics report.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timed_lru::{CacheConfig, TimedLruCache};

const WORKER_THREADS: u64 = 4;
const OPS_PER_THREAD: u64 = 20_000;

/// Main entry point for the workload.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (and reaper, if configured)
/// 4. Run the workload on worker threads
/// 5. Print the statistics report and stop the reaper
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timed_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env().context("loading cache configuration")?;
    info!(
        "Configuration loaded: name={}, max_elements={}, default_ttl={}ms, active_reaping={}, ejection_logging={}",
        config.cache_name,
        config.max_elements,
        config.default_ttl_ms,
        config.active_reaping,
        config.ejection_logging
    );

    let cache: TimedLruCache<u64, String> =
        TimedLruCache::from_config(&config).context("building cache")?;

    let key_space = (config.max_elements as u64).saturating_mul(2).max(1);
    let started = Instant::now();

    thread::scope(|scope| {
        for worker in 0..WORKER_THREADS {
            let cache = &cache;
            scope.spawn(move || run_worker(cache, worker, key_space));
        }
    });

    info!("Workload finished in {:?}", started.elapsed());

    let report = cache.report();
    println!("{}", serde_json::to_string_pretty(&report)?);

    cache.set_active_reaping(false)?;
    Ok(())
}

/// One worker's share of the workload. Each worker seeds its own generator
/// so that runs are comparable.
fn run_worker(cache: &TimedLruCache<u64, String>, worker: u64, key_space: u64) {
    let mut rng = StdRng::seed_from_u64(worker);
    for _ in 0..OPS_PER_THREAD {
        let key = rng.gen_range(0..key_space);
        match rng.gen_range(0..10) {
            0..=3 => {
                let ttl = Duration::from_millis(rng.gen_range(1..=50));
                cache.put_with_ttl(key, format!("w{}-{}", worker, key), ttl);
            }
            4 => {
                cache.put(key, format!("w{}-{}", worker, key));
            }
            5 => {
                cache.refresh(&key);
            }
            6 => {
                cache.remove(&key);
            }
            _ => {
                cache.get(&key);
            }
        }
    }
}
