//! TTL Reaper Task
//!
//! Background thread that removes expired cache entries without waiting for
//! a caller to touch them.
//!
//! The thread holds the cache lock except while waiting on the condition
//! variable. It sleeps until the soonest expiration, or indefinitely when the
//! cache is empty, and is woken early by any mutation that could move the
//! soonest expiration or by a stop request.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info};

use crate::cache::{EjectionReason, Shared};

/// Spawns the reaper thread for a cache.
///
/// The caller sets the keep-running flag before spawning and stops the thread
/// by clearing it, notifying the condition variable and joining the handle.
///
/// # Example
/// ```ignore
/// shared.state.lock().reaping = true;
/// let handle = spawn_reaper(shared.clone(), "sessions")?;
/// ```
pub(crate) fn spawn_reaper<K, V>(shared: Arc<Shared<K, V>>, cache_name: &str) -> io::Result<JoinHandle<()>>
where
    K: Eq + std::hash::Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    let name = cache_name.to_string();
    thread::Builder::new()
        .name(format!("{} reaper", cache_name))
        .spawn(move || run(&shared, &name))
}

fn run<K, V>(shared: &Shared<K, V>, name: &str)
where
    K: Eq + std::hash::Hash + Clone,
    V: Clone,
{
    info!(cache = name, "{}: active reaping started", name);

    let mut state = shared.state.lock();
    while state.reaping {
        let swept = panic::catch_unwind(AssertUnwindSafe(|| {
            state.store.clear_stale(Instant::now(), EjectionReason::Reaped)
        }));
        match swept {
            Ok(0) => {}
            Ok(removed) => debug!(cache = name, removed, "{}: reaped {} expired entries", name, removed),
            Err(_) => error!(cache = name, "{}: reaper sweep panicked, continuing", name),
        }

        match state.store.next_expiration() {
            None => shared.wake.wait(&mut state),
            Some(deadline) => {
                let _ = shared.wake.wait_until(&mut state, deadline);
            }
        }
    }
}
