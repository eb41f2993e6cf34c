use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use hybris_value::{EvalResult, Object};

type Handle = JoinHandle<EvalResult<Object>>;

/// Script threads started with `pthread_create`.
#[derive(Default)]
pub struct ThreadRegistry {
    next_id: AtomicI64,
    handles: Mutex<FxHashMap<i64, Handle>>,
    running: Arc<AtomicUsize>,
}

/// Decrements the running count when a thread body ends, panics included.
struct Running(Arc<AtomicUsize>);

impl Drop for Running {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `body` on a new OS thread and return its script-visible id.
    pub fn spawn<F>(&self, name: &str, body: F) -> std::io::Result<i64>
    where
        F: FnOnce() -> EvalResult<Object> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let running = Arc::clone(&self.running);
        running.fetch_add(1, Ordering::AcqRel);

        let spawned = std::thread::Builder::new()
            .name(format!("hybris-{name}-{id}"))
            .spawn(move || {
                let _running = Running(running);
                body()
            });
        match spawned {
            Ok(handle) => {
                self.handles.lock().insert(id, handle);
                tracing::debug!(id, function = name, "thread started");
                Ok(id)
            }
            Err(err) => {
                self.running.fetch_sub(1, Ordering::AcqRel);
                Err(err)
            }
        }
    }

    /// Wait for thread `id`. `None` if no such thread is joinable.
    pub fn join(&self, id: i64) -> Option<std::thread::Result<EvalResult<Object>>> {
        let handle = self.handles.lock().remove(&id)?;
        Some(handle.join())
    }

    /// Wait for every thread that was never joined.
    pub fn join_all(&self) -> Vec<std::thread::Result<EvalResult<Object>>> {
        let handles: Vec<Handle> = {
            let mut handles = self.handles.lock();
            let mut ids: Vec<i64> = handles.keys().copied().collect();
            ids.sort_unstable();
            ids.into_iter().filter_map(|id| handles.remove(&id)).collect()
        };
        handles.into_iter().map(JoinHandle::join).collect()
    }

    /// Threads whose body has not finished yet.
    pub fn running(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }
}
