//! Single-flight gate serializing concurrent variant creation.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tokio::sync::Mutex;

/// Process-wide gate used by the thumb engine.
pub(crate) static CREATE_GATE: LazyLock<CreateGate> = LazyLock::new(CreateGate::new);

/// Serializes critical sections by string key.
///
/// Two concurrent `run` calls with the same key execute one after the
/// other; distinct keys do not block each other. An entry is removed
/// again once the last caller holding it finishes, so the map does not
/// grow with the number of distinct keys ever seen.
#[derive(Debug, Default)]
pub(crate) struct CreateGate {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CreateGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Run `task` while holding the lock for `key`.
    pub(crate) async fn run<F, T>(&self, key: &str, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let lock = Arc::clone(&self.locks.entry(key.to_string()).or_default());

        let result = {
            let _guard = lock.lock().await;
            task.await
        };

        drop(lock);
        self.locks.remove_if(key, |_, v| Arc::strong_count(v) == 1);

        result
    }
}
