use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, OnceLock,
    },
};

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CancelError {
    #[error("task not found")]
    NotFound(String),
}

/// Fires the cancellation of one running step.
///
/// The first fire wins the reason; later fires are no-ops.
#[derive(Debug, Clone, Default)]
pub struct CancelTrigger {
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl CancelTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self, reason: Option<&str>) {
        if let Some(reason) = reason {
            let _ = self.reason.set(reason.to_owned());
        }
        self.token.cancel();
    }

    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// who asked for the cancellation, if the caller said so
    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(|s| s.as_str())
    }
}

struct Entry {
    generation: u64,
    // tag of the plugin running the step
    owner: Option<String>,
    trigger: CancelTrigger,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<String, Entry>>,
    generation: AtomicU64,
}

impl Inner {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // the map stays consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// In-process map from step id to the trigger that cancels it.
///
/// Cheap to clone; clones share the same map.
#[derive(Clone, Default)]
pub struct CancelRegistry {
    inner: Arc<Inner>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh trigger for `step_id`, silently replacing a stale one.
    ///
    /// The entry lives as long as the returned guard.
    pub fn register(&self, step_id: impl Into<String>) -> Registration {
        self.insert(None, step_id.into())
    }

    /// Like [`register`](Self::register), recording the plugin that runs the
    /// step so only cancels addressed to it reach the step.
    pub fn register_owned(&self, owner: &str, step_id: impl Into<String>) -> Registration {
        self.insert(Some(owner.to_owned()), step_id.into())
    }

    fn insert(&self, owner: Option<String>, step_id: String) -> Registration {
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let trigger = CancelTrigger::new();
        self.inner.entries().insert(
            step_id.clone(),
            Entry {
                generation,
                owner,
                trigger: trigger.clone(),
            },
        );
        Registration {
            inner: self.inner.clone(),
            step_id,
            generation,
            trigger,
        }
    }

    pub fn cancel(&self, step_id: &str) -> Result<(), CancelError> {
        self.cancel_with_reason(step_id, None)
    }

    pub fn cancel_with_reason(&self, step_id: &str, reason: Option<&str>) -> Result<(), CancelError> {
        let trigger = self
            .inner
            .entries()
            .get(step_id)
            .map(|entry| entry.trigger.clone())
            .ok_or_else(|| CancelError::NotFound(step_id.to_owned()))?;
        trigger.fire(reason);
        Ok(())
    }

    /// Cancel `step_id` only if the plugin `owner` runs it; a step of another
    /// plugin is reported as not found.
    pub fn cancel_owned(
        &self,
        owner: &str,
        step_id: &str,
        reason: Option<&str>,
    ) -> Result<(), CancelError> {
        let trigger = self
            .inner
            .entries()
            .get(step_id)
            .filter(|entry| entry.owner.as_deref() == Some(owner))
            .map(|entry| entry.trigger.clone())
            .ok_or_else(|| CancelError::NotFound(step_id.to_owned()))?;
        trigger.fire(reason);
        Ok(())
    }

    pub fn owner(&self, step_id: &str) -> Option<String> {
        self.inner
            .entries()
            .get(step_id)
            .and_then(|entry| entry.owner.clone())
    }

    /// Fire every registered trigger, returns how many were fired.
    pub fn cancel_all(&self, reason: Option<&str>) -> usize {
        let triggers = self
            .inner
            .entries()
            .values()
            .map(|entry| entry.trigger.clone())
            .collect::<Vec<_>>();
        triggers.iter().for_each(|trigger| trigger.fire(reason));
        triggers.len()
    }

    pub fn unregister(&self, step_id: &str) {
        self.inner.entries().remove(step_id);
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.inner.entries().contains_key(step_id)
    }

    pub fn len(&self) -> usize {
        self.inner.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scope guard of a registered step, unregisters it on drop.
pub struct Registration {
    inner: Arc<Inner>,
    step_id: String,
    generation: u64,
    trigger: CancelTrigger,
}

impl Registration {
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn trigger(&self) -> &CancelTrigger {
        &self.trigger
    }

    pub fn token(&self) -> &CancellationToken {
        self.trigger.token()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut entries = self.inner.entries();
        if entries
            .get(&self.step_id)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            entries.remove(&self.step_id);
        }
    }
}
