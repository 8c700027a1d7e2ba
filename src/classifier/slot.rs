// Active-model slot with swap-only publication
//
// Readers take the read lock just long enough to clone the Arc, so scoring
// never holds the lock while it works and a swap never waits on scoring.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// A fitted model plus the metadata of the training run that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveModel<M> {
    pub model: M,
    /// Fingerprint of the training set
    pub fingerprint: String,
    pub trained_at: DateTime<Utc>,
    pub example_count: usize,
}

impl<M> ActiveModel<M> {
    pub fn new(model: M, fingerprint: impl Into<String>, example_count: usize) -> Self {
        Self {
            model,
            fingerprint: fingerprint.into(),
            trained_at: Utc::now(),
            example_count,
        }
    }
}

/// Holds the currently active model, if any
pub struct ModelSlot<M> {
    current: RwLock<Option<Arc<ActiveModel<M>>>>,
}

impl<M> ModelSlot<M> {
    pub fn empty() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Consistent view of the active model for one scoring call
    pub fn snapshot(&self) -> Option<Arc<ActiveModel<M>>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the active model, returning the one it displaced
    pub fn publish(&self, model: ActiveModel<M>) -> Option<Arc<ActiveModel<M>>> {
        let next = Arc::new(model);
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current.replace(next)
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }
}

impl<M> Default for ModelSlot<M> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_swaps() {
        let slot: ModelSlot<u32> = ModelSlot::empty();
        assert!(!slot.is_ready());

        assert!(slot.publish(ActiveModel::new(1, "a", 10)).is_none());
        let before = slot.snapshot().unwrap();

        let displaced = slot.publish(ActiveModel::new(2, "b", 20)).unwrap();
        assert_eq!(displaced.model, 1);

        // Earlier snapshots stay intact after the swap
        assert_eq!(before.model, 1);
        assert_eq!(slot.snapshot().unwrap().model, 2);
        assert_eq!(slot.snapshot().unwrap().fingerprint, "b");
    }

    #[test]
    fn test_concurrent_readers_see_whole_models() {
        let slot = Arc::new(ModelSlot::empty());
        slot.publish(ActiveModel::new((0u64, 0u64), "0", 0));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let snap = slot.snapshot().unwrap();
                        assert_eq!(snap.model.0, snap.model.1);
                    }
                })
            })
            .collect();

        for i in 1..200u64 {
            slot.publish(ActiveModel::new((i, i), i.to_string(), 0));
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
