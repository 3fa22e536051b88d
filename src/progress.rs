//! Progress reporting
//!
//! A [`ProgressAggregator`] owns one slot per member of a batch. Each member
//! upload receives a [`ProgressSlot`], a handle that can only write its own
//! slot; every write recomputes the batch value as the mean of all slots and
//! forwards it to the caller's callback.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Progress of one upload, or of a whole batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadProgress {
    /// Completed fraction, normally within [0.0, 1.0]; not clamped
    pub value: f64,
    pub bytes_uploaded: Option<u64>,
    pub total_bytes: Option<u64>,
}

impl UploadProgress {
    pub fn fraction(value: f64) -> Self {
        Self {
            value,
            bytes_uploaded: None,
            total_bytes: None,
        }
    }

    pub fn bytes(bytes_uploaded: u64, total_bytes: u64) -> Self {
        let value = if total_bytes > 0 {
            bytes_uploaded as f64 / total_bytes as f64
        } else {
            0.0
        };

        Self {
            value,
            bytes_uploaded: Some(bytes_uploaded),
            total_bytes: Some(total_bytes),
        }
    }

    pub fn complete() -> Self {
        Self::fraction(1.0)
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

struct Slots {
    values: Vec<AtomicU64>,
    on_progress: ProgressCallback,
}

impl Slots {
    fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }

        let sum: f64 = self
            .values
            .iter()
            .map(|slot| f64::from_bits(slot.load(Ordering::Acquire)))
            .sum();
        sum / self.values.len() as f64
    }

    fn store(&self, index: usize, value: f64) {
        self.values[index].store(value.to_bits(), Ordering::Release);
        (self.on_progress)(UploadProgress::fraction(self.mean()));
    }
}

/// Combines the progress of N independent uploads into one value
#[derive(Clone)]
pub struct ProgressAggregator {
    slots: Arc<Slots>,
}

impl fmt::Debug for ProgressAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressAggregator")
            .field("members", &self.slots.values.len())
            .field("aggregate", &self.aggregate())
            .finish()
    }
}

impl ProgressAggregator {
    /// Creates an aggregator for `members` uploads, all starting at 0
    pub fn new(members: usize, on_progress: ProgressCallback) -> Self {
        let values = (0..members).map(|_| AtomicU64::new(0f64.to_bits())).collect();
        Self {
            slots: Arc::new(Slots {
                values,
                on_progress,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.values.is_empty()
    }

    /// Write handle for member `index`
    pub fn slot(&self, index: usize) -> Option<ProgressSlot> {
        (index < self.len()).then(|| ProgressSlot {
            index,
            slots: self.slots.clone(),
        })
    }

    /// Records `value` for member `index` and forwards the new mean
    pub fn update(&self, index: usize, value: f64) {
        if index < self.len() {
            self.slots.store(index, value);
        }
    }

    /// Mean of all member values
    pub fn aggregate(&self) -> f64 {
        self.slots.mean()
    }
}

/// Handle that writes a single member's slot
#[derive(Clone)]
pub struct ProgressSlot {
    index: usize,
    slots: Arc<Slots>,
}

impl fmt::Debug for ProgressSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSlot")
            .field("index", &self.index)
            .finish()
    }
}

impl ProgressSlot {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn report(&self, value: f64) {
        self.slots.store(self.index, value);
    }

    /// Adapts the slot into a per-file progress callback
    pub fn into_callback(self) -> ProgressCallback {
        Arc::new(move |progress: UploadProgress| self.report(progress.value))
    }
}
