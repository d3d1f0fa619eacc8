//! Per-operation wall-clock timing
//!
//! Recording is infallible and never feeds back into operation results.

use crate::model::MetricSummary;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

/// Accumulated timing for one operation name
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationStats {
    pub calls: u64,
    pub total: Duration,
    pub last: Duration,
    pub complexity: &'static str,
}

impl OperationStats {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos((self.total.as_nanos() / u128::from(self.calls)) as u64)
        }
    }
}

/// Timing of the most recent operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationTiming {
    pub operation: &'static str,
    pub elapsed: Duration,
    pub complexity: &'static str,
}

/// Timing table owned by the engine
///
/// Interior mutability lets read-only queries record their timing too.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    stats: RefCell<BTreeMap<&'static str, OperationStats>>,
    last: Cell<Option<OperationTiming>>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation: &'static str, complexity: &'static str, elapsed: Duration) {
        let mut stats = self.stats.borrow_mut();
        let entry = stats.entry(operation).or_insert(OperationStats {
            calls: 0,
            total: Duration::ZERO,
            last: Duration::ZERO,
            complexity,
        });
        entry.calls += 1;
        entry.total = entry.total.saturating_add(elapsed);
        entry.last = elapsed;

        self.last.set(Some(OperationTiming {
            operation,
            elapsed,
            complexity,
        }));
    }

    pub fn get(&self, operation: &str) -> Option<OperationStats> {
        self.stats.borrow().get(operation).copied()
    }

    pub fn last(&self) -> Option<OperationTiming> {
        self.last.get()
    }

    pub fn total_calls(&self) -> u64 {
        self.stats.borrow().values().map(|s| s.calls).sum()
    }

    pub fn reset(&self) {
        self.stats.borrow_mut().clear();
        self.last.set(None);
    }

    /// Serializable view keyed by operation name
    pub fn summary(&self) -> BTreeMap<String, MetricSummary> {
        self.stats
            .borrow()
            .iter()
            .map(|(name, stats)| {
                (
                    name.to_string(),
                    MetricSummary {
                        average_micros: stats.average().as_secs_f64() * 1e6,
                        last_micros: stats.last.as_secs_f64() * 1e6,
                        total_calls: stats.calls,
                        complexity: stats.complexity.to_string(),
                    },
                )
            })
            .collect()
    }
}

impl Clone for EngineMetrics {
    fn clone(&self) -> Self {
        Self {
            stats: RefCell::new(self.stats.borrow().clone()),
            last: Cell::new(self.last.get()),
        }
    }
}
