//! 轮询线程指标（原子计数器）

use std::sync::atomic::{AtomicU64, Ordering};

/// 轮询线程指标
#[derive(Debug, Default)]
pub struct PollerMetrics {
    /// 已完成的轮询周期
    pub cycles: AtomicU64,
    /// 单个触觉垫读取失败次数
    pub read_failures: AtomicU64,
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollerMetricsSnapshot {
    pub cycles: u64,
    pub read_failures: u64,
}

impl PollerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PollerMetricsSnapshot {
        PollerMetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for PollerMetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cycles={}, read_failures={}", self.cycles, self.read_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_display() {
        let metrics = PollerMetrics::new();
        metrics.cycles.fetch_add(3, Ordering::Relaxed);
        metrics.read_failures.fetch_add(1, Ordering::Relaxed);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot, PollerMetricsSnapshot { cycles: 3, read_failures: 1 });
        assert_eq!(snapshot.to_string(), "cycles=3, read_failures=1");
    }
}
