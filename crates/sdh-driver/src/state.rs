//! 力采样快照存储
//!
//! 轮询线程是唯一写者：每个周期构建一个完整的 [`ForceState`]，
//! 再通过一次 `ArcSwap::store` 整体发布。读者无锁加载，总能看到一致的快照。

use arc_swap::ArcSwap;
use sdh_protocol::{ForceSample, NUM_PADS, Pad};
use std::sync::Arc;
use std::time::Instant;

/// 已发布的力状态
#[derive(Debug, Clone, PartialEq)]
pub struct ForceState {
    /// 最新力采样
    pub sample: ForceSample,
    /// 轮询周期计数（0 = 尚未完成任何周期）
    pub cycle: u64,
    /// 本周期读取失败、沿用上一周期值的触觉垫（bit `2*finger+pad`）
    pub stale_mask: u8,
    /// 发布时间
    pub updated_at: Option<Instant>,
}

impl ForceState {
    /// 启动时的全零状态
    pub fn initial() -> Self {
        Self {
            sample: ForceSample::ZERO,
            cycle: 0,
            stale_mask: 0,
            updated_at: None,
        }
    }

    /// 触觉垫在本周期是否为陈旧值
    pub fn is_stale(&self, finger: usize, pad: Pad) -> bool {
        self.stale_mask & stale_bit(finger, pad) != 0
    }
}

impl Default for ForceState {
    fn default() -> Self {
        Self::initial()
    }
}

/// 触觉垫对应的陈旧位
pub fn stale_bit(finger: usize, pad: Pad) -> u8 {
    1 << (finger * NUM_PADS + pad.index())
}

/// 力采样快照存储（克隆后共享）
#[derive(Debug, Clone)]
pub struct ForceStore {
    inner: Arc<ArcSwap<ForceState>>,
}

impl ForceStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(ForceState::initial())),
        }
    }

    /// 整体替换快照
    pub fn publish(&self, state: ForceState) {
        self.inner.store(Arc::new(state));
    }

    /// 最新力采样
    pub fn latest(&self) -> ForceSample {
        self.inner.load().sample
    }

    /// 完整状态快照
    pub fn snapshot(&self) -> ForceState {
        self.inner.load().as_ref().clone()
    }

    /// 重置为全零
    pub fn reset(&self) {
        self.publish(ForceState::initial());
    }
}

impl Default for ForceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_initial_snapshot_is_zero() {
        let store = ForceStore::new();
        assert_eq!(store.latest(), ForceSample::ZERO);
        assert_eq!(store.snapshot().cycle, 0);
        assert!(store.snapshot().updated_at.is_none());
    }

    #[test]
    fn test_publish_replaces_whole_snapshot() {
        let store = ForceStore::new();
        let reader = store.clone();
        store.publish(ForceState {
            sample: ForceSample::new([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]),
            cycle: 7,
            stale_mask: stale_bit(1, Pad::Distal),
            updated_at: Some(Instant::now()),
        });

        let state = reader.snapshot();
        assert_eq!(state.cycle, 7);
        assert_eq!(state.sample.get(2, Pad::Proximal), 5.0);
        assert!(state.is_stale(1, Pad::Distal));
        assert!(!state.is_stale(1, Pad::Proximal));

        store.reset();
        assert_eq!(reader.snapshot(), ForceState::initial());
    }

    #[test]
    fn test_stale_bits_are_distinct() {
        let mut seen = 0u8;
        for finger in 0..3 {
            for pad in Pad::ALL {
                let bit = stale_bit(finger, pad);
                assert_eq!(seen & bit, 0);
                seen |= bit;
            }
        }
        assert_eq!(seen, 0b11_1111);
    }

    #[test]
    fn test_readers_never_see_partial_sample() {
        // 写者每次发布所有元素相等的矩阵，读者检查一致性
        let store = ForceStore::new();
        let writer = store.clone();
        let handle = thread::spawn(move || {
            for i in 1..=2000u64 {
                let v = i as f64;
                writer.publish(ForceState {
                    sample: ForceSample::new([[v; 2]; 3]),
                    cycle: i,
                    stale_mask: 0,
                    updated_at: None,
                });
            }
        });

        for _ in 0..2000 {
            let flat = store.latest().flatten();
            assert!(flat.iter().all(|x| *x == flat[0]));
        }
        handle.join().unwrap();
        assert_eq!(store.snapshot().cycle, 2000);
    }
}
