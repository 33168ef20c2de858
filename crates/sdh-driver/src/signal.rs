//! 停止信号
//!
//! 进程级的协作式取消令牌：原子标志用于轮询，crossbeam 通道用于唤醒。
//! `trigger()` 丢弃通道的发送端，所有阻塞在 `wait_timeout` 上的线程立即返回。

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Inner {
    triggered: AtomicBool,
    wake_tx: Mutex<Option<Sender<()>>>,
    wake_rx: Receiver<()>,
}

/// 停止信号（克隆后共享同一状态）
///
/// # Example
///
/// ```
/// use sdh_driver::StopSignal;
/// use std::time::Duration;
///
/// let stop = StopSignal::new();
/// let waiter = stop.clone();
/// assert!(!waiter.wait_timeout(Duration::from_millis(1)));
///
/// stop.trigger();
/// assert!(waiter.is_triggered());
/// assert!(waiter.wait_timeout(Duration::from_secs(60)));
/// ```
#[derive(Debug, Clone)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(Inner {
                triggered: AtomicBool::new(false),
                wake_tx: Mutex::new(Some(wake_tx)),
                wake_rx,
            }),
        }
    }

    /// 置位并唤醒所有等待者（可重复调用）
    pub fn trigger(&self) {
        self.inner.triggered.store(true, Ordering::Release);
        self.inner.wake_tx.lock().take();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::Acquire)
    }

    /// 最多等待 `timeout`，信号置位时提前返回
    ///
    /// 返回 `true` 表示信号已置位。
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        match self.inner.wake_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => self.is_triggered(),
        }
    }

    /// 等到绝对时刻 `deadline`，信号置位时提前返回
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let timeout = deadline.saturating_duration_since(Instant::now());
        self.wait_timeout(timeout)
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_times_out_when_not_triggered() {
        let stop = StopSignal::new();
        let start = Instant::now();
        assert!(!stop.wait_timeout(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_trigger_wakes_waiter_immediately() {
        let stop = StopSignal::new();
        let waiter = stop.clone();
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let triggered = waiter.wait_timeout(Duration::from_secs(10));
            (triggered, start.elapsed())
        });

        thread::sleep(Duration::from_millis(20));
        stop.trigger();

        let (triggered, elapsed) = handle.join().unwrap();
        assert!(triggered);
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let stop = StopSignal::new();
        stop.trigger();
        stop.trigger();
        assert!(stop.is_triggered());
        assert!(stop.wait_until(Instant::now() + Duration::from_secs(10)));
    }

    #[test]
    fn test_wait_until_past_deadline_returns_immediately() {
        let stop = StopSignal::new();
        assert!(!stop.wait_until(Instant::now()));
    }
}
