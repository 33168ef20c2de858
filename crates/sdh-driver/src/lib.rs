//! # SDH Driver
//!
//! 力采样的后台轮询和共享状态：
//!
//! - [`ForceStore`]: `ArcSwap` 快照存储，轮询线程整体替换、读者无锁加载
//! - [`SensorPoller`]: 周期读取触觉传感器的后台线程
//! - [`StopSignal`]: 进程级协作式取消令牌，可立即唤醒等待者

pub mod error;
pub mod metrics;
pub mod poller;
pub mod signal;
pub mod state;

pub use error::DriverError;
pub use metrics::{PollerMetrics, PollerMetricsSnapshot};
pub use poller::{DEFAULT_POLL_PERIOD, POLLER_THREAD_NAME, SensorPoller, poll_cycle};
pub use signal::StopSignal;
pub use state::{ForceState, ForceStore, stale_bit};
