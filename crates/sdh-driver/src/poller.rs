//! 力采样轮询线程
//!
//! 后台线程周期性地读取 3 根手指 × 2 个触觉垫的接触力，构建新的 [`ForceState`]
//! 并整体发布到 [`ForceStore`]。每个周期结束后在停止信号上等待一个周期，
//! 停止请求会立即唤醒线程；线程只在周期边界检查停止信号，不会在读取中途被打断。
//!
//! 单个触觉垫读取失败不会中断周期：沿用上一周期的值，并在 `stale_mask` 中标记。

use crate::error::DriverError;
use crate::metrics::{PollerMetrics, PollerMetricsSnapshot};
use crate::signal::StopSignal;
use crate::state::{ForceState, ForceStore, stale_bit};
use sdh_hal::TactileSensor;
use sdh_protocol::{NUM_FINGERS, Pad};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{Builder, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 轮询线程名
pub const POLLER_THREAD_NAME: &str = "sdh-force-poller";

/// 默认轮询周期
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(500);

/// 力采样轮询器
///
/// 线程在运行期间独占触觉传感器，[`stop`](Self::stop) 之后交还。
pub struct SensorPoller<T> {
    handle: Option<JoinHandle<T>>,
    stop: StopSignal,
    metrics: Arc<PollerMetrics>,
    period: Duration,
}

impl<T> SensorPoller<T>
where
    T: TactileSensor + Send + 'static,
{
    /// 启动轮询线程
    ///
    /// # 错误
    ///
    /// 线程创建失败时返回 `DriverError::ThreadSpawn`（传感器随闭包一起被丢弃）。
    pub fn start(
        sensor: T,
        store: ForceStore,
        stop: StopSignal,
        period: Duration,
    ) -> Result<Self, DriverError> {
        let metrics = Arc::new(PollerMetrics::new());

        let stop_clone = stop.clone();
        let metrics_clone = metrics.clone();
        let handle = Builder::new()
            .name(POLLER_THREAD_NAME.to_string())
            .spawn(move || poll_loop(sensor, store, stop_clone, period, metrics_clone))
            .map_err(DriverError::ThreadSpawn)?;

        info!("Force poller spawned (period: {:?})", period);
        Ok(Self {
            handle: Some(handle),
            stop,
            metrics,
            period,
        })
    }

    /// 置位停止信号并等待线程退出，交还触觉传感器
    ///
    /// 线程在一个轮询周期内观察到信号。
    pub fn stop(&mut self) -> Result<T, DriverError> {
        let handle = self.handle.take().ok_or(DriverError::AlreadyStopped)?;
        self.stop.trigger();

        let started = Instant::now();
        let sensor = handle.join().map_err(|payload| {
            let message = panic_message(payload.as_ref());
            error!("Force poller panicked: {}", message);
            DriverError::ThreadPanicked(message)
        })?;

        debug!("Force poller joined in {:?}", started.elapsed());
        Ok(sensor)
    }
}

impl<T> SensorPoller<T> {
    /// 线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// 指标快照
    pub fn metrics(&self) -> PollerMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl<T> Drop for SensorPoller<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.trigger();
            if handle.join().is_err() {
                error!("Force poller panicked during drop");
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// 执行一个轮询周期，返回待发布的新状态
///
/// 读取失败或读数非有限的触觉垫沿用 `previous` 中的值。
pub fn poll_cycle<T: TactileSensor>(
    sensor: &mut T,
    previous: &ForceState,
    metrics: &PollerMetrics,
) -> ForceState {
    let mut sample = previous.sample;
    let mut stale_mask = 0u8;

    for finger in 0..NUM_FINGERS {
        for pad in Pad::ALL {
            match sensor.get_contact_force(finger, pad) {
                Ok(contact) if contact.force.is_finite() => {
                    sample.forces[finger][pad.index()] = contact.force
                },
                Ok(contact) => {
                    warn!(
                        "Non-finite tactile reading {} (finger {}, pad {:?}), keeping previous value",
                        contact.force, finger, pad
                    );
                    metrics.read_failures.fetch_add(1, Ordering::Relaxed);
                    stale_mask |= stale_bit(finger, pad);
                },
                Err(e) => {
                    warn!(
                        "Tactile read failed (finger {}, pad {:?}), keeping previous value: {}",
                        finger, pad, e
                    );
                    metrics.read_failures.fetch_add(1, Ordering::Relaxed);
                    stale_mask |= stale_bit(finger, pad);
                },
            }
        }
    }

    ForceState {
        sample,
        cycle: previous.cycle + 1,
        stale_mask,
        updated_at: Some(Instant::now()),
    }
}

fn poll_loop<T: TactileSensor>(
    mut sensor: T,
    store: ForceStore,
    stop: StopSignal,
    period: Duration,
    metrics: Arc<PollerMetrics>,
) -> T {
    debug!("Force poller thread running");

    while !stop.is_triggered() {
        let previous = store.snapshot();
        let next = poll_cycle(&mut sensor, &previous, &metrics);
        store.publish(next);
        metrics.cycles.fetch_add(1, Ordering::Relaxed);

        if stop.wait_timeout(period) {
            break;
        }
    }

    info!("Force poller stopped ({})", metrics.snapshot());
    sensor
}
