//! 驱动层错误类型定义

use sdh_hal::HalError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 硬件抽象层错误
    #[error("HAL error: {0}")]
    Hal(#[from] HalError),

    /// 后台线程创建失败
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// 后台线程 panic
    #[error("Thread panicked: {0}")]
    ThreadPanicked(String),

    /// 轮询器已经停止（传感器已交还）
    #[error("Poller already stopped")]
    AlreadyStopped,
}
