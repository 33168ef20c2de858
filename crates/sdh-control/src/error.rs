//! 控制层错误类型

use sdh_hal::HalError;
use thiserror::Error;

/// 控制错误
#[derive(Debug, Error)]
pub enum ControlError {
    /// 连续错误超过阈值
    #[error("Consecutive hand command failures: {count}, last error: {last_error}")]
    ConsecutiveFailures {
        count: u32,
        #[source]
        last_error: Box<HalError>,
    },

    /// 目标力非法（负数或非有限值）
    #[error("Invalid target force: {0}")]
    InvalidTargetForce(f64),

    /// 手驱动错误
    #[error("Hand error: {0}")]
    Hal(#[from] HalError),
}
