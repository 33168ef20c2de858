//! # SDH Control
//!
//! 触觉力反馈抓取控制：
//!
//! - [`compute_velocities`] / [`is_grasped`]: 比例速度控制律和接触判定
//! - [`GraspSession`]: `Idle → Closing → Grasped | Aborted` 状态机
//! - [`GraspController`]: 固定周期闭环，驱动手闭合到目标接触力后急停

pub mod config;
pub mod controller;
pub mod error;
pub mod law;
pub mod session;

pub use config::GraspConfig;
pub use controller::{GraspController, GraspOutcome};
pub use error::ControlError;
pub use law::{compute_velocities, is_grasped};
pub use session::{GraspPhase, GraspSession, GraspStep};
