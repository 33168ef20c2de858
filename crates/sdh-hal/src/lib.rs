//! # SDH Hardware Abstraction Layer
//!
//! 三指手和触觉传感器阵列的硬件抽象层。
//!
//! - [`HandDriver`]: 关节控制（控制模式、目标速度/加速度/角度、运动、急停、读关节角）
//! - [`TactileSensor`]: 触觉传感器（启动后台更新、读取接触信息）
//!
//! 真实设备的厂商驱动不在本 crate 内；`sim` feature 提供一套纯软件仿真后端，
//! 手和传感器共享同一个仿真世界，因此关节闭合会反映到接触力上。

use sdh_protocol::{JointAngles, NUM_AXES, NUM_FINGERS, Pad};
use thiserror::Error;

#[cfg(feature = "sim")]
pub mod sim;

#[cfg(feature = "sim")]
pub use sim::{SimConfig, SimHand, SimTactile, SimWorld, pair as sim_pair};

/// 硬件抽象层统一错误类型
#[derive(Error, Debug)]
pub enum HalError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] HalDeviceError),
    #[error("Device not open")]
    NotOpen,
    #[error("Tactile updater not started")]
    NotStarted,
    #[error("Invalid axis index: {0}")]
    InvalidAxis(usize),
    #[error("Invalid tactile sensor: finger {finger}, pad {pad:?}")]
    InvalidSensor { finger: usize, pad: Pad },
}

/// 设备错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalDeviceErrorKind {
    Unknown,
    NotFound,
    AccessDenied,
    Busy,
    InvalidResponse,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct HalDeviceError {
    pub kind: HalDeviceErrorKind,
    pub message: String,
}

impl HalDeviceError {
    pub fn new(kind: HalDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 是否为不可恢复错误（设备不存在、无权限）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            HalDeviceErrorKind::NotFound | HalDeviceErrorKind::AccessDenied
        )
    }
}

impl From<&str> for HalDeviceError {
    fn from(message: &str) -> Self {
        Self::new(HalDeviceErrorKind::Unknown, message)
    }
}

impl From<String> for HalDeviceError {
    fn from(message: String) -> Self {
        Self::new(HalDeviceErrorKind::Unknown, message)
    }
}

impl HalError {
    /// 错误是否意味着设备已不可用
    pub fn is_fatal(&self) -> bool {
        match self {
            HalError::Device(e) => e.is_fatal(),
            HalError::NotOpen => true,
            _ => false,
        }
    }
}

/// 轴集合（位掩码，bit i 对应轴 i）
///
/// # Example
///
/// ```
/// use sdh_hal::AxisSet;
///
/// let set = AxisSet::from_axes(&[1, 3]).unwrap();
/// assert!(set.contains(3));
/// assert!(!set.contains(0));
/// assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 3]);
/// assert_eq!(AxisSet::ALL.len(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisSet(u8);

impl AxisSet {
    /// 全部 7 个轴
    pub const ALL: AxisSet = AxisSet((1 << NUM_AXES) - 1);
    /// 空集合
    pub const NONE: AxisSet = AxisSet(0);

    /// 单个轴
    pub fn single(axis: usize) -> Result<Self, HalError> {
        if axis >= NUM_AXES {
            return Err(HalError::InvalidAxis(axis));
        }
        Ok(AxisSet(1 << axis))
    }

    pub fn from_axes(axes: &[usize]) -> Result<Self, HalError> {
        axes.iter()
            .try_fold(AxisSet::NONE, |set, &axis| Ok(set.with(AxisSet::single(axis)?)))
    }

    /// 并集
    pub fn with(self, other: AxisSet) -> Self {
        AxisSet(self.0 | other.0)
    }

    pub fn contains(&self, axis: usize) -> bool {
        axis < NUM_AXES && self.0 & (1 << axis) != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..NUM_AXES).filter(move |axis| self.contains(*axis))
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl Default for AxisSet {
    fn default() -> Self {
        AxisSet::ALL
    }
}

/// 关节控制模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControllerMode {
    /// 位置模式：`set_axis_target_angle` + `move_axis`
    #[default]
    Pose,
    /// 速度模式：目标速度立即生效
    Velocity,
    /// 速度-加速度模式：实际速度按目标加速度逼近目标速度
    VelocityAcceleration,
}

/// 单个触觉垫的接触信息
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactInfo {
    /// 接触力
    pub force: f64,
    /// 接触重心 x（mm）
    pub cog_x: f64,
    /// 接触重心 y（mm）
    pub cog_y: f64,
    /// 接触面积（mm²）
    pub area: f64,
}

/// 手驱动接口
///
/// 所有角度单位为度，速度为度/秒，加速度为度/秒²。
/// 未被 `axes` 选中的轴，其目标值被忽略。
pub trait HandDriver {
    /// 打开与手的连接
    fn open(&mut self) -> Result<(), HalError>;

    /// 关闭连接（可重复调用）
    fn close(&mut self) -> Result<(), HalError>;

    fn set_controller(&mut self, mode: ControllerMode) -> Result<(), HalError>;

    fn set_axis_target_velocity(
        &mut self,
        axes: AxisSet,
        velocities: &[f64; NUM_AXES],
    ) -> Result<(), HalError>;

    fn set_axis_target_acceleration(
        &mut self,
        axes: AxisSet,
        accelerations: &[f64; NUM_AXES],
    ) -> Result<(), HalError>;

    fn set_axis_target_angle(
        &mut self,
        axes: AxisSet,
        angles: &[f64; NUM_AXES],
    ) -> Result<(), HalError>;

    /// 位置模式下向目标角运动
    ///
    /// `blocking = true` 时等到运动结束才返回。
    fn move_axis(&mut self, axes: AxisSet, blocking: bool) -> Result<(), HalError>;

    /// 立即停止所有轴
    fn stop(&mut self) -> Result<(), HalError>;

    /// 读取实际关节角；未选中的轴返回 0
    fn get_axis_actual_angle(&mut self, axes: AxisSet) -> Result<JointAngles, HalError>;
}

/// 触觉传感器接口
///
/// 构造即连接；`start_updater` 之后才能读取接触信息。
pub trait TactileSensor {
    /// 启动传感器后台更新
    fn start_updater(&mut self, framerate: u32, run_length_encoding: bool)
    -> Result<(), HalError>;

    /// 读取指定手指、指定触觉垫的接触信息
    fn get_contact_force(&mut self, finger: usize, pad: Pad) -> Result<ContactInfo, HalError>;

    /// 关闭传感器（可重复调用）
    fn close(&mut self) -> Result<(), HalError>;
}

/// 校验手指索引
pub fn check_sensor(finger: usize, pad: Pad) -> Result<(), HalError> {
    if finger >= NUM_FINGERS {
        return Err(HalError::InvalidSensor { finger, pad });
    }
    Ok(())
}

/// 手指、触觉垫对应的关节轴（近端 → 1 + 2f，远端 → 2 + 2f）
pub fn pad_axis(finger: usize, pad: Pad) -> usize {
    1 + finger * 2 + pad.index()
}
