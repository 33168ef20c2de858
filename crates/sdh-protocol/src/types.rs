//! 共享数据类型
//!
//! 力采样矩阵（`ForceSample`）和关节角向量（`JointAngles`）同时被驱动层、
//! 控制层和统计报文使用，因此放在协议层定义。

use crate::constants::{NUM_AXES, NUM_FINGERS, NUM_PADS};

/// 触觉垫位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pad {
    /// 近端（靠近指根）
    Proximal = 0,
    /// 远端（指尖）
    Distal = 1,
}

impl Pad {
    /// 所有触觉垫，按索引顺序
    pub const ALL: [Pad; NUM_PADS] = [Pad::Proximal, Pad::Distal];

    /// 触觉垫索引（0 = 近端，1 = 远端）
    pub fn index(self) -> usize {
        self as usize
    }
}

/// 力采样快照（3 根手指 × 2 个触觉垫）
///
/// **不变量**：矩阵总是完整填充的。驱动层每个周期构建一个新的 `ForceSample`，
/// 再整体替换已发布的快照，读者不会看到半更新的矩阵。
///
/// # Example
///
/// ```
/// use sdh_protocol::{ForceSample, Pad};
///
/// let sample = ForceSample::new([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
/// assert_eq!(sample.get(1, Pad::Distal), 4.0);
/// assert_eq!(sample.flatten(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForceSample {
    /// `forces[finger][pad]`
    pub forces: [[f64; NUM_PADS]; NUM_FINGERS],
}

impl ForceSample {
    /// 全零快照（启动时的初始值）
    pub const ZERO: ForceSample = ForceSample {
        forces: [[0.0; NUM_PADS]; NUM_FINGERS],
    };

    pub fn new(forces: [[f64; NUM_PADS]; NUM_FINGERS]) -> Self {
        Self { forces }
    }

    /// 读取指定手指、指定触觉垫的力
    ///
    /// # Panics
    ///
    /// `finger >= NUM_FINGERS` 时 panic。
    pub fn get(&self, finger: usize, pad: Pad) -> f64 {
        self.forces[finger][pad.index()]
    }

    /// 远端触觉垫的力 [F0, F1, F2]
    pub fn distal(&self) -> [f64; NUM_FINGERS] {
        [
            self.forces[0][Pad::Distal.index()],
            self.forces[1][Pad::Distal.index()],
            self.forces[2][Pad::Distal.index()],
        ]
    }

    /// 按报文顺序展开：finger0 近端、finger0 远端、finger1 近端 ……
    pub fn flatten(&self) -> [f64; NUM_FINGERS * NUM_PADS] {
        let mut out = [0.0; NUM_FINGERS * NUM_PADS];
        for (finger, pads) in self.forces.iter().enumerate() {
            for (pad, value) in pads.iter().enumerate() {
                out[finger * NUM_PADS + pad] = *value;
            }
        }
        out
    }
}

/// 关节角向量（度），轴 0..6
///
/// 按需从手驱动读取，不做缓存。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointAngles(pub [f64; NUM_AXES]);

impl JointAngles {
    pub fn as_array(&self) -> &[f64; NUM_AXES] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }
}

impl From<[f64; NUM_AXES]> for JointAngles {
    fn from(angles: [f64; NUM_AXES]) -> Self {
        Self(angles)
    }
}

impl std::ops::Index<usize> for JointAngles {
    type Output = f64;

    fn index(&self, axis: usize) -> &f64 {
        &self.0[axis]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_sample_zero_default() {
        assert_eq!(ForceSample::default(), ForceSample::ZERO);
        assert!(ForceSample::ZERO.flatten().iter().all(|f| *f == 0.0));
    }

    #[test]
    fn test_force_sample_accessors() {
        let sample = ForceSample::new([[0.5, 0.2], [0.0, 0.3], [1.5, 0.4]]);
        assert_eq!(sample.get(0, Pad::Proximal), 0.5);
        assert_eq!(sample.get(2, Pad::Proximal), 1.5);
        assert_eq!(sample.distal(), [0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_pad_index() {
        assert_eq!(Pad::Proximal.index(), 0);
        assert_eq!(Pad::Distal.index(), 1);
        assert_eq!(Pad::ALL.len(), NUM_PADS);
    }

    #[test]
    fn test_joint_angles_index() {
        let angles = JointAngles::from([0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        assert_eq!(angles[3], 30.0);
        assert_eq!(angles.iter().count(), NUM_AXES);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_force_sample_serde() {
        let sample = ForceSample::new([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let json = serde_json::to_string(&sample).unwrap();
        let back: ForceSample = serde_json::from_str(&json).unwrap();
        assert_eq!(sample, back);
    }
}
