//! 抓取会话状态机
//!
//! `Idle → Closing → Grasped`，以及在迭代之间观察到停止信号时进入的终态 `Aborted`。

use crate::config::GraspConfig;
use crate::law::{compute_velocities, is_grasped};
use sdh_protocol::{ForceSample, NUM_AXES};

/// 抓取阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraspPhase {
    Idle,
    Closing,
    Grasped,
    Aborted,
}

impl GraspPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GraspPhase::Grasped | GraspPhase::Aborted)
    }
}

/// 单次迭代的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraspStep {
    /// 下发速度向量并继续
    Command([f64; NUM_AXES]),
    /// 已抓紧：下发零速度并急停
    Grasped,
}

/// 一次抓取的会话状态
#[derive(Debug, Clone)]
pub struct GraspSession {
    desired_force: f64,
    phase: GraspPhase,
    velocities: [f64; NUM_AXES],
    iterations: u32,
}

impl GraspSession {
    pub fn new(desired_force: f64) -> Self {
        Self {
            desired_force,
            phase: GraspPhase::Idle,
            velocities: [0.0; NUM_AXES],
            iterations: 0,
        }
    }

    /// `Idle → Closing`
    pub fn begin(&mut self) {
        if self.phase == GraspPhase::Idle {
            self.phase = GraspPhase::Closing;
        }
    }

    /// 用最新力采样推进一次迭代
    ///
    /// 只在 `Closing` 阶段有效；其它阶段返回 `None`。
    pub fn step(&mut self, config: &GraspConfig, sample: &ForceSample) -> Option<GraspStep> {
        if self.phase != GraspPhase::Closing {
            return None;
        }
        self.iterations += 1;

        if is_grasped(config, sample) {
            self.velocities = [0.0; NUM_AXES];
            self.phase = GraspPhase::Grasped;
            return Some(GraspStep::Grasped);
        }

        self.velocities = compute_velocities(config, self.desired_force, sample);
        Some(GraspStep::Command(self.velocities))
    }

    /// 进入 `Aborted`（终态不变）
    pub fn abort(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = GraspPhase::Aborted;
        }
    }

    pub fn phase(&self) -> GraspPhase {
        self.phase
    }

    pub fn desired_force(&self) -> f64 {
        self.desired_force
    }

    /// 最近一次计算的速度向量
    pub fn velocities(&self) -> &[f64; NUM_AXES] {
        &self.velocities
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn is_terminated(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_requires_closing() {
        let mut session = GraspSession::new(5.0);
        assert_eq!(session.step(&GraspConfig::default(), &ForceSample::ZERO), None);
        assert_eq!(session.iterations(), 0);
    }

    #[test]
    fn test_closing_to_grasped() {
        let config = GraspConfig::default();
        let mut session = GraspSession::new(5.0);
        session.begin();
        assert_eq!(session.phase(), GraspPhase::Closing);

        let step = session.step(&config, &ForceSample::ZERO).unwrap();
        assert_eq!(step, GraspStep::Command([0.0, 0.75, 1.5, 1.5, 3.0, 0.75, 1.5]));
        assert_eq!(session.velocities(), &[0.0, 0.75, 1.5, 1.5, 3.0, 0.75, 1.5]);

        let contact = ForceSample::new([[0.0, 0.5], [0.0, 0.5], [0.0, 0.5]]);
        assert_eq!(session.step(&config, &contact), Some(GraspStep::Grasped));
        assert_eq!(session.phase(), GraspPhase::Grasped);
        assert_eq!(session.velocities(), &[0.0; NUM_AXES]);
        assert_eq!(session.iterations(), 2);
        assert!(session.is_terminated());

        // 终态之后不再推进
        assert_eq!(session.step(&config, &contact), None);
        session.abort();
        assert_eq!(session.phase(), GraspPhase::Grasped);
    }

    #[test]
    fn test_abort_from_closing() {
        let mut session = GraspSession::new(5.0);
        session.begin();
        session.abort();
        assert_eq!(session.phase(), GraspPhase::Aborted);
        session.begin();
        assert_eq!(session.phase(), GraspPhase::Aborted);
    }
}
