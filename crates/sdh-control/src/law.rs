//! 比例速度控制律

use crate::config::GraspConfig;
use sdh_protocol::{ForceSample, NUM_AXES, NUM_FINGERS, Pad};

/// 由最新力采样计算 7 个轴的目标速度（轴 0 恒为 0）
///
/// # Example
///
/// ```
/// use sdh_control::{GraspConfig, compute_velocities};
/// use sdh_protocol::ForceSample;
///
/// let v = compute_velocities(&GraspConfig::default(), 5.0, &ForceSample::ZERO);
/// assert_eq!(v, [0.0, 0.75, 1.5, 1.5, 3.0, 0.75, 1.5]);
/// ```
pub fn compute_velocities(
    config: &GraspConfig,
    desired_force: f64,
    sample: &ForceSample,
) -> [f64; NUM_AXES] {
    let mut velocities = [0.0; NUM_AXES];

    for finger in 0..NUM_FINGERS {
        let target = desired_force * config.finger_force_scale[finger];
        let proximal = (target - sample.get(finger, Pad::Proximal)) * config.gain
            * config.proximal_ratio;
        let distal = (target - sample.get(finger, Pad::Distal)) * config.gain;

        velocities[1 + finger * 2] = saturate(config, proximal);
        velocities[2 + finger * 2] = saturate(config, distal);
    }

    velocities
}

/// 三根手指的远端力都超过阈值
pub fn is_grasped(config: &GraspConfig, sample: &ForceSample) -> bool {
    sample
        .distal()
        .iter()
        .all(|force| *force > config.contact_threshold)
}

/// 非有限值（NaN 力读数）按 0 处理，不下发给手
fn saturate(config: &GraspConfig, velocity: f64) -> f64 {
    if velocity.is_nan() {
        return 0.0;
    }
    velocity.clamp(config.min_velocity, config.max_velocity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_iteration_from_rest() {
        let v = compute_velocities(&GraspConfig::default(), 5.0, &ForceSample::ZERO);
        assert_eq!(v, [0.0, 0.75, 1.5, 1.5, 3.0, 0.75, 1.5]);
    }

    #[test]
    fn test_saturation() {
        let config = GraspConfig::default();
        let v = compute_velocities(&config, 100.0, &ForceSample::ZERO);
        assert!(v[1..].iter().all(|x| *x == 7.0));

        let crushing = ForceSample::new([[100.0; 2]; 3]);
        let v = compute_velocities(&config, 0.0, &crushing);
        assert!(v[1..].iter().all(|x| *x == -5.0));
        assert_eq!(v[0], 0.0);
    }

    #[test]
    fn test_nan_force_yields_zero_velocity() {
        let mut sample = ForceSample::ZERO;
        sample.forces[0][0] = f64::NAN;
        sample.forces[2][1] = f64::INFINITY;
        let v = compute_velocities(&GraspConfig::default(), 5.0, &sample);
        assert_eq!(v, [0.0, 0.0, 1.5, 1.5, 3.0, 0.75, -5.0]);
    }

    #[test]
    fn test_finger_one_target_is_doubled() {
        let sample = ForceSample::new([[5.0, 5.0], [5.0, 5.0], [5.0, 5.0]]);
        let v = compute_velocities(&GraspConfig::default(), 5.0, &sample);
        assert_eq!(v[1], 0.0);
        assert_eq!(v[2], 0.0);
        assert_eq!(v[3], 0.75);
        assert_eq!(v[4], 1.5);
        assert_eq!(v[5], 0.0);
        assert_eq!(v[6], 0.0);
    }

    #[test]
    fn test_grasp_detection_uses_distal_pads_only() {
        let config = GraspConfig::default();
        assert!(!is_grasped(&config, &ForceSample::ZERO));
        assert!(!is_grasped(
            &config,
            &ForceSample::new([[9.0, 0.2], [9.0, 0.2], [9.0, 0.05]])
        ));
        // 阈值是严格大于
        assert!(!is_grasped(
            &config,
            &ForceSample::new([[0.0, 0.1], [0.0, 0.2], [0.0, 0.2]])
        ));
        assert!(is_grasped(
            &config,
            &ForceSample::new([[0.0, 0.11], [0.0, 0.2], [0.0, 0.3]])
        ));
    }
}
