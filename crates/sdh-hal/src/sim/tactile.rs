//! 仿真触觉传感器

use super::SimWorld;
use crate::{ContactInfo, HalError, TactileSensor, check_sensor};
use sdh_protocol::Pad;
use std::sync::Arc;
use tracing::debug;

/// 仿真触觉传感器阵列
#[derive(Debug)]
pub struct SimTactile {
    world: Arc<SimWorld>,
    updater: Option<(u32, bool)>,
    closed: bool,
}

impl SimTactile {
    pub fn new(world: Arc<SimWorld>) -> Self {
        Self {
            world,
            updater: None,
            closed: false,
        }
    }

    /// 后台更新参数（帧率，RLE）
    pub fn updater(&self) -> Option<(u32, bool)> {
        self.updater
    }
}

impl TactileSensor for SimTactile {
    fn start_updater(&mut self, framerate: u32, run_length_encoding: bool) -> Result<(), HalError> {
        if self.closed {
            return Err(HalError::NotOpen);
        }
        debug!(
            "SimTactile updater started: framerate={}, rle={}",
            framerate, run_length_encoding
        );
        self.updater = Some((framerate, run_length_encoding));
        Ok(())
    }

    fn get_contact_force(&mut self, finger: usize, pad: Pad) -> Result<ContactInfo, HalError> {
        if self.closed {
            return Err(HalError::NotOpen);
        }
        if self.updater.is_none() {
            return Err(HalError::NotStarted);
        }
        check_sensor(finger, pad)?;
        Ok(self.world.contact(finger, pad))
    }

    fn close(&mut self) -> Result<(), HalError> {
        if !self.closed {
            self.closed = true;
            self.updater = None;
            debug!("SimTactile closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimConfig;

    #[test]
    fn test_read_requires_updater() {
        let mut tactile = SimTactile::new(SimWorld::new(SimConfig::default()));
        assert!(matches!(
            tactile.get_contact_force(0, Pad::Distal),
            Err(HalError::NotStarted)
        ));

        tactile.start_updater(30, true).unwrap();
        assert_eq!(tactile.updater(), Some((30, true)));
        assert_eq!(
            tactile.get_contact_force(0, Pad::Distal).unwrap(),
            ContactInfo::default()
        );
    }

    #[test]
    fn test_invalid_finger() {
        let mut tactile = SimTactile::new(SimWorld::new(SimConfig::default()));
        tactile.start_updater(30, true).unwrap();
        assert!(matches!(
            tactile.get_contact_force(3, Pad::Distal),
            Err(HalError::InvalidSensor { finger: 3, .. })
        ));
    }

    #[test]
    fn test_closed_sensor_rejects_reads() {
        let mut tactile = SimTactile::new(SimWorld::new(SimConfig::default()));
        tactile.start_updater(30, true).unwrap();
        tactile.close().unwrap();
        tactile.close().unwrap();
        assert!(matches!(
            tactile.get_contact_force(0, Pad::Proximal),
            Err(HalError::NotOpen)
        ));
    }
}
