//! 仿真手驱动

use super::SimWorld;
use crate::{AxisSet, ControllerMode, HalError, HandDriver};
use sdh_protocol::{JointAngles, NUM_AXES};
use std::sync::Arc;
use tracing::{debug, trace};

/// 仿真手
#[derive(Debug)]
pub struct SimHand {
    world: Arc<SimWorld>,
    open: bool,
}

impl SimHand {
    pub fn new(world: Arc<SimWorld>) -> Self {
        Self { world, open: false }
    }

    pub fn world(&self) -> &Arc<SimWorld> {
        &self.world
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> Result<(), HalError> {
        if self.open {
            Ok(())
        } else {
            Err(HalError::NotOpen)
        }
    }
}

fn assign(axes: AxisSet, source: &[f64; NUM_AXES], target: &mut [f64; NUM_AXES]) {
    for axis in axes.iter() {
        target[axis] = source[axis];
    }
}

impl HandDriver for SimHand {
    fn open(&mut self) -> Result<(), HalError> {
        debug!("SimHand opened");
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), HalError> {
        if self.open {
            self.world.halt();
            self.open = false;
            debug!("SimHand closed");
        }
        Ok(())
    }

    fn set_controller(&mut self, mode: ControllerMode) -> Result<(), HalError> {
        self.ensure_open()?;
        trace!("SimHand controller -> {:?}", mode);
        self.world.set_mode(mode);
        Ok(())
    }

    fn set_axis_target_velocity(
        &mut self,
        axes: AxisSet,
        velocities: &[f64; NUM_AXES],
    ) -> Result<(), HalError> {
        self.ensure_open()?;
        self.world.update_targets(|t| assign(axes, velocities, t.velocity));
        Ok(())
    }

    fn set_axis_target_acceleration(
        &mut self,
        axes: AxisSet,
        accelerations: &[f64; NUM_AXES],
    ) -> Result<(), HalError> {
        self.ensure_open()?;
        self.world.update_targets(|t| assign(axes, accelerations, t.acceleration));
        Ok(())
    }

    fn set_axis_target_angle(
        &mut self,
        axes: AxisSet,
        angles: &[f64; NUM_AXES],
    ) -> Result<(), HalError> {
        self.ensure_open()?;
        self.world.update_targets(|t| assign(axes, angles, t.angle));
        Ok(())
    }

    fn move_axis(&mut self, axes: AxisSet, blocking: bool) -> Result<(), HalError> {
        self.ensure_open()?;
        let duration = self.world.begin_motion(axes);
        if !blocking {
            return Ok(());
        }

        if !self.world.config().instant_moves {
            std::thread::sleep(self.world.to_wall_time(duration));
        }
        self.world.finish_motion();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), HalError> {
        self.ensure_open()?;
        self.world.halt();
        Ok(())
    }

    fn get_axis_actual_angle(&mut self, axes: AxisSet) -> Result<JointAngles, HalError> {
        self.ensure_open()?;
        let all = self.world.angles();
        let mut out = [0.0; NUM_AXES];
        assign(axes, &all, &mut out);
        Ok(JointAngles(out))
    }
}
