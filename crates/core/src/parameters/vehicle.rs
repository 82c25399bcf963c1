//! Vehicle layout parameters
//!
//! - `FRAME_TYPE` - 0 differential boat, 1 single-axis stabilized, 2 bicopter
//!
//! Read once at startup; changing it requires a restart.

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::mixer::FrameType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleParams {
    pub frame: FrameType,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            frame: FrameType::Differential,
        }
    }
}

impl VehicleParams {
    pub fn register_defaults(store: &mut ParameterStore) -> Result<(), ParameterError> {
        store.register(
            "FRAME_TYPE",
            ParamValue::Int(FrameType::Differential as i32),
            ParamFlags::empty(),
        )
    }

    pub fn from_store(store: &ParameterStore) -> Self {
        let raw = store.get_i32_or("FRAME_TYPE", FrameType::Differential as i32);
        let frame = FrameType::from_param(raw).unwrap_or_else(|| {
            crate::log_warn!("FRAME_TYPE {} unknown, using differential", raw);
            FrameType::Differential
        });
        Self { frame }
    }
}
