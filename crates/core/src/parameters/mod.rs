//! Runtime configuration
//!
//! A [`ParameterStore`] holds named values; typed groups register their
//! defaults into it and read themselves back, falling back to defaults for
//! anything missing or out of range.
//!
//! ```ignore
//! let mut store = ParameterStore::new();
//! register_all(&mut store)?;
//! // board code overrides values here
//! let link = LinkParams::from_store(&store);
//! ```

pub mod error;
pub mod link;
pub mod sensors;
pub mod stabilizer;
pub mod storage;
pub mod vehicle;

pub use error::ParameterError;
pub use link::LinkParams;
pub use sensors::SensorParams;
pub use stabilizer::StabilizerParams;
pub use storage::{ParamFlags, ParamMetadata, ParamValue, ParameterStore};
pub use storage::{MAX_PARAMS, MAX_STRING_LEN, PARAM_NAME_LEN};
pub use vehicle::VehicleParams;

/// Register every parameter group's defaults
pub fn register_all(store: &mut ParameterStore) -> Result<(), ParameterError> {
    LinkParams::register_defaults(store)?;
    StabilizerParams::register_defaults(store)?;
    SensorParams::register_defaults(store)?;
    VehicleParams::register_defaults(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all_fits_store() {
        let mut store = ParameterStore::new();
        register_all(&mut store).unwrap();
        assert!(store.len() <= MAX_PARAMS);
        // LINK_PASS is hidden
        assert_eq!(store.count() + 1, store.len());
    }

    #[test]
    fn test_register_all_is_idempotent() {
        let mut store = ParameterStore::new();
        register_all(&mut store).unwrap();
        store.set("FRAME_TYPE", ParamValue::Int(1)).unwrap();
        register_all(&mut store).unwrap();
        assert_eq!(store.get("FRAME_TYPE"), Some(&ParamValue::Int(1)));
    }
}
