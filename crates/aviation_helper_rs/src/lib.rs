//! Aviation Helper Library
//!
//! Domain data shared by the transcript decoder: the per-call aircraft
//! context, the aviation reference data capability (airline, fix, approach
//! and callsign telephony), the airline database, and the command DSL.

pub mod clearance {
    pub mod aircraft;
    pub mod airlines;
    pub mod aviation_command;
    pub mod context_builder;
}
pub mod conversions;
pub mod data;
pub mod errors;
pub mod types {
    pub mod altitude;
    pub mod heading;
}

pub use clearance::aircraft::{AddressingForm, AircraftMap, AircraftState, SttAircraft};
pub use data::{AviationData, StaticAviationData, WeightClass};
pub use errors::Error;
