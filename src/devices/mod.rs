//! Simulated household devices feeding the synthetic power trace.

/// Random appliance switching state machine.
pub mod appliance;
pub mod profile;
pub mod types;

pub use appliance::{ApplianceState, ApplianceSwitcher, SwitchRule};
pub use profile::ApplianceProfiles;
pub use types::{Device, TickContext};
