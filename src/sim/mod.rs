/// Trace generation over a switching appliance outlet.
pub mod generator;
pub mod types;
