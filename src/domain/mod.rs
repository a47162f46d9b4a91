// Domain-specific error types
pub mod errors;

// Forecast inputs, outputs and model orders
pub mod forecasting;

// Raw market history
pub mod market;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;
