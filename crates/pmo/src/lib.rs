pub mod access;
pub mod accreditation;
pub mod config;
pub mod error;
pub mod telemetry;
