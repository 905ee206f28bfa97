pub mod config;
pub mod crypto;
pub mod dsl;
pub mod issuer;
pub mod setup;
pub mod storage;
pub mod telemetry;
