//! Types shared between the kettle library and its binaries.

pub mod errors;

pub use errors::{KettleError, KettleResult};
