//! Kettle builds a self-hosting compiler in two stages.
//!
//! Stage 1 compiles the compiler and its bundled resources into a portable
//! artifact with an external toolchain. Stage 2 runs that artifact, which
//! starts behind the [`sandbox`] bridge, so it can rebuild itself for the
//! native target.
//!
//! - [`toolchain`] - release resolution and toolchain sources
//! - [`resources`] - resource manifest and container
//! - [`bootstrap`] - the staged pipeline
//! - [`sandbox`] - environment copy, host mounts and entry-point handoff

pub mod bootstrap;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod resources;
pub mod runtime;
pub mod sandbox;
pub mod toolchain;
pub mod util;

pub use bootstrap::Bootstrap;
pub use kettle_shared::errors::{KettleError, KettleResult};
pub use runtime::{KettleOptions, StackAllowance};
pub use sandbox::{BridgeOptions, BridgeReport, EnvironmentSnapshot, SandboxBridge};
