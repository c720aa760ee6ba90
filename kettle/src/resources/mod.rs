//! Resource bundling.
//!
//! Reads a manifest of named files and produces a [`ResourceContainer`] that
//! is rendered as C source for the stage-1 compile.

mod bundler;
mod container;
mod manifest;

pub use bundler::{BundlerBackend, NativeBundler};
pub use container::{DEFAULT_CONTAINER_SYMBOL, ResourceContainer, ResourceSlot};
pub use manifest::{ResourceEntry, ResourceManifest};

pub(crate) use manifest::is_c_identifier;
