//! Bundler backends.

use super::container::ResourceContainer;
use super::manifest::ResourceManifest;
use kettle_shared::errors::{KettleError, KettleResult};

/// Turns a manifest into a container.
///
/// Implementations are all-or-nothing: on error no container is returned.
pub trait BundlerBackend: Send + Sync {
    fn bundle(&self, manifest: &ResourceManifest) -> KettleResult<ResourceContainer>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// In-process bundler reading every resource from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBundler;

impl BundlerBackend for NativeBundler {
    fn bundle(&self, manifest: &ResourceManifest) -> KettleResult<ResourceContainer> {
        manifest.check_unique()?;

        let mut container = ResourceContainer::new();
        for entry in manifest.entries() {
            let bytes = std::fs::read(&entry.source_path).map_err(|e| {
                KettleError::Bundler(format!(
                    "failed to read resource '{}' from {}: {}",
                    entry.name,
                    entry.source_path.display(),
                    e
                ))
            })?;
            tracing::trace!(
                name = %entry.name,
                path = %entry.source_path.display(),
                length = bytes.len(),
                "Bundled resource"
            );
            container.push(&entry.name, &bytes);
        }

        Ok(container)
    }

    fn name(&self) -> &str {
        "native"
    }
}
