//! Shared state for the bootstrap pipeline.

use crate::resources::BundlerBackend;
use crate::runtime::KettleOptions;
use crate::toolchain::{InstalledToolchain, ToolchainRelease, ToolchainSource};
use crate::util::CommandRunner;
use kettle_shared::errors::{KettleError, KettleResult};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Collaborators the stages call out to.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn ToolchainSource>,
    pub bundler: Arc<dyn BundlerBackend>,
    pub runner: Arc<dyn CommandRunner>,
}

/// Context passed between bootstrap tasks.
///
/// Later stages read what earlier stages stored; a missing field means a
/// predecessor did not run.
pub struct BootstrapContext {
    pub options: KettleOptions,
    pub release: ToolchainRelease,
    pub collaborators: Collaborators,
    /// Receives the `$ <command>` echo before each subprocess.
    pub echo: Box<dyn Write + Send>,

    pub toolchain: Option<InstalledToolchain>,
    pub container: Option<PathBuf>,
    pub artifact: Option<PathBuf>,
}

impl BootstrapContext {
    pub fn new(
        options: KettleOptions,
        release: ToolchainRelease,
        collaborators: Collaborators,
        echo: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            options,
            release,
            collaborators,
            echo,
            toolchain: None,
            container: None,
            artifact: None,
        }
    }

    pub fn installed_toolchain(&self) -> KettleResult<&InstalledToolchain> {
        self.toolchain
            .as_ref()
            .ok_or_else(|| KettleError::InvalidState("toolchain task must run first".into()))
    }

    pub fn container_path(&self) -> KettleResult<&PathBuf> {
        self.container
            .as_ref()
            .ok_or_else(|| KettleError::InvalidState("bundle task must run first".into()))
    }
}

pub type BootstrapCtx = Arc<Mutex<BootstrapContext>>;
