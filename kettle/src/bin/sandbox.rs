//! kettle-sandbox - run a program behind the sandbox bridge.
//!
//! The host environment is copied, every host root directory is
//! bind-mounted into the sandbox root, and the program starts in the host
//! working directory. Individual mounts are best effort, but the host
//! working directory must be reachable inside the sandbox.

use anyhow::{Context, Result};
use clap::Parser;
use kettle::logging::init_logging;
use kettle::sandbox::{
    BindMountSandbox, BridgeOptions, EnvironmentSnapshot, OsHostFs, ProcessEntry, SandboxBridge,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Run a program in a sandbox that mirrors the host filesystem root.
#[derive(Parser, Debug)]
#[command(name = "kettle-sandbox")]
#[command(version)]
pub struct Cli {
    /// Program and arguments, passed through unchanged.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,

    /// Sandbox root directory. A fresh temporary directory by default.
    #[arg(long, short = 'r')]
    root: Option<PathBuf>,

    /// Print bridge debug lines (also enabled by DEBUG in the environment).
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Confine the program to the sandbox root with chroot(2).
    #[arg(long)]
    chroot: bool,

    /// Bind host directories without the filesystems mounted below them.
    #[arg(long)]
    shallow: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, None)?;

    let environment = EnvironmentSnapshot::capture().context("Failed to copy host environment")?;
    let options = if cli.verbose {
        BridgeOptions::verbose(true)
    } else {
        BridgeOptions::from_environment(&environment)
    };

    let (root, owned_root) = match &cli.root {
        Some(root) => (root.clone(), false),
        None => {
            let dir = tempfile::Builder::new()
                .prefix("kettle-sandbox-")
                .tempdir()
                .context("Failed to create sandbox root")?;
            (dir.keep(), true)
        }
    };
    tracing::debug!(root = %root.display(), "Sandbox root");

    let host = OsHostFs::default();
    let mut entry = ProcessEntry::new(cli.chroot);
    let report = {
        let mut sandbox = BindMountSandbox::new(&root)
            .with_context(|| format!("Invalid sandbox root {}", root.display()))?;
        if cli.shallow {
            sandbox = sandbox.shallow();
        }
        SandboxBridge::new(&host, options)
            .run(environment, &mut sandbox, &mut entry, &cli.command)
            .context("Sandbox bridge failed")?
    };

    tracing::info!(
        mounted = report.mounts.mounted().count(),
        skipped = report.mounts.skipped().count(),
        exit_code = report.exit_code,
        "Sandboxed program finished"
    );

    if owned_root {
        remove_empty_root(&root);
    }

    Ok(ExitCode::from(u8::try_from(report.exit_code).unwrap_or(1)))
}

/// Remove a temporary root and its mount-point directories. Only empty
/// directories are removed, so anything still mounted is left alone.
fn remove_empty_root(root: &Path) {
    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.flatten() {
            let _ = std::fs::remove_dir(entry.path());
        }
    }
    if let Err(e) = std::fs::remove_dir(root) {
        tracing::warn!(root = %root.display(), error = %e, "Sandbox root left in place");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_passes_program_args_verbatim() {
        let cli = Cli::try_parse_from([
            "kettle-sandbox",
            "--verbose",
            "--",
            "node",
            "--stack-size=2048",
            "icetea.js",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.root.is_none());
        assert_eq!(cli.command, ["node", "--stack-size=2048", "icetea.js"]);
    }

    #[test]
    fn test_cli_root_and_chroot() {
        let cli = Cli::try_parse_from(["kettle-sandbox", "--root", "/srv/box", "--chroot", "sh"])
            .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/srv/box")));
        assert!(cli.chroot);
        assert!(!cli.shallow);
        assert_eq!(cli.command, ["sh"]);
    }

    #[test]
    fn test_cli_accepts_stage2_command() {
        let stage2 = kettle::bootstrap::stage2_command(
            "kettle-sandbox",
            &["--".to_string(), "node".to_string()],
            kettle::StackAllowance::default(),
            Path::new("/p/out/icetea.js"),
            &["--target=native".to_string()],
            Path::new("/p"),
        );
        let argv = std::iter::once("kettle-sandbox".to_string()).chain(stage2.args);
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(
            cli.command,
            ["node", "--stack-size=2048", "/p/out/icetea.js", "--target=native"]
        );
    }

    #[test]
    fn test_cli_requires_program() {
        assert!(Cli::try_parse_from(["kettle-sandbox"]).is_err());
    }

    #[test]
    fn test_remove_empty_root_keeps_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(root.join("home")).unwrap();
        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(root.join("data/keep.txt"), "x").unwrap();

        remove_empty_root(&root);

        assert!(!root.join("home").exists());
        assert!(root.join("data/keep.txt").exists());
    }
}
