//! Embedded program entry points.

use super::backend::BindMountSandbox;
use crate::util::exit_code;
#[cfg(target_os = "linux")]
use std::ffi::CString;
use std::io::Write;
use std::process::Command;

/// Exit code when the program could not be started at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// The program the bridge hands control to.
pub trait EntryPoint<S: ?Sized> {
    /// Run the program with its argument list, returning its result code.
    fn main(&mut self, sandbox: &S, args: &[String]) -> i32;

    /// Called once after `main` returns: flush output, release state.
    fn post_run(&mut self, _sandbox: &mut S) {}
}

/// Entry point backed by a closure.
pub struct FnEntry<F>(pub F);

impl<S: ?Sized, F> EntryPoint<S> for FnEntry<F>
where
    F: FnMut(&S, &[String]) -> i32,
{
    fn main(&mut self, sandbox: &S, args: &[String]) -> i32 {
        (self.0)(sandbox, args)
    }
}

/// Runs `args[0]` as a child process inside a [`BindMountSandbox`].
///
/// The child gets exactly the sandbox environment and starts in the sandbox
/// working directory. With `chroot` enabled the child is confined to the
/// sandbox root (needs CAP_SYS_CHROOT).
#[derive(Debug, Clone, Default)]
pub struct ProcessEntry {
    chroot: bool,
}

impl ProcessEntry {
    pub fn new(chroot: bool) -> Self {
        Self { chroot }
    }

    fn command(
        &self,
        sandbox: &BindMountSandbox,
        program: &str,
        rest: &[String],
    ) -> std::io::Result<Command> {
        let mut cmd = Command::new(program);
        cmd.args(rest)
            .env_clear()
            .envs(sandbox.environment().iter())
            .current_dir(sandbox.host_path(sandbox.cwd()));

        #[cfg(target_os = "linux")]
        if self.chroot {
            use std::os::unix::process::CommandExt;

            let (root, cwd) = chroot_paths(sandbox)?;
            // SAFETY: the closure runs in the forked child before exec. The
            // paths are already C strings, so it only performs the
            // async-signal-safe chroot(2) and chdir(2) without allocating.
            unsafe {
                cmd.pre_exec(move || {
                    nix::unistd::chroot(root.as_c_str())?;
                    nix::unistd::chdir(cwd.as_c_str())?;
                    Ok(())
                });
            }
        }
        #[cfg(not(target_os = "linux"))]
        if self.chroot {
            tracing::warn!("chroot is only supported on Linux; running unconfined");
        }

        Ok(cmd)
    }
}

/// Sandbox root and working directory as C strings for use after fork.
#[cfg(target_os = "linux")]
fn chroot_paths(sandbox: &BindMountSandbox) -> std::io::Result<(CString, CString)> {
    use std::os::unix::ffi::OsStrExt;

    let to_c = |path: &std::path::Path| {
        CString::new(path.as_os_str().as_bytes()).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("path {} contains a NUL byte: {}", path.display(), e),
            )
        })
    };
    Ok((to_c(sandbox.root())?, to_c(sandbox.cwd())?))
}

impl EntryPoint<BindMountSandbox> for ProcessEntry {
    fn main(&mut self, sandbox: &BindMountSandbox, args: &[String]) -> i32 {
        let Some((program, rest)) = args.split_first() else {
            tracing::error!("No program given to run in the sandbox");
            return SPAWN_FAILURE_EXIT_CODE;
        };

        tracing::debug!(program = %program, args = ?rest, cwd = %sandbox.cwd().display(), "Starting sandboxed program");
        let status = self
            .command(sandbox, program, rest)
            .and_then(|mut cmd| cmd.status());
        match status {
            Ok(status) => exit_code(status),
            Err(e) => {
                tracing::error!(program = %program, error = %e, "Failed to start sandboxed program");
                SPAWN_FAILURE_EXIT_CODE
            }
        }
    }

    fn post_run(&mut self, sandbox: &mut BindMountSandbox) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        if let Err(e) = sandbox.release() {
            tracing::warn!(error = %e, "Failed to release sandbox mounts");
        }
    }
}
