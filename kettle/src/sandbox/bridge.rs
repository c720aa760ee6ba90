//! Sandbox bridge.
//!
//! Prepares a sandbox so the embedded program sees the host: the host
//! environment, every host root directory mounted at the same path, and the
//! host working directory. Then hands control to the entry point.

use super::backend::Sandbox;
use super::entry::EntryPoint;
use super::env::EnvironmentSnapshot;
use super::host::HostFs;
use super::log::DebugLog;
use super::mount::{MountReport, mount_all};
use kettle_shared::errors::{KettleError, KettleResult};
use std::io::Write;
use std::path::PathBuf;

/// Environment variable that turns on bridge debug lines.
pub const VERBOSE_ENV: &str = "DEBUG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeOptions {
    pub verbose: bool,
}

impl BridgeOptions {
    pub fn verbose(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Verbose when `DEBUG` is set to a non-empty value in the snapshot.
    pub fn from_environment(env: &EnvironmentSnapshot) -> Self {
        Self::verbose(env.get(VERBOSE_ENV).is_some_and(|v| !v.is_empty()))
    }
}

/// What one sandboxed execution saw and returned.
#[derive(Debug, Clone)]
pub struct BridgeReport {
    pub environment: EnvironmentSnapshot,
    pub mounts: MountReport,
    pub cwd: PathBuf,
    pub exit_code: i32,
}

pub struct SandboxBridge<'a, H: HostFs + ?Sized> {
    host: &'a H,
    options: BridgeOptions,
    log_writer: Option<Box<dyn Write + Send>>,
}

impl<'a, H: HostFs + ?Sized> SandboxBridge<'a, H> {
    pub fn new(host: &'a H, options: BridgeOptions) -> Self {
        Self {
            host,
            options,
            log_writer: None,
        }
    }

    /// Redirect debug lines (stdout by default).
    pub fn with_log_writer(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.log_writer = Some(writer);
        self
    }

    /// Run the bridge and the entry point.
    ///
    /// Environment installation, host enumeration and the final chdir are
    /// fatal on failure. Individual mounts are not.
    pub fn run<S, E>(
        self,
        environment: EnvironmentSnapshot,
        sandbox: &mut S,
        entry: &mut E,
        args: &[String],
    ) -> KettleResult<BridgeReport>
    where
        S: Sandbox + ?Sized,
        E: EntryPoint<S> + ?Sized,
    {
        sandbox
            .install_environment(&environment)
            .map_err(|e| match e {
                KettleError::EnvironmentCopy(_) => e,
                other => KettleError::EnvironmentCopy(other.to_string()),
            })?;

        let mut log = match self.log_writer {
            Some(writer) => DebugLog::with_writer(self.options.verbose, writer),
            None => DebugLog::new(self.options.verbose),
        };
        log.line(format_args!(
            "installed {} environment variables",
            environment.len()
        ));

        let cwd = self.host.current_dir()?;

        let mut entries = self.host.list_root()?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let mounts = mount_all(sandbox, &entries, &mut log);
        tracing::info!(
            entries = mounts.len(),
            mounted = mounts.mounted().count(),
            skipped = mounts.skipped().count(),
            "Host root mounted into sandbox"
        );

        sandbox.chdir(&cwd)?;
        log.line(format_args!("working directory {}", cwd.display()));

        log.line(format_args!("entering main with {} arguments", args.len()));
        let exit_code = entry.main(sandbox, args);
        entry.post_run(sandbox);
        log.line(format_args!("main returned {}", exit_code));

        Ok(BridgeReport {
            environment,
            mounts,
            cwd,
            exit_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::backend::MemorySandbox;
    use crate::sandbox::host::{EntryKind, HostEntry};
    use crate::sandbox::log::LOG_TAG;
    use crate::sandbox::mount::{MountOutcome, SkipReason};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    struct StaticHost {
        entries: Vec<HostEntry>,
        cwd: PathBuf,
    }

    impl StaticHost {
        fn new(entries: &[(&str, EntryKind)], cwd: &str) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(name, kind)| HostEntry {
                        name: name.into(),
                        path: Path::new("/").join(name),
                        kind: *kind,
                    })
                    .collect(),
                cwd: PathBuf::from(cwd),
            }
        }
    }

    impl HostFs for StaticHost {
        fn list_root(&self) -> KettleResult<Vec<HostEntry>> {
            Ok(self.entries.clone())
        }

        fn current_dir(&self) -> KettleResult<PathBuf> {
            Ok(self.cwd.clone())
        }
    }

    /// Records every sandbox call; all calls succeed.
    #[derive(Default)]
    struct RecordingSandbox {
        calls: Vec<String>,
    }

    impl Sandbox for RecordingSandbox {
        fn install_environment(&mut self, env: &EnvironmentSnapshot) -> KettleResult<()> {
            self.calls.push(format!("env {}", env.len()));
            Ok(())
        }

        fn exists(&self, _path: &Path) -> bool {
            false
        }

        fn mkdir(&mut self, path: &Path) -> KettleResult<()> {
            self.calls.push(format!("mkdir {}", path.display()));
            Ok(())
        }

        fn bind(&mut self, host_path: &Path, sandbox_path: &Path) -> KettleResult<()> {
            self.calls.push(format!(
                "bind {} {}",
                host_path.display(),
                sandbox_path.display()
            ));
            Ok(())
        }

        fn chdir(&mut self, path: &Path) -> KettleResult<()> {
            self.calls.push(format!("chdir {}", path.display()));
            Ok(())
        }
    }

    /// Records what the program saw when main ran.
    #[derive(Default)]
    struct CapturingEntry {
        args: Vec<String>,
        cwd: Option<PathBuf>,
        post_runs: usize,
    }

    impl EntryPoint<MemorySandbox> for CapturingEntry {
        fn main(&mut self, sandbox: &MemorySandbox, args: &[String]) -> i32 {
            self.args = args.to_vec();
            self.cwd = Some(sandbox.cwd().to_path_buf());
            0
        }

        fn post_run(&mut self, _sandbox: &mut MemorySandbox) {
            self.post_runs += 1;
        }
    }

    impl EntryPoint<RecordingSandbox> for CapturingEntry {
        fn main(&mut self, _sandbox: &RecordingSandbox, args: &[String]) -> i32 {
            self.args = args.to_vec();
            5
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_end_to_end_home_tmp_and_file() {
        let host = StaticHost::new(
            &[
                ("home", EntryKind::Directory),
                ("tmp", EntryKind::Directory),
                ("etc.conf", EntryKind::File),
            ],
            "/home/dev/project",
        );
        let env = EnvironmentSnapshot::from_vars([("HOME", "/home/dev")]);
        let mut sandbox = MemorySandbox::new();
        let mut entry = CapturingEntry::default();
        let argv = args(&["build", "--target=native"]);

        let report = SandboxBridge::new(&host, BridgeOptions::default())
            .run(env.clone(), &mut sandbox, &mut entry, &argv)
            .unwrap();

        assert_eq!(report.mounts.len(), 3);
        assert!(report.mounts.find(Path::new("/home")).unwrap().is_mounted());
        assert!(report.mounts.find(Path::new("/tmp")).unwrap().is_mounted());
        assert_eq!(
            report.mounts.find(Path::new("/etc.conf")).unwrap().outcome,
            MountOutcome::Skipped(SkipReason::NotADirectory)
        );
        assert!(!sandbox.exists(Path::new("/etc.conf")));

        assert_eq!(report.cwd, PathBuf::from("/home/dev/project"));
        assert_eq!(sandbox.cwd(), Path::new("/home/dev/project"));
        assert_eq!(entry.cwd.as_deref(), Some(Path::new("/home/dev/project")));
        assert_eq!(entry.args, argv);
        assert_eq!(entry.post_runs, 1);
        assert_eq!(report.exit_code, 0);
        assert_eq!(sandbox.environment(), &env);
    }

    #[test]
    fn test_non_directories_never_reach_mkdir_or_bind() {
        let host = StaticHost::new(
            &[
                ("vmlinuz", EntryKind::Symlink),
                ("swapfile", EntryKind::File),
                ("srv", EntryKind::Directory),
                ("null", EntryKind::Other),
            ],
            "/srv",
        );
        let mut sandbox = RecordingSandbox::default();
        let mut entry = CapturingEntry::default();

        let report = SandboxBridge::new(&host, BridgeOptions::default())
            .run(EnvironmentSnapshot::default(), &mut sandbox, &mut entry, &[])
            .unwrap();

        assert_eq!(
            sandbox.calls,
            ["env 0", "mkdir /srv", "bind /srv /srv", "chdir /srv"]
        );
        assert_eq!(report.mounts.len(), 4);
        assert_eq!(report.mounts.skipped().count(), 3);
        assert_eq!(report.exit_code, 5);
    }

    #[test]
    fn test_environment_applied_verbatim() {
        let host_env = EnvironmentSnapshot::capture().unwrap();
        let host = StaticHost::new(&[], "/");
        let mut sandbox = MemorySandbox::new();
        let mut entry = CapturingEntry::default();

        let report = SandboxBridge::new(&host, BridgeOptions::default())
            .run(host_env.clone(), &mut sandbox, &mut entry, &[])
            .unwrap();

        assert_eq!(sandbox.environment(), &host_env);
        assert_eq!(report.environment, host_env);
        for (key, value) in host_env.iter() {
            assert_eq!(sandbox.environment().get(key), Some(value));
        }
    }

    #[test]
    fn test_failed_mount_is_recorded_and_loop_continues() {
        let host = StaticHost::new(
            &[("opt", EntryKind::Directory), ("var", EntryKind::Directory)],
            "/",
        );
        let mut sandbox = MemorySandbox::new();
        sandbox.mkdir(Path::new("/opt")).unwrap();
        sandbox.bind(Path::new("/mnt/opt"), Path::new("/opt")).unwrap();
        let mut entry = CapturingEntry::default();

        let report = SandboxBridge::new(&host, BridgeOptions::default())
            .run(EnvironmentSnapshot::default(), &mut sandbox, &mut entry, &[])
            .unwrap();

        let opt = report.mounts.find(Path::new("/opt")).unwrap();
        match &opt.outcome {
            MountOutcome::Skipped(SkipReason::Failed(reason)) => {
                assert!(reason.contains("already mounted"))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(opt.host_path, PathBuf::from("/opt"));
        assert!(report.mounts.find(Path::new("/var")).unwrap().is_mounted());
        assert_eq!(entry.post_runs, 1);
    }

    #[test]
    fn test_missing_cwd_is_fatal() {
        let host = StaticHost::new(&[("file", EntryKind::File)], "/nowhere");
        let mut sandbox = MemorySandbox::new();
        let mut entry = CapturingEntry::default();

        let err = SandboxBridge::new(&host, BridgeOptions::default())
            .run(EnvironmentSnapshot::default(), &mut sandbox, &mut entry, &[])
            .unwrap_err();

        assert!(matches!(err, KettleError::NotFound(_)));
        assert_eq!(entry.post_runs, 0);
    }

    #[test]
    fn test_verbose_lines_are_tagged() {
        let host = StaticHost::new(
            &[("home", EntryKind::Directory), ("etc.conf", EntryKind::File)],
            "/",
        );
        let env = EnvironmentSnapshot::from_vars([("DEBUG", "1")]);
        let options = BridgeOptions::from_environment(&env);
        assert!(options.verbose);

        let buf = SharedBuf::default();
        let mut sandbox = MemorySandbox::new();
        let mut entry = CapturingEntry::default();
        SandboxBridge::new(&host, options)
            .with_log_writer(Box::new(buf.clone()))
            .run(env, &mut sandbox, &mut entry, &[])
            .unwrap();

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(!output.is_empty());
        assert!(output.lines().all(|l| l.starts_with(LOG_TAG)));
        assert!(output.contains("mounting /home at /home"));
        assert!(output.contains("skipping /etc.conf"));
    }

    #[test]
    fn test_empty_debug_value_stays_quiet() {
        let env = EnvironmentSnapshot::from_vars([("DEBUG", "")]);
        let options = BridgeOptions::from_environment(&env);
        assert!(!options.verbose);

        let host = StaticHost::new(&[("home", EntryKind::Directory)], "/");
        let buf = SharedBuf::default();
        let mut sandbox = MemorySandbox::new();
        let mut entry = CapturingEntry::default();
        SandboxBridge::new(&host, options)
            .with_log_writer(Box::new(buf.clone()))
            .run(env, &mut sandbox, &mut entry, &[])
            .unwrap();
        assert!(buf.0.lock().unwrap().is_empty());
        assert_eq!(sandbox.environment().get("DEBUG"), Some(""));
    }

    #[test]
    fn test_quiet_by_default() {
        assert!(!BridgeOptions::from_environment(&EnvironmentSnapshot::default()).verbose);

        let host = StaticHost::new(&[("home", EntryKind::Directory)], "/");
        let buf = SharedBuf::default();
        let mut sandbox = MemorySandbox::new();
        let mut entry = CapturingEntry::default();
        SandboxBridge::new(&host, BridgeOptions::default())
            .with_log_writer(Box::new(buf.clone()))
            .run(EnvironmentSnapshot::default(), &mut sandbox, &mut entry, &[])
            .unwrap();
        assert!(buf.0.lock().unwrap().is_empty());
    }
}
