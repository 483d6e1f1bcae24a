//! Host-side collaborators for `apply`.
//!
//! [`LocalFiles`] converges files and directories on the local filesystem.
//! [`DockerCompose`] drives the `docker` binary. Both accept an optional
//! root directory under which every managed path is placed, for staging.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use appstack_common::constants::WATCH_STATE_FILE;
use appstack_common::error::{AppStackError, Result};
use appstack_common::types::Sha256Hash;
use appstack_compose::apply::{ComposeOrchestrator, FileManager};
use appstack_compose::plan::digest_bytes;

/// Places an absolute `path` under `root`, if one is set.
#[must_use]
pub fn reroot(root: Option<&Path>, path: &Path) -> PathBuf {
    match root {
        Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
        None => path.to_path_buf(),
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> AppStackError + '_ {
    move |source| AppStackError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn parse_mode(mode: &str) -> Result<u32> {
    u32::from_str_radix(mode, 8).map_err(|_| AppStackError::Config {
        message: format!("invalid octal file mode '{mode}'"),
    })
}

/// Converges managed files and directories on the local filesystem.
///
/// Digests of watched files as of the last successful compose action are
/// kept in a JSON state file so that a later run can tell whether they
/// changed.
#[derive(Debug)]
pub struct LocalFiles {
    root: Option<PathBuf>,
    manage_ownership: bool,
    state_file: PathBuf,
}

impl LocalFiles {
    /// Creates a file manager rooted at `root`.
    ///
    /// With `manage_ownership` off, owners, groups, and modes are left as
    /// the filesystem creates them and no groups are added.
    #[must_use]
    pub fn new(root: Option<PathBuf>, manage_ownership: bool) -> Self {
        let state_file = reroot(root.as_deref(), Path::new(WATCH_STATE_FILE));
        Self {
            root,
            manage_ownership,
            state_file,
        }
    }

    fn load_state(&self) -> Result<BTreeMap<PathBuf, Sha256Hash>> {
        match std::fs::read_to_string(&self.state_file) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(io_error(&self.state_file)(e)),
        }
    }

    fn save_state(&self, state: &BTreeMap<PathBuf, Sha256Hash>) -> Result<()> {
        if let Some(parent) = self.state_file.parent() {
            std::fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let text = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.state_file, text).map_err(io_error(&self.state_file))
    }

    fn target(&self, path: &Path) -> PathBuf {
        reroot(self.root.as_deref(), path)
    }

    fn set_attributes(&self, path: &Path, owner: &str, group: &str, mode: &str) -> Result<()> {
        if !self.manage_ownership {
            return Ok(());
        }
        set_mode(path, parse_mode(mode)?)?;
        set_owner(path, owner, group)
    }
}

impl FileManager for LocalFiles {
    fn ensure_group(&mut self, name: &str) -> Result<()> {
        if !self.manage_ownership || group_exists(name)? {
            return Ok(());
        }
        tracing::info!(group = name, "creating group");
        run("groupadd", &["--system", name]).map(|_| ())
    }

    fn ensure_directory(&mut self, path: &Path, owner: &str, group: &str, mode: &str) -> Result<()> {
        let target = self.target(path);
        if !target.is_dir() {
            tracing::info!(path = %target.display(), "creating directory");
            std::fs::create_dir_all(&target).map_err(io_error(&target))?;
        }
        self.set_attributes(&target, owner, group, mode)
    }

    fn ensure_file(
        &mut self,
        path: &Path,
        content: &str,
        owner: &str,
        group: &str,
        mode: &str,
    ) -> Result<bool> {
        let target = self.target(path);
        let current = match std::fs::read_to_string(&target) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_error(&target)(e)),
        };
        let changed = current.as_deref() != Some(content);

        if changed {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
            let staging = target.with_extension("tmp");
            write_private(&staging, content, parse_mode(mode)?)?;
            std::fs::rename(&staging, &target).map_err(io_error(&target))?;
            tracing::info!(path = %target.display(), "file written");
        }
        self.set_attributes(&target, owner, group, mode)?;
        Ok(changed)
    }

    fn file_digest(&self, path: &Path) -> Result<Option<Sha256Hash>> {
        let target = self.target(path);
        match std::fs::read(&target) {
            Ok(bytes) => Ok(Some(digest_bytes(&bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&target)(e)),
        }
    }

    fn applied_digest(&self, path: &Path) -> Result<Option<Sha256Hash>> {
        Ok(self.load_state()?.remove(path))
    }

    fn record_applied(&mut self, path: &Path, digest: &Sha256Hash) -> Result<()> {
        let mut state = self.load_state()?;
        if state.get(path) != Some(digest) {
            let _ = state.insert(path.to_path_buf(), digest.clone());
            self.save_state(&state)?;
        }
        Ok(())
    }
}

/// Writes `content` to a fresh file created with `mode`, so the content is
/// never readable beyond that mode.
#[cfg(unix)]
fn write_private(path: &Path, content: &str, mode: u32) -> Result<()> {
    use std::io::Write as _;
    use std::os::unix::fs::OpenOptionsExt as _;

    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            return Err(io_error(path)(e));
        }
    }
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)
        .map_err(io_error(path))?;
    file.write_all(content.as_bytes()).map_err(io_error(path))
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &str, _mode: u32) -> Result<()> {
    std::fs::write(path, content).map_err(io_error(path))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt as _;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(io_error(path))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Changes the owner and group of `path`.
///
/// Numeric ids are used as-is. Names are looked up in the system databases.
#[cfg(target_os = "linux")]
fn set_owner(path: &Path, owner: &str, group: &str) -> Result<()> {
    use nix::unistd::{Gid, Group, Uid, User, chown};

    let uid = match owner.parse::<u32>() {
        Ok(id) => Uid::from_raw(id),
        Err(_) => lookup(User::from_name(owner), "user", owner)?.uid,
    };
    let gid = match group.parse::<u32>() {
        Ok(id) => Gid::from_raw(id),
        Err(_) => lookup(Group::from_name(group), "group", group)?.gid,
    };
    chown(path, Some(uid), Some(gid)).map_err(|e| AppStackError::PermissionDenied {
        message: format!("chown {owner}:{group} {}: {e}", path.display()),
    })
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error, ownership is only managed on Linux.
#[cfg(not(target_os = "linux"))]
fn set_owner(_path: &Path, _owner: &str, _group: &str) -> Result<()> {
    Err(AppStackError::PermissionDenied {
        message: "Linux required to manage file ownership (use --skip-ownership)".into(),
    })
}

#[cfg(target_os = "linux")]
fn lookup<T>(entry: nix::Result<Option<T>>, kind: &'static str, name: &str) -> Result<T> {
    entry
        .map_err(|e| AppStackError::PermissionDenied {
            message: format!("{kind} lookup for '{name}' failed: {e}"),
        })?
        .ok_or_else(|| AppStackError::NotFound {
            kind,
            id: name.to_string(),
        })
}

#[cfg(target_os = "linux")]
fn group_exists(name: &str) -> Result<bool> {
    nix::unistd::Group::from_name(name)
        .map(|g| g.is_some())
        .map_err(|e| AppStackError::PermissionDenied {
            message: format!("group lookup for '{name}' failed: {e}"),
        })
}

#[cfg(not(target_os = "linux"))]
fn group_exists(_name: &str) -> Result<bool> {
    Err(AppStackError::PermissionDenied {
        message: "Linux required to manage groups (use --skip-ownership)".into(),
    })
}

/// Runs a program to completion, returning its stdout.
fn run(program: impl AsRef<std::ffi::OsStr>, args: &[&str]) -> Result<String> {
    let program = program.as_ref();
    let program_display = program.to_string_lossy().into_owned();
    tracing::debug!(program = %program_display, ?args, "running command");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(io_error(Path::new(program)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppStackError::Command {
            program: program_display,
            status: format!("{}: {}", output.status, stderr.trim()),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Drives the stack through the `docker` binary and its compose plugin.
#[derive(Debug)]
pub struct DockerCompose {
    binary: PathBuf,
    root: Option<PathBuf>,
}

impl DockerCompose {
    /// Finds `docker` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the binary is not installed.
    pub fn locate(root: Option<PathBuf>) -> Result<Self> {
        let binary = which::which("docker").map_err(|_| AppStackError::NotFound {
            kind: "container engine binary",
            id: "docker (install Docker to apply the stack)".into(),
        })?;
        Ok(Self { binary, root })
    }
}

impl ComposeOrchestrator for DockerCompose {
    fn ensure_engine(&mut self, log_driver: &str) -> Result<()> {
        let active = run(&self.binary, &["info", "--format", "{{.LoggingDriver}}"])?;
        let active = active.trim();
        if active != log_driver {
            tracing::warn!(
                expected = log_driver,
                active,
                "docker daemon uses a different log driver"
            );
        }
        Ok(())
    }

    fn ensure_compose_tool(&mut self) -> Result<()> {
        let version = run(&self.binary, &["compose", "version", "--short"])?;
        tracing::debug!(version = version.trim(), "compose tool available");
        Ok(())
    }

    fn up(&mut self, project: &str, compose_files: &[PathBuf]) -> Result<()> {
        let files: Vec<String> = compose_files
            .iter()
            .map(|f| reroot(self.root.as_deref(), f).display().to_string())
            .collect();
        let mut args = vec!["compose", "-p", project];
        for file in &files {
            args.extend(["-f", file.as_str()]);
        }
        args.extend(["up", "-d", "--remove-orphans"]);

        tracing::info!(project, "bringing stack up");
        run(&self.binary, &args).map(|_| ())
    }
}

/// Orchestrator used with `--no-restart`: never touches the engine.
#[derive(Debug, Default)]
pub struct SkipCompose;

impl ComposeOrchestrator for SkipCompose {
    fn ensure_engine(&mut self, _log_driver: &str) -> Result<()> {
        Ok(())
    }

    fn ensure_compose_tool(&mut self) -> Result<()> {
        Ok(())
    }

    fn up(&mut self, project: &str, _compose_files: &[PathBuf]) -> Result<()> {
        tracing::debug!(project, "restart skipped");
        Ok(())
    }
}
