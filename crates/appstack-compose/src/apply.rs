//! Applying a plan through external collaborators.
//!
//! The resolver performs no I/O itself. A [`FileManager`] converges groups,
//! directories, and files; a [`ComposeOrchestrator`] brings the stack up.
//! The compose action runs strictly after the compose file is written, and
//! only when something it subscribes to differs from what the stack was last
//! brought up with. Those digests are recorded only once the compose action
//! succeeds, so a failed or skipped restart is retried on the next run.

use std::path::{Path, PathBuf};

use appstack_common::error::{AppStackError, Result};
use appstack_common::types::Sha256Hash;

use crate::plan::DeploymentPlan;
use crate::resources::Resource;

/// Converges filesystem resources.
pub trait FileManager {
    /// Ensures a system group exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the group cannot be found or created.
    fn ensure_group(&mut self, name: &str) -> Result<()>;

    /// Ensures a directory exists with the given ownership and mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or chowned.
    fn ensure_directory(&mut self, path: &Path, owner: &str, group: &str, mode: &str) -> Result<()>;

    /// Ensures a file holds `content` with the given ownership and mode.
    ///
    /// Returns `true` when the content was written, `false` when the file
    /// already matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or chowned.
    fn ensure_file(
        &mut self,
        path: &Path,
        content: &str,
        owner: &str,
        group: &str,
        mode: &str,
    ) -> Result<bool>;

    /// Digest of a file's current content, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn file_digest(&self, path: &Path) -> Result<Option<Sha256Hash>>;

    /// Digest of a watched file as of the last successful compose action,
    /// or `None` if none was recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn applied_digest(&self, path: &Path) -> Result<Option<Sha256Hash>>;

    /// Records the digest a watched file had when the stack was brought up.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    fn record_applied(&mut self, path: &Path, digest: &Sha256Hash) -> Result<()>;
}

/// Drives the container engine and compose tool.
pub trait ComposeOrchestrator {
    /// Checks that the engine is available and reports its log driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unavailable.
    fn ensure_engine(&mut self, log_driver: &str) -> Result<()>;

    /// Checks that the compose tool is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is unavailable.
    fn ensure_compose_tool(&mut self) -> Result<()>;

    /// Creates or recreates the project's containers from the compose files.
    ///
    /// # Errors
    ///
    /// Returns an error if the compose invocation fails.
    fn up(&mut self, project: &str, compose_files: &[PathBuf]) -> Result<()>;
}

/// Options for [`apply_plan`].
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// Run the compose action when a subscribed resource changed.
    pub restart: bool,
    /// Run the compose action even when nothing changed.
    pub force_restart: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            restart: true,
            force_restart: false,
        }
    }
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Titles converged, in order.
    pub applied: Vec<String>,
    /// Watched titles that differ from what the stack was last brought up
    /// with.
    pub changed: Vec<String>,
    /// Whether the compose action ran.
    pub restarted: bool,
}

/// Converges every resource of `plan` in dependency order.
///
/// # Errors
///
/// Returns the first collaborator error, or [`AppStackError::NotFound`] when
/// a prerequisite file is missing. Resources after the failure are not
/// touched.
pub fn apply_plan(
    plan: &DeploymentPlan,
    files: &mut dyn FileManager,
    compose: &mut dyn ComposeOrchestrator,
    options: ApplyOptions,
) -> Result<ApplyReport> {
    tracing::info!(project = %plan.config.project_name, "applying deployment plan");
    let mut report = ApplyReport::default();
    let mut pending: Vec<(String, &Path, Sha256Hash)> = Vec::new();

    for resource in plan.ordered_resources() {
        let title = resource.title();
        match resource {
            Resource::Group { name, .. } => files.ensure_group(name)?,
            Resource::ContainerEngine { log_driver } => compose.ensure_engine(log_driver)?,
            Resource::ComposeTool { .. } => compose.ensure_compose_tool()?,
            Resource::Directory {
                path,
                owner,
                group,
                mode,
            } => files.ensure_directory(path, owner, group, mode)?,
            Resource::File {
                path,
                owner,
                group,
                mode,
                content,
                digest,
            } => {
                if files.ensure_file(path, content, owner, group, mode)? {
                    tracing::info!(%title, "content written");
                }
                track(files, &mut report, &mut pending, title.clone(), path, digest.clone())?;
            }
            Resource::Prerequisite { path } => {
                let current = files
                    .file_digest(path)?
                    .ok_or_else(|| AppStackError::NotFound {
                        kind: "prerequisite file",
                        id: path.display().to_string(),
                    })?;
                track(files, &mut report, &mut pending, title.clone(), path, current)?;
            }
            Resource::Compose {
                project,
                compose_files,
                subscribes,
                ..
            } => {
                let triggered = subscribes.iter().any(|t| report.changed.contains(t));
                if options.force_restart || (options.restart && triggered) {
                    compose.up(project, compose_files)?;
                    report.restarted = true;
                    for (watched, path, digest) in &pending {
                        if subscribes.contains(watched) {
                            files.record_applied(path, digest)?;
                        }
                    }
                    pending.retain(|(watched, _, _)| !subscribes.contains(watched));
                } else {
                    tracing::debug!(%project, triggered, "compose action skipped");
                }
            }
        }
        report.applied.push(title);
    }

    Ok(report)
}

/// Compares a watched file against its last applied digest, queueing the
/// current digest to be recorded after the compose action.
fn track<'p>(
    files: &dyn FileManager,
    report: &mut ApplyReport,
    pending: &mut Vec<(String, &'p Path, Sha256Hash)>,
    title: String,
    path: &'p Path,
    current: Sha256Hash,
) -> Result<()> {
    if files.applied_digest(path)?.as_ref() != Some(&current) {
        tracing::info!(%title, "differs from last applied state");
        report.changed.push(title.clone());
    }
    pending.push((title, path, current));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use appstack_common::config::DeploymentParams;

    use super::*;
    use crate::identity::PuppetIdentity;
    use crate::plan::digest;

    #[derive(Default)]
    struct FakeFiles {
        calls: Vec<String>,
        contents: HashMap<PathBuf, String>,
        existing: HashMap<PathBuf, String>,
        recorded: HashMap<PathBuf, Sha256Hash>,
    }

    impl FileManager for FakeFiles {
        fn ensure_group(&mut self, name: &str) -> Result<()> {
            self.calls.push(format!("group {name}"));
            Ok(())
        }

        fn ensure_directory(&mut self, path: &Path, _: &str, _: &str, _: &str) -> Result<()> {
            self.calls.push(format!("dir {}", path.display()));
            Ok(())
        }

        fn ensure_file(&mut self, path: &Path, content: &str, _: &str, _: &str, _: &str) -> Result<bool> {
            self.calls.push(format!("file {}", path.display()));
            let previous = self.contents.insert(path.to_path_buf(), content.to_string());
            Ok(previous.as_deref() != Some(content))
        }

        fn file_digest(&self, path: &Path) -> Result<Option<Sha256Hash>> {
            Ok(self.existing.get(path).map(|content| digest(content)))
        }

        fn applied_digest(&self, path: &Path) -> Result<Option<Sha256Hash>> {
            Ok(self.recorded.get(path).cloned())
        }

        fn record_applied(&mut self, path: &Path, digest: &Sha256Hash) -> Result<()> {
            let _ = self.recorded.insert(path.to_path_buf(), digest.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeCompose {
        ups: Vec<String>,
        calls: usize,
        failures: usize,
    }

    impl ComposeOrchestrator for FakeCompose {
        fn ensure_engine(&mut self, _log_driver: &str) -> Result<()> {
            self.calls += 1;
            Ok(())
        }

        fn ensure_compose_tool(&mut self) -> Result<()> {
            self.calls += 1;
            Ok(())
        }

        fn up(&mut self, project: &str, _compose_files: &[PathBuf]) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(AppStackError::Command {
                    program: "docker".into(),
                    status: "exit status: 1".into(),
                });
            }
            self.ups.push(project.to_string());
            Ok(())
        }
    }

    fn plan(params: &DeploymentParams) -> DeploymentPlan {
        DeploymentPlan::build(params, &PuppetIdentity::new("node.example")).expect("plan")
    }

    #[test]
    fn first_apply_writes_and_restarts() {
        let plan = plan(&DeploymentParams::new("data_entitlement.test.com"));
        let mut files = FakeFiles::default();
        let mut compose = FakeCompose::default();
        let report =
            apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("apply");
        assert!(report.restarted);
        assert_eq!(compose.ups, ["data_entitlement"]);
        assert_eq!(compose.calls, 2);
        assert_eq!(report.applied.len(), plan.resources.len());
        let dir_pos = files
            .calls
            .iter()
            .position(|c| c == "dir /opt/puppetlabs/data_entitlement")
            .expect("dir");
        let file_pos = files
            .calls
            .iter()
            .position(|c| c == "file /opt/puppetlabs/data_entitlement/docker-compose.yaml")
            .expect("file");
        assert!(dir_pos < file_pos);
    }

    #[test]
    fn unchanged_apply_does_not_restart() {
        let plan = plan(&DeploymentParams::new("data_entitlement.test.com"));
        let mut files = FakeFiles::default();
        let mut compose = FakeCompose::default();
        let _ = apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("first");
        let report =
            apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("second");
        assert!(!report.restarted);
        assert!(report.changed.is_empty());
        assert_eq!(compose.ups.len(), 1);
    }

    #[test]
    fn force_restart_runs_without_changes() {
        let plan = plan(&DeploymentParams::new("data_entitlement.test.com"));
        let mut files = FakeFiles::default();
        let mut compose = FakeCompose::default();
        let _ = apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("first");
        let options = ApplyOptions {
            force_restart: true,
            ..ApplyOptions::default()
        };
        let report = apply_plan(&plan, &mut files, &mut compose, options).expect("second");
        assert!(report.restarted);
    }

    #[test]
    fn no_restart_option_writes_only() {
        let plan = plan(&DeploymentParams::new("data_entitlement.test.com"));
        let mut files = FakeFiles::default();
        let mut compose = FakeCompose::default();
        let options = ApplyOptions {
            restart: false,
            force_restart: false,
        };
        let report = apply_plan(&plan, &mut files, &mut compose, options).expect("apply");
        assert!(!report.restarted);
        assert_eq!(report.changed.len(), 1);
        assert!(compose.ups.is_empty());
    }

    #[test]
    fn missing_prerequisite_stops_before_compose() {
        let params = DeploymentParams {
            ui_use_tls: true,
            ui_key_file: Some("/tmp/ui-cert.key".into()),
            ui_cert_file: Some("/tmp/ui-cert.pem".into()),
            ..DeploymentParams::new("data_entitlement.test.com")
        };
        let plan = plan(&params);
        let mut files = FakeFiles::default();
        let _ = files.existing.insert("/tmp/ui-cert.key".into(), "key".into());
        let mut compose = FakeCompose::default();
        let err = apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).unwrap_err();
        assert!(err.to_string().contains("/tmp/ui-cert.pem"), "got: {err}");
        assert!(compose.ups.is_empty());
    }

    fn tls_plan() -> DeploymentPlan {
        plan(&DeploymentParams {
            ui_use_tls: true,
            ui_key_file: Some("/tmp/ui-cert.key".into()),
            ui_cert_file: Some("/tmp/ui-cert.pem".into()),
            ..DeploymentParams::new("data_entitlement.test.com")
        })
    }

    fn tls_files() -> FakeFiles {
        let mut files = FakeFiles::default();
        let _ = files.existing.insert("/tmp/ui-cert.key".into(), "key".into());
        let _ = files.existing.insert("/tmp/ui-cert.pem".into(), "cert".into());
        files
    }

    #[test]
    fn changed_prerequisite_restarts_stack() {
        let plan = tls_plan();
        let mut files = tls_files();
        let mut compose = FakeCompose::default();
        let _ = apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("first");

        let _ = files.existing.insert("/tmp/ui-cert.pem".into(), "renewed".into());
        let report =
            apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("second");
        assert_eq!(report.changed, ["File[/tmp/ui-cert.pem]"]);
        assert!(report.restarted);
        assert_eq!(compose.ups.len(), 2);
    }

    #[test]
    fn unchanged_prerequisites_do_not_restart() {
        let plan = tls_plan();
        let mut files = tls_files();
        let mut compose = FakeCompose::default();
        let first =
            apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("first");
        assert_eq!(first.changed.len(), 3);
        let second =
            apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("second");
        assert!(second.changed.is_empty());
        assert!(!second.restarted);
    }

    #[test]
    fn failed_restart_is_retried_on_next_apply() {
        let plan = tls_plan();
        let mut files = tls_files();
        let mut compose = FakeCompose {
            failures: 1,
            ..FakeCompose::default()
        };
        let err = apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).unwrap_err();
        assert!(matches!(err, AppStackError::Command { .. }));
        assert!(files.recorded.is_empty());

        let report =
            apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("retry");
        assert!(report.restarted);
        assert_eq!(report.changed.len(), 3);
        assert_eq!(compose.ups, ["data_entitlement"]);
    }

    #[test]
    fn skipped_restart_is_done_by_next_apply() {
        let plan = tls_plan();
        let mut files = tls_files();
        let mut compose = FakeCompose::default();
        let skipped = ApplyOptions {
            restart: false,
            force_restart: false,
        };
        let first = apply_plan(&plan, &mut files, &mut compose, skipped).expect("first");
        assert!(!first.restarted);

        let second =
            apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("second");
        assert!(second.restarted);
        assert_eq!(compose.ups.len(), 1);

        let third =
            apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("third");
        assert!(!third.restarted);
    }

    #[test]
    fn compose_file_compared_to_last_applied_digest() {
        let plan = plan(&DeploymentParams::new("data_entitlement.test.com"));
        let mut files = FakeFiles::default();
        let mut compose = FakeCompose::default();
        let compose_file = plan.config.compose_file.clone();
        let _ = files
            .contents
            .insert(compose_file.clone(), plan.compose_text.clone());

        let report =
            apply_plan(&plan, &mut files, &mut compose, ApplyOptions::default()).expect("apply");
        assert!(report.restarted);
        assert_eq!(files.recorded.get(&compose_file), Some(&plan.compose_digest));
    }
}
