//! Container supervisor seam.
//!
//! The orchestrator treats `docker compose` as an opaque process manager:
//! every call succeeds or fails and may return output text.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use fastfood_core::{OpsError, OpsResult};
use fastfood_health::Exec;

/// Captured result of a supervisor command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

#[async_trait]
pub trait Supervisor: Send + Sync {
    /// Build the image of one service.
    async fn build(&self, service: &str) -> OpsResult<()>;

    /// Create and start services in the background. Empty means all.
    async fn up(&self, services: &[String]) -> OpsResult<()>;

    /// Stop and remove every container of the stack.
    async fn down(&self) -> OpsResult<()>;

    async fn start(&self, services: &[String]) -> OpsResult<()>;

    async fn stop(&self, services: &[String]) -> OpsResult<()>;

    async fn restart(&self, services: &[String]) -> OpsResult<()>;

    /// Run `command` inside the running `service` container, feeding
    /// `stdin` when given.
    async fn exec(
        &self,
        service: &str,
        command: &[String],
        stdin: Option<Vec<u8>>,
    ) -> OpsResult<CommandOutput>;

    /// Container listing.
    async fn ps(&self) -> OpsResult<String>;

    /// Recent log lines of one service, or of all services.
    async fn logs(&self, service: Option<&str>, tail: u32) -> OpsResult<String>;

    /// One-shot resource usage listing.
    async fn stats(&self) -> OpsResult<String>;
}

/// `docker compose` against a compose file.
#[derive(Debug, Clone)]
pub struct DockerCompose {
    program: String,
    compose_file: PathBuf,
    project_dir: PathBuf,
}

impl DockerCompose {
    pub fn new(compose_file: &Path, project_dir: &Path) -> Self {
        Self {
            program: "docker".to_string(),
            compose_file: compose_file.to_path_buf(),
            project_dir: project_dir.to_path_buf(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("compose")
            .arg("-f")
            .arg(&self.compose_file)
            .args(args)
            .current_dir(&self.project_dir);
        cmd
    }

    /// Run with captured output.
    async fn run_captured(&self, args: &[&str], stdin: Option<Vec<u8>>) -> OpsResult<CommandOutput> {
        debug!(?args, "docker compose");
        let mut cmd = self.command(args);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() });

        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;

        // Feed stdin while stdout/stderr are drained, or a chatty child
        // fills its output pipe and both sides block.
        let pipe = child.stdin.take();
        let writer = async move {
            if let (Some(input), Some(mut pipe)) = (stdin, pipe) {
                pipe.write_all(&input).await?;
                pipe.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (written, output) = tokio::join!(writer, child.wait_with_output());
        let output = output?;
        if let Err(e) = written {
            // The exit status reports the real failure.
            debug!(error = %e, "child closed stdin early");
        }
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run with the operator's terminal attached; fail on non-zero exit.
    async fn run_inherited(&self, args: &[&str]) -> OpsResult<()> {
        debug!(?args, "docker compose");
        let status = self
            .command(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return Err(OpsError::Supervisor(format!(
                "docker compose {} exited with code {code}",
                args.join(" ")
            )));
        }
        Ok(())
    }

    async fn run_checked(&self, args: &[&str]) -> OpsResult<String> {
        let output = self.run_captured(args, None).await?;
        if !output.success {
            return Err(OpsError::Supervisor(format!(
                "docker compose {} failed: {}",
                args.join(" "),
                output.stderr.trim()
            )));
        }
        Ok(output.stdout_text())
    }

    /// Stream logs until interrupted.
    pub async fn follow_logs(&self, service: Option<&str>) -> OpsResult<()> {
        let mut args = vec!["logs", "-f", "--tail", "100"];
        args.extend(service);
        self.run_inherited(&args).await
    }

    fn spawn_error(&self, e: std::io::Error) -> OpsError {
        if e.kind() == std::io::ErrorKind::NotFound {
            OpsError::MissingDependency(self.program.clone())
        } else {
            OpsError::Io(e)
        }
    }
}

fn with_services<'a>(base: &[&'a str], services: &'a [String]) -> Vec<&'a str> {
    let mut args = base.to_vec();
    args.extend(services.iter().map(String::as_str));
    args
}

#[async_trait]
impl Supervisor for DockerCompose {
    async fn build(&self, service: &str) -> OpsResult<()> {
        self.run_inherited(&["build", service]).await
    }

    async fn up(&self, services: &[String]) -> OpsResult<()> {
        self.run_inherited(&with_services(&["up", "-d"], services)).await
    }

    async fn down(&self) -> OpsResult<()> {
        self.run_inherited(&["down"]).await
    }

    async fn start(&self, services: &[String]) -> OpsResult<()> {
        self.run_inherited(&with_services(&["start"], services)).await
    }

    async fn stop(&self, services: &[String]) -> OpsResult<()> {
        self.run_inherited(&with_services(&["stop"], services)).await
    }

    async fn restart(&self, services: &[String]) -> OpsResult<()> {
        self.run_inherited(&with_services(&["restart"], services)).await
    }

    async fn exec(
        &self,
        service: &str,
        command: &[String],
        stdin: Option<Vec<u8>>,
    ) -> OpsResult<CommandOutput> {
        let mut args = vec!["exec", "-T", service];
        args.extend(command.iter().map(String::as_str));
        self.run_captured(&args, stdin).await
    }

    async fn ps(&self) -> OpsResult<String> {
        self.run_checked(&["ps"]).await
    }

    async fn logs(&self, service: Option<&str>, tail: u32) -> OpsResult<String> {
        let tail = tail.to_string();
        let mut args = vec!["logs", "--no-color", "--tail", tail.as_str()];
        args.extend(service);
        self.run_checked(&args).await
    }

    async fn stats(&self) -> OpsResult<String> {
        // `docker stats` is not a compose subcommand; scope it to the
        // stack's running containers.
        let ids = self.run_checked(&["ps", "-q"]).await?;
        let ids: Vec<&str> = ids.split_whitespace().collect();
        if ids.is_empty() {
            return Ok(String::new());
        }
        let output = Command::new(&self.program)
            .arg("stats")
            .arg("--no-stream")
            .args(&ids)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Adapts a [`Supervisor`] to the probe [`Exec`] seam.
pub struct SupervisorExec<'a, S: ?Sized>(pub &'a S);

#[async_trait]
impl<'a, S: Supervisor + ?Sized> Exec for SupervisorExec<'a, S> {
    async fn exec_succeeds(&self, service: &str, command: &[String]) -> std::io::Result<bool> {
        match self.0.exec(service, command, None).await {
            Ok(output) => Ok(output.success),
            Err(OpsError::Io(e)) => Err(e),
            Err(e) => Err(std::io::Error::other(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_services_appends_names() {
        let services = vec!["db".to_string(), "redis".to_string()];
        assert_eq!(with_services(&["up", "-d"], &services), vec!["up", "-d", "db", "redis"]);
        assert_eq!(with_services(&["up", "-d"], &[]), vec!["up", "-d"]);
    }

    #[tokio::test]
    async fn missing_program_is_missing_dependency() {
        let dir = std::env::temp_dir();
        let mut compose = DockerCompose::new(&dir.join("docker-compose.yml"), &dir);
        compose.program = "definitely-not-a-real-binary-fastfood".to_string();

        let err = compose.ps().await.unwrap_err();
        assert!(matches!(err, OpsError::MissingDependency(ref p) if p.contains("definitely-not")));
    }

    #[test]
    fn command_output_text_is_lossy_utf8() {
        let output = CommandOutput {
            success: true,
            stdout: b"db   running\n".to_vec(),
            stderr: String::new(),
        };
        assert_eq!(output.stdout_text(), "db   running\n");
    }

    /// A compose stand-in: `sh` runs the script file named `compose` in
    /// the project directory and ignores the compose arguments.
    fn scripted_compose(dir: &Path, script: &str) -> DockerCompose {
        std::fs::write(dir.join("compose"), script).unwrap();
        let mut compose = DockerCompose::new(&dir.join("docker-compose.yml"), dir);
        compose.program = "sh".to_string();
        compose
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exec_with_large_stdin_and_noisy_stderr_completes() {
        let dir = tempfile::tempdir().unwrap();
        let compose = scripted_compose(
            dir.path(),
            "head -c 200000 /dev/zero >&2\ncat >/dev/null\n",
        );

        let command = vec!["pg_restore".to_string()];
        let output = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            compose.exec("db", &command, Some(vec![0; 1_000_000])),
        )
        .await
        .expect("exec blocked on full pipes")
        .unwrap();

        assert!(output.success);
        assert_eq!(output.stderr.len(), 200_000);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exec_reports_failure_when_child_ignores_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let compose = scripted_compose(dir.path(), "echo 'pg_restore: bad archive' >&2\nexit 1\n");

        let command = vec!["pg_restore".to_string()];
        let output = compose
            .exec("db", &command, Some(vec![0; 1_000_000]))
            .await
            .unwrap();

        assert!(!output.success);
        assert!(output.stderr.contains("bad archive"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stats_without_running_containers_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let compose = scripted_compose(dir.path(), "exit 0\n");

        assert_eq!(compose.stats().await.unwrap(), "");
    }
}
