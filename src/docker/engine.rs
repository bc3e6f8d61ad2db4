use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};

use super::exec;
use super::runtime::{BuildRequest, ContainerRuntime, Invocation};
use super::types::{ContainerCommand, ExecResult};
use crate::registry::RunSpec;

/// Drives a Docker-compatible CLI (`docker`, `podman`) as a subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliRuntime {
    program: String,
    /// Arguments placed before every subcommand, e.g. `docker` in `sudo docker`.
    base_args: Vec<String>,
}

impl CliRuntime {
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_args(program, Vec::new())
    }

    pub fn with_args(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    /// Parse a shell-style command line such as `podman --remote`.
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut words = shell_words::split(command_line)
            .with_context(|| format!("cannot parse runtime command `{command_line}`"))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| anyhow!("runtime command is empty"))?;
        Ok(Self::with_args(program, words.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn argv(&self, args: Vec<String>) -> Vec<String> {
        let mut argv = self.base_args.clone();
        argv.extend(args);
        argv
    }

    /// Verify that the CLI is installed and its daemon is reachable.
    pub fn ensure_available(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.base_args)
            .args(["version", "--format", "{{.Server.Version}}"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| {
                format!("failed to invoke `{}`: is it installed and on PATH?", self.program)
            })?;

        if !status.success() {
            bail!("{} daemon is not reachable ({})", self.program, status);
        }
        Ok(())
    }

    fn exec(&self, args: Vec<String>, invocation: &Invocation<'_>) -> Result<ExecResult> {
        let cmd = ContainerCommand {
            program: self.program.clone(),
            args: self.argv(args),
            timeout: invocation.timeout,
        };
        exec::run(cmd, invocation.cancel, invocation.on_line)
    }
}

impl Default for CliRuntime {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl ContainerRuntime for CliRuntime {
    fn build(&self, request: &BuildRequest<'_>, invocation: &Invocation<'_>) -> Result<ExecResult> {
        self.exec(build_args(request), invocation)
    }

    fn run(&self, spec: &RunSpec, invocation: &Invocation<'_>) -> Result<ExecResult> {
        self.exec(run_args(spec), invocation)
    }

    fn remove(&self, container_id: &str, invocation: &Invocation<'_>) -> Result<ExecResult> {
        self.exec(remove_args(container_id), invocation)
    }
}

/// `build -q` prints only the image id on stdout; errors still go to stderr.
pub fn build_args(request: &BuildRequest<'_>) -> Vec<String> {
    vec![
        "build".into(),
        "-q".into(),
        "-t".into(),
        request.tag.to_string(),
        "-f".into(),
        request.dockerfile.display().to_string(),
        request.context_dir.display().to_string(),
    ]
}

pub fn run_args(spec: &RunSpec) -> Vec<String> {
    let mut args = vec!["run".to_string()];
    if spec.detached {
        args.push("-d".into());
    }
    if spec.interactive {
        args.push("-it".into());
    }
    if spec.privileged {
        args.push("--privileged".into());
    }
    if let Some(name) = &spec.name {
        args.extend(["--name".into(), name.clone()]);
    }
    for port in &spec.ports {
        args.extend(["-p".into(), port.to_string()]);
    }
    args.push(spec.image.clone());
    args
}

pub fn remove_args(container_id: &str) -> Vec<String> {
    vec!["rm".into(), "-f".into(), container_id.to_string()]
}
