//! # Process boundary: exit and re-exec.
//!
//! The supervisor never calls `std::process::exit` or `exec` directly. It
//! goes through a [`Host`], so the whole process boundary sits behind one
//! seam: [`OsHost`] in production, a recording double in tests.
//!
//! [`Invocation`] is captured once at startup (program, arguments,
//! environment, working directory) and replayed on restart.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The command line and environment this process was launched with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    cwd: Option<PathBuf>,
}

impl Invocation {
    /// Captures the current process's `argv`, environment and working directory.
    pub fn capture() -> Self {
        let mut argv = std::env::args_os();
        let program = argv.next().map(PathBuf::from).unwrap_or_default();
        Self {
            program,
            args: argv.collect(),
            env: std::env::vars_os().collect(),
            cwd: std::env::current_dir().ok(),
        }
    }

    /// Explicit invocation with the current environment.
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: std::env::vars_os().collect(),
            cwd: std::env::current_dir().ok(),
        }
    }

    /// Replaces the recorded arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Program basename without extension (`/usr/bin/agentd.rb` → `agentd`).
    pub fn program_name(&self) -> String {
        self.program
            .file_stem()
            .unwrap_or_else(|| OsStr::new(""))
            .to_string_lossy()
            .into_owned()
    }

    /// Space-joined command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(OsStr::to_string_lossy)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builds the command that replays this invocation.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).env_clear().envs(self.env.iter().cloned());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// The process boundary.
pub trait Host: Send + Sync + 'static {
    /// Terminates the process with `code`. Only test doubles return.
    fn exit(&self, code: i32);

    /// Replaces the process image with `inv`. Returns only on failure.
    fn exec(&self, inv: &Invocation) -> io::Error;
}

/// [`Host`] backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsHost;

impl Host for OsHost {
    fn exit(&self, code: i32) {
        std::process::exit(code)
    }

    #[cfg(unix)]
    fn exec(&self, inv: &Invocation) -> io::Error {
        use std::os::unix::process::CommandExt;
        inv.to_command().exec()
    }

    #[cfg(not(unix))]
    fn exec(&self, inv: &Invocation) -> io::Error {
        match inv.to_command().spawn() {
            Ok(_) => std::process::exit(0),
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_name_strips_directory_and_extension() {
        let inv = Invocation::new("/usr/sbin/agentd.rb", ["--verbose"]);
        assert_eq!(inv.program_name(), "agentd");
        assert_eq!(inv.command_line(), "/usr/sbin/agentd.rb --verbose");
    }

    #[test]
    fn to_command_replays_arguments() {
        let inv = Invocation::new("/bin/echo", ["a", "b"]).with_args(["c"]);
        let cmd = inv.to_command();
        assert_eq!(cmd.get_program(), "/bin/echo");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, vec![OsStr::new("c")]);
    }

    #[test]
    fn capture_records_current_process() {
        let inv = Invocation::capture();
        assert!(!inv.program().as_os_str().is_empty());
        assert!(!inv.env.is_empty() || std::env::vars_os().next().is_none());
    }
}
