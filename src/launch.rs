use std::{
    io,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("game directory not found: {}", .0.display())]
    MissingWorkingDir(PathBuf),
    #[error("empty launch command")]
    EmptyCommand,
    #[error("spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Starts `command` through `sh -c` inside `working_dir` and returns without
/// waiting. The child gets its own process group so it outlives the launcher.
pub fn spawn_detached(command: &str, working_dir: &Path) -> Result<Child, LaunchError> {
    if command.trim().is_empty() {
        return Err(LaunchError::EmptyCommand);
    }
    if !working_dir.is_dir() {
        return Err(LaunchError::MissingWorkingDir(working_dir.to_path_buf()));
    }

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    cmd.spawn().map_err(|source| LaunchError::Spawn {
        command: command.to_string(),
        source,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn runs_in_working_dir() {
        let dir = TempDir::new().unwrap();
        let mut child = spawn_detached("pwd > where.txt", dir.path()).unwrap();
        child.wait().unwrap();
        let written = fs::read_to_string(dir.path().join("where.txt")).unwrap();
        assert_eq!(
            fs::canonicalize(written.trim()).unwrap(),
            fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn missing_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = spawn_detached("true", &dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, LaunchError::MissingWorkingDir(_)));
    }

    #[test]
    fn empty_command_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = spawn_detached("   ", dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::EmptyCommand));
    }
}
