//! Shell command execution for target actions.
//!
//! Actions run through the platform shell with the orchestrator's environment
//! and inherited stdio. Their output is passed through untouched; only the
//! exit status matters.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::signal::Interrupts;
use super::types::ExecuteError;

/// Run a rendered command for `target` and wait for it to finish.
///
/// On Unix the command gets its own process group. An interrupt received
/// while it runs kills the whole group and reports the target as interrupted.
pub async fn execute_cmd(
  target: &str,
  cmd: &str,
  cwd: Option<&Path>,
  shell: Option<&str>,
  interrupts: &mut Interrupts,
) -> Result<(), ExecuteError> {
  info!(step = %target, cmd = %cmd, "executing command");

  let (shell_cmd, shell_args) = get_shell(shell);

  let mut command = Command::new(&shell_cmd);
  command
    .args(&shell_args)
    .arg(cmd)
    .stdin(Stdio::inherit())
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit())
    .kill_on_drop(true);

  #[cfg(unix)]
  command.process_group(0);

  if let Some(dir) = cwd {
    command.current_dir(dir);
  }

  debug!(shell = %shell_cmd, working_dir = ?cwd, "spawning process");

  let mut child = command.spawn().map_err(|source| ExecuteError::Spawn {
    target: target.to_string(),
    source,
  })?;

  let waited = tokio::select! {
    biased;
    () = interrupts.recv() => None,
    status = child.wait() => Some(status),
  };

  let Some(status) = waited else {
    warn!(step = %target, "interrupted, killing command");
    kill(&mut child).await;
    return Err(ExecuteError::Interrupted {
      target: target.to_string(),
    });
  };

  let status = status.map_err(|source| ExecuteError::Spawn {
    target: target.to_string(),
    source,
  })?;

  if !status.success() {
    return Err(ExecuteError::ActionFailed {
      target: target.to_string(),
      cmd: cmd.to_string(),
      status: status.into(),
    });
  }

  Ok(())
}

/// Kill an interrupted command and reap it.
async fn kill(child: &mut Child) {
  #[cfg(unix)]
  {
    use rustix::process::{Pid, Signal, kill_process_group};

    // The group id equals the shell's pid, so this reaches its descendants too
    if let Some(pid) = child.id().and_then(|id| Pid::from_raw(id as i32))
      && let Err(e) = kill_process_group(pid, Signal::KILL)
    {
      debug!(error = %e, "failed to kill process group");
    }
  }

  if let Err(e) = child.kill().await {
    debug!(error = %e, "failed to kill interrupted command");
  }
}

/// Get the shell command and arguments for the current platform.
///
/// With an override, the argument style is picked from the shell's name.
/// Without one, `/bin/sh -c` is used on Unix and PowerShell on Windows;
/// `$SHELL` is ignored so that interactive profiles do not leak into actions.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}
