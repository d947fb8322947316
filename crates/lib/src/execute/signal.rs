//! Operator interrupts.
//!
//! A run listens once, before its first step, so an interrupt is never lost
//! between subprocesses. On Unix both SIGINT and SIGTERM count; on Windows,
//! Ctrl-C.

use std::io;

/// Listener for operator interrupts, held for the duration of a run.
pub struct Interrupts {
  #[cfg(unix)]
  interrupt: tokio::signal::unix::Signal,
  #[cfg(unix)]
  terminate: tokio::signal::unix::Signal,
  #[cfg(windows)]
  ctrl_c: tokio::signal::windows::CtrlC,
}

impl Interrupts {
  /// Install the signal handlers. Must be called within a tokio runtime.
  pub fn listen() -> io::Result<Self> {
    #[cfg(unix)]
    {
      use tokio::signal::unix::{SignalKind, signal};
      Ok(Self {
        interrupt: signal(SignalKind::interrupt())?,
        terminate: signal(SignalKind::terminate())?,
      })
    }

    #[cfg(windows)]
    {
      Ok(Self {
        ctrl_c: tokio::signal::windows::ctrl_c()?,
      })
    }

    #[cfg(not(any(unix, windows)))]
    {
      Ok(Self {})
    }
  }

  /// Wait for the next interrupt.
  pub async fn recv(&mut self) {
    #[cfg(unix)]
    {
      tokio::select! {
        _ = self.interrupt.recv() => {}
        _ = self.terminate.recv() => {}
      }
    }

    #[cfg(windows)]
    {
      self.ctrl_c.recv().await;
    }

    #[cfg(not(any(unix, windows)))]
    {
      std::future::pending::<()>().await
    }
  }

  /// Returns true if an interrupt arrived since the last check.
  pub async fn pending(&mut self) -> bool {
    // Let the runtime's signal driver deliver anything already raised
    tokio::task::yield_now().await;

    tokio::select! {
      biased;
      () = self.recv() => true,
      () = std::future::ready(()) => false,
    }
  }
}
