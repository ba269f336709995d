//! # Control signals.
//!
//! OS signals are never handled in signal context. A listener task per signal
//! kind forwards a [`ControlSignal`] onto a bounded channel, and the control
//! plane (running inside `start_all(true)`) consumes it on an ordinary task.
//!
//! ```text
//! SIGINT/TERM/QUIT  ──► Terminate ─┐
//! SIGHUP            ──► Reload    ─┤
//! SIGUSR1           ──► Trigger   ─┼──► mpsc ──► control plane
//! SIGUSR2           ──► ReopenLogs┘       ▲
//!                                         │
//! ControlHandle::send (tests, embedders)  ┘
//! ```
//!
//! **Windows:** only Ctrl-C is forwarded, as `Terminate`.

use tokio::sync::mpsc;

use crate::error::RuntimeError;

/// Request delivered to the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Shut down and exit 0. `signal` names the source ("INT", "TERM", "QUIT").
    Terminate { signal: &'static str },
    /// Restart the master service, or relaunch the whole process.
    Reload,
    /// Run every idle triggerable service now.
    Trigger,
    /// Reopen the log destination.
    ReopenLogs,
}

impl ControlSignal {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControlSignal::Terminate { .. } => "terminate",
            ControlSignal::Reload => "reload",
            ControlSignal::Trigger => "trigger",
            ControlSignal::ReopenLogs => "reopen_logs",
        }
    }
}

/// Sending side of the control channel.
#[derive(Clone, Debug)]
pub struct ControlHandle {
    tx: mpsc::Sender<ControlSignal>,
}

impl ControlHandle {
    pub(crate) fn new(tx: mpsc::Sender<ControlSignal>) -> Self {
        Self { tx }
    }

    /// Queues `signal`, waiting for room if the channel is full.
    pub async fn send(&self, signal: ControlSignal) -> Result<(), RuntimeError> {
        self.tx
            .send(signal)
            .await
            .map_err(|_| RuntimeError::ControlClosed)
    }

    /// Queues `signal` without waiting; fails if the channel is full or closed.
    pub fn try_send(&self, signal: ControlSignal) -> Result<(), RuntimeError> {
        self.tx
            .try_send(signal)
            .map_err(|_| RuntimeError::ControlClosed)
    }
}

/// Installs OS signal listeners that forward onto `handle`.
///
/// Must be called inside a tokio runtime. Each listener lives until the
/// control channel closes.
#[cfg(unix)]
pub fn forward_os_signals(handle: &ControlHandle) -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let table = [
        (SignalKind::interrupt(), ControlSignal::Terminate { signal: "INT" }),
        (SignalKind::terminate(), ControlSignal::Terminate { signal: "TERM" }),
        (SignalKind::quit(), ControlSignal::Terminate { signal: "QUIT" }),
        (SignalKind::hangup(), ControlSignal::Reload),
        (SignalKind::user_defined1(), ControlSignal::Trigger),
        (SignalKind::user_defined2(), ControlSignal::ReopenLogs),
    ];

    for (kind, control) in table {
        let mut stream = signal(kind)?;
        let tx = handle.tx.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                if tx.send(control).await.is_err() {
                    break;
                }
            }
        });
    }
    Ok(())
}

/// Installs a Ctrl-C listener that forwards `Terminate` onto `handle`.
#[cfg(not(unix))]
pub fn forward_os_signals(handle: &ControlHandle) -> std::io::Result<()> {
    let tx = handle.tx.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(ControlSignal::Terminate { signal: "INT" }).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_reports_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        let handle = ControlHandle::new(tx);

        handle.send(ControlSignal::Trigger).await.unwrap();
        assert!(matches!(
            handle.try_send(ControlSignal::Reload),
            Err(RuntimeError::ControlClosed)
        ));

        drop(rx);
        let err = handle.send(ControlSignal::ReopenLogs).await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_control_closed");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn usr1_is_forwarded_as_trigger() {
        let (tx, mut rx) = mpsc::channel(4);
        forward_os_signals(&ControlHandle::new(tx)).unwrap();

        let pid = std::process::id().to_string();
        let status = std::process::Command::new("kill")
            .args(["-USR1", &pid])
            .status()
            .unwrap();
        assert!(status.success());

        let got = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(got, Some(ControlSignal::Trigger));
    }
}
