use std::fmt;

use tokio::sync::watch;

/// Why the process is winding down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
    /// The browser closed the native-messaging pipe.
    InputClosed,
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShutdownReason::Interrupt => "interrupt",
            ShutdownReason::Terminate => "terminate",
            ShutdownReason::InputClosed => "input closed",
            ShutdownReason::Requested => "requested",
        })
    }
}

/// Trigger side. The first reason sticks; later triggers are no-ops.
#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<Option<ShutdownReason>>,
}

#[derive(Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<Option<ShutdownReason>>,
}

impl Shutdown {
    pub fn new() -> (Self, ShutdownListener) {
        let (sender, receiver) = watch::channel(None);
        (Self { sender }, ShutdownListener { receiver })
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn trigger(&self, reason: ShutdownReason) {
        let changed = self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
        if changed {
            tracing::info!(%reason, "shutdown requested");
        }
    }
}

impl ShutdownListener {
    /// Resolves once a reason is set, immediately if it already is. A dropped
    /// trigger side counts as a shutdown.
    pub async fn notified(&mut self) -> Option<ShutdownReason> {
        match self.receiver.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            Err(_) => None,
        }
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.receiver.borrow()
    }

    pub fn is_triggered(&self) -> bool {
        self.reason().is_some()
    }
}

pub fn install_signal_handlers(shutdown: Shutdown) {
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.trigger(ShutdownReason::Interrupt);
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        tokio::spawn(async move {
            if let Ok(mut sig) = signal(SignalKind::terminate()) {
                sig.recv().await;
                shutdown.trigger(ShutdownReason::Terminate);
            }
        });
    }
}
