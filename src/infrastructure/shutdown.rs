use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
}

impl StopSignal {
    pub fn exit_code(self) -> i32 {
        match self {
            StopSignal::Interrupt => 130,
            StopSignal::Terminate => 143,
        }
    }
}

#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<Option<StopSignal>>,
}

pub struct ShutdownListener {
    receiver: watch::Receiver<Option<StopSignal>>,
}

impl Shutdown {
    pub fn new() -> (Self, ShutdownListener) {
        let (sender, receiver) = watch::channel(None);
        (Self { sender }, ShutdownListener { receiver })
    }

    /// Records `signal` unless an earlier one was already recorded.
    pub fn trigger(&self, signal: StopSignal) {
        self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(signal);
            true
        });
    }
}

impl ShutdownListener {
    pub async fn recv(&mut self) -> StopSignal {
        loop {
            if let Some(signal) = *self.receiver.borrow_and_update() {
                return signal;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    pub fn received(&self) -> Option<StopSignal> {
        *self.receiver.borrow()
    }
}

/// Ctrl-C and SIGTERM trigger `shutdown`. Mailbox work has no mid-command
/// cancellation; the listener side decides when to stop waiting.
pub fn install_signal_handlers(shutdown: Shutdown) {
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.trigger(StopSignal::Interrupt);
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            sigterm.recv().await;
            shutdown.trigger(StopSignal::Terminate);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_signal_wins() {
        let (shutdown, mut listener) = Shutdown::new();
        assert_eq!(listener.received(), None);

        shutdown.trigger(StopSignal::Terminate);
        shutdown.trigger(StopSignal::Interrupt);

        assert_eq!(listener.recv().await, StopSignal::Terminate);
        assert_eq!(listener.received(), Some(StopSignal::Terminate));
    }

    #[test]
    fn exit_codes_follow_shell_convention() {
        assert_eq!(StopSignal::Interrupt.exit_code(), 130);
        assert_eq!(StopSignal::Terminate.exit_code(), 143);
    }
}
