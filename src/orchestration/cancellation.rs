use tokio::sync::watch;

/// Requests cancellation of every run holding a matching [`CancellationSignal`]
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Cooperative cancellation, observed by the orchestrator at each transition
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    pub fn channel() -> (CancellationHandle, CancellationSignal) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx }, CancellationSignal { rx })
    }

    /// A signal that is never raised
    pub fn never() -> Self {
        let (_handle, signal) = Self::channel();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if it never can be
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
