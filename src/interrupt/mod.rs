mod signal;

use log::warn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One-shot cancellation request, shared by cloning.
///
/// Once requested it stays requested for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    token: CancellationToken,
}

impl Interrupt {
    pub fn request(&self) {
        if !self.token.is_cancelled() {
            warn!("interrupt requested, stopping before the next unsave");
        }
        self.token.cancel();
    }

    /// Non-blocking check whether an interrupt was requested.
    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Turns the first termination signal the process receives into an [`Interrupt`].
pub struct InterruptCoordinator {
    interrupt: Interrupt,
    listener: JoinHandle<()>,
}

impl InterruptCoordinator {
    /// Starts listening for signals. Has to be called from within a tokio runtime.
    pub fn install() -> Self {
        let interrupt = Interrupt::default();
        let requester = interrupt.clone();
        let listener = tokio::spawn(async move {
            if signal::wait_for_signal().await {
                requester.request();
            }
        });

        Self {
            interrupt,
            listener,
        }
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }
}

impl Drop for InterruptCoordinator {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
