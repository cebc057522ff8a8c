use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Process-wide cancellation signal shared by every worker.
///
/// Cloning is cheap; all clones observe the same signal.
#[derive(Clone)]
pub struct RunContext {
    cancel: Arc<watch::Sender<bool>>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { cancel: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        // The sender lives as long as `self`, so this only returns on cancellation.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Cancel the run when Ctrl-C is pressed or `deadline` elapses.
    pub fn spawn_watchdog(&self, deadline: Option<Duration>) {
        self.spawn_watchdog_on(tokio::signal::ctrl_c(), deadline);
    }

    /// Cancel the run when `interrupt` fires or `deadline` elapses.
    ///
    /// If the interrupt listener fails, the run keeps going and only the
    /// deadline or an explicit [`cancel`](Self::cancel) can stop it.
    fn spawn_watchdog_on<F>(&self, interrupt: F, deadline: Option<Duration>)
    where
        F: Future<Output = io::Result<()>> + Send + 'static,
    {
        let ctx = self.clone();
        tokio::spawn(async move {
            let interrupted = async {
                match interrupt.await {
                    Ok(()) => tracing::warn!("interrupted, cancelling run"),
                    Err(err) => {
                        tracing::error!(error = %err, "unable to listen for Ctrl-C");
                        std::future::pending::<()>().await;
                    }
                }
            };
            let timer = async {
                match deadline {
                    Some(d) => tokio::time::sleep(d).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = interrupted => {}
                _ = timer => tracing::warn!("run deadline elapsed, cancelling run"),
                _ = ctx.cancelled() => return,
            }
            ctx.cancel();
        });
    }
}
