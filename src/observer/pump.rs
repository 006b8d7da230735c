use anyhow::{bail, Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{source::EntryBatch, ChannelSource, Visibility};
use crate::session::SessionController;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Owns the task that moves host batches into subscriber callbacks and
/// forwards visibility changes to the session.
pub struct ObservationPump {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl ObservationPump {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        mut source: ChannelSource,
        controller: SessionController,
        visibility: watch::Receiver<Visibility>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("observation pump already running");
        }
        let Some(rx) = source.take_receiver() else {
            bail!("channel source was already drained by another pump");
        };

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(pump_loop(
            source,
            rx,
            controller,
            visibility,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Waits for the pump to exit on its own, which happens once the feed
    /// and the visibility sender have both been dropped.
    pub async fn finish(&mut self) -> Result<()> {
        self.cancel_token = None;
        self.join().await
    }

    /// Stops the pump. Batches still queued are dropped.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.join().await
    }

    async fn join(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("observation pump task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for ObservationPump {
    fn default() -> Self {
        Self::new()
    }
}

async fn pump_loop(
    mut source: ChannelSource,
    mut rx: mpsc::UnboundedReceiver<EntryBatch>,
    controller: SessionController,
    mut visibility: watch::Receiver<Visibility>,
    cancel_token: CancellationToken,
) {
    let mut feed_open = true;
    let mut visibility_open = true;

    // A page can already be hidden when observation starts. Queued batches
    // still go first.
    if *visibility.borrow() == Visibility::Hidden {
        visibility.mark_changed();
    }

    while feed_open || visibility_open {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("observation pump cancelled for session {}", controller.session_id());
                break;
            }
            batch = rx.recv(), if feed_open => match batch {
                Some(batch) => {
                    let channel = batch.channel;
                    let size = batch.entries.len();
                    let called = source.dispatch(batch);
                    log_debug!("{channel}: {size} entries to {called} subscribers");
                }
                None => {
                    log_debug!("entry feed closed");
                    feed_open = false;
                }
            },
            changed = visibility.changed(), if visibility_open => match changed {
                Ok(()) => {
                    let state = *visibility.borrow_and_update();
                    controller.on_visibility_change(state);
                }
                Err(_) => {
                    log_debug!("visibility sender dropped");
                    visibility_open = false;
                }
            },
        }
    }

    log_info!("observation pump stopped for session {}", controller.session_id());
}
