//! "Typing" indicator shown while the session gate is held.

use std::{sync::Arc, time::Duration};

use {
    envoy_channels::ChannelOutbound,
    futures::future::join_all,
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, trace},
};

use crate::verification::VerificationRecord;

/// Interval between typing signals.
pub const ACTIVITY_INTERVAL: Duration = Duration::from_secs(5);

/// Spawns indicator loops.
#[derive(Clone)]
pub struct ActivityIndicator {
    outbound: Arc<dyn ChannelOutbound>,
    verification: Arc<VerificationRecord>,
    interval: Duration,
}

impl ActivityIndicator {
    pub fn new(outbound: Arc<dyn ChannelOutbound>, verification: Arc<VerificationRecord>) -> Self {
        Self {
            outbound,
            verification,
            interval: ACTIVITY_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Signal "typing" to the verified recipients among `recipients` every
    /// interval until the returned guard is stopped or dropped.
    ///
    /// The loop does not touch the session gate. Unverified recipients are
    /// skipped; each tick re-reads the verification record.
    #[must_use]
    pub fn spawn(&self, recipients: Vec<String>) -> ActivityGuard {
        let cancel = CancellationToken::new();
        let outbound = Arc::clone(&self.outbound);
        let verification = Arc::clone(&self.verification);
        let interval = self.interval;
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                let addresses = verification.addresses_of(&recipients);
                let sends = join_all(addresses.iter().map(|to| {
                    let outbound = Arc::clone(&outbound);
                    async move {
                        if let Err(e) = outbound.send_typing(to).await {
                            debug!(to, error = %e, "typing indicator failed");
                        }
                    }
                }));
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = sends => trace!(recipients = addresses.len(), "typing signalled"),
                }
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(interval) => {},
                }
            }
        });

        ActivityGuard {
            cancel,
            handle: Some(handle),
        }
    }
}

/// Owns a running indicator loop. Dropping it cancels the loop.
pub struct ActivityGuard {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ActivityGuard {
    /// Cancel the loop and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            debug!(error = %e, "activity indicator task ended abnormally");
        }
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        envoy_channels::FormatHint,
        std::sync::Mutex,
    };

    #[derive(Default)]
    struct RecordingOutbound {
        typing: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChannelOutbound for RecordingOutbound {
        async fn send_text(&self, _to: &str, _text: &str, _format: FormatHint) -> anyhow::Result<()> {
            Ok(())
        }

        async fn send_typing(&self, to: &str) -> anyhow::Result<()> {
            self.typing.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    fn setup() -> (Arc<RecordingOutbound>, ActivityIndicator) {
        let outbound = Arc::new(RecordingOutbound::default());
        let verification = Arc::new(VerificationRecord::new());
        verification.verify("alice", "100");
        let indicator = ActivityIndicator::new(outbound.clone(), verification)
            .with_interval(Duration::from_millis(20));
        (outbound, indicator)
    }

    #[tokio::test]
    async fn signals_verified_recipients_until_stopped() {
        let (outbound, indicator) = setup();
        let guard = indicator.spawn(vec!["alice".into(), "bob".into()]);
        tokio::time::sleep(Duration::from_millis(70)).await;
        guard.stop().await;

        let sent = outbound.typing.lock().unwrap().clone();
        assert!(sent.len() >= 2, "expected repeated signals, got {sent:?}");
        assert!(sent.iter().all(|to| to == "100"));

        let after = sent.len();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(outbound.typing.lock().unwrap().len(), after);
    }

    #[tokio::test]
    async fn drop_cancels_loop() {
        let (outbound, indicator) = setup();
        let guard = indicator.spawn(vec!["alice".into()]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(guard);
        tokio::time::sleep(Duration::from_millis(30)).await;
        let after = outbound.typing.lock().unwrap().len();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(outbound.typing.lock().unwrap().len(), after);
    }

    #[tokio::test]
    async fn stop_returns_within_one_interval() {
        let (_outbound, indicator) = setup();
        let indicator = indicator.with_interval(Duration::from_secs(60));
        let guard = indicator.spawn(vec!["alice".into()]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::time::timeout(Duration::from_secs(1), guard.stop())
            .await
            .unwrap();
    }
}
