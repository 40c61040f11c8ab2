use async_trait::async_trait;
use parking_lot::Mutex;
use stackconf_rs_protocol::{ConfigBag, ConfigSource, SiteTag, SourceError, StackConfigItem};
use std::sync::Arc;
use tokio::sync::{Notify, oneshot};

/// Test-side controls for a `GatedConfigSource`.
pub struct GateHandle {
    /// Notified once the first `config_bags` call is parked.
    pub entered: Arc<Notify>,
    release: Option<oneshot::Sender<Result<(), SourceError>>>,
}

impl GateHandle {
    /// Let the parked call continue normally.
    pub fn release(&mut self) {
        if let Some(tx) = self.release.take() {
            let _ = tx.send(Ok(()));
        }
    }

    /// Let the parked call fail with a transport error.
    pub fn fail(&mut self, message: impl Into<String>) {
        if let Some(tx) = self.release.take() {
            let _ = tx.send(Err(SourceError::Transport(message.into())));
        }
    }
}

/// Wraps a source and parks its first `config_bags` call until released.
pub struct GatedConfigSource<S> {
    inner: S,
    entered: Arc<Notify>,
    gate: Mutex<Option<oneshot::Receiver<Result<(), SourceError>>>>,
}

impl<S: ConfigSource> GatedConfigSource<S> {
    pub fn new(inner: S) -> (Self, GateHandle) {
        let entered = Arc::new(Notify::new());
        let (tx, rx) = oneshot::channel();
        let source = Self {
            inner,
            entered: entered.clone(),
            gate: Mutex::new(Some(rx)),
        };
        let handle = GateHandle {
            entered,
            release: Some(tx),
        };
        (source, handle)
    }
}

#[async_trait]
impl<S: ConfigSource> ConfigSource for GatedConfigSource<S> {
    async fn advanced_configs(
        &self,
        service_name: &str,
    ) -> Result<Vec<StackConfigItem>, SourceError> {
        self.inner.advanced_configs(service_name).await
    }

    async fn config_bags(&self, tags: &[SiteTag]) -> Result<Vec<ConfigBag>, SourceError> {
        let gate = self.gate.lock().take();
        if let Some(rx) = gate {
            self.entered.notify_one();
            match rx.await {
                Ok(Err(err)) => return Err(err),
                Ok(Ok(())) => {}
                Err(_) => return Err(SourceError::Transport("gate dropped".to_string())),
            }
        }
        self.inner.config_bags(tags).await
    }
}
