//! Shutdown coordination for the server.

use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// A resource that must be torn down before the process exits.
pub trait Release: Send + Sync {
    /// Name used in shutdown logs.
    fn name(&self) -> &str;

    /// Tear the resource down.
    fn release(&self) -> BoxFuture<'_, Result<(), ReleaseError>>;
}

/// Failure while releasing a resource.
#[derive(Debug, Error)]
#[error("failed to release {resource}: {source}")]
pub struct ReleaseError {
    pub resource: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl ReleaseError {
    pub fn new(
        resource: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            resource: resource.into(),
            source: source.into(),
        }
    }
}

/// Outcome of [`ShutdownCoordinator::release_all`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Names of resources released successfully, in release order.
    pub released: Vec<String>,
    /// Names of resources whose release failed.
    pub failed: Vec<String>,
}

impl ReleaseReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registry of resources torn down on shutdown.
///
/// Resources are released in reverse registration order, each exactly once.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    resources: Arc<Mutex<Vec<Arc<dyn Release>>>>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to be released on shutdown.
    pub fn register(&self, resource: Arc<dyn Release>) {
        tracing::debug!(resource = resource.name(), "Registered for shutdown");
        self.lock().push(resource);
    }

    /// Number of resources not yet released.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Release every registered resource.
    ///
    /// A failing release is logged and does not stop the others. Calling this
    /// again only releases resources registered since the previous call.
    pub async fn release_all(&self) -> ReleaseReport {
        let resources: Vec<Arc<dyn Release>> = std::mem::take(&mut *self.lock());
        let mut report = ReleaseReport::default();

        for resource in resources.iter().rev() {
            match resource.release().await {
                Ok(()) => {
                    tracing::info!(resource = resource.name(), "Released");
                    report.released.push(resource.name().to_string());
                }
                Err(e) => {
                    tracing::error!(resource = resource.name(), error = %e, "Release failed");
                    report.failed.push(resource.name().to_string());
                }
            }
        }

        report
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn Release>>> {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                log: log.clone(),
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    impl Release for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn release(&self) -> BoxFuture<'_, Result<(), ReleaseError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.log.lock().unwrap().push(self.name);
                if self.fail {
                    Err(ReleaseError::new(self.name, "boom"))
                } else {
                    Ok(())
                }
            })
        }
    }

    #[tokio::test]
    async fn releases_in_reverse_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let coordinator = ShutdownCoordinator::new();
        coordinator.register(Recorder::new("database", &log, false));
        coordinator.register(Recorder::new("metrics", &log, false));

        let report = coordinator.release_all().await;

        assert_eq!(*log.lock().unwrap(), vec!["metrics", "database"]);
        assert_eq!(report.released, vec!["metrics", "database"]);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn each_resource_is_released_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let db = Recorder::new("database", &log, false);
        let coordinator = ShutdownCoordinator::new();
        coordinator.register(db.clone());

        coordinator.release_all().await;
        let second = coordinator.release_all().await;

        assert_eq!(db.calls.load(Ordering::SeqCst), 1);
        assert!(second.released.is_empty());
        assert_eq!(coordinator.pending(), 0);
    }

    #[tokio::test]
    async fn failure_does_not_stop_remaining_releases() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let coordinator = ShutdownCoordinator::new();
        coordinator.register(Recorder::new("database", &log, false));
        coordinator.register(Recorder::new("cache", &log, true));

        let report = coordinator.release_all().await;

        assert_eq!(report.failed, vec!["cache"]);
        assert_eq!(report.released, vec!["database"]);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 1);
        shutdown.trigger();
        assert!(rx.recv().await.is_ok());
    }
}
