use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counts the requests currently being processed.
#[derive(Debug, Default)]
pub(crate) struct ActiveRequests {
    count: AtomicUsize,
    idle: Notify,
}

/// Keeps a request counted until dropped.
#[derive(Debug)]
pub(crate) struct ActiveGuard {
    active: Arc<ActiveRequests>,
}

impl ActiveRequests {
    pub(crate) fn new() -> ActiveRequests {
        ActiveRequests::default()
    }

    pub(crate) fn enter(self: &Arc<Self>) -> ActiveGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        ActiveGuard { active: self.clone() }
    }

    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Resolves once no request is in flight.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking, so a guard dropped in between can't be missed.
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        if self.active.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.active.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn should_resolve_immediately_when_idle() {
        ActiveRequests::new().wait_idle().await;
    }

    #[tokio::test]
    async fn should_wait_for_every_guard() {
        let active = Arc::new(ActiveRequests::new());
        let first = active.enter();
        let second = active.enter();
        assert_eq!(active.count(), 2);

        let waiter = {
            let active = active.clone();
            tokio::spawn(async move { active.wait_idle().await })
        };

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(second);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_idle did not resolve")
            .unwrap();
        assert_eq!(active.count(), 0);
    }
}
