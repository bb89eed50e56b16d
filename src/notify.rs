//! Background notification polling.
//!
//! [`NotificationPoller`] fetches the notification list on a fixed interval
//! and publishes the latest [`NotificationSnapshot`] on a `watch` channel.
//! A failed poll is logged and leaves the last snapshot in place.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use studio_common::Notification;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::errors::ApiError;
use crate::gateway::ApiClient;

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSnapshot {
    pub items: Vec<Notification>,
    pub unread: usize,
    pub fetched_at: DateTime<Utc>,
}

impl NotificationSnapshot {
    pub fn new(items: Vec<Notification>) -> Self {
        let unread = items.iter().filter(|n| !n.is_read).count();
        Self {
            items,
            unread,
            fetched_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait NotificationSource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Vec<Notification>, ApiError>;
}

#[async_trait]
impl NotificationSource for ApiClient {
    async fn fetch(&self) -> Result<Vec<Notification>, ApiError> {
        self.notifications().list().await
    }
}

#[async_trait]
impl<T: NotificationSource + ?Sized> NotificationSource for Arc<T> {
    async fn fetch(&self) -> Result<Vec<Notification>, ApiError> {
        (**self).fetch().await
    }
}

pub struct NotificationPoller {
    rx: watch::Receiver<Option<NotificationSnapshot>>,
    handle: JoinHandle<()>,
}

impl NotificationPoller {
    /// Start polling immediately, then every `interval`.
    pub fn spawn<S: NotificationSource>(source: S, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match source.fetch().await {
                    Ok(items) => {
                        let snapshot = NotificationSnapshot::new(items);
                        tracing::debug!(
                            total = snapshot.items.len(),
                            unread = snapshot.unread,
                            "notifications polled"
                        );
                        if tx.send(Some(snapshot)).is_err() {
                            return;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "notification poll failed"),
                }
            }
        });
        Self { rx, handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<NotificationSnapshot>> {
        self.rx.clone()
    }

    pub fn latest(&self) -> Option<NotificationSnapshot> {
        self.rx.borrow().clone()
    }

    pub fn unread(&self) -> usize {
        self.rx.borrow().as_ref().map_or(0, |s| s.unread)
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
