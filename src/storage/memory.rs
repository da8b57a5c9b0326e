// glaciertool/src/storage/memory.rs
//! In-memory `ObjectStore` used by the pipeline tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{ListPage, ObjectStore, RemoteObject, RestoreParams};
use crate::errors::StoreError;

#[derive(Default)]
pub struct MemoryStore {
    objects: Vec<RemoteObject>,
    page_size: usize,
    /// 1-based page number whose fetch fails.
    fail_on_page: Option<usize>,
    failing_keys: HashSet<String>,
    restore_delay: Duration,
    hang_restores: bool,
    panicking_keys: HashSet<String>,

    pub list_calls: AtomicUsize,
    pub restore_calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new(objects: Vec<RemoteObject>, page_size: usize) -> Self {
        Self {
            objects,
            page_size: page_size.max(1),
            ..Default::default()
        }
    }

    pub fn fail_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    pub fn fail_restore_for(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn with_restore_delay(mut self, delay: Duration) -> Self {
        self.restore_delay = delay;
        self
    }

    /// Restore requests are recorded but never answered.
    pub fn hang_restores(mut self) -> Self {
        self.hang_restores = true;
        self
    }

    pub fn panic_restore_for(mut self, key: &str) -> Self {
        self.panicking_keys.insert(key.to_string());
        self
    }

    pub fn total_calls(&self) -> usize {
        let restores = self.restore_calls.lock().map(|calls| calls.len()).unwrap_or(0);
        self.list_calls.load(Ordering::SeqCst) + restores
    }
}

/// Builds a listed object with the given key and storage class.
pub fn object(key: &str, storage_class: &str) -> RemoteObject {
    RemoteObject {
        key: Some(key.to_string()),
        owner: Some("owner".to_string()),
        storage_class: Some(storage_class.to_string()),
        last_modified: Some("2024-01-01 00:00:00 +0000 UTC".to_string()),
        size: Some(1024),
        restore_in_progress: None,
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let start = continuation_token
            .map_or(Ok(0), |token| token.parse::<usize>())
            .map_err(|_| StoreError::List {
                bucket: bucket.to_string(),
                message: "bad continuation token".to_string(),
            })?;
        let page_number = start / self.page_size + 1;
        if self.fail_on_page == Some(page_number) {
            return Err(StoreError::List {
                bucket: bucket.to_string(),
                message: format!("page {page_number} unavailable"),
            });
        }

        let matching: Vec<&RemoteObject> = self
            .objects
            .iter()
            .filter(|o| match (prefix, o.key.as_deref()) {
                (Some(prefix), Some(key)) => key.starts_with(prefix),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();
        let end = (start + self.page_size).min(matching.len());
        let objects = matching[start.min(end)..end].iter().map(|o| (*o).clone()).collect();
        let next_token = (end < matching.len()).then(|| end.to_string());

        Ok(ListPage { objects, next_token })
    }

    async fn restore_object(
        &self,
        _bucket: &str,
        key: &str,
        _params: RestoreParams,
    ) -> Result<(), StoreError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Ok(mut calls) = self.restore_calls.lock() {
            calls.push(key.to_string());
        }
        if self.panicking_keys.contains(key) {
            panic!("restore of {key} blew up");
        }
        if self.hang_restores {
            std::future::pending::<()>().await;
        }

        if !self.restore_delay.is_zero() {
            tokio::time::sleep(self.restore_delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_keys.contains(key) {
            return Err(StoreError::Restore {
                key: key.to_string(),
                message: "InvalidObjectState: object is not archived".to_string(),
            });
        }
        Ok(())
    }
}
