// glaciertool/src/storage/mod.rs
pub(crate) mod s3;
#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;

use crate::errors::StoreError;

/// Provider-neutral snapshot of one listed object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: Option<String>,
    pub owner: Option<String>,
    pub storage_class: Option<String>,
    pub last_modified: Option<String>,
    pub size: Option<i64>,
    pub restore_in_progress: Option<bool>,
}

/// One page of a bucket listing. `next_token` is `None` on the last page.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<RemoteObject>,
    pub next_token: Option<String>,
}

/// Retrieval tier for a restore request. Accepted on the command line under
/// the provider's own spelling (`Bulk`) as well as in lower case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum RestoreTier {
    Standard,
    Bulk,
    Expedited,
}

impl RestoreTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreTier::Standard => "Standard",
            RestoreTier::Bulk => "Bulk",
            RestoreTier::Expedited => "Expedited",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreParams {
    pub days: i32,
    pub tier: Option<RestoreTier>,
}

impl Default for RestoreParams {
    fn default() -> Self {
        Self {
            days: crate::config::DEFAULT_RESTORE_DAYS,
            tier: None,
        }
    }
}

/// The remote object API both pipelines drive. Implementations must be safe
/// to call from many tasks at once.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetches the page following `continuation_token` (the first page when `None`).
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ListPage, StoreError>;

    async fn restore_object(
        &self,
        bucket: &str,
        key: &str,
        params: RestoreParams,
    ) -> Result<(), StoreError>;
}
