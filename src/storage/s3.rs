// glaciertool/src/storage/s3.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::error::DisplayErrorContext;
use s3::primitives::DateTime;
use s3::types::{GlacierJobParameters, Object, OptionalObjectAttributes, RestoreRequest, Tier};
use tracing::debug;

use super::{ListPage, ObjectStore, RemoteObject, RestoreParams};
use crate::config::StorageSettings;
use crate::errors::StoreError;

/// `ObjectStore` backed by the AWS S3 API (or any S3-compatible endpoint).
#[derive(Clone)]
pub struct S3Store {
    client: s3::Client,
}

impl S3Store {
    /// Builds a client from static credentials. No request is sent here;
    /// bad credentials surface on the first listing call.
    pub async fn connect(settings: &StorageSettings) -> Self {
        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(s3::config::Credentials::new(
                &settings.access_key,
                &settings.secret_key,
                None, // session_token
                None, // expiry
                "Static", // provider_name
            ));
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        // Custom endpoints (MinIO, Spaces, ...) generally expect path-style addressing.
        let s3_config = s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.endpoint_url.is_some())
            .build();

        debug!(region = %settings.region, endpoint = ?settings.endpoint_url, "S3 client configured");
        Self {
            client: s3::Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .fetch_owner(true)
            .optional_object_attributes(OptionalObjectAttributes::RestoreStatus);
        if let Some(prefix) = prefix {
            request = request.prefix(prefix);
        }
        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        let output = request.send().await.map_err(|e| StoreError::List {
            bucket: bucket.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

        let objects = output.contents().iter().map(convert_object).collect();
        let next_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage { objects, next_token })
    }

    async fn restore_object(
        &self,
        bucket: &str,
        key: &str,
        params: RestoreParams,
    ) -> Result<(), StoreError> {
        let mut restore = RestoreRequest::builder().days(params.days);
        if let Some(tier) = params.tier {
            let job = GlacierJobParameters::builder()
                .tier(Tier::from(tier.as_str()))
                .build()
                .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;
            restore = restore.glacier_job_parameters(job);
        }

        self.client
            .restore_object()
            .bucket(bucket)
            .key(key)
            .restore_request(restore.build())
            .send()
            .await
            .map_err(|e| StoreError::Restore {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}

/// Maps an SDK listing entry onto the neutral record.
fn convert_object(object: &Object) -> RemoteObject {
    RemoteObject {
        key: object.key().map(str::to_string),
        owner: object
            .owner()
            .and_then(|owner| owner.display_name())
            .map(str::to_string),
        storage_class: object.storage_class().map(|class| class.as_str().to_string()),
        last_modified: object.last_modified().and_then(format_timestamp),
        size: object.size(),
        restore_in_progress: object
            .restore_status()
            .and_then(|status| status.is_restore_in_progress()),
    }
}

/// `2006-01-02 15:04:05 +0000 UTC`, the layout existing report consumers parse.
fn format_timestamp(timestamp: &DateTime) -> Option<String> {
    chrono::DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
        .map(|utc| utc.format("%Y-%m-%d %H:%M:%S %z UTC").to_string())
}
