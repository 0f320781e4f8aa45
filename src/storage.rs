//! Read side of the pipeline: raw feed dumps keyed by window and provider.

use async_trait::async_trait;

use crate::models::feed::Feed;

/// Byte-fetching capability handed to the loader. Implementations are opaque
/// blocking calls from the loader's point of view; retries belong to the
/// scheduler.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns `None` when no object exists under `key`.
    async fn fetch(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Key of one raw dump: `{start}-{end}-{provider}-{feed}.json`.
pub fn object_key(window_start: i64, window_end: i64, provider_name: &str, feed: Feed) -> String {
    format!("{window_start}-{window_end}-{provider_name}-{feed}.json")
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match resp {
            Ok(output) => Ok(Some(output.body.collect().await?.into_bytes().to_vec())),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(service_err.into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format() {
        assert_eq!(
            object_key(1_565_000_000, 1_565_086_400, "lemon", Feed::Trips),
            "1565000000-1565086400-lemon-trips.json"
        );
        assert_eq!(
            object_key(1_565_000_000, 1_565_086_400, "lemon", Feed::StatusChanges),
            "1565000000-1565086400-lemon-status_changes.json"
        );
    }
}
