use std::fmt;
use std::str::FromStr;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;

use super::core::RgwAdmin;
use super::query::AdminQuery;
use crate::error::{Result, RgwAdminError};

/// Metadata sections exposed by the `/metadata` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataType {
    User,
    Bucket,
    BucketInstance,
}

impl MetadataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bucket => "bucket",
            Self::BucketInstance => "bucket.instance",
        }
    }
}

impl FromStr for MetadataType {
    type Err = RgwAdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "bucket" => Ok(Self::Bucket),
            "bucket.instance" => Ok(Self::BucketInstance),
            other => Err(RgwAdminError::InvalidMetadataType(other.to_string())),
        }
    }
}

impl fmt::Display for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RgwAdmin {
    async fn request_metadata(
        &self,
        method: Method,
        metadata_type: MetadataType,
        query: AdminQuery,
        headers: Option<HeaderMap>,
        body: Option<String>,
    ) -> Result<Option<Value>> {
        let path = self.endpoint(&format!("metadata/{metadata_type}"));
        self.request(method, &path, &query, headers, body).await
    }

    /// Lists the keys of a metadata section, or returns one entry when `key`
    /// is given.
    pub async fn get_metadata(
        &self,
        metadata_type: MetadataType,
        key: Option<&str>,
        max_entries: Option<u64>,
        marker: Option<&str>,
    ) -> Result<Option<Value>> {
        let query = self
            .query()
            .opt("key", key)
            .opt("marker", marker)
            .opt("max-entries", max_entries);
        self.request_metadata(Method::GET, metadata_type, query, None, None)
            .await
    }

    /// Writes a metadata entry; `json_string` is the document as returned by
    /// [`RgwAdmin::get_metadata`].
    pub async fn put_metadata(
        &self,
        metadata_type: MetadataType,
        key: &str,
        json_string: String,
    ) -> Result<Option<Value>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let query = AdminQuery::new().param("key", key);
        self.request_metadata(Method::PUT, metadata_type, query, Some(headers), Some(json_string))
            .await
    }

    /// Alias of [`RgwAdmin::put_metadata`].
    pub async fn set_metadata(
        &self,
        metadata_type: MetadataType,
        key: &str,
        json_string: String,
    ) -> Result<Option<Value>> {
        self.put_metadata(metadata_type, key, json_string).await
    }

    pub async fn delete_metadata(
        &self,
        metadata_type: MetadataType,
        key: &str,
    ) -> Result<Option<Value>> {
        let query = AdminQuery::new().param("key", key);
        self.request_metadata(Method::DELETE, metadata_type, query, None, None)
            .await
    }

    /// Takes a metadata lock on `key` for `length` seconds.
    pub async fn lock_metadata(
        &self,
        metadata_type: MetadataType,
        key: &str,
        lock_id: &str,
        length: u64,
    ) -> Result<Option<Value>> {
        let query = AdminQuery::new()
            .flag("lock")
            .param("key", key)
            .param("lock_id", lock_id)
            .param("length", length);
        self.request_metadata(Method::POST, metadata_type, query, None, None)
            .await
    }

    pub async fn unlock_metadata(
        &self,
        metadata_type: MetadataType,
        key: &str,
        lock_id: &str,
    ) -> Result<Option<Value>> {
        let query = AdminQuery::new()
            .flag("unlock")
            .param("key", key)
            .param("lock_id", lock_id);
        self.request_metadata(Method::POST, metadata_type, query, None, None)
            .await
    }
}
