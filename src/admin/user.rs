use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde_json::Value;

use super::core::RgwAdmin;
use super::metadata::MetadataType;
use crate::error::{Result, RgwAdminError};

/// How to identify the user in [`RgwAdmin::get_user`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UserLookup {
    /// No selector; the gateway answers for the requesting user.
    #[default]
    Any,
    Uid(String),
    AccessKey(String),
}

/// Parameters of a user creation.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub uid: String,
    pub display_name: String,
    pub email: Option<String>,
    pub key_type: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub user_caps: Option<String>,
    pub generate_key: bool,
    pub max_buckets: Option<i64>,
    pub suspended: bool,
}

impl CreateUser {
    pub fn new(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            email: None,
            key_type: Some("s3".to_string()),
            access_key: None,
            secret_key: None,
            user_caps: None,
            generate_key: true,
            max_buckets: None,
            suspended: false,
        }
    }
}

/// Parameters of a user modification. Unset fields are left unchanged.
#[derive(Debug, Clone)]
pub struct ModifyUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub key_type: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub user_caps: Option<String>,
    pub generate_key: bool,
    pub max_buckets: Option<i64>,
    pub suspended: Option<bool>,
}

impl ModifyUser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            key_type: Some("s3".to_string()),
            access_key: None,
            secret_key: None,
            user_caps: None,
            generate_key: false,
            max_buckets: None,
            suspended: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaType {
    /// Limits the user as a whole
    User,
    /// Limits each bucket owned by the user
    Bucket,
}

impl QuotaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bucket => "bucket",
        }
    }
}

impl FromStr for QuotaType {
    type Err = RgwAdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "bucket" => Ok(Self::Bucket),
            other => Err(RgwAdminError::InvalidQuotaType(other.to_string())),
        }
    }
}

impl fmt::Display for QuotaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quota limits; `None` leaves the current value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaSpec {
    pub max_size_kb: Option<i64>,
    pub max_objects: Option<i64>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateSubuser {
    pub uid: String,
    pub subuser: Option<String>,
    pub secret_key: Option<String>,
    pub access_key: Option<String>,
    pub key_type: Option<String>,
    pub access: Option<String>,
    pub generate_secret: bool,
}

impl CreateSubuser {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModifySubuser {
    pub uid: String,
    pub subuser: String,
    pub secret: Option<String>,
    pub key_type: String,
    pub access: Option<String>,
    pub generate_secret: bool,
}

impl ModifySubuser {
    pub fn new(uid: impl Into<String>, subuser: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            subuser: subuser.into(),
            secret: None,
            key_type: "swift".to_string(),
            access: None,
            generate_secret: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateKey {
    pub uid: String,
    pub subuser: Option<String>,
    pub key_type: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub generate_key: bool,
}

impl CreateKey {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            subuser: None,
            key_type: "s3".to_string(),
            access_key: None,
            secret_key: None,
            generate_key: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RemoveKey {
    pub access_key: String,
    pub key_type: Option<String>,
    pub uid: Option<String>,
    pub subuser: Option<String>,
}

impl RemoveKey {
    pub fn new(access_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            ..Self::default()
        }
    }
}

impl RgwAdmin {
    pub async fn get_user(&self, lookup: UserLookup, stats: bool, sync: bool) -> Result<Option<Value>> {
        let mut query = self.query();
        match &lookup {
            UserLookup::Any => {}
            UserLookup::Uid(uid) => query = query.param("uid", uid),
            UserLookup::AccessKey(key) => query = query.param("access-key", key),
        }
        let query = query.param("stats", stats).param("sync", sync);
        self.request(Method::GET, &self.endpoint("user"), &query, None, None)
            .await
    }

    /// Lists all user ids.
    pub async fn get_users(&self) -> Result<Option<Value>> {
        self.get_metadata(MetadataType::User, None, None, None).await
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<Option<Value>> {
        let query = self
            .query()
            .param("uid", &user.uid)
            .param("display-name", &user.display_name)
            .opt("email", user.email.as_ref())
            .opt("key-type", user.key_type.as_ref())
            .opt("access-key", user.access_key.as_ref())
            .opt("secret-key", user.secret_key.as_ref())
            .opt("user-caps", user.user_caps.as_ref())
            .param("generate-key", user.generate_key)
            .opt("max-buckets", user.max_buckets)
            .param("suspended", user.suspended);
        self.request(Method::PUT, &self.endpoint("user"), &query, None, None)
            .await
    }

    pub async fn modify_user(&self, user: &ModifyUser) -> Result<Option<Value>> {
        let query = self
            .query()
            .param("uid", &user.uid)
            .opt("display-name", user.display_name.as_ref())
            .opt("email", user.email.as_ref())
            .opt("key-type", user.key_type.as_ref())
            .opt("access-key", user.access_key.as_ref())
            .opt("secret-key", user.secret_key.as_ref())
            .opt("user-caps", user.user_caps.as_ref())
            .param("generate-key", user.generate_key)
            .opt("max-buckets", user.max_buckets)
            .opt("suspended", user.suspended);
        self.request(Method::POST, &self.endpoint("user"), &query, None, None)
            .await
    }

    pub async fn remove_user(&self, uid: &str, purge_data: bool) -> Result<Option<Value>> {
        let query = self
            .query()
            .param("uid", uid)
            .param("purge-data", purge_data);
        self.request(Method::DELETE, &self.endpoint("user"), &query, None, None)
            .await
    }

    pub async fn get_quota(&self, uid: &str, quota_type: QuotaType) -> Result<Option<Value>> {
        let query = self
            .flag_query("quota")
            .param("uid", uid)
            .param("quota-type", quota_type);
        self.request(Method::GET, &self.endpoint("user"), &query, None, None)
            .await
    }

    pub async fn get_user_quota(&self, uid: &str) -> Result<Option<Value>> {
        self.get_quota(uid, QuotaType::User).await
    }

    /// Quota applied to every bucket owned by `uid`.
    pub async fn get_user_bucket_quota(&self, uid: &str) -> Result<Option<Value>> {
        self.get_quota(uid, QuotaType::Bucket).await
    }

    /// Sets the user quota, or the per-bucket quota for all buckets of the
    /// user. Use [`RgwAdmin::set_bucket_quota`] for a single bucket.
    pub async fn set_user_quota(
        &self,
        uid: &str,
        quota_type: QuotaType,
        quota: QuotaSpec,
    ) -> Result<Option<Value>> {
        let query = self
            .flag_query("quota")
            .param("uid", uid)
            .param("quota-type", quota_type)
            .opt("max-size-kb", quota.max_size_kb)
            .opt("max-objects", quota.max_objects)
            .opt("enabled", quota.enabled);
        self.request(Method::PUT, &self.endpoint("user"), &query, None, None)
            .await
    }

    /// Sets the quota of one bucket.
    pub async fn set_bucket_quota(
        &self,
        uid: &str,
        bucket: &str,
        quota: QuotaSpec,
    ) -> Result<Option<Value>> {
        let query = self
            .flag_query("quota")
            .param("uid", uid)
            .param("bucket", bucket)
            .opt("max-size-kb", quota.max_size_kb)
            .opt("max-objects", quota.max_objects)
            .opt("enabled", quota.enabled);
        self.request(Method::PUT, &self.endpoint("bucket"), &query, None, None)
            .await
    }

    pub async fn create_subuser(&self, subuser: &CreateSubuser) -> Result<Option<Value>> {
        let mut query = self
            .flag_query("subuser")
            .param("uid", &subuser.uid)
            .opt("subuser", subuser.subuser.as_ref());

        // the gateway only accepts explicit keys as a pair
        if let (Some(access_key), Some(secret_key)) = (&subuser.access_key, &subuser.secret_key) {
            query = query
                .param("access-key", access_key)
                .param("secret-key", secret_key);
        }

        let key_type = subuser
            .key_type
            .as_ref()
            .filter(|kt| matches!(kt.to_lowercase().as_str(), "s3" | "swift"));

        let query = query
            .opt("key-type", key_type)
            .opt("access", subuser.access.as_ref())
            .param("generate-secret", subuser.generate_secret);
        self.request(Method::PUT, &self.endpoint("user"), &query, None, None)
            .await
    }

    pub async fn modify_subuser(&self, subuser: &ModifySubuser) -> Result<Option<Value>> {
        let query = self
            .flag_query("subuser")
            .param("uid", &subuser.uid)
            .param("subuser", &subuser.subuser)
            .opt("secret", subuser.secret.as_ref())
            .param("key-type", &subuser.key_type)
            .opt("access", subuser.access.as_ref())
            .param("generate-secret", subuser.generate_secret);
        self.request(Method::POST, &self.endpoint("user"), &query, None, None)
            .await
    }

    pub async fn remove_subuser(
        &self,
        uid: &str,
        subuser: &str,
        purge_keys: bool,
    ) -> Result<Option<Value>> {
        let query = self
            .flag_query("subuser")
            .param("uid", uid)
            .param("subuser", subuser)
            .param("purge-keys", purge_keys);
        self.request(Method::DELETE, &self.endpoint("user"), &query, None, None)
            .await
    }

    pub async fn create_key(&self, key: &CreateKey) -> Result<Option<Value>> {
        let query = self
            .flag_query("key")
            .param("uid", &key.uid)
            .opt("subuser", key.subuser.as_ref())
            .param("key-type", &key.key_type)
            .opt("access-key", key.access_key.as_ref())
            .opt("secret-key", key.secret_key.as_ref())
            .param("generate-key", key.generate_key);
        self.request(Method::PUT, &self.endpoint("user"), &query, None, None)
            .await
    }

    pub async fn remove_key(&self, key: &RemoveKey) -> Result<Option<Value>> {
        let query = self
            .flag_query("key")
            .param("access-key", &key.access_key)
            .opt("key-type", key.key_type.as_ref())
            .opt("uid", key.uid.as_ref())
            .opt("subuser", key.subuser.as_ref());
        self.request(Method::DELETE, &self.endpoint("user"), &query, None, None)
            .await
    }

    /// Grants capabilities, e.g. `usage=read;buckets=*`.
    pub async fn add_capability(&self, uid: &str, user_caps: &str) -> Result<Option<Value>> {
        let query = self
            .flag_query("caps")
            .param("uid", uid)
            .param("user-caps", user_caps);
        self.request(Method::PUT, &self.endpoint("user"), &query, None, None)
            .await
    }

    pub async fn remove_capability(&self, uid: &str, user_caps: &str) -> Result<Option<Value>> {
        let query = self
            .flag_query("caps")
            .param("uid", uid)
            .param("user-caps", user_caps);
        self.request(Method::DELETE, &self.endpoint("user"), &query, None, None)
            .await
    }
}
