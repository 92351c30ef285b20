use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

use crate::admin::{CreateUser, ModifyUser, QuotaSpec, QuotaType, RgwAdmin, UserLookup};
use crate::error::{ErrorCode, Result, RgwAdminError};

/// S3 access key pair of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Key {
    pub user: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwiftKey {
    pub user: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subuser {
    pub id: String,
    #[serde(default)]
    pub permissions: String,
}

/// One capability grant, e.g. `usage=read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cap {
    #[serde(rename = "type")]
    pub cap_type: String,
    pub perm: String,
}

/// Quota as reported by the gateway. `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub check_on_raw: bool,
    #[serde(default = "unlimited")]
    pub max_size: i64,
    #[serde(default = "unlimited")]
    pub max_size_kb: i64,
    #[serde(default = "unlimited")]
    pub max_objects: i64,
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            enabled: false,
            check_on_raw: false,
            max_size: -1,
            max_size_kb: -1,
            max_objects: -1,
        }
    }
}

impl Quota {
    /// The settings to push back. An unlimited size is reported as
    /// `max_size: -1` with `max_size_kb: 0`, so the sign of `max_size` wins.
    fn spec(&self) -> QuotaSpec {
        let max_size_kb = if self.max_size < 0 { -1 } else { self.max_size_kb };
        QuotaSpec {
            max_size_kb: Some(max_size_kb),
            max_objects: Some(self.max_objects),
            enabled: Some(self.enabled),
        }
    }
}

fn unlimited() -> i64 {
    -1
}

/// A gateway user as returned by the user info call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgwUser {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "flag")]
    pub suspended: bool,
    #[serde(default)]
    pub max_buckets: Option<i64>,
    #[serde(default)]
    pub subusers: Vec<Subuser>,
    #[serde(default)]
    pub keys: Vec<S3Key>,
    #[serde(default)]
    pub swift_keys: Vec<SwiftKey>,
    #[serde(default)]
    pub caps: Vec<Cap>,
    #[serde(default)]
    pub op_mask: Option<String>,
    #[serde(default)]
    pub default_placement: Option<String>,
    #[serde(default)]
    pub placement_tags: Vec<String>,
    #[serde(default)]
    pub bucket_quota: Quota,
    #[serde(default)]
    pub user_quota: Quota,
    #[serde(default)]
    pub temp_url_keys: Vec<serde_json::Value>,
    #[serde(default, rename = "type")]
    pub user_type: Option<String>,
}

/// The gateway reports `suspended` as 0/1.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

impl RgwUser {
    /// Creates the user on the gateway and returns it as stored.
    pub async fn create(admin: &RgwAdmin, user_id: &str, display_name: &str) -> Result<Self> {
        let created = admin
            .create_user(&CreateUser::new(user_id, display_name))
            .await?
            .ok_or(RgwAdminError::NoResponseData)?;
        Ok(serde_json::from_value(created)?)
    }

    pub async fn fetch(admin: &RgwAdmin, user_id: &str) -> Result<Self> {
        let user = admin
            .get_user(UserLookup::Uid(user_id.to_string()), false, false)
            .await?
            .ok_or(RgwAdminError::NoResponseData)?;
        Ok(serde_json::from_value(user)?)
    }

    pub async fn exists(&self, admin: &RgwAdmin) -> Result<bool> {
        match admin
            .get_user(UserLookup::Uid(self.user_id.clone()), false, false)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_code(&ErrorCode::NoSuchUser) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Writes the local state back, creating the user if it is missing.
    ///
    /// Quotas and capabilities are pushed after the user itself.
    pub async fn save(&self, admin: &RgwAdmin) -> Result<()> {
        if self.exists(admin).await? {
            debug!("Updating user {}", self.user_id);
            let modify = ModifyUser {
                display_name: Some(self.display_name.clone()),
                email: self.non_empty_email(),
                max_buckets: self.max_buckets,
                suspended: Some(self.suspended),
                ..ModifyUser::new(&self.user_id)
            };
            admin.modify_user(&modify).await?;
        } else {
            debug!("Creating user {}", self.user_id);
            let create = CreateUser {
                email: self.non_empty_email(),
                max_buckets: self.max_buckets,
                suspended: self.suspended,
                ..CreateUser::new(&self.user_id, &self.display_name)
            };
            admin.create_user(&create).await?;
        }

        admin
            .set_user_quota(&self.user_id, QuotaType::User, self.user_quota.spec())
            .await?;
        admin
            .set_user_quota(&self.user_id, QuotaType::Bucket, self.bucket_quota.spec())
            .await?;

        if let Some(caps) = self.caps_string() {
            admin.add_capability(&self.user_id, &caps).await?;
        }

        Ok(())
    }

    /// Removes the user and all of its data.
    pub async fn delete(&self, admin: &RgwAdmin) -> Result<()> {
        admin.remove_user(&self.user_id, true).await?;
        Ok(())
    }

    /// Capabilities in the `type=perm;type=perm` form the gateway accepts.
    pub fn caps_string(&self) -> Option<String> {
        if self.caps.is_empty() {
            return None;
        }
        Some(
            self.caps
                .iter()
                .map(|cap| format!("{}={}", cap.cap_type, cap.perm))
                .collect::<Vec<_>>()
                .join(";"),
        )
    }

    fn non_empty_email(&self) -> Option<String> {
        (!self.email.is_empty()).then(|| self.email.clone())
    }
}

/// Per-category usage of a bucket, e.g. the `rgw.main` entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketUsage {
    #[serde(default)]
    pub size_kb: u64,
    #[serde(default)]
    pub size_kb_actual: u64,
    #[serde(default)]
    pub num_objects: u64,
}

/// Bucket information as returned by the bucket stats call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub bucket: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub usage: BTreeMap<String, BucketUsage>,
    #[serde(default)]
    pub bucket_quota: Quota,
}

impl BucketInfo {
    pub async fn fetch(admin: &RgwAdmin, bucket: &str) -> Result<Self> {
        let info = admin
            .get_bucket(Some(bucket), None, true)
            .await?
            .ok_or(RgwAdminError::NoResponseData)?;
        Ok(serde_json::from_value(info)?)
    }

    /// Usage summed over all categories.
    pub fn total_usage(&self) -> BucketUsage {
        self.usage.values().fold(BucketUsage::default(), |acc, u| BucketUsage {
            size_kb: acc.size_kb + u.size_kb,
            size_kb_actual: acc.size_kb_actual + u.size_kb_actual,
            num_objects: acc.num_objects + u.num_objects,
        })
    }

    /// Share of the size quota in use, when a size quota is enforced.
    #[allow(clippy::cast_precision_loss)]
    pub fn quota_used_percent(&self) -> Option<f64> {
        let quota = &self.bucket_quota;
        if !quota.enabled || quota.max_size_kb <= 0 {
            return None;
        }
        Some(self.total_usage().size_kb as f64 * 100.0 / quota.max_size_kb as f64)
    }
}
