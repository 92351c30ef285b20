//! Async client for the Ceph RADOS Gateway admin operations API.
//!
//! ```no_run
//! use rgwadmin::{ConnectionConfig, RgwAdmin, UserLookup};
//!
//! # async fn run() -> rgwadmin::Result<()> {
//! let admin = RgwAdmin::new(ConnectionConfig::new("rgw.example.com", "ACCESS", "SECRET"))?;
//! let user = admin.get_user(UserLookup::Uid("alice".into()), true, false).await?;
//! println!("{user:?}");
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod util;

pub use admin::{
    CreateKey, CreateSubuser, CreateUser, MetadataType, ModifySubuser, ModifyUser, QuotaSpec,
    QuotaType, RemoveKey, RgwAdmin, TrimUsage, UsageQuery, UserLookup,
};
pub use config::{Config, ConnectionConfig, OutputFormat};
pub use error::{ErrorCode, Result, RgwAdminError};
pub use model::{BucketInfo, RgwUser};
