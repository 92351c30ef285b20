mod bucket;
mod core;
mod metadata;
mod query;
mod response;
mod usage;
mod user;

pub use self::core::RgwAdmin;
pub use metadata::MetadataType;
pub use query::AdminQuery;
pub use response::decode_response;
pub use usage::{TrimUsage, UsageQuery};
pub use user::{
    CreateKey, CreateSubuser, CreateUser, ModifySubuser, ModifyUser, QuotaSpec, QuotaType,
    RemoveKey, UserLookup,
};
