use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// Error codes the gateway reports in the `Code` field of a failed admin call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    AccessDenied,
    UserExists,
    InvalidAccessKey,
    InvalidSecretKey,
    InvalidKeyType,
    KeyExists,
    EmailExists,
    SubuserExists,
    InvalidAccess,
    InvalidArgument,
    IndexRepairFailed,
    BucketNotEmpty,
    ObjectRemovalFailed,
    BucketUnlinkFailed,
    BucketLinkFailed,
    NoSuchObject,
    IncompleteBody,
    InvalidCap,
    NoSuchCap,
    InternalError,
    NoSuchUser,
    NoSuchBucket,
    NoSuchKey,
    BucketAlreadyExists,
    /// A code this client does not know about, kept verbatim.
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::UserExists => "UserExists",
            Self::InvalidAccessKey => "InvalidAccessKey",
            Self::InvalidSecretKey => "InvalidSecretKey",
            Self::InvalidKeyType => "InvalidKeyType",
            Self::KeyExists => "KeyExists",
            Self::EmailExists => "EmailExists",
            Self::SubuserExists => "SubuserExists",
            Self::InvalidAccess => "InvalidAccess",
            Self::InvalidArgument => "InvalidArgument",
            Self::IndexRepairFailed => "IndexRepairFailed",
            Self::BucketNotEmpty => "BucketNotEmpty",
            Self::ObjectRemovalFailed => "ObjectRemovalFailed",
            Self::BucketUnlinkFailed => "BucketUnlinkFailed",
            Self::BucketLinkFailed => "BucketLinkFailed",
            Self::NoSuchObject => "NoSuchObject",
            Self::IncompleteBody => "IncompleteBody",
            Self::InvalidCap => "InvalidCap",
            Self::NoSuchCap => "NoSuchCap",
            Self::InternalError => "InternalError",
            Self::NoSuchUser => "NoSuchUser",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchKey => "NoSuchKey",
            Self::BucketAlreadyExists => "BucketAlreadyExists",
            Self::Other(code) => code,
        }
    }
}

impl FromStr for ErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "AccessDenied" => Self::AccessDenied,
            "UserExists" => Self::UserExists,
            "InvalidAccessKey" => Self::InvalidAccessKey,
            "InvalidSecretKey" => Self::InvalidSecretKey,
            "InvalidKeyType" => Self::InvalidKeyType,
            "KeyExists" => Self::KeyExists,
            "EmailExists" => Self::EmailExists,
            "SubuserExists" => Self::SubuserExists,
            "InvalidAccess" => Self::InvalidAccess,
            "InvalidArgument" => Self::InvalidArgument,
            "IndexRepairFailed" => Self::IndexRepairFailed,
            "BucketNotEmpty" => Self::BucketNotEmpty,
            "ObjectRemovalFailed" => Self::ObjectRemovalFailed,
            "BucketUnlinkFailed" => Self::BucketUnlinkFailed,
            "BucketLinkFailed" => Self::BucketLinkFailed,
            "NoSuchObject" => Self::NoSuchObject,
            "IncompleteBody" => Self::IncompleteBody,
            "InvalidCap" => Self::InvalidCap,
            "NoSuchCap" => Self::NoSuchCap,
            "InternalError" => Self::InternalError,
            "NoSuchUser" => Self::NoSuchUser,
            "NoSuchBucket" => Self::NoSuchBucket,
            "NoSuchKey" => Self::NoSuchKey,
            "BucketAlreadyExists" => Self::BucketAlreadyExists,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum RgwAdminError {
    #[error("RGW admin request failed with {code} (status {status})")]
    Api {
        status: u16,
        code: ErrorCode,
        body: Value,
    },

    #[error("RGW server returned status {status} without a readable response")]
    ServerDown { status: u16 },

    #[error("Invalid quota type '{0}', expected 'user' or 'bucket'")]
    InvalidQuotaType(String),

    #[error("Invalid metadata type '{0}', expected 'user', 'bucket' or 'bucket.instance'")]
    InvalidMetadataType(String),

    #[error("No RGW admin connection has been set")]
    NoConnection,

    #[error("RGW returned no data")]
    NoResponseData,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid date: {0}")]
    Date(#[from] chrono::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RgwAdminError {
    /// The gateway error code, when the failure came from the gateway.
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_code(&self, expected: &ErrorCode) -> bool {
        self.code() == Some(expected)
    }
}

pub type Result<T> = std::result::Result<T, RgwAdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_parse() {
        assert_eq!("NoSuchUser".parse::<ErrorCode>().unwrap(), ErrorCode::NoSuchUser);
        assert_eq!(
            "BucketAlreadyExists".parse::<ErrorCode>().unwrap(),
            ErrorCode::BucketAlreadyExists
        );
    }

    #[test]
    fn test_unknown_code_is_kept() {
        let code: ErrorCode = "QuotaExceeded".parse().unwrap();
        assert_eq!(code, ErrorCode::Other("QuotaExceeded".to_string()));
        assert_eq!(code.to_string(), "QuotaExceeded");
    }

    #[test]
    fn test_api_error_exposes_code() {
        let err = RgwAdminError::Api {
            status: 404,
            code: ErrorCode::NoSuchKey,
            body: serde_json::json!({"Code": "NoSuchKey"}),
        };
        assert!(err.is_code(&ErrorCode::NoSuchKey));
        assert!(err.to_string().contains("NoSuchKey"));
        assert!(RgwAdminError::NoConnection.code().is_none());
    }
}
