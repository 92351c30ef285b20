use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, CONTENT_TYPE, DATE};
use reqwest::Method;
use sha1::Sha1;
use url::Url;

use crate::error::{Result, RgwAdminError};

type HmacSha1 = Hmac<Sha1>;

/// Query parameters that are part of the signed resource in S3 V2 signing.
const SUB_RESOURCES: &[&str] = &[
    "acl",
    "cors",
    "delete",
    "lifecycle",
    "location",
    "logging",
    "notification",
    "partNumber",
    "policy",
    "requestPayment",
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
    "tagging",
    "torrent",
    "uploadId",
    "uploads",
    "versionId",
    "versioning",
    "versions",
    "website",
];

/// Access/secret key pair used to sign admin requests.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Builds the AWS V2 string-to-sign for a request.
    ///
    /// The `Date` header must already be present in `headers` unless an
    /// `x-amz-date` header is used instead.
    pub fn string_to_sign(method: &Method, url: &Url, headers: &HeaderMap) -> String {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        };

        let mut amz_headers: Vec<(String, String)> = headers
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("x-amz-"))
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or("").trim().to_string(),
                )
            })
            .collect();
        amz_headers.sort();

        let date = if headers.contains_key("x-amz-date") {
            String::new()
        } else {
            header(DATE.as_str())
        };

        let mut out = format!(
            "{}\n{}\n{}\n{}\n",
            method.as_str().to_uppercase(),
            header("content-md5"),
            header(CONTENT_TYPE.as_str()),
            date
        );

        for (name, value) in amz_headers {
            out.push_str(&format!("{name}:{value}\n"));
        }

        out.push_str(&canonical_resource(url));
        out
    }

    /// Base64 HMAC-SHA1 of `string_to_sign` keyed by the secret key.
    pub fn signature(&self, string_to_sign: &str) -> Result<String> {
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| RgwAdminError::Config(format!("Invalid secret key: {e}")))?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Value for the `Authorization` header of a request.
    pub fn authorization(&self, method: &Method, url: &Url, headers: &HeaderMap) -> Result<String> {
        let signature = self.signature(&Self::string_to_sign(method, url, headers))?;
        Ok(format!("AWS {}:{}", self.access_key, signature))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"******")
            .finish()
    }
}

/// Formats a timestamp the way the `Date` header expects (RFC 1123, GMT).
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn canonical_resource(url: &Url) -> String {
    let mut resource = url.path().to_string();

    let mut sub_resources: Vec<&str> = url
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| {
            let name = pair.split('=').next().unwrap_or("");
            SUB_RESOURCES.contains(&name)
        })
        .collect();
    sub_resources.sort_unstable();

    if !sub_resources.is_empty() {
        resource.push('?');
        resource.push_str(&sub_resources.join("&"));
    }

    resource
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;

    fn date_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            DATE,
            HeaderValue::from_static("Tue, 27 Mar 2007 19:36:42 GMT"),
        );
        headers
    }

    #[test]
    fn test_http_date_format() {
        let ts = Utc.with_ymd_and_hms(2007, 3, 27, 19, 36, 42).unwrap();
        assert_eq!(http_date(ts), "Tue, 27 Mar 2007 19:36:42 GMT");
    }

    #[test]
    fn test_string_to_sign_ignores_admin_query() {
        let url = Url::parse("https://rgw.example.com/admin/user?quota&format=json&uid=alice")
            .unwrap();
        let sts = Credentials::string_to_sign(&Method::GET, &url, &date_headers());
        assert_eq!(sts, "GET\n\n\nTue, 27 Mar 2007 19:36:42 GMT\n/admin/user");
    }

    #[test]
    fn test_string_to_sign_keeps_sub_resources_sorted() {
        let url =
            Url::parse("https://rgw.example.com/admin/bucket?policy&format=json&acl").unwrap();
        let sts = Credentials::string_to_sign(&Method::GET, &url, &date_headers());
        assert!(sts.ends_with("/admin/bucket?acl&policy"));
    }

    #[test]
    fn test_string_to_sign_with_content_type_and_amz_headers() {
        let url = Url::parse("https://rgw.example.com/admin/metadata/bucket?key=b1").unwrap();
        let mut headers = date_headers();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-amz-meta-b", HeaderValue::from_static(" two "));
        headers.insert("x-amz-meta-a", HeaderValue::from_static("one"));

        let sts = Credentials::string_to_sign(&Method::PUT, &url, &headers);
        assert_eq!(
            sts,
            "PUT\n\napplication/json\nTue, 27 Mar 2007 19:36:42 GMT\n\
             x-amz-meta-a:one\nx-amz-meta-b:two\n/admin/metadata/bucket"
        );
    }

    #[test]
    fn test_amz_date_blanks_date_line() {
        let url = Url::parse("https://rgw.example.com/admin/usage").unwrap();
        let mut headers = date_headers();
        headers.insert("x-amz-date", HeaderValue::from_static("20070327T193642Z"));

        let sts = Credentials::string_to_sign(&Method::DELETE, &url, &headers);
        assert_eq!(sts, "DELETE\n\n\n\nx-amz-date:20070327T193642Z\n/admin/usage");
    }

    #[test]
    fn test_signature_is_deterministic_and_keyed() {
        let creds = Credentials::new("AKIA", "secret-one");
        let other = Credentials::new("AKIA", "secret-two");

        let a = creds.signature("GET\n\n\ndate\n/admin/user").unwrap();
        let b = creds.signature("GET\n\n\ndate\n/admin/user").unwrap();
        let c = other.signature("GET\n\n\ndate\n/admin/user").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        // 20-byte SHA1 digest in base64
        assert_eq!(a.len(), 28);
    }

    #[test]
    fn test_authorization_header_shape() {
        let creds = Credentials::new("AKIA", "secret");
        let url = Url::parse("http://rgw.local/admin/user").unwrap();
        let value = creds
            .authorization(&Method::GET, &url, &date_headers())
            .unwrap();
        assert!(value.starts_with("AWS AKIA:"));
    }

    #[test]
    fn test_debug_masks_secret() {
        let creds = Credentials::new("AKIA", "very-secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKIA"));
        assert!(!debug.contains("very-secret"));
    }
}
