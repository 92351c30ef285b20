use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, DATE};
use reqwest::{Certificate, Client, Method};
use serde_json::Value;
use url::Url;

use super::query::AdminQuery;
use super::response::decode_response;
use crate::auth::{http_date, Credentials};
use crate::config::ConnectionConfig;
use crate::error::{Result, RgwAdminError};

const USER_AGENT: &str = concat!("rgwadmin/", env!("CARGO_PKG_VERSION"));

static CONNECTION: RwLock<Option<Arc<RgwAdmin>>> = RwLock::new(None);

/// Connection to the admin operations API of a RADOS Gateway.
///
/// Every admin call is signed with the configured credentials. When
/// `pool_connections` is enabled one HTTP client is shared by all calls,
/// otherwise a fresh client is built for each request.
pub struct RgwAdmin {
    credentials: Credentials,
    server: String,
    admin: String,
    response: String,
    protocol: &'static str,
    verify: bool,
    ca_bundle: Option<PathBuf>,
    ca_certificates: Vec<Certificate>,
    timeout: Option<Duration>,
    session: RwLock<Option<Client>>,
}

impl RgwAdmin {
    /// Creates a connection from its settings.
    ///
    /// # Errors
    ///
    /// Returns an error if required settings are missing, the CA bundle
    /// cannot be read, or the pooled HTTP client cannot be built.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let ca_certificates = match &config.ca_bundle {
            Some(path) => load_ca_bundle(path)?,
            None => Vec::new(),
        };

        let mut admin = Self {
            credentials: Credentials::new(config.access_key, config.secret_key),
            server: config.server,
            admin: config.admin,
            response: config.response,
            protocol: if config.secure { "https" } else { "http" },
            verify: config.verify,
            ca_bundle: config.ca_bundle,
            ca_certificates,
            timeout: config.timeout.map(Duration::from_secs),
            session: RwLock::new(None),
        };

        if config.pool_connections {
            admin.session = RwLock::new(Some(admin.build_client()?));
        }

        Ok(admin)
    }

    /// Creates a connection and registers it as the process-wide connection.
    pub fn connect(config: ConnectionConfig) -> Result<Arc<Self>> {
        let admin = Arc::new(Self::new(config)?);
        Self::set_connection(Arc::clone(&admin));
        Ok(admin)
    }

    /// Replaces the process-wide connection.
    pub fn set_connection(connection: Arc<Self>) {
        info!("Using RGW admin connection {connection:?}");
        *CONNECTION.write().unwrap_or_else(PoisonError::into_inner) = Some(connection);
    }

    /// Returns the process-wide connection.
    ///
    /// # Errors
    ///
    /// Returns [`RgwAdminError::NoConnection`] if none has been set.
    pub fn get_connection() -> Result<Arc<Self>> {
        CONNECTION
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(RgwAdminError::NoConnection)
    }

    /// Drops the pooled HTTP client; later requests use one-off clients.
    ///
    /// Works through a shared handle, so the registered connection can be
    /// closed via [`RgwAdmin::get_connection`].
    pub fn close(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether requests currently share one pooled HTTP client.
    pub fn is_pooled(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.server)
    }

    pub fn access_key(&self) -> &str {
        self.credentials.access_key()
    }

    /// Response format sent as `format=` on every call.
    pub fn response_format(&self) -> &str {
        &self.response
    }

    /// Path of an admin resource, e.g. `/admin/user`.
    pub(crate) fn endpoint(&self, resource: &str) -> String {
        format!("/{}/{}", self.admin, resource)
    }

    pub(crate) fn query(&self) -> AdminQuery {
        AdminQuery::with_format(&self.response)
    }

    pub(crate) fn flag_query(&self, flag: &str) -> AdminQuery {
        AdminQuery::with_flag(flag, &self.response)
    }

    fn build_client(&self) -> Result<Client> {
        let mut builder = Client::builder().user_agent(USER_AGENT);

        if !self.ca_certificates.is_empty() {
            builder = builder.tls_built_in_root_certs(false);
            for certificate in &self.ca_certificates {
                builder = builder.add_root_certificate(certificate.clone());
            }
        } else if !self.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| RgwAdminError::Config(format!("Failed to create HTTP client: {e}")))
    }

    /// Sends a signed request to the gateway and decodes the response.
    ///
    /// `path` is the absolute request path (see [`RgwAdmin::endpoint`]).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &AdminQuery,
        headers: Option<HeaderMap>,
        body: Option<String>,
    ) -> Result<Option<Value>> {
        let mut url = Url::parse(&format!("{}{}", self.base_url(), path))
            .map_err(|e| RgwAdminError::Config(format!("Invalid request URL: {e}")))?;
        if !query.is_empty() {
            url.set_query(Some(&query.as_string()));
        }

        debug!("URL: {url}");
        debug!("Access Key: {}", self.credentials.access_key());
        debug!(
            "Verify: {}  CA Bundle: {:?}",
            self.verify,
            self.ca_bundle.as_deref()
        );

        let mut headers = headers.unwrap_or_default();
        headers.insert(DATE, header_value(&http_date(Utc::now()))?);
        if let Some(body) = &body {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        }
        let authorization = self.credentials.authorization(&method, &url, &headers)?;
        headers.insert(AUTHORIZATION, header_value(&authorization)?);

        let pooled = self
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let client = match pooled {
            Some(client) => client,
            None => self.build_client()?,
        };

        let mut request = client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let bytes = response.bytes().await?;

        decode_response(status, &response_headers, &bytes)
    }
}

/// Reads a PEM bundle; its certificates become the only trusted roots.
fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let pem = std::fs::read(path)?;
    let certificates = Certificate::from_pem_bundle(&pem).map_err(|e| {
        RgwAdminError::Config(format!("Invalid CA bundle {}: {e}", path.display()))
    })?;
    if certificates.is_empty() {
        return Err(RgwAdminError::Config(format!(
            "No certificates found in CA bundle {}",
            path.display()
        )));
    }
    Ok(certificates)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| RgwAdminError::Config(format!("Invalid header value: {e}")))
}

impl fmt::Debug for RgwAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RgwAdmin ({})", self.base_url())
    }
}

impl fmt::Display for RgwAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self:?}")?;
        writeln!(f, "Access Key: {}", self.credentials.access_key())?;
        writeln!(f, "Secret Key: ******")?;
        writeln!(f, "Response Method: {}", self.response)?;
        if let Some(ca_bundle) = &self.ca_bundle {
            writeln!(f, "CA Bundle: {}", ca_bundle.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::admin_for;
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_base_url_follows_secure_flag() {
        let secure = RgwAdmin::new(ConnectionConfig::new("rgw.local", "AK", "SK")).unwrap();
        assert_eq!(secure.base_url(), "https://rgw.local");

        let mut config = ConnectionConfig::new("rgw.local:8080", "AK", "SK");
        config.secure = false;
        let plain = RgwAdmin::new(config).unwrap();
        assert_eq!(plain.base_url(), "http://rgw.local:8080");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let result = RgwAdmin::new(ConnectionConfig::new("rgw.local", "", ""));
        assert!(matches!(result, Err(RgwAdminError::Config(_))));
    }

    #[test]
    fn test_missing_ca_bundle_is_io_error() {
        let mut config = ConnectionConfig::new("rgw.local", "AK", "SK");
        config.ca_bundle = Some(PathBuf::from("/nonexistent/ca.pem"));
        assert!(matches!(RgwAdmin::new(config), Err(RgwAdminError::Io(_))));
    }

    #[test]
    fn test_unparsable_ca_bundle_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ca.pem");
        std::fs::write(&path, "this is not a certificate").unwrap();

        let mut config = ConnectionConfig::new("rgw.local", "AK", "SK");
        config.ca_bundle = Some(path);
        config.pool_connections = true;
        let err = RgwAdmin::new(config).unwrap_err();
        assert!(matches!(err, RgwAdminError::Config(msg) if msg.contains("No certificates")));
    }

    #[test]
    fn test_unverified_pooled_client_builds() {
        let mut config = ConnectionConfig::new("rgw.local", "AK", "SK");
        config.verify = false;
        config.timeout = Some(5);
        config.pool_connections = true;
        let admin = RgwAdmin::new(config).unwrap();
        assert!(admin.is_pooled());
    }

    #[test]
    fn test_display_masks_secret() {
        let admin = RgwAdmin::new(ConnectionConfig::new("rgw.local", "AKIA", "hidden")).unwrap();
        let shown = admin.to_string();
        assert!(shown.starts_with("RgwAdmin (https://rgw.local)"));
        assert!(shown.contains("Access Key: AKIA"));
        assert!(shown.contains("Secret Key: ******"));
        assert!(shown.contains("Response Method: json"));
        assert!(!shown.contains("hidden"));
        assert!(!shown.contains("CA Bundle"));
        assert_eq!(format!("{admin:?}"), "RgwAdmin (https://rgw.local)");
    }

    #[test]
    fn test_endpoint_uses_admin_prefix() {
        let mut config = ConnectionConfig::new("rgw.local", "AK", "SK");
        config.admin = "rgw-admin".to_string();
        let admin = RgwAdmin::new(config).unwrap();
        assert_eq!(admin.endpoint("user"), "/rgw-admin/user");
    }

    #[test]
    fn test_connection_registry() {
        let first = RgwAdmin::connect(ConnectionConfig::new("first.local", "AK", "SK")).unwrap();
        assert_eq!(RgwAdmin::get_connection().unwrap().base_url(), first.base_url());

        let second = Arc::new(RgwAdmin::new(ConnectionConfig::new("second.local", "AK", "SK")).unwrap());
        RgwAdmin::set_connection(second);
        assert_eq!(
            RgwAdmin::get_connection().unwrap().base_url(),
            "https://second.local"
        );
    }

    #[tokio::test]
    async fn test_request_is_signed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/user")
            .match_query(Matcher::Regex("^format=json&uid=alice$".into()))
            .match_header("authorization", Matcher::Regex("^AWS AKIA:.{28}$".into()))
            .match_header("date", Matcher::Regex("GMT$".into()))
            .with_status(200)
            .with_body(r#"{"user_id": "alice"}"#)
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        let query = admin.query().param("uid", "alice");
        let value = admin
            .request(Method::GET, &admin.endpoint("user"), &query, None, None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(value.unwrap()["user_id"], "alice");
    }

    #[tokio::test]
    async fn test_pooled_client_reused() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/admin/usage")
            .match_query(Matcher::Any)
            .with_status(204)
            .expect(2)
            .create_async()
            .await;

        let admin = admin_for(&server, true);
        for _ in 0..2 {
            let value = admin
                .request(Method::DELETE, "/admin/usage", &admin.query(), None, None)
                .await
                .unwrap();
            assert!(value.is_none());
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_closed_connection_still_works() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/bucket")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let admin = admin_for(&server, true);
        assert!(admin.is_pooled());
        admin.close();
        assert!(!admin.is_pooled());
        let value = admin
            .request(Method::GET, "/admin/bucket", &admin.query(), None, None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(value, Some(serde_json::json!([])));
    }

    #[test]
    fn test_shared_connection_can_be_closed() {
        let mut config = ConnectionConfig::new("closing.local", "AK", "SK");
        config.pool_connections = true;
        let admin = Arc::new(RgwAdmin::new(config).unwrap());
        let shared = Arc::clone(&admin);

        shared.close();
        assert!(!admin.is_pooled());
    }

    #[tokio::test]
    async fn test_request_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let mut config = ConnectionConfig::new(addr.to_string(), "AK", "SK");
        config.secure = false;
        config.timeout = Some(1);
        let admin = RgwAdmin::new(config).unwrap();

        let err = admin
            .request(Method::GET, "/admin/user", &admin.query(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RgwAdminError::Network(e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_body_sets_content_length() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/admin/metadata/user")
            .match_query(Matcher::Any)
            .match_header("content-length", "7")
            .match_body("{\"a\":1}")
            .with_status(200)
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        admin
            .request(
                Method::PUT,
                "/admin/metadata/user",
                &admin.query(),
                None,
                Some("{\"a\":1}".to_string()),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
