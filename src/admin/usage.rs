use reqwest::Method;
use serde_json::Value;

use super::core::RgwAdmin;
use crate::error::Result;

/// Filters for a usage report. Dates are passed through as the gateway
/// expects them, e.g. `2024-01-01` or `2024-01-01 12:00:00`.
#[derive(Debug, Clone, Default)]
pub struct UsageQuery {
    pub uid: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub show_entries: bool,
    pub show_summary: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TrimUsage {
    pub uid: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub remove_all: bool,
}

impl RgwAdmin {
    pub async fn get_usage(&self, usage: &UsageQuery) -> Result<Option<Value>> {
        let query = self
            .query()
            .opt("uid", usage.uid.as_ref())
            .opt("start", usage.start.as_ref())
            .opt("end", usage.end.as_ref())
            .param("show-entries", usage.show_entries)
            .param("show-summary", usage.show_summary);
        self.request(Method::GET, &self.endpoint("usage"), &query, None, None)
            .await
    }

    /// Removes usage records in the range; `remove_all` is needed to trim
    /// every user at once.
    pub async fn trim_usage(&self, trim: &TrimUsage) -> Result<Option<Value>> {
        let query = self
            .query()
            .opt("uid", trim.uid.as_ref())
            .opt("start", trim.start.as_ref())
            .opt("end", trim.end.as_ref())
            .param("remove-all", trim.remove_all);
        self.request(Method::DELETE, &self.endpoint("usage"), &query, None, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::admin_for;
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_get_usage_for_user() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/usage")
            .match_query(Matcher::Exact(
                "format=json&uid=alice&start=2024-01-01&show-entries=false&show-summary=true"
                    .into(),
            ))
            .with_status(200)
            .with_body(r#"{"entries": [], "summary": []}"#)
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        let usage = UsageQuery {
            uid: Some("alice".into()),
            start: Some("2024-01-01".into()),
            show_summary: true,
            ..UsageQuery::default()
        };
        let report = admin.get_usage(&usage).await.unwrap().unwrap();

        mock.assert_async().await;
        assert!(report["summary"].is_array());
    }

    #[tokio::test]
    async fn test_trim_all_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/admin/usage")
            .match_query(Matcher::Exact(
                "format=json&end=2024-02-01%2000%3A00%3A00&remove-all=true".into(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        let trim = TrimUsage {
            end: Some("2024-02-01 00:00:00".into()),
            remove_all: true,
            ..TrimUsage::default()
        };
        admin.trim_usage(&trim).await.unwrap();
        mock.assert_async().await;
    }
}
