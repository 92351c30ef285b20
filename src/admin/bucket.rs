use reqwest::Method;
use serde_json::Value;

use super::core::RgwAdmin;
use super::metadata::MetadataType;
use crate::error::Result;

impl RgwAdmin {
    /// Lists the names of all buckets in the gateway.
    pub async fn get_buckets(&self) -> Result<Option<Value>> {
        self.get_metadata(MetadataType::Bucket, None, None, None)
            .await
    }

    /// Lists all bucket instances as `name:instance-id`.
    pub async fn get_bucket_instances(&self) -> Result<Option<Value>> {
        self.get_metadata(MetadataType::BucketInstance, None, None, None)
            .await
    }

    /// Bucket information for one bucket, the buckets of a user, or all
    /// buckets when neither is given.
    pub async fn get_bucket(
        &self,
        bucket: Option<&str>,
        uid: Option<&str>,
        stats: bool,
    ) -> Result<Option<Value>> {
        let query = self
            .query()
            .opt("bucket", bucket)
            .opt("uid", uid)
            .param("stats", stats);
        self.request(Method::GET, &self.endpoint("bucket"), &query, None, None)
            .await
    }

    pub async fn check_bucket_index(
        &self,
        bucket: &str,
        check_objects: bool,
        fix: bool,
    ) -> Result<Option<Value>> {
        let query = self
            .flag_query("index")
            .param("bucket", bucket)
            .param("check-objects", check_objects)
            .param("fix", fix);
        self.request(Method::GET, &self.endpoint("bucket"), &query, None, None)
            .await
    }

    pub async fn remove_bucket(&self, bucket: &str, purge_objects: bool) -> Result<Option<Value>> {
        let query = self
            .query()
            .param("bucket", bucket)
            .param("purge-objects", purge_objects);
        self.request(Method::DELETE, &self.endpoint("bucket"), &query, None, None)
            .await
    }

    pub async fn unlink_bucket(&self, bucket: &str, uid: &str) -> Result<Option<Value>> {
        let query = self.query().param("bucket", bucket).param("uid", uid);
        self.request(Method::POST, &self.endpoint("bucket"), &query, None, None)
            .await
    }

    /// Links a bucket to a user.
    ///
    /// The gateway rejects the call with `InvalidArgument` when the bucket id
    /// is missing, so it is required here.
    pub async fn link_bucket(&self, bucket: &str, bucket_id: &str, uid: &str) -> Result<Option<Value>> {
        let query = self
            .query()
            .param("bucket", bucket)
            .param("bucket-id", bucket_id)
            .param("uid", uid);
        self.request(Method::PUT, &self.endpoint("bucket"), &query, None, None)
            .await
    }

    pub async fn remove_object(&self, bucket: &str, object_name: &str) -> Result<Option<Value>> {
        let query = self
            .flag_query("object")
            .param("bucket", bucket)
            .param("object", object_name);
        self.request(Method::DELETE, &self.endpoint("bucket"), &query, None, None)
            .await
    }

    /// Access policy of a bucket, or of one object in it.
    pub async fn get_policy(&self, bucket: &str, object_name: Option<&str>) -> Result<Option<Value>> {
        let query = self
            .flag_query("policy")
            .param("bucket", bucket)
            .opt("object", object_name);
        self.request(Method::GET, &self.endpoint("bucket"), &query, None, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::admin_for;
    use crate::error::ErrorCode;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_get_bucket_with_stats() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/bucket")
            .match_query(Matcher::Exact("format=json&bucket=photos&stats=true".into()))
            .with_status(200)
            .with_body(r#"{"bucket": "photos", "id": "default.4711.1", "owner": "alice"}"#)
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        let bucket = admin
            .get_bucket(Some("photos"), None, true)
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bucket["id"], "default.4711.1");
    }

    #[tokio::test]
    async fn test_bucket_instances_from_metadata() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/metadata/bucket.instance")
            .match_query(Matcher::Exact("format=json".into()))
            .with_status(200)
            .with_body(r#"["photos:default.4711.1"]"#)
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        let instances = admin.get_bucket_instances().await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(instances[0], "photos:default.4711.1");
    }

    #[tokio::test]
    async fn test_check_index() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/bucket")
            .match_query(Matcher::Exact(
                "index&format=json&bucket=photos&check-objects=true&fix=false".into(),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        admin.check_bucket_index("photos", true, false).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remove_non_empty_bucket() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/admin/bucket")
            .match_query(Matcher::Exact(
                "format=json&bucket=photos&purge-objects=false".into(),
            ))
            .with_status(409)
            .with_body(r#"{"Code": "BucketNotEmpty"}"#)
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        let err = admin.remove_bucket("photos", false).await.unwrap_err();

        mock.assert_async().await;
        assert!(err.is_code(&ErrorCode::BucketNotEmpty));
    }

    #[tokio::test]
    async fn test_link_and_unlink() {
        let mut server = mockito::Server::new_async().await;
        let link = server
            .mock("PUT", "/admin/bucket")
            .match_query(Matcher::Exact(
                "format=json&bucket=photos&bucket-id=default.4711.1&uid=bob".into(),
            ))
            .with_status(200)
            .create_async()
            .await;
        let unlink = server
            .mock("POST", "/admin/bucket")
            .match_query(Matcher::Exact("format=json&bucket=photos&uid=alice".into()))
            .with_status(200)
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        admin.unlink_bucket("photos", "alice").await.unwrap();
        admin
            .link_bucket("photos", "default.4711.1", "bob")
            .await
            .unwrap();

        link.assert_async().await;
        unlink.assert_async().await;
    }

    #[tokio::test]
    async fn test_object_and_policy() {
        let mut server = mockito::Server::new_async().await;
        let remove = server
            .mock("DELETE", "/admin/bucket")
            .match_query(Matcher::Exact(
                "object&format=json&bucket=photos&object=2024%2Fcat.jpg".into(),
            ))
            .with_status(200)
            .create_async()
            .await;
        let policy = server
            .mock("GET", "/admin/bucket")
            .match_query(Matcher::Exact("policy&format=json&bucket=photos".into()))
            .with_status(200)
            .with_body(r#"{"acl": {"grant_map": []}}"#)
            .create_async()
            .await;

        let admin = admin_for(&server, false);
        admin.remove_object("photos", "2024/cat.jpg").await.unwrap();
        let value = admin.get_policy("photos", None).await.unwrap().unwrap();

        remove.assert_async().await;
        policy.assert_async().await;
        assert!(value["acl"]["grant_map"].is_array());
    }
}
