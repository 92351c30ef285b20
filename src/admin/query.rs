use std::fmt::Display;

/// Query string for an admin endpoint.
///
/// Parameters keep their insertion order. A bare flag such as `quota` or
/// `subuser` selects the sub-operation and always comes first, followed by
/// `format=`. Values are percent-encoded, `None` values are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminQuery {
    parts: Vec<String>,
}

impl AdminQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for a plain endpoint: `format={format}`.
    pub fn with_format(format: &str) -> Self {
        Self::new().param("format", format)
    }

    /// Query for a sub-operation: `{flag}&format={format}`.
    pub fn with_flag(flag: &str, format: &str) -> Self {
        Self::new().flag(flag).param("format", format)
    }

    pub fn flag(mut self, name: &str) -> Self {
        self.parts.push(name.to_string());
        self
    }

    pub fn param(mut self, name: &str, value: impl Display) -> Self {
        self.parts
            .push(format!("{name}={}", urlencoding::encode(&value.to_string())));
        self
    }

    pub fn opt<T: Display>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn as_string(&self) -> String {
        self.parts.join("&")
    }
}

impl Display for AdminQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_comes_before_format() {
        let query = AdminQuery::with_flag("quota", "json")
            .param("uid", "alice")
            .param("quota-type", "user");
        assert_eq!(query.to_string(), "quota&format=json&uid=alice&quota-type=user");
    }

    #[test]
    fn test_none_values_are_skipped() {
        let query = AdminQuery::with_format("json")
            .opt("email", None::<&str>)
            .opt("max-buckets", Some(10));
        assert_eq!(query.to_string(), "format=json&max-buckets=10");
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let query = AdminQuery::new()
            .param("marker", "default.345 -5")
            .param("user-caps", "usage=read;users=*");
        assert_eq!(
            query.to_string(),
            "marker=default.345%20-5&user-caps=usage%3Dread%3Busers%3D%2A"
        );
    }

    #[test]
    fn test_booleans_render_lowercase() {
        let query = AdminQuery::new().param("stats", true).param("sync", false);
        assert_eq!(query.to_string(), "stats=true&sync=false");
    }
}
