use log::debug;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{ErrorCode, Result, RgwAdminError};

/// Decodes an admin API response into its JSON payload.
///
/// Returns `Ok(None)` for `204 No Content` and for successful responses that
/// carry no JSON. Failed responses are mapped to [`RgwAdminError::Api`] using
/// the `Code` field, or [`RgwAdminError::ServerDown`] when nothing can be
/// decoded.
pub fn decode_response(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Result<Option<Value>> {
    let json = serde_json::from_slice::<Value>(body)
        .ok()
        .or_else(|| json_from_headers(headers));

    if status == StatusCode::OK {
        return Ok(json);
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let Some(json) = json else {
        return Err(RgwAdminError::ServerDown {
            status: status.as_u16(),
        });
    };

    let code = json
        .get("Code")
        .and_then(Value::as_str)
        .unwrap_or("InternalError")
        .parse::<ErrorCode>()
        .unwrap_or(ErrorCode::InternalError);

    Err(RgwAdminError::Api {
        status: status.as_u16(),
        code,
        body: json,
    })
}

/// Some admin calls put their JSON into a response header instead of the body.
fn json_from_headers(headers: &HeaderMap) -> Option<Value> {
    headers.iter().find_map(|(name, value)| {
        let joined = format!("{}:{}", name.as_str(), value.to_str().ok()?);
        let start = joined.find('{')?;
        let end = start + joined[start..].find('}')?;
        let value = serde_json::from_str(&joined[start..=end]).ok()?;
        debug!("Recovered JSON from response header '{}'", name.as_str());
        Some(value)
    })
}
