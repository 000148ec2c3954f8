//! Google Cloud plumbing shared by the Earth Engine and Cloud Storage clients

pub mod auth;
pub mod storage;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Pull the human readable message out of a Google API error body.
///
/// Google APIs answer `{"error": {"code", "message", "status"}}`; anything
/// else is returned as-is so the caller still sees what went wrong.
pub fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => match envelope.error.status {
            Some(code) => format!("{} ({})", envelope.error.message, code),
            None => envelope.error.message,
        },
        _ if body.trim().is_empty() => format!("HTTP {}", status.as_u16()),
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_extracts_google_error_message() {
        let body = r#"{"error":{"code":400,"message":"Image.select: Pattern 'B8' did not match any bands.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            upstream_message(StatusCode::BAD_REQUEST, body),
            "Image.select: Pattern 'B8' did not match any bands. (INVALID_ARGUMENT)"
        );
    }

    #[test]
    fn test_falls_back_to_raw_body() {
        assert_eq!(upstream_message(StatusCode::BAD_GATEWAY, " upstream down "), "upstream down");
        assert_eq!(upstream_message(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }
}
