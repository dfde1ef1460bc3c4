//! Responses synthesized when neither the network nor a store can answer.

use serde::Serialize;
use swcache_core::ResponseSnapshot;

const UNAVAILABLE: (u16, &str) = (503, "Service Unavailable");

/// JSON body of an offline API or mutation failure.
#[derive(Debug, Serialize)]
struct OfflineError<'a> {
    error: &'a str,
    offline: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry: Option<bool>,
}

fn json_503(body: &OfflineError<'_>) -> ResponseSnapshot {
    let json = serde_json::to_vec(body).unwrap_or_default();
    ResponseSnapshot::new(UNAVAILABLE.0, UNAVAILABLE.1, json).with_header("Content-Type", "application/json")
}

/// Offline answer for an API read with nothing usable cached.
pub fn api_unavailable() -> ResponseSnapshot {
    json_503(&OfflineError {
        error: "No internet connection",
        offline: true,
        message: "The application is working offline",
        retry: None,
    })
    .with_header("X-Cache-Status", "offline")
}

/// Offline answer for a mutation the network did not accept.
///
/// Nothing is queued: `retry` tells the caller to resend the request itself.
pub fn mutation_unavailable() -> ResponseSnapshot {
    json_503(&OfflineError {
        error: "No internet connection",
        offline: true,
        message: "The operation was not sent; retry it once the connection is back",
        retry: Some(true),
    })
}

/// Self-contained offline page, used when not even the offline document is
/// cached.
pub fn offline_document(app_name: &str) -> ResponseSnapshot {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>No connection - {app_name}</title>
  <style>
    body {{ font-family: Arial, sans-serif; text-align: center; padding: 50px; background: #f8f9fa; }}
    .container {{ max-width: 500px; margin: 0 auto; background: white; padding: 40px; border-radius: 10px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); }}
    h1 {{ color: #343a40; margin-bottom: 15px; }}
    p {{ color: #6c757d; line-height: 1.6; }}
    .btn {{ display: inline-block; padding: 12px 24px; background: #007bff; color: white; text-decoration: none; border-radius: 5px; margin-top: 20px; }}
  </style>
</head>
<body>
  <div class="container">
    <h1>No internet connection</h1>
    <p>This page could not be loaded. Check your connection and try again.</p>
    <a href="/" class="btn" onclick="window.location.reload()">Try again</a>
  </div>
  <script>
    window.addEventListener('online', () => window.location.reload());
  </script>
</body>
</html>
"#
    );

    ResponseSnapshot::new(UNAVAILABLE.0, UNAVAILABLE.1, html).with_header("Content-Type", "text/html; charset=utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn json(resp: &ResponseSnapshot) -> Value {
        serde_json::from_slice(&resp.body).unwrap()
    }

    #[test]
    fn test_api_unavailable_shape() {
        let resp = api_unavailable();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.content_type(), Some("application/json"));
        assert_eq!(resp.header("X-Cache-Status"), Some("offline"));

        let body = json(&resp);
        assert_eq!(body["offline"], true);
        assert!(body["error"].is_string());
        assert!(body["message"].is_string());
        assert!(body.get("retry").is_none());
    }

    #[test]
    fn test_mutation_unavailable_requests_retry() {
        let resp = mutation_unavailable();
        assert_eq!(resp.status, 503);
        let body = json(&resp);
        assert_eq!(body["offline"], true);
        assert_eq!(body["retry"], true);
    }

    #[test]
    fn test_offline_document() {
        let resp = offline_document("Fakturownia");
        assert_eq!(resp.status, 503);
        assert_eq!(resp.status_text, "Service Unavailable");
        assert_eq!(resp.content_type(), Some("text/html; charset=utf-8"));
        let html = resp.text();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("No connection - Fakturownia"));
    }
}
