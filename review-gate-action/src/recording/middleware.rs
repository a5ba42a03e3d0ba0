use super::{
    Direction, EventType, RecordedEvent, RecordingLogger, Sanitizer, CORRELATION_ID_HEADER,
};
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result as MiddlewareResult};
use std::collections::HashMap;
use uuid::Uuid;

const MAX_RECORDED_BODY: usize = 10_000;

/// Records every GitHub API request and its response (or transport error).
pub struct RecordingMiddleware {
    logger: RecordingLogger,
}

impl RecordingMiddleware {
    pub fn new(logger: RecordingLogger) -> Self {
        Self { logger }
    }
}

#[async_trait::async_trait]
impl Middleware for RecordingMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> MiddlewareResult<Response> {
        let correlation_id = ensure_correlation_id(&mut req);

        let request_data = extract_request_data(&req);
        self.record(
            &correlation_id,
            Direction::Request,
            format!("{} {}", request_data.method, extract_path(&request_data.url)),
            serde_json::to_value(&request_data).unwrap_or(serde_json::Value::Null),
        );

        let response = next.run(req, extensions).await;

        match &response {
            Ok(resp) => {
                let response_data = extract_response_data(resp);
                self.record(
                    &correlation_id,
                    Direction::Response,
                    format!("response_{}", response_data.status_code),
                    serde_json::to_value(&response_data).unwrap_or(serde_json::Value::Null),
                );
            }
            Err(err) => {
                self.record(
                    &correlation_id,
                    Direction::Response,
                    "error".to_string(),
                    serde_json::json!({
                        "error": err.to_string(),
                        "error_type": format!("{:?}", err)
                    }),
                );
            }
        }

        response
    }
}

impl RecordingMiddleware {
    fn record(
        &self,
        correlation_id: &str,
        direction: Direction,
        operation: String,
        data: serde_json::Value,
    ) {
        self.logger.record(RecordedEvent {
            timestamp: chrono::Utc::now().to_rfc3339(),
            correlation_id: correlation_id.to_string(),
            event_type: EventType::GitHubApiCall,
            direction,
            operation,
            data,
        });
    }
}

/// Reuse the request's `X-Correlation-ID` if it carries a readable one,
/// otherwise stamp a fresh UUID onto it.
fn ensure_correlation_id(req: &mut Request) -> String {
    if let Some(existing) = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return existing.to_string();
    }

    let correlation_id = Uuid::new_v4().to_string();
    // A UUID is always a valid header value
    if let Ok(value) = correlation_id.parse() {
        req.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    correlation_id
}

#[derive(Debug, serde::Serialize)]
struct RequestData {
    method: String,
    url: String,
    headers: HashMap<String, String>,
    body: serde_json::Value,
}

#[derive(Debug, serde::Serialize)]
struct ResponseData {
    status_code: u16,
    headers: HashMap<String, String>,
    body_size: u64,
}

fn header_map(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in headers {
        if let Ok(value_str) = value.to_str() {
            map.insert(name.to_string(), value_str.to_string());
        }
    }
    Sanitizer::sanitize_headers(&map)
}

fn extract_request_data(request: &Request) -> RequestData {
    RequestData {
        method: request.method().to_string(),
        url: request.url().to_string(),
        headers: header_map(request.headers()),
        body: describe_body(request.body().map(|b| b.as_bytes())),
    }
}

fn extract_response_data(response: &Response) -> ResponseData {
    ResponseData {
        status_code: response.status().as_u16(),
        headers: header_map(response.headers()),
        body_size: response.content_length().unwrap_or(0),
    }
}

/// JSON bodies are recorded sanitized; anything else only by size.
fn describe_body(body: Option<Option<&[u8]>>) -> serde_json::Value {
    let text = match body {
        None => "[NO_BODY]".to_string(),
        Some(None) => "[STREAM_BODY]".to_string(),
        Some(Some(bytes)) if bytes.len() > MAX_RECORDED_BODY => {
            format!("[LARGE_BODY_{}b]", bytes.len())
        }
        Some(Some(bytes)) => match serde_json::from_slice::<serde_json::Value>(bytes) {
            Ok(json) => return Sanitizer::sanitize_json(&json),
            Err(_) => format!("[NON_JSON_BODY_{}b]", bytes.len()),
        },
    };
    serde_json::Value::String(text)
}

fn extract_path(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}
