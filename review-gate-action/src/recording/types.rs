use serde::{Deserialize, Serialize};

/// One line of the HTTP recording log.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordedEvent {
    pub timestamp: String,      // RFC 3339
    pub correlation_id: String, // Groups a request with its response
    pub event_type: EventType,
    pub direction: Direction,
    pub operation: String,       // e.g. "GET /repos/o/r/pulls/1/reviews", "response_200"
    pub data: serde_json::Value, // Sanitized request/response data
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum EventType {
    GitHubApiCall,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Direction {
    Request,
    Response,
}

pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";
