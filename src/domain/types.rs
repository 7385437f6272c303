use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Store-assigned identifier of a hello record.
pub type HelloId = u64;

/// Core domain entity: the single persisted record type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hello {
    pub id: HelloId,
    pub message: String,
}

impl Hello {
    pub fn new(id: HelloId, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}

/// Request payload for creating or replacing a hello.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HelloRequest {
    #[validate(length(min = 1, max = 4096, message = "message must be 1-4096 characters"))]
    pub message: String,
}

impl HelloRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Raw list query exactly as received; values are parsed leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Normalized pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub limit: i64,
    pub offset: i64,
}

impl ListParams {
    pub const DEFAULT_LIMIT: i64 = 100;

    /// Applies defaults: a limit that is absent or not positive becomes
    /// [`Self::DEFAULT_LIMIT`], an offset that is absent or negative becomes 0.
    /// No upper bound is placed on the limit.
    #[must_use]
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(limit) if limit > 0 => limit,
            _ => Self::DEFAULT_LIMIT,
        };
        let offset = match offset {
            Some(offset) if offset >= 0 => offset,
            _ => 0,
        };
        Self { limit, offset }
    }

    /// Unparsable values are treated as absent.
    #[must_use]
    pub fn from_query(query: &ListQuery) -> Self {
        let parse = |raw: &Option<String>| raw.as_deref().and_then(|v| v.trim().parse().ok());
        Self::new(parse(&query.limit), parse(&query.offset))
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Aggregate status reported by the health check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Ok,
    Degraded,
}

/// Status of a single dependency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceStatus {
    pub status: ServiceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceStatus {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: ServiceState::Ok,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ServiceState::Error,
            message: Some(message.into()),
        }
    }
}

/// Health check response for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: OverallStatus,
    pub timestamp: DateTime<Utc>,
    pub services: BTreeMap<String, ServiceStatus>,
}

impl HealthStatus {
    /// Builds a report from per-service results. Any failing service makes
    /// the overall status degraded; a single dependency never marks the
    /// process as down.
    #[must_use]
    pub fn from_services(services: BTreeMap<String, ServiceStatus>) -> Self {
        let status = if services.values().all(|s| s.status == ServiceState::Ok) {
            OverallStatus::Ok
        } else {
            OverallStatus::Degraded
        };

        Self {
            status,
            timestamp: Utc::now(),
            services,
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == OverallStatus::Ok
    }
}

/// Error detail inside the error envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub trace_id: String,
}

/// Error envelope returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

impl ErrorResponse {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                trace_id: trace_id.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_defaults() {
        let params = ListParams::new(None, None);
        assert_eq!(params, ListParams { limit: 100, offset: 0 });
    }

    #[test]
    fn test_list_params_non_positive_limit_and_negative_offset() {
        let params = ListParams::new(Some(0), Some(-5));
        assert_eq!(params, ListParams { limit: 100, offset: 0 });

        let params = ListParams::new(Some(-1), Some(0));
        assert_eq!(params, ListParams { limit: 100, offset: 0 });
    }

    #[test]
    fn test_list_params_pass_through() {
        let params = ListParams::new(Some(5), Some(10));
        assert_eq!(params, ListParams { limit: 5, offset: 10 });
    }

    #[test]
    fn test_list_params_limit_is_unbounded() {
        let params = ListParams::new(Some(1_000_000), None);
        assert_eq!(params.limit, 1_000_000);
    }

    #[test]
    fn test_list_params_from_query_is_lenient() {
        let query = ListQuery {
            limit: Some("abc".to_string()),
            offset: Some("7".to_string()),
        };
        assert_eq!(
            ListParams::from_query(&query),
            ListParams { limit: 100, offset: 7 }
        );

        let query = ListQuery {
            limit: Some("".to_string()),
            offset: Some("-3".to_string()),
        };
        assert_eq!(
            ListParams::from_query(&query),
            ListParams { limit: 100, offset: 0 }
        );
    }

    #[test]
    fn test_hello_request_validation() {
        assert!(HelloRequest::new("hi").validate().is_ok());
        assert!(HelloRequest::new("").validate().is_err());
        assert!(HelloRequest::new("x".repeat(4097)).validate().is_err());
    }

    #[test]
    fn test_health_status_ok() {
        let mut services = BTreeMap::new();
        services.insert("database".to_string(), ServiceStatus::ok());
        let status = HealthStatus::from_services(services);

        assert!(status.is_ok());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["services"]["database"]["status"], "ok");
        assert!(json["services"]["database"].get("message").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_health_status_degraded() {
        let mut services = BTreeMap::new();
        services.insert(
            "database".to_string(),
            ServiceStatus::error("connection refused"),
        );
        let status = HealthStatus::from_services(services);

        assert_eq!(status.status, OverallStatus::Degraded);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["services"]["database"]["status"], "error");
        assert_eq!(
            json["services"]["database"]["message"],
            "connection refused"
        );
    }

    #[test]
    fn test_error_response_shape() {
        let body = ErrorResponse::new("not_found", "Record not found: hello 9", "trace-123");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"]["code"], "not_found");
        assert_eq!(json["error"]["message"], "Record not found: hello 9");
        assert_eq!(json["error"]["trace_id"], "trace-123");
    }

    #[test]
    fn test_hello_serialization() {
        let hello = Hello::new(42, "hi");
        let json = serde_json::to_string(&hello).unwrap();
        assert_eq!(json, r#"{"id":42,"message":"hi"}"#);

        let deserialized: Hello = serde_json::from_str(&json).unwrap();
        assert_eq!(hello, deserialized);
    }
}
