// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP dispatch of offline actions to the fleet API.
//!
//! Maps each [`ActionKind`] to its endpoint and encoding, performs one POST
//! per dispatch, and classifies the result as success / retryable /
//! terminal. Pure transport: no business validation, no internal retries.

use async_trait::async_trait;
use tracing::{debug, warn};

use fleetsync_config::model::ApiConfig;
use fleetsync_core::types::{ActionKind, DispatchOutcome, OfflineAction, Payload, PayloadValue};
use fleetsync_core::{ActionTransport, FleetsyncError};

/// How an action's payload goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `multipart/form-data`; used by kinds that carry photo evidence.
    /// Every payload field becomes a part, primitives coerced to strings.
    Multipart,
    /// Structured JSON body.
    Json,
}

/// Endpoint and encoding for one action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub encoding: Encoding,
}

/// Total mapping from action kind to route. The match is exhaustive, so a
/// new kind without a route is a compile error, not a runtime branch.
pub fn route(kind: ActionKind) -> Route {
    match kind {
        ActionKind::FuelLog => Route {
            path: "/api/v1/driver/fuel-logs",
            encoding: Encoding::Multipart,
        },
        ActionKind::TripComplete => Route {
            path: "/api/v1/driver/trips/complete",
            encoding: Encoding::Multipart,
        },
        ActionKind::TripIncident => Route {
            path: "/api/v1/driver/trips/incident",
            encoding: Encoding::Multipart,
        },
        ActionKind::FreeTripStart => Route {
            path: "/api/v1/driver/free-trips/start",
            encoding: Encoding::Json,
        },
        ActionKind::FreeTripClose => Route {
            path: "/api/v1/driver/free-trips/close",
            encoding: Encoding::Json,
        },
    }
}

/// Reqwest-backed [`ActionTransport`] for the fleet API.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport with the whole-request timeout from config.
    pub fn new(api: &ApiConfig) -> Result<Self, FleetsyncError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(api.request_timeout_secs))
            .build()
            .map_err(|e| FleetsyncError::Transport {
                message: "failed to build HTTP client".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: api.base_url.clone(),
        })
    }

    fn build_multipart(payload: &Payload) -> Result<reqwest::multipart::Form, DispatchOutcome> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in payload {
            form = match value {
                PayloadValue::Text { value } => form.text(name.clone(), value.clone()),
                PayloadValue::Number { value } => form.text(name.clone(), format_number(*value)),
                PayloadValue::Bool { value } => form.text(name.clone(), value.to_string()),
                PayloadValue::Attachment {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let part = reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(content_type)
                        // A stored attachment with a malformed MIME type can
                        // never be sent; retrying is pointless.
                        .map_err(|e| {
                            DispatchOutcome::Terminal(format!(
                                "invalid attachment content type {content_type:?}: {e}"
                            ))
                        })?;
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }

    fn build_json(payload: &Payload) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        for (name, value) in payload {
            let json = match value {
                PayloadValue::Text { value } => serde_json::Value::String(value.clone()),
                PayloadValue::Number { value } => serde_json::Number::from_f64(*value)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
                PayloadValue::Bool { value } => serde_json::Value::Bool(*value),
                PayloadValue::Attachment {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    use base64::Engine as _;
                    serde_json::json!({
                        "file_name": file_name,
                        "content_type": content_type,
                        "bytes": base64::engine::general_purpose::STANDARD.encode(bytes),
                    })
                }
            };
            body.insert(name.clone(), json);
        }
        serde_json::Value::Object(body)
    }
}

/// Coerce a payload number to its form-field string representation.
/// Whole numbers drop the trailing `.0` the way the portal forms wrote them.
fn format_number(n: f64) -> String {
    if n.is_finite() && n == n.trunc() && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Classify a non-2xx response status.
///
/// 408/429 and 5xx are worth retrying; any other 4xx is a server rejection
/// that will never succeed unmodified and must not clog the queue.
fn classify_status(status: reqwest::StatusCode, body: &str) -> DispatchOutcome {
    let detail = if body.is_empty() {
        format!("{status}")
    } else {
        let snippet: String = body.chars().take(200).collect();
        format!("{status}: {snippet}")
    };
    if status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        DispatchOutcome::Retryable(detail)
    } else if status.is_client_error() {
        DispatchOutcome::Terminal(detail)
    } else {
        DispatchOutcome::Retryable(detail)
    }
}

#[async_trait]
impl ActionTransport for HttpTransport {
    async fn dispatch(&self, action: &OfflineAction) -> DispatchOutcome {
        let route = route(action.kind);
        let url = format!("{}{}", self.base_url, route.path);
        debug!(id = %action.id, kind = %action.kind, %url, "dispatching action");

        let request = match route.encoding {
            Encoding::Multipart => match Self::build_multipart(&action.payload) {
                Ok(form) => self.client.post(&url).multipart(form),
                Err(outcome) => {
                    warn!(id = %action.id, ?outcome, "unsendable attachment");
                    return outcome;
                }
            },
            Encoding::Json => self.client.post(&url).json(&Self::build_json(&action.payload)),
        };

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    debug!(id = %action.id, %status, "action confirmed");
                    DispatchOutcome::Success
                } else {
                    let body = response.text().await.unwrap_or_default();
                    let outcome = classify_status(status, &body);
                    warn!(id = %action.id, %status, ?outcome, "action rejected");
                    outcome
                }
            }
            Err(e) if e.is_timeout() => {
                warn!(id = %action.id, "dispatch timed out");
                DispatchOutcome::Retryable(format!("request timed out: {e}"))
            }
            Err(e) => {
                warn!(id = %action.id, error = %e, "dispatch never reached the server");
                DispatchOutcome::Retryable(format!("connection failed: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsync_core::types::Payload;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 1,
        }
    }

    fn action(kind: ActionKind, payload: Payload) -> OfflineAction {
        OfflineAction::new(kind, payload)
    }

    #[test]
    fn route_table_matches_api_surface() {
        assert_eq!(route(ActionKind::FuelLog).path, "/api/v1/driver/fuel-logs");
        assert_eq!(route(ActionKind::FuelLog).encoding, Encoding::Multipart);
        assert_eq!(route(ActionKind::TripComplete).encoding, Encoding::Multipart);
        assert_eq!(route(ActionKind::TripIncident).encoding, Encoding::Multipart);
        assert_eq!(
            route(ActionKind::FreeTripStart).path,
            "/api/v1/driver/free-trips/start"
        );
        assert_eq!(route(ActionKind::FreeTripStart).encoding, Encoding::Json);
        assert_eq!(route(ActionKind::FreeTripClose).encoding, Encoding::Json);
    }

    #[test]
    fn numbers_coerce_like_form_fields() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(42.5), "42.5");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[tokio::test]
    async fn json_kind_posts_structured_body_and_succeeds_on_2xx() {
        let server = MockServer::start().await;
        let mut payload = Payload::new();
        payload.insert("vehicle_id".into(), PayloadValue::text("V-104"));
        payload.insert("odometer".into(), PayloadValue::number(120543.0));
        payload.insert("municipal".into(), PayloadValue::bool(true));

        Mock::given(method("POST"))
            .and(path("/api/v1/driver/free-trips/start"))
            .and(body_json(serde_json::json!({
                "vehicle_id": "V-104",
                "odometer": 120543.0,
                "municipal": true,
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&api_config(&server.uri())).unwrap();
        let outcome = transport
            .dispatch(&action(ActionKind::FreeTripStart, payload))
            .await;
        assert_eq!(outcome, DispatchOutcome::Success);
    }

    #[tokio::test]
    async fn multipart_kind_sends_every_field_as_a_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/driver/fuel-logs"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut payload = Payload::new();
        payload.insert("liters".into(), PayloadValue::number(42.5));
        payload.insert(
            "receipt".into(),
            PayloadValue::attachment("receipt.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff, 0xe0]),
        );

        let transport = HttpTransport::new(&api_config(&server.uri())).unwrap();
        let outcome = transport.dispatch(&action(ActionKind::FuelLog, payload)).await;
        assert_eq!(outcome, DispatchOutcome::Success);

        let requests = server.received_requests().await.unwrap();
        let request = &requests[0];
        let content_type = request
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(
            content_type.starts_with("multipart/form-data"),
            "got content type {content_type:?}"
        );
        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains("name=\"liters\""), "liters part present");
        assert!(body.contains("42.5"), "number coerced to string part");
        assert!(
            body.contains("filename=\"receipt.jpg\""),
            "attachment part carries the file name"
        );
        assert!(body.contains("image/jpeg"), "attachment part carries the MIME type");
    }

    #[tokio::test]
    async fn server_errors_are_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&api_config(&server.uri())).unwrap();
        let outcome = transport
            .dispatch(&action(ActionKind::FreeTripClose, Payload::new()))
            .await;
        assert!(
            matches!(outcome, DispatchOutcome::Retryable(_)),
            "got {outcome:?}"
        );
    }

    #[tokio::test]
    async fn throttling_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&api_config(&server.uri())).unwrap();
        let outcome = transport
            .dispatch(&action(ActionKind::FreeTripStart, Payload::new()))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Retryable(_)));
    }

    #[tokio::test]
    async fn validation_rejections_are_terminal_with_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(422).set_body_string("liters must be positive"),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&api_config(&server.uri())).unwrap();
        let outcome = transport
            .dispatch(&action(ActionKind::FreeTripStart, Payload::new()))
            .await;
        match outcome {
            DispatchOutcome::Terminal(detail) => {
                assert!(detail.contains("422"), "{detail}");
                assert!(detail.contains("liters must be positive"), "{detail}");
            }
            other => panic!("expected Terminal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_retryable() {
        // Nothing listens here.
        let transport =
            HttpTransport::new(&api_config("http://127.0.0.1:9")).unwrap();
        let outcome = transport
            .dispatch(&action(ActionKind::FreeTripStart, Payload::new()))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Retryable(_)));
    }

    #[tokio::test]
    async fn client_timeout_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&api_config(&server.uri())).unwrap();
        let outcome = transport
            .dispatch(&action(ActionKind::FreeTripClose, Payload::new()))
            .await;
        assert!(
            matches!(outcome, DispatchOutcome::Retryable(ref m) if m.contains("timed out")),
            "got {outcome:?}"
        );
    }

    #[tokio::test]
    async fn malformed_attachment_mime_is_terminal_without_a_network_call() {
        let mut payload = Payload::new();
        payload.insert(
            "receipt".into(),
            PayloadValue::attachment("r.jpg", "not a mime type", vec![1, 2, 3]),
        );

        let transport =
            HttpTransport::new(&api_config("http://127.0.0.1:9")).unwrap();
        let outcome = transport.dispatch(&action(ActionKind::FuelLog, payload)).await;
        assert!(
            matches!(outcome, DispatchOutcome::Terminal(_)),
            "got {outcome:?}"
        );
    }
}
