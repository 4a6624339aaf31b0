use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;

use super::transport::{Transport, TransportError};
use crate::protocol::{
    ListResponse, Port, ReadResponse, RegisterSnapshot, RegisterValues, SubmitBody,
};

/// Blocking HTTP client for the `/api/list`, `/api/read` and `/api/submit` endpoints.
pub struct HttpTransport {
    agent: Agent,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is the backend origin, e.g. `http://127.0.0.1:8080`.
    /// `timeout` bounds each whole request; `None` waits indefinitely.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(true)
            .build();
        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::StatusCode(code) => TransportError::Status(code),
        other => TransportError::Unreachable(other.to_string()),
    }
}

fn read_text(mut response: ureq::http::Response<ureq::Body>) -> Result<String, TransportError> {
    response
        .body_mut()
        .read_to_string()
        .map_err(map_ureq_error)
}

fn decode_body<T: DeserializeOwned>(
    response: ureq::http::Response<ureq::Body>,
) -> Result<T, TransportError> {
    let text = read_text(response)?;
    serde_json::from_str(&text).map_err(|err| TransportError::Decode(err.to_string()))
}

/// A 2xx submit reply means the write was accepted, whatever the body says.
/// Empty bodies become `Null` and non-JSON text is kept as a string.
fn acknowledgement(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

impl Transport for HttpTransport {
    fn list_ports(&self) -> Result<Vec<Port>, TransportError> {
        let url = self.endpoint("/api/list");
        log::debug!("GET {url}");
        let response = self.agent.get(&url).call().map_err(map_ureq_error)?;
        let body: ListResponse = decode_body(response)?;

        let ports = body
            .ports
            .into_iter()
            .filter_map(|name| match Port::new(name) {
                Ok(port) => Some(port),
                Err(err) => {
                    log::warn!("Ignoring port entry from backend: {err}");
                    None
                }
            })
            .collect();
        Ok(ports)
    }

    fn read_registers(&self, port: &Port) -> Result<RegisterSnapshot, TransportError> {
        let url = self.endpoint("/api/read");
        log::debug!("GET {url}?port={port}");
        let response = self
            .agent
            .get(&url)
            .query("port", port.as_str())
            .call()
            .map_err(map_ureq_error)?;
        let body: ReadResponse = decode_body(response)?;

        let registers = body
            .registers
            .ok_or_else(|| TransportError::Decode("response has no registers".to_string()))?;
        RegisterSnapshot::try_from(registers).map_err(|len| {
            TransportError::Decode(format!("expected 8 registers, got {len}"))
        })
    }

    fn submit_values(
        &self,
        port: &Port,
        values: &RegisterValues,
    ) -> Result<serde_json::Value, TransportError> {
        let url = self.endpoint("/api/submit");
        let body = SubmitBody::new(port, values);
        log::debug!("POST {url}?port={port} values={:?}", body.values);
        let response = self
            .agent
            .post(&url)
            .query("port", port.as_str())
            .send_json(&body)
            .map_err(map_ureq_error)?;
        Ok(acknowledgement(&read_text(response)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let transport = HttpTransport::new("http://localhost:8080/", None);
        assert_eq!(transport.base_url(), "http://localhost:8080");
        assert_eq!(
            transport.endpoint("/api/list"),
            "http://localhost:8080/api/list"
        );
    }

    #[test]
    fn test_status_errors_keep_their_code() {
        assert_eq!(
            map_ureq_error(ureq::Error::StatusCode(503)),
            TransportError::Status(503)
        );
        assert!(map_ureq_error(ureq::Error::ConnectionFailed).is_network());
    }

    #[test]
    fn test_acknowledgement_accepts_any_body() {
        assert_eq!(acknowledgement(""), serde_json::Value::Null);
        assert_eq!(acknowledgement("  \n"), serde_json::Value::Null);
        assert_eq!(acknowledgement("OK"), serde_json::json!("OK"));
        assert_eq!(
            acknowledgement(r#"{"data":{"port":"COM3"}}"#),
            serde_json::json!({ "data": { "port": "COM3" } })
        );
    }
}
