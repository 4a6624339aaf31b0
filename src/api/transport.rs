/// Transport abstraction between the session and the register backend.
///
/// The session never talks to the network itself: it hands requests to a
/// `Transport` (usually through the core worker) and applies the settled
/// results. Tests swap in in-memory implementations.
use crate::protocol::{Port, RegisterSnapshot, RegisterValues};

/// Failure of a single backend exchange.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, IO error or timeout.
    #[display("backend unreachable: {_0}")]
    Unreachable(#[error(not(source))] String),
    /// The backend answered with a non-2xx status.
    #[display("backend returned HTTP {_0}")]
    Status(#[error(not(source))] u16),
    /// The backend answered 2xx but the body did not match the contract.
    #[display("malformed backend response: {_0}")]
    Decode(#[error(not(source))] String),
}

impl TransportError {
    /// Whether the failure happened before any response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Unreachable(_))
    }
}

/// The three remote operations exposed by the backend. Each call is one
/// request/response exchange with no retries.
pub trait Transport: Send {
    /// Enumerate the serial ports the backend can see.
    fn list_ports(&self) -> Result<Vec<Port>, TransportError>;

    /// Read the eight configuration registers through `port`.
    fn read_registers(&self, port: &Port) -> Result<RegisterSnapshot, TransportError>;

    /// Write `values` to the device on `port`. The acknowledgement body is
    /// returned as-is.
    fn submit_values(
        &self,
        port: &Port,
        values: &RegisterValues,
    ) -> Result<serde_json::Value, TransportError>;
}
