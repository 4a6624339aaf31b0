use flume::{Receiver, Sender};

use crate::{
    api::TransportError,
    protocol::{Port, RegisterSnapshot, RegisterValues},
};

/// A read the session has asked for. `generation` identifies the confirm
/// that issued it so late answers for older confirms can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTicket {
    pub generation: u64,
    pub port: Port,
}

/// Values ready to be written to the confirmed port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub port: Port,
    pub values: RegisterValues,
}

/// Messages sent from the UI thread to the core worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiToCore {
    /// Enumerate ports through the backend.
    ListPorts,
    /// Read the register block for a confirmed port.
    ReadRegisters(ReadTicket),
    /// Write edited values to the confirmed port.
    SubmitValues(SubmitRequest),
    /// Graceful shutdown request.
    Quit,
}

/// Messages sent from the core worker thread back to the UI thread. Each
/// carries the settled outcome of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreToUi {
    Directory(Result<Vec<Port>, TransportError>),
    Registers {
        ticket: ReadTicket,
        result: Result<RegisterSnapshot, TransportError>,
    },
    Submitted {
        request: SubmitRequest,
        result: Result<serde_json::Value, TransportError>,
    },
    /// The worker has stopped.
    Quit,
}

/// Simple holder passed into UI loop containing the receiving side from core and the sending side to core.
#[derive(Debug, Clone)]
pub struct Bus {
    pub core_rx: Receiver<CoreToUi>,
    pub ui_tx: Sender<UiToCore>,
}

impl Bus {
    pub fn new(core_rx: Receiver<CoreToUi>, ui_tx: Sender<UiToCore>) -> Self {
        Self { core_rx, ui_tx }
    }
}
