use anyhow::{anyhow, Result};
use std::time::Duration;

use super::{
    bus::{Bus, CoreToUi, UiToCore},
    session::{Session, SessionError},
};
use crate::protocol::Port;

/// Couples a [`Session`] with the bus to the core worker.
///
/// Operator actions go through here: the session transition runs first and
/// any resulting backend request is queued on the bus. Outcomes are applied
/// when the UI loop calls [`Controller::pump`].
pub struct Controller {
    session: Session,
    bus: Bus,
    directory_pending: bool,
}

impl Controller {
    pub fn new(session: Session, bus: Bus) -> Self {
        Self {
            session,
            bus,
            directory_pending: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn send(&self, request: UiToCore) -> Result<()> {
        self.bus
            .ui_tx
            .send(request)
            .map_err(|err| anyhow!("Core worker is gone: {err}"))
    }

    /// Queue a directory fetch. Returns `Ok(false)` when one is already in
    /// flight and the request was coalesced.
    pub fn refresh_ports(&mut self) -> Result<bool> {
        if self.directory_pending {
            return Ok(false);
        }
        self.send(UiToCore::ListPorts)?;
        self.directory_pending = true;
        Ok(true)
    }

    pub fn select(&mut self, port: &Port) -> Result<(), SessionError> {
        self.session.select(port)
    }

    /// Confirm the selection and queue its read. Returns whether a read was
    /// issued.
    pub fn confirm(&mut self) -> Result<bool> {
        match self.session.confirm() {
            Some(ticket) => {
                self.send(UiToCore::ReadRegisters(ticket))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn edit(&mut self, index: usize, text: impl Into<String>) -> Result<(), SessionError> {
        self.session.edit(index, text)
    }

    /// Queue a submit of the current edit buffer. Returns whether a request was
    /// sent; a rejected submit is already reflected in the session.
    pub fn submit(&mut self) -> Result<bool> {
        match self.session.submit() {
            Ok(request) => {
                self.send(UiToCore::SubmitValues(request))?;
                Ok(true)
            }
            Err(err) => {
                log::debug!("Submit not sent: {err}");
                Ok(false)
            }
        }
    }

    fn settle(&mut self, outcome: CoreToUi) {
        if matches!(outcome, CoreToUi::Directory(_)) {
            self.directory_pending = false;
        }
        self.session.apply(outcome);
    }

    /// Apply every outcome that has arrived so far. Returns how many were
    /// applied, or an error once the worker has stopped.
    pub fn pump(&mut self) -> Result<usize> {
        let mut applied = 0;
        loop {
            match self.bus.core_rx.try_recv() {
                Ok(CoreToUi::Quit) => return Err(anyhow!("Core worker stopped")),
                Ok(outcome) => {
                    self.settle(outcome);
                    applied += 1;
                }
                Err(flume::TryRecvError::Empty) => return Ok(applied),
                Err(flume::TryRecvError::Disconnected) => {
                    return Err(anyhow!("Core worker disconnected"))
                }
            }
        }
    }

    /// Block for at most `timeout` waiting for one outcome and apply it.
    /// Returns `Ok(false)` on timeout.
    pub fn pump_blocking(&mut self, timeout: Duration) -> Result<bool> {
        match self.bus.core_rx.recv_timeout(timeout) {
            Ok(CoreToUi::Quit) => Err(anyhow!("Core worker stopped")),
            Ok(outcome) => {
                self.settle(outcome);
                Ok(true)
            }
            Err(flume::RecvTimeoutError::Timeout) => Ok(false),
            Err(flume::RecvTimeoutError::Disconnected) => {
                Err(anyhow!("Core worker disconnected"))
            }
        }
    }

    /// Ask the worker to stop.
    pub fn shutdown(&self) {
        if let Err(err) = self.bus.ui_tx.send(UiToCore::Quit) {
            log::warn!("Failed to send quit to core worker: {err}");
        }
    }
}
