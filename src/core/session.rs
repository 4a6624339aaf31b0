//! Port selection / read-confirm / edit-submit workflow.
//!
//! [`Session`] owns every piece of operator-visible state and is only mutated
//! through its transition methods. It never performs I/O: operations that need
//! the backend return a request ([`ReadTicket`], [`SubmitRequest`]) for the
//! caller to dispatch, and the settled result is fed back through
//! [`Session::apply`] (or the specific `apply_*` method).
use crate::{
    api::TransportError,
    core::{
        bus::{CoreToUi, ReadTicket, SubmitRequest},
        edit::{CoercionPolicy, EditBuffer},
        logs::{Activity, LogBuffer, LogEntry},
    },
    protocol::{Port, RegisterSnapshot},
};

/// Where the session is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No port chosen yet.
    Unselected,
    /// A port is chosen but not confirmed.
    Selected,
    /// A port is confirmed; `pending_read` is true while its read is in flight.
    /// After a failed read the session stays here with `pending_read == false`.
    Confirmed { pending_read: bool },
    /// The confirmed port's registers are loaded.
    Ready,
}

/// Errors reported by the session. The first group is shown to the operator
/// through [`Session::error`]; `UnknownPort`, `NotConfirmed` and
/// `IndexOutOfRange` are returned to the caller only.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SessionError {
    #[display("No serial ports found")]
    DirectoryEmpty,
    #[display("Could not reach backend")]
    DirectoryUnreachable,
    #[display("Failed to read registers")]
    ReadFailed,
    #[display("Could not connect to backend")]
    ReadUnreachable,
    #[display("Failed to submit values")]
    SubmitFailed,
    #[display("Invalid value {text:?} for register {index}")]
    InvalidValue { index: usize, text: String },
    #[display("Unknown port {_0}")]
    UnknownPort(#[error(not(source))] Port),
    #[display("No port confirmed")]
    NotConfirmed,
    #[display("No register at index {_0}")]
    IndexOutOfRange(#[error(not(source))] usize),
}

impl SessionError {
    fn is_directory(&self) -> bool {
        matches!(
            self,
            SessionError::DirectoryEmpty | SessionError::DirectoryUnreachable
        )
    }

    fn is_submit(&self) -> bool {
        matches!(
            self,
            SessionError::SubmitFailed | SessionError::InvalidValue { .. }
        )
    }
}

/// What happened to a read result handed to [`Session::apply_read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSettlement {
    Loaded,
    Failed,
    /// The result belonged to an older confirm and was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Session {
    ports: Vec<Port>,
    selection: Option<Port>,
    confirmed: Option<Port>,
    snapshot: Option<RegisterSnapshot>,
    edits: EditBuffer,
    error: Option<SessionError>,
    phase: Phase,
    read_generation: u64,
    pending_read: Option<u64>,
    coercion: CoercionPolicy,
    activity: LogBuffer,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CoercionPolicy::default())
    }
}

impl Session {
    pub fn new(coercion: CoercionPolicy) -> Self {
        Self {
            ports: Vec::new(),
            selection: None,
            confirmed: None,
            snapshot: None,
            edits: EditBuffer::new(),
            error: None,
            phase: Phase::Unselected,
            read_generation: 0,
            pending_read: None,
            coercion,
            activity: LogBuffer::default(),
        }
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn selection(&self) -> Option<&Port> {
        self.selection.as_ref()
    }

    pub fn confirmed_port(&self) -> Option<&Port> {
        self.confirmed.as_ref()
    }

    pub fn snapshot(&self) -> Option<&RegisterSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn edits(&self) -> &EditBuffer {
        &self.edits
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn activity(&self) -> &LogBuffer {
        &self.activity
    }

    /// The edit form is available as soon as a port is confirmed, whether or
    /// not its read succeeded.
    pub fn is_form_visible(&self) -> bool {
        self.confirmed.is_some()
    }

    pub fn is_read_pending(&self) -> bool {
        self.pending_read.is_some()
    }

    /// Placeholder for edit field `index`, taken from the last snapshot.
    pub fn placeholder(&self, index: usize) -> Option<u16> {
        self.snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.values.get(index).copied())
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Route a settled backend call to its transition.
    pub fn apply(&mut self, message: CoreToUi) {
        match message {
            CoreToUi::Directory(result) => self.apply_directory(result),
            CoreToUi::Registers { ticket, result } => {
                self.apply_read(&ticket, result);
            }
            CoreToUi::Submitted { request, result } => self.apply_submit(&request, result),
            CoreToUi::Quit => {}
        }
    }

    /// Replace the port set with the outcome of a directory fetch.
    pub fn apply_directory(&mut self, result: Result<Vec<Port>, TransportError>) {
        match result {
            Ok(ports) if ports.is_empty() => {
                self.ports.clear();
                self.activity.push(LogEntry::warning(
                    Activity::Directory,
                    "Backend reported no serial ports",
                ));
                self.error = Some(SessionError::DirectoryEmpty);
            }
            Ok(ports) => {
                self.activity.push(LogEntry::info(
                    Activity::Directory,
                    format!("Found {} serial port(s)", ports.len()),
                ));
                self.ports = ports;
                if self.error.as_ref().is_some_and(SessionError::is_directory) {
                    self.error = None;
                }
            }
            Err(err) => {
                self.ports.clear();
                self.activity.push(LogEntry::error(
                    Activity::Directory,
                    format!("Port listing failed: {err}"),
                ));
                self.error = Some(SessionError::DirectoryUnreachable);
            }
        }

        // A selection must always name a listed port.
        if let Some(selected) = &self.selection {
            if !self.ports.contains(selected) {
                log::debug!("Selection {selected} no longer listed, dropping it");
                self.selection = None;
                if self.phase == Phase::Selected {
                    self.phase = Phase::Unselected;
                }
            }
        }
    }

    /// Choose `port` from the directory. No backend call is made and the
    /// confirmed port is left alone.
    pub fn select(&mut self, port: &Port) -> Result<(), SessionError> {
        if !self.ports.contains(port) {
            return Err(SessionError::UnknownPort(port.clone()));
        }
        self.selection = Some(port.clone());
        if self.phase == Phase::Unselected {
            self.phase = Phase::Selected;
        }
        Ok(())
    }

    /// Lock in the current selection and issue a read for it.
    ///
    /// Returns `None` without touching any state when nothing is selected.
    /// Every call with a selection issues a new read, even for the port that
    /// is already confirmed.
    pub fn confirm(&mut self) -> Option<ReadTicket> {
        let port = self.selection.clone()?;

        self.read_generation += 1;
        let ticket = ReadTicket {
            generation: self.read_generation,
            port: port.clone(),
        };

        self.confirmed = Some(port.clone());
        self.error = None;
        self.pending_read = Some(ticket.generation);
        self.phase = Phase::Confirmed { pending_read: true };
        self.activity.push(LogEntry::info(
            Activity::Confirm { port: port.clone() },
            format!("Confirmed {port}, reading registers"),
        ));
        Some(ticket)
    }

    /// Apply the settled read for `ticket`. Results for anything but the
    /// latest confirm are discarded.
    pub fn apply_read(
        &mut self,
        ticket: &ReadTicket,
        result: Result<RegisterSnapshot, TransportError>,
    ) -> ReadSettlement {
        if self.pending_read != Some(ticket.generation) {
            log::debug!(
                "Discarding stale read for {} (generation {}, current {})",
                ticket.port,
                ticket.generation,
                self.read_generation
            );
            return ReadSettlement::Stale;
        }
        self.pending_read = None;

        let activity = Activity::Read {
            port: ticket.port.clone(),
        };
        match result {
            Ok(snapshot) => {
                self.activity.push(LogEntry::info(
                    activity,
                    format!("Read registers from {}: {:?}", ticket.port, snapshot.values),
                ));
                self.snapshot = Some(snapshot);
                self.phase = Phase::Ready;
                ReadSettlement::Loaded
            }
            Err(err) => {
                self.activity.push(LogEntry::error(
                    activity,
                    format!("Reading {} failed: {err}", ticket.port),
                ));
                self.error = Some(if err.is_network() {
                    SessionError::ReadUnreachable
                } else {
                    SessionError::ReadFailed
                });
                self.phase = Phase::Confirmed {
                    pending_read: false,
                };
                ReadSettlement::Failed
            }
        }
    }

    /// Store raw operator text for register `index`. No validation happens
    /// here so partially typed numbers are kept as-is.
    pub fn edit(&mut self, index: usize, text: impl Into<String>) -> Result<(), SessionError> {
        if self.confirmed.is_none() {
            return Err(SessionError::NotConfirmed);
        }
        if !self.edits.set(index, text) {
            return Err(SessionError::IndexOutOfRange(index));
        }
        Ok(())
    }

    /// Build the submit request for the confirmed port. The session does not
    /// wait for the outcome; feed it back through [`Session::apply_submit`].
    pub fn submit(&mut self) -> Result<SubmitRequest, SessionError> {
        let port = self.confirmed.clone().ok_or(SessionError::NotConfirmed)?;

        let values = match self.edits.to_values(self.coercion) {
            Ok(values) => values,
            Err(invalid) => {
                let err = SessionError::InvalidValue {
                    index: invalid.index,
                    text: invalid.text,
                };
                self.activity.push(LogEntry::warning(
                    Activity::Submit { port: port.clone() },
                    format!("Submit to {port} rejected: {err}"),
                ));
                self.error = Some(err.clone());
                return Err(err);
            }
        };

        self.activity.push(LogEntry::info(
            Activity::Submit { port: port.clone() },
            format!("Submitting {values:?} to {port}"),
        ));
        Ok(SubmitRequest { port, values })
    }

    /// Record the outcome of a submit. Failures are surfaced as
    /// [`SessionError::SubmitFailed`]; the workflow phase never changes.
    pub fn apply_submit(
        &mut self,
        request: &SubmitRequest,
        result: Result<serde_json::Value, TransportError>,
    ) {
        let activity = Activity::Submit {
            port: request.port.clone(),
        };
        match result {
            Ok(ack) => {
                self.activity.push(LogEntry::info(
                    activity,
                    format!("Backend acknowledged submit to {}: {ack}", request.port),
                ));
                if self.error.as_ref().is_some_and(SessionError::is_submit) {
                    self.error = None;
                }
            }
            Err(err) => {
                self.activity.push(LogEntry::error(
                    activity,
                    format!("Submit to {} failed: {err}", request.port),
                ));
                self.error = Some(SessionError::SubmitFailed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::REGISTER_COUNT;

    fn port(name: &str) -> Port {
        Port::new(name).unwrap()
    }

    fn listed(names: &[&str]) -> Session {
        let mut session = Session::default();
        session.apply_directory(Ok(names.iter().map(|n| port(n)).collect()));
        session
    }

    fn ready_on(name: &str) -> (Session, ReadTicket) {
        let mut session = listed(&["COM3", "COM4"]);
        session.select(&port(name)).unwrap();
        let ticket = session.confirm().unwrap();
        let snapshot = RegisterSnapshot::new([12, 13, 14, 15, 16, 17, 18, 19]);
        assert_eq!(
            session.apply_read(&ticket, Ok(snapshot)),
            ReadSettlement::Loaded
        );
        (session, ticket)
    }

    #[test]
    fn test_directory_lists_ports() {
        let session = listed(&["COM3", "COM4"]);
        assert_eq!(session.ports(), &[port("COM3"), port("COM4")]);
        assert_eq!(session.error(), None);
        assert_eq!(session.phase(), Phase::Unselected);
    }

    #[test]
    fn test_empty_directory_reports_no_ports() {
        let session = listed(&[]);
        assert!(session.ports().is_empty());
        assert_eq!(session.error(), Some(&SessionError::DirectoryEmpty));
        assert_eq!(
            session.error().unwrap().to_string(),
            "No serial ports found"
        );
    }

    #[test]
    fn test_unreachable_directory_is_distinct() {
        let mut session = listed(&["COM3"]);
        session.apply_directory(Err(TransportError::Unreachable("refused".into())));
        assert!(session.ports().is_empty());
        assert_eq!(session.error(), Some(&SessionError::DirectoryUnreachable));

        session.apply_directory(Ok(vec![port("COM3")]));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_directory_success_keeps_unrelated_errors() {
        let (mut session, _) = ready_on("COM3");
        let again = session.confirm().unwrap();
        session.apply_read(&again, Err(TransportError::Status(500)));
        session.apply_directory(Ok(vec![port("COM3")]));
        assert_eq!(session.error(), Some(&SessionError::ReadFailed));
    }

    #[test]
    fn test_confirm_without_selection_is_noop() {
        let mut session = listed(&["COM3"]);
        let before = format!("{session:?}");
        assert!(session.confirm().is_none());
        assert_eq!(format!("{session:?}"), before);
        assert_eq!(session.phase(), Phase::Unselected);
    }

    #[test]
    fn test_select_rejects_unknown_ports() {
        let mut session = listed(&["COM3"]);
        assert_eq!(
            session.select(&port("COM9")),
            Err(SessionError::UnknownPort(port("COM9")))
        );
        assert_eq!(session.selection(), None);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_select_confirm_read() {
        let mut session = listed(&["COM3", "COM4"]);
        session.select(&port("COM3")).unwrap();
        assert_eq!(session.phase(), Phase::Selected);

        let ticket = session.confirm().unwrap();
        assert_eq!(ticket.port, port("COM3"));
        assert_eq!(session.confirmed_port(), Some(&port("COM3")));
        assert_eq!(session.phase(), Phase::Confirmed { pending_read: true });
        assert!(session.is_read_pending());

        let snapshot = RegisterSnapshot::new([12, 13, 14, 15, 16, 17, 18, 19]);
        session.apply_read(&ticket, Ok(snapshot));
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.snapshot(), Some(&snapshot));
        assert_eq!(session.snapshot().unwrap().values.len(), REGISTER_COUNT);
        assert_eq!(session.edits().entries().len(), REGISTER_COUNT);
        assert!(session.edits().entries().iter().all(String::is_empty));
        assert_eq!(session.placeholder(0), Some(12));
        assert_eq!(session.placeholder(7), Some(19));
    }

    #[test]
    fn test_confirm_clears_error() {
        let mut session = listed(&["COM3"]);
        session.select(&port("COM3")).unwrap();
        let ticket = session.confirm().unwrap();
        session.apply_read(&ticket, Err(TransportError::Status(502)));
        assert!(session.error().is_some());

        session.confirm().unwrap();
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_confirm_twice_issues_two_reads() {
        let mut session = listed(&["COM3"]);
        session.select(&port("COM3")).unwrap();
        let first = session.confirm().unwrap();
        let second = session.confirm().unwrap();
        assert_eq!(first.port, second.port);
        assert_eq!(second.generation, first.generation + 1);
    }

    #[test]
    fn test_stale_read_is_discarded() {
        let mut session = listed(&["COM3", "COM4"]);
        session.select(&port("COM3")).unwrap();
        let old = session.confirm().unwrap();
        session.select(&port("COM4")).unwrap();
        let new = session.confirm().unwrap();

        let late = RegisterSnapshot::new([1; REGISTER_COUNT]);
        assert_eq!(session.apply_read(&old, Ok(late)), ReadSettlement::Stale);
        assert_eq!(session.snapshot(), None);
        assert_eq!(session.phase(), Phase::Confirmed { pending_read: true });

        let fresh = RegisterSnapshot::new([2; REGISTER_COUNT]);
        assert_eq!(session.apply_read(&new, Ok(fresh)), ReadSettlement::Loaded);
        assert_eq!(session.snapshot(), Some(&fresh));
        assert_eq!(session.confirmed_port(), Some(&port("COM4")));

        // A duplicate delivery for the settled generation is stale too.
        assert_eq!(session.apply_read(&new, Ok(late)), ReadSettlement::Stale);
        assert_eq!(session.snapshot(), Some(&fresh));
    }

    #[test]
    fn test_read_network_failure_keeps_form() {
        let mut session = listed(&["COM3"]);
        session.select(&port("COM3")).unwrap();
        let ticket = session.confirm().unwrap();
        let outcome =
            session.apply_read(&ticket, Err(TransportError::Unreachable("refused".into())));

        assert_eq!(outcome, ReadSettlement::Failed);
        assert_eq!(
            session.error().map(ToString::to_string).as_deref(),
            Some("Could not connect to backend")
        );
        assert_eq!(session.confirmed_port(), Some(&port("COM3")));
        assert_eq!(session.phase(), Phase::Confirmed { pending_read: false });
        assert!(session.is_form_visible());
        assert_eq!(session.placeholder(0), None);
        assert!(session.edit(0, "5").is_ok());
    }

    #[test]
    fn test_read_failure_keeps_previous_snapshot() {
        let (mut session, _) = ready_on("COM3");
        let previous = *session.snapshot().unwrap();
        let ticket = session.confirm().unwrap();
        session.apply_read(&ticket, Err(TransportError::Decode("no registers".into())));
        assert_eq!(session.error(), Some(&SessionError::ReadFailed));
        assert_eq!(session.snapshot(), Some(&previous));
    }

    #[test]
    fn test_edit_round_trips_raw_text() {
        let (mut session, _) = ready_on("COM3");
        for (index, text) in ["20", "", "1.", "abc"].iter().enumerate() {
            session.edit(index, *text).unwrap();
            assert_eq!(session.edits().get(index), Some(*text));
        }
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(
            session.edit(REGISTER_COUNT, "1"),
            Err(SessionError::IndexOutOfRange(REGISTER_COUNT))
        );
    }

    #[test]
    fn test_edit_and_submit_require_confirmed_port() {
        let mut session = listed(&["COM3"]);
        session.select(&port("COM3")).unwrap();
        assert_eq!(session.edit(0, "1"), Err(SessionError::NotConfirmed));
        assert_eq!(session.submit(), Err(SessionError::NotConfirmed));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_submit_zero_fills_untouched_entries() {
        let (mut session, _) = ready_on("COM3");
        session.edit(0, "20").unwrap();
        let request = session.submit().unwrap();
        assert_eq!(request.port, port("COM3"));
        assert_eq!(request.values, [20, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[test]
    fn test_strict_submit_surfaces_invalid_value() {
        let mut session = Session::new(CoercionPolicy::Strict);
        session.apply_directory(Ok(vec![port("COM3")]));
        session.select(&port("COM3")).unwrap();
        session.confirm().unwrap();
        session.edit(2, "12a").unwrap();

        let err = session.submit().unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidValue {
                index: 2,
                text: "12a".to_string()
            }
        );
        assert_eq!(session.error(), Some(&err));
    }

    #[test]
    fn test_submit_failure_is_surfaced_and_cleared() {
        let (mut session, _) = ready_on("COM3");
        let request = session.submit().unwrap();

        session.apply_submit(&request, Err(TransportError::Status(500)));
        assert_eq!(session.error(), Some(&SessionError::SubmitFailed));
        assert_eq!(session.phase(), Phase::Ready);

        session.apply_submit(&request, Ok(serde_json::json!({"ok": true})));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_reselect_does_not_move_confirmed_port() {
        let (mut session, _) = ready_on("COM3");
        session.select(&port("COM4")).unwrap();
        assert_eq!(session.selection(), Some(&port("COM4")));
        assert_eq!(session.confirmed_port(), Some(&port("COM3")));
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.submit().unwrap().port, port("COM3"));
    }

    #[test]
    fn test_refresh_drops_vanished_selection() {
        let mut session = listed(&["COM3", "COM4"]);
        session.select(&port("COM4")).unwrap();
        session.apply_directory(Ok(vec![port("COM3")]));
        assert_eq!(session.selection(), None);
        assert_eq!(session.phase(), Phase::Unselected);
    }

    #[test]
    fn test_activity_records_outcomes() {
        let (mut session, _) = ready_on("COM3");
        let request = session.submit().unwrap();
        session.apply_submit(&request, Err(TransportError::Unreachable("down".into())));
        let last = session.activity().tail(1)[0].clone();
        assert_eq!(last.level, crate::core::logs::LogLevel::Error);
        assert_eq!(last.activity, Activity::Submit { port: port("COM3") });
    }
}
