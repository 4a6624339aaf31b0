/// Core workflow logic for regpanel
///
/// This module contains the UI-independent parts of the client:
/// - The session state machine and its error kinds
/// - The operator edit buffer and value coercion
/// - The message bus and worker thread that run backend calls
/// - The session activity log
///
/// Front ends (TUI, one-shot CLI) drive a `Session` either through the
/// `Controller` or by calling `runtime::execute` directly.
pub mod bus;
pub mod controller;
pub mod edit;
pub mod logs;
pub mod runtime;
pub mod session;

pub use bus::{Bus, CoreToUi, ReadTicket, SubmitRequest, UiToCore};
pub use controller::Controller;
pub use edit::{CoercionPolicy, EditBuffer};
pub use runtime::{execute, join_core, run_core_thread, spawn_core};
pub use session::{Phase, ReadSettlement, Session, SessionError};
