/// Core worker thread
///
/// Performs the blocking backend calls on behalf of the UI thread. Requests
/// are served one at a time in arrival order; every request is answered with
/// exactly one `CoreToUi` outcome, except those still queued when `Quit`
/// arrives, which are dropped.
use anyhow::{anyhow, Result};
use std::{
    collections::VecDeque,
    thread::JoinHandle,
    time::{Duration, Instant},
};

use super::bus::{Bus, CoreToUi, UiToCore};
use crate::api::Transport;

/// Run a single request against `transport`. Returns `None` for `Quit`.
pub fn execute<T: Transport + ?Sized>(transport: &T, request: UiToCore) -> Option<CoreToUi> {
    match request {
        UiToCore::ListPorts => Some(CoreToUi::Directory(transport.list_ports())),
        UiToCore::ReadRegisters(ticket) => {
            let result = transport.read_registers(&ticket.port);
            Some(CoreToUi::Registers { ticket, result })
        }
        UiToCore::SubmitValues(request) => {
            let result = transport.submit_values(&request.port, &request.values);
            Some(CoreToUi::Submitted { request, result })
        }
        UiToCore::Quit => None,
    }
}

/// Serve requests from `ui_rx` until `Quit` arrives or the UI side hangs up.
pub fn run_core_thread<T: Transport>(
    transport: T,
    ui_rx: flume::Receiver<UiToCore>,
    core_tx: flume::Sender<CoreToUi>,
) -> Result<()> {
    let mut backlog = VecDeque::new();
    loop {
        let request = match backlog.pop_front() {
            Some(request) => request,
            None => match ui_rx.recv() {
                Ok(request) => request,
                Err(_) => break,
            },
        };
        // Quit overtakes anything still waiting behind it.
        backlog.extend(ui_rx.try_iter());
        let quitting = matches!(request, UiToCore::Quit)
            || backlog.iter().any(|r| matches!(r, UiToCore::Quit));
        if quitting {
            let dropped = backlog
                .iter()
                .chain(std::iter::once(&request))
                .filter(|r| !matches!(r, UiToCore::Quit))
                .count();
            log::info!("Received quit signal, dropping {dropped} queued request(s)");
            core_tx
                .send(CoreToUi::Quit)
                .map_err(|err| anyhow!("Failed to send Quit to UI: {err}"))?;
            return Ok(());
        }

        log::debug!("Core received {request:?}");
        if let Some(outcome) = execute(&transport, request) {
            core_tx
                .send(outcome)
                .map_err(|err| anyhow!("Failed to send outcome to UI: {err}"))?;
        }
    }

    log::info!("UI channel closed, core worker exiting");
    Ok(())
}

/// Wait up to `timeout` for the core worker to finish. A worker still stuck in
/// a backend call after that is left detached. Returns whether it finished.
pub fn join_core(handle: JoinHandle<Result<()>>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            log::warn!("Core worker still busy after {timeout:?}, leaving it detached");
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::warn!("Core worker ended with error: {err}"),
        Err(_) => log::error!("Core worker panicked"),
    }
    true
}

/// Start the core worker on its own thread and return the UI side of the bus.
pub fn spawn_core<T: Transport + 'static>(transport: T) -> Result<(Bus, JoinHandle<Result<()>>)> {
    let (ui_tx, ui_rx) = flume::unbounded();
    let (core_tx, core_rx) = flume::unbounded();

    let handle = std::thread::Builder::new()
        .name("regpanel-core".to_string())
        .spawn(move || run_core_thread(transport, ui_rx, core_tx))
        .map_err(|err| anyhow!("Failed to spawn core thread: {err}"))?;

    Ok((Bus::new(core_rx, ui_tx), handle))
}
