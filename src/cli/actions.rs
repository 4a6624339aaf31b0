use anyhow::{anyhow, Result};
use clap::ArgMatches;
use serde::Serialize;

use super::config::ClientConfig;
use crate::{
    api::{HttpTransport, Transport},
    core::{execute, CoreToUi, Session, SubmitRequest, UiToCore},
    protocol::{Port, RegisterSnapshot, REGISTER_COUNT},
};

/// Runs one workflow step at a time against a transport, on the calling
/// thread, through the same session transitions the TUI uses.
pub struct OneShot<'a, T: Transport + ?Sized> {
    transport: &'a T,
    session: Session,
}

impl<'a, T: Transport + ?Sized> OneShot<'a, T> {
    pub fn new(transport: &'a T, session: Session) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn run(&mut self, request: UiToCore) -> Option<CoreToUi> {
        let outcome = execute(self.transport, request)?;
        self.session.apply(outcome.clone());
        Some(outcome)
    }

    fn check(&self) -> Result<()> {
        match self.session.error() {
            Some(err) => Err(anyhow!("{err}")),
            None => Ok(()),
        }
    }

    pub fn list_ports(&mut self) -> Result<Vec<Port>> {
        self.run(UiToCore::ListPorts);
        self.check()?;
        Ok(self.session.ports().to_vec())
    }

    /// List ports, select `port` and confirm it. The confirm read is applied
    /// to the session; its failure is returned as an error.
    pub fn confirm(&mut self, port: &Port) -> Result<()> {
        self.list_ports()?;
        self.session
            .select(port)
            .map_err(|err| anyhow!("{err} (backend lists: {:?})", self.session.ports()))?;
        let ticket = self
            .session
            .confirm()
            .ok_or_else(|| anyhow!("Nothing selected"))?;
        self.run(UiToCore::ReadRegisters(ticket));
        self.check()
    }

    pub fn read(&mut self, port: &Port) -> Result<RegisterSnapshot> {
        self.confirm(port)?;
        self.session
            .snapshot()
            .copied()
            .ok_or_else(|| anyhow!("No registers read from {port}"))
    }

    /// Confirm `port`, fill the edit buffer from `values` and submit it.
    /// A failed confirm read is logged but does not stop the submit.
    pub fn submit(
        &mut self,
        port: &Port,
        values: &[String],
    ) -> Result<(SubmitRequest, serde_json::Value)> {
        if values.len() > REGISTER_COUNT {
            return Err(anyhow!(
                "Expected at most {REGISTER_COUNT} values, got {}",
                values.len()
            ));
        }

        if let Err(err) = self.confirm(port) {
            if self.session.confirmed_port() != Some(port) {
                return Err(err);
            }
            log::warn!("Submitting without current register values: {err}");
            self.session.clear_error();
        }

        for (index, text) in values.iter().enumerate() {
            self.session.edit(index, text.as_str())?;
        }
        let request = self.session.submit()?;

        match self.run(UiToCore::SubmitValues(request)) {
            Some(CoreToUi::Submitted {
                request,
                result: Ok(ack),
            }) => Ok((request, ack)),
            _ => {
                self.check()?;
                Err(anyhow!("Submit produced no acknowledgement"))
            }
        }
    }
}

#[derive(Serialize)]
struct RegisterOutput<'a> {
    port: &'a Port,
    registers: Vec<RegisterLine>,
}

#[derive(Serialize)]
struct RegisterLine {
    index: usize,
    setting: String,
    value: u16,
}

#[derive(Serialize)]
struct SubmitOutput<'a> {
    port: &'a Port,
    values: &'a [u16],
    ack: &'a serde_json::Value,
}

fn register_lines(snapshot: &RegisterSnapshot) -> Vec<RegisterLine> {
    snapshot
        .iter()
        .enumerate()
        .map(|(index, (setting, value))| RegisterLine {
            index,
            setting: setting.to_string(),
            value,
        })
        .collect()
}

fn parse_port(name: &str) -> Result<Port> {
    name.parse::<Port>().map_err(|err| anyhow!("{err}"))
}

/// Run the one-shot action selected on the command line, if any. Returns
/// `Ok(false)` when no one-shot flag was given.
pub fn run_one_shot_actions(matches: &ArgMatches, config: &ClientConfig) -> Result<bool> {
    let want_json = matches.get_flag("json");
    let transport = HttpTransport::new(&config.backend_url, config.timeout());
    let mut one_shot = OneShot::new(&transport, Session::new(config.coercion));

    if matches.get_flag("list-ports") {
        let ports = one_shot.list_ports()?;
        if want_json {
            println!("{}", serde_json::to_string_pretty(&ports)?);
        } else {
            for port in &ports {
                println!("{port}");
            }
        }
        return Ok(true);
    }

    if let Some(name) = matches.get_one::<String>("read") {
        let port = parse_port(name)?;
        let snapshot = one_shot.read(&port)?;
        let registers = register_lines(&snapshot);
        if want_json {
            let out = RegisterOutput {
                port: &port,
                registers,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            for line in registers {
                println!("{:>2} {:<24} {}", line.index, line.setting, line.value);
            }
        }
        return Ok(true);
    }

    if let Some(name) = matches.get_one::<String>("submit") {
        let port = parse_port(name)?;
        let values: Vec<String> = matches
            .get_many::<String>("values")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        let (request, ack) = one_shot.submit(&port, &values)?;
        if want_json {
            let out = SubmitOutput {
                port: &request.port,
                values: &request.values,
                ack: &ack,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("Sent {:?} to {}", request.values, request.port);
            println!("Backend replied: {ack}");
        }
        return Ok(true);
    }

    Ok(false)
}
