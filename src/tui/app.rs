use anyhow::Result;
use chrono::{DateTime, Local};

use crate::{
    core::{Controller, Session},
    protocol::REGISTER_COUNT,
    tui::input::Action,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Ports,
    Form,
}

pub struct App {
    pub controller: Controller,
    pub focus: Focus,
    /// Highlighted row in the port list.
    pub port_cursor: usize,
    /// Highlighted register in the edit form.
    pub field_cursor: usize,
    pub last_refresh: Option<DateTime<Local>>,
}

impl App {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller,
            focus: Focus::Ports,
            port_cursor: 0,
            field_cursor: 0,
            last_refresh: None,
        }
    }

    pub fn session(&self) -> &Session {
        self.controller.session()
    }

    /// Request a new port listing.
    pub fn refresh(&mut self) -> Result<()> {
        if self.controller.refresh_ports()? {
            self.last_refresh = Some(Local::now());
        }
        Ok(())
    }

    /// Apply finished backend calls. The port cursor follows the selection
    /// when the listing changes under it.
    pub fn sync(&mut self) -> Result<()> {
        self.controller.pump()?;
        let session = self.session();
        let count = session.ports().len();
        let anchored = session
            .selection()
            .and_then(|selected| session.ports().iter().position(|p| p == selected));
        if let Some(index) = anchored {
            self.port_cursor = index;
        } else if count == 0 {
            self.port_cursor = 0;
        } else if self.port_cursor >= count {
            self.port_cursor = count - 1;
        }
        if !self.session().is_form_visible() {
            self.focus = Focus::Ports;
        }
        Ok(())
    }

    fn select_under_cursor(&mut self) {
        let Some(port) = self.session().ports().get(self.port_cursor).cloned() else {
            return;
        };
        if let Err(err) = self.controller.select(&port) {
            log::warn!("Cannot select {port}: {err}");
        }
    }

    /// Move down. With nothing selected yet, the first move selects the
    /// highlighted port instead of skipping past it.
    pub fn next(&mut self) {
        match self.focus {
            Focus::Ports => {
                let count = self.session().ports().len();
                if count > 0 {
                    if self.session().selection().is_some() {
                        self.port_cursor = (self.port_cursor + 1) % count;
                    }
                    self.select_under_cursor();
                }
            }
            Focus::Form => self.field_cursor = (self.field_cursor + 1) % REGISTER_COUNT,
        }
    }

    pub fn prev(&mut self) {
        match self.focus {
            Focus::Ports => {
                let count = self.session().ports().len();
                if count > 0 {
                    if self.session().selection().is_some() {
                        self.port_cursor = self.port_cursor.checked_sub(1).unwrap_or(count - 1);
                    }
                    self.select_under_cursor();
                }
            }
            Focus::Form => {
                self.field_cursor = self
                    .field_cursor
                    .checked_sub(1)
                    .unwrap_or(REGISTER_COUNT - 1)
            }
        }
    }

    /// Confirm the selection. Does nothing until a port is selected.
    pub fn confirm(&mut self) -> Result<()> {
        if self.controller.confirm()? {
            self.focus = Focus::Form;
        }
        Ok(())
    }

    pub fn set_focus(&mut self, focus: Focus) {
        if focus == Focus::Form && !self.session().is_form_visible() {
            return;
        }
        self.focus = focus;
    }

    fn edit_current(&mut self, update: impl FnOnce(&mut String)) {
        let index = self.field_cursor;
        let mut text = self
            .session()
            .edits()
            .get(index)
            .unwrap_or_default()
            .to_string();
        update(&mut text);
        if let Err(err) = self.controller.edit(index, text) {
            log::warn!("Edit rejected: {err}");
        }
    }

    /// Handle one operator action. Returns `Ok(true)` when the app should quit.
    pub fn handle(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::Quit => return Ok(true),
            Action::ToggleFocus => match self.focus {
                Focus::Ports => self.set_focus(Focus::Form),
                Focus::Form => self.set_focus(Focus::Ports),
            },
            Action::FocusPorts => self.set_focus(Focus::Ports),
            Action::FocusForm => self.set_focus(Focus::Form),
            Action::MoveNext => self.next(),
            Action::MovePrev => self.prev(),
            Action::Refresh => self.refresh()?,
            Action::Confirm => self.confirm()?,
            Action::Submit => {
                self.controller.submit()?;
            }
            Action::Input(c) => self.edit_current(|text| text.push(c)),
            Action::Backspace => self.edit_current(|text| {
                text.pop();
            }),
            Action::ClearField => self.edit_current(String::clear),
            Action::ClearError => self.controller.session_mut().clear_error(),
            Action::None => {}
        }
        Ok(false)
    }
}
