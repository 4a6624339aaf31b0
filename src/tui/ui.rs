use ratatui::{prelude::*, widgets::*};
use strum::IntoEnumIterator;

use crate::{
    core::{logs::LogLevel, Phase},
    protocol::RegisterSetting,
    tui::app::{App, Focus},
};

const ACCENT: Color = Color::Rgb(0, 150, 0);
const ACTIVITY_ROWS: u16 = 6;

fn panel(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_type(BorderType::Plain);
    if focused {
        block.style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
    } else {
        block
    }
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::Rgb(0, 100, 0))
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

pub fn render_ui(f: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Min(10),
            Constraint::Length(3), // status
            Constraint::Length(ACTIVITY_ROWS + 2),
            Constraint::Length(1), // key help
        ])
        .split(f.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(main_chunks[1]);

    let title = Paragraph::new("Register Panel")
        .alignment(Alignment::Center)
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    f.render_widget(title, main_chunks[0]);

    render_ports(f, app, body[0]);
    render_form(f, app, body[1]);
    render_status(f, app, main_chunks[2]);
    render_activity(f, app, main_chunks[3]);

    let help = match app.focus {
        Focus::Ports => "↑/↓ select  Enter confirm  r refresh  Tab form  Ctrl+S submit  x clear error  q quit",
        Focus::Form => "↑/↓ field  type to edit  Del clear  Esc ports  Ctrl+S submit  Ctrl+C quit",
    };
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        main_chunks[4],
    );
}

fn render_ports(f: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let items: Vec<ListItem> = session
        .ports()
        .iter()
        .map(|port| {
            let marker = if session.confirmed_port() == Some(port) {
                "● "
            } else if session.selection() == Some(port) {
                "○ "
            } else {
                "  "
            };
            ListItem::new(format!("{marker}{port}"))
        })
        .collect();

    let mut title = String::from("Serial ports");
    if let Some(when) = app.last_refresh {
        title.push_str(&format!(" ({})", when.format("%H:%M:%S")));
    }
    let list = List::new(items)
        .block(panel(&title, app.focus == Focus::Ports))
        .highlight_style(highlight());

    let mut state = ListState::default();
    if session.selection().is_some() {
        state.select(Some(app.port_cursor));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let focused = app.focus == Focus::Form;

    let Some(port) = session.confirmed_port() else {
        let hint = Paragraph::new("Select a port and press Enter to read its registers")
            .wrap(Wrap { trim: true })
            .block(panel("Registers", false));
        f.render_widget(hint, area);
        return;
    };

    let rows: Vec<Row> = RegisterSetting::iter()
        .enumerate()
        .map(|(index, setting)| {
            let current = session
                .placeholder(index)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            let text = session.edits().get(index).unwrap_or_default();
            let editing = focused && index == app.field_cursor;
            let edit_cell = if text.is_empty() && !editing {
                Cell::from(current.clone()).style(Style::default().fg(Color::DarkGray))
            } else if editing {
                Cell::from(format!("{text}▏"))
            } else {
                Cell::from(text.to_string())
            };
            Row::new(vec![Cell::from(setting.to_string()), Cell::from(current), edit_cell])
        })
        .collect();

    let title = match session.phase() {
        Phase::Confirmed { pending_read: true } => format!("Registers on {port} (reading…)"),
        _ => format!("Registers on {port}"),
    };
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Percentage(20),
            Constraint::Percentage(35),
        ],
    )
    .header(
        Row::new(vec!["Setting", "Device", "New value"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(panel(&title, focused))
    .row_highlight_style(highlight());

    let mut state = TableState::default();
    if focused {
        state.select(Some(app.field_cursor));
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let line = match session.error() {
        Some(err) => Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => {
            let phase = match session.phase() {
                Phase::Unselected => "No port selected".to_string(),
                Phase::Selected => "Port selected, press Enter to confirm".to_string(),
                Phase::Confirmed { pending_read: true } => "Reading registers…".to_string(),
                Phase::Confirmed {
                    pending_read: false,
                } => "Port confirmed, registers unavailable".to_string(),
                Phase::Ready => "Ready".to_string(),
            };
            Line::from(Span::styled(phase, Style::default().fg(ACCENT)))
        }
    };
    f.render_widget(Paragraph::new(line).block(panel("Status", false)), area);
}

fn render_activity(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .session()
        .activity()
        .tail(ACTIVITY_ROWS as usize)
        .iter()
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Info => Color::Gray,
                LogLevel::Warning => Color::Yellow,
                LogLevel::Error => Color::Red,
            };
            ListItem::new(format!(
                "{} {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.message
            ))
            .style(Style::default().fg(color))
        })
        .collect();
    f.render_widget(List::new(items).block(panel("Activity", false)), area);
}
