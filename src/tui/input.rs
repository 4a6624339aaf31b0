use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::Focus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleFocus,
    FocusPorts,
    FocusForm,
    MoveNext,
    MovePrev,
    Refresh,
    Confirm,
    Submit,
    Input(char),
    Backspace,
    ClearField,
    ClearError,
    None,
}

/// Map a key press to an action. The port list and the edit form share the
/// arrow keys; printable characters only edit while the form has focus.
pub fn map_key(key: KeyEvent, focus: Focus) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            KeyCode::Char('s') => Action::Submit,
            KeyCode::Char('r') => Action::Refresh,
            _ => Action::None,
        };
    }

    match (focus, key.code) {
        (_, KeyCode::Tab) => Action::ToggleFocus,
        (_, KeyCode::F(5)) => Action::Refresh,

        (Focus::Ports, KeyCode::Char('q') | KeyCode::Esc) => Action::Quit,
        (Focus::Ports, KeyCode::Up | KeyCode::Char('k')) => Action::MovePrev,
        (Focus::Ports, KeyCode::Down | KeyCode::Char('j')) => Action::MoveNext,
        (Focus::Ports, KeyCode::Enter) => Action::Confirm,
        (Focus::Ports, KeyCode::Char('r')) => Action::Refresh,
        (Focus::Ports, KeyCode::Char('s')) => Action::Submit,
        (Focus::Ports, KeyCode::Char('x')) => Action::ClearError,
        (Focus::Ports, KeyCode::Right | KeyCode::Char('l')) => Action::FocusForm,

        (Focus::Form, KeyCode::Esc | KeyCode::Left) => Action::FocusPorts,
        (Focus::Form, KeyCode::Up) => Action::MovePrev,
        (Focus::Form, KeyCode::Down | KeyCode::Enter) => Action::MoveNext,
        (Focus::Form, KeyCode::Backspace) => Action::Backspace,
        (Focus::Form, KeyCode::Delete) => Action::ClearField,
        (Focus::Form, KeyCode::Char(c)) => Action::Input(c),

        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_port_list_keys() {
        assert_eq!(map_key(press(KeyCode::Char('q')), Focus::Ports), Action::Quit);
        assert_eq!(map_key(press(KeyCode::Enter), Focus::Ports), Action::Confirm);
        assert_eq!(map_key(press(KeyCode::Down), Focus::Ports), Action::MoveNext);
        assert_eq!(map_key(press(KeyCode::Char('r')), Focus::Ports), Action::Refresh);
    }

    #[test]
    fn test_form_keys_edit_text() {
        assert_eq!(
            map_key(press(KeyCode::Char('q')), Focus::Form),
            Action::Input('q')
        );
        assert_eq!(map_key(press(KeyCode::Char('7')), Focus::Form), Action::Input('7'));
        assert_eq!(map_key(press(KeyCode::Esc), Focus::Form), Action::FocusPorts);
        assert_eq!(map_key(press(KeyCode::Enter), Focus::Form), Action::MoveNext);
    }

    #[test]
    fn test_control_chords_work_everywhere() {
        let submit = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let quit = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for focus in [Focus::Ports, Focus::Form] {
            assert_eq!(map_key(submit, focus), Action::Submit);
            assert_eq!(map_key(quit, focus), Action::Quit);
        }
    }
}
