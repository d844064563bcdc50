use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane, InputMode, TextInput};
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.on_tick().await,
    }
    // Pick up a finished extraction without waiting for the next tick
    app.poll_extract().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_challenge {
        handle_challenge(app, key);
        return;
    }

    if app.session.is_modal_open() {
        handle_modal(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

/// Shared line-editing keys; returns true when the buffer changed
fn edit_text(input: &mut TextInput, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) => {
            input.insert(c);
            true
        }
        KeyCode::Backspace => {
            input.backspace();
            true
        }
        KeyCode::Delete => {
            input.delete();
            true
        }
        KeyCode::Left => {
            input.left();
            false
        }
        KeyCode::Right => {
            input.right();
            false
        }
        KeyCode::Home => {
            input.home();
            false
        }
        KeyCode::End => {
            input.end();
            false
        }
        _ => false,
    }
}

fn handle_challenge(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_challenge(),
        KeyCode::Enter => app.answer_challenge(),
        _ => {
            edit_text(&mut app.challenge_input, key);
        }
    }
}

fn handle_modal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => app.close_blueprint(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_down(10),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::Char('g') => app.modal_scroll = 0,
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Focus cycling
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),

        // Actions
        KeyCode::Char('s') => app.submit(),
        KeyCode::Char('v') => app.open_challenge(),
        KeyCode::Char('b') => app.open_blueprint(),
        KeyCode::Char('t') | KeyCode::Char('g') => app.back_to_top(),
        KeyCode::Char('i') | KeyCode::Char('e') | KeyCode::Char('/') => match app.focus {
            FocusPane::Form => app.begin_field_edit(),
            _ => {
                app.focus = FocusPane::Description;
                app.input_mode = InputMode::Editing;
            }
        },

        KeyCode::Enter => match app.focus {
            FocusPane::Description => app.submit(),
            FocusPane::Roles => app.focus = FocusPane::Features,
            FocusPane::Features => app.focus = FocusPane::Form,
            FocusPane::Form => app.begin_field_edit(),
        },

        // Jump straight to a role
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(digit) = c.to_digit(10) {
                app.select_role(digit as usize - 1);
            }
        }

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Roles => app.next_role(),
            FocusPane::Features => app.next_feature(),
            FocusPane::Form => app.field_down(),
            FocusPane::Description => {}
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Roles => app.prev_role(),
            FocusPane::Features => app.prev_feature(),
            FocusPane::Form => app.field_up(),
            FocusPane::Description => {}
        },
        KeyCode::Char('l') | KeyCode::Right => {
            if app.focus == FocusPane::Roles {
                app.next_role();
            }
        }
        KeyCode::Char('h') | KeyCode::Left => {
            if app.focus == FocusPane::Roles {
                app.prev_role();
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    if app.editing_field.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => app.end_field_edit(),
            KeyCode::Tab => {
                app.end_field_edit();
                app.field_down();
            }
            _ => {
                if edit_text(&mut app.field_input, key) {
                    app.sync_field();
                }
            }
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit(),
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus = app.focus.next();
        }
        _ => {
            edit_text(&mut app.description, key);
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let hit = |area: Option<Rect>| area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        // While the modal is open the wheel only ever moves the modal
        MouseEventKind::ScrollDown => {
            if app.scroll_locked || hit(app.results_area) {
                app.scroll_down(WHEEL_LINES);
            }
        }
        MouseEventKind::ScrollUp => {
            if app.scroll_locked || hit(app.results_area) {
                app.scroll_up(WHEEL_LINES);
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if app.show_challenge {
                return;
            }

            if app.session.is_modal_open() {
                if !hit(app.modal_area) {
                    app.close_blueprint();
                }
                return;
            }

            if hit(app.top_button_area) {
                app.back_to_top();
                return;
            }

            if hit(app.blueprint_hint_area) {
                app.open_blueprint();
                return;
            }

            if let Some(&(_, index)) = app
                .role_tab_areas
                .iter()
                .find(|(area, _)| point_in_rect(x, y, *area))
            {
                app.focus = FocusPane::Roles;
                app.input_mode = InputMode::Normal;
                app.select_role(index);
                return;
            }

            if let Some(area) = app.features_area.filter(|r| point_in_rect(x, y, *r)) {
                // Skip the top border
                if y > area.y {
                    let row = (y - area.y - 1) as usize;
                    app.focus = FocusPane::Features;
                    app.input_mode = InputMode::Normal;
                    app.select_feature(app.features_state.offset() + row);
                }
                return;
            }

            if hit(app.description_area) {
                app.editing_field = None;
                app.focus = FocusPane::Description;
                app.input_mode = InputMode::Editing;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use minibuilder_core::{Blueprint, Config, Effect, Event, Session, VerificationToken};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn app_with_results() -> App {
        let mut app = App::new(&Config {
            endpoint: "http://127.0.0.1:9/extract".to_string(),
            ..Config::default()
        })
        .unwrap();
        let mut session = Session::new();
        session.update(Event::Verified(VerificationToken::new("tok")));
        session.update(Event::Submit { description: "shop".to_string() });
        let blueprint = Blueprint::from_json(
            r#"{"App Name":"Shop","Roles":[
                {"Role":"Customer","Features":[
                    {"Entity":"Cart","Feature":"Edit Cart","Input Fields":["Item","Qty"],"Buttons":["Add"]},
                    {"Entity":"Order","Feature":"Place Order","Input Fields":["Address"],"Buttons":["Buy"]}]},
                {"Role":"Admin","Features":[
                    {"Entity":"Product","Feature":"Manage Products","Input Fields":["Name"],"Buttons":["Save"]}]}]}"#,
        )
        .unwrap();
        let effects = session.update(Event::Completed { seq: session.seq(), result: Ok(blueprint) });
        app.session = session;
        app.apply_effects(effects);
        app
    }

    #[test]
    fn test_typing_into_field_updates_store() {
        let mut app = app_with_results();
        app.focus = FocusPane::Form;
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Editing);
        for c in "socks".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Backspace));
        handle_key(&mut app, key(KeyCode::Esc));

        let keys = app.session.current_field_keys();
        assert_eq!(app.session.field_value(&keys[0]), "sock");
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_q_inside_description_is_text() {
        let mut app = app_with_results();
        app.focus = FocusPane::Description;
        app.input_mode = InputMode::Editing;
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.description.as_str(), "q");
    }

    #[test]
    fn test_modal_keys_do_not_leak_to_background() {
        let mut app = app_with_results();
        handle_key(&mut app, key(KeyCode::Char('b')));
        assert!(app.session.is_modal_open());

        handle_key(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.session.selection().role_index(), 0);

        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.session.is_modal_open());
        assert!(!app.scroll_locked);
    }

    #[test]
    fn test_click_outside_modal_dismisses() {
        let mut app = app_with_results();
        app.open_blueprint();
        app.modal_area = Some(Rect::new(10, 5, 40, 20));

        handle_mouse(&mut app, click(12, 8));
        assert!(app.session.is_modal_open());

        handle_mouse(&mut app, click(2, 2));
        assert!(!app.session.is_modal_open());
    }

    #[test]
    fn test_click_blueprint_hint_opens_modal() {
        let mut app = app_with_results();
        app.blueprint_hint_area = Some(Rect::new(1, 29, 24, 1));
        handle_mouse(&mut app, click(5, 29));
        assert!(app.session.is_modal_open());
        assert!(app.scroll_locked);
    }

    #[test]
    fn test_wheel_is_suppressed_behind_modal() {
        let mut app = app_with_results();
        app.results_area = Some(Rect::new(0, 0, 80, 30));
        app.results_height = 2;
        app.results_content_lines = 30;
        app.modal_content_lines = 30;
        app.open_blueprint();

        let wheel = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 1,
            row: 1,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut app, wheel);
        assert_eq!(app.results_scroll, 0);
        assert_eq!(app.modal_scroll, WHEEL_LINES);
    }

    #[test]
    fn test_click_role_tab_and_feature() {
        let mut app = app_with_results();
        app.role_tab_areas = vec![(Rect::new(7, 3, 10, 1), 0), (Rect::new(18, 3, 7, 1), 1)];
        app.features_area = Some(Rect::new(0, 4, 28, 10));

        handle_mouse(&mut app, click(20, 3));
        assert_eq!(app.session.current_role().unwrap().name, "Admin");

        handle_mouse(&mut app, click(8, 3));
        handle_mouse(&mut app, click(3, 6));
        assert_eq!(app.session.current_feature().unwrap().name, "Place Order");
        assert_eq!(app.focus, FocusPane::Features);

        // Rows past the list are ignored
        handle_mouse(&mut app, click(3, 12));
        assert_eq!(app.session.selection().feature_index(), 1);
    }

    #[test]
    fn test_number_keys_select_roles() {
        let mut app = app_with_results();
        app.select_feature(1);
        handle_key(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.session.selection().role_index(), 1);
        assert_eq!(app.session.selection().feature_index(), 0);
        handle_key(&mut app, key(KeyCode::Char('9')));
        assert_eq!(app.session.selection().role_index(), 1);
    }

    #[test]
    fn test_challenge_popup_captures_keys() {
        let mut app = app_with_results();
        handle_key(&mut app, key(KeyCode::Char('v')));
        assert!(app.show_challenge);
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.challenge_input.as_str(), "q");
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.show_challenge);
    }

    #[test]
    fn test_focus_moves_only_on_results_ready() {
        let mut app = app_with_results();
        app.focus = FocusPane::Description;
        app.apply_effects(vec![]);
        assert_eq!(app.focus, FocusPane::Description);
        app.apply_effects(vec![Effect::ResultsReady]);
        assert_eq!(app.focus, FocusPane::Roles);
    }
}
