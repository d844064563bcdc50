use minibuilder_core::{Blueprint, FieldKey, Phase};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use crate::app::{field_row, to_u16, App, FocusPane, InputMode};

/// Break text into rows of exactly `width` characters (last row may be shorter)
fn chunk_chars(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|row| row.iter().collect()).collect()
}

/// Center a popup of at most `width` x `height` inside `area`
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

fn border_style(focused: bool) -> Style {
    Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray })
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [description_area, status_area, results_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_header(frame, header_area);
    render_description(app, frame, description_area);
    render_status(app, frame, status_area);
    render_results(app, frame, results_area);
    render_footer(app, frame, footer_area);

    // Popups
    if app.session.is_modal_open() {
        render_blueprint_modal(app, frame, area);
    } else {
        app.modal_area = None;
    }
    if app.show_challenge {
        render_challenge(app, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Mini App Builder ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_description(app: &mut App, frame: &mut Frame, area: Rect) {
    app.description_area = Some(area);

    let focused = app.focus == FocusPane::Description;
    let editing = focused && app.input_mode == InputMode::Editing && app.editing_field.is_none();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(" Describe your app ");
    let inner = block.inner(area);
    let width = inner.width as usize;

    if app.description.as_str().is_empty() && !editing {
        let placeholder = Paragraph::new("e.g. a todo app where users add tasks with due dates")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let lines: Vec<Line> = chunk_chars(app.description.as_str(), width)
        .into_iter()
        .map(Line::from)
        .collect();

    // Keep the cursor row visible
    let cursor = app.description.cursor();
    let cursor_row = if width > 0 { to_u16(cursor / width) } else { 0 };
    let scroll = cursor_row.saturating_sub(inner.height.saturating_sub(1));

    let paragraph = Paragraph::new(lines).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);

    if editing && width > 0 {
        let x = inner.x + (cursor % width) as u16;
        let y = inner.y + (cursor_row - scroll);
        frame.set_cursor_position((x, y));
    }
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();

    if app.challenge.is_verified() {
        let remaining = app.challenge.remaining().map(|d| d.as_secs()).unwrap_or(0);
        spans.push(Span::styled(
            format!(" ✔ verified ({}:{:02}) ", remaining / 60, remaining % 60),
            Style::default().fg(Color::Green),
        ));
    } else if app.challenge.is_expired() {
        spans.push(Span::styled(
            " ✘ verification expired, press v ",
            Style::default().fg(Color::Yellow),
        ));
    } else if !app.session.is_pending() {
        spans.push(Span::styled(" ✘ not verified, press v ", Style::default().fg(Color::Yellow)));
    }

    if app.session.is_pending() {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        spans.push(Span::styled(
            format!(" Generating{:<3} ", dots),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    } else if let Some(error) = app.session.error() {
        spans.push(Span::styled(format!(" {} ", error), Style::default().fg(Color::Red).bold()));
    } else if app.session.phase() == Phase::Succeeded {
        spans.push(Span::styled(" Mock UI ready ", Style::default().fg(Color::Green)));
    } else if app.session.can_submit() {
        spans.push(Span::styled(" Press Enter to generate ", Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

const BLUEPRINT_HINT: &str = " b: view blueprint JSON ";

fn render_results(app: &mut App, frame: &mut Frame, area: Rect) {
    app.results_area = Some(area);
    app.features_area = None;
    app.top_button_area = None;
    app.blueprint_hint_area = None;
    app.role_tab_areas.clear();

    let focused = matches!(app.focus, FocusPane::Roles | FocusPane::Features | FocusPane::Form);

    let Some(blueprint) = app.session.blueprint().cloned() else {
        app.results_content_lines = 0;
        let message = if app.session.is_pending() {
            "Building your mock app..."
        } else {
            "Describe an app above, verify with v, then press Enter."
        };
        let placeholder = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).border_style(border_style(focused)));
        frame.render_widget(placeholder, area);
        return;
    };

    let app_name = if blueprint.app_name.is_empty() {
        "Untitled app".to_string()
    } else {
        blueprint.app_name.clone()
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(format!(" {} ", app_name))
        .title_bottom(BLUEPRINT_HINT);

    let hint_width = BLUEPRINT_HINT.chars().count() as u16;
    if area.width > hint_width + 2 && area.height > 1 {
        app.blueprint_hint_area = Some(Rect::new(area.x + 1, area.bottom() - 1, hint_width, 1));
    }

    if app.show_back_to_top() {
        let label = " ↑ top (t) ";
        let label_width = label.chars().count() as u16;
        block = block.title(Line::styled(label, Style::default().fg(Color::Yellow)).right_aligned());
        if area.width > label_width + 2 {
            app.top_button_area = Some(Rect::new(area.right() - label_width - 1, area.y, label_width, 1));
        }
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [summary_area, tabs_area, main_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(inner);

    render_summary(app, frame, summary_area);
    render_role_tabs(app, &blueprint, frame, tabs_area);

    let [features_area, form_area] = Layout::horizontal([
        Constraint::Length(28),
        Constraint::Min(0),
    ])
    .areas(main_area);

    render_features(app, &blueprint, frame, features_area);
    render_form(app, &blueprint, frame, form_area);
}

fn render_summary(app: &App, frame: &mut Frame, area: Rect) {
    let Some(summary) = app.session.summary() else {
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let lines = vec![
        Line::from(vec![Span::styled(" Roles     ", label), Span::raw(summary.roles.join(", "))]),
        Line::from(vec![Span::styled(" Entities  ", label), Span::raw(summary.entities.join(", "))]),
        Line::from(vec![Span::styled(" Features  ", label), Span::raw(summary.features.join(", "))]),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_role_tabs(app: &mut App, blueprint: &Blueprint, frame: &mut Frame, area: Rect) {
    let selected = app.session.selection().role_index();
    let focused = app.focus == FocusPane::Roles;

    let prefix = " Menu: ";
    let mut spans = vec![Span::styled(prefix, Style::default().bold())];
    let mut x = area.x + prefix.chars().count() as u16;

    for (i, role) in blueprint.roles.iter().enumerate() {
        let label = format!(" {} ", role.name);
        let width = to_u16(label.chars().count());
        let style = if i == selected {
            Style::default()
                .bg(if focused { Color::Cyan } else { Color::Blue })
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));

        if x < area.right() {
            app.role_tab_areas.push((Rect::new(x, area.y, width.min(area.right() - x), 1), i));
        }
        x = x.saturating_add(width).saturating_add(1);
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_features(app: &mut App, blueprint: &Blueprint, frame: &mut Frame, area: Rect) {
    app.features_area = Some(area);

    let role = app.session.selection().current_role(Some(blueprint));
    let items: Vec<ListItem> = role
        .map(|r| r.entities().map(|e| ListItem::new(format!(" {} ", e))).collect())
        .unwrap_or_default();

    let feature_idx = app.session.selection().feature_index();
    let selected = (feature_idx < items.len()).then_some(feature_idx);
    app.features_state.select(selected);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Features))
        .title(" Forms ");

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Green)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.features_state);
}

fn render_form(app: &mut App, blueprint: &Blueprint, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Form;
    let selection = app.session.selection();

    let (Some(role), Some(feature)) = (
        selection.current_role(Some(blueprint)),
        selection.current_feature(Some(blueprint)),
    ) else {
        app.results_content_lines = 0;
        let placeholder = Paragraph::new("No feature selected")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).border_style(border_style(focused)));
        frame.render_widget(placeholder, area);
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(format!(" {} ", feature.name));
    let inner = block.inner(area);
    app.results_height = inner.height;

    let box_width = (inner.width as usize).saturating_sub(4);
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_position = None;

    for (i, field) in feature.input_fields.iter().enumerate() {
        let key = FieldKey::for_field(role, feature, field);
        let editing = app.editing_field.as_ref() == Some(&key);
        let value = if editing {
            app.field_input.as_str().to_string()
        } else {
            app.session.field_value(&key).to_string()
        };

        let selected = focused && i == app.field_cursor;
        let label_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let marker = if selected { "▸ " } else { "  " };
        lines.push(Line::from(vec![Span::raw(marker), Span::styled(field.clone(), label_style)]));

        let input_style = if editing {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!(" {:<width$} ", value, width = box_width), input_style),
        ]));
        lines.push(Line::default());

        if editing {
            let row = field_row(i).saturating_add(1);
            let x = inner.x.saturating_add(3).saturating_add(to_u16(app.field_input.cursor()));
            cursor_position = Some((x, row));
        }
    }

    let mut buttons = vec![Span::raw("  ")];
    for button in &feature.buttons {
        buttons.push(Span::styled(
            format!("[ {} ]", button),
            Style::default().bg(Color::Blue).fg(Color::White).bold(),
        ));
        buttons.push(Span::raw(" "));
    }
    lines.push(Line::from(buttons));

    app.results_content_lines = to_u16(lines.len());

    let paragraph = Paragraph::new(lines).block(block).scroll((app.results_scroll, 0));
    frame.render_widget(paragraph, area);

    if let Some((x, row)) = cursor_position {
        if row >= app.results_scroll && row - app.results_scroll < inner.height && x < inner.right() {
            frame.set_cursor_position((x, inner.y + row - app.results_scroll));
        }
    }
}

fn render_blueprint_modal(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(area, area.width / 5 * 4, area.height / 5 * 4);
    app.modal_area = Some(popup_area);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let json = app.blueprint_json().unwrap_or_default();
    let lines: Vec<Line> = json.lines().map(|l| Line::from(l.to_string())).collect();
    app.modal_content_lines = to_u16(lines.len());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Blueprint JSON ")
        .title_bottom(" Esc close · j/k scroll · click outside to dismiss ");

    let paragraph = Paragraph::new(lines).block(block).scroll((app.modal_scroll, 0));
    frame.render_widget(paragraph, popup_area);
}

fn render_challenge(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(area, 46, 9);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let spaced_code: String = app
        .challenge
        .code()
        .chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = vec![
        Line::from(" Type this code to confirm you're human:"),
        Line::default(),
        Line::from(Span::styled(
            format!("   {}", spaced_code),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(vec![Span::raw(" > "), Span::raw(app.challenge_input.as_str().to_string())]),
    ];
    if let Some(feedback) = &app.challenge_feedback {
        lines.push(Line::from(Span::styled(format!(" {}", feedback), Style::default().fg(Color::Red))));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Verification ")
        .title_bottom(" Enter submit · Esc cancel ");
    let inner = block.inner(popup_area);

    frame.render_widget(Paragraph::new(lines).block(block), popup_area);

    let x = inner.x.saturating_add(3).saturating_add(to_u16(app.challenge_input.cursor()));
    let y = inner.y + 4;
    if x < inner.right() && y < inner.bottom() {
        frame.set_cursor_position((x, y));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        vec![Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let hints: Vec<Span> = if app.show_challenge {
        [hint(" Enter ", " verify "), hint(" Esc ", " cancel ")].concat()
    } else if app.session.is_modal_open() {
        [hint(" j/k ", " scroll "), hint(" Esc ", " close ")].concat()
    } else if app.input_mode == InputMode::Editing {
        if app.editing_field.is_some() {
            hint(" Enter/Esc ", " done ")
        } else if app.session.is_pending() {
            hint(" Esc ", " stop typing ")
        } else {
            [hint(" Enter ", " generate "), hint(" Esc ", " stop typing ")].concat()
        }
    } else {
        let mut hints = match app.focus {
            FocusPane::Description => hint(" i ", " edit "),
            FocusPane::Roles => [hint(" h/l ", " role "), hint(" 1-9 ", " jump ")].concat(),
            FocusPane::Features => hint(" j/k ", " form "),
            FocusPane::Form => [hint(" j/k ", " field "), hint(" Enter ", " type ")].concat(),
        };
        hints.extend(hint(" Tab ", " focus "));
        hints.extend(hint(" v ", " verify "));
        if !app.session.is_pending() {
            hints.extend(hint(" s ", " generate "));
        }
        if app.session.blueprint().is_some() {
            hints.extend(hint(" b ", " blueprint "));
        }
        if app.show_back_to_top() {
            hints.extend(hint(" t ", " top "));
        }
        hints.extend(hint(" q ", " quit "));
        hints
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
