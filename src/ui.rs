//! UI rendering functions.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;
use crate::input::{Field, TextField};
use crate::session::{Badge, SolutionOrigin, Stage};

/// Maximum display width for list rows.
pub const LIST_ROW_MAX_WIDTH: usize = 70;

/// Truncates a string to the given display width, appending "..." if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    // Replace newlines with spaces for single-line display
    let single_line: String = s.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();

    if single_line.width() <= max_width {
        return single_line;
    }

    let budget = max_width.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for c in single_line.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Calculate a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Split a text field into spans with the cursor cell highlighted.
pub fn text_field_spans(field: &TextField, focused: bool) -> Vec<Span<'static>> {
    let value = field.value();
    if !focused {
        return vec![Span::raw(value.to_string())];
    }

    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
    let split = value
        .char_indices()
        .nth(field.cursor())
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    let (before, rest) = value.split_at(split);
    let mut chars = rest.chars();
    let (cursor_char, after) = match chars.next() {
        Some(c) => (c.to_string(), chars.as_str().to_string()),
        None => (" ".to_string(), String::new()),
    };

    vec![
        Span::raw(before.to_string()),
        Span::styled(cursor_char, cursor_style),
        Span::raw(after),
    ]
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn panel(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(if focused {
            BorderType::Double
        } else {
            BorderType::Rounded
        })
        .border_style(focus_style(focused))
        .title(format!(" {} ", title))
}

/// A list row with a selection marker.
fn list_row(text: String, selected: bool, list_focused: bool) -> Line<'static> {
    let marker = if selected && list_focused { "▶ " } else { "  " };
    let style = if selected && list_focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![Span::raw(marker), Span::styled(text, style)])
}

fn input_panel(f: &mut Frame, area: Rect, title: &str, field: &TextField, focused: bool) {
    let paragraph = Paragraph::new(Line::from(text_field_spans(field, focused)))
        .block(panel(title, focused));
    f.render_widget(paragraph, area);
}

fn badge_spans(badges: &[Badge]) -> Vec<Span<'static>> {
    Badge::ALL
        .iter()
        .map(|badge| {
            if badges.contains(badge) {
                Span::raw(format!("{} ", badge.icon()))
            } else {
                Span::styled("· ", Style::default().fg(Color::DarkGray))
            }
        })
        .collect()
}

/// Draw the main UI.
pub fn draw_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Progress gauge
            Constraint::Min(0),    // Stage body
            Constraint::Length(3), // Navigation footer
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_progress(f, app, chunks[1]);

    match app.stage() {
        Stage::Overview => draw_overview(f, app, chunks[2]),
        Stage::ChooseWorkflow => draw_choose_workflow(f, app, chunks[2]),
        Stage::PainPoints => draw_pain_points(f, app, chunks[2]),
        Stage::Solutions => draw_solutions(f, app, chunks[2]),
        Stage::Results => draw_results(f, app, chunks[2]),
    }

    draw_footer(f, app, chunks[3]);
    draw_notification(f, app);
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let view = app.view();

    let mut spans = vec![Span::styled(
        view.title,
        Style::default().add_modifier(Modifier::BOLD),
    )];
    spans.push(Span::raw("   "));
    for step in &view.compas {
        let style = if step.active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else if step.completed {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mark = if step.completed { "✓" } else { "○" };
        spans.push(Span::styled(format!("{} {}  ", mark, step.name), style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(" 🕵️ AI Workflow Detective ").left_aligned())
        .title(Line::from(format!(" {} ", app.session_id)).right_aligned());
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let view = app.view();
    let mut title = vec![Span::raw(format!(" ⭐ {} points ", view.score))];
    title.extend(badge_spans(&view.badges));

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(Line::from(title).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .percent(view.progress_percent)
        .label(view.progress_message);
    f.render_widget(gauge, area);
}

fn draw_overview(f: &mut Frame, app: &App, area: Rect) {
    let view = app.view();
    let mut lines = vec![
        Line::from(Span::styled(
            "Welcome, Detective!",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(view.help),
        Line::raw(""),
        Line::raw("Your mission follows the COMPAS method:"),
    ];
    for step in &view.compas {
        lines.push(Line::raw(format!("  • {}: {}", step.name, step.description)));
    }
    lines.push(Line::raw(""));
    lines.push(Line::raw("Badges to earn:"));
    for badge in Badge::ALL {
        lines.push(Line::raw(format!(
            "  {} {} - {}",
            badge.icon(),
            badge.title(),
            badge.description()
        )));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Press Enter to start your investigation",
        Style::default().fg(Color::Yellow),
    )));
    lines.push(Line::raw(""));
    let dim = Style::default().fg(Color::DarkGray);
    lines.push(Line::from(Span::styled(
        format!("Config: {}", app.config_path.display()),
        dim,
    )));
    if let Some(dir) = &app.log_directory {
        lines.push(Line::from(Span::styled(
            format!("Logs:   {}", dir.display()),
            dim,
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(panel("Mission Briefing", true))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_choose_workflow(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let state = app.wizard.state();
    let list_focused = app.focus == Field::WorkflowList;
    let mut lines = vec![Line::raw(app.view().help), Line::raw("")];
    for i in 0..app.workflow_choice_count() {
        let id = app.workflow_id_at(i);
        let chosen = state.selected_workflow_id.as_deref() == Some(id);
        let text = match app.wizard.catalog().workflow(id) {
            Some(w) => format!("{} {} - {}", w.icon, w.title, w.description),
            None => "✏️ Something else - describe your own workflow".to_string(),
        };
        let text = truncate_str(
            &format!("{}{}", if chosen { "● " } else { "○ " }, text),
            LIST_ROW_MAX_WIDTH,
        );
        lines.push(list_row(text, app.workflow_cursor.0 == i, list_focused));
    }

    if let Some(w) = state
        .selected_workflow_id
        .as_deref()
        .and_then(|id| app.wizard.catalog().workflow(id))
        && !w.examples.is_empty()
    {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "Common pain points:",
            Style::default().fg(Color::DarkGray),
        )));
        for example in &w.examples {
            lines.push(Line::from(Span::styled(
                format!("  • {}", example),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let list = Paragraph::new(lines)
        .block(panel("Choose Your Workflow", list_focused))
        .wrap(Wrap { trim: false });
    f.render_widget(list, chunks[0]);

    input_panel(
        f,
        chunks[1],
        "Custom workflow",
        &app.custom_workflow,
        app.focus == Field::CustomWorkflow,
    );
}

fn draw_pain_points(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    input_panel(
        f,
        chunks[0],
        "New pain point",
        &app.pain_input,
        app.focus == Field::PainInput,
    );

    let state = app.wizard.state();
    let list_focused = app.focus == Field::PainList;
    let mut lines = vec![Line::raw(app.view().help), Line::raw("")];
    if state.pain_points.is_empty() {
        lines.push(Line::from(Span::styled(
            "No pain points yet. Type one above and press Enter.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, pain) in state.pain_points.iter().enumerate() {
        let marker = if state.focused_pain_point == Some(i) {
            "🎯"
        } else {
            "  "
        };
        let text = truncate_str(
            &format!("{} [{}] {}", marker, pain.severity.label(), pain.text),
            LIST_ROW_MAX_WIDTH,
        );
        lines.push(list_row(text, app.pain_cursor.0 == i, list_focused));
    }

    let title = match app.wizard.rules().limits.max_pain_points {
        0 => format!("Pain points ({})", state.pain_points.len()),
        max => format!("Pain points ({}/{})", state.pain_points.len(), max),
    };
    let list = Paragraph::new(lines)
        .block(panel(&title, list_focused))
        .wrap(Wrap { trim: false });
    f.render_widget(list, chunks[1]);
}

fn draw_solutions(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(columns[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(columns[1]);

    let view = app.view();
    let state = app.wizard.state();

    // Capabilities
    let caps_focused = app.focus == Field::Capabilities;
    let caps: Vec<Line> = app
        .wizard
        .catalog()
        .capabilities
        .iter()
        .enumerate()
        .map(|(i, c)| {
            list_row(
                truncate_str(&format!("{} {} - {}", c.icon, c.name, c.description), 50),
                app.capability_cursor.0 == i,
                caps_focused,
            )
        })
        .collect();
    f.render_widget(
        Paragraph::new(caps)
            .block(panel("AI capabilities", caps_focused))
            .wrap(Wrap { trim: false }),
        left[0],
    );

    // Other pain points
    let others_focused = app.focus == Field::OtherPainPoints;
    let others: Vec<Line> = view
        .other_pain_points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let check = if p.has_solutions { "✓ " } else { "" };
            list_row(
                truncate_str(&format!("{}{}", check, p.text), 40),
                app.other_cursor.0 == i,
                others_focused,
            )
        })
        .collect();
    f.render_widget(
        Paragraph::new(others).block(panel("Other pain points", others_focused)),
        left[1],
    );

    // Focused pain point
    let focus_text = match &view.focused {
        Some((_, text)) => format!("🎯 {}", text),
        None => "No pain point in focus".to_string(),
    };
    f.render_widget(
        Paragraph::new(truncate_str(&focus_text, LIST_ROW_MAX_WIDTH))
            .block(panel("Focus", false)),
        right[0],
    );

    input_panel(
        f,
        right[1],
        "Write your own solution",
        &app.solution_input,
        app.focus == Field::SolutionInput,
    );

    // Solutions for the focused pain point
    let list_focused = app.focus == Field::SolutionList;
    let solutions = state
        .focused_pain_point
        .map(|i| state.solutions_for(i))
        .unwrap_or(&[]);
    let mut lines: Vec<Line> = solutions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let icon = match s.origin {
                SolutionOrigin::AiSuggested => "🤖",
                SolutionOrigin::UserWritten => "✍️",
            };
            list_row(
                truncate_str(&format!("{} {}", icon, s.text), LIST_ROW_MAX_WIDTH),
                app.solution_cursor.0 == i,
                list_focused,
            )
        })
        .collect();
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            view.help,
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(
        Paragraph::new(lines)
            .block(panel("Solutions", list_focused))
            .wrap(Wrap { trim: false }),
        right[2],
    );

    input_panel(
        f,
        right[3],
        "Existing tools",
        &app.existing_tools,
        app.focus == Field::ExistingTools,
    );
    input_panel(
        f,
        right[4],
        "Additional tools needed",
        &app.needed_tools,
        app.focus == Field::NeededTools,
    );
}

fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    let view = app.view();
    let state = app.wizard.state();

    let mut lines = vec![
        Line::from(Span::styled(
            "🎉 Case Closed!",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
    ];
    if let Some(message) = view.score_message {
        lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::raw(format!("Final score: {} points", view.score)));
    lines.push(Line::raw(""));
    if let Some(title) = &view.workflow_title {
        lines.push(Line::raw(format!("Workflow: {}", title)));
    }
    lines.push(Line::raw(format!(
        "Pain points: {}   Solutions: {}",
        state.pain_points.len(),
        state.total_solutions()
    )));
    lines.push(Line::raw(""));
    lines.push(Line::raw("Badges earned:"));
    for badge in &view.badges {
        lines.push(Line::raw(format!("  {} {}", badge.icon(), badge.title())));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        format!("Export to {}", app.export_dir.display()),
        Style::default().fg(Color::DarkGray),
    )));
    if let Some(path) = &app.last_export {
        lines.push(Line::raw(format!("Last saved: {}", path.display())));
    }

    let paragraph = Paragraph::new(lines)
        .block(panel("Case Closed", true))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, centered_rect(72, area.height, area));
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let view = app.view();
    let nav = &view.nav;

    let mut spans = Vec::new();
    if nav.visible {
        let prev_style = if nav.prev_enabled {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let next_style = if nav.next_enabled {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled("[^P] ⬅️ Previous  ", prev_style));
        spans.push(Span::styled(format!("[^N] {}", nav.next_label), next_style));
        if let Some(reason) = &nav.blocking {
            spans.push(Span::styled(
                format!("  ({})", reason),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.push(Span::raw("   "));
    }

    let shortcuts = match app.focus {
        Field::Briefing => "[Enter] Start  [Esc] Quit",
        Field::PainList => "[↑↓] Move  [Enter] Focus  [s] Severity  [Del] Remove  [Tab] Next field",
        Field::SolutionList => "[↑↓] Move  [Del] Remove  [Tab] Next field",
        Field::ExportActions => "[m] Markdown  [j] JSON  [^R] Restart  [Esc] Quit",
        field if field.is_text() => "[Enter] Save  [Tab] Next field  [Esc] Quit",
        _ => "[↑↓] Move  [Enter] Choose  [Tab] Next field  [Esc] Quit",
    };
    spans.push(Span::styled(shortcuts, Style::default().fg(Color::DarkGray)));

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(footer, area);
}

fn draw_notification(f: &mut Frame, app: &App) {
    let Some(notification) = app.current_notification() else {
        return;
    };
    let width = (notification.message.width() as u16 + 4).clamp(30, 80);
    let area = f.area();
    let popup_area = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + 1,
        width.min(area.width),
        3.min(area.height),
    );
    f.render_widget(Clear, popup_area);
    let popup = Paragraph::new(notification.message.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(notification.kind.color())),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(popup, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    // truncate_str tests

    #[test]
    fn test_truncate_str_short_string() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_str_long_string() {
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hello world", 10), "hello w...");
    }

    #[test]
    fn test_truncate_str_with_newlines() {
        assert_eq!(truncate_str("hello\nworld", 20), "hello world");
        assert_eq!(truncate_str("hello\nworld", 8), "hello...");
    }

    #[test]
    fn test_truncate_str_empty() {
        assert_eq!(truncate_str("", 10), "");
    }

    #[test]
    fn test_truncate_str_small_max_len() {
        assert_eq!(truncate_str("hello", 2), "...");
        assert_eq!(truncate_str("hello", 4), "h...");
    }

    #[test]
    fn test_truncate_str_wide_chars() {
        // Each CJK char is two cells wide
        assert_eq!(truncate_str("会議のメモ", 10), "会議のメモ");
        assert_eq!(truncate_str("会議のメモ", 9), "会議の...");
    }

    #[test]
    fn test_truncate_str_multibyte_does_not_panic() {
        assert_eq!(truncate_str("café au lait", 7), "café...");
    }

    // centered_rect tests

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect(40, 10, area), Rect::new(30, 15, 40, 10));
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(5, 5, 20, 10);
        assert_eq!(centered_rect(40, 20, area), Rect::new(5, 5, 20, 10));
    }

    // text_field_spans tests

    #[test]
    fn test_text_field_spans_unfocused() {
        let mut field = TextField::default();
        field.set("notes");
        let spans = text_field_spans(&field, false);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "notes");
    }

    #[test]
    fn test_text_field_spans_cursor_at_end() {
        let mut field = TextField::default();
        field.set("ab");
        let spans = text_field_spans(&field, true);
        assert_eq!(spans[0].content, "ab");
        assert_eq!(spans[1].content, " ");
        assert_eq!(spans[2].content, "");
    }

    #[test]
    fn test_text_field_spans_cursor_mid_multibyte() {
        let mut field = TextField::default();
        field.set("été");
        field.cursor_left();
        field.cursor_left();
        let spans = text_field_spans(&field, true);
        assert_eq!(spans[0].content, "é");
        assert_eq!(spans[1].content, "t");
        assert_eq!(spans[2].content, "é");
    }
}
