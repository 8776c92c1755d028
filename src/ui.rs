use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::encourage::Toast;
use crate::planet::Planet;
use crate::util::{format_clock, group_thousands};
use crate::voyage::TimerPhase;
use crate::{App, InputMode};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // The toast gets only the lines its wrapped text needs.
        let usable_width = area
            .width
            .saturating_sub(HORIZONTAL_MARGIN * 2)
            .max(1) as usize;
        let toast_lines = self
            .toast
            .as_ref()
            .map(|t| (t.text.width() / usable_width) as u16 + 2)
            .unwrap_or(0);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3),           // header
                Constraint::Length(toast_lines), // toast, collapsed when absent
                Constraint::Length(5),           // destination picker
                Constraint::Length(6),           // progress
                Constraint::Length(8),           // live timer / manual entry
                Constraint::Min(0),              // recent sessions
            ])
            .split(area);

        render_header(self, chunks[0], buf);
        if let Some(toast) = &self.toast {
            render_toast(toast, chunks[1], buf);
        }
        render_picker(self, chunks[2], buf);
        render_progress(self, chunks[3], buf);
        render_logging(self, chunks[4], buf);
        render_sessions(self, chunks[5], buf);
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let info = app.voyage.planet.info();
    let title = Line::from(vec![
        Span::styled(
            format!("{} LunaLog", info.glyph),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  ·  a cozy journey through the cosmos of knowledge",
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    let keys = Line::from(Span::styled(
        ["(s)tart", "(p)ause", "(c)omplete", "(l)og minutes", "(m)ood", "←/→ destination", "(q)uit"]
            .iter()
            .join("  "),
        Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
    ));

    Paragraph::new(vec![title, keys]).render(area, buf);
}

fn render_toast(toast: &Toast, area: Rect, buf: &mut Buffer) {
    let widget = Paragraph::new(toast.text.clone())
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    widget.render(area, buf);
}

fn render_picker(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Choose Your Destination");
    let inner = block.inner(area);
    block.render(area, buf);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(inner);

    for (idx, planet) in Planet::ALL.iter().enumerate() {
        let info = planet.info();
        let selected = *planet == app.voyage.planet;

        let name_style = if selected {
            Style::default()
                .fg(info.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let marker = if selected { "▶ " } else { "  " };

        let lines = vec![
            Line::from(Span::styled(
                format!("{}{} {} ({})", marker, info.glyph, info.name, idx + 1),
                name_style,
            )),
            Line::from(Span::styled(
                info.description,
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(columns[idx], buf);
    }
}

fn render_progress(app: &App, area: Rect, buf: &mut Buffer) {
    let info = app.voyage.planet.info();
    let percent = app.voyage.progress_percent();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Journey to {}", info.name));
    let inner = block.inner(area);
    block.render(area, buf);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // gauge
            Constraint::Length(1), // km line
            Constraint::Length(1), // minutes line
        ])
        .split(inner);

    Gauge::default()
        .gauge_style(Style::default().fg(info.accent))
        .ratio(percent / 100.0)
        .label(format!("{:.2}% complete", percent))
        .render(rows[0], buf);

    let km_line = format!(
        "{} km / {} km",
        group_thousands(app.voyage.progress_km().round() as u64),
        group_thousands(info.total_km as u64),
    );
    Paragraph::new(km_line)
        .alignment(Alignment::Center)
        .render(rows[1], buf);

    let minutes_line = format!(
        "{} minutes studied · {} minutes to go",
        group_thousands(app.voyage.total_minutes),
        group_thousands(app.voyage.minutes_remaining()),
    );
    Paragraph::new(Span::styled(
        minutes_line,
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(rows[2], buf);
}

fn render_logging(app: &App, area: Rect, buf: &mut Buffer) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_timer(app, halves[0], buf);
    render_entry(app, halves[1], buf);
}

fn render_timer(app: &App, area: Rect, buf: &mut Buffer) {
    let info = app.voyage.planet.info();
    let block = Block::default().borders(Borders::ALL).title("Live Timer");
    let inner = block.inner(area);
    block.render(area, buf);

    let (phase_label, phase_style) = match app.voyage.phase {
        TimerPhase::Running => ("running", Style::default().fg(info.accent)),
        TimerPhase::Paused => ("paused", Style::default().add_modifier(Modifier::DIM)),
        TimerPhase::Idle => ("idle", Style::default().add_modifier(Modifier::DIM)),
    };

    let committable = match app.voyage.timer_commit_minutes() {
        Some(minutes) => format!("(c) commits {} min", minutes),
        None => "below 30s — nothing to commit yet".to_string(),
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format_clock(app.voyage.elapsed_minutes, app.voyage.elapsed_seconds),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(phase_label, phase_style)),
        Line::from(Span::styled(
            committable,
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(inner, buf);
}

fn render_entry(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Log Session Manually");
    let inner = block.inner(area);
    block.render(area, buf);

    let field = |label: &str, value: &str, active: bool| {
        let cursor = if active { "█" } else { "" };
        let style = if active {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{}: ", label), Style::default().add_modifier(Modifier::DIM)),
            Span::styled(format!("{}{}", value, cursor), style),
        ])
    };

    let lines = vec![
        Line::from(""),
        field(
            "minutes",
            &app.manual_minutes,
            app.mode == InputMode::Manual,
        ),
        field("mood", &app.mood, app.mode == InputMode::Mood),
        Line::from(Span::styled(
            match app.mode {
                InputMode::Normal => "(l) edit minutes · (m) edit mood",
                InputMode::Manual => "Enter saves the session · Esc cancels",
                InputMode::Mood => "Enter keeps the note · Esc cancels",
            },
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        )),
    ];

    Paragraph::new(lines).render(inner, buf);
}

fn render_sessions(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title("Recent Voyages");
    let inner = block.inner(area);
    block.render(area, buf);

    if app.voyage.sessions.is_empty() {
        Paragraph::new(Span::styled(
            "No voyages yet — press (s) to start the clock or (l) to log minutes.",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(inner, buf);
        return;
    }

    let mut lines = Vec::new();
    for session in &app.voyage.sessions {
        lines.push(Line::from(vec![
            Span::raw(format!("{} ", session.planet.info().glyph)),
            Span::styled(
                format!("{} minutes", session.minutes),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    " · {} km — {}",
                    group_thousands(session.km_traveled.round() as u64),
                    session_age(&session.date),
                ),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]));
        if !session.mood.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("   \"{}\"", session.mood),
                Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
            )));
        }
    }

    Paragraph::new(lines).render(inner, buf);
}

/// Humanized age of an ISO-8601 timestamp ("2 hours ago"); falls back to the
/// raw date on parse failure.
fn session_age(date: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(date) {
        Ok(then) => {
            let age = (chrono::Utc::now() - then.with_timezone(&chrono::Utc))
                .num_seconds()
                .max(0) as u64;
            HumanTime::from(std::time::Duration::from_secs(age))
                .to_text_en(Accuracy::Rough, Tense::Past)
        }
        Err(_) => date.to_string(),
    }
}
