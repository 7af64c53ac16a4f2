use crate::shared::{format_time, DisplayState};
use super::drum::draw_drum;
use super::mode::TuiState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

const SIDE_PANEL_WIDTH: u16 = 36;

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState, blink_on: bool) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(40), // rain + drum
            Constraint::Length(SIDE_PANEL_WIDTH),
        ])
        .split(area);

    draw_drum(frame, columns[0], state);

    let panel = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),  // status
            Constraint::Min(6),     // library
            Constraint::Length(12), // mixer
            Constraint::Length(3),  // help line
        ])
        .split(columns[1]);

    draw_status(frame, panel[0], state, blink_on);
    draw_library(frame, panel[1], state, ts);
    draw_mixer(frame, panel[2], state, ts);
    frame.render_widget(
        Paragraph::new("h: help  Esc: quit").style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL)),
        panel[3],
    );

    if let Some(default_title) = &state.pending_title {
        draw_naming(frame, area, default_title, &ts.title_buffer, blink_on);
    } else if state.show_tutorial {
        draw_tutorial(frame, area);
    }
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let mut lines = vec![Line::from(format!(
        "{}  ·  {}",
        state.theme.name,
        state.timbre.label()
    ))];

    if state.recording {
        let dot = if blink_on { "●" } else { " " };
        lines.push(Line::from(vec![
            Span::styled(dot, Style::default().fg(Color::Red)),
            Span::raw(format!(" REC {}", format_time(state.recording_elapsed_ms))),
        ]));
    }
    match &state.playing {
        Some(title) => {
            lines.push(Line::from(format!("▶ {title}")));
            lines.push(Line::from(format!(
                "{:>3.0}%  x{:.2}{}",
                state.playback_progress,
                state.speed,
                if state.looping { "  loop" } else { "" }
            )));
        }
        None => lines.push(Line::from(format!(
            "speed x{:.2}{}",
            state.speed,
            if state.looping { "  loop" } else { "" }
        ))),
    }
    if let Some(p) = &state.practice {
        lines.push(Line::styled(
            format!("practice {}  {}/{}", p.title, p.step + 1, p.total),
            Style::default().fg(Color::Yellow),
        ));
    }

    let block = Block::default().borders(Borders::ALL).title(" Status ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_library(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    // keep the cursor in view when the list is taller than the box
    let visible = area.height.saturating_sub(2) as usize;
    let first = ts.selected_song.saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = state
        .library
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(i, song)| {
            let marker = if song.built_in { "♪" } else { " " };
            let text = format!("{marker} {}  ({} notes)", song.title, song.notes);
            if i == ts.selected_song {
                Line::styled(text, Style::default().add_modifier(Modifier::REVERSED))
            } else {
                Line::from(text)
            }
        })
        .collect();

    let block = Block::default().borders(Borders::ALL).title(" Songs ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_mixer(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    let mut lines: Vec<Line> = state
        .ambience
        .iter()
        .enumerate()
        .map(|(i, (category, s))| {
            let text = format!(
                "{:<9}{} {}",
                category.id(),
                if s.active { "on " } else { "off" },
                meter(s.volume)
            );
            let mut style = Style::default();
            if !s.active {
                style = style.fg(Color::DarkGray);
            }
            if i == ts.selected_layer {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Line::styled(text, style)
        })
        .collect();

    let master = if state.muted { "muted".to_string() } else { meter(state.master_volume) };
    lines.push(Line::from(format!("{:<13}{master}", "master")));
    lines.push(Line::from(format!(
        "rain {:.0}%  notes {}",
        state.rain_density * 100.0,
        if state.visualize_notes { "on" } else { "off" }
    )));

    let block = Block::default().borders(Borders::ALL).title(" Mixer ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn meter(volume: f32) -> String {
    let filled = (volume.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn draw_naming(frame: &mut Frame, area: Rect, default_title: &str, typed: &str, blink_on: bool) {
    let popup = centered(area, 44, 5);
    let cursor = if blink_on { "_" } else { " " };
    let shown = if typed.is_empty() {
        Span::styled(default_title.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(typed.to_string())
    };
    let lines = vec![
        Line::from(vec![shown, Span::raw(cursor)]),
        Line::styled("Enter: save   Esc: discard", Style::default().fg(Color::DarkGray)),
    ];
    let block = Block::default().borders(Borders::ALL).title(" Name your song ");
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn draw_tutorial(frame: &mut Frame, area: Rect) {
    let popup = centered(area, 56, 14);
    let text = [
        "Strike the drum: Space for the centre, q..p around the ring.",
        "Each strike drops rain that sings when it lands.",
        "",
        "1 record   Enter play   2 stop   3 loop   , . speed",
        "4 practice the selected song   Del delete",
        "Tab layer   a on/off   [ ] volume   - = master   m mute",
        "s timbre   c theme   z x rain   n notes   Bksp reset",
        "",
        "h to close",
    ];
    let lines: Vec<Line> = text.iter().map(|l| Line::from(*l)).collect();
    let block = Block::default().borders(Borders::ALL).title(" Welcome ");
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
