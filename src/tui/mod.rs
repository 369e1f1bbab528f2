mod export;
mod help;
mod state;

use crate::cli::{build_config, build_source, initial_mode, Cli};
use crate::model::{CardView, Mode, SessionEvent, Snapshot, SpreadView};
use crate::orchestrator::{self, UiCommand};
use crate::session::SessionController;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{spread_columns, UiState, SPREAD_CELL_WIDTH};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let source = build_source(&args, &cfg)?;
    let modes = cfg.mode_order();
    let labels: Vec<String> = modes
        .iter()
        .map(|m| {
            cfg.settings_for(m)
                .and_then(|s| s.label.clone())
                .unwrap_or_else(|| m.name())
        })
        .collect();
    let initial = initial_mode(&args.mode);

    let mut session = SessionController::new(cfg);
    session.set_show_images(args.show_images);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(modes, labels, event_rx, cmd_tx));

    let res = orchestrator::run_controller(session, source, initial, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res.map(|_| ())
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    modes: Vec<Mode>,
    labels: Vec<String>,
    mut event_rx: UnboundedReceiver<SessionEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::new(modes);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state, &labels)).ok();
            last_tick = Instant::now();
        }

        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                let columns = terminal
                    .size()
                    .map(|s| spread_columns(s.width))
                    .unwrap_or(1) as isize;
                let divination = state.mode().is_some_and(Mode::is_divination);
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Tab) | (_, KeyCode::Char('?')) => {
                        state.tab = (state.tab + 1) % 2;
                    }
                    (_, KeyCode::Char(c @ '1'..='9')) => {
                        let slot = c as usize - '1' as usize;
                        if let Some(mode) = state.modes.get(slot).cloned() {
                            let _ = cmd_tx.send(UiCommand::SwitchMode(mode));
                        }
                    }
                    (_, KeyCode::Char('m')) => {
                        if let Some(mode) = state.next_mode() {
                            let _ = cmd_tx.send(UiCommand::SwitchMode(mode));
                        }
                    }
                    (_, KeyCode::Char('i')) => {
                        let _ = cmd_tx.send(UiCommand::ToggleImages);
                    }
                    (_, KeyCode::Char('r')) if divination => {
                        let _ = cmd_tx.send(UiCommand::Reshuffle);
                    }
                    (_, KeyCode::Char('y')) => {
                        match state.snapshot.as_ref().and_then(export::snapshot_text) {
                            Some(text) => match export::copy_to_clipboard(&text) {
                                Ok(()) => state.info = "Copied to clipboard".into(),
                                Err(e) => state.info = format!("Copy failed: {e:#}"),
                            },
                            None => state.info = "Nothing to copy yet".into(),
                        }
                    }
                    (_, KeyCode::Left) | (_, KeyCode::Char('h')) if divination => {
                        state.move_spread_cursor(-1);
                    }
                    (_, KeyCode::Right) | (_, KeyCode::Char('l')) if divination => {
                        state.move_spread_cursor(1);
                    }
                    (_, KeyCode::Up) | (_, KeyCode::Char('k')) => {
                        if divination {
                            state.move_spread_cursor(-columns);
                        } else {
                            state.move_list_cursor(-1);
                        }
                    }
                    (_, KeyCode::Down) | (_, KeyCode::Char('j')) => {
                        if divination {
                            state.move_spread_cursor(columns);
                        } else {
                            state.move_list_cursor(1);
                        }
                    }
                    (_, KeyCode::Char(' ')) | (_, KeyCode::Char('d')) => {
                        if divination {
                            if let Some(index) = state.cursor_pool_index() {
                                let _ = cmd_tx.send(UiCommand::ToggleSelect(index));
                            }
                        } else {
                            let _ = cmd_tx.send(UiCommand::Draw);
                        }
                    }
                    (_, KeyCode::Enter) => {
                        if divination {
                            if let Some(index) = state.cursor_pool_index() {
                                let _ = cmd_tx.send(UiCommand::ToggleSelect(index));
                            }
                        } else if state.mode() == Some(&Mode::Simple) {
                            let _ = cmd_tx.send(UiCommand::Show(state.list_cursor));
                        } else {
                            let _ = cmd_tx.send(UiCommand::Draw);
                        }
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, labels: &[String]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(area);

    let tabs = Tabs::new(
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| Line::from(format!("{} {l}", i + 1)))
            .collect::<Vec<_>>(),
    )
    .select(state.mode_index().unwrap_or(0))
    .block(Block::default().borders(Borders::ALL).title("card-draw"))
    .highlight_style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(tabs, chunks[0]);

    if state.tab == 1 {
        help::draw_help(chunks[1], f);
    } else if let Some(snap) = state.snapshot.as_ref() {
        match (&snap.mode, snap.spread.as_ref()) {
            (Mode::Divination, Some(spread)) => draw_spread(chunks[1], f, state, snap, spread),
            (Mode::Simple, _) => draw_simple(chunks[1], f, state, snap),
            _ => draw_card(chunks[1], f, snap, snap.current_card.as_ref()),
        }
    } else {
        let p = Paragraph::new("Starting...").block(Block::default().borders(Borders::ALL));
        f.render_widget(p, chunks[1]);
    }

    draw_status(chunks[2], f, state);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let (message, loading) = state
        .snapshot
        .as_ref()
        .map(|s| (s.status_message.as_str(), s.loading))
        .unwrap_or(("", false));
    let style = if loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let lines = vec![
        Line::from(Span::styled(message.to_string(), style)),
        Line::from(Span::styled(
            state.info.clone(),
            Style::default().fg(Color::Gray),
        )),
    ];
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Status (tab: help, q: quit)"),
    );
    f.render_widget(p, area);
}

fn card_lines(card: &CardView, show_images: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            card.title.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for para in card.description.lines() {
        lines.push(Line::from(para.to_string()));
    }
    if show_images {
        if let Some(url) = card.image_url.as_deref() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Image: {url}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    lines
}

fn draw_card(area: Rect, f: &mut ratatui::Frame, snap: &Snapshot, card: Option<&CardView>) {
    let lines = match card {
        Some(card) => card_lines(card, snap.show_images),
        None if snap.loading => vec![Line::from("")],
        None => vec![Line::from(Span::styled(
            "Press space to draw a card",
            Style::default().fg(Color::Gray),
        ))],
    };
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Card"));
    f.render_widget(p, area);
}

fn draw_simple(area: Rect, f: &mut ratatui::Frame, state: &UiState, snap: &Snapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    draw_card(cols[0], f, snap, snap.current_card.as_ref());

    let visible = cols[1].height.saturating_sub(2) as usize;
    let offset = state.list_cursor.saturating_sub(visible.saturating_sub(1));
    let lines: Vec<Line> = snap
        .card_list
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, label)| {
            let current = snap.current_card.as_ref().is_some_and(|c| c.index == i);
            let mut style = Style::default();
            if current {
                style = style.fg(Color::Cyan);
            }
            if i == state.list_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Line::from(Span::styled(label.clone(), style))
        })
        .collect();
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Cards ({})", snap.pool_size)),
    );
    f.render_widget(p, cols[1]);
}

fn spread_cell(ordinal: Option<usize>, under_cursor: bool) -> Span<'static> {
    let (text, mut style) = match ordinal {
        Some(n) => (
            format!("[{n:<2}]"),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        None => ("[✦ ]".to_string(), Style::default().fg(Color::Blue)),
    };
    if under_cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }
    let pad = (SPREAD_CELL_WIDTH as usize).saturating_sub(4);
    Span::styled(format!("{text}{}", " ".repeat(pad)), style)
}

fn draw_spread(
    area: Rect,
    f: &mut ratatui::Frame,
    state: &UiState,
    snap: &Snapshot,
    spread: &SpreadView,
) {
    let columns = spread_columns(area.width);
    let grid_rows = spread.slots.len().div_ceil(columns) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(grid_rows + 2), Constraint::Min(0)])
        .split(area);

    let grid: Vec<Line> = spread
        .slots
        .chunks(columns)
        .enumerate()
        .map(|(row, cells)| {
            let spans: Vec<Span> = cells
                .iter()
                .enumerate()
                .map(|(col, slot)| {
                    spread_cell(slot.ordinal, row * columns + col == state.spread_cursor)
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    let p = Paragraph::new(grid).block(
        Block::default()
            .borders(Borders::ALL)
            .title(spread.counter.clone()),
    );
    f.render_widget(p, chunks[0]);

    let mut lines: Vec<Line> = Vec::new();
    match spread.reading.as_ref() {
        Some(reading) => {
            for entry in reading {
                lines.push(Line::from(Span::styled(
                    entry.heading.clone(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )));
                if !entry.description.trim().is_empty() {
                    lines.push(Line::from(entry.description.clone()));
                }
                lines.push(Line::from(""));
            }
        }
        None => {
            if let Some(prompt) = spread.prompt.as_deref() {
                lines.push(Line::from(Span::styled(
                    prompt.to_string(),
                    Style::default().fg(Color::Gray),
                )));
            }
        }
    }
    let title = if snap.loading { "Reading (loading)" } else { "Reading" };
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, chunks[1]);
}
