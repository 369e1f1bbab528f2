use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("1-9", 9, "Switch to mode by tab position"),
        key_line("m", 11, "Next mode"),
        key_line("i", 11, "Show/hide card images"),
        key_line("y", 11, "Copy current card or reading to clipboard"),
        key_line("tab", 9, "Toggle this help"),
        Line::from(""),
        Line::from("Simple / text-only modes:"),
        key_line("space", 7, "Draw a random card"),
        key_line("↑/↓", 9, "Browse the card list (simple mode)"),
        key_line("enter", 7, "Show the highlighted card"),
        Line::from(""),
        Line::from("Divination mode:"),
        key_line("arrows", 6, "Move over the face-down spread"),
        key_line("space", 7, "Pick or return the highlighted card"),
        key_line("r", 11, "Reshuffle the spread"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
