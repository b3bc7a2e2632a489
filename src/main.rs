use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};

use rockfall::game::{Game, Input, KeyColor, Tile, TICK_MS};

// ============================================================================
// Visual Constants
// ============================================================================

const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";

// ============================================================================
// Color Mapping
// ============================================================================

fn key_color(color: KeyColor) -> Color {
    match color {
        KeyColor::Yellow => Color::Rgb(255, 204, 0),
        KeyColor::Blue => Color::Rgb(0, 204, 255),
    }
}

fn tile_cell(tile: Tile) -> (&'static str, Style) {
    match tile {
        Tile::Air => (EMPTY_CHAR, Style::default()),
        Tile::Flux => (BLOCK_CHAR, Style::default().fg(Color::Rgb(204, 255, 204))),
        Tile::Unbreakable => (BLOCK_CHAR, Style::default().fg(Color::Rgb(153, 153, 153))),
        Tile::Player => (BLOCK_CHAR, Style::default().fg(Color::Rgb(255, 0, 0))),
        Tile::Stone(_) => (BLOCK_CHAR, Style::default().fg(Color::Rgb(0, 0, 204))),
        Tile::Box(_) => (BLOCK_CHAR, Style::default().fg(Color::Rgb(139, 69, 19))),
        Tile::Key(c) | Tile::Lock(c) => (BLOCK_CHAR, Style::default().fg(key_color(c))),
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, game: &Game) {
    let area = frame.size();

    let grid_display_width = (game.map.width() as u16 * 2) + 2;
    let grid_display_height = game.map.height() as u16 + 2;
    let main_area = centered_rect(grid_display_width, grid_display_height + 2, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    render_grid(frame, game, vertical[0]);

    let controls_area = Rect {
        x: area.x,
        y: vertical[0].y + vertical[0].height,
        width: area.width,
        height: 1,
    };
    if controls_area.y < area.height {
        let controls = Paragraph::new(vec![Line::from("Arrows/WASD: Move | Q/ESC: Quit")])
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Rockfall ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    for y in 0..game.map.height() {
        let mut spans: Vec<Span> = Vec::new();
        for x in 0..game.map.width() {
            let (symbol, style) = tile_cell(game.map.tile(x, y));
            spans.push(Span::styled(symbol, style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

fn direction_for(code: KeyCode) -> Option<Input> {
    match code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Input::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Input::Right),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Input::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Input::Down),
        _ => None,
    }
}

fn main() -> io::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut game = Game::default();
    let mut last_tick = Instant::now();
    let tick_duration = Duration::from_millis(TICK_MS);

    loop {
        terminal.draw(|frame| render(frame, &game))?;

        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        code => {
                            if let Some(input) = direction_for(code) {
                                game.enqueue(input);
                            }
                        }
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_duration {
            game.tick();
            last_tick = Instant::now();
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
