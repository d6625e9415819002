// Terminal UI rendering and event handling
// Draws the menu, board and status bar; maps mouse and keys onto game actions

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

use crate::xtm_config::Config;
use crate::xtm_field::FieldError;
use crate::xtm_game::{CellView, Game, GameStatus, RevealOutcome};
use crate::xtm_theme::Theme;

// (key, label) pairs shown in the menu row; Esc lives in the status row
const MENU_ITEMS: [(&str, &str); 2] = [("F1", "Help"), ("F2", "New")];
const EXIT_ITEM: (&str, &str) = ("Esc", "Exit");

const TICK_RATE: Duration = Duration::from_millis(200);
const FLASH_TIME: Duration = Duration::from_millis(350);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modal {
    Help,
    Won,
    Lost,
}

// Runtime UI variables; rects are refreshed every frame for mouse hit tests
#[derive(Debug, Default)]
struct UiState {
    modal: Option<Modal>,
    flash_cell: Option<((usize, usize), Instant)>,
    board_inner: Option<Rect>,
    face_rect: Option<Rect>,
}

impl UiState {
    fn after_action(&mut self, outcome: RevealOutcome) {
        match outcome {
            RevealOutcome::Exploded => self.modal = Some(Modal::Lost),
            RevealOutcome::Won => self.modal = Some(Modal::Won),
            RevealOutcome::Ignored | RevealOutcome::Opened(_) => {}
        }
    }

    fn new_round(&mut self, game: &mut Game) {
        game.reset();
        self.modal = None;
        self.flash_cell = None;
    }
}

pub fn run(cfg: &Config, seed: Option<u64>) -> Result<(), Box<dyn Error>> {
    let mut game = Game::from_seed(cfg.size, cfg.mines, seed)?;
    game.set_question_marks(cfg.use_question_marks);
    let theme = Theme::new(cfg.ascii_icons);

    enable_raw_mode()?;
    let mut terminal = match open_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            // Leave raw mode even when setup fails halfway
            let _ = restore_terminal(&mut io::stdout());
            return Err(e.into());
        }
    };

    // Restore the terminal before reporting any loop error
    let result = event_loop(&mut terminal, &mut game, &theme);

    restore_terminal(terminal.backend_mut())?;
    terminal.show_cursor()?;
    info!("UI closed");
    result
}

fn open_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal<W: Write>(out: &mut W) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(out, DisableMouseCapture, terminal::LeaveAlternateScreen)
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, game: &mut Game, theme: &Theme) -> Result<(), Box<dyn Error>> {
    let mut ui = UiState::default();
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| draw(f, game, theme, &mut ui))?;

        let timeout = TICK_RATE.checked_sub(last_tick.elapsed()).unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if !handle_key(key, game, &mut ui)? {
                        break;
                    }
                }
                Event::Mouse(me) => handle_mouse(me, game, &mut ui)?,
                _ => {}
            }
        }

        // the status bar reads the round timer on every frame
        if last_tick.elapsed() >= TICK_RATE {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

/// Returns false when the player asked to exit
fn handle_key(key: KeyEvent, game: &mut Game, ui: &mut UiState) -> Result<bool, FieldError> {
    // Windows terminals also report releases
    if key.kind != KeyEventKind::Press {
        return Ok(true);
    }

    if let Some(modal) = ui.modal.take() {
        debug!("Closed {:?} dialog", modal);
        return Ok(true);
    }

    let (row, col) = game.cursor;
    match key.code {
        KeyCode::Esc => return Ok(false),
        KeyCode::F(1) => ui.modal = Some(Modal::Help),
        KeyCode::F(2) => ui.new_round(game),
        KeyCode::Left => game.step_cursor(0, -1),
        KeyCode::Right => game.step_cursor(0, 1),
        KeyCode::Up => game.step_cursor(-1, 0),
        KeyCode::Down => game.step_cursor(1, 0),
        KeyCode::Char(' ') => {
            let outcome = game.reveal(row, col)?;
            ui.after_action(outcome);
        }
        KeyCode::Enter => chord(game, ui, row, col)?,
        KeyCode::Char('f') | KeyCode::Char('F') => {
            game.toggle_flag(row, col)?;
        }
        _ => {}
    }
    Ok(true)
}

fn handle_mouse(me: MouseEvent, game: &mut Game, ui: &mut UiState) -> Result<(), FieldError> {
    if ui.modal.is_some() {
        if let MouseEventKind::Down(_) = me.kind {
            ui.modal = None;
        }
        return Ok(());
    }

    let cell = ui.board_inner.and_then(|inner| cell_at(inner, me.column, me.row, game.size()));
    match me.kind {
        MouseEventKind::Moved => {
            if let Some(pos) = cell {
                game.cursor = pos;
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if ui.face_rect.is_some_and(|r| contains(r, me.column, me.row)) {
                ui.new_round(game);
            } else if let Some((row, col)) = cell {
                game.cursor = (row, col);
                if game.is_revealed(row, col)? {
                    chord(game, ui, row, col)?;
                } else {
                    let outcome = game.reveal(row, col)?;
                    ui.after_action(outcome);
                }
            }
        }
        MouseEventKind::Down(MouseButton::Right) => {
            if let Some((row, col)) = cell {
                game.cursor = (row, col);
                game.toggle_flag(row, col)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn chord(game: &mut Game, ui: &mut UiState, row: usize, col: usize) -> Result<(), FieldError> {
    let outcome = game.chord(row, col)?;
    if outcome == RevealOutcome::Ignored && game.is_revealed(row, col)? && !game.is_over() {
        ui.flash_cell = Some(((row, col), Instant::now()));
    }
    ui.after_action(outcome);
    Ok(())
}

fn draw<B: Backend>(f: &mut Frame<B>, game: &Game, theme: &Theme, ui: &mut UiState) {
    let size = f.size();
    let n = game.size();
    let board_w = (n * 2 + 3) as u16;
    let board_h = n as u16 + 2;
    let min_twidth = board_w.max(44);
    let min_theight = board_h + 6;

    // If terminal too small, render a centered warning and skip normal UI
    if size.width < min_twidth || size.height < min_theight {
        ui.board_inner = None;
        ui.face_rect = None;
        let warn_lines = vec![
            Spans::from(Span::raw("Terminal size too small.")),
            Spans::from(Span::raw(format!("Minimum required: {} x {}", min_twidth, min_theight))),
        ];
        let warn = Paragraph::new(Text::from(warn_lines))
            .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let area = center_rect(40u16.min(size.width), 4u16.min(size.height), size);
        f.render_widget(warn, area);
        return;
    }

    // layout: top menu row, center board, bottom status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(board_h), Constraint::Length(3)].as_ref())
        .split(size);

    // menu row
    let key_style = Style::default().fg(theme.key_fg).add_modifier(Modifier::BOLD);
    let mut menu_spans = vec![Span::raw(" ")];
    for (i, (key, label)) in MENU_ITEMS.iter().enumerate() {
        if i > 0 {
            menu_spans.push(Span::raw("   "));
        }
        menu_spans.push(Span::styled(key.to_string(), key_style));
        menu_spans.push(Span::raw(format!(": {}", label)));
    }
    let menu = Paragraph::new(Spans::from(menu_spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(menu, chunks[0]);

    // status row: counters left, face centered, exit key right
    let status_area = chunks[2];
    let inner_w = status_area.width.saturating_sub(2) as usize;
    let left_text = format!(" Mines: {}   Time: {}s", game.remaining_mines(), game.elapsed_secs());
    let face = format!(" {} ", theme.face(game.status()));
    let right_w = EXIT_ITEM.0.width() + 2 + EXIT_ITEM.1.width() + 1;
    let left_w = left_text.width();
    let face_w = face.width();
    let face_col = inner_w.saturating_sub(face_w) / 2;
    let pad_left = face_col.saturating_sub(left_w).max(1);
    let pad_right = inner_w.saturating_sub(left_w + pad_left + face_w + right_w).max(1);
    ui.face_rect = Some(Rect::new(
        status_area.x + 1 + (left_w + pad_left) as u16,
        status_area.y + 1,
        face_w as u16,
        1,
    ));
    let face_style = match game.status() {
        GameStatus::Lost => Style::default().fg(theme.flash_bg).add_modifier(Modifier::BOLD),
        _ => key_style,
    };
    let status_spans = vec![
        Span::raw(left_text),
        Span::raw(" ".repeat(pad_left)),
        Span::styled(face, face_style),
        Span::raw(" ".repeat(pad_right)),
        Span::styled(EXIT_ITEM.0, key_style),
        Span::raw(format!(": {} ", EXIT_ITEM.1)),
    ];
    let status = Paragraph::new(Spans::from(status_spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, status_area);

    // board area
    let board_area = center_rect(board_w, board_h, chunks[1]);
    ui.board_inner = Some(Rect::new(
        board_area.x + 1,
        board_area.y + 1,
        board_area.width.saturating_sub(2),
        board_area.height.saturating_sub(2),
    ));
    let flash = ui
        .flash_cell
        .filter(|(_, t0)| t0.elapsed() < FLASH_TIME)
        .map(|(pos, _)| pos);
    let mut lines = Vec::with_capacity(n);
    for row in 0..n {
        let mut spans = Vec::with_capacity(n + 1);
        for col in 0..n {
            let view = game.cell_view(row, col).unwrap_or(CellView::Hidden);
            let (glyph, mut style) = theme.cell(view);
            if flash == Some((row, col)) {
                style = style.bg(theme.flash_bg).add_modifier(Modifier::BOLD);
            } else if game.cursor == (row, col) && !game.is_over() && view != CellView::Exploded {
                style = style.bg(theme.cursor_bg);
            }
            spans.push(Span::styled(format!(" {}", glyph), style));
        }
        // right padding column keeps the board background
        spans.push(Span::styled(" ", Style::default().bg(theme.board_bg)));
        lines.push(Spans::from(spans));
    }
    let title = format!(" {}x{} / {} mines ", n, n, game.mine_count());
    let board = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center),
    );
    f.render_widget(board, board_area);

    if let Some(modal) = ui.modal {
        draw_modal(f, modal, game, size);
    }
}

fn draw_modal<B: Backend>(f: &mut Frame<B>, modal: Modal, game: &Game, area: Rect) {
    let (title, body): (&str, Vec<String>) = match modal {
        Modal::Help => (
            "Help",
            vec![
                " Controls:".to_string(),
                "  Mouse | Arrows   - move cursor".to_string(),
                "  L-Click | Space  - reveal".to_string(),
                "  R-Click | F      - toggle flag".to_string(),
                "  L-Click number | Enter - chord".to_string(),
                "  Click face | F2  - new game".to_string(),
            ],
        ),
        Modal::Won => (
            "Success",
            vec![
                "Mines cleared. You Win!".to_string(),
                format!("Time: {} seconds", game.elapsed_secs()),
            ],
        ),
        Modal::Lost => (
            "Failure",
            vec![
                "Mine exploded. Game Over!".to_string(),
                "Better luck next time.".to_string(),
            ],
        ),
    };
    let alignment = if modal == Modal::Help { Alignment::Left } else { Alignment::Center };

    let width = body.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 6;
    let height = body.len() as u16 + 5;
    let mrect = center_rect(width.min(area.width), height.min(area.height), area);
    f.render_widget(Clear, mrect);

    let mut lines = vec![Spans::from(Span::raw(""))];
    lines.extend(body.into_iter().map(|l| Spans::from(Span::raw(l))));
    lines.push(Spans::from(Span::raw("")));
    lines.push(Spans::from(Span::styled(
        "press any key",
        Style::default().add_modifier(Modifier::DIM),
    )));
    let p = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(alignment);
    f.render_widget(p, mrect);
}

/// Map a screen position inside the board to (row, col); each cell is two columns wide
fn cell_at(inner: Rect, column: u16, row: u16, size: usize) -> Option<(usize, usize)> {
    if !contains(inner, column, row) {
        return None;
    }
    let col = ((column - inner.x) / 2) as usize;
    let row = (row - inner.y) as usize;
    if row < size && col < size { Some((row, col)) } else { None }
}

fn contains(r: Rect, column: u16, row: u16) -> bool {
    column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn restore_leaves_alternate_screen_without_raw_mode() {
        let mut out = Vec::new();
        restore_terminal(&mut out).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("\x1b[?1049l"), "{written:?}");
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn cell_hit_testing() {
        let inner = Rect::new(10, 5, 9, 4);
        assert_eq!(cell_at(inner, 10, 5, 4), Some((0, 0)));
        assert_eq!(cell_at(inner, 11, 5, 4), Some((0, 0)));
        assert_eq!(cell_at(inner, 12, 6, 4), Some((1, 1)));
        assert_eq!(cell_at(inner, 17, 8, 4), Some((3, 3)));
        // padding column and outside the board
        assert_eq!(cell_at(inner, 18, 8, 4), None);
        assert_eq!(cell_at(inner, 9, 5, 4), None);
        assert_eq!(cell_at(inner, 10, 9, 4), None);
    }

    #[test]
    fn center_rect_stays_inside() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(center_rect(20, 10, area), Rect::new(30, 7, 20, 10));
        let big = center_rect(100, 30, area);
        assert_eq!((big.x, big.y), (0, 0));
    }

    #[test]
    fn keys_drive_the_game() {
        let mut game = Game::from_seed(5, 3, Some(11)).unwrap();
        let mut ui = UiState::default();

        assert!(handle_key(press(KeyCode::Right), &mut game, &mut ui).unwrap());
        assert!(handle_key(press(KeyCode::Down), &mut game, &mut ui).unwrap());
        assert_eq!(game.cursor, (1, 1));

        assert!(handle_key(press(KeyCode::Char(' ')), &mut game, &mut ui).unwrap());
        assert!(game.is_revealed(1, 1).unwrap());
        assert_ne!(game.status(), GameStatus::Lost);

        assert!(handle_key(press(KeyCode::F(2)), &mut game, &mut ui).unwrap());
        assert_eq!(game.status(), GameStatus::Ready);
        assert!(!game.is_revealed(1, 1).unwrap());

        assert!(!handle_key(press(KeyCode::Esc), &mut game, &mut ui).unwrap());
    }

    #[test]
    fn any_key_closes_a_dialog_first() {
        let mut game = Game::from_seed(5, 3, Some(11)).unwrap();
        let mut ui = UiState::default();
        handle_key(press(KeyCode::F(1)), &mut game, &mut ui).unwrap();
        assert_eq!(ui.modal, Some(Modal::Help));
        // Esc closes the dialog instead of exiting
        assert!(handle_key(press(KeyCode::Esc), &mut game, &mut ui).unwrap());
        assert_eq!(ui.modal, None);
    }

    #[test]
    fn mouse_reveals_flags_and_resets() {
        let mut game = Game::from_seed(4, 2, Some(5)).unwrap();
        let mut ui = UiState {
            board_inner: Some(Rect::new(0, 0, 9, 4)),
            face_rect: Some(Rect::new(20, 10, 3, 1)),
            ..UiState::default()
        };

        handle_mouse(click(MouseEventKind::Down(MouseButton::Right), 7, 3), &mut game, &mut ui).unwrap();
        assert_eq!(game.cell_view(3, 3).unwrap(), CellView::Flagged);

        handle_mouse(click(MouseEventKind::Down(MouseButton::Left), 2, 1), &mut game, &mut ui).unwrap();
        assert!(game.is_revealed(1, 1).unwrap());
        assert_eq!(game.cursor, (1, 1));

        ui.modal = None;
        handle_mouse(click(MouseEventKind::Down(MouseButton::Left), 21, 10), &mut game, &mut ui).unwrap();
        assert_eq!(game.status(), GameStatus::Ready);
        assert_eq!(game.cell_view(3, 3).unwrap(), CellView::Hidden);
    }

    #[test]
    fn losing_opens_the_failure_dialog() {
        let mut ui = UiState::default();
        ui.after_action(RevealOutcome::Exploded);
        assert_eq!(ui.modal, Some(Modal::Lost));
        ui.after_action(RevealOutcome::Opened(3));
        assert_eq!(ui.modal, Some(Modal::Lost));
    }
}
