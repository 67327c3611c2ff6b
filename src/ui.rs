//! Layout and drawing: playfield, next preview, score panel, pause and game-over overlays.
//!
//! Every grid cell is one terminal cell painted with a background colour, so a logical column
//! (two grid cells) looks roughly square.

use crate::game::{GameOverReason, GameState, Status};
use crate::playfield::{Cell, FRAME_WIDTH, GRID_HEIGHT, GRID_WIDTH, PREVIEW_HEIGHT, PREVIEW_WIDTH};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Column where the preview box starts, relative to the board.
const SIDEBAR_COL: u16 = FRAME_WIDTH as u16 + 3;
/// Counter labels and values, relative to the board.
const SCORE_ROW: u16 = 7;
const LINES_ROW: u16 = 8;
const VALUE_COL: u16 = FRAME_WIDTH as u16 + 10;
const HELP_ROW: u16 = 11;

const TOTAL_WIDTH: u16 = SIDEBAR_COL + PREVIEW_WIDTH as u16;
const TOTAL_HEIGHT: u16 = GRID_HEIGHT as u16;

/// Duration of the top-out fade in ms.
pub const GAME_OVER_FADE_MS: u32 = 2000;

/// Per-frame presentation state owned by the app.
pub struct View<'a> {
    pub theme: &'a Theme,
    /// Highlight the score panel (recent change).
    pub score_flash: bool,
    pub game_over_effect: &'a mut Option<Effect>,
    pub effect_process_time: &'a mut Option<Instant>,
    pub now: Instant,
}

/// Top-left corner of the whole layout, centred in `area`.
fn layout_rect(area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(TOTAL_WIDTH) / 2,
        y: area.y + area.height.saturating_sub(TOTAL_HEIGHT) / 2,
        width: TOTAL_WIDTH.min(area.width),
        height: TOTAL_HEIGHT.min(area.height),
    }
}

fn board_rect(area: Rect) -> Rect {
    let outer = layout_rect(area);
    Rect {
        width: (GRID_WIDTH as u16).min(outer.width),
        ..outer
    }
}

/// Writes `text` at (`row`, `col`) relative to `origin`, clipped to `clip`.
fn put(buf: &mut Buffer, origin: Rect, clip: Rect, row: u16, col: u16, style: Style, text: &str) {
    let x = origin.x + col;
    let y = origin.y + row;
    if y >= clip.bottom() || x >= clip.right() {
        return;
    }
    let max_width = (clip.right() - x) as usize;
    buf.set_stringn(x, y, text, max_width, style);
}

fn cell_style(cell: Cell, theme: &Theme) -> Style {
    match cell {
        Cell::Empty => Style::default().bg(theme.bg),
        Cell::Block(kind) => Style::default().bg(theme.block_color(kind)),
        Cell::Border => Style::default().bg(theme.border),
    }
}

/// Draw the game, with pause overlay or game-over summary on top.
pub fn draw(frame: &mut Frame, state: &GameState, view: View<'_>) {
    let area = frame.area();
    let origin = layout_rect(area);
    draw_board(frame.buffer_mut(), state, view.theme, origin, area);
    draw_sidebar(frame.buffer_mut(), state, view.theme, view.score_flash, origin, area);

    match state.status() {
        Status::Running => {}
        Status::Paused => draw_pause_overlay(frame, view.theme, area),
        Status::GameOver(reason) => {
            if reason == GameOverReason::ToppedOut {
                apply_game_over_effect(
                    frame,
                    area,
                    view.game_over_effect,
                    view.effect_process_time,
                    view.now,
                );
            }
            draw_game_over(frame, state, view.theme, reason, area);
        }
    }
}

fn draw_board(buf: &mut Buffer, state: &GameState, theme: &Theme, origin: Rect, clip: Rect) {
    for (y, row) in state.field().rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            put(buf, origin, clip, y as u16, x as u16, cell_style(*cell, theme), " ");
        }
    }
}

fn draw_sidebar(
    buf: &mut Buffer,
    state: &GameState,
    theme: &Theme,
    score_flash: bool,
    origin: Rect,
    clip: Rect,
) {
    for (y, row) in state.next_box().rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            put(buf, origin, clip, y as u16, SIDEBAR_COL + x as u16, cell_style(*cell, theme), " ");
        }
    }

    let label = Style::default().fg(theme.title);
    put(
        buf,
        origin,
        clip,
        PREVIEW_HEIGHT as u16,
        SIDEBAR_COL + 2,
        label,
        &format!("Next: {:?}", state.next_kind()),
    );
    let mut value = Style::default().fg(theme.score).add_modifier(Modifier::BOLD);
    if score_flash {
        value = value.add_modifier(Modifier::REVERSED);
    }
    put(buf, origin, clip, SCORE_ROW, SIDEBAR_COL, label, "Score:");
    put(buf, origin, clip, LINES_ROW, SIDEBAR_COL, label, "Lines:");
    put(buf, origin, clip, SCORE_ROW, VALUE_COL, value, &format!(" {}", state.score()));
    put(
        buf,
        origin,
        clip,
        LINES_ROW,
        VALUE_COL,
        Style::default().fg(theme.score),
        &format!(" {}", state.lines()),
    );

    let help = Style::default().fg(Color::DarkGray);
    let lines = [
        "\u{2190} \u{2192}   move",
        "\u{2191} \u{2193}   rotate",
        "space drop",
        "s     speed up",
        "p     pause",
        "q     quit",
    ];
    for (i, text) in lines.iter().enumerate() {
        put(buf, origin, clip, HELP_ROW + i as u16, SIDEBAR_COL, help, text);
    }
}

fn popup_rect(area: Rect, width: u16, height: u16) -> Rect {
    let board = board_rect(area);
    Rect {
        x: board.x + board.width.saturating_sub(width) / 2,
        y: board.y + board.height.saturating_sub(height) / 2,
        width,
        height,
    }
    .intersection(area)
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 20, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(Span::styled(" P resume  Q quit ", Style::default().fg(theme.title))),
    ];
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    Clear.render(popup, frame.buffer_mut());
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    reason: GameOverReason,
    area: Rect,
) {
    let popup = popup_rect(area, 20, 6);
    let title = match reason {
        GameOverReason::ToppedOut => " Game Over ",
        GameOverReason::Quit => " Bye! ",
    };
    let lines = vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", state.score()),
            Style::default().fg(theme.score),
        )),
        Line::from(Span::styled(
            format!(" Lines: {} ", state.lines()),
            Style::default().fg(theme.score),
        )),
    ];
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    Clear.render(popup, frame.buffer_mut());
    p.render(popup, frame.buffer_mut());
}

/// Create or advance the top-out fade over the board.
fn apply_game_over_effect(
    frame: &mut Frame,
    area: Rect,
    effect: &mut Option<Effect>,
    process_time: &mut Option<Instant>,
    now: Instant,
) {
    let board = board_rect(area);
    let delta = process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *process_time = Some(now);

    let effect = effect.get_or_insert_with(|| {
        fx::fade_to(
            Color::DarkGray,
            Color::Black,
            (GAME_OVER_FADE_MS, Interpolation::Linear),
        )
        .with_area(board)
    });
    frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::input::Action;
    use crate::game::Input;
    use crate::piece::PieceKind;
    use crate::rng::ScriptedSource;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn state() -> GameState {
        let config = GameConfig {
            tick_ms: 300,
            min_tick_ms: 40,
            legacy_topout: false,
        };
        GameState::new(&config, Box::new(ScriptedSource::new(vec![PieceKind::I, PieceKind::O])))
    }

    fn render(state: &GameState) -> Buffer {
        let theme = Theme::default();
        let mut effect = None;
        let mut time = None;
        let mut terminal = Terminal::new(TestBackend::new(60, 24)).unwrap();
        terminal
            .draw(|f| {
                draw(
                    f,
                    state,
                    View {
                        theme: &theme,
                        score_flash: false,
                        game_over_effect: &mut effect,
                        effect_process_time: &mut time,
                        now: Instant::now(),
                    },
                )
            })
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn test_board_paints_border_and_piece() {
        let state = state();
        let buf = render(&state);
        let origin = layout_rect(buf.area);
        let theme = Theme::default();
        assert_eq!(buf[(origin.x, origin.y)].bg, theme.border);
        // I piece, rotation 0, spawn anchor (1, 10): cells in row 2.
        assert_eq!(buf[(origin.x + 10, origin.y + 2)].bg, theme.block_color(PieceKind::I));
        assert_eq!(buf[(origin.x + 5, origin.y + 5)].bg, theme.bg);
    }

    #[test]
    fn test_sidebar_shows_counters() {
        let mut state = state();
        state.step(Input::Key(Action::SpeedUp));
        let buf = render(&state);
        let origin = layout_rect(buf.area);
        let score_line = row_text(&buf, origin.y + SCORE_ROW);
        assert!(score_line.contains("Score:"), "{score_line}");
        assert!(score_line.contains(" 1"), "{score_line}");
        assert!(row_text(&buf, origin.y + LINES_ROW).contains("Lines:"));
        assert!(row_text(&buf, origin.y + PREVIEW_HEIGHT as u16).contains("Next: O"));
    }

    #[test]
    fn test_pause_and_quit_overlays() {
        let mut state = state();
        state.step(Input::Key(Action::Pause));
        let buf = render(&state);
        let text: String = (0..buf.area.height).map(|y| row_text(&buf, y)).collect();
        assert!(text.contains("Paused"));

        state.step(Input::Key(Action::Quit));
        let buf = render(&state);
        let text: String = (0..buf.area.height).map(|y| row_text(&buf, y)).collect();
        assert!(text.contains("Bye!"));
        assert!(text.contains("Score: 0"));
    }

    #[test]
    fn test_small_terminal_does_not_panic() {
        let state = state();
        let theme = Theme::default();
        let mut effect = None;
        let mut time = None;
        let mut terminal = Terminal::new(TestBackend::new(10, 5)).unwrap();
        terminal
            .draw(|f| {
                draw(
                    f,
                    &state,
                    View {
                        theme: &theme,
                        score_flash: true,
                        game_over_effect: &mut effect,
                        effect_process_time: &mut time,
                        now: Instant::now(),
                    },
                )
            })
            .unwrap();
    }
}
