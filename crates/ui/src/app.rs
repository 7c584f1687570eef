use std::time::Duration;

use egui::{Color32, Rect, RichText, Sense, Vec2};
use engine::{color_name, is_empty, is_piece_color, piece_color, piece_type, Board, Move, Square, QUEEN};
use engine::{BISHOP, BLACK, KING, KNIGHT, PAWN, ROOK, WHITE};
use net::session::describe_status;
use net::{GameSnapshot, SessionEvent, SessionHandle};

use crate::settings::DisplaySettings;

const LIGHT_SQUARE: Color32 = Color32::from_rgb(240, 217, 181);
const DARK_SQUARE: Color32 = Color32::from_rgb(181, 136, 99);
const SELECTED: Color32 = Color32::from_rgb(255, 255, 0);
const LAST_MOVE: Color32 = Color32::from_rgb(205, 210, 106);
const HINT: Color32 = Color32::from_rgba_premultiplied(128, 128, 128, 179);

pub struct ChessApp {
    session: SessionHandle,
    snapshot: Option<GameSnapshot>,
    local_color: Option<u8>,
    networked: bool,
    title: String,
    display: DisplaySettings,
    selected_square: Option<Square>,
    legal_moves: Vec<Square>,
    last_error: Option<String>,
    session_closed: bool,
}

impl ChessApp {
    pub fn new(
        session: SessionHandle,
        local_color: Option<u8>,
        networked: bool,
        title: String,
        display: DisplaySettings,
    ) -> Self {
        Self {
            session,
            snapshot: None,
            local_color,
            networked,
            title,
            display,
            selected_square: None,
            legal_moves: Vec::new(),
            last_error: None,
            session_closed: false,
        }
    }

    fn drain_events(&mut self) {
        for event in self.session.poll_events() {
            match event {
                SessionEvent::Updated(snapshot) => {
                    self.snapshot = Some(*snapshot);
                }
                SessionEvent::Rejected { what, reason } => {
                    self.last_error = Some(format!("{what}: {reason}"));
                }
                SessionEvent::Closed => self.session_closed = true,
            }
        }
    }

    fn flipped(&self) -> bool {
        self.local_color == Some(BLACK)
    }

    /// Whether clicks on the board should do anything right now.
    fn can_move(&self, snapshot: &GameSnapshot) -> bool {
        !self.session_closed && !snapshot.status.is_over() && self.local_color == Some(snapshot.side_to_move())
    }
}

impl eframe::App for ChessApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        // moves from the network and the engine arrive between frames
        ctx.request_repaint_after(Duration::from_millis(100));

        let Some(snapshot) = self.snapshot.clone() else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.label("Starting game...");
            });
            return;
        };

        egui::SidePanel::right("sidebar").min_width(280.0).show(ctx, |ui| {
            self.draw_sidebar(ui, &snapshot);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available_size = ui.available_size();
            let fitted = (available_size.x.min(available_size.y) - 20.0) / 8.0;
            let square_size = fitted.min(self.display.square_size).max(16.0);
            let board_size = square_size * 8.0;

            let board_rect = Rect::from_min_size(ui.cursor().min, Vec2::splat(board_size));
            let response = ui.allocate_rect(board_rect, Sense::click());

            if response.clicked() && self.can_move(&snapshot) {
                if let Some(pos) = response.interact_pointer_pos() {
                    let relative_pos = pos - board_rect.min;
                    if let Some(clicked_square) =
                        Square::from_coords(relative_pos.x, relative_pos.y, square_size, self.flipped())
                    {
                        self.handle_square_click(&snapshot.board, clicked_square);
                    }
                }
            }

            self.draw_board(ui, &snapshot, board_rect, square_size);
        });
    }
}

impl ChessApp {
    fn handle_square_click(&mut self, board: &Board, clicked_square: Square) {
        let own_piece = is_piece_color(board.get_piece(clicked_square), board.current_turn);

        match self.selected_square {
            Some(selected) if selected == clicked_square => self.clear_selection(),
            Some(selected) if self.legal_moves.contains(&clicked_square) => {
                let mv = promote_to_queen(board, Move::new(selected, clicked_square));
                if let Err(err) = self.session.play(mv) {
                    self.last_error = Some(err.to_string());
                }
                self.clear_selection();
            }
            _ if own_piece => {
                self.selected_square = Some(clicked_square);
                self.legal_moves = board.get_legal_moves(clicked_square);
            }
            _ => self.clear_selection(),
        }
    }

    fn clear_selection(&mut self) {
        self.selected_square = None;
        self.legal_moves.clear();
    }

    fn draw_sidebar(&self, ui: &mut egui::Ui, snapshot: &GameSnapshot) {
        ui.heading(&self.title);
        ui.separator();

        let you = match self.local_color {
            Some(color) => format!("You play {}", color_name(color)),
            None => "Spectating".to_string(),
        };
        ui.label(you);
        ui.label(format!("{} to move", color_name(snapshot.side_to_move())));

        let status = match snapshot.status {
            engine::GameStatus::InProgress => None,
            engine::GameStatus::Check(_) => Some(("Check!".to_string(), Color32::from_rgb(200, 120, 0))),
            engine::GameStatus::Checkmate(_) => Some(("Checkmate!".to_string(), Color32::RED)),
            engine::GameStatus::Stalemate => Some(("Stalemate!".to_string(), Color32::RED)),
            engine::GameStatus::Draw(_) => Some(("Draw".to_string(), Color32::RED)),
        };
        if let Some((text, color)) = status {
            ui.label(RichText::new(text).color(color).strong());
            if snapshot.status.is_over() {
                ui.label(describe_status(snapshot.status));
            }
        }

        if self.networked && self.local_color.is_some() && !snapshot.peer_connected {
            ui.label("Waiting for an opponent...");
        }
        if snapshot.viewers > 0 {
            ui.label(format!("{} watching", snapshot.viewers));
        }
        if self.session_closed {
            ui.colored_label(Color32::RED, "Game session stopped");
        }
        if let Some(error) = &self.last_error {
            ui.colored_label(Color32::RED, error);
        }

        ui.separator();
        ui.label(RichText::new("Moves").strong());
        for line in recent_move_lines(&snapshot.moves, self.display.move_list_len) {
            ui.monospace(line);
        }

        ui.separator();
        ui.label(RichText::new("Game log").strong());
        egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
            for line in &snapshot.log {
                ui.small(line);
            }
        });
    }

    fn draw_board(&self, ui: &mut egui::Ui, snapshot: &GameSnapshot, board_rect: Rect, square_size: f32) {
        let painter = ui.painter();
        let board = &snapshot.board;
        let flipped = self.flipped();

        for rank in 0..8u8 {
            for file in 0..8u8 {
                let square = Square::new(file, rank);
                let is_light = (file + rank) % 2 == 1;

                let (col, row) = if flipped { (7 - file, rank) } else { (file, 7 - rank) };
                let square_rect = Rect::from_min_size(
                    board_rect.min + Vec2::new(col as f32 * square_size, row as f32 * square_size),
                    Vec2::splat(square_size),
                );

                let in_last_move = snapshot
                    .last_move
                    .is_some_and(|mv| mv.from == square || mv.to == square);
                let square_color = if Some(square) == self.selected_square {
                    SELECTED
                } else if in_last_move {
                    LAST_MOVE
                } else if is_light {
                    LIGHT_SQUARE
                } else {
                    DARK_SQUARE
                };

                painter.rect_filled(square_rect, 0.0, square_color);

                if self.legal_moves.contains(&square) {
                    let center = square_rect.center();
                    if !is_empty(board.get_piece(square)) {
                        // capture: ring around the target
                        painter.circle_filled(center, square_size * 0.4, HINT);
                        painter.circle_filled(center, square_size * 0.25, square_color);
                    } else {
                        painter.circle_filled(center, square_size * 0.15, HINT);
                    }
                }

                let piece = board.get_piece(square);
                if !is_empty(piece) {
                    draw_piece(painter, piece, square_rect);
                }
            }
        }

        painter.rect_stroke(board_rect, 0.0, egui::Stroke::new(2.0, Color32::BLACK));
    }
}

fn draw_piece(painter: &egui::Painter, piece: u8, square_rect: Rect) {
    let size = square_rect.size() * 0.8;

    let piece_char = match (piece_type(piece), piece_color(piece)) {
        (KING, WHITE) => "♔",
        (QUEEN, WHITE) => "♕",
        (ROOK, WHITE) => "♖",
        (BISHOP, WHITE) => "♗",
        (KNIGHT, WHITE) => "♘",
        (PAWN, WHITE) => "♙",
        (KING, BLACK) => "♚",
        (QUEEN, BLACK) => "♛",
        (ROOK, BLACK) => "♜",
        (BISHOP, BLACK) => "♝",
        (KNIGHT, BLACK) => "♞",
        (PAWN, BLACK) => "♟",
        _ => "?",
    };

    painter.text(
        square_rect.center(),
        egui::Align2::CENTER_CENTER,
        piece_char,
        egui::FontId::proportional(size.x),
        Color32::BLACK,
    );
}

/// Pawn moves onto the last rank always become queens.
fn promote_to_queen(board: &Board, mv: Move) -> Move {
    let last_rank = mv.to.rank() == 0 || mv.to.rank() == 7;
    if piece_type(board.get_piece(mv.from)) == PAWN && last_rank {
        Move::with_promotion(mv.from, mv.to, QUEEN)
    } else {
        mv
    }
}

/// The last `count` moves as numbered lines, `"12. e2e4"` for White and
/// `"12... e7e5"` for Black. Assumes the game started with White to move.
fn recent_move_lines(moves: &[Move], count: usize) -> Vec<String> {
    let start = moves.len().saturating_sub(count);
    moves[start..]
        .iter()
        .enumerate()
        .map(|(offset, mv)| {
            let ply = start + offset;
            let number = ply / 2 + 1;
            if ply % 2 == 0 {
                format!("{number}. {mv}")
            } else {
                format!("{number}... {mv}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(text: &str) -> Move {
        net::decode(text).unwrap()
    }

    #[test]
    fn pawn_reaching_the_last_rank_becomes_a_queen() {
        let board = Board::from_fen("4k3/P7/8/8/8/8/7p/4K3 w - - 0 1").unwrap();
        assert_eq!(promote_to_queen(&board, mv("a7a8")), mv("a7a8q"));
        assert_eq!(promote_to_queen(&board, mv("e1d1")), mv("e1d1"));

        let board = Board::from_fen("4k3/P7/8/8/8/8/7p/4K3 b - - 0 1").unwrap();
        assert_eq!(promote_to_queen(&board, mv("h2h1")), mv("h2h1q"));
    }

    #[test]
    fn move_list_shows_the_latest_moves_numbered() {
        let moves = [mv("e2e4"), mv("e7e5"), mv("g1f3"), mv("b8c6"), mv("f1b5")];
        assert_eq!(
            recent_move_lines(&moves, 3),
            vec!["2. g1f3", "2... b8c6", "3. f1b5"]
        );
        assert_eq!(recent_move_lines(&moves, 10).len(), 5);
        assert!(recent_move_lines(&[], 10).is_empty());
    }
}
