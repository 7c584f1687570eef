use std::time::Instant;

use crate::{Board, Move};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerftResult {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
    pub time_ms: u128,
}

impl PerftResult {
    pub fn nodes_per_second(&self) -> u64 {
        if self.time_ms == 0 {
            return 0;
        }
        (self.nodes * 1000) / (self.time_ms as u64)
    }
}

#[derive(Debug)]
pub struct PerftTestCase {
    pub name: &'static str,
    pub fen: &'static str,
    pub expected_results: &'static [(u32, u64)], // (depth, expected_nodes)
}

// Standard perft test positions
pub const PERFT_POSITIONS: &[PerftTestCase] = &[
    PerftTestCase {
        name: "Starting Position",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        expected_results: &[(1, 20), (2, 400), (3, 8_902), (4, 197_281), (5, 4_865_609)],
    },
    PerftTestCase {
        name: "Kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        expected_results: &[(1, 48), (2, 2_039), (3, 97_862), (4, 4_085_603)],
    },
    PerftTestCase {
        name: "Position 3",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        expected_results: &[(1, 14), (2, 191), (3, 2_812), (4, 43_238), (5, 674_624)],
    },
    PerftTestCase {
        name: "Position 4",
        fen: "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        expected_results: &[(1, 6), (2, 264), (3, 9_467), (4, 422_333)],
    },
    PerftTestCase {
        name: "Position 5",
        fen: "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        expected_results: &[(1, 44), (2, 1_486), (3, 62_379), (4, 2_103_487)],
    },
    PerftTestCase {
        name: "Position 6",
        fen: "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        expected_results: &[(1, 46), (2, 2_079), (3, 89_890), (4, 3_894_594)],
    },
];

/// Counts leaf nodes of the legal move tree to `depth`.
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = board.get_all_legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves {
        board.make_move_unchecked(mv);
        nodes += perft(board, depth - 1);
        // just made it, the history cannot be empty
        let _ = board.undo_move();
    }
    nodes
}

/// Perft that also classifies the moves played at the last ply.
pub fn perft_detailed(board: &mut Board, depth: u32) -> PerftResult {
    let start_time = Instant::now();
    let mut result = PerftResult::default();
    collect_detailed(board, depth, &mut result);
    result.time_ms = start_time.elapsed().as_millis();
    result
}

fn collect_detailed(board: &mut Board, depth: u32, result: &mut PerftResult) {
    if depth == 0 {
        result.nodes += 1;
        return;
    }

    for mv in board.get_all_legal_moves() {
        let game_move = board.make_move_unchecked(mv);
        if depth == 1 {
            result.captures += game_move.is_capture() as u64;
            result.en_passant += game_move.is_en_passant as u64;
            result.castles += game_move.is_castling as u64;
            result.promotions += mv.is_promotion() as u64;
            if board.is_in_check() {
                result.checks += 1;
                if !board.can_player_move() {
                    result.checkmates += 1;
                }
            }
        }
        collect_detailed(board, depth - 1, result);
        let _ = board.undo_move();
    }
}

/// Per-root-move node counts, largest subtree first.
pub fn perft_divide(board: &mut Board, depth: u32) -> Vec<(Move, u64)> {
    let mut results = Vec::new();

    for mv in board.get_all_legal_moves() {
        board.make_move_unchecked(mv);
        let nodes = if depth > 1 { perft(board, depth - 1) } else { 1 };
        results.push((mv, nodes));
        let _ = board.undo_move();
    }

    results.sort_by(|a, b| b.1.cmp(&a.1));
    results
}
