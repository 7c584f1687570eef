use engine::{Board, GameStatus};
use proptest::prelude::*;

/// Plays the `choices[i] % len`-th legal move at each ply until the game ends
/// or the choices run out.
fn playout(choices: &[usize]) -> Board {
    let mut board = Board::new();
    for &choice in choices {
        let moves = board.get_all_legal_moves();
        if moves.is_empty() || board.is_game_over() {
            break;
        }
        board.make_move_unchecked(moves[choice % moves.len()]);
    }
    board
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn undo_restores_every_field(choices in prop::collection::vec(any::<usize>(), 0..60)) {
        let mut board = Board::new();
        let mut snapshots = vec![(board.clone(), board.to_fen())];

        for &choice in &choices {
            let moves = board.get_all_legal_moves();
            if moves.is_empty() {
                break;
            }
            board.make_move_unchecked(moves[choice % moves.len()]);
            snapshots.push((board.clone(), board.to_fen()));
        }

        snapshots.pop();
        while let Some((expected, fen)) = snapshots.pop() {
            board.undo_move().unwrap();
            prop_assert_eq!(board.to_fen(), fen);
            prop_assert_eq!(&board, &expected);
        }
        prop_assert!(board.undo_move().is_err());
    }

    #[test]
    fn mirrored_position_has_mirrored_moves(choices in prop::collection::vec(any::<usize>(), 0..40)) {
        let board = playout(&choices);
        let mirrored = board.mirrored();

        let mut expected: Vec<String> = board
            .get_all_legal_moves()
            .into_iter()
            .map(|mv| {
                let promotion = mv.to_string().chars().nth(4);
                let mut text = format!("{}{}", mv.from.flip_rank(), mv.to.flip_rank());
                text.extend(promotion);
                text
            })
            .collect();
        let mut actual: Vec<String> = mirrored.get_all_legal_moves().into_iter().map(|mv| mv.to_string()).collect();
        expected.sort();
        actual.sort();

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(board.is_in_check(), mirrored.is_in_check());
    }

    #[test]
    fn fen_round_trip_after_random_play(choices in prop::collection::vec(any::<usize>(), 0..60)) {
        let board = playout(&choices);
        let reparsed = Board::from_fen(&board.to_fen()).unwrap();
        prop_assert_eq!(reparsed.to_fen(), board.to_fen());
        prop_assert_eq!(reparsed.get_all_legal_moves(), board.get_all_legal_moves());
    }
}

#[test]
fn status_reflects_checkmate_after_random_play_ends() {
    let board = playout(&[0; 300]);
    let status = board.game_status();
    if board.get_all_legal_moves().is_empty() {
        assert!(matches!(status, GameStatus::Checkmate(_) | GameStatus::Stalemate));
    }
}
