//! Move tokens: `<from><to>[promotion]`, e.g. `e2e4` or `e7e8q`.

use engine::{piece_from_letter, Move, Square, BISHOP, KNIGHT, QUEEN, ROOK};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token '{0}' must be 4 or 5 characters")]
    Length(String),
    #[error("'{0}' is not a square")]
    Square(String),
    #[error("'{0}' is not a promotion piece")]
    Promotion(char),
    #[error("line of {0} bytes is too long for a move")]
    Oversized(usize),
}

pub fn encode(mv: Move) -> String {
    mv.to_string()
}

pub fn decode(token: &str) -> Result<Move, TokenError> {
    if !token.is_ascii() || !(4..=5).contains(&token.len()) {
        return Err(TokenError::Length(token.to_string()));
    }

    let from = parse_square(&token[0..2])?;
    let to = parse_square(&token[2..4])?;

    match token[4..].chars().next() {
        None => Ok(Move::new(from, to)),
        Some(letter) => {
            let piece_type = piece_from_letter(letter)
                .filter(|&piece_type| matches!(piece_type, QUEEN | ROOK | BISHOP | KNIGHT))
                .ok_or(TokenError::Promotion(letter))?;
            Ok(Move::with_promotion(from, to, piece_type))
        }
    }
}

fn parse_square(text: &str) -> Result<Square, TokenError> {
    Square::from_algebraic(text).ok_or_else(|| TokenError::Square(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_plain_and_promotion_moves() {
        let e2 = Square::from_algebraic("e2").unwrap();
        let e4 = Square::from_algebraic("e4").unwrap();
        assert_eq!(encode(Move::new(e2, e4)), "e2e4");

        let e7 = Square::from_algebraic("e7").unwrap();
        let e8 = Square::from_algebraic("e8").unwrap();
        assert_eq!(encode(Move::with_promotion(e7, e8, KNIGHT)), "e7e8n");
    }

    #[test]
    fn decodes_queen_promotion() {
        let mv = decode("e7e8q").unwrap();
        assert_eq!(mv.from, Square::from_algebraic("e7").unwrap());
        assert_eq!(mv.to, Square::from_algebraic("e8").unwrap());
        assert_eq!(mv.promotion, Some(QUEEN));
    }

    #[test]
    fn uppercase_promotion_letter_is_accepted() {
        assert_eq!(decode("a2a1Q").unwrap().promotion, Some(QUEEN));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(decode("e2e"), Err(TokenError::Length("e2e".into())));
        assert_eq!(decode("e2e4e5"), Err(TokenError::Length("e2e4e5".into())));
        assert_eq!(decode("z2e4"), Err(TokenError::Square("z2".into())));
        assert_eq!(decode("e2e9"), Err(TokenError::Square("e9".into())));
        assert_eq!(decode("e7e8k"), Err(TokenError::Promotion('k')));
        assert_eq!(decode("e7e8x"), Err(TokenError::Promotion('x')));
        assert!(decode("é2e4").is_err());
    }
}
