//! Server-authoritative turn-based mini-games.
//!
//! Clients only ever submit moves; the state lives here. Each game type is a
//! small state machine that validates a move for a seat, mutates its state and
//! reports whether the match continues (and who may act next) or is over.

pub mod cosmic_cards;
pub mod rock_paper_scissors;
pub mod simultaneous;
pub mod tic_tac_toe;

pub use cosmic_cards::CosmicCards;
pub use rock_paper_scissors::RockPaperScissors;
pub use tic_tac_toe::TicTacToe;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
)]
pub enum GameType {
    #[serde(rename = "tic-tac-toe")]
    #[strum(serialize = "tic-tac-toe")]
    TicTacToe,
    #[serde(rename = "rock-paper-scissors")]
    #[strum(serialize = "rock-paper-scissors")]
    RockPaperScissors,
    #[serde(rename = "cards")]
    #[strum(serialize = "cards")]
    CosmicCards,
}

/// Which side of the table a player sits on. Player one is always the creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    #[serde(rename = "player1")]
    PlayerOne,
    #[serde(rename = "player2")]
    PlayerTwo,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::PlayerOne => Seat::PlayerTwo,
            Seat::PlayerTwo => Seat::PlayerOne,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Seat::PlayerOne => 0,
            Seat::PlayerTwo => 1,
        }
    }
}

/// Who may act right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Only(Seat),
    /// Simultaneous phase: both players still have to commit
    Both,
    Over,
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    /// `winner` is None on a draw
    Finished { winner: Option<Seat> },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("invalid move: {0}")]
    InvalidMove(String),
    #[error("game is already over")]
    GameOver,
    #[error("you are not a player in this game")]
    NotAPlayer,
    #[error("you cannot play against yourself")]
    SelfPlay,
    #[error("stale move: expected move {expected}, game is at move {actual}")]
    StaleMove { expected: i64, actual: i64 },
    #[error("unknown game type: {0}")]
    UnknownGameType(String),
    #[error("corrupt game state: {0}")]
    CorruptState(String),
}

impl GameType {
    pub fn parse(s: &str) -> Result<GameType, GameError> {
        s.parse().map_err(|_| GameError::UnknownGameType(s.to_string()))
    }
}

/// Decode a client move payload into an engine's move type.
pub(crate) fn parse_move<M: DeserializeOwned>(mv: &Value) -> Result<M, GameError> {
    serde_json::from_value(mv.clone()).map_err(|e| GameError::InvalidMove(e.to_string()))
}

/// Decide a finished match from per-seat scores; equal scores are a draw.
pub(crate) fn leader(scores: [u32; 2]) -> Option<Seat> {
    match scores[0].cmp(&scores[1]) {
        std::cmp::Ordering::Greater => Some(Seat::PlayerOne),
        std::cmp::Ordering::Less => Some(Seat::PlayerTwo),
        std::cmp::Ordering::Equal => None,
    }
}

/// State of one game, whichever type it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Board {
    TicTacToe(TicTacToe),
    RockPaperScissors(RockPaperScissors),
    CosmicCards(CosmicCards),
}

impl Board {
    pub fn new<R: Rng>(game_type: GameType, rng: &mut R) -> Board {
        match game_type {
            GameType::TicTacToe => Board::TicTacToe(TicTacToe::new()),
            GameType::RockPaperScissors => Board::RockPaperScissors(RockPaperScissors::new()),
            GameType::CosmicCards => Board::CosmicCards(CosmicCards::deal(rng)),
        }
    }

    pub fn game_type(&self) -> GameType {
        match self {
            Board::TicTacToe(_) => GameType::TicTacToe,
            Board::RockPaperScissors(_) => GameType::RockPaperScissors,
            Board::CosmicCards(_) => GameType::CosmicCards,
        }
    }

    /// Restore a board from its stored JSON.
    pub fn from_json(game_type: GameType, json: &str) -> Result<Board, GameError> {
        let corrupt = |e: serde_json::Error| GameError::CorruptState(e.to_string());
        Ok(match game_type {
            GameType::TicTacToe => Board::TicTacToe(serde_json::from_str(json).map_err(corrupt)?),
            GameType::RockPaperScissors => {
                Board::RockPaperScissors(serde_json::from_str(json).map_err(corrupt)?)
            }
            GameType::CosmicCards => Board::CosmicCards(serde_json::from_str(json).map_err(corrupt)?),
        })
    }

    /// Full (unredacted) state, for storage only.
    pub fn to_json(&self) -> Result<String, GameError> {
        let result = match self {
            Board::TicTacToe(b) => serde_json::to_string(b),
            Board::RockPaperScissors(b) => serde_json::to_string(b),
            Board::CosmicCards(b) => serde_json::to_string(b),
        };
        result.map_err(|e| GameError::CorruptState(e.to_string()))
    }

    pub fn apply<R: Rng>(
        &mut self,
        seat: Seat,
        mv: &Value,
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        match self {
            Board::TicTacToe(b) => b.apply(seat, parse_move(mv)?),
            Board::RockPaperScissors(b) => b.apply(seat, parse_move(mv)?),
            Board::CosmicCards(b) => b.apply(seat, parse_move(mv)?, rng),
        }
    }

    pub fn turn(&self) -> Turn {
        match self {
            Board::TicTacToe(b) => b.turn(),
            Board::RockPaperScissors(b) => b.turn(),
            Board::CosmicCards(b) => b.turn(),
        }
    }

    /// State as seen from `viewer`'s seat, with the opponent's hidden information removed.
    pub fn view(&self, viewer: Seat) -> Value {
        match self {
            Board::TicTacToe(b) => b.view(),
            Board::RockPaperScissors(b) => b.view(viewer),
            Board::CosmicCards(b) => b.view(viewer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    #[test]
    fn test_game_type_wire_names() {
        assert_eq!(GameType::parse("tic-tac-toe").unwrap(), GameType::TicTacToe);
        assert_eq!(GameType::parse("rock-paper-scissors").unwrap(), GameType::RockPaperScissors);
        assert_eq!(GameType::parse("cards").unwrap(), GameType::CosmicCards);
        assert_eq!(GameType::CosmicCards.to_string(), "cards");
        assert_eq!(
            serde_json::to_value(GameType::TicTacToe).unwrap(),
            json!("tic-tac-toe")
        );
        assert_eq!(
            GameType::parse("chess"),
            Err(GameError::UnknownGameType("chess".to_string()))
        );
    }

    #[test]
    fn test_board_roundtrips_through_storage() {
        let mut rng = StdRng::seed_from_u64(7);
        for game_type in [GameType::TicTacToe, GameType::RockPaperScissors, GameType::CosmicCards] {
            let board = Board::new(game_type, &mut rng);
            let json = board.to_json().unwrap();
            assert_eq!(Board::from_json(game_type, &json).unwrap(), board);
        }
    }

    #[test]
    fn test_garbage_move_is_invalid() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut board = Board::new(GameType::TicTacToe, &mut rng);
        let err = board
            .apply(Seat::PlayerOne, &json!({"choice": "rock"}), &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidMove(_)));
    }

    #[test]
    fn test_corrupt_state_is_reported() {
        let err = Board::from_json(GameType::TicTacToe, "{not json").unwrap_err();
        assert!(matches!(err, GameError::CorruptState(_)));
    }

    #[test]
    fn test_leader() {
        assert_eq!(leader([2, 1]), Some(Seat::PlayerOne));
        assert_eq!(leader([0, 3]), Some(Seat::PlayerTwo));
        assert_eq!(leader([1, 1]), None);
    }
}
