use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::games::{Board, GameError, GameType, Progress, Seat, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Finished,
    Abandoned,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
            GameStatus::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GameStatus::Active),
            "finished" => Some(GameStatus::Finished),
            "abandoned" => Some(GameStatus::Abandoned),
            _ => None,
        }
    }
}

/// A game between two players, with its full server-side state.
///
/// `current_turn` and `status` are projections of the board and are kept in
/// sync by every mutation here, so readers never need to decode the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: String,
    pub player1_id: String,
    pub player2_id: String,
    pub board: Board,
    pub status: GameStatus,
    pub winner_id: Option<String>,
    /// Only player allowed to act now; None when both may act or the game is over
    pub current_turn: Option<String>,
    pub move_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a single player gets to see of a game.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: String,
    pub player1_id: String,
    pub player2_id: String,
    pub game_type: GameType,
    pub game_state: Value,
    pub status: GameStatus,
    pub winner_id: Option<String>,
    pub current_turn: Option<String>,
    pub move_count: i64,
    pub your_turn: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// Start a new game; the creator sits in seat one.
    pub fn new<R: Rng>(
        creator_id: &str,
        opponent_id: &str,
        game_type: GameType,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if creator_id == opponent_id {
            return Err(GameError::SelfPlay);
        }
        let now = Utc::now();
        let mut game = Self {
            id: Uuid::new_v4().to_string(),
            player1_id: creator_id.to_string(),
            player2_id: opponent_id.to_string(),
            board: Board::new(game_type, rng),
            status: GameStatus::Active,
            winner_id: None,
            current_turn: None,
            move_count: 0,
            created_at: now,
            updated_at: now,
        };
        game.sync_turn();
        Ok(game)
    }

    pub fn game_type(&self) -> GameType {
        self.board.game_type()
    }

    pub fn seat_of(&self, user_id: &str) -> Option<Seat> {
        if user_id == self.player1_id {
            Some(Seat::PlayerOne)
        } else if user_id == self.player2_id {
            Some(Seat::PlayerTwo)
        } else {
            None
        }
    }

    pub fn player_id(&self, seat: Seat) -> &str {
        match seat {
            Seat::PlayerOne => &self.player1_id,
            Seat::PlayerTwo => &self.player2_id,
        }
    }

    pub fn players(&self) -> [&str; 2] {
        [&self.player1_id, &self.player2_id]
    }

    pub fn opponent_of(&self, user_id: &str) -> Option<&str> {
        self.seat_of(user_id).map(|seat| self.player_id(seat.other()))
    }

    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active
    }

    /// Validate and apply a move by `user_id`.
    ///
    /// `expected_move`, when given, must equal the current `move_count`;
    /// clients use it to avoid acting on a state they have not seen yet.
    pub fn apply_move<R: Rng>(
        &mut self,
        user_id: &str,
        mv: &Value,
        expected_move: Option<i64>,
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        let seat = self.seat_of(user_id).ok_or(GameError::NotAPlayer)?;
        if !self.is_active() {
            return Err(GameError::GameOver);
        }
        if let Some(expected) = expected_move {
            if expected != self.move_count {
                return Err(GameError::StaleMove {
                    expected,
                    actual: self.move_count,
                });
            }
        }

        let progress = self.board.apply(seat, mv, rng)?;
        self.move_count += 1;
        self.updated_at = Utc::now();
        if let Progress::Finished { winner } = progress {
            self.status = GameStatus::Finished;
            self.winner_id = winner.map(|s| self.player_id(s).to_string());
        }
        self.sync_turn();
        Ok(progress)
    }

    /// Give up an active game; the opponent is recorded as the winner.
    pub fn forfeit(&mut self, user_id: &str) -> Result<(), GameError> {
        let seat = self.seat_of(user_id).ok_or(GameError::NotAPlayer)?;
        if !self.is_active() {
            return Err(GameError::GameOver);
        }
        self.status = GameStatus::Abandoned;
        self.winner_id = Some(self.player_id(seat.other()).to_string());
        self.updated_at = Utc::now();
        self.sync_turn();
        Ok(())
    }

    fn sync_turn(&mut self) {
        self.current_turn = if self.is_active() {
            match self.board.turn() {
                Turn::Only(seat) => Some(self.player_id(seat).to_string()),
                Turn::Both | Turn::Over => None,
            }
        } else {
            None
        };
    }

    /// Whether `user_id` may submit a move right now.
    pub fn can_act(&self, user_id: &str) -> bool {
        let Some(seat) = self.seat_of(user_id) else {
            return false;
        };
        self.is_active()
            && match self.board.turn() {
                Turn::Only(s) => s == seat,
                Turn::Both => true,
                Turn::Over => false,
            }
    }

    /// Per-player view; None when `viewer` is not a player.
    pub fn view_for(&self, viewer: &str) -> Option<GameView> {
        let seat = self.seat_of(viewer)?;
        Some(GameView {
            id: self.id.clone(),
            player1_id: self.player1_id.clone(),
            player2_id: self.player2_id.clone(),
            game_type: self.game_type(),
            game_state: self.board.view(seat),
            status: self.status,
            winner_id: self.winner_id.clone(),
            current_turn: self.current_turn.clone(),
            move_count: self.move_count,
            your_turn: self.can_act(viewer),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
