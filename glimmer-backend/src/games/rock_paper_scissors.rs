use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::simultaneous::Commitments;
use super::{GameError, Progress, Seat, Turn, leader};

/// Round wins needed to take the match
pub const ROUNDS_TO_WIN: u32 = 2;
/// Decisive or not, the match ends after this many rounds
pub const MAX_ROUNDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    pub fn beats(self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors) | (Hand::Paper, Hand::Rock) | (Hand::Scissors, Hand::Paper)
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RockPaperScissorsMove {
    pub choice: Hand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: u32,
    /// In seat order
    pub choices: [Hand; 2],
    pub winner: Option<Seat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RockPaperScissors {
    pub round: u32,
    pub pending: Commitments<Hand>,
    pub scores: [u32; 2],
    pub history: Vec<RoundResult>,
    pub winner: Option<Seat>,
    pub finished: bool,
}

impl Default for RockPaperScissors {
    fn default() -> Self {
        Self::new()
    }
}

impl RockPaperScissors {
    pub fn new() -> Self {
        Self {
            round: 1,
            pending: Commitments::default(),
            scores: [0, 0],
            history: Vec::new(),
            winner: None,
            finished: false,
        }
    }

    pub fn apply(&mut self, seat: Seat, mv: RockPaperScissorsMove) -> Result<Progress, GameError> {
        if self.finished {
            return Err(GameError::GameOver);
        }
        let Some([first, second]) = self.pending.commit(seat, mv.choice)? else {
            return Ok(Progress::Continue);
        };

        let round_winner = if first.beats(second) {
            Some(Seat::PlayerOne)
        } else if second.beats(first) {
            Some(Seat::PlayerTwo)
        } else {
            None
        };
        if let Some(w) = round_winner {
            self.scores[w.index()] += 1;
        }
        self.history.push(RoundResult {
            round: self.round,
            choices: [first, second],
            winner: round_winner,
        });
        self.round += 1;

        if let Some(seat) = [Seat::PlayerOne, Seat::PlayerTwo]
            .into_iter()
            .find(|s| self.scores[s.index()] >= ROUNDS_TO_WIN)
        {
            return Ok(self.finish(Some(seat)));
        }
        if self.history.len() >= MAX_ROUNDS {
            return Ok(self.finish(leader(self.scores)));
        }
        Ok(Progress::Continue)
    }

    fn finish(&mut self, winner: Option<Seat>) -> Progress {
        self.finished = true;
        self.winner = winner;
        Progress::Finished { winner }
    }

    pub fn turn(&self) -> Turn {
        if self.finished { Turn::Over } else { self.pending.turn() }
    }

    pub fn view(&self, viewer: Seat) -> Value {
        json!({
            "round": self.round,
            "scores": self.scores,
            "history": self.history,
            "pending": self.pending.view(viewer),
            "winner": self.winner,
            "finished": self.finished,
        })
    }
}
