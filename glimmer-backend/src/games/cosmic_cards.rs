//! Cosmic cards: both players play a card from a three-card hand each round,
//! the higher rank scores. Hands are dealt and refilled by the server.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::simultaneous::Commitments;
use super::{GameError, Progress, Seat, Turn, leader};

pub const HAND_SIZE: usize = 3;
pub const ROUNDS: usize = 5;

const MIN_RANK: u8 = 2;
/// Ace
const MAX_RANK: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

const SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub rank: u8,
    pub suit: Suit,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmicCardsMove {
    #[serde(alias = "card_id")]
    pub card_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRound {
    pub round: u32,
    pub played: [Card; 2],
    pub winner: Option<Seat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmicCards {
    pub round: u32,
    pub hands: [Vec<Card>; 2],
    pub pending: Commitments<Card>,
    pub scores: [u32; 2],
    pub history: Vec<CardRound>,
    pub winner: Option<Seat>,
    pub finished: bool,
    /// Source of unique card ids within this game
    next_card: u32,
}

impl CosmicCards {
    pub fn deal<R: Rng>(rng: &mut R) -> Self {
        let mut game = Self {
            round: 1,
            hands: [Vec::new(), Vec::new()],
            pending: Commitments::default(),
            scores: [0, 0],
            history: Vec::new(),
            winner: None,
            finished: false,
            next_card: 0,
        };
        for seat in [Seat::PlayerOne, Seat::PlayerTwo] {
            for _ in 0..HAND_SIZE {
                let card = game.draw(rng);
                game.hands[seat.index()].push(card);
            }
        }
        game
    }

    fn draw<R: Rng>(&mut self, rng: &mut R) -> Card {
        self.next_card += 1;
        Card {
            id: format!("c{}", self.next_card),
            rank: rng.gen_range(MIN_RANK..=MAX_RANK),
            suit: SUITS[rng.gen_range(0..SUITS.len())],
        }
    }

    pub fn apply<R: Rng>(
        &mut self,
        seat: Seat,
        mv: CosmicCardsMove,
        rng: &mut R,
    ) -> Result<Progress, GameError> {
        if self.finished {
            return Err(GameError::GameOver);
        }
        if self.pending.has_committed(seat) {
            return Err(GameError::NotYourTurn);
        }
        let hand = &mut self.hands[seat.index()];
        let position = hand
            .iter()
            .position(|c| c.id == mv.card_id)
            .ok_or_else(|| GameError::InvalidMove(format!("card {} is not in your hand", mv.card_id)))?;
        let card = hand.remove(position);

        let Some([first, second]) = self.pending.commit(seat, card)? else {
            return Ok(Progress::Continue);
        };

        let round_winner = match first.rank.cmp(&second.rank) {
            std::cmp::Ordering::Greater => Some(Seat::PlayerOne),
            std::cmp::Ordering::Less => Some(Seat::PlayerTwo),
            std::cmp::Ordering::Equal => None,
        };
        if let Some(w) = round_winner {
            self.scores[w.index()] += 1;
        }
        self.history.push(CardRound {
            round: self.round,
            played: [first, second],
            winner: round_winner,
        });
        self.round += 1;

        if self.history.len() >= ROUNDS {
            self.finished = true;
            self.winner = leader(self.scores);
            return Ok(Progress::Finished { winner: self.winner });
        }

        for seat in [Seat::PlayerOne, Seat::PlayerTwo] {
            let card = self.draw(rng);
            self.hands[seat.index()].push(card);
        }
        Ok(Progress::Continue)
    }

    pub fn turn(&self) -> Turn {
        if self.finished { Turn::Over } else { self.pending.turn() }
    }

    /// The viewer's own hand is visible; the opponent's is reduced to a count.
    pub fn view(&self, viewer: Seat) -> Value {
        json!({
            "round": self.round,
            "hand": self.hands[viewer.index()],
            "opponentHandSize": self.hands[viewer.other().index()].len(),
            "scores": self.scores,
            "history": self.history,
            "pending": self.pending.view(viewer),
            "winner": self.winner,
            "finished": self.finished,
        })
    }
}
