//! Hidden simultaneous commits, shared by the round-based games.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{GameError, Seat, Turn};

/// One pending slot per seat. A seat may commit once per round; the round
/// resolves when both slots are filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitments<T> {
    slots: [Option<T>; 2],
}

impl<T> Default for Commitments<T> {
    fn default() -> Self {
        Self { slots: [None, None] }
    }
}

impl<T: Clone + Serialize> Commitments<T> {
    pub fn has_committed(&self, seat: Seat) -> bool {
        self.slots[seat.index()].is_some()
    }

    /// Record a commit. Returns both values, in seat order, once the round is complete.
    pub fn commit(&mut self, seat: Seat, value: T) -> Result<Option<[T; 2]>, GameError> {
        if self.has_committed(seat) {
            return Err(GameError::NotYourTurn);
        }
        self.slots[seat.index()] = Some(value);

        if self.slots.iter().all(Option::is_some) {
            let first = self.slots[0].take();
            let second = self.slots[1].take();
            if let (Some(a), Some(b)) = (first, second) {
                return Ok(Some([a, b]));
            }
        }
        Ok(None)
    }

    pub fn turn(&self) -> Turn {
        match (self.has_committed(Seat::PlayerOne), self.has_committed(Seat::PlayerTwo)) {
            (true, false) => Turn::Only(Seat::PlayerTwo),
            (false, true) => Turn::Only(Seat::PlayerOne),
            _ => Turn::Both,
        }
    }

    /// Viewer sees its own pending value; the opponent's only as a flag.
    pub fn view(&self, viewer: Seat) -> Value {
        let slot = |seat: Seat| {
            let committed = self.has_committed(seat);
            let value = if seat == viewer {
                self.slots[seat.index()].as_ref().map(|v| json!(v))
            } else {
                None
            };
            json!({ "committed": committed, "value": value })
        };
        json!({
            "player1": slot(Seat::PlayerOne),
            "player2": slot(Seat::PlayerTwo),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_resolves_in_seat_order() {
        let mut c = Commitments::default();
        assert_eq!(c.turn(), Turn::Both);
        assert_eq!(c.commit(Seat::PlayerTwo, "b").unwrap(), None);
        assert_eq!(c.turn(), Turn::Only(Seat::PlayerOne));
        assert_eq!(c.commit(Seat::PlayerOne, "a").unwrap(), Some(["a", "b"]));
        // Slots are cleared for the next round
        assert_eq!(c.turn(), Turn::Both);
        assert!(!c.has_committed(Seat::PlayerOne));
    }

    #[test]
    fn test_double_commit_rejected() {
        let mut c = Commitments::default();
        c.commit(Seat::PlayerOne, 1).unwrap();
        assert_eq!(c.commit(Seat::PlayerOne, 2), Err(GameError::NotYourTurn));
    }

    #[test]
    fn test_view_hides_opponent_value() {
        let mut c = Commitments::default();
        c.commit(Seat::PlayerOne, "secret").unwrap();

        let mine = c.view(Seat::PlayerOne);
        assert_eq!(mine["player1"]["value"], "secret");

        let theirs = c.view(Seat::PlayerTwo);
        assert_eq!(theirs["player1"]["committed"], true);
        assert!(theirs["player1"]["value"].is_null());
        assert_eq!(theirs["player2"]["committed"], false);
    }
}
