use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{GameError, Progress, Seat, Turn};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    fn for_seat(seat: Seat) -> Mark {
        match seat {
            Seat::PlayerOne => Mark::X,
            Seat::PlayerTwo => Mark::O,
        }
    }

    fn seat(self) -> Seat {
        match self {
            Mark::X => Seat::PlayerOne,
            Mark::O => Seat::PlayerTwo,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicTacToeMove {
    pub cell: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicTacToe {
    pub board: [Option<Mark>; 9],
    pub next: Seat,
    pub winner: Option<Mark>,
    pub winning_line: Option<[usize; 3]>,
    pub is_draw: bool,
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToe {
    /// Empty board; X (player one) moves first.
    pub fn new() -> Self {
        Self {
            board: [None; 9],
            next: Seat::PlayerOne,
            winner: None,
            winning_line: None,
            is_draw: false,
        }
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some() || self.is_draw
    }

    pub fn apply(&mut self, seat: Seat, mv: TicTacToeMove) -> Result<Progress, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if seat != self.next {
            return Err(GameError::NotYourTurn);
        }
        let cell = self
            .board
            .get_mut(mv.cell)
            .ok_or_else(|| GameError::InvalidMove(format!("cell {} is off the board", mv.cell)))?;
        if cell.is_some() {
            return Err(GameError::InvalidMove(format!("cell {} is already taken", mv.cell)));
        }
        *cell = Some(Mark::for_seat(seat));

        if let Some((mark, line)) = self.find_line() {
            self.winner = Some(mark);
            self.winning_line = Some(line);
            return Ok(Progress::Finished { winner: Some(mark.seat()) });
        }
        if self.board.iter().all(Option::is_some) {
            self.is_draw = true;
            return Ok(Progress::Finished { winner: None });
        }

        self.next = seat.other();
        Ok(Progress::Continue)
    }

    fn find_line(&self) -> Option<(Mark, [usize; 3])> {
        LINES.iter().find_map(|&[a, b, c]| match self.board[a] {
            Some(mark) if self.board[b] == Some(mark) && self.board[c] == Some(mark) => {
                Some((mark, [a, b, c]))
            }
            _ => None,
        })
    }

    pub fn turn(&self) -> Turn {
        if self.is_over() { Turn::Over } else { Turn::Only(self.next) }
    }

    /// Nothing is hidden in tic-tac-toe.
    pub fn view(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(game: &mut TicTacToe, seat: Seat, cell: usize) -> Result<Progress, GameError> {
        game.apply(seat, TicTacToeMove { cell })
    }

    #[test]
    fn test_turns_alternate() {
        let mut game = TicTacToe::new();
        assert_eq!(game.turn(), Turn::Only(Seat::PlayerOne));
        assert_eq!(play(&mut game, Seat::PlayerTwo, 0), Err(GameError::NotYourTurn));

        assert_eq!(play(&mut game, Seat::PlayerOne, 4), Ok(Progress::Continue));
        assert_eq!(game.turn(), Turn::Only(Seat::PlayerTwo));
        assert_eq!(play(&mut game, Seat::PlayerOne, 0), Err(GameError::NotYourTurn));
        assert_eq!(game.board[4], Some(Mark::X));
    }

    #[test]
    fn test_rejects_taken_and_off_board_cells() {
        let mut game = TicTacToe::new();
        play(&mut game, Seat::PlayerOne, 4).unwrap();
        assert!(matches!(play(&mut game, Seat::PlayerTwo, 4), Err(GameError::InvalidMove(_))));
        assert!(matches!(play(&mut game, Seat::PlayerTwo, 9), Err(GameError::InvalidMove(_))));
        // A rejected move does not pass the turn
        assert_eq!(game.turn(), Turn::Only(Seat::PlayerTwo));
    }

    #[test]
    fn test_column_win() {
        let mut game = TicTacToe::new();
        for (seat, cell) in [
            (Seat::PlayerOne, 1),
            (Seat::PlayerTwo, 0),
            (Seat::PlayerOne, 4),
            (Seat::PlayerTwo, 2),
        ] {
            assert_eq!(play(&mut game, seat, cell), Ok(Progress::Continue));
        }
        assert_eq!(
            play(&mut game, Seat::PlayerOne, 7),
            Ok(Progress::Finished { winner: Some(Seat::PlayerOne) })
        );
        assert_eq!(game.winning_line, Some([1, 4, 7]));
        assert_eq!(game.turn(), Turn::Over);
        assert_eq!(play(&mut game, Seat::PlayerTwo, 8), Err(GameError::GameOver));
    }

    #[test]
    fn test_full_board_draw() {
        // X O X / X O O / O X X
        let mut game = TicTacToe::new();
        let moves = [0, 1, 2, 4, 3, 5, 7, 6];
        let mut seat = Seat::PlayerOne;
        for cell in moves {
            assert_eq!(play(&mut game, seat, cell), Ok(Progress::Continue));
            seat = seat.other();
        }
        assert_eq!(play(&mut game, seat, 8), Ok(Progress::Finished { winner: None }));
        assert!(game.is_draw);
        assert!(game.winner.is_none());
    }

    #[test]
    fn test_view_uses_wire_names() {
        let mut game = TicTacToe::new();
        play(&mut game, Seat::PlayerOne, 0).unwrap();
        let view = game.view();
        assert_eq!(view["board"][0], "X");
        assert_eq!(view["next"], "player2");
        assert_eq!(view["isDraw"], false);
    }
}
