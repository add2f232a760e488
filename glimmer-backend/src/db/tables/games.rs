//! Game database operations

use rusqlite::{OptionalExtension, TransactionBehavior};

use crate::db::sqlite::{parse_timestamp, timestamp, unknown_variant};
use crate::db::{Database, DbError, DbResult};
use crate::games::{Board, GameType};
use crate::models::{Game, GameStatus};

const GAME_COLUMNS: &str = "id, player1_id, player2_id, game_type, game_state, status, winner_id, \
     current_turn, move_count, created_at, updated_at";

impl Database {
    pub fn create_game(&self, game: &Game) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO games (id, player1_id, player2_id, game_type, game_state, status, winner_id,
                                current_turn, move_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                &game.id,
                &game.player1_id,
                &game.player2_id,
                game.game_type().as_ref(),
                game.board.to_json()?,
                game.status.as_str(),
                &game.winner_id,
                &game.current_turn,
                game.move_count,
                timestamp(&game.created_at),
                timestamp(&game.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_game(&self, game_id: &str) -> DbResult<Option<Game>> {
        let conn = self.conn()?;
        let game = conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1"),
                [game_id],
                Self::row_to_game,
            )
            .optional()?;
        Ok(game)
    }

    /// Active games the user is playing in, most recently touched first.
    pub fn list_active_games(&self, user_id: &str) -> DbResult<Vec<Game>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {GAME_COLUMNS} FROM games
             WHERE (player1_id = ?1 OR player2_id = ?1) AND status = 'active'
             ORDER BY updated_at DESC"
        ))?;
        let games = stmt
            .query_map([user_id], Self::row_to_game)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(games)
    }

    /// Read-modify-write a game under an immediate (write-locked) transaction.
    ///
    /// `f` sees the latest stored state; if it returns an error nothing is
    /// written. Concurrent callers on the same game are serialized by SQLite,
    /// so two moves can never be applied against the same snapshot.
    /// Returns `Ok(None)` when the game does not exist.
    pub fn update_game_atomically<T, E, F>(&self, game_id: &str, f: F) -> Result<Option<(Game, T)>, E>
    where
        E: From<DbError>,
        F: FnOnce(&mut Game) -> Result<T, E>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;

        let game = tx
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1"),
                [game_id],
                Self::row_to_game,
            )
            .optional()
            .map_err(DbError::from)?;
        let Some(mut game) = game else {
            return Ok(None);
        };

        // Dropping the transaction on error rolls it back
        let output = f(&mut game)?;

        let state = game.board.to_json().map_err(DbError::from)?;
        tx.execute(
            "UPDATE games
             SET game_state = ?1, status = ?2, winner_id = ?3, current_turn = ?4,
                 move_count = ?5, updated_at = ?6
             WHERE id = ?7",
            rusqlite::params![
                state,
                game.status.as_str(),
                &game.winner_id,
                &game.current_turn,
                game.move_count,
                timestamp(&game.updated_at),
                &game.id,
            ],
        )
        .map_err(DbError::from)?;
        tx.commit().map_err(DbError::from)?;

        Ok(Some((game, output)))
    }

    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<Game> {
        let game_type: String = row.get(3)?;
        let state: String = row.get(4)?;
        let status: String = row.get(5)?;
        let created_at: String = row.get(9)?;
        let updated_at: String = row.get(10)?;

        let conversion = |column: usize, e: crate::games::GameError| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        };
        let game_type = GameType::parse(&game_type).map_err(|e| conversion(3, e))?;
        let board = Board::from_json(game_type, &state).map_err(|e| conversion(4, e))?;

        Ok(Game {
            id: row.get(0)?,
            player1_id: row.get(1)?,
            player2_id: row.get(2)?,
            board,
            status: GameStatus::from_str(&status).ok_or_else(|| unknown_variant(5, &status))?,
            winner_id: row.get(6)?,
            current_turn: row.get(7)?,
            move_count: row.get(8)?,
            created_at: parse_timestamp(9, &created_at)?,
            updated_at: parse_timestamp(10, &updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{Database, DbError};
    use crate::games::{GameError, GameType};
    use crate::models::{Game, GameStatus};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Debug)]
    enum TestError {
        Db(DbError),
        Game(GameError),
    }

    impl From<DbError> for TestError {
        fn from(e: DbError) -> Self {
            TestError::Db(e)
        }
    }

    impl From<GameError> for TestError {
        fn from(e: GameError) -> Self {
            TestError::Game(e)
        }
    }

    fn setup(db: &Database, game_type: GameType) -> Game {
        db.touch_user("ana").unwrap();
        db.touch_user("ben").unwrap();
        let game = Game::new("ana", "ben", game_type, &mut StdRng::seed_from_u64(3)).unwrap();
        db.create_game(&game).unwrap();
        game
    }

    #[test]
    fn test_game_round_trips_through_storage() {
        let db = Database::new(":memory:").unwrap();
        let game = setup(&db, GameType::CosmicCards);
        let loaded = db.get_game(&game.id).unwrap().expect("stored game");
        assert_eq!(loaded.board, game.board);
        assert_eq!(loaded.current_turn, game.current_turn);
        assert_eq!(db.list_active_games("ben").unwrap().len(), 1);
        assert!(db.list_active_games("cat").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        let db = Database::new(":memory:").unwrap();
        let game = setup(&db, GameType::TicTacToe);
        db.conn()
            .unwrap()
            .execute("UPDATE games SET status = 'paused' WHERE id = ?1", [&game.id])
            .unwrap();
        assert!(matches!(db.get_game(&game.id), Err(DbError::Sqlite(_))));
    }

    #[test]
    fn test_atomic_update_persists_move() {
        let db = Database::new(":memory:").unwrap();
        let game = setup(&db, GameType::TicTacToe);
        let mut rng = StdRng::seed_from_u64(4);

        let (updated, _) = db
            .update_game_atomically::<_, TestError, _>(&game.id, |g| {
                Ok(g.apply_move("ana", &json!({"cell": 4}), Some(0), &mut rng)?)
            })
            .unwrap()
            .expect("game exists");
        assert_eq!(updated.move_count, 1);

        let stored = db.get_game(&game.id).unwrap().unwrap();
        assert_eq!(stored.move_count, 1);
        assert_eq!(stored.current_turn.as_deref(), Some("ben"));
    }

    #[test]
    fn test_rejected_update_writes_nothing() {
        let db = Database::new(":memory:").unwrap();
        let game = setup(&db, GameType::TicTacToe);
        let mut rng = StdRng::seed_from_u64(4);

        let result = db.update_game_atomically::<_, TestError, _>(&game.id, |g| {
            Ok(g.apply_move("ben", &json!({"cell": 4}), None, &mut rng)?)
        });
        assert!(matches!(result, Err(TestError::Game(GameError::NotYourTurn))));
        assert_eq!(db.get_game(&game.id).unwrap().unwrap().move_count, 0);

        let missing = db
            .update_game_atomically::<(), TestError, _>("nope", |_| Ok(()))
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_concurrent_moves_serialize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.db");
        let db = Arc::new(Database::with_pool_size(path.to_str().unwrap(), 4).unwrap());
        let game = setup(&db, GameType::TicTacToe);

        // Two racing first moves that both claim to be move 0: exactly one wins.
        let handles: Vec<_> = [0usize, 8]
            .into_iter()
            .map(|cell| {
                let db = Arc::clone(&db);
                let id = game.id.clone();
                std::thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(cell as u64);
                    db.update_game_atomically::<_, TestError, _>(&id, |g| {
                        Ok(g.apply_move("ana", &json!({ "cell": cell }), Some(0), &mut rng)?)
                    })
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| matches!(r, Ok(Some(_)))).count(), 1);
        assert_eq!(db.get_game(&game.id).unwrap().unwrap().move_count, 1);
    }

    #[test]
    fn test_forfeit_is_stored() {
        let db = Database::new(":memory:").unwrap();
        let game = setup(&db, GameType::RockPaperScissors);
        db.update_game_atomically::<_, TestError, _>(&game.id, |g| Ok(g.forfeit("ben")?))
            .unwrap();
        let stored = db.get_game(&game.id).unwrap().unwrap();
        assert_eq!(stored.status, GameStatus::Abandoned);
        assert_eq!(stored.winner_id.as_deref(), Some("ana"));
        assert!(db.list_active_games("ana").unwrap().is_empty());
    }
}
