use super::{Relay, RelayError, RelayResult};
use crate::games::{GameType, Progress};
use crate::gateway::protocol::GatewayEvent;
use crate::models::{ActivityType, Game, GameView, MessageType};
use serde_json::{json, Value};

impl Relay {
    /// Start a game against `opponent_id`, leave an invite in their chat and
    /// notify them. Returns the creator's view.
    pub fn create_game(&self, creator_id: &str, opponent_id: &str, game_type: &str) -> RelayResult<GameView> {
        let game_type = GameType::parse(game_type.trim())?;
        let opponent_id = self.counterpart(opponent_id, "opponent_id")?;

        let game = Game::new(creator_id, opponent_id, game_type, &mut rand::thread_rng())?;
        self.db.ensure_user(opponent_id)?;
        self.db.create_game(&game)?;
        log::info!(
            "[GAMES] {} challenged {} to {} ({})",
            creator_id,
            opponent_id,
            game_type,
            game.id
        );

        let invite = json!({ "gameId": game.id, "gameType": game_type }).to_string();
        let message = self.db.insert_chat_message(
            creator_id,
            Some(opponent_id),
            None,
            &invite,
            MessageType::GameInvite,
        )?;

        if let Some(view) = game.view_for(opponent_id) {
            self.gateway
                .send_to_user(opponent_id, &GatewayEvent::game_invite(&view, creator_id, &message.id));
        }
        self.record_activity(
            creator_id,
            ActivityType::GameStarted,
            format!("Challenged {} to {}", opponent_id, game_type),
            &game,
            Value::Null,
        );

        game.view_for(creator_id).ok_or(RelayError::NotFound("Game"))
    }

    /// Apply a move under the game's write lock, then push fresh views to both players.
    pub fn make_move(
        &self,
        user_id: &str,
        game_id: &str,
        mv: &Value,
        expected_move: Option<i64>,
    ) -> RelayResult<GameView> {
        let (game, progress) = self
            .db
            .update_game_atomically(game_id, |game| -> RelayResult<Progress> {
                Ok(game.apply_move(user_id, mv, expected_move, &mut rand::thread_rng())?)
            })?
            .ok_or(RelayError::NotFound("Game"))?;

        log::debug!(
            "[GAMES] {} moved in {} (move {})",
            user_id,
            game.id,
            game.move_count
        );
        self.publish_game(&game);

        if let Progress::Finished { .. } = progress {
            self.record_game_played(&game);
            let [p1, p2] = game.players();
            self.bump_streak(p1, p2);
        }

        game.view_for(user_id).ok_or(RelayError::NotFound("Game"))
    }

    /// Give up; the opponent wins.
    pub fn forfeit_game(&self, user_id: &str, game_id: &str) -> RelayResult<GameView> {
        let (game, ()) = self
            .db
            .update_game_atomically(game_id, |game| -> RelayResult<()> { Ok(game.forfeit(user_id)?) })?
            .ok_or(RelayError::NotFound("Game"))?;

        log::info!("[GAMES] {} forfeited {}", user_id, game.id);
        self.publish_game(&game);

        if let Some(opponent_id) = game.opponent_of(user_id) {
            let game_type = game.game_type();
            self.record_activity(
                user_id,
                ActivityType::GameForfeited,
                format!("Forfeited {} against {}", game_type, opponent_id),
                &game,
                json!("lost"),
            );
            self.record_activity(
                opponent_id,
                ActivityType::GameForfeited,
                format!("{} forfeited {}", user_id, game_type),
                &game,
                json!("won"),
            );
        }

        game.view_for(user_id).ok_or(RelayError::NotFound("Game"))
    }

    /// A game as seen by `user_id`; games the user does not play in are not found.
    pub fn game_for(&self, user_id: &str, game_id: &str) -> RelayResult<GameView> {
        self.db
            .get_game(game_id)?
            .and_then(|game| game.view_for(user_id))
            .ok_or(RelayError::NotFound("Game"))
    }

    pub fn active_games(&self, user_id: &str) -> RelayResult<Vec<GameView>> {
        Ok(self
            .db
            .list_active_games(user_id)?
            .iter()
            .filter_map(|game| game.view_for(user_id))
            .collect())
    }

    /// Send each player their own view of the game
    fn publish_game(&self, game: &Game) {
        for player in game.players() {
            if let Some(view) = game.view_for(player) {
                self.gateway.send_to_user(player, &GatewayEvent::game_update(&view));
            }
        }
    }

    fn record_game_played(&self, game: &Game) {
        let game_type = game.game_type();
        for player in game.players() {
            let opponent = game.opponent_of(player).unwrap_or_default();
            let (result, description) = match game.winner_id.as_deref() {
                Some(winner) if winner == player => ("won", format!("Won {} against {}", game_type, opponent)),
                Some(_) => ("lost", format!("Lost {} against {}", game_type, opponent)),
                None => ("draw", format!("Drew {} with {}", game_type, opponent)),
            };
            self.record_activity(player, ActivityType::GamePlayed, description, game, json!(result));
        }
    }

    /// Store an activity and push it to its owner. Failures are logged only.
    fn record_activity(
        &self,
        user_id: &str,
        activity_type: ActivityType,
        description: String,
        game: &Game,
        result: Value,
    ) {
        let mut data = json!({
            "gameId": game.id,
            "gameType": game.game_type(),
            "opponentId": game.opponent_of(user_id),
        });
        if !result.is_null() {
            data["result"] = result;
        }

        match self.db.insert_activity(user_id, activity_type, &description, data) {
            Ok(activity) => {
                self.gateway
                    .send_to_user(user_id, &GatewayEvent::activity_created(&activity));
            }
            Err(e) => log::error!("[GAMES] Failed to record activity for {}: {}", user_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameError;
    use crate::models::GameStatus;
    use crate::relay::test_support::{connect, drain, relay};

    #[test]
    fn test_create_game_sends_invite() {
        let relay = relay();
        let _ana = connect(&relay, "ana", "a1");
        let mut ben = connect(&relay, "ben", "b1");

        let view = relay.create_game("ana", "ben", "tic-tac-toe").unwrap();
        assert!(view.your_turn);
        assert_eq!(view.player2_id, "ben");

        let events = drain(&mut ben);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "game.invite");
        assert_eq!(events[0].data["from"], "ana");
        assert_eq!(events[0].data["game"]["yourTurn"], false);

        let history = relay.direct_history("ben", "ana", None, None).unwrap();
        assert_eq!(history[0].message_type, MessageType::GameInvite);
        let invite: Value = serde_json::from_str(&history[0].content).unwrap();
        assert_eq!(invite["gameId"], view.id.as_str());

        assert!(matches!(
            relay.create_game("ana", "ben", "chess"),
            Err(RelayError::Game(GameError::UnknownGameType(_)))
        ));
        assert!(matches!(
            relay.create_game("ana", "ana", "cards"),
            Err(RelayError::Game(GameError::SelfPlay))
        ));
        assert!(matches!(
            relay.create_game("ana", &"z".repeat(129), "cards"),
            Err(RelayError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_challenge_does_not_refresh_opponent() {
        let relay = relay();
        let _ana = connect(&relay, "ana", "a1");
        relay.db().touch_user("ben").unwrap();
        let before = relay.db().get_user("ben").unwrap().expect("ben").last_active;

        std::thread::sleep(std::time::Duration::from_millis(5));
        relay.create_game("ana", "ben", "tic-tac-toe").unwrap();
        assert_eq!(relay.db().get_user("ben").unwrap().expect("ben").last_active, before);
    }

    #[test]
    fn test_moves_fan_out_and_finish() {
        let relay = relay();
        let mut ana = connect(&relay, "ana", "a1");
        let mut ben = connect(&relay, "ben", "b1");
        let game = relay.create_game("ana", "ben", "tic-tac-toe").unwrap();
        drain(&mut ana);
        drain(&mut ben);

        let view = relay.make_move("ana", &game.id, &json!({"cell": 0}), Some(0)).unwrap();
        assert!(!view.your_turn);
        let update = drain(&mut ben);
        assert_eq!(update[0].event, "game.update");
        assert_eq!(update[0].data["yourTurn"], true);
        assert_eq!(drain(&mut ana).len(), 1);

        // Out of turn and stale moves are conflicts and change nothing
        assert!(matches!(
            relay.make_move("ana", &game.id, &json!({"cell": 1}), None),
            Err(RelayError::Game(GameError::NotYourTurn))
        ));
        assert!(matches!(
            relay.make_move("ben", &game.id, &json!({"cell": 1}), Some(0)),
            Err(RelayError::Game(GameError::StaleMove { .. }))
        ));

        for (player, cell) in [("ben", 3), ("ana", 1), ("ben", 4), ("ana", 2)] {
            relay.make_move(player, &game.id, &json!({ "cell": cell }), None).unwrap();
        }
        let finished = relay.game_for("ben", &game.id).unwrap();
        assert_eq!(finished.status, GameStatus::Finished);
        assert_eq!(finished.winner_id.as_deref(), Some("ana"));

        let ana_feed = relay.db().list_activities("ana", 20).unwrap();
        assert_eq!(ana_feed[0].activity_type, ActivityType::GamePlayed);
        assert_eq!(ana_feed[0].data["result"], "won");
        let ben_feed = relay.db().list_activities("ben", 20).unwrap();
        assert_eq!(ben_feed[0].data["result"], "lost");
        assert!(drain(&mut ben).iter().any(|e| e.event == "activity.created"));
        assert!(relay.db().get_streak("ana", "ben").unwrap().is_some());
    }

    #[test]
    fn test_game_visibility() {
        let relay = relay();
        let _ana = connect(&relay, "ana", "a1");
        let game = relay.create_game("ana", "ben", "cards").unwrap();

        assert!(matches!(relay.game_for("cat", &game.id), Err(RelayError::NotFound(_))));
        assert!(matches!(relay.game_for("ana", "missing"), Err(RelayError::NotFound(_))));
        assert!(matches!(
            relay.make_move("cat", &game.id, &json!({"cardId": "c1"}), None),
            Err(RelayError::Game(GameError::NotAPlayer))
        ));
        assert_eq!(relay.active_games("ben").unwrap().len(), 1);
    }

    #[test]
    fn test_forfeit_flow() {
        let relay = relay();
        let _ana = connect(&relay, "ana", "a1");
        let mut ben = connect(&relay, "ben", "b1");
        let game = relay.create_game("ana", "ben", "rock-paper-scissors").unwrap();
        drain(&mut ben);

        let view = relay.forfeit_game("ana", &game.id).unwrap();
        assert_eq!(view.status, GameStatus::Abandoned);
        assert_eq!(view.winner_id.as_deref(), Some("ben"));

        let events: Vec<_> = drain(&mut ben).into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec!["game.update", "activity.created"]);
        assert!(matches!(
            relay.forfeit_game("ben", &game.id),
            Err(RelayError::Game(GameError::GameOver))
        ));
        assert!(relay.active_games("ana").unwrap().is_empty());
    }
}
