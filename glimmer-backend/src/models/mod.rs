pub mod activity;
pub mod chat_message;
pub mod game;
pub mod streak;
pub mod user;

pub use activity::{Activity, ActivityType};
pub use chat_message::{ChatMessage, HistoryCursor, MessageType};
pub use game::{Game, GameStatus, GameView};
pub use streak::FriendStreak;
pub use user::{is_valid_user_id, User, MAX_USER_ID_LEN};
