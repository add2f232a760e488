//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod activities;     // activities (per-user feed)
mod chat_messages;  // chat_messages (direct + room)
mod friend_streaks; // friend_streaks (pairwise interaction streaks)
mod games;          // games (atomic move application)
mod users;          // users (identity upsert, last seen)

