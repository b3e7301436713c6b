pub mod assign;
pub mod comment;
pub mod export;
pub mod init;
pub mod list;
pub mod progress;
pub mod review;
pub mod show;
pub mod sign;
pub mod sprint;
pub mod stats;
pub mod submit;
pub mod update;

use rfcdesk::db::Database;
use rfcdesk::engine::Engine;

/// The engine as the CLI runs it: SQLite storage and the system clock.
pub type Desk = Engine<Database>;
