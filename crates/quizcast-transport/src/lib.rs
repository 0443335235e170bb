//! quizcast-transport — message transport integrations.
//!
//! Implements the core `Transport` trait for the Telegram Bot API and
//! provides a scriptable mock transport for tests, plus service
//! configuration loading.

pub mod config;
pub mod mock;
pub mod telegram;

pub use config::{load_config, load_config_from, QuizcastConfig, ScheduleConfig};
pub use mock::MockTransport;
pub use telegram::{InboundEvent, TelegramTransport};
