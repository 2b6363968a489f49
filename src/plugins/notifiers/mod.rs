// Notifier plugin implementations
pub mod log;
pub mod telegram;

pub use log::LogNotifier;
pub use telegram::TelegramNotifier;
