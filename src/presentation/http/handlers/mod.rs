pub mod auth_handler;
pub mod chat_handler;
pub mod file_handler;
pub mod history_handler;

pub use auth_handler::AuthHandler;
pub use chat_handler::ChatHandler;
pub use file_handler::FileHandler;
pub use history_handler::HistoryHandler;
