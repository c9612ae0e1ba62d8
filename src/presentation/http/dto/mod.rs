pub mod auth_dto;
pub mod chat_dto;
pub mod file_dto;
pub mod response_dto;

pub use auth_dto::*;
pub use chat_dto::*;
pub use file_dto::*;
pub use response_dto::*;
