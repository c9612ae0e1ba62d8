pub mod auth_routes;
pub mod chat_routes;
pub mod file_routes;
pub mod health_routes;

pub use auth_routes::*;
pub use chat_routes::*;
pub use file_routes::*;
pub use health_routes::*;
