pub mod chat_model;
pub mod chunk_model;
pub mod pinecone_ids_model;
pub mod user_model;

pub use chat_model::*;
pub use chunk_model::*;
pub use pinecone_ids_model::*;
pub use user_model::*;
