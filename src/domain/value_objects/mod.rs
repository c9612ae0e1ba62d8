pub mod file_path;
pub mod password_hash;
pub mod similarity;

pub use file_path::FilePath;
pub use password_hash::PasswordHash;
pub use similarity::{cosine_similarity, rank_top_k};
