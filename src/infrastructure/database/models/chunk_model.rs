use diesel::prelude::*;
use pgvector::Vector;

use crate::domain::entities::Chunk;
use crate::infrastructure::database::schema::chunks;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChunkModel {
    pub id: String,
    pub file_path: String,
    pub content: String,
    pub embedding: Vector,
}

impl From<&Chunk> for ChunkModel {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id().to_string(),
            file_path: chunk.file_path().to_string(),
            content: chunk.content().to_string(),
            embedding: chunk.embedding().clone(),
        }
    }
}
