use async_trait::async_trait;
use diesel::pg::upsert::excluded;
use diesel::prelude::*;
use pgvector::Vector;

use crate::domain::entities::Chunk;
use crate::domain::repositories::{ChunkRepository, RepositoryError};
use crate::infrastructure::database::models::ChunkModel;
use crate::infrastructure::database::schema::chunks;
use crate::infrastructure::database::{DbPool, with_connection};

pub struct PostgresChunkRepository {
    pool: DbPool,
}

impl PostgresChunkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChunkRepository for PostgresChunkRepository {
    async fn save_batch(&self, batch: &[Chunk]) -> Result<(), RepositoryError> {
        if batch.is_empty() {
            return Ok(());
        }

        let models: Vec<ChunkModel> = batch.iter().map(ChunkModel::from).collect();

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(chunks::table)
                .values(&models)
                .on_conflict(chunks::id)
                .do_update()
                .set((
                    chunks::file_path.eq(excluded(chunks::file_path)),
                    chunks::content.eq(excluded(chunks::content)),
                    chunks::embedding.eq(excluded(chunks::embedding)),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn update_content(
        &self,
        id: &str,
        content: &str,
        embedding: &Vector,
    ) -> Result<bool, RepositoryError> {
        let id = id.to_string();
        let content = content.to_string();
        let embedding = embedding.clone();

        let updated_count = with_connection(&self.pool, move |conn| {
            Ok(diesel::update(chunks::table.find(id))
                .set((chunks::content.eq(content), chunks::embedding.eq(embedding)))
                .execute(conn)?)
        })
        .await?;

        Ok(updated_count > 0)
    }

    async fn delete_by_file_path(&self, file_path: &str) -> Result<i64, RepositoryError> {
        let file_path = file_path.to_string();

        let deleted_count = with_connection(&self.pool, move |conn| {
            Ok(diesel::delete(chunks::table.filter(chunks::file_path.eq(file_path)))
                .execute(conn)?)
        })
        .await?;

        Ok(deleted_count as i64)
    }
}
