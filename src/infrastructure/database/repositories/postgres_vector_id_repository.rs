use async_trait::async_trait;
use diesel::pg::upsert::excluded;
use diesel::prelude::*;

use crate::domain::entities::TrackedVectorIds;
use crate::domain::repositories::{RepositoryError, VectorIdRepository};
use crate::infrastructure::database::models::{NewPineconeIdsModel, PineconeIdsModel};
use crate::infrastructure::database::schema::pinecone_ids;
use crate::infrastructure::database::{DbPool, with_connection};

/// Postgres backing for the `pinecone_ids` tracking table.
pub struct PostgresVectorIdRepository {
    pool: DbPool,
}

impl PostgresVectorIdRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn like_prefix(prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{}%", escaped)
}

#[async_trait]
impl VectorIdRepository for PostgresVectorIdRepository {
    async fn store(&self, file_path: &str, vector_ids: &[String]) -> Result<(), RepositoryError> {
        let row = NewPineconeIdsModel::new(file_path, vector_ids)?;

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(pinecone_ids::table)
                .values(&row)
                .on_conflict(pinecone_ids::file_path)
                .do_update()
                .set((
                    pinecone_ids::vector_ids.eq(excluded(pinecone_ids::vector_ids)),
                    pinecone_ids::created_at.eq(excluded(pinecone_ids::created_at)),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn find_by_file_path(
        &self,
        file_path: &str,
    ) -> Result<Option<TrackedVectorIds>, RepositoryError> {
        let file_path = file_path.to_string();

        let model = with_connection(&self.pool, move |conn| {
            Ok(pinecone_ids::table
                .filter(pinecone_ids::file_path.eq(file_path))
                .select(PineconeIdsModel::as_select())
                .first(conn)
                .optional()?)
        })
        .await?;

        model.map(TrackedVectorIds::try_from).transpose()
    }

    async fn delete_by_file_path(&self, file_path: &str) -> Result<bool, RepositoryError> {
        let file_path = file_path.to_string();

        let deleted_count = with_connection(&self.pool, move |conn| {
            Ok(
                diesel::delete(pinecone_ids::table.filter(pinecone_ids::file_path.eq(file_path)))
                    .execute(conn)?,
            )
        })
        .await?;

        Ok(deleted_count > 0)
    }

    async fn list_file_paths(&self, prefix: &str) -> Result<Vec<String>, RepositoryError> {
        let pattern = like_prefix(prefix);

        with_connection(&self.pool, move |conn| {
            Ok(pinecone_ids::table
                .filter(pinecone_ids::file_path.like(pattern).escape('\\'))
                .order(pinecone_ids::file_path.asc())
                .select(pinecone_ids::file_path)
                .load::<String>(conn)?)
        })
        .await
    }
}
