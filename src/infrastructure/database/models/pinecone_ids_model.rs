use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::entities::TrackedVectorIds;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::schema::pinecone_ids;

/// Row of the tracking table; `vector_ids` holds a JSON array of strings.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pinecone_ids)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PineconeIdsModel {
    pub id: i32,
    pub file_path: String,
    pub vector_ids: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = pinecone_ids)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPineconeIdsModel {
    pub file_path: String,
    pub vector_ids: String,
    pub created_at: DateTime<Utc>,
}

impl NewPineconeIdsModel {
    pub fn new(file_path: &str, vector_ids: &[String]) -> Result<Self, RepositoryError> {
        let vector_ids = serde_json::to_string(vector_ids)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        Ok(Self {
            file_path: file_path.to_string(),
            vector_ids,
            created_at: Utc::now(),
        })
    }
}

impl TryFrom<PineconeIdsModel> for TrackedVectorIds {
    type Error = RepositoryError;

    fn try_from(model: PineconeIdsModel) -> Result<Self, Self::Error> {
        let vector_ids: Vec<String> = serde_json::from_str(&model.vector_ids)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        Ok(TrackedVectorIds {
            file_path: model.file_path,
            vector_ids,
            created_at: model.created_at,
        })
    }
}
