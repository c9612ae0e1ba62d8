use pgvector::Vector;
use serde::{Deserialize, Serialize};

/// A bounded-size segment of an uploaded document together with its embedding.
///
/// The id is derived from the owning file path and the position of the chunk
/// inside the file, so re-indexing the same file yields the same ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    id: String,
    file_path: String,
    content: String,
    embedding: Vector,
}

impl Chunk {
    pub fn new(file_path: String, index: usize, content: String, embedding: Vector) -> Self {
        Self {
            id: chunk_id(&file_path, index),
            file_path,
            content,
            embedding,
        }
    }

    #[cfg(test)]
    pub fn from_parts(id: String, file_path: String, content: String, embedding: Vector) -> Self {
        Self {
            id,
            file_path,
            content,
            embedding,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn embedding(&self) -> &Vector {
        &self.embedding
    }

    pub fn dimension(&self) -> usize {
        self.embedding.as_slice().len()
    }

}

pub fn chunk_id(file_path: &str, index: usize) -> String {
    format!("{}/{}", file_path, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_is_derived_from_path_and_index() {
        let chunk = Chunk::new(
            "ops@example.com/handbook.pdf".to_string(),
            3,
            "Shift starts at 8am".to_string(),
            Vector::from(vec![0.1, 0.2, 0.3]),
        );

        assert_eq!(chunk.id(), "ops@example.com/handbook.pdf/3");
        assert_eq!(chunk.file_path(), "ops@example.com/handbook.pdf");
        assert_eq!(chunk.dimension(), 3);
    }
}
