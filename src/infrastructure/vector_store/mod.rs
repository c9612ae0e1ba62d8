pub mod in_memory_vector_store;
pub mod pinecone_vector_store;

pub use in_memory_vector_store::InMemoryVectorStore;
pub use pinecone_vector_store::{PineconeConfig, PineconeVectorStore};
