pub mod document_extractors;
pub mod openai_client;

pub use openai_client::{
    OpenAiClient, OpenAiClientConfig, OpenAiEmbeddingProvider, OpenAiLanguageModel,
};
