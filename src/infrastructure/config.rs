use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum VectorStoreBackend {
    Pinecone {
        api_key: String,
        index_host: String,
        namespace: String,
    },
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub public_base_url: String,

    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub utility_model: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,

    pub vector_store: VectorStoreBackend,

    pub chunk_size: usize,
    pub hyde_top_k: usize,
    pub retrieval_top_k: usize,
    pub update_top_k: usize,
    pub max_tool_steps: usize,
    pub scope_retrieval_to_selection: bool,

    pub session_ttl_hours: i64,
    pub admin_emails: Vec<String>,
    pub http_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port: u16 = parse_or(&get, "PORT", 3000)?;

        let vector_store = match get("VECTOR_STORE").as_deref().unwrap_or("pinecone") {
            "pinecone" => VectorStoreBackend::Pinecone {
                api_key: required("PINECONE_API_KEY")?,
                index_host: required("PINECONE_INDEX_HOST")?,
                namespace: get("PINECONE_NAMESPACE").unwrap_or_default(),
            },
            "memory" => VectorStoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "VECTOR_STORE",
                    value: other.to_string(),
                    reason: "expected pinecone or memory".to_string(),
                });
            }
        };

        let admin_emails = get("ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|email| email.trim().to_lowercase())
                    .filter(|email| !email.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            database_url: required("DATABASE_URL")?,
            port,
            upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string())),
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port))
                .trim_end_matches('/')
                .to_string(),

            openai_api_key: required("OPENAI_API_KEY")?,
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            chat_model: get("CHAT_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            utility_model: get("UTILITY_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            embedding_dimension: parse_or(&get, "EMBEDDING_DIMENSION", 1536)?,

            vector_store,

            chunk_size: parse_or(&get, "CHUNK_SIZE", 1000)?,
            hyde_top_k: parse_or(&get, "HYDE_TOP_K", 10)?,
            retrieval_top_k: parse_or(&get, "RETRIEVAL_TOP_K", 4)?,
            update_top_k: parse_or(&get, "UPDATE_TOP_K", 5)?,
            max_tool_steps: parse_or(&get, "MAX_TOOL_STEPS", 10)?,
            scope_retrieval_to_selection: parse_or(&get, "SCOPE_RETRIEVAL_TO_SELECTION", false)?,

            session_ttl_hours: parse_or(&get, "SESSION_TTL_HOURS", 168)?,
            admin_emails,
            http_timeout_secs: parse_or(&get, "HTTP_TIMEOUT_SECS", 60)?,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("EMBEDDING_DIMENSION", self.embedding_dimension),
            ("CHUNK_SIZE", self.chunk_size),
            ("HYDE_TOP_K", self.hyde_top_k),
            ("RETRIEVAL_TOP_K", self.retrieval_top_k),
            ("UPDATE_TOP_K", self.update_top_k),
            ("MAX_TOOL_STEPS", self.max_tool_steps),
        ];

        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    name,
                    value: value.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_HOURS",
                value: self.session_ttl_hours.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
