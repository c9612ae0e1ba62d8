use std::sync::Arc;

use crate::{
    application::{
        ports::{BlobStorage, DocumentExtractor, EmbeddingProvider, LanguageModel, VectorStore},
        services::{
            AuthService, ChatService, ContentUpdater, EmbeddingService, HydeRetriever,
            KnowledgeSearch, KnowledgeTools, VectorIndexService,
        },
        use_cases::{
            ChatHistoryUseCase, DeleteDocumentUseCase, ListDocumentsUseCase, UploadDocumentUseCase,
        },
    },
    domain::repositories::{
        ChatRepository, ChunkRepository, SessionRepository, UserRepository, VectorIdRepository,
    },
    infrastructure::{
        config::{AppConfig, VectorStoreBackend},
        database::{
            DbPool, create_connection_pool,
            repositories::{
                PostgresChatRepository, PostgresChunkRepository, PostgresSessionRepository,
                PostgresUserRepository, PostgresVectorIdRepository,
            },
            run_migrations,
        },
        external_services::{
            OpenAiClient, OpenAiClientConfig, OpenAiEmbeddingProvider, OpenAiLanguageModel,
            document_extractors::CompositeDocumentExtractor,
        },
        file_system::LocalBlobStorage,
        vector_store::{InMemoryVectorStore, PineconeConfig, PineconeVectorStore},
    },
    presentation::http::{
        HttpServer,
        handlers::{AuthHandler, ChatHandler, FileHandler, HistoryHandler},
    },
};

const DB_POOL_SIZE: u32 = 10;

pub struct AppContainer {
    pub config: AppConfig,
    pub db_pool: DbPool,

    // Repositories
    pub user_repository: Arc<dyn UserRepository>,
    pub session_repository: Arc<dyn SessionRepository>,
    pub chat_repository: Arc<dyn ChatRepository>,
    pub chunk_repository: Arc<dyn ChunkRepository>,
    pub vector_id_repository: Arc<dyn VectorIdRepository>,

    // External Services
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub language_model: Arc<dyn LanguageModel>,
    pub vector_store: Arc<dyn VectorStore>,
    pub blob_storage: Arc<dyn BlobStorage>,
    pub document_extractor: Arc<dyn DocumentExtractor>,

    // Application Services
    pub auth_service: Arc<AuthService>,
    pub chat_service: Arc<ChatService>,

    // HTTP Handlers
    pub auth_handler: Arc<AuthHandler>,
    pub chat_handler: Arc<ChatHandler>,
    pub file_handler: Arc<FileHandler>,
    pub history_handler: Arc<HistoryHandler>,
}

impl AppContainer {
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Database
        let db_pool = create_connection_pool(&config.database_url, DB_POOL_SIZE)?;
        run_migrations(&db_pool)?;

        let user_repository: Arc<dyn UserRepository> =
            Arc::new(PostgresUserRepository::new(db_pool.clone()));
        let session_repository: Arc<dyn SessionRepository> =
            Arc::new(PostgresSessionRepository::new(db_pool.clone()));
        let chat_repository: Arc<dyn ChatRepository> =
            Arc::new(PostgresChatRepository::new(db_pool.clone()));
        let chunk_repository: Arc<dyn ChunkRepository> =
            Arc::new(PostgresChunkRepository::new(db_pool.clone()));
        let vector_id_repository: Arc<dyn VectorIdRepository> =
            Arc::new(PostgresVectorIdRepository::new(db_pool.clone()));

        // Hosted services
        let openai = OpenAiClient::new(OpenAiClientConfig {
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            timeout_secs: config.http_timeout_secs,
        })?;
        let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbeddingProvider::new(
            openai.clone(),
            config.embedding_model.clone(),
            config.embedding_dimension,
        ));
        let language_model: Arc<dyn LanguageModel> = Arc::new(OpenAiLanguageModel::new(
            openai,
            config.chat_model.clone(),
            config.utility_model.clone(),
        ));

        let vector_store: Arc<dyn VectorStore> = match &config.vector_store {
            VectorStoreBackend::Pinecone {
                api_key,
                index_host,
                namespace,
            } => {
                tracing::info!("Using Pinecone index at {}", index_host);
                Arc::new(PineconeVectorStore::new(PineconeConfig {
                    index_host: index_host.clone(),
                    api_key: api_key.clone(),
                    namespace: namespace.clone(),
                    timeout_secs: config.http_timeout_secs,
                })?)
            }
            VectorStoreBackend::Memory => {
                tracing::warn!("Using the in-memory vector store; vectors are lost on restart");
                Arc::new(InMemoryVectorStore::new())
            }
        };

        let local_blobs = LocalBlobStorage::new(config.upload_dir.clone(), &config.public_base_url)?;
        local_blobs.ensure_directory_exists().await?;
        let blob_storage: Arc<dyn BlobStorage> = Arc::new(local_blobs);

        let document_extractor: Arc<dyn DocumentExtractor> =
            Arc::new(CompositeDocumentExtractor::new());

        // Application services
        let embedding_service = Arc::new(EmbeddingService::new(embedding_provider.clone()));
        let vector_index = Arc::new(VectorIndexService::new(
            vector_store.clone(),
            vector_id_repository.clone(),
            config.embedding_dimension,
        ));

        let auth_service = Arc::new(AuthService::new(
            user_repository.clone(),
            session_repository.clone(),
            &config.admin_emails,
            chrono::Duration::hours(config.session_ttl_hours),
        ));

        let retriever = Arc::new(HydeRetriever::new(
            language_model.clone(),
            embedding_service.clone(),
            vector_index.clone(),
            config.hyde_top_k,
            config.scope_retrieval_to_selection,
        ));
        let knowledge_search = Arc::new(KnowledgeSearch::new(
            embedding_service.clone(),
            vector_index.clone(),
            config.retrieval_top_k,
        ));
        let content_updater = Arc::new(ContentUpdater::new(
            embedding_service.clone(),
            vector_index.clone(),
            chunk_repository.clone(),
            config.update_top_k,
        ));
        let tools = Arc::new(KnowledgeTools::new(knowledge_search, content_updater));

        let chat_service = Arc::new(ChatService::new(
            language_model.clone(),
            retriever,
            tools,
            chat_repository.clone(),
            config.max_tool_steps,
        ));

        // Use cases
        let upload_use_case = Arc::new(UploadDocumentUseCase::new(
            blob_storage.clone(),
            document_extractor.clone(),
            embedding_service,
            chunk_repository.clone(),
            vector_index.clone(),
            config.chunk_size,
        ));
        let list_use_case = Arc::new(ListDocumentsUseCase::new(
            blob_storage.clone(),
            vector_id_repository.clone(),
        ));
        let delete_use_case = Arc::new(DeleteDocumentUseCase::new(
            blob_storage.clone(),
            chunk_repository.clone(),
            vector_index,
        ));
        let chat_history_use_case = Arc::new(ChatHistoryUseCase::new(chat_repository.clone()));

        // HTTP handlers
        let auth_handler = Arc::new(AuthHandler::new(auth_service.clone()));
        let chat_handler = Arc::new(ChatHandler::new(chat_service.clone(), auth_service.clone()));
        let file_handler = Arc::new(FileHandler::new(
            upload_use_case,
            list_use_case,
            delete_use_case,
            auth_service.clone(),
        ));
        let history_handler = Arc::new(HistoryHandler::new(
            chat_history_use_case,
            auth_service.clone(),
        ));

        Ok(Self {
            config,
            db_pool,
            user_repository,
            session_repository,
            chat_repository,
            chunk_repository,
            vector_id_repository,
            embedding_provider,
            language_model,
            vector_store,
            blob_storage,
            document_extractor,
            auth_service,
            chat_service,
            auth_handler,
            chat_handler,
            file_handler,
            history_handler,
        })
    }

    pub fn http_server(&self) -> HttpServer {
        HttpServer::new(
            self.auth_handler.clone(),
            self.chat_handler.clone(),
            self.file_handler.clone(),
            self.history_handler.clone(),
            self.config.upload_dir.clone(),
            self.config.max_upload_bytes,
            self.config.port,
        )
    }
}
