//! In-crate fakes shared by unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::ports::blob_storage::{BlobStorage, BlobStorageError, StoredBlob};
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
    EmbeddingRequest, EmbeddingResponse,
};
use crate::application::ports::language_model::{
    CompletionRequest, CompletionResponse, LanguageModel, LanguageModelError,
};
use crate::application::ports::vector_store::{VectorQuery, VectorStore, VectorStoreError};
use crate::domain::entities::{
    Chat, Chunk, ScoredRecord, Session, TrackedVectorIds, User, VectorRecord,
};
use crate::domain::repositories::{
    ChatRepository, ChunkRepository, RepositoryError, SessionRepository, UserRepository,
    VectorIdRepository,
};
use crate::infrastructure::vector_store::InMemoryVectorStore;

pub fn chunk<const N: usize>(path: &str, index: usize, content: &str, values: [f32; N]) -> Chunk {
    Chunk::new(
        path.to_string(),
        index,
        content.to_string(),
        Vector::from(values.to_vec()),
    )
}

/// Deterministic embedder: one dimension per keyword holding its
/// case-insensitive occurrence count, plus a constant bias dimension so that
/// no embedding is the zero vector.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Provider round trips so far; a batch counts once.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn vectorize(&self, text: &str) -> Vector {
        let lower = text.to_lowercase();
        let mut values: Vec<f32> = self
            .keywords
            .iter()
            .map(|keyword| lower.matches(keyword.as_str()).count() as f32)
            .collect();
        values.push(0.1);
        Vector::from(values)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EmbeddingResponse {
            embedding: self.vectorize(&request.text),
            model_name: "keyword-test".to_string(),
            token_count: None,
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(BatchEmbeddingResponse {
            embeddings: request.texts.iter().map(|t| self.vectorize(t)).collect(),
            model_name: "keyword-test".to_string(),
            total_tokens: None,
        })
    }

    fn embedding_dimension(&self) -> usize {
        self.keywords.len() + 1
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn generate_embedding(
        &self,
        _request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        Err(EmbeddingProviderError::NetworkError(
            "embedding service unavailable".to_string(),
        ))
    }

    async fn generate_embeddings(
        &self,
        _request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        Err(EmbeddingProviderError::NetworkError(
            "embedding service unavailable".to_string(),
        ))
    }

    fn embedding_dimension(&self) -> usize {
        3
    }
}

/// Replays queued responses. Without a queued classification, anything
/// containing `?` is a question and everything else a statement.
#[derive(Default)]
pub struct ScriptedLanguageModel {
    completions: Mutex<VecDeque<CompletionResponse>>,
    texts: Mutex<VecDeque<String>>,
    classifications: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    generate_calls: AtomicUsize,
    classify_calls: AtomicUsize,
}

impl ScriptedLanguageModel {
    pub fn with_completion(self, response: CompletionResponse) -> Self {
        self.completions.lock().unwrap().push_back(response);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.texts.lock().unwrap().push_back(text.to_string());
        self
    }

    pub fn with_classification(self, label: &str) -> Self {
        self.classifications.lock().unwrap().push_back(label.to_string());
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LanguageModelError> {
        self.requests.lock().unwrap().push(request);
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LanguageModelError::InvalidResponse("no scripted completion left".to_string()))
    }

    async fn generate_text(
        &self,
        _system: &str,
        _prompt: &str,
    ) -> Result<String, LanguageModelError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.texts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LanguageModelError::InvalidResponse("no scripted text left".to_string()))
    }

    async fn classify(
        &self,
        _system: &str,
        prompt: &str,
        _labels: &[&str],
    ) -> Result<String, LanguageModelError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(label) = self.classifications.lock().unwrap().pop_front() {
            return Ok(label);
        }
        Ok(if prompt.contains('?') { "question" } else { "statement" }.to_string())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(user.email()) {
            return Err(RepositoryError::Duplicate(user.email().to_string()));
        }
        users.insert(user.email().to_string(), user.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, Session>>,
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, RepositoryError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(token)
            .filter(|session| session.expires_at > now)
            .cloned())
    }

    async fn delete(&self, token: &str) -> Result<bool, RepositoryError> {
        Ok(self.sessions.lock().unwrap().remove(token).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    chats: Mutex<HashMap<String, Chat>>,
    lookups: AtomicUsize,
}

impl InMemoryChatRepository {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn save(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        match chats.get_mut(&chat.id) {
            Some(existing) => existing.messages = chat.messages.clone(),
            None => {
                chats.insert(chat.id.clone(), chat.clone());
            }
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Chat>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.chats.lock().unwrap().get(id).cloned())
    }

    async fn find_by_author(&self, email: &str) -> Result<Vec<Chat>, RepositoryError> {
        let mut chats: Vec<Chat> = self
            .chats
            .lock()
            .unwrap()
            .values()
            .filter(|chat| chat.author == email)
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(chats)
    }
}

#[derive(Default)]
pub struct InMemoryChunkRepository {
    chunks: Mutex<BTreeMap<String, Chunk>>,
}

impl InMemoryChunkRepository {
    pub fn chunks_of(&self, file_path: &str) -> Vec<Chunk> {
        self.chunks
            .lock()
            .unwrap()
            .values()
            .filter(|chunk| chunk.file_path() == file_path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChunkRepository for InMemoryChunkRepository {
    async fn save_batch(&self, batch: &[Chunk]) -> Result<(), RepositoryError> {
        let mut chunks = self.chunks.lock().unwrap();
        for chunk in batch {
            chunks.insert(chunk.id().to_string(), chunk.clone());
        }
        Ok(())
    }

    async fn update_content(
        &self,
        id: &str,
        content: &str,
        embedding: &Vector,
    ) -> Result<bool, RepositoryError> {
        let mut chunks = self.chunks.lock().unwrap();
        let Some(existing) = chunks.get(id) else {
            return Ok(false);
        };
        let updated = Chunk::from_parts(
            id.to_string(),
            existing.file_path().to_string(),
            content.to_string(),
            embedding.clone(),
        );
        chunks.insert(id.to_string(), updated);
        Ok(true)
    }

    async fn delete_by_file_path(&self, file_path: &str) -> Result<i64, RepositoryError> {
        let mut chunks = self.chunks.lock().unwrap();
        let before = chunks.len();
        chunks.retain(|_, chunk| chunk.file_path() != file_path);
        Ok((before - chunks.len()) as i64)
    }
}

#[derive(Default)]
pub struct InMemoryVectorIdRepository {
    rows: Mutex<BTreeMap<String, TrackedVectorIds>>,
}

#[async_trait]
impl VectorIdRepository for InMemoryVectorIdRepository {
    async fn store(&self, file_path: &str, vector_ids: &[String]) -> Result<(), RepositoryError> {
        self.rows.lock().unwrap().insert(
            file_path.to_string(),
            TrackedVectorIds {
                file_path: file_path.to_string(),
                vector_ids: vector_ids.to_vec(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn find_by_file_path(
        &self,
        file_path: &str,
    ) -> Result<Option<TrackedVectorIds>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(file_path).cloned())
    }

    async fn delete_by_file_path(&self, file_path: &str) -> Result<bool, RepositoryError> {
        Ok(self.rows.lock().unwrap().remove(file_path).is_some())
    }

    async fn list_file_paths(&self, prefix: &str) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|path| path.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Delegates to an in-memory store but refuses to delete the given ids.
pub struct FlakyDeleteVectorStore {
    inner: Arc<InMemoryVectorStore>,
    failing_ids: HashSet<String>,
}

impl FlakyDeleteVectorStore {
    pub fn new(inner: Arc<InMemoryVectorStore>, failing_ids: &[&str]) -> Self {
        Self {
            inner,
            failing_ids: failing_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    fn refuse(&self, id: &str) -> Result<(), VectorStoreError> {
        if self.failing_ids.contains(id) {
            return Err(VectorStoreError::ApiError {
                status: 500,
                message: format!("could not delete {}", id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FlakyDeleteVectorStore {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<(), VectorStoreError> {
        self.inner.upsert(records).await
    }

    async fn query(&self, query: VectorQuery) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        self.inner.query(query).await
    }

    async fn delete_one(&self, id: &str) -> Result<(), VectorStoreError> {
        self.refuse(id)?;
        self.inner.delete_one(id).await
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), VectorStoreError> {
        for id in ids {
            self.refuse(id)?;
        }
        self.inner.delete_many(ids).await
    }

    async fn fetch_all(&self) -> Result<Vec<VectorRecord>, VectorStoreError> {
        self.inner.fetch_all().await
    }
}

/// Blob store keeping bytes in a map; URLs look like `memory://{pathname}`.
#[derive(Default)]
pub struct InMemoryBlobStorage {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBlobStorage {
    pub fn contains(&self, pathname: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(pathname)
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn put(&self, pathname: &str, data: &[u8]) -> Result<StoredBlob, BlobStorageError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(pathname.to_string(), data.to_vec());
        Ok(StoredBlob {
            pathname: pathname.to_string(),
            url: self.url_for(pathname),
            size: data.len() as u64,
        })
    }

    async fn delete(&self, pathname: &str) -> Result<bool, BlobStorageError> {
        Ok(self.blobs.lock().unwrap().remove(pathname).is_some())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredBlob>, BlobStorageError> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .iter()
            .filter(|(pathname, _)| pathname.starts_with(prefix))
            .map(|(pathname, data)| StoredBlob {
                pathname: pathname.clone(),
                url: self.url_for(pathname),
                size: data.len() as u64,
            })
            .collect())
    }

    fn url_for(&self, pathname: &str) -> String {
        format!("memory://{}", pathname)
    }

    fn pathname_from_url(&self, url: &str) -> Result<String, BlobStorageError> {
        url.strip_prefix("memory://")
            .filter(|pathname| !pathname.is_empty())
            .map(str::to_string)
            .ok_or_else(|| BlobStorageError::InvalidUrl(url.to_string()))
    }
}
