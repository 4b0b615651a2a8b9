//! Storage boundary for questions
//!
//! The engine does not define a schema; it requires only that a question's
//! full state round-trips losslessly through `QuestionRecord`. Empty
//! answer/constraint/default-answer sequences serialize as absent fields
//! rather than empty-sequence literals, and deserialize back to empty
//! collections. Hook configuration persists as opaque string identifiers
//! and is re-resolved against a `HandlerRegistry`, degrading to
//! unconfigured when a key no longer resolves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::aggregate::Question;
use crate::constraints::Constraint;
use crate::dispatch::{DispatchHook, HandlerRegistry};
use crate::error::DomainResult;
use crate::value_objects::{Answer, Choice, FieldType};

/// Storage representation of a question's full state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: Uuid,
    pub internal_id: u32,
    pub user_id: i64,
    pub field_type: FieldType,
    pub question_text: String,
    pub is_completed: bool,
    pub is_mandatory: bool,
    pub pick_only_default_answers: bool,
    pub expects_command: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_separator: Option<String>,
    pub max_buttons_per_row: u8,
    pub created_at: DateTime<Utc>,
    /// Recorded answers; absent when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
    /// Attached constraints; absent when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Constraint>>,
    /// Curated suggested choices; absent when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_answers: Option<Vec<Choice>>,
    /// Type key of the bound handler, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_handler: Option<String>,
    /// Encoded reference of the bound callback, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_answer: Option<String>,
}

fn absent_when_empty<T: Clone>(items: &[T]) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items.to_vec())
    }
}

impl Question {
    /// Snapshot this question into its storage representation
    pub fn to_record(&self) -> QuestionRecord {
        QuestionRecord {
            id: self.id,
            internal_id: self.internal_id,
            user_id: self.user_id,
            field_type: self.field_type,
            question_text: self.question_text.clone(),
            is_completed: self.is_completed,
            is_mandatory: self.is_mandatory,
            pick_only_default_answers: self.pick_only_default_answers,
            expects_command: self.expects_command,
            follow_up: self.follow_up.clone(),
            follow_up_separator: self.follow_up_separator.clone(),
            max_buttons_per_row: self.max_buttons_per_row,
            created_at: self.created_at,
            answers: absent_when_empty(&self.answers),
            constraints: absent_when_empty(&self.constraints),
            default_answers: absent_when_empty(&self.default_answers),
            callback_handler: self.hook.handler_key().map(str::to_string),
            on_answer: self.hook.callback_key(),
        }
    }

    /// Rebuild a question from its storage representation.
    ///
    /// The hook is left unconfigured; use `from_record_with_registry` to
    /// re-resolve persisted handler keys.
    pub fn from_record(record: QuestionRecord) -> Self {
        let mut answers = record.answers.unwrap_or_default();
        // Re-anchor answers to the owning question, as the back-reference
        // is not authoritative on the wire
        for answer in &mut answers {
            answer.question_id = record.id;
        }
        Self {
            id: record.id,
            internal_id: record.internal_id,
            user_id: record.user_id,
            field_type: record.field_type,
            question_text: record.question_text,
            is_completed: record.is_completed,
            is_mandatory: record.is_mandatory,
            pick_only_default_answers: record.pick_only_default_answers,
            expects_command: record.expects_command,
            follow_up: record.follow_up,
            follow_up_separator: record.follow_up_separator,
            max_buttons_per_row: record.max_buttons_per_row,
            created_at: record.created_at,
            answers,
            constraints: record.constraints.unwrap_or_default(),
            default_answers: record.default_answers.unwrap_or_default(),
            hook: DispatchHook::new(),
            version: 0,
        }
    }

    /// Rebuild a question and rehydrate its hook against the registry.
    ///
    /// Keys that no longer decode or resolve leave the hook unconfigured.
    pub fn from_record_with_registry(
        record: QuestionRecord,
        registry: &HandlerRegistry,
    ) -> Self {
        let handler_key = record.callback_handler.clone();
        let callback_key = record.on_answer.clone();
        let mut question = Self::from_record(record);
        question.hook = DispatchHook::rehydrate(
            registry,
            handler_key.as_deref(),
            callback_key.as_deref(),
        );
        question
    }
}

/// Persistence collaborator for questions
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist the question's current state
    async fn save(&self, question: &Question) -> DomainResult<()>;

    /// Remove the question from storage. Removing an unknown question is
    /// a no-op.
    async fn delete(&self, question_id: Uuid) -> DomainResult<()>;

    /// The latest question asked to the user, however long ago it was
    /// asked
    async fn find_most_recent_by_user_id(&self, user_id: i64)
    -> DomainResult<Option<Question>>;
}

struct StoreInner {
    records: HashMap<Uuid, (u64, QuestionRecord)>,
    next_seq: u64,
}

/// In-memory question store keyed by question id, with a monotonic save
/// sequence for recency lookups
pub struct InMemoryQuestionRepository {
    inner: RwLock<StoreInner>,
}

impl InMemoryQuestionRepository {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Number of stored questions
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

impl Default for InMemoryQuestionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn save(&self, question: &Question) -> DomainResult<()> {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.records.insert(question.id(), (seq, question.to_record()));
        Ok(())
    }

    async fn delete(&self, question_id: Uuid) -> DomainResult<()> {
        let mut inner = self.inner.write().await;
        inner.records.remove(&question_id);
        Ok(())
    }

    async fn find_most_recent_by_user_id(
        &self,
        user_id: i64,
    ) -> DomainResult<Option<Question>> {
        let inner = self.inner.read().await;
        let record = inner
            .records
            .values()
            .filter(|(_, record)| record.user_id == user_id)
            .max_by_key(|(seq, _)| *seq)
            .map(|(_, record)| record.clone());
        Ok(record.map(Question::from_record))
    }
}
