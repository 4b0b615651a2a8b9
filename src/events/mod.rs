//! Survey dialog domain events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::Answer;

/// Common behavior of domain events
pub trait DomainEvent: Send + Sync {
    /// Subject for event routing
    fn subject(&self) -> String;

    /// Aggregate this event belongs to
    fn aggregate_id(&self) -> Uuid;

    /// Event type name
    fn event_type(&self) -> &'static str;
}

/// An answer was recorded against a question.
///
/// This is the payload handed to the dispatch hook after every recorded
/// answer, whether or not the answer satisfied the question's constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecorded {
    pub question_id: Uuid,
    pub answer: Answer,
    /// Completion state of the question after this answer
    pub is_completed: bool,
    pub recorded_at: DateTime<Utc>,
}

impl DomainEvent for AnswerRecorded {
    fn subject(&self) -> String {
        "survey.question.answer.recorded.v1".to_string()
    }

    fn aggregate_id(&self) -> Uuid {
        self.question_id
    }

    fn event_type(&self) -> &'static str {
        "AnswerRecorded"
    }
}
