//! Survey dialog module
//!
//! The answer-constraint engine for multi-step, constrained question/answer
//! dialogues over a conversational channel. It provides:
//! - Raw-answer resolution into typed choices or free text
//! - Per-field-type constraint evaluation with completion tracking
//! - Curation of default (suggested) choices with constraint-aware filtering
//! - A capability-checked dispatch hook fired once per recorded answer
//! - A storage boundary that round-trips full question state
//!
//! Question sequencing, outbound message formatting, and survey authoring
//! are left to the dialogue driver; the engine answers "can this answer be
//! accepted, and is the question now complete?".

pub mod aggregate;
pub mod constraints;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod persistence;
pub mod value_objects;

// Re-export main types
pub use aggregate::Question;

pub use constraints::{Constraint, ConstraintRule};

pub use dispatch::{
    AnswerCallback, AnswerEventHandler, DispatchHook, HandlerRef, HandlerRegistry,
};

pub use error::{DomainError, DomainResult};

pub use events::{AnswerRecorded, DomainEvent};

pub use persistence::{InMemoryQuestionRepository, QuestionRecord, QuestionRepository};

pub use value_objects::{Answer, AnswerContent, Choice, FieldType};
