//! Value objects for the survey dialog domain

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Reserved value of the back navigation choice
const BACK_VALUE: &str = "$back$";
/// Reserved value of the cancel navigation choice
const CANCEL_VALUE: &str = "$cancel$";
/// Reserved value of the skip navigation choice
const SKIP_VALUE: &str = "$skip$";
/// Reserved value of the keyboard layout marker
const NEW_KEYBOARD_LINE_VALUE: &str = "$newline$";

/// Declared semantic type of a question's expected answer.
///
/// Drives canonical constraint derivation; `Pattern` and `OneOf` carry
/// parameters and are attach-only (see `Constraint::from_field_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// No declared type, nothing is derived
    None,
    /// Free text, always valid
    Text,
    /// Whole number, optionally range-bounded
    Integer,
    /// Decimal number, optionally range-bounded
    Number,
    /// true/false
    Boolean,
    /// Calendar date
    Date,
    /// Email address
    Email,
    /// Arbitrary regular expression
    Pattern,
    /// Fixed enumerated set
    OneOf,
}

/// A selectable answer token shown to the user.
///
/// Two choices are equal iff their `value` fields are equal; the label is
/// display-only and may be rewritten in place without affecting identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Display label
    pub label: String,
    /// Machine-readable value, the identity of the choice
    pub value: String,
    /// Reserved navigation/layout choices bypass constraint checks
    #[serde(default)]
    pub is_system_choice: bool,
}

impl Choice {
    /// Create a choice with distinct label and value
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            is_system_choice: false,
        }
    }

    /// Create a choice from raw text, with `label == value`
    pub fn from_text(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            is_system_choice: false,
        }
    }

    fn system(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            is_system_choice: true,
        }
    }

    /// The back navigation choice
    pub fn back() -> Self {
        Self::system("Back", BACK_VALUE)
    }

    /// The cancel navigation choice
    pub fn cancel() -> Self {
        Self::system("Cancel", CANCEL_VALUE)
    }

    /// The skip navigation choice
    pub fn skip() -> Self {
        Self::system("Skip", SKIP_VALUE)
    }

    /// The keyboard layout marker: starts a new row of buttons.
    ///
    /// Purely a presentation marker, exempt from constraint checks and
    /// from value-based de-duplication.
    pub fn new_keyboard_line() -> Self {
        Self::system("", NEW_KEYBOARD_LINE_VALUE)
    }

    /// Whether this choice is the keyboard layout marker
    pub fn is_new_keyboard_line(&self) -> bool {
        self.is_system_choice && self.value == NEW_KEYBOARD_LINE_VALUE
    }
}

impl PartialEq for Choice {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Choice {}

impl Hash for Choice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

/// Content of a recorded answer: either free text or a resolved choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnswerContent {
    /// Raw text the user typed
    Text(String),
    /// A choice the user picked
    Picked(Choice),
}

/// One recorded response to a question.
///
/// Identity is `answer_id`; `question_id` is the non-owning back-reference
/// to the question that produced this answer. Never mutated after
/// constraint enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Unique identifier for this answer instance
    pub answer_id: Uuid,
    /// The question this answer belongs to
    pub question_id: Uuid,
    /// What was answered
    pub content: AnswerContent,
    /// When this answer was recorded
    pub answered_at: DateTime<Utc>,
}

impl Answer {
    /// Create a free-text answer for the given question
    pub fn text(question_id: Uuid, raw: impl Into<String>) -> Self {
        Self {
            answer_id: Uuid::new_v4(),
            question_id,
            content: AnswerContent::Text(raw.into()),
            answered_at: Utc::now(),
        }
    }

    /// Create a choice-backed answer for the given question
    pub fn picked(question_id: Uuid, choice: Choice) -> Self {
        Self {
            answer_id: Uuid::new_v4(),
            question_id,
            content: AnswerContent::Picked(choice),
            answered_at: Utc::now(),
        }
    }

    /// The value constraints are evaluated against: the choice's value,
    /// or the raw text
    pub fn effective_value(&self) -> &str {
        match &self.content {
            AnswerContent::Text(raw) => raw,
            AnswerContent::Picked(choice) => &choice.value,
        }
    }

    /// The raw text, if this is a free-text answer
    pub fn raw_text(&self) -> Option<&str> {
        match &self.content {
            AnswerContent::Text(raw) => Some(raw),
            AnswerContent::Picked(_) => None,
        }
    }

    /// The picked choice, if this is a choice-backed answer
    pub fn picked_choice(&self) -> Option<&Choice> {
        match &self.content {
            AnswerContent::Text(_) => None,
            AnswerContent::Picked(choice) => Some(choice),
        }
    }

    /// Whether this answer bypasses constraint evaluation entirely
    pub fn bypasses_constraints(&self) -> bool {
        match &self.content {
            AnswerContent::Text(_) => false,
            AnswerContent::Picked(choice) => {
                choice.is_system_choice || choice.is_new_keyboard_line()
            }
        }
    }
}
