//! Question aggregate - one question asked to one user
//!
//! The question is the aggregate root of the answer-constraint engine. It
//! owns:
//! - the ordered, append-only sequence of recorded answers
//! - the constraint set (set-like on field type)
//! - the curated list of default (suggested) choices
//! - the dispatch hook invoked once per recorded answer
//!
//! Each live question belongs to exactly one conversation thread of
//! control; the dialogue driver serializes access, so there is no internal
//! locking. Distinct questions are fully independent.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::constraints::Constraint;
use crate::dispatch::{AnswerCallback, DispatchHook, HandlerRef, HandlerRegistry};
use crate::error::DomainResult;
use crate::events::AnswerRecorded;
use crate::value_objects::{Answer, Choice, FieldType};

/// Question aggregate root
#[derive(Debug, Clone)]
pub struct Question {
    /// Identity of this live question instance
    pub(crate) id: Uuid,

    /// Identity of the question template this instance was asked from
    pub(crate) internal_id: u32,

    /// The user this question was asked to
    pub(crate) user_id: i64,

    /// Declared type of the expected answer
    pub(crate) field_type: FieldType,

    /// The text shown to the user
    pub(crate) question_text: String,

    /// Whether the most recently recorded answer satisfied the constraints
    pub(crate) is_completed: bool,

    /// Whether the question may be skipped
    pub(crate) is_mandatory: bool,

    /// Whether only curated default answers are acceptable input
    pub(crate) pick_only_default_answers: bool,

    /// Whether the expected answer is a bot command
    pub(crate) expects_command: bool,

    /// Text appended to the question when re-prompting
    pub(crate) follow_up: Option<String>,

    /// Separator between question text and follow-up
    pub(crate) follow_up_separator: Option<String>,

    /// Keyboard layout hint for the driver, 0 leaves it to the driver
    pub(crate) max_buttons_per_row: u8,

    /// When this question was created
    pub(crate) created_at: DateTime<Utc>,

    /// Recorded answers, in call order
    pub(crate) answers: Vec<Answer>,

    /// Attached constraints, set-like on field type
    pub(crate) constraints: Vec<Constraint>,

    /// Curated suggested choices, order-significant for presentation
    pub(crate) default_answers: Vec<Choice>,

    /// Handler configuration for answer events
    pub(crate) hook: DispatchHook,

    /// Version for optimistic concurrency
    pub(crate) version: u64,
}

impl Question {
    /// Create a new question
    pub fn new(
        id: Uuid,
        internal_id: u32,
        field_type: FieldType,
        question_text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            internal_id,
            user_id: 0,
            field_type,
            question_text: question_text.into(),
            is_completed: false,
            is_mandatory: false,
            pick_only_default_answers: false,
            expects_command: false,
            follow_up: None,
            follow_up_separator: None,
            max_buttons_per_row: 0,
            created_at: Utc::now(),
            answers: Vec::new(),
            constraints: Vec::new(),
            default_answers: Vec::new(),
            hook: DispatchHook::new(),
            version: 0,
        }
    }

    /// Scope this question to a user
    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = user_id;
        self
    }

    /// Mark this question as mandatory
    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.is_mandatory = mandatory;
        self
    }

    /// Restrict acceptable input to the curated default answers
    pub fn with_pick_only_default_answers(mut self, pick_only: bool) -> Self {
        self.pick_only_default_answers = pick_only;
        self
    }

    /// Mark the expected answer as a bot command
    pub fn with_expects_command(mut self, expects_command: bool) -> Self {
        self.expects_command = expects_command;
        self
    }

    /// Set the re-prompt follow-up text and its separator
    pub fn with_follow_up(
        mut self,
        follow_up: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        self.follow_up = Some(follow_up.into());
        self.follow_up_separator = Some(separator.into());
        self
    }

    /// Set the keyboard layout hint
    pub fn with_max_buttons_per_row(mut self, max: u8) -> Self {
        self.max_buttons_per_row = max;
        self
    }

    /// The question id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The template id this instance was asked from
    pub fn internal_id(&self) -> u32 {
        self.internal_id
    }

    /// The user this question was asked to
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Declared type of the expected answer
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// The text shown to the user
    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    /// Whether the most recently recorded answer satisfied the constraints
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Whether the question may be skipped
    pub fn is_mandatory(&self) -> bool {
        self.is_mandatory
    }

    /// Whether only curated default answers are acceptable input
    pub fn pick_only_default_answers(&self) -> bool {
        self.pick_only_default_answers
    }

    /// Whether the expected answer is a bot command
    pub fn expects_command(&self) -> bool {
        self.expects_command
    }

    /// Re-prompt follow-up text
    pub fn follow_up(&self) -> Option<&str> {
        self.follow_up.as_deref()
    }

    /// Separator between question text and follow-up
    pub fn follow_up_separator(&self) -> Option<&str> {
        self.follow_up_separator.as_deref()
    }

    /// Keyboard layout hint
    pub fn max_buttons_per_row(&self) -> u8 {
        self.max_buttons_per_row
    }

    /// When this question was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Recorded answers, in call order
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// The most recently recorded answer
    pub fn last_answer(&self) -> Option<&Answer> {
        self.answers.last()
    }

    /// Attached constraints, in insertion order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Curated suggested choices, in presentation order
    pub fn default_answers(&self) -> &[Choice] {
        &self.default_answers
    }

    /// Version for optimistic concurrency
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Attach the canonical constraint for the declared field type.
    ///
    /// Idempotent: does nothing if the field type is `None` or a constraint
    /// of that type is already attached.
    pub fn derive_constraint_from_field_type(&mut self) {
        if let Some(constraint) = Constraint::from_field_type(self.field_type) {
            self.add_constraint(constraint);
        }
    }

    /// Attach a constraint. No-op if a constraint with the same field type
    /// is already attached.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        if self
            .constraints
            .iter()
            .any(|c| c.field_type == constraint.field_type)
        {
            return;
        }
        self.constraints.push(constraint);
        self.version += 1;
    }

    /// Validate an answer's effective value against every attached
    /// constraint. System choices and the keyboard-line marker bypass
    /// evaluation entirely; an empty constraint set accepts everything.
    pub fn enforce_constraints(&self, answer: &Answer) -> bool {
        if answer.bypasses_constraints() {
            return true;
        }
        let value = answer.effective_value();
        self.constraints.iter().all(|c| c.validate(value))
    }

    /// Record a raw user answer.
    ///
    /// If the text is a well-formed JSON choice it is treated as a
    /// choice-backed answer, otherwise as free text. The answer is always
    /// recorded; `is_completed` becomes the constraint-validation result of
    /// this answer.
    pub fn add_answer(&mut self, raw: &str) -> &Answer {
        let answer = match serde_json::from_str::<Choice>(raw) {
            Ok(choice) => Answer::picked(self.id, choice),
            Err(_) => Answer::text(self.id, raw),
        };
        self.record(answer)
    }

    /// Record an explicit choice as an answer
    pub fn add_choice_answer(&mut self, choice: Choice) -> &Answer {
        let answer = Answer::picked(self.id, choice);
        self.record(answer)
    }

    /// Record a pre-built answer.
    ///
    /// Returns `None`, with no side effect, when the answer belongs to
    /// another question or is already recorded here.
    pub fn add_recorded_answer(&mut self, answer: Answer) -> Option<&Answer> {
        if answer.question_id != self.id {
            return None;
        }
        if self
            .answers
            .iter()
            .any(|a| a.answer_id == answer.answer_id)
        {
            return None;
        }
        Some(self.record(answer))
    }

    /// Validate, append, update completion, then fire the hook.
    ///
    /// Validation happens strictly before `is_completed` is written, and
    /// the hook fires only after the answer is committed, so a panicking
    /// callback cannot roll back recorded state.
    fn record(&mut self, answer: Answer) -> &Answer {
        let valid = self.enforce_constraints(&answer);
        let event = AnswerRecorded {
            question_id: self.id,
            answer: answer.clone(),
            is_completed: valid,
            recorded_at: Utc::now(),
        };
        self.answers.push(answer);
        self.is_completed = valid;
        self.version += 1;
        self.hook.dispatch(&event);
        &self.answers[self.answers.len() - 1]
    }

    /// Add a suggested choice, enforcing constraints.
    ///
    /// Rejected silently when any attached constraint fails, unless the
    /// choice is a system choice or the keyboard-line marker.
    pub fn add_default_answer(&mut self, choice: Choice) {
        if !choice.is_system_choice && !choice.is_new_keyboard_line() {
            for constraint in &self.constraints {
                if !constraint.validate(&choice.value) {
                    return;
                }
            }
        }
        self.default_answers.push(choice);
        self.version += 1;
    }

    /// Add a suggested choice from a value and optional label, through the
    /// rejecting singular path. Blank values are skipped.
    pub fn add_default_answer_value(&mut self, value: &str, label: Option<&str>) {
        if value.trim().is_empty() {
            return;
        }
        let label = label.unwrap_or(value);
        self.add_default_answer(Choice::new(label, value));
    }

    /// Add a list of suggested choices, checking constraints.
    ///
    /// Unlike the singular path, a failing item is logged and added anyway.
    pub fn add_default_answers(&mut self, choices: Vec<Choice>) {
        for choice in choices {
            if !choice.is_system_choice && !choice.is_new_keyboard_line() {
                for constraint in &self.constraints {
                    if !constraint.validate(&choice.value) {
                        debug!(
                            value = %choice.value,
                            question = %self.question_text,
                            field_type = ?self.field_type,
                            "default choice does not satisfy this question's constraints"
                        );
                    }
                }
            }
            self.default_answers.push(choice);
            self.version += 1;
        }
    }

    /// Add a list of suggested choices from raw values, with
    /// `label == value`. Blank values are skipped.
    pub fn add_default_answer_values(&mut self, values: &[&str]) {
        let choices = values
            .iter()
            .filter(|v| !v.trim().is_empty())
            .map(|v| Choice::from_text(*v))
            .collect();
        self.add_default_answers(choices);
    }

    /// Remove the first suggested choice equal to the given one.
    /// Removing a non-member is a no-op.
    pub fn remove_default_answer(&mut self, choice: &Choice) {
        if let Some(pos) = self.default_answers.iter().position(|c| c == choice) {
            self.default_answers.remove(pos);
            self.version += 1;
        }
    }

    /// Remove every suggested choice with the given value
    pub fn remove_default_answers_with_value(&mut self, value: &str) {
        let before = self.default_answers.len();
        self.default_answers.retain(|c| c.value != value);
        if self.default_answers.len() != before {
            self.version += 1;
        }
    }

    /// Clear the suggested choices.
    ///
    /// With `keep_system_choices` only non-system choices are removed,
    /// leaving back/cancel/skip and the layout markers intact.
    pub fn clear_default_answers(&mut self, keep_system_choices: bool) {
        if keep_system_choices {
            self.default_answers.retain(|c| c.is_system_choice);
        } else {
            self.default_answers.clear();
        }
        self.version += 1;
    }

    /// Rewrite the display label of the first suggested choice with the
    /// given value. No-op if absent; identity is unaffected.
    pub fn update_default_answer_label(&mut self, value: &str, label: &str) {
        if let Some(choice) = self.default_answers.iter_mut().find(|c| c.value == value) {
            choice.label = label.to_string();
            self.version += 1;
        }
    }

    /// The handler configuration for answer events
    pub fn hook(&self) -> &DispatchHook {
        &self.hook
    }

    /// Replace the handler configuration wholesale (used on rehydration)
    pub fn set_hook(&mut self, hook: DispatchHook) {
        self.hook = hook;
    }

    /// Bind the handler registered under `type_key`. Unknown keys are a
    /// configuration error and fail at assignment time.
    pub fn bind_handler(
        &mut self,
        registry: &HandlerRegistry,
        type_key: &str,
    ) -> DomainResult<()> {
        self.hook.bind_handler(registry, type_key)
    }

    /// Bind the callback registered under `handler_ref`. Unknown references
    /// are a configuration error and fail at assignment time.
    pub fn bind_callback(
        &mut self,
        registry: &HandlerRegistry,
        handler_ref: &HandlerRef,
    ) -> DomainResult<()> {
        self.hook.bind_callback(registry, handler_ref)
    }

    /// Set an inline answer callback (not persistable)
    pub fn set_on_answer(&mut self, callback: AnswerCallback) {
        self.hook.set_callback(callback);
    }

    /// Clear the answer callback
    pub fn clear_on_answer(&mut self) {
        self.hook.clear_callback();
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{:?}|{}|{}|{}|{}|{}",
            self.id,
            self.internal_id,
            self.user_id,
            self.field_type,
            self.is_completed,
            self.is_mandatory,
            self.expects_command,
            self.question_text,
            self.follow_up.as_deref().unwrap_or("")
        )
    }
}
