//! Tests for the question aggregate

use survey_dialog::{Answer, Choice, Constraint, FieldType, Question};
use uuid::Uuid;

fn integer_question() -> Question {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Integer, "How many?");
    question.derive_constraint_from_field_type();
    question
}

#[test]
fn derive_constraint_is_idempotent() {
    let mut question = integer_question();
    question.derive_constraint_from_field_type();
    question.derive_constraint_from_field_type();

    assert_eq!(question.constraints().len(), 1);
    assert_eq!(question.constraints()[0].field_type, FieldType::Integer);
}

#[test]
fn derive_constraint_is_noop_for_none() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::None, "Anything");
    question.derive_constraint_from_field_type();
    assert!(question.constraints().is_empty());
}

#[test]
fn duplicate_field_type_constraint_is_noop() {
    let mut question = integer_question();
    question.add_constraint(Constraint::integer_range(Some(1), Some(10)));

    // The derived parse-only constraint is already attached
    assert_eq!(question.constraints().len(), 1);
    question.add_answer("5000");
    assert!(question.is_completed());
}

#[test]
fn answers_preserve_call_order() {
    let mut question = integer_question();
    for i in 0..5 {
        question.add_answer(&i.to_string());
    }

    assert_eq!(question.answers().len(), 5);
    let values: Vec<&str> = question
        .answers()
        .iter()
        .map(|a| a.effective_value())
        .collect();
    assert_eq!(values, ["0", "1", "2", "3", "4"]);
    assert_eq!(question.last_answer().unwrap().effective_value(), "4");
}

#[test]
fn completion_tracks_the_latest_answer_only() {
    let mut question = integer_question();

    question.add_answer("42");
    assert!(question.is_completed());

    question.add_answer("not a number");
    assert!(!question.is_completed());

    question.add_answer("7");
    assert!(question.is_completed());
    assert_eq!(question.answers().len(), 3);
}

#[test]
fn invalid_answers_are_still_recorded() {
    let mut question = integer_question();
    let answer = question.add_answer("abc");

    assert_eq!(answer.raw_text(), Some("abc"));
    assert!(!question.is_completed());
    assert_eq!(question.answers().len(), 1);
}

#[test]
fn json_choice_input_resolves_to_a_picked_answer() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Text, "Pick a color");
    let raw = serde_json::to_string(&Choice::new("Red", "red")).unwrap();

    let answer = question.add_answer(&raw);
    let choice = answer.picked_choice().expect("should resolve to a choice");
    assert_eq!(choice.value, "red");
    assert_eq!(choice.label, "Red");
}

#[test]
fn non_choice_json_falls_back_to_free_text() {
    let mut question = integer_question();

    // Valid JSON, but not a choice shape
    let answer = question.add_answer("42");
    assert_eq!(answer.raw_text(), Some("42"));
    assert!(question.is_completed());
}

#[test]
fn foreign_answer_is_rejected_without_side_effect() {
    let mut question = integer_question();
    let other = Answer::text(Uuid::new_v4(), "5");

    assert!(question.add_recorded_answer(other).is_none());
    assert!(question.answers().is_empty());
    assert!(!question.is_completed());
}

#[test]
fn duplicate_answer_is_rejected_without_side_effect() {
    let mut question = integer_question();
    let answer = Answer::text(question.id(), "5");

    assert!(question.add_recorded_answer(answer.clone()).is_some());
    assert!(question.add_recorded_answer(answer).is_none());
    assert_eq!(question.answers().len(), 1);
}

#[test]
fn equal_value_answers_are_distinct_instances() {
    let mut question = integer_question();
    let first = Answer::text(question.id(), "5");
    let second = Answer::text(question.id(), "5");

    assert!(question.add_recorded_answer(first).is_some());
    assert!(question.add_recorded_answer(second).is_some());
    assert_eq!(question.answers().len(), 2);
}

#[test]
fn system_choice_answer_bypasses_constraints() {
    let mut question = integer_question();
    question.add_choice_answer(Choice::skip());
    assert!(question.is_completed());
}

#[test]
fn singular_default_answer_rejects_on_constraint_failure() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Integer, "1 to 10?");
    question.add_constraint(Constraint::integer_range(Some(1), Some(10)));

    question.add_default_answer(Choice::from_text("15"));
    assert!(question.default_answers().is_empty());

    question.add_default_answer(Choice::from_text("5"));
    assert_eq!(question.default_answers().len(), 1);
}

#[test]
fn plural_default_answers_warn_but_append() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Integer, "1 to 10?");
    question.add_constraint(Constraint::integer_range(Some(1), Some(10)));

    question.add_default_answers(vec![Choice::from_text("15")]);
    assert_eq!(question.default_answers().len(), 1);
    assert_eq!(question.default_answers()[0].value, "15");
}

#[test]
fn plural_value_list_routes_through_the_plural_path() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Integer, "1 to 10?");
    question.add_constraint(Constraint::integer_range(Some(1), Some(10)));

    question.add_default_answer_values(&["15", "", "  ", "3"]);
    let values: Vec<&str> = question
        .default_answers()
        .iter()
        .map(|c| c.value.as_str())
        .collect();
    assert_eq!(values, ["15", "3"]);
}

#[test]
fn singular_value_skips_blanks() {
    let mut question = integer_question();
    question.add_default_answer_value("  ", None);
    question.add_default_answer_value("7", Some("Seven"));

    assert_eq!(question.default_answers().len(), 1);
    assert_eq!(question.default_answers()[0].label, "Seven");
}

#[test]
fn system_choices_always_pass_default_curation() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Integer, "1 to 10?");
    question.add_constraint(Constraint::integer_range(Some(1), Some(10)));

    question.add_default_answer(Choice::skip());
    question.add_default_answer(Choice::new_keyboard_line());
    question.add_default_answers(vec![Choice::back(), Choice::cancel()]);

    assert_eq!(question.default_answers().len(), 4);
}

#[test]
fn clear_default_answers_can_keep_system_choices() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Text, "Pick");
    question.add_default_answer(Choice::from_text("a"));
    question.add_default_answer(Choice::skip());
    question.add_default_answer(Choice::from_text("b"));
    question.add_default_answer(Choice::back());

    question.clear_default_answers(true);
    assert_eq!(question.default_answers().len(), 2);
    assert!(question.default_answers().iter().all(|c| c.is_system_choice));

    question.clear_default_answers(false);
    assert!(question.default_answers().is_empty());
}

#[test]
fn remove_default_answer_removes_first_match_only() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Text, "Pick");
    question.add_default_answer(Choice::new("A", "x"));
    question.add_default_answer(Choice::new("B", "x"));

    question.remove_default_answer(&Choice::from_text("x"));
    assert_eq!(question.default_answers().len(), 1);
    assert_eq!(question.default_answers()[0].label, "B");

    // Non-member removal is a no-op
    question.remove_default_answer(&Choice::from_text("missing"));
    assert_eq!(question.default_answers().len(), 1);
}

#[test]
fn remove_by_value_removes_all_matches() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Text, "Pick");
    question.add_default_answer(Choice::new("A", "x"));
    question.add_default_answer(Choice::new("B", "y"));
    question.add_default_answer(Choice::new("C", "x"));

    question.remove_default_answers_with_value("x");
    assert_eq!(question.default_answers().len(), 1);
    assert_eq!(question.default_answers()[0].value, "y");
}

#[test]
fn update_default_answer_label_keeps_identity() {
    let mut question = Question::new(Uuid::new_v4(), 1, FieldType::Text, "Pick");
    question.add_default_answer(Choice::new("Old", "x"));

    question.update_default_answer_label("x", "New");
    assert_eq!(question.default_answers()[0].label, "New");
    assert_eq!(question.default_answers()[0].value, "x");

    // Absent value is a no-op
    question.update_default_answer_label("missing", "whatever");
    assert_eq!(question.default_answers().len(), 1);
}

#[test]
fn integer_question_example_scenario() {
    let mut question = integer_question();

    question.add_answer("abc");
    assert!(!question.is_completed());

    question.add_answer("42");
    assert!(question.is_completed());

    assert_eq!(question.answers().len(), 2);
    assert_eq!(question.last_answer().unwrap().raw_text(), Some("42"));
}

#[test]
fn display_joins_key_fields() {
    let question = Question::new(Uuid::new_v4(), 9, FieldType::Boolean, "Sure?")
        .with_user(77)
        .with_mandatory(true);

    let text = question.to_string();
    assert!(text.contains("|9|77|Boolean|false|true|false|Sure?|"));
}
