use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::{CourseLevel, ResourceKind, UserRole};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Valid email required"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 chars"))]
    pub password: String,

    pub role: UserRole,

    #[validate(length(max = 60))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Valid email required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(length(min = 3, max = 120), custom(function = "not_blank"))]
    pub title: String,

    #[validate(length(max = 200))]
    pub subtitle: Option<String>,

    #[validate(length(max = 4000))]
    pub about: Option<String>,

    #[validate(length(max = 80))]
    pub category: Option<String>,

    pub level: Option<CourseLevel>,

    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    #[validate(length(min = 3, max = 120), custom(function = "not_blank"))]
    pub title: Option<String>,

    #[validate(length(max = 200))]
    pub subtitle: Option<String>,

    #[validate(length(max = 4000))]
    pub about: Option<String>,

    #[validate(length(max = 80))]
    pub category: Option<String>,

    pub level: Option<CourseLevel>,

    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    #[validate(range(min = 1))]
    pub order: i32,

    #[validate(length(min = 2, max = 140), custom(function = "not_blank"))]
    pub title: String,

    #[validate(length(max = 40))]
    pub duration: Option<String>,

    #[validate(length(max = 20000))]
    pub content: Option<String>,

    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonRequest {
    #[validate(range(min = 1))]
    pub order: Option<i32>,

    #[validate(length(min = 2, max = 140), custom(function = "not_blank"))]
    pub title: Option<String>,

    #[validate(length(max = 40))]
    pub duration: Option<String>,

    #[validate(length(max = 20000))]
    pub content: Option<String>,

    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    #[validate(length(min = 2, max = 140), custom(function = "not_blank"))]
    pub title: String,

    #[serde(rename = "type")]
    pub kind: Option<ResourceKind>,

    #[validate(url(message = "URL must include a protocol"), length(max = 2000))]
    pub url: String,

    #[validate(length(max = 4000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[validate(length(min = 2, max = 140), custom(function = "not_blank"))]
    pub title: Option<String>,

    #[serde(rename = "type")]
    pub kind: Option<ResourceKind>,

    #[validate(url(message = "URL must include a protocol"), length(max = 2000))]
    pub url: Option<String>,

    #[validate(length(max = 4000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestionInput {
    #[validate(length(min = 1, max = 500), custom(function = "not_blank"))]
    pub prompt: String,

    #[validate(length(min = 2, max = 6), custom(function = "validate_options"))]
    pub options: Vec<String>,

    // out-of-range values are clamped, not rejected
    #[serde(default)]
    pub correct_option: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(min = 2, max = 140), custom(function = "not_blank"))]
    pub title: String,

    pub deadline: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<u32>,

    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuizQuestionInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    #[validate(length(min = 2, max = 140), custom(function = "not_blank"))]
    pub title: Option<String>,

    /// `None` leaves the deadline alone, `Some(None)` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    pub deadline: Option<Option<DateTime<Utc>>>,

    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<u32>,

    #[validate(length(min = 1), nested)]
    pub questions: Option<Vec<QuizQuestionInput>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ToggleLessonRequest {
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(max = 40))]
    pub score: Option<String>,

    pub answers: Option<BTreeMap<String, i64>>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    for option in options {
        let len = option.trim().chars().count();
        if len == 0 || len > 500 {
            return Err(ValidationError::new("option_length"));
        }
    }
    Ok(())
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
