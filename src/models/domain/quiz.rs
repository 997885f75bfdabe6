use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::dto::request::{CreateQuizRequest, QuizQuestionInput, UpdateQuizRequest};

pub const DEFAULT_DURATION_MINUTES: u32 = 20;
pub const MAX_OPTIONS: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize, // zero-based, always a valid option index
}

impl QuizQuestion {
    /// Builds a question, clamping the correct index into the option range
    /// rather than rejecting it.
    pub fn from_input(input: QuizQuestionInput) -> Self {
        let options: Vec<String> = input
            .options
            .into_iter()
            .take(MAX_OPTIONS)
            .map(|o| o.trim().to_string())
            .collect();
        let last = options.len().saturating_sub(1) as i64;
        let correct_option = input.correct_option.clamp(0, last) as usize;

        QuizQuestion {
            prompt: input.prompt.trim().to_string(),
            options,
            correct_option,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub course_id: ObjectId,
    #[serde(default)]
    pub lesson_id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub questions: Vec<QuizQuestion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    pub fn from_request(
        course_id: ObjectId,
        lesson_id: Option<ObjectId>,
        request: CreateQuizRequest,
    ) -> Self {
        let now = Utc::now();
        Quiz {
            id: ObjectId::new(),
            course_id,
            lesson_id,
            title: request.title.trim().to_string(),
            deadline: request.deadline,
            duration_minutes: request.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            questions: request
                .questions
                .into_iter()
                .map(QuizQuestion::from_input)
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_patch(&mut self, patch: UpdateQuizRequest) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            self.duration_minutes = duration_minutes;
        }
        if let Some(questions) = patch.questions {
            self.questions = questions.into_iter().map(QuizQuestion::from_input).collect();
        }
        self.updated_at = Utc::now();
    }
}
