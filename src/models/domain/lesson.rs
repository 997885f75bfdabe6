use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::domain::course::trimmed_or_empty;
use crate::models::dto::request::{CreateLessonRequest, UpdateLessonRequest};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Lesson {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub course_id: ObjectId,
    pub order: i32, // unique within the course
    pub title: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub content: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn from_request(course_id: ObjectId, request: CreateLessonRequest) -> Self {
        let now = Utc::now();
        Lesson {
            id: ObjectId::new(),
            course_id,
            order: request.order,
            title: request.title.trim().to_string(),
            duration: trimmed_or_empty(request.duration),
            content: trimmed_or_empty(request.content),
            // lessons are visible by default, unlike courses
            is_published: request.is_published.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_patch(&mut self, patch: UpdateLessonRequest) {
        if let Some(order) = patch.order {
            self.order = order;
        }
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(duration) = patch.duration {
            self.duration = duration.trim().to_string();
        }
        if let Some(content) = patch.content {
            self.content = content.trim().to_string();
        }
        if let Some(is_published) = patch.is_published {
            self.is_published = is_published;
        }
        self.updated_at = Utc::now();
    }
}
