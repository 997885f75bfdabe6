use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::dto::request::{CreateCourseRequest, UpdateCourseRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub teacher_id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub level: CourseLevel,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn from_request(teacher_id: ObjectId, request: CreateCourseRequest) -> Self {
        let now = Utc::now();
        Course {
            id: ObjectId::new(),
            teacher_id,
            title: request.title.trim().to_string(),
            subtitle: trimmed_or_empty(request.subtitle),
            about: trimmed_or_empty(request.about),
            category: trimmed_or_empty(request.category),
            level: request.level.unwrap_or_default(),
            is_published: request.is_published.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }

    /// Copies every field present in the patch; absent fields are left untouched.
    pub fn apply_patch(&mut self, patch: UpdateCourseRequest) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(subtitle) = patch.subtitle {
            self.subtitle = subtitle.trim().to_string();
        }
        if let Some(about) = patch.about {
            self.about = about.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = category.trim().to_string();
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(is_published) = patch.is_published {
            self.is_published = is_published;
        }
        self.updated_at = Utc::now();
    }

    pub fn is_owned_by(&self, teacher_id: &ObjectId) -> bool {
        &self.teacher_id == teacher_id
    }
}

pub(crate) fn trimmed_or_empty(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
