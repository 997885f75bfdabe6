use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::domain::course::trimmed_or_empty;
use crate::models::dto::request::{CreateResourceRequest, UpdateResourceRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Link,
    Video,
    File,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Resource {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub course_id: ObjectId,
    #[serde(default)]
    pub lesson_id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub kind: ResourceKind,
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    pub fn from_request(
        course_id: ObjectId,
        lesson_id: Option<ObjectId>,
        request: CreateResourceRequest,
    ) -> Self {
        let now = Utc::now();
        Resource {
            id: ObjectId::new(),
            course_id,
            lesson_id,
            title: request.title.trim().to_string(),
            kind: request.kind.unwrap_or_default(),
            url: request.url.trim().to_string(),
            description: trimmed_or_empty(request.description),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_patch(&mut self, patch: UpdateResourceRequest) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(url) = patch.url {
            self.url = url.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description.trim().to_string();
        }
        self.updated_at = Utc::now();
    }
}
