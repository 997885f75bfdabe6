use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A student's quiz submission as reported by the client.
///
/// Grading and the attempt cap happen on the attempting side; the server keeps
/// the event and the reported values verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizSubmission {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub quiz_id: ObjectId,
    pub course_id: ObjectId,
    pub student_id: ObjectId,
    #[serde(default)]
    pub reported_score: Option<String>,
    #[serde(default)]
    pub answers: Option<BTreeMap<String, i64>>, // question index -> chosen option
    pub submitted_at: DateTime<Utc>,
}

impl QuizSubmission {
    pub fn new(
        quiz_id: ObjectId,
        course_id: ObjectId,
        student_id: ObjectId,
        reported_score: Option<String>,
        answers: Option<BTreeMap<String, i64>>,
    ) -> Self {
        QuizSubmission {
            id: ObjectId::new(),
            quiz_id,
            course_id,
            student_id,
            reported_score,
            answers,
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_keeps_reported_values() {
        let answers: BTreeMap<String, i64> = [("0".to_string(), 2), ("1".to_string(), 0)].into();
        let submission = QuizSubmission::new(
            ObjectId::new(),
            ObjectId::new(),
            ObjectId::new(),
            Some("1/2".to_string()),
            Some(answers.clone()),
        );

        assert_eq!(submission.reported_score.as_deref(), Some("1/2"));
        assert_eq!(submission.answers, Some(answers));
    }
}
