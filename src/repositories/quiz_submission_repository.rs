use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::QuizSubmission};

#[async_trait]
pub trait QuizSubmissionRepository: Send + Sync {
    async fn create(&self, submission: QuizSubmission) -> AppResult<QuizSubmission>;
    async fn count_for_student(&self, quiz_id: &ObjectId, student_id: &ObjectId) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoQuizSubmissionRepository {
    collection: Collection<QuizSubmission>,
}

impl MongoQuizSubmissionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quiz_submissions");
        Self { collection }
    }
}

#[async_trait]
impl QuizSubmissionRepository for MongoQuizSubmissionRepository {
    async fn create(&self, submission: QuizSubmission) -> AppResult<QuizSubmission> {
        self.collection.insert_one(&submission).await?;
        Ok(submission)
    }

    async fn count_for_student(&self, quiz_id: &ObjectId, student_id: &ObjectId) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! { "quiz_id": quiz_id, "student_id": student_id })
            .await?;
        Ok(count)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let model = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "student_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("quiz_student".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(model).await?;
        log::info!("Created index on quiz_submissions.quiz_id, student_id");

        Ok(())
    }
}
