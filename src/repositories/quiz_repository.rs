use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Quiz,
    repositories::{count_grouped_by_course, scoped_items_filter},
};

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Quiz>>;
    /// Every quiz of the course, lesson-scoped ones included, newest first.
    async fn list_by_course(&self, course_id: &ObjectId) -> AppResult<Vec<Quiz>>;
    async fn list_by_lesson(&self, course_id: &ObjectId, lesson_id: &ObjectId)
        -> AppResult<Vec<Quiz>>;
    /// Per-course counts. With `visible_lessons`, items scoped to any other
    /// lesson are left out.
    async fn count_by_courses(
        &self,
        course_ids: &[ObjectId],
        visible_lessons: Option<&BTreeSet<ObjectId>>,
    ) -> AppResult<HashMap<ObjectId, u64>>;
    async fn update(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn delete(&self, id: &ObjectId) -> AppResult<()>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quizzes");
        Self { collection }
    }

    async fn find_newest_first(&self, filter: Document) -> AppResult<Vec<Quiz>> {
        let cursor = self.collection.find(filter).sort(doc! { "_id": -1 }).await?;
        let quizzes: Vec<Quiz> = cursor.try_collect().await?;
        Ok(quizzes)
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.collection.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Quiz>> {
        let quiz = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(quiz)
    }

    async fn list_by_course(&self, course_id: &ObjectId) -> AppResult<Vec<Quiz>> {
        self.find_newest_first(doc! { "course_id": course_id }).await
    }

    async fn list_by_lesson(
        &self,
        course_id: &ObjectId,
        lesson_id: &ObjectId,
    ) -> AppResult<Vec<Quiz>> {
        self.find_newest_first(doc! { "course_id": course_id, "lesson_id": lesson_id })
            .await
    }

    async fn count_by_courses(
        &self,
        course_ids: &[ObjectId],
        visible_lessons: Option<&BTreeSet<ObjectId>>,
    ) -> AppResult<HashMap<ObjectId, u64>> {
        count_grouped_by_course(
            &self.collection,
            scoped_items_filter(course_ids, visible_lessons),
        )
        .await
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let result = self
            .collection
            .replace_one(doc! { "_id": quiz.id }, &quiz)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::not_found("quiz"));
        }
        Ok(quiz)
    }

    async fn delete(&self, id: &ObjectId) -> AppResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;

        if result.deleted_count == 0 {
            return Err(AppError::not_found("quiz"));
        }
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let course_index = IndexModel::builder()
            .keys(doc! { "course_id": 1, "lesson_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("course_lesson".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(course_index).await?;

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }
}
