use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{conflict_or_database, AppError, AppResult},
    models::domain::Lesson,
    repositories::count_grouped_by_course,
};

pub const ORDER_TAKEN: &str = "Lesson order already exists";

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the course already has a lesson at that order.
    async fn create(&self, lesson: Lesson) -> AppResult<Lesson>;
    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Lesson>>;
    /// Lessons of a course sorted by `order`, optionally only the published ones.
    async fn list_by_course(
        &self,
        course_id: &ObjectId,
        published_only: bool,
    ) -> AppResult<Vec<Lesson>>;
    async fn published_ids(&self, course_id: &ObjectId) -> AppResult<BTreeSet<ObjectId>>;
    /// Published lesson ids across several courses.
    async fn published_ids_in(&self, course_ids: &[ObjectId]) -> AppResult<BTreeSet<ObjectId>>;
    async fn count_by_courses(
        &self,
        course_ids: &[ObjectId],
        published_only: bool,
    ) -> AppResult<HashMap<ObjectId, u64>>;
    async fn update(&self, lesson: Lesson) -> AppResult<Lesson>;
    async fn delete(&self, id: &ObjectId) -> AppResult<()>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoLessonRepository {
    collection: Collection<Lesson>,
}

impl MongoLessonRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("lessons");
        Self { collection }
    }
}

#[async_trait]
impl LessonRepository for MongoLessonRepository {
    async fn create(&self, lesson: Lesson) -> AppResult<Lesson> {
        self.collection
            .insert_one(&lesson)
            .await
            .map_err(|e| conflict_or_database(e, ORDER_TAKEN))?;
        Ok(lesson)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Lesson>> {
        let lesson = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(lesson)
    }

    async fn list_by_course(
        &self,
        course_id: &ObjectId,
        published_only: bool,
    ) -> AppResult<Vec<Lesson>> {
        let mut filter = doc! { "course_id": course_id };
        if published_only {
            filter.insert("is_published", true);
        }

        let cursor = self.collection.find(filter).sort(doc! { "order": 1 }).await?;
        let lessons: Vec<Lesson> = cursor.try_collect().await?;
        Ok(lessons)
    }

    async fn published_ids(&self, course_id: &ObjectId) -> AppResult<BTreeSet<ObjectId>> {
        let lessons = self.list_by_course(course_id, true).await?;
        Ok(lessons.into_iter().map(|lesson| lesson.id).collect())
    }

    async fn published_ids_in(&self, course_ids: &[ObjectId]) -> AppResult<BTreeSet<ObjectId>> {
        let cursor = self
            .collection
            .find(doc! { "course_id": { "$in": course_ids.to_vec() }, "is_published": true })
            .await?;
        let lessons: Vec<Lesson> = cursor.try_collect().await?;
        Ok(lessons.into_iter().map(|lesson| lesson.id).collect())
    }

    async fn count_by_courses(
        &self,
        course_ids: &[ObjectId],
        published_only: bool,
    ) -> AppResult<HashMap<ObjectId, u64>> {
        let mut filter = doc! { "course_id": { "$in": course_ids.to_vec() } };
        if published_only {
            filter.insert("is_published", true);
        }
        count_grouped_by_course(&self.collection, filter).await
    }

    async fn update(&self, lesson: Lesson) -> AppResult<Lesson> {
        let result = self
            .collection
            .replace_one(doc! { "_id": lesson.id }, &lesson)
            .await
            .map_err(|e| conflict_or_database(e, ORDER_TAKEN))?;

        if result.matched_count == 0 {
            return Err(AppError::not_found("lesson"));
        }
        Ok(lesson)
    }

    async fn delete(&self, id: &ObjectId) -> AppResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;

        if result.deleted_count == 0 {
            return Err(AppError::not_found("lesson"));
        }
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for lessons collection");

        let order_index = IndexModel::builder()
            .keys(doc! { "course_id": 1, "order": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("course_order_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(order_index).await?;

        log::info!("Successfully created indexes for lessons collection");
        Ok(())
    }
}
