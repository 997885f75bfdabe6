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
    models::domain::Course,
};

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, course: Course) -> AppResult<Course>;
    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Course>>;
    async fn find_by_ids(&self, ids: &[ObjectId]) -> AppResult<Vec<Course>>;
    /// All courses of one teacher, published or not, newest first.
    async fn list_by_teacher(&self, teacher_id: &ObjectId) -> AppResult<Vec<Course>>;
    /// Published courses of every teacher, newest first.
    async fn list_published(&self) -> AppResult<Vec<Course>>;
    async fn update(&self, course: Course) -> AppResult<Course>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoCourseRepository {
    collection: Collection<Course>,
}

impl MongoCourseRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("courses");
        Self { collection }
    }

    async fn find_newest_first(&self, filter: Document) -> AppResult<Vec<Course>> {
        let cursor = self.collection.find(filter).sort(doc! { "_id": -1 }).await?;
        let courses: Vec<Course> = cursor.try_collect().await?;
        Ok(courses)
    }
}

#[async_trait]
impl CourseRepository for MongoCourseRepository {
    async fn create(&self, course: Course) -> AppResult<Course> {
        self.collection.insert_one(&course).await?;
        Ok(course)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Course>> {
        let course = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(course)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> AppResult<Vec<Course>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_newest_first(doc! { "_id": { "$in": ids.to_vec() } })
            .await
    }

    async fn list_by_teacher(&self, teacher_id: &ObjectId) -> AppResult<Vec<Course>> {
        self.find_newest_first(doc! { "teacher_id": teacher_id }).await
    }

    async fn list_published(&self) -> AppResult<Vec<Course>> {
        self.find_newest_first(doc! { "is_published": true }).await
    }

    async fn update(&self, course: Course) -> AppResult<Course> {
        let result = self
            .collection
            .replace_one(doc! { "_id": course.id }, &course)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::not_found("course"));
        }
        Ok(course)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for courses collection");

        let teacher_index = IndexModel::builder()
            .keys(doc! { "teacher_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("teacher_id".to_string())
                    .build(),
            )
            .build();
        let published_index = IndexModel::builder()
            .keys(doc! { "is_published": 1 })
            .options(
                IndexOptions::builder()
                    .name("is_published".to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_indexes(vec![teacher_index, published_index])
            .await?;

        log::info!("Successfully created indexes for courses collection");
        Ok(())
    }
}
