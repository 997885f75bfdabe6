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
    models::domain::Resource,
    repositories::{count_grouped_by_course, scoped_items_filter},
};

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn create(&self, resource: Resource) -> AppResult<Resource>;
    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Resource>>;
    /// Every resource of the course, lesson-scoped ones included, newest first.
    async fn list_by_course(&self, course_id: &ObjectId) -> AppResult<Vec<Resource>>;
    async fn list_by_lesson(
        &self,
        course_id: &ObjectId,
        lesson_id: &ObjectId,
    ) -> AppResult<Vec<Resource>>;
    /// Per-course counts. With `visible_lessons`, items scoped to any other
    /// lesson are left out.
    async fn count_by_courses(
        &self,
        course_ids: &[ObjectId],
        visible_lessons: Option<&BTreeSet<ObjectId>>,
    ) -> AppResult<HashMap<ObjectId, u64>>;
    async fn update(&self, resource: Resource) -> AppResult<Resource>;
    async fn delete(&self, id: &ObjectId) -> AppResult<()>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoResourceRepository {
    collection: Collection<Resource>,
}

impl MongoResourceRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("resources");
        Self { collection }
    }

    async fn find_newest_first(&self, filter: Document) -> AppResult<Vec<Resource>> {
        let cursor = self.collection.find(filter).sort(doc! { "_id": -1 }).await?;
        let resources: Vec<Resource> = cursor.try_collect().await?;
        Ok(resources)
    }
}

#[async_trait]
impl ResourceRepository for MongoResourceRepository {
    async fn create(&self, resource: Resource) -> AppResult<Resource> {
        self.collection.insert_one(&resource).await?;
        Ok(resource)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Resource>> {
        let resource = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(resource)
    }

    async fn list_by_course(&self, course_id: &ObjectId) -> AppResult<Vec<Resource>> {
        self.find_newest_first(doc! { "course_id": course_id }).await
    }

    async fn list_by_lesson(
        &self,
        course_id: &ObjectId,
        lesson_id: &ObjectId,
    ) -> AppResult<Vec<Resource>> {
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

    async fn update(&self, resource: Resource) -> AppResult<Resource> {
        let result = self
            .collection
            .replace_one(doc! { "_id": resource.id }, &resource)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::not_found("resource"));
        }
        Ok(resource)
    }

    async fn delete(&self, id: &ObjectId) -> AppResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;

        if result.deleted_count == 0 {
            return Err(AppError::not_found("resource"));
        }
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let model = IndexModel::builder()
            .keys(doc! { "course_id": 1, "lesson_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("course_lesson".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(model).await?;
        log::info!("Created index on resources.course_id, lesson_id");

        Ok(())
    }
}
