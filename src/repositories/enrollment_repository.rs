use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, to_bson, to_document, Document},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{is_duplicate_key, AppError, AppResult},
    models::domain::Enrollment,
    repositories::count_grouped_by_course,
};

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Returns the enrollment for the pair, creating it if none exists.
    /// An existing record is returned untouched.
    async fn upsert(&self, course_id: &ObjectId, student_id: &ObjectId) -> AppResult<Enrollment>;
    async fn find(
        &self,
        course_id: &ObjectId,
        student_id: &ObjectId,
    ) -> AppResult<Option<Enrollment>>;
    /// Adds or removes `lesson_id` from the completion set in one atomic
    /// write and returns the record as left by that write. `None` when the
    /// student is not enrolled.
    async fn mark_lesson(
        &self,
        course_id: &ObjectId,
        student_id: &ObjectId,
        lesson_id: &ObjectId,
        completed: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Enrollment>>;
    /// Writes `status` and `completed_at` only if no membership change has
    /// landed since `enrollment` was read. Returns whether the write applied.
    async fn save_status(&self, enrollment: &Enrollment) -> AppResult<bool>;
    /// Newest first.
    async fn list_by_student(&self, student_id: &ObjectId) -> AppResult<Vec<Enrollment>>;
    /// Newest first.
    async fn list_by_course(&self, course_id: &ObjectId) -> AppResult<Vec<Enrollment>>;
    async fn count_by_courses(&self, course_ids: &[ObjectId]) -> AppResult<HashMap<ObjectId, u64>>;
    async fn count_distinct_students(&self, course_ids: &[ObjectId]) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoEnrollmentRepository {
    collection: Collection<Enrollment>,
}

impl MongoEnrollmentRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("enrollments");
        Self { collection }
    }

    fn pair_filter(course_id: &ObjectId, student_id: &ObjectId) -> Document {
        doc! { "course_id": course_id, "student_id": student_id }
    }

    async fn find_newest_first(&self, filter: Document) -> AppResult<Vec<Enrollment>> {
        let cursor = self.collection.find(filter).sort(doc! { "_id": -1 }).await?;
        let enrollments: Vec<Enrollment> = cursor.try_collect().await?;
        Ok(enrollments)
    }
}

#[async_trait]
impl EnrollmentRepository for MongoEnrollmentRepository {
    async fn upsert(&self, course_id: &ObjectId, student_id: &ObjectId) -> AppResult<Enrollment> {
        let fresh = Enrollment::new(*course_id, *student_id);
        let filter = Self::pair_filter(course_id, student_id);
        let update = doc! { "$setOnInsert": to_document(&fresh)? };

        let result = self
            .collection
            .find_one_and_update(filter.clone(), update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(Some(enrollment)) => Ok(enrollment),
            Ok(None) => Err(AppError::InternalError(
                "Enrollment upsert returned no document".to_string(),
            )),
            // a concurrent upsert won the unique index; read its record
            Err(err) if is_duplicate_key(&err) => {
                log::debug!("Enrollment upsert raced for course {}", course_id);
                self.collection
                    .find_one(filter)
                    .await?
                    .ok_or_else(|| AppError::InternalError("Enrollment vanished".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find(
        &self,
        course_id: &ObjectId,
        student_id: &ObjectId,
    ) -> AppResult<Option<Enrollment>> {
        let enrollment = self
            .collection
            .find_one(Self::pair_filter(course_id, student_id))
            .await?;
        Ok(enrollment)
    }

    async fn mark_lesson(
        &self,
        course_id: &ObjectId,
        student_id: &ObjectId,
        lesson_id: &ObjectId,
        completed: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Enrollment>> {
        let membership = if completed { "$addToSet" } else { "$pull" };
        let mut update = doc! {
            "$set": { "last_lesson_id": lesson_id, "updated_at": to_bson(&now)? },
            "$inc": { "revision": 1_i64 },
        };
        update.insert(membership, doc! { "completed_lesson_ids": lesson_id });

        let enrollment = self
            .collection
            .find_one_and_update(Self::pair_filter(course_id, student_id), update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(enrollment)
    }

    async fn save_status(&self, enrollment: &Enrollment) -> AppResult<bool> {
        let update = doc! {
            "$set": {
                "status": to_bson(&enrollment.status)?,
                "completed_at": to_bson(&enrollment.completed_at)?,
            }
        };
        let result = self
            .collection
            .update_one(
                doc! { "_id": enrollment.id, "revision": enrollment.revision },
                update,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn list_by_student(&self, student_id: &ObjectId) -> AppResult<Vec<Enrollment>> {
        self.find_newest_first(doc! { "student_id": student_id }).await
    }

    async fn list_by_course(&self, course_id: &ObjectId) -> AppResult<Vec<Enrollment>> {
        self.find_newest_first(doc! { "course_id": course_id }).await
    }

    async fn count_by_courses(&self, course_ids: &[ObjectId]) -> AppResult<HashMap<ObjectId, u64>> {
        count_grouped_by_course(
            &self.collection,
            doc! { "course_id": { "$in": course_ids.to_vec() } },
        )
        .await
    }

    async fn count_distinct_students(&self, course_ids: &[ObjectId]) -> AppResult<u64> {
        if course_ids.is_empty() {
            return Ok(0);
        }
        let students = self
            .collection
            .distinct(
                "student_id",
                doc! { "course_id": { "$in": course_ids.to_vec() } },
            )
            .await?;
        Ok(students.len() as u64)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for enrollments collection");

        let pair_index = IndexModel::builder()
            .keys(doc! { "course_id": 1, "student_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("course_student_unique".to_string())
                    .build(),
            )
            .build();
        let student_index = IndexModel::builder()
            .keys(doc! { "student_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("student_id".to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_indexes(vec![pair_index, student_index])
            .await?;

        log::info!("Successfully created indexes for enrollments collection");
        Ok(())
    }
}
