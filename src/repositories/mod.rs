pub mod course_repository;
pub mod enrollment_repository;
pub mod lesson_repository;
pub mod memory;
pub mod quiz_repository;
pub mod quiz_submission_repository;
pub mod resource_repository;
pub mod user_repository;

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    Collection,
};

pub use course_repository::{CourseRepository, MongoCourseRepository};
pub use enrollment_repository::{EnrollmentRepository, MongoEnrollmentRepository};
pub use lesson_repository::{LessonRepository, MongoLessonRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
pub use quiz_submission_repository::{MongoQuizSubmissionRepository, QuizSubmissionRepository};
pub use resource_repository::{MongoResourceRepository, ResourceRepository};
pub use user_repository::{MongoUserRepository, UserRepository};

use crate::{db::Database, errors::AppResult};

/// Every store the services need, behind their traits.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub resources: Arc<dyn ResourceRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub submissions: Arc<dyn QuizSubmissionRepository>,
}

impl Repositories {
    pub fn mongo(db: &Database) -> Self {
        Self {
            users: Arc::new(MongoUserRepository::new(db)),
            courses: Arc::new(MongoCourseRepository::new(db)),
            lessons: Arc::new(MongoLessonRepository::new(db)),
            enrollments: Arc::new(MongoEnrollmentRepository::new(db)),
            resources: Arc::new(MongoResourceRepository::new(db)),
            quizzes: Arc::new(MongoQuizRepository::new(db)),
            submissions: Arc::new(MongoQuizSubmissionRepository::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::InMemoryUserRepository::new()),
            courses: Arc::new(memory::InMemoryCourseRepository::new()),
            lessons: Arc::new(memory::InMemoryLessonRepository::new()),
            enrollments: Arc::new(memory::InMemoryEnrollmentRepository::new()),
            resources: Arc::new(memory::InMemoryResourceRepository::new()),
            quizzes: Arc::new(memory::InMemoryQuizRepository::new()),
            submissions: Arc::new(memory::InMemoryQuizSubmissionRepository::new()),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        self.users.ensure_indexes().await?;
        self.courses.ensure_indexes().await?;
        self.lessons.ensure_indexes().await?;
        self.enrollments.ensure_indexes().await?;
        self.resources.ensure_indexes().await?;
        self.quizzes.ensure_indexes().await?;
        self.submissions.ensure_indexes().await?;
        Ok(())
    }
}

/// Filter for course-scoped items in `course_ids`. With `visible_lessons`,
/// lesson-scoped items only match when their lesson is in the set.
pub(crate) fn scoped_items_filter(
    course_ids: &[ObjectId],
    visible_lessons: Option<&BTreeSet<ObjectId>>,
) -> Document {
    let mut filter = doc! { "course_id": { "$in": course_ids.to_vec() } };
    if let Some(lessons) = visible_lessons {
        let lessons: Vec<ObjectId> = lessons.iter().copied().collect();
        filter.insert(
            "$or",
            vec![
                doc! { "lesson_id": Bson::Null },
                doc! { "lesson_id": { "$in": lessons } },
            ],
        );
    }
    filter
}

/// Runs `$match` on `filter` and counts the matches per `course_id`.
pub(crate) async fn count_grouped_by_course<T>(
    collection: &Collection<T>,
    filter: Document,
) -> AppResult<HashMap<ObjectId, u64>>
where
    T: Send + Sync,
{
    let pipeline = vec![
        doc! { "$match": filter },
        doc! { "$group": { "_id": "$course_id", "count": { "$sum": 1 } } },
    ];

    let mut cursor = collection.aggregate(pipeline).await?;
    let mut counts = HashMap::new();
    while let Some(row) = cursor.try_next().await? {
        let Ok(course_id) = row.get_object_id("_id") else {
            continue;
        };
        let count = match row.get("count") {
            Some(Bson::Int32(n)) => *n as u64,
            Some(Bson::Int64(n)) => *n as u64,
            _ => 0,
        };
        counts.insert(course_id, count);
    }
    Ok(counts)
}
