//! In-memory repositories honoring the same uniqueness rules as the MongoDB
//! indexes. Used by the service tests and the HTTP integration tests.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        user::normalize_email, Course, Enrollment, Lesson, Quiz, QuizSubmission, Resource, User,
    },
    repositories::{
        lesson_repository::ORDER_TAKEN, user_repository::EMAIL_TAKEN, CourseRepository,
        EnrollmentRepository, LessonRepository, QuizRepository, QuizSubmissionRepository,
        ResourceRepository, UserRepository,
    },
};

type Table<T> = Arc<RwLock<HashMap<ObjectId, T>>>;

fn newest_first<T>(mut items: Vec<T>, id: impl Fn(&T) -> ObjectId) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(id(item)));
    items
}

fn count_per_course<'a>(
    course_ids: &[ObjectId],
    rows: impl Iterator<Item = &'a ObjectId>,
) -> HashMap<ObjectId, u64> {
    let wanted: HashSet<&ObjectId> = course_ids.iter().collect();
    let mut counts = HashMap::new();
    for course_id in rows.filter(|id| wanted.contains(id)) {
        *counts.entry(*course_id).or_insert(0) += 1;
    }
    counts
}

fn lesson_visible(lesson_id: Option<&ObjectId>, visible: Option<&BTreeSet<ObjectId>>) -> bool {
    match (lesson_id, visible) {
        (Some(id), Some(visible)) => visible.contains(id),
        _ => true,
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Table<User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::AlreadyExists(EMAIL_TAKEN.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCourseRepository {
    courses: Table<Course>,
}

impl InMemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn matching(&self, predicate: impl Fn(&Course) -> bool) -> Vec<Course> {
        let courses = self.courses.read().await;
        let items = courses.values().filter(|c| predicate(c)).cloned().collect();
        newest_first(items, |c: &Course| c.id)
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn create(&self, course: Course) -> AppResult<Course> {
        self.courses.write().await.insert(course.id, course.clone());
        Ok(course)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Course>> {
        Ok(self.courses.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> AppResult<Vec<Course>> {
        Ok(self.matching(|c| ids.contains(&c.id)).await)
    }

    async fn list_by_teacher(&self, teacher_id: &ObjectId) -> AppResult<Vec<Course>> {
        Ok(self.matching(|c| &c.teacher_id == teacher_id).await)
    }

    async fn list_published(&self) -> AppResult<Vec<Course>> {
        Ok(self.matching(|c| c.is_published).await)
    }

    async fn update(&self, course: Course) -> AppResult<Course> {
        let mut courses = self.courses.write().await;
        if !courses.contains_key(&course.id) {
            return Err(AppError::not_found("course"));
        }
        courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryLessonRepository {
    lessons: Table<Lesson>,
}

impl InMemoryLessonRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn order_taken(lessons: &HashMap<ObjectId, Lesson>, candidate: &Lesson) -> bool {
    lessons.values().any(|l| {
        l.id != candidate.id && l.course_id == candidate.course_id && l.order == candidate.order
    })
}

#[async_trait]
impl LessonRepository for InMemoryLessonRepository {
    async fn create(&self, lesson: Lesson) -> AppResult<Lesson> {
        let mut lessons = self.lessons.write().await;
        if order_taken(&lessons, &lesson) {
            return Err(AppError::AlreadyExists(ORDER_TAKEN.to_string()));
        }
        lessons.insert(lesson.id, lesson.clone());
        Ok(lesson)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Lesson>> {
        Ok(self.lessons.read().await.get(id).cloned())
    }

    async fn list_by_course(
        &self,
        course_id: &ObjectId,
        published_only: bool,
    ) -> AppResult<Vec<Lesson>> {
        let lessons = self.lessons.read().await;
        let mut items: Vec<Lesson> = lessons
            .values()
            .filter(|l| &l.course_id == course_id && (!published_only || l.is_published))
            .cloned()
            .collect();
        items.sort_by_key(|l| l.order);
        Ok(items)
    }

    async fn published_ids(&self, course_id: &ObjectId) -> AppResult<BTreeSet<ObjectId>> {
        let lessons = self.lessons.read().await;
        Ok(lessons
            .values()
            .filter(|l| &l.course_id == course_id && l.is_published)
            .map(|l| l.id)
            .collect())
    }

    async fn published_ids_in(&self, course_ids: &[ObjectId]) -> AppResult<BTreeSet<ObjectId>> {
        let lessons = self.lessons.read().await;
        Ok(lessons
            .values()
            .filter(|l| course_ids.contains(&l.course_id) && l.is_published)
            .map(|l| l.id)
            .collect())
    }

    async fn count_by_courses(
        &self,
        course_ids: &[ObjectId],
        published_only: bool,
    ) -> AppResult<HashMap<ObjectId, u64>> {
        let lessons = self.lessons.read().await;
        let rows = lessons
            .values()
            .filter(|l| !published_only || l.is_published)
            .map(|l| &l.course_id);
        Ok(count_per_course(course_ids, rows))
    }

    async fn update(&self, lesson: Lesson) -> AppResult<Lesson> {
        let mut lessons = self.lessons.write().await;
        if !lessons.contains_key(&lesson.id) {
            return Err(AppError::not_found("lesson"));
        }
        if order_taken(&lessons, &lesson) {
            return Err(AppError::AlreadyExists(ORDER_TAKEN.to_string()));
        }
        lessons.insert(lesson.id, lesson.clone());
        Ok(lesson)
    }

    async fn delete(&self, id: &ObjectId) -> AppResult<()> {
        self.lessons
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("lesson"))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEnrollmentRepository {
    enrollments: Table<Enrollment>,
}

impl InMemoryEnrollmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.enrollments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryEnrollmentRepository {
    async fn upsert(&self, course_id: &ObjectId, student_id: &ObjectId) -> AppResult<Enrollment> {
        let mut enrollments = self.enrollments.write().await;
        if let Some(existing) = enrollments
            .values()
            .find(|e| &e.course_id == course_id && &e.student_id == student_id)
        {
            return Ok(existing.clone());
        }
        let enrollment = Enrollment::new(*course_id, *student_id);
        enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    async fn find(
        &self,
        course_id: &ObjectId,
        student_id: &ObjectId,
    ) -> AppResult<Option<Enrollment>> {
        let enrollments = self.enrollments.read().await;
        Ok(enrollments
            .values()
            .find(|e| &e.course_id == course_id && &e.student_id == student_id)
            .cloned())
    }

    async fn mark_lesson(
        &self,
        course_id: &ObjectId,
        student_id: &ObjectId,
        lesson_id: &ObjectId,
        completed: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Enrollment>> {
        let mut enrollments = self.enrollments.write().await;
        let Some(enrollment) = enrollments
            .values_mut()
            .find(|e| &e.course_id == course_id && &e.student_id == student_id)
        else {
            return Ok(None);
        };
        enrollment.mark_lesson(*lesson_id, completed, now);
        Ok(Some(enrollment.clone()))
    }

    async fn save_status(&self, enrollment: &Enrollment) -> AppResult<bool> {
        let mut enrollments = self.enrollments.write().await;
        match enrollments.get_mut(&enrollment.id) {
            Some(stored) if stored.revision == enrollment.revision => {
                stored.status = enrollment.status;
                stored.completed_at = enrollment.completed_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_student(&self, student_id: &ObjectId) -> AppResult<Vec<Enrollment>> {
        let enrollments = self.enrollments.read().await;
        let items = enrollments
            .values()
            .filter(|e| &e.student_id == student_id)
            .cloned()
            .collect();
        Ok(newest_first(items, |e: &Enrollment| e.id))
    }

    async fn list_by_course(&self, course_id: &ObjectId) -> AppResult<Vec<Enrollment>> {
        let enrollments = self.enrollments.read().await;
        let items = enrollments
            .values()
            .filter(|e| &e.course_id == course_id)
            .cloned()
            .collect();
        Ok(newest_first(items, |e: &Enrollment| e.id))
    }

    async fn count_by_courses(&self, course_ids: &[ObjectId]) -> AppResult<HashMap<ObjectId, u64>> {
        let enrollments = self.enrollments.read().await;
        Ok(count_per_course(
            course_ids,
            enrollments.values().map(|e| &e.course_id),
        ))
    }

    async fn count_distinct_students(&self, course_ids: &[ObjectId]) -> AppResult<u64> {
        let enrollments = self.enrollments.read().await;
        let students: HashSet<ObjectId> = enrollments
            .values()
            .filter(|e| course_ids.contains(&e.course_id))
            .map(|e| e.student_id)
            .collect();
        Ok(students.len() as u64)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryResourceRepository {
    resources: Table<Resource>,
}

impl InMemoryResourceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    async fn create(&self, resource: Resource) -> AppResult<Resource> {
        self.resources
            .write()
            .await
            .insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Resource>> {
        Ok(self.resources.read().await.get(id).cloned())
    }

    async fn list_by_course(&self, course_id: &ObjectId) -> AppResult<Vec<Resource>> {
        let resources = self.resources.read().await;
        let items = resources
            .values()
            .filter(|r| &r.course_id == course_id)
            .cloned()
            .collect();
        Ok(newest_first(items, |r: &Resource| r.id))
    }

    async fn list_by_lesson(
        &self,
        course_id: &ObjectId,
        lesson_id: &ObjectId,
    ) -> AppResult<Vec<Resource>> {
        let resources = self.resources.read().await;
        let items = resources
            .values()
            .filter(|r| &r.course_id == course_id && r.lesson_id.as_ref() == Some(lesson_id))
            .cloned()
            .collect();
        Ok(newest_first(items, |r: &Resource| r.id))
    }

    async fn count_by_courses(
        &self,
        course_ids: &[ObjectId],
        visible_lessons: Option<&BTreeSet<ObjectId>>,
    ) -> AppResult<HashMap<ObjectId, u64>> {
        let resources = self.resources.read().await;
        Ok(count_per_course(
            course_ids,
            resources
                .values()
                .filter(|r| lesson_visible(r.lesson_id.as_ref(), visible_lessons))
                .map(|r| &r.course_id),
        ))
    }

    async fn update(&self, resource: Resource) -> AppResult<Resource> {
        let mut resources = self.resources.write().await;
        if !resources.contains_key(&resource.id) {
            return Err(AppError::not_found("resource"));
        }
        resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn delete(&self, id: &ObjectId) -> AppResult<()> {
        self.resources
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("resource"))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryQuizRepository {
    quizzes: Table<Quiz>,
}

impl InMemoryQuizRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.quizzes.write().await.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &ObjectId) -> AppResult<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(id).cloned())
    }

    async fn list_by_course(&self, course_id: &ObjectId) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        let items = quizzes
            .values()
            .filter(|q| &q.course_id == course_id)
            .cloned()
            .collect();
        Ok(newest_first(items, |q: &Quiz| q.id))
    }

    async fn list_by_lesson(
        &self,
        course_id: &ObjectId,
        lesson_id: &ObjectId,
    ) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        let items = quizzes
            .values()
            .filter(|q| &q.course_id == course_id && q.lesson_id.as_ref() == Some(lesson_id))
            .cloned()
            .collect();
        Ok(newest_first(items, |q: &Quiz| q.id))
    }

    async fn count_by_courses(
        &self,
        course_ids: &[ObjectId],
        visible_lessons: Option<&BTreeSet<ObjectId>>,
    ) -> AppResult<HashMap<ObjectId, u64>> {
        let quizzes = self.quizzes.read().await;
        Ok(count_per_course(
            course_ids,
            quizzes
                .values()
                .filter(|q| lesson_visible(q.lesson_id.as_ref(), visible_lessons))
                .map(|q| &q.course_id),
        ))
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut quizzes = self.quizzes.write().await;
        if !quizzes.contains_key(&quiz.id) {
            return Err(AppError::not_found("quiz"));
        }
        quizzes.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn delete(&self, id: &ObjectId) -> AppResult<()> {
        self.quizzes
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("quiz"))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryQuizSubmissionRepository {
    submissions: Table<QuizSubmission>,
}

impl InMemoryQuizSubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizSubmissionRepository for InMemoryQuizSubmissionRepository {
    async fn create(&self, submission: QuizSubmission) -> AppResult<QuizSubmission> {
        self.submissions
            .write()
            .await
            .insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn count_for_student(&self, quiz_id: &ObjectId, student_id: &ObjectId) -> AppResult<u64> {
        let submissions = self.submissions.read().await;
        Ok(submissions
            .values()
            .filter(|s| &s.quiz_id == quiz_id && &s.student_id == student_id)
            .count() as u64)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{domain::UserRole, dto::request::CreateLessonRequest};

    fn lesson(course_id: ObjectId, order: i32) -> Lesson {
        Lesson::from_request(
            course_id,
            CreateLessonRequest {
                order,
                title: format!("Lesson {}", order),
                duration: None,
                content: None,
                is_published: None,
            },
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(User::new("a@b.co", "", "hash".into(), UserRole::Student))
            .await
            .unwrap();

        let result = repo
            .create(User::new(" A@B.co ", "", "hash".into(), UserRole::Teacher))
            .await;
        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_lesson_order_unique_per_course() {
        let repo = InMemoryLessonRepository::new();
        let (course_a, course_b) = (ObjectId::new(), ObjectId::new());

        repo.create(lesson(course_a, 1)).await.unwrap();
        repo.create(lesson(course_b, 1)).await.unwrap();
        let result = repo.create(lesson(course_a, 1)).await;
        assert!(matches!(result, Err(AppError::AlreadyExists(_))));

        let mut second = repo.create(lesson(course_a, 2)).await.unwrap();
        second.order = 1;
        assert!(matches!(
            repo.update(second).await,
            Err(AppError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_lessons_sorted_by_order() {
        let repo = InMemoryLessonRepository::new();
        let course = ObjectId::new();
        for order in [3, 1, 2] {
            repo.create(lesson(course, order)).await.unwrap();
        }

        let orders: Vec<i32> = repo
            .list_by_course(&course, false)
            .await
            .unwrap()
            .iter()
            .map(|l| l.order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_upsert_returns_existing_record() {
        let repo = InMemoryEnrollmentRepository::new();
        let (course, student) = (ObjectId::new(), ObjectId::new());

        let first = repo.upsert(&course, &student).await.unwrap();
        let second = repo.upsert(&course, &student).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_count_per_course_only_counts_requested() {
        let repo = InMemoryEnrollmentRepository::new();
        let (a, b) = (ObjectId::new(), ObjectId::new());
        repo.upsert(&a, &ObjectId::new()).await.unwrap();
        repo.upsert(&a, &ObjectId::new()).await.unwrap();
        repo.upsert(&b, &ObjectId::new()).await.unwrap();

        let counts = repo.count_by_courses(&[a]).await.unwrap();
        assert_eq!(counts.get(&a), Some(&2));
        assert!(!counts.contains_key(&b));
    }
}
