//! Enrollment lifecycle: enroll, toggle lesson completion, list own enrollments.

use std::collections::BTreeSet;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::{
    auth::{gate, Caller},
    config::StatusPolicy,
    errors::{AppError, AppResult, Denial},
    models::{
        domain::{Enrollment, StatusChange},
        dto::response::{CourseDto, EnrollmentDto, StudentEnrollmentDto},
    },
    repositories::Repositories,
    services::lookup,
};

/// Builds the response view of an enrollment. Under [`StatusPolicy::OnRead`]
/// the status is recomputed against `published` without being persisted.
pub fn enrollment_view(
    enrollment: Enrollment,
    published: &BTreeSet<ObjectId>,
    policy: StatusPolicy,
) -> EnrollmentDto {
    let progress = enrollment.progress(published);
    let enrollment = match policy {
        StatusPolicy::OnWrite => enrollment,
        StatusPolicy::OnRead => enrollment.rederived(published),
    };
    EnrollmentDto::new(enrollment, progress)
}

pub struct EnrollmentService {
    repos: Repositories,
    policy: StatusPolicy,
}

impl EnrollmentService {
    pub fn new(repos: Repositories, policy: StatusPolicy) -> Self {
        Self { repos, policy }
    }

    /// Idempotent: a second call returns the existing record unchanged.
    pub async fn enroll(&self, caller: &Caller, course_id: &str) -> AppResult<EnrollmentDto> {
        gate::require_student(caller)?;
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_visible(caller, &course)?;

        let enrollment = self.repos.enrollments.upsert(&course.id, &caller.id).await?;
        log::info!("Student {} enrolled in course {}", caller.id, course.id);

        let published = self.repos.lessons.published_ids(&course.id).await?;
        Ok(enrollment_view(enrollment, &published, self.policy))
    }

    /// Marks a published lesson complete or incomplete and recomputes the
    /// enrollment status. Requires an existing enrollment.
    ///
    /// The completion set changes in one atomic write, so concurrent toggles
    /// on other lessons are never lost. The status write is skipped when a
    /// newer toggle has landed; that toggle saves its own status.
    pub async fn toggle_lesson(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: &str,
        completed: bool,
    ) -> AppResult<EnrollmentDto> {
        gate::require_student(caller)?;
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        let lesson = lookup::find_lesson_in(self.repos.lessons.as_ref(), &course, lesson_id).await?;
        gate::require_lesson_visible(caller, &lesson)?;

        let published = self.repos.lessons.published_ids(&course.id).await?;
        let now = Utc::now();
        let mut enrollment = self
            .repos
            .enrollments
            .mark_lesson(&course.id, &caller.id, &lesson.id, completed, now)
            .await?
            .ok_or(AppError::AccessDenied(Denial::NotEnrolled))?;

        let change = enrollment.refresh_status(&published, now);
        if !self.repos.enrollments.save_status(&enrollment).await? {
            log::debug!(
                "Enrollment {} changed again before its status was saved",
                enrollment.id
            );
        }

        match change {
            StatusChange::Completed => log::info!(
                "Enrollment {} completed course {}",
                enrollment.id,
                course.id
            ),
            StatusChange::Reopened => log::info!(
                "Enrollment {} reopened for course {}",
                enrollment.id,
                course.id
            ),
            StatusChange::Unchanged => {}
        }

        Ok(enrollment_view(enrollment, &published, self.policy))
    }

    /// The caller's enrollments with their courses, newest first. Courses that
    /// are no longer published are left out.
    pub async fn list_own(&self, caller: &Caller) -> AppResult<Vec<StudentEnrollmentDto>> {
        gate::require_student(caller)?;

        let enrollments = self.repos.enrollments.list_by_student(&caller.id).await?;
        let course_ids: Vec<ObjectId> = enrollments.iter().map(|e| e.course_id).collect();
        let courses = self.repos.courses.find_by_ids(&course_ids).await?;

        let mut entries = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let Some(course) = courses
                .iter()
                .find(|c| c.id == enrollment.course_id && c.is_published)
            else {
                continue;
            };
            let published = self.repos.lessons.published_ids(&course.id).await?;
            entries.push(StudentEnrollmentDto {
                course: CourseDto::from(course.clone()),
                enrollment: enrollment_view(enrollment, &published, self.policy),
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            domain::{Course, EnrollmentStatus, Lesson, UserRole},
            dto::request::{CreateCourseRequest, CreateLessonRequest},
        },
    };
    use actix_web::{http::StatusCode, ResponseError};

    struct Fixture {
        repos: Repositories,
        teacher: Caller,
        student: Caller,
        course: Course,
    }

    async fn fixture(is_published: bool) -> Fixture {
        let repos = Repositories::in_memory();
        let teacher = Caller::new(ObjectId::new(), UserRole::Teacher);
        let student = Caller::new(ObjectId::new(), UserRole::Student);
        let course = repos
            .courses
            .create(Course::from_request(
                teacher.id,
                CreateCourseRequest {
                    title: "Geometry".to_string(),
                    subtitle: None,
                    about: None,
                    category: None,
                    level: None,
                    is_published: Some(is_published),
                },
            ))
            .await
            .unwrap();
        Fixture {
            repos,
            teacher,
            student,
            course,
        }
    }

    async fn add_lesson(repos: &Repositories, course: &Course, order: i32, published: bool) -> Lesson {
        repos
            .lessons
            .create(Lesson::from_request(
                course.id,
                CreateLessonRequest {
                    order,
                    title: format!("Lesson {}", order),
                    duration: None,
                    content: None,
                    is_published: Some(published),
                },
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_enroll_is_idempotent() {
        let f = fixture(true).await;
        let service = EnrollmentService::new(f.repos.clone(), StatusPolicy::OnWrite);
        let course_id = f.course.id.to_hex();

        let first = service.enroll(&f.student, &course_id).await.unwrap();
        let second = service.enroll(&f.student, &course_id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.enrolled_at, second.enrolled_at);
        assert_eq!(first.status, EnrollmentStatus::Enrolled);
    }

    #[tokio::test]
    async fn test_concurrent_enrolls_converge() {
        let f = fixture(true).await;
        let service = std::sync::Arc::new(EnrollmentService::new(
            f.repos.clone(),
            StatusPolicy::OnWrite,
        ));
        let course_id = f.course.id.to_hex();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = std::sync::Arc::clone(&service);
                let course_id = course_id.clone();
                let student = f.student;
                tokio::spawn(async move { service.enroll(&student, &course_id).await })
            })
            .collect();

        let mut ids = BTreeSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap().id);
        }
        assert_eq!(ids.len(), 1);
        let stored = f.repos.enrollments.list_by_course(&f.course.id).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_enroll_rejects_teacher_and_unpublished_course() {
        let f = fixture(false).await;
        let service = EnrollmentService::new(f.repos.clone(), StatusPolicy::OnWrite);
        let course_id = f.course.id.to_hex();

        let as_teacher = service.enroll(&f.teacher, &course_id).await.unwrap_err();
        assert_eq!(as_teacher.status_code(), StatusCode::FORBIDDEN);

        let draft = service.enroll(&f.student, &course_id).await.unwrap_err();
        assert_eq!(draft.status_code(), StatusCode::NOT_FOUND);

        let missing = service.enroll(&f.student, "nope").await.unwrap_err();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_toggle_requires_enrollment() {
        let f = fixture(true).await;
        let lesson = add_lesson(&f.repos, &f.course, 1, true).await;
        let service = EnrollmentService::new(f.repos.clone(), StatusPolicy::OnWrite);

        let result = service
            .toggle_lesson(&f.student, &f.course.id.to_hex(), &lesson.id.to_hex(), true)
            .await;
        assert!(matches!(
            result,
            Err(AppError::AccessDenied(Denial::NotEnrolled))
        ));
        assert!(f
            .repos
            .enrollments
            .find(&f.course.id, &f.student.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_toggle_lifecycle_completes_and_reopens() {
        let f = fixture(true).await;
        let l1 = add_lesson(&f.repos, &f.course, 1, true).await;
        let l2 = add_lesson(&f.repos, &f.course, 2, true).await;
        let service = EnrollmentService::new(f.repos.clone(), StatusPolicy::OnWrite);
        let course_id = f.course.id.to_hex();

        service.enroll(&f.student, &course_id).await.unwrap();

        let view = service
            .toggle_lesson(&f.student, &course_id, &l1.id.to_hex(), true)
            .await
            .unwrap();
        assert_eq!(view.status, EnrollmentStatus::Enrolled);
        assert_eq!(view.progress.completed, 1);
        assert_eq!(view.progress.total, 2);

        let view = service
            .toggle_lesson(&f.student, &course_id, &l2.id.to_hex(), true)
            .await
            .unwrap();
        assert_eq!(view.status, EnrollmentStatus::Completed);
        assert!(view.completed_at.is_some());

        let view = service
            .toggle_lesson(&f.student, &course_id, &l1.id.to_hex(), false)
            .await
            .unwrap();
        assert_eq!(view.status, EnrollmentStatus::Enrolled);
        assert!(view.completed_at.is_none());
        assert_eq!(view.last_lesson_id, Some(l1.id.to_hex()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_keep_every_completion() {
        let f = fixture(true).await;
        let mut lessons = Vec::new();
        for order in 1..=6 {
            lessons.push(add_lesson(&f.repos, &f.course, order, true).await);
        }
        let service = std::sync::Arc::new(EnrollmentService::new(
            f.repos.clone(),
            StatusPolicy::OnWrite,
        ));
        let course_id = f.course.id.to_hex();
        service.enroll(&f.student, &course_id).await.unwrap();

        let handles: Vec<_> = lessons
            .iter()
            .map(|lesson| {
                let service = std::sync::Arc::clone(&service);
                let course_id = course_id.clone();
                let lesson_id = lesson.id.to_hex();
                let student = f.student;
                tokio::spawn(async move {
                    service
                        .toggle_lesson(&student, &course_id, &lesson_id, true)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = f
            .repos
            .enrollments
            .find(&f.course.id, &f.student.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.completed_lesson_ids.len(), 6);
        assert_eq!(stored.status, EnrollmentStatus::Completed);
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_toggle_unpublished_or_foreign_lesson_is_hidden() {
        let f = fixture(true).await;
        let hidden = add_lesson(&f.repos, &f.course, 1, false).await;
        let other = fixture(true).await;
        let foreign = add_lesson(&other.repos, &other.course, 1, true).await;
        let foreign = f.repos.lessons.create(foreign).await.unwrap();
        let service = EnrollmentService::new(f.repos.clone(), StatusPolicy::OnWrite);
        let course_id = f.course.id.to_hex();
        service.enroll(&f.student, &course_id).await.unwrap();

        let err = service
            .toggle_lesson(&f.student, &course_id, &hidden.id.to_hex(), true)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = service
            .toggle_lesson(&f.student, &course_id, &foreign.id.to_hex(), true)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = service
            .toggle_lesson(&f.student, &course_id, "bad-id", true)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lesson_edits_do_not_touch_stored_status() {
        let f = fixture(true).await;
        let l1 = add_lesson(&f.repos, &f.course, 1, true).await;
        let course_id = f.course.id.to_hex();
        let on_write = EnrollmentService::new(f.repos.clone(), StatusPolicy::OnWrite);
        let on_read = EnrollmentService::new(f.repos.clone(), StatusPolicy::OnRead);

        on_write.enroll(&f.student, &course_id).await.unwrap();
        on_write
            .toggle_lesson(&f.student, &course_id, &l1.id.to_hex(), true)
            .await
            .unwrap();

        // a new published lesson arrives after completion
        add_lesson(&f.repos, &f.course, 2, true).await;

        let stored = f
            .repos
            .enrollments
            .find(&f.course.id, &f.student.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, EnrollmentStatus::Completed);

        let lazy = on_write.list_own(&f.student).await.unwrap();
        assert_eq!(lazy[0].enrollment.status, EnrollmentStatus::Completed);
        assert_eq!(lazy[0].enrollment.progress.total, 2);

        let fresh = on_read.list_own(&f.student).await.unwrap();
        assert_eq!(fresh[0].enrollment.status, EnrollmentStatus::Enrolled);
        assert!(fresh[0].enrollment.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_list_own_hides_unpublished_courses() {
        let f = fixture(true).await;
        let service = EnrollmentService::new(f.repos.clone(), StatusPolicy::OnWrite);
        service
            .enroll(&f.student, &f.course.id.to_hex())
            .await
            .unwrap();

        let mut course = f.course.clone();
        course.is_published = false;
        f.repos.courses.update(course).await.unwrap();

        assert!(service.list_own(&f.student).await.unwrap().is_empty());
        assert!(service.list_own(&f.teacher).await.is_err());
    }
}
