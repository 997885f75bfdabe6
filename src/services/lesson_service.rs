use validator::Validate;

use crate::{
    auth::{gate, Caller},
    errors::AppResult,
    models::{
        domain::Lesson,
        dto::{
            request::{CreateLessonRequest, UpdateLessonRequest},
            response::LessonDto,
        },
    },
    repositories::Repositories,
    services::lookup,
};

/// Lesson authoring. Every operation re-checks course ownership. Existing
/// enrollments are never touched here.
pub struct LessonService {
    repos: Repositories,
}

impl LessonService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn create(
        &self,
        caller: &Caller,
        course_id: &str,
        request: CreateLessonRequest,
    ) -> AppResult<LessonDto> {
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_owner(caller, &course)?;
        request.validate()?;

        let lesson = self
            .repos
            .lessons
            .create(Lesson::from_request(course.id, request))
            .await?;
        Ok(lesson.into())
    }

    pub async fn update(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: &str,
        request: UpdateLessonRequest,
    ) -> AppResult<LessonDto> {
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_owner(caller, &course)?;
        let mut lesson = lookup::find_lesson_in(self.repos.lessons.as_ref(), &course, lesson_id).await?;
        request.validate()?;

        lesson.apply_patch(request);
        let lesson = self.repos.lessons.update(lesson).await?;
        Ok(lesson.into())
    }

    pub async fn delete(&self, caller: &Caller, course_id: &str, lesson_id: &str) -> AppResult<()> {
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_owner(caller, &course)?;
        let lesson = lookup::find_lesson_in(self.repos.lessons.as_ref(), &course, lesson_id).await?;

        self.repos.lessons.delete(&lesson.id).await?;
        log::info!("Deleted lesson {} from course {}", lesson.id, course.id);
        Ok(())
    }
}
