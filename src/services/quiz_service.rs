use validator::Validate;

use crate::{
    auth::{gate, Caller},
    errors::{AppError, AppResult, Denial},
    models::{
        domain::{Course, Lesson, Quiz, QuizSubmission},
        dto::{
            request::{CreateQuizRequest, SubmitQuizRequest, UpdateQuizRequest},
            response::{MessageResponse, QuizDto},
        },
    },
    repositories::Repositories,
    services::{course_service::visible_to_student, lookup},
};

/// Quiz authoring, listing and submission. Submissions are recorded as
/// reported by the client and never graded here.
pub struct QuizService {
    repos: Repositories,
}

impl QuizService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
    ) -> AppResult<Vec<QuizDto>> {
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_visible(caller, &course)?;

        let quizzes = match lookup::find_scope(self.repos.lessons.as_ref(), &course, lesson_id).await? {
            Some(lesson) => {
                gate::require_lesson_visible(caller, &lesson)?;
                self.repos.quizzes.list_by_lesson(&course.id, &lesson.id).await?
            }
            None => {
                let mut quizzes = self.repos.quizzes.list_by_course(&course.id).await?;
                if caller.is_student() {
                    let published = self.repos.lessons.published_ids(&course.id).await?;
                    quizzes.retain(|q| visible_to_student(q.lesson_id.as_ref(), &published));
                }
                quizzes
            }
        };

        Ok(quizzes.into_iter().map(QuizDto::from).collect())
    }

    pub async fn create(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
        request: CreateQuizRequest,
    ) -> AppResult<QuizDto> {
        let (course, scope) = self.owned_scope(caller, course_id, lesson_id).await?;
        request.validate()?;

        let quiz = Quiz::from_request(course.id, scope.map(|l| l.id), request);
        let quiz = self.repos.quizzes.create(quiz).await?;
        Ok(quiz.into())
    }

    pub async fn update(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
        quiz_id: &str,
        request: UpdateQuizRequest,
    ) -> AppResult<QuizDto> {
        let (course, scope) = self.owned_scope(caller, course_id, lesson_id).await?;
        let mut quiz = self.find_in_scope(&course, scope.as_ref(), quiz_id).await?;
        request.validate()?;

        quiz.apply_patch(request);
        let quiz = self.repos.quizzes.update(quiz).await?;
        Ok(quiz.into())
    }

    pub async fn delete(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
        quiz_id: &str,
    ) -> AppResult<()> {
        let (course, scope) = self.owned_scope(caller, course_id, lesson_id).await?;
        let quiz = self.find_in_scope(&course, scope.as_ref(), quiz_id).await?;

        self.repos.quizzes.delete(&quiz.id).await
    }

    /// Records a student's attempt. The caller must be enrolled and the quiz
    /// must be reachable: course published, and its lesson too when it has one.
    pub async fn submit(
        &self,
        caller: &Caller,
        course_id: &str,
        quiz_id: &str,
        request: SubmitQuizRequest,
    ) -> AppResult<MessageResponse> {
        gate::require_student(caller)?;
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_visible(caller, &course)?;
        let quiz = self.find_in_scope(&course, None, quiz_id).await?;

        if let Some(lesson_id) = quiz.lesson_id {
            let visible = match self.repos.lessons.find_by_id(&lesson_id).await? {
                Some(lesson) => lesson.is_published,
                None => false,
            };
            if !visible {
                return Err(AppError::AccessDenied(Denial::Unpublished { entity: "quiz" }));
            }
        }

        self.repos
            .enrollments
            .find(&course.id, &caller.id)
            .await?
            .ok_or(AppError::AccessDenied(Denial::NotEnrolled))?;
        request.validate()?;

        let previous = self
            .repos
            .submissions
            .count_for_student(&quiz.id, &caller.id)
            .await?;
        let submission = QuizSubmission::new(
            quiz.id,
            course.id,
            caller.id,
            request.score,
            request.answers,
        );
        self.repos.submissions.create(submission).await?;
        log::info!(
            "Student {} submitted quiz {} (attempt {})",
            caller.id,
            quiz.id,
            previous + 1
        );

        Ok(MessageResponse::new("Submission received"))
    }

    async fn owned_scope(
        &self,
        caller: &Caller,
        course_id: &str,
        lesson_id: Option<&str>,
    ) -> AppResult<(Course, Option<Lesson>)> {
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_owner(caller, &course)?;
        let scope = lookup::find_scope(self.repos.lessons.as_ref(), &course, lesson_id).await?;
        Ok((course, scope))
    }

    async fn find_in_scope(
        &self,
        course: &Course,
        scope: Option<&Lesson>,
        quiz_id: &str,
    ) -> AppResult<Quiz> {
        let id = lookup::parse_nested_id(quiz_id, "quiz")?;
        let quiz = self
            .repos
            .quizzes
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("quiz"))?;
        lookup::require_in_scope(course, scope, &quiz.course_id, quiz.lesson_id.as_ref(), "quiz")?;
        Ok(quiz)
    }
}
