use std::collections::BTreeSet;

use mongodb::bson::oid::ObjectId;
use validator::Validate;

use crate::{
    auth::{gate, Caller},
    config::StatusPolicy,
    errors::AppResult,
    models::{
        domain::Course,
        dto::{
            request::{CreateCourseRequest, UpdateCourseRequest},
            response::{
                CourseDetailDto, CourseDto, CourseStats, CourseSummaryDto, LessonDto, QuizDto,
                ResourceDto, RosterEntryDto, TeacherOverview, UserDto,
            },
        },
    },
    repositories::Repositories,
    services::{enrollment_service::enrollment_view, lookup},
};

/// True when a lesson-scoped item may be shown to a student: either it is
/// course-level or its lesson is published.
pub(crate) fn visible_to_student(lesson_id: Option<&ObjectId>, published: &BTreeSet<ObjectId>) -> bool {
    lesson_id.map_or(true, |id| published.contains(id))
}

pub struct CourseService {
    repos: Repositories,
    policy: StatusPolicy,
}

impl CourseService {
    pub fn new(repos: Repositories, policy: StatusPolicy) -> Self {
        Self { repos, policy }
    }

    /// Teachers see their own courses in any state; students see every
    /// published course. Each course carries its stats.
    pub async fn list(&self, caller: &Caller) -> AppResult<Vec<CourseSummaryDto>> {
        let courses = if caller.is_teacher() {
            self.repos.courses.list_by_teacher(&caller.id).await?
        } else {
            self.repos.courses.list_published().await?
        };

        let ids: Vec<ObjectId> = courses.iter().map(|c| c.id).collect();
        let lessons = self
            .repos
            .lessons
            .count_by_courses(&ids, caller.is_student())
            .await?;
        // students only count items their course detail would show
        let visible_lessons = if caller.is_student() {
            Some(self.repos.lessons.published_ids_in(&ids).await?)
        } else {
            None
        };
        let resources = self
            .repos
            .resources
            .count_by_courses(&ids, visible_lessons.as_ref())
            .await?;
        let quizzes = self
            .repos
            .quizzes
            .count_by_courses(&ids, visible_lessons.as_ref())
            .await?;
        let enrolled = self.repos.enrollments.count_by_courses(&ids).await?;

        Ok(courses
            .into_iter()
            .map(|course| {
                let stats = CourseStats {
                    lessons: lessons.get(&course.id).copied().unwrap_or(0),
                    resources: resources.get(&course.id).copied().unwrap_or(0),
                    quizzes: quizzes.get(&course.id).copied().unwrap_or(0),
                    enrolled: enrolled.get(&course.id).copied().unwrap_or(0),
                };
                CourseSummaryDto {
                    course: course.into(),
                    stats,
                }
            })
            .collect())
    }

    pub async fn detail(&self, caller: &Caller, course_id: &str) -> AppResult<CourseDetailDto> {
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_visible(caller, &course)?;

        let lessons = self
            .repos
            .lessons
            .list_by_course(&course.id, caller.is_student())
            .await?;
        let mut resources = self.repos.resources.list_by_course(&course.id).await?;
        let mut quizzes = self.repos.quizzes.list_by_course(&course.id).await?;

        let mut enrollment = None;
        if caller.is_student() {
            let published: BTreeSet<ObjectId> = lessons.iter().map(|l| l.id).collect();
            resources.retain(|r| visible_to_student(r.lesson_id.as_ref(), &published));
            quizzes.retain(|q| visible_to_student(q.lesson_id.as_ref(), &published));
            enrollment = self
                .repos
                .enrollments
                .find(&course.id, &caller.id)
                .await?
                .map(|e| enrollment_view(e, &published, self.policy));
        }

        let enrolled_count = self
            .repos
            .enrollments
            .count_by_courses(&[course.id])
            .await?
            .get(&course.id)
            .copied()
            .unwrap_or(0);

        Ok(CourseDetailDto {
            course: course.into(),
            lessons: lessons.into_iter().map(LessonDto::from).collect(),
            enrollment,
            resources: resources.into_iter().map(ResourceDto::from).collect(),
            quizzes: quizzes.into_iter().map(QuizDto::from).collect(),
            enrolled_count,
        })
    }

    pub async fn create(&self, caller: &Caller, request: CreateCourseRequest) -> AppResult<CourseDto> {
        gate::require_teacher(caller)?;
        request.validate()?;

        let course = self
            .repos
            .courses
            .create(Course::from_request(caller.id, request))
            .await?;
        log::info!("Teacher {} created course {}", caller.id, course.id);

        Ok(course.into())
    }

    pub async fn update(
        &self,
        caller: &Caller,
        course_id: &str,
        request: UpdateCourseRequest,
    ) -> AppResult<CourseDto> {
        let mut course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_owner(caller, &course)?;
        request.validate()?;

        course.apply_patch(request);
        let course = self.repos.courses.update(course).await?;
        Ok(course.into())
    }

    /// Enrollments of an owned course with the student behind each.
    pub async fn roster(&self, caller: &Caller, course_id: &str) -> AppResult<Vec<RosterEntryDto>> {
        let course = lookup::find_course(self.repos.courses.as_ref(), course_id).await?;
        gate::require_course_owner(caller, &course)?;

        let enrollments = self.repos.enrollments.list_by_course(&course.id).await?;
        let student_ids: Vec<ObjectId> = enrollments.iter().map(|e| e.student_id).collect();
        let students = self.repos.users.find_by_ids(&student_ids).await?;
        let published = self.repos.lessons.published_ids(&course.id).await?;

        Ok(enrollments
            .into_iter()
            .map(|enrollment| {
                let student = students
                    .iter()
                    .find(|s| s.id == enrollment.student_id)
                    .cloned()
                    .map(UserDto::from);
                RosterEntryDto {
                    enrollment: enrollment_view(enrollment, &published, self.policy),
                    student,
                }
            })
            .collect())
    }

    pub async fn overview(&self, caller: &Caller) -> AppResult<TeacherOverview> {
        gate::require_teacher(caller)?;

        let courses = self.repos.courses.list_by_teacher(&caller.id).await?;
        let ids: Vec<ObjectId> = courses.iter().map(|c| c.id).collect();
        let students = self.repos.enrollments.count_distinct_students(&ids).await?;

        Ok(TeacherOverview {
            courses: courses.len() as u64,
            students,
            active: courses.iter().filter(|c| c.is_published).count() as u64,
        })
    }
}
