use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    Course, CourseLevel, Enrollment, EnrollmentStatus, Lesson, Progress, Quiz, QuizQuestion,
    Resource, ResourceKind, User, UserRole,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id.to_hex(),
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserDto,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDto {
    pub id: String,
    pub teacher_id: String,
    pub title: String,
    pub subtitle: String,
    pub about: String,
    pub category: String,
    pub level: CourseLevel,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        CourseDto {
            id: course.id.to_hex(),
            teacher_id: course.teacher_id.to_hex(),
            title: course.title,
            subtitle: course.subtitle,
            about: course.about,
            category: course.category,
            level: course.level,
            is_published: course.is_published,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CourseStats {
    pub lessons: u64,
    pub resources: u64,
    pub quizzes: u64,
    pub enrolled: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummaryDto {
    #[serde(flatten)]
    pub course: CourseDto,
    pub stats: CourseStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDto {
    pub id: String,
    pub course_id: String,
    pub order: i32,
    pub title: String,
    pub duration: String,
    pub content: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Lesson> for LessonDto {
    fn from(lesson: Lesson) -> Self {
        LessonDto {
            id: lesson.id.to_hex(),
            course_id: lesson.course_id.to_hex(),
            order: lesson.order,
            title: lesson.title,
            duration: lesson.duration,
            content: lesson.content,
            is_published: lesson.is_published,
            created_at: lesson.created_at,
            updated_at: lesson.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDto {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    pub status: EnrollmentStatus,
    pub completed_lesson_ids: Vec<String>,
    pub last_lesson_id: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub progress: Progress,
}

impl EnrollmentDto {
    pub fn new(enrollment: Enrollment, progress: Progress) -> Self {
        EnrollmentDto {
            id: enrollment.id.to_hex(),
            course_id: enrollment.course_id.to_hex(),
            student_id: enrollment.student_id.to_hex(),
            status: enrollment.status,
            completed_lesson_ids: enrollment
                .completed_lesson_ids
                .iter()
                .map(|id| id.to_hex())
                .collect(),
            last_lesson_id: enrollment.last_lesson_id.map(|id| id.to_hex()),
            enrolled_at: enrollment.enrolled_at,
            completed_at: enrollment.completed_at,
            updated_at: enrollment.updated_at,
            progress,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDto {
    pub id: String,
    pub course_id: String,
    pub lesson_id: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Resource> for ResourceDto {
    fn from(resource: Resource) -> Self {
        ResourceDto {
            id: resource.id.to_hex(),
            course_id: resource.course_id.to_hex(),
            lesson_id: resource.lesson_id.map(|id| id.to_hex()),
            title: resource.title,
            kind: resource.kind,
            url: resource.url,
            description: resource.description,
            created_at: resource.created_at,
            updated_at: resource.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestionDto {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

impl From<QuizQuestion> for QuizQuestionDto {
    fn from(question: QuizQuestion) -> Self {
        QuizQuestionDto {
            prompt: question.prompt,
            options: question.options,
            correct_option: question.correct_option,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDto {
    pub id: String,
    pub course_id: String,
    pub lesson_id: Option<String>,
    pub title: String,
    pub deadline: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub questions: Vec<QuizQuestionDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Quiz> for QuizDto {
    fn from(quiz: Quiz) -> Self {
        QuizDto {
            id: quiz.id.to_hex(),
            course_id: quiz.course_id.to_hex(),
            lesson_id: quiz.lesson_id.map(|id| id.to_hex()),
            title: quiz.title,
            deadline: quiz.deadline,
            duration_minutes: quiz.duration_minutes,
            questions: quiz.questions.into_iter().map(QuizQuestionDto::from).collect(),
            created_at: quiz.created_at,
            updated_at: quiz.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailDto {
    pub course: CourseDto,
    pub lessons: Vec<LessonDto>,
    pub enrollment: Option<EnrollmentDto>,
    pub resources: Vec<ResourceDto>,
    pub quizzes: Vec<QuizDto>,
    pub enrolled_count: u64,
}

/// One row of a course roster: the enrollment and the student behind it.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntryDto {
    pub enrollment: EnrollmentDto,
    pub student: Option<UserDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentEnrollmentDto {
    pub course: CourseDto,
    pub enrollment: EnrollmentDto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeacherOverview {
    pub courses: u64,
    pub students: u64,
    pub active: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
