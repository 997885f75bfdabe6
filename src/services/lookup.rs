//! Loading of path-addressed records, shared by the course-scoped services.

use mongodb::bson::oid::ObjectId;

use crate::{
    auth::gate,
    errors::{AppError, AppResult},
    models::domain::{Course, Lesson},
    repositories::{CourseRepository, LessonRepository},
};

/// A course id that does not parse cannot name a course: report it as absent.
pub fn parse_course_id(raw: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| AppError::not_found("course"))
}

/// Malformed nested ids are a client error rather than an absence.
pub fn parse_nested_id(raw: &str, entity: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| AppError::ValidationError(format!("Invalid {}Id", entity)))
}

pub async fn find_course(courses: &dyn CourseRepository, course_id: &str) -> AppResult<Course> {
    let id = parse_course_id(course_id)?;
    courses
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("course"))
}

/// Loads a lesson and checks it belongs to `course`.
pub async fn find_lesson_in(
    lessons: &dyn LessonRepository,
    course: &Course,
    lesson_id: &str,
) -> AppResult<Lesson> {
    let id = parse_nested_id(lesson_id, "lesson")?;
    let lesson = lessons
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("lesson"))?;
    gate::require_contained(&course.id, Some(&lesson.course_id), "lesson")?;
    Ok(lesson)
}

/// Resolves the optional lesson segment of a resource or quiz path.
pub async fn find_scope(
    lessons: &dyn LessonRepository,
    course: &Course,
    lesson_id: Option<&str>,
) -> AppResult<Option<Lesson>> {
    match lesson_id {
        Some(lesson_id) => Ok(Some(find_lesson_in(lessons, course, lesson_id).await?)),
        None => Ok(None),
    }
}

/// Checks a course-scoped item against the path it was addressed by. Through
/// a lesson path the item must also belong to that lesson.
pub fn require_in_scope(
    course: &Course,
    scope: Option<&Lesson>,
    item_course_id: &ObjectId,
    item_lesson_id: Option<&ObjectId>,
    entity: &'static str,
) -> AppResult<()> {
    gate::require_contained(&course.id, Some(item_course_id), entity)?;
    if let Some(lesson) = scope {
        gate::require_contained(&lesson.id, item_lesson_id, entity)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, ResponseError};

    #[test]
    fn test_malformed_course_id_is_not_found() {
        let err = parse_course_id("not-an-id").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_malformed_nested_id_is_bad_request() {
        let err = parse_nested_id("123", "lesson").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Validation error: Invalid lessonId");
    }

    #[test]
    fn test_valid_ids_parse() {
        let id = ObjectId::new();
        assert_eq!(parse_course_id(&id.to_hex()).unwrap(), id);
        assert_eq!(parse_nested_id(&id.to_hex(), "quiz").unwrap(), id);
    }
}
