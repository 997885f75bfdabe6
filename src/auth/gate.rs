//! Authorization decisions. Every function here is pure: it looks at the
//! caller and already-loaded records and either allows or returns the
//! [`Denial`] that applies. Loading the records is the caller's job.

use mongodb::bson::oid::ObjectId;

use crate::{
    auth::AuthenticatedUser,
    errors::{AppError, AppResult, Denial},
    models::domain::{Course, Lesson, UserRole},
};

/// A verified caller: who they are and what role their token carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: ObjectId,
    pub role: UserRole,
}

impl Caller {
    pub fn new(id: ObjectId, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_teacher(&self) -> bool {
        self.role == UserRole::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }
}

impl TryFrom<&AuthenticatedUser> for Caller {
    type Error = AppError;

    fn try_from(auth: &AuthenticatedUser) -> Result<Self, Self::Error> {
        Ok(Caller::new(auth.id()?, auth.role()))
    }
}

fn deny(denial: Denial) -> AppError {
    AppError::AccessDenied(denial)
}

pub fn require_role(caller: &Caller, required: UserRole) -> AppResult<()> {
    if caller.role != required {
        return Err(deny(Denial::Role { required }));
    }
    Ok(())
}

pub fn require_teacher(caller: &Caller) -> AppResult<()> {
    require_role(caller, UserRole::Teacher)
}

pub fn require_student(caller: &Caller) -> AppResult<()> {
    require_role(caller, UserRole::Student)
}

/// Teacher-only, and the teacher must own the course. Checked on every call.
pub fn require_course_owner(caller: &Caller, course: &Course) -> AppResult<()> {
    require_teacher(caller)?;
    if !course.is_owned_by(&caller.id) {
        return Err(deny(Denial::Ownership { entity: "course" }));
    }
    Ok(())
}

/// Read access to a course: its owner always, students once it is published.
pub fn require_course_visible(caller: &Caller, course: &Course) -> AppResult<()> {
    match caller.role {
        UserRole::Teacher => require_course_owner(caller, course),
        UserRole::Student if course.is_published => Ok(()),
        UserRole::Student => Err(deny(Denial::Unpublished { entity: "course" })),
    }
}

/// Lesson-scoped reads additionally need the lesson published for students.
/// Course visibility must already have been checked.
pub fn require_lesson_visible(caller: &Caller, lesson: &Lesson) -> AppResult<()> {
    if caller.is_student() && !lesson.is_published {
        return Err(deny(Denial::Unpublished { entity: "lesson" }));
    }
    Ok(())
}

/// A nested entity found by id must belong to the parent in the path.
pub fn require_contained(
    parent_id: &ObjectId,
    actual_parent_id: Option<&ObjectId>,
    entity: &'static str,
) -> AppResult<()> {
    if actual_parent_id != Some(parent_id) {
        return Err(deny(Denial::Containment { entity }));
    }
    Ok(())
}
