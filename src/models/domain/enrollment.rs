//! Enrollment records and the completion state machine.
//!
//! A student's relationship to a course moves between `Enrolled` and
//! `Completed` only through a toggle: [`Enrollment::mark_lesson`] followed by
//! [`Enrollment::refresh_status`]. Status is a function of the completion set
//! and the course's published lessons at the moment of the toggle; editing
//! lessons never re-evaluates existing records.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    #[default]
    Enrolled,
    Completed,
}

/// Outcome of a toggle, as seen from the status field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged,
    Completed,
    Reopened,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Enrollment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub course_id: ObjectId,
    pub student_id: ObjectId,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub completed_lesson_ids: BTreeSet<ObjectId>,
    #[serde(default)]
    pub last_lesson_id: Option<ObjectId>,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by every membership change; guards status writes.
    #[serde(default)]
    pub revision: i64,
}

impl Enrollment {
    pub fn new(course_id: ObjectId, student_id: ObjectId) -> Self {
        let now = Utc::now();
        Enrollment {
            id: ObjectId::new(),
            course_id,
            student_id,
            status: EnrollmentStatus::Enrolled,
            completed_lesson_ids: BTreeSet::new(),
            last_lesson_id: None,
            enrolled_at: now,
            completed_at: None,
            updated_at: now,
            revision: 0,
        }
    }

    /// Marks `lesson_id` complete or incomplete. Membership is idempotent in
    /// both directions. Repositories apply the same change as one atomic write.
    pub fn mark_lesson(&mut self, lesson_id: ObjectId, completed: bool, now: DateTime<Utc>) {
        if completed {
            self.completed_lesson_ids.insert(lesson_id);
        } else {
            self.completed_lesson_ids.remove(&lesson_id);
        }
        self.last_lesson_id = Some(lesson_id);
        self.updated_at = now;
        self.revision += 1;
    }

    /// Recomputes `status` and `completed_at` against `published`, the
    /// course's currently published lesson ids. Runs after every toggle, so
    /// unmarking a lesson reopens a completed enrollment.
    pub fn refresh_status(
        &mut self,
        published: &BTreeSet<ObjectId>,
        now: DateTime<Utc>,
    ) -> StatusChange {
        let before = self.status;
        self.status = self.derive_status(published);

        match (before, self.status) {
            (EnrollmentStatus::Completed, EnrollmentStatus::Completed) => StatusChange::Unchanged,
            (_, EnrollmentStatus::Completed) => {
                self.completed_at = Some(now);
                StatusChange::Completed
            }
            (EnrollmentStatus::Completed, EnrollmentStatus::Enrolled) => {
                self.completed_at = None;
                StatusChange::Reopened
            }
            (EnrollmentStatus::Enrolled, EnrollmentStatus::Enrolled) => {
                self.completed_at = None;
                StatusChange::Unchanged
            }
        }
    }

    /// Completed lessons that are still published, over the published total.
    /// Ids of lessons that were since unpublished or deleted are ignored.
    pub fn progress(&self, published: &BTreeSet<ObjectId>) -> Progress {
        Progress {
            completed: self.completed_lesson_ids.intersection(published).count(),
            total: published.len(),
        }
    }

    /// The status this record would have if it were recomputed now.
    pub fn derive_status(&self, published: &BTreeSet<ObjectId>) -> EnrollmentStatus {
        let progress = self.progress(published);
        if progress.total > 0 && progress.completed >= progress.total {
            EnrollmentStatus::Completed
        } else {
            EnrollmentStatus::Enrolled
        }
    }

    /// Read-side view: status and completion timestamp as they would be after
    /// a recompute, without touching the stored record.
    pub fn rederived(&self, published: &BTreeSet<ObjectId>) -> Self {
        let mut view = self.clone();
        view.status = self.derive_status(published);
        match view.status {
            EnrollmentStatus::Completed => {
                view.completed_at = self.completed_at.or(Some(self.updated_at));
            }
            EnrollmentStatus::Enrolled => view.completed_at = None,
        }
        view
    }
}
