pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod quiz;
pub mod quiz_submission;
pub mod resource;
pub mod user;
pub use course::{Course, CourseLevel};
pub use enrollment::{Enrollment, EnrollmentStatus, Progress, StatusChange};
pub use lesson::Lesson;
pub use quiz::{Quiz, QuizQuestion};
pub use quiz_submission::QuizSubmission;
pub use resource::{Resource, ResourceKind};
pub use user::{User, UserRole};
