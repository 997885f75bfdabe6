pub mod auth_service;
pub mod course_service;
pub mod enrollment_service;
pub mod lesson_service;
pub mod lookup;
pub mod quiz_service;
pub mod resource_service;

pub use auth_service::AuthService;
pub use course_service::CourseService;
pub use enrollment_service::EnrollmentService;
pub use lesson_service::LessonService;
pub use quiz_service::QuizService;
pub use resource_service::ResourceService;
