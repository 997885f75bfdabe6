use actix_web::web;

use crate::{auth::AuthMiddleware, errors::AppError};

pub mod auth_handler;
pub mod course_handler;
pub mod enrollment_handler;
pub mod health_handler;
pub mod lesson_handler;
pub mod quiz_handler;
pub mod resource_handler;

/// Registers every route. Expects `web::Data<AppState>` and `web::Data<JwtService>`
/// to be present as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid JSON body: {}", err)).into()
    }))
    .service(health_handler::health_check)
    .service(health_handler::health_check_live)
    .service(health_handler::health_check_ready)
    .service(
        web::scope("/api/auth")
            .service(auth_handler::register)
            .service(auth_handler::login),
    )
    .service(
        web::scope("/api")
            .wrap(AuthMiddleware)
            .service(auth_handler::me)
            .service(auth_handler::teacher_ping)
            .service(auth_handler::student_ping)
            .service(course_handler::list_courses)
            .service(course_handler::create_course)
            .service(course_handler::teacher_overview)
            .service(course_handler::get_course)
            .service(course_handler::update_course)
            .service(course_handler::course_roster)
            .service(lesson_handler::create_lesson)
            .service(lesson_handler::update_lesson)
            .service(lesson_handler::delete_lesson)
            .service(enrollment_handler::enroll)
            .service(enrollment_handler::toggle_lesson)
            .service(enrollment_handler::my_enrollments)
            .service(resource_handler::list_resources)
            .service(resource_handler::create_resource)
            .service(resource_handler::update_resource)
            .service(resource_handler::delete_resource)
            .service(resource_handler::list_lesson_resources)
            .service(resource_handler::create_lesson_resource)
            .service(resource_handler::update_lesson_resource)
            .service(resource_handler::delete_lesson_resource)
            .service(quiz_handler::list_quizzes)
            .service(quiz_handler::create_quiz)
            .service(quiz_handler::update_quiz)
            .service(quiz_handler::delete_quiz)
            .service(quiz_handler::submit_quiz)
            .service(quiz_handler::list_lesson_quizzes)
            .service(quiz_handler::create_lesson_quiz)
            .service(quiz_handler::update_lesson_quiz)
            .service(quiz_handler::delete_lesson_quiz),
    );
}
