use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::{
    app_state::AppState,
    auth::{AuthenticatedUser, Caller},
    errors::AppError,
    models::dto::request::ToggleLessonRequest,
};

#[post("/courses/{course_id}/enroll")]
async fn enroll(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let enrollment = state.enrollment_service.enroll(&caller, &course_id).await?;
    Ok(HttpResponse::Created().json(json!({ "enrollment": enrollment })))
}

#[post("/courses/{course_id}/progress/lessons/{lesson_id}")]
async fn toggle_lesson(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<ToggleLessonRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id) = path.into_inner();
    let enrollment = state
        .enrollment_service
        .toggle_lesson(&caller, &course_id, &lesson_id, request.completed)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "enrollment": enrollment })))
}

#[get("/student/enrollments")]
async fn my_enrollments(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let enrolled = state.enrollment_service.list_own(&caller).await?;
    Ok(HttpResponse::Ok().json(json!({ "enrolled": enrolled })))
}
