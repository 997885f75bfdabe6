use actix_web::{delete, patch, post, web, HttpResponse};
use serde_json::json;

use crate::{
    app_state::AppState,
    auth::{AuthenticatedUser, Caller},
    errors::AppError,
    models::dto::{
        request::{CreateLessonRequest, UpdateLessonRequest},
        response::MessageResponse,
    },
};

#[post("/courses/{course_id}/lessons")]
async fn create_lesson(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    request: web::Json<CreateLessonRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let lesson = state
        .lesson_service
        .create(&caller, &course_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "lesson": lesson })))
}

#[patch("/courses/{course_id}/lessons/{lesson_id}")]
async fn update_lesson(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<UpdateLessonRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id) = path.into_inner();
    let lesson = state
        .lesson_service
        .update(&caller, &course_id, &lesson_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "lesson": lesson })))
}

#[delete("/courses/{course_id}/lessons/{lesson_id}")]
async fn delete_lesson(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id) = path.into_inner();
    state
        .lesson_service
        .delete(&caller, &course_id, &lesson_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Lesson deleted")))
}
