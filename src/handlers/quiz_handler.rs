use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde_json::json;

use crate::{
    app_state::AppState,
    auth::{AuthenticatedUser, Caller},
    errors::AppError,
    models::dto::{
        request::{CreateQuizRequest, SubmitQuizRequest, UpdateQuizRequest},
        response::MessageResponse,
    },
};

#[get("/courses/{course_id}/quizzes")]
async fn list_quizzes(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let quizzes = state.quiz_service.list(&caller, &course_id, None).await?;
    Ok(HttpResponse::Ok().json(json!({ "quizzes": quizzes })))
}

#[post("/courses/{course_id}/quizzes")]
async fn create_quiz(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    request: web::Json<CreateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let quiz = state
        .quiz_service
        .create(&caller, &course_id, None, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "quiz": quiz })))
}

#[patch("/courses/{course_id}/quizzes/{quiz_id}")]
async fn update_quiz(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<UpdateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, quiz_id) = path.into_inner();
    let quiz = state
        .quiz_service
        .update(&caller, &course_id, None, &quiz_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "quiz": quiz })))
}

#[delete("/courses/{course_id}/quizzes/{quiz_id}")]
async fn delete_quiz(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, quiz_id) = path.into_inner();
    state
        .quiz_service
        .delete(&caller, &course_id, None, &quiz_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Quiz deleted")))
}

#[post("/courses/{course_id}/quizzes/{quiz_id}/submit")]
async fn submit_quiz(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<SubmitQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, quiz_id) = path.into_inner();
    let response = state
        .quiz_service
        .submit(&caller, &course_id, &quiz_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/courses/{course_id}/lessons/{lesson_id}/quizzes")]
async fn list_lesson_quizzes(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id) = path.into_inner();
    let quizzes = state
        .quiz_service
        .list(&caller, &course_id, Some(&lesson_id))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "quizzes": quizzes })))
}

#[post("/courses/{course_id}/lessons/{lesson_id}/quizzes")]
async fn create_lesson_quiz(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<CreateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id) = path.into_inner();
    let quiz = state
        .quiz_service
        .create(&caller, &course_id, Some(&lesson_id), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "quiz": quiz })))
}

#[patch("/courses/{course_id}/lessons/{lesson_id}/quizzes/{quiz_id}")]
async fn update_lesson_quiz(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
    request: web::Json<UpdateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id, quiz_id) = path.into_inner();
    let quiz = state
        .quiz_service
        .update(
            &caller,
            &course_id,
            Some(&lesson_id),
            &quiz_id,
            request.into_inner(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "quiz": quiz })))
}

#[delete("/courses/{course_id}/lessons/{lesson_id}/quizzes/{quiz_id}")]
async fn delete_lesson_quiz(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id, quiz_id) = path.into_inner();
    state
        .quiz_service
        .delete(&caller, &course_id, Some(&lesson_id), &quiz_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Quiz deleted")))
}
