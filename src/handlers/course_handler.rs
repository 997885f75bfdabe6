use actix_web::{get, patch, post, web, HttpResponse};
use serde_json::json;

use crate::{
    app_state::AppState,
    auth::{AuthenticatedUser, Caller},
    errors::AppError,
    models::dto::request::{CreateCourseRequest, UpdateCourseRequest},
};

#[get("/courses")]
async fn list_courses(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let courses = state.course_service.list(&caller).await?;
    Ok(HttpResponse::Ok().json(json!({ "courses": courses })))
}

#[post("/courses")]
async fn create_course(
    state: web::Data<AppState>,
    request: web::Json<CreateCourseRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let course = state
        .course_service
        .create(&caller, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "course": course })))
}

#[get("/courses/{course_id}")]
async fn get_course(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let detail = state.course_service.detail(&caller, &course_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[patch("/courses/{course_id}")]
async fn update_course(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    request: web::Json<UpdateCourseRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let course = state
        .course_service
        .update(&caller, &course_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "course": course })))
}

#[get("/courses/{course_id}/enrollments")]
async fn course_roster(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let enrollments = state.course_service.roster(&caller, &course_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "enrollments": enrollments })))
}

#[get("/teacher/overview")]
async fn teacher_overview(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let overview = state.course_service.overview(&caller).await?;
    Ok(HttpResponse::Ok().json(overview))
}
