use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde_json::json;

use crate::{
    app_state::AppState,
    auth::{AuthenticatedUser, Caller},
    errors::AppError,
    models::dto::{
        request::{CreateResourceRequest, UpdateResourceRequest},
        response::MessageResponse,
    },
};

#[get("/courses/{course_id}/resources")]
async fn list_resources(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let resources = state
        .resource_service
        .list(&caller, &course_id, None)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "resources": resources })))
}

#[post("/courses/{course_id}/resources")]
async fn create_resource(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    request: web::Json<CreateResourceRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let resource = state
        .resource_service
        .create(&caller, &course_id, None, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "resource": resource })))
}

#[patch("/courses/{course_id}/resources/{resource_id}")]
async fn update_resource(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<UpdateResourceRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, resource_id) = path.into_inner();
    let resource = state
        .resource_service
        .update(&caller, &course_id, None, &resource_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "resource": resource })))
}

#[delete("/courses/{course_id}/resources/{resource_id}")]
async fn delete_resource(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, resource_id) = path.into_inner();
    state
        .resource_service
        .delete(&caller, &course_id, None, &resource_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Resource deleted")))
}

#[get("/courses/{course_id}/lessons/{lesson_id}/resources")]
async fn list_lesson_resources(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id) = path.into_inner();
    let resources = state
        .resource_service
        .list(&caller, &course_id, Some(&lesson_id))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "resources": resources })))
}

#[post("/courses/{course_id}/lessons/{lesson_id}/resources")]
async fn create_lesson_resource(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<CreateResourceRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id) = path.into_inner();
    let resource = state
        .resource_service
        .create(&caller, &course_id, Some(&lesson_id), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "resource": resource })))
}

#[patch("/courses/{course_id}/lessons/{lesson_id}/resources/{resource_id}")]
async fn update_lesson_resource(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
    request: web::Json<UpdateResourceRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id, resource_id) = path.into_inner();
    let resource = state
        .resource_service
        .update(
            &caller,
            &course_id,
            Some(&lesson_id),
            &resource_id,
            request.into_inner(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "resource": resource })))
}

#[delete("/courses/{course_id}/lessons/{lesson_id}/resources/{resource_id}")]
async fn delete_lesson_resource(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let caller = Caller::try_from(&auth)?;
    let (course_id, lesson_id, resource_id) = path.into_inner();
    state
        .resource_service
        .delete(&caller, &course_id, Some(&lesson_id), &resource_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Resource deleted")))
}
