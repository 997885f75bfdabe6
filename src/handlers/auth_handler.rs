use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use crate::{
    app_state::AppState,
    auth::{gate, AuthenticatedUser, Caller},
    errors::AppError,
    models::{
        domain::UserRole,
        dto::request::{LoginRequest, RegisterRequest},
    },
};

#[post("/register")]
async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth_service.register(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[post("/login")]
async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth_service.login(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/me")]
async fn me(state: web::Data<AppState>, auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
    let user = state.auth_service.me(&auth.id()?).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Confirms the token carries `role` and echoes its claims.
fn role_ping(auth: &AuthenticatedUser, role: UserRole) -> Result<HttpResponse, AppError> {
    gate::require_role(&Caller::try_from(auth)?, role)?;
    Ok(HttpResponse::Ok().json(json!({
        "ok": true,
        "role": role,
        "user": auth.0,
    })))
}

#[get("/teacher/ping")]
async fn teacher_ping(auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
    role_ping(&auth, UserRole::Teacher)
}

#[get("/student/ping")]
async fn student_ping(auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
    role_ping(&auth, UserRole::Student)
}
