use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::Header,
    web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures::future::LocalBoxFuture;
use mongodb::bson::oid::ObjectId;

use crate::{
    auth::{Claims, JwtService},
    errors::AppError,
    models::domain::UserRole,
};

/// Verifies the bearer token and stores its claims in the request extensions.
/// Every failure is reported as 401 before the handler runs.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let claims = match authenticate(&req) {
                Ok(claims) => claims,
                Err(err) => {
                    log::debug!("Rejected {} {}: {}", req.method(), req.path(), err);
                    let response = err.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };
            req.extensions_mut().insert(claims);

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Claims, AppError> {
    let jwt_service = req
        .app_data::<web::Data<JwtService>>()
        .ok_or_else(|| AppError::InternalError("JWT service not configured".to_string()))?;

    let bearer = Authorization::<Bearer>::parse(req)
        .map_err(|_| AppError::Unauthorized("Missing or malformed bearer token".to_string()))?
        .into_scheme();

    jwt_service.validate_token(bearer.token())
}

/// Extractor for the verified caller. Only usable behind [`AuthMiddleware`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    pub fn id(&self) -> Result<ObjectId, AppError> {
        self.0.subject_id()
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let claims = req
            .extensions()
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()));

        ready(claims.map(AuthenticatedUser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{get, http::StatusCode, test, App, HttpResponse};

    use crate::{config::Config, models::domain::User};

    #[get("/whoami")]
    async fn whoami(auth: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(auth.0.email)
    }

    fn jwt() -> JwtService {
        JwtService::new(&Config::test_config().jwt_secret, 1)
    }

    #[actix_web::test]
    async fn test_valid_token_reaches_handler() {
        let user = User::new("ada@example.com", "Ada", "hash".into(), UserRole::Teacher);
        let token = jwt().create_token(&user).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt()))
                .wrap(AuthMiddleware)
                .service(whoami),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, "ada@example.com");
    }

    #[actix_web::test]
    async fn test_missing_or_bad_token_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt()))
                .wrap(AuthMiddleware)
                .service(whoami),
        )
        .await;

        let cases = [
            None,
            Some("Bearer not-a-jwt"),
            Some("Basic YWRhOnNlY3JldA=="),
        ];

        for header in cases {
            let mut req = test::TestRequest::get().uri("/whoami");
            if let Some(header) = header {
                req = req.insert_header(("Authorization", header));
            }

            let resp = test::try_call_service(&app, req.to_request())
                .await
                .expect("rejection is a response, not a service error");
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{:?}", header);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["code"], "UNAUTHORIZED");
        }
    }
}
