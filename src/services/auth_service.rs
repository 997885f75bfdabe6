use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use validator::Validate;

use crate::{
    auth::{password, JwtService},
    errors::{AppError, AppResult},
    models::{
        domain::User,
        dto::{
            request::{LoginRequest, RegisterRequest},
            response::{AuthResponse, UserDto},
        },
    },
    repositories::UserRepository,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: Arc<JwtService>) -> Self {
        Self { users, jwt }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let password_hash = password::hash_password(&request.password)?;
        let user = User::new(
            &request.email,
            request.name.as_deref().unwrap_or_default(),
            password_hash,
            request.role,
        );

        let user = self.users.create(user).await?;
        log::info!("Registered {} {}", user.role, user.id);

        self.issue(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !password::verify_password(&request.password, &user.password_hash) {
            log::debug!("Failed login for user {}", user.id);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.issue(user)
    }

    pub async fn me(&self, user_id: &ObjectId) -> AppResult<UserDto> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserDto::from)
            .ok_or_else(|| AppError::not_found("user"))
    }

    fn issue(&self, user: User) -> AppResult<AuthResponse> {
        let token = self.jwt.create_token(&user)?;
        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::domain::UserRole,
        repositories::user_repository::{MockUserRepository, EMAIL_TAKEN},
    };

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new(&Config::test_config().jwt_secret, 1))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "secret1".to_string(),
            role: UserRole::Student,
            name: Some("Sam".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_issues_token() {
        let mut users = MockUserRepository::new();
        users.expect_create().times(1).returning(|user| Ok(user));

        let jwt = jwt();
        let service = AuthService::new(Arc::new(users), Arc::clone(&jwt));
        let response = service.register(register_request("Sam@Example.com")).await.unwrap();

        assert_eq!(response.user.email, "sam@example.com");
        assert_eq!(response.user.role, UserRole::Student);
        let claims = jwt.validate_token(&response.token).unwrap();
        assert_eq!(claims.sub, response.user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let mut users = MockUserRepository::new();
        users
            .expect_create()
            .returning(|_| Err(AppError::AlreadyExists(EMAIL_TAKEN.to_string())));

        let service = AuthService::new(Arc::new(users), jwt());
        let result = service.register(register_request("sam@example.com")).await;

        assert!(matches!(result, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_register_validates_before_touching_store() {
        let mut users = MockUserRepository::new();
        users.expect_create().never();

        let service = AuthService::new(Arc::new(users), jwt());
        let mut request = register_request("sam@example.com");
        request.password = "abc".to_string();

        assert!(matches!(
            service.register(request).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let hash = password::hash_password("secret1").unwrap();
        let stored = User::new("sam@example.com", "Sam", hash, UserRole::Student);

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(stored.clone())));

        let service = AuthService::new(Arc::new(users), jwt());

        let ok = service
            .login(LoginRequest {
                email: "sam@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await;
        assert!(ok.is_ok());

        let wrong = service
            .login(LoginRequest {
                email: "sam@example.com".to_string(),
                password: "secret2".to_string(),
            })
            .await;
        match wrong {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, INVALID_CREDENTIALS),
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_unauthorized() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(users), jwt());
        let result = service
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await;

        match result {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, INVALID_CREDENTIALS),
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[tokio::test]
    async fn test_me_missing_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(users), jwt());
        assert!(matches!(
            service.me(&ObjectId::new()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
