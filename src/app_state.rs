use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::Repositories,
    services::{
        AuthService, CourseService, EnrollmentService, LessonService, QuizService,
        ResourceService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub course_service: Arc<CourseService>,
    pub lesson_service: Arc<LessonService>,
    pub enrollment_service: Arc<EnrollmentService>,
    pub resource_service: Arc<ResourceService>,
    pub quiz_service: Arc<QuizService>,
    pub jwt_service: Arc<JwtService>,
    pub config: Arc<Config>,
    /// `None` when running on in-memory repositories.
    pub db: Option<Database>,
}

impl AppState {
    /// Connects to MongoDB once, ensures indexes and wires every service to
    /// the shared pool.
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let repositories = Repositories::mongo(&db);
        repositories.ensure_indexes().await?;

        let mut state = Self::with_repositories(config, repositories);
        state.db = Some(db);
        Ok(state)
    }

    pub fn with_repositories(config: Config, repositories: Repositories) -> Self {
        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
        ));
        let policy = config.status_policy;

        Self {
            auth_service: Arc::new(AuthService::new(
                Arc::clone(&repositories.users),
                Arc::clone(&jwt_service),
            )),
            course_service: Arc::new(CourseService::new(repositories.clone(), policy)),
            lesson_service: Arc::new(LessonService::new(repositories.clone())),
            enrollment_service: Arc::new(EnrollmentService::new(repositories.clone(), policy)),
            resource_service: Arc::new(ResourceService::new(repositories.clone())),
            quiz_service: Arc::new(QuizService::new(repositories)),
            jwt_service,
            config: Arc::new(config),
            db: None,
        }
    }

    /// MongoDB reachability. In-memory state is always ready.
    pub async fn health_check(&self) -> AppResult<()> {
        match &self.db {
            Some(db) => db.health_check().await,
            None => Ok(()),
        }
    }
}
