pub mod claims;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::Claims;
pub use gate::Caller;
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser};
