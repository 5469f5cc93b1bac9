pub mod error;
pub mod jwt;
pub mod password;
pub mod service;

pub use error::{AuthError, Result};
pub use jwt::{Claims, JwtService, TokenType};
pub use password::{PasswordHasher, PasswordPolicy};
pub use service::{AuthResponse, AuthService, LoginRequest, RefreshTokenRequest, RegisterRequest};
