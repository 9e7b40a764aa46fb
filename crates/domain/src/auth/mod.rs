//! Authentication domain types

mod types;

pub use types::{
    AuthTokens, LoginRequest, MIN_PASSWORD_LENGTH, NewAccount, ProfileUpdate,
    ProfileUpdateResponse, RefreshResponse, SessionCredentials, SessionKey, SignupResponse,
    UserProfile, UserRole, is_valid_email, token_preview,
};
