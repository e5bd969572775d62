use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::db::Database;
use crate::error::{AppError, FieldErrors, Result};
use crate::models::{LoginRequest, RegisterRequest, SessionUser, User};
use crate::services::user_service::{UserService, EMAIL_TAKEN};

pub const UNKNOWN_EMAIL: &str = "Email does not exist.";
pub const BAD_CREDENTIALS: &str = "Email or password is incorrect.";

pub struct AuthService {
    db: Database,
}

impl AuthService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        Ok(argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?
            .to_string())
    }

    /// False for a wrong password and for an unparsable stored hash.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        let users = UserService::new(self.db.clone());

        let mut errors = FieldErrors::of(&req);
        if errors.get("email").is_none() && users.email_taken(&req.email, None).await? {
            errors.add("email", EMAIL_TAKEN);
        }
        errors.into_result()?;

        let hashed = Self::hash_password(&req.password)?;
        let user = users
            .insert(&req.email, &req.first_name, &req.middle_name, &req.last_name, &hashed)
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Checks the credentials and returns the user to put in the session.
    pub async fn login(&self, req: LoginRequest) -> Result<SessionUser> {
        FieldErrors::of(&req).into_result()?;

        let users = UserService::new(self.db.clone());
        let record = users
            .find_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::Validation(FieldErrors::single("email", UNKNOWN_EMAIL)))?;

        if !Self::verify_password(&req.password, &record.hashed_password) {
            tracing::info!(user_id = %record.id, "Login rejected: wrong password");
            return Err(AppError::Validation(FieldErrors::single("password", BAD_CREDENTIALS)));
        }

        users.session_user(record.id).await
    }
}
