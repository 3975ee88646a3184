use crate::models::errors::AppError;
use crate::models::user::{normalize_email, LoginRequest, RegisterRequest, User, UserProfile};
use crate::services::document_store::Collection;
use crate::services::token_service::{Claims, TokenService};

/// A freshly issued access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub user_id: String,
}

/// Registration, login and token checks for the user collection
pub struct AuthService {
    users: Collection<User>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Collection<User>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    /// Creates a user, or fails with a conflict if the email is taken.
    ///
    /// An existing account is never modified here. Uniqueness is a
    /// lookup-before-insert, so two concurrent registrations can still race.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, AppError> {
        let registration = request.validate().map_err(AppError::validation_failed)?;

        if self.find_by_email(&registration.email).await.is_some() {
            tracing::info!("Rejected duplicate registration");
            return Err(AppError::conflict("User is already registered"));
        }

        let password_hash = hash_password(registration.password, self.bcrypt_cost).await?;
        let user = User::new(registration.name, registration.email, password_hash);
        let user = self.users.insert(user).await?;

        tracing::info!("Registered user {}", user.id);
        Ok(user.profile())
    }

    /// Checks credentials and issues an access token
    pub async fn login(&self, request: LoginRequest) -> Result<IssuedToken, AppError> {
        let (email, password) = match (request.email, request.password) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                (email, password)
            }
            _ => {
                return Err(AppError::validation_failed(
                    "Both email and password are required",
                ))
            }
        };

        let user = self
            .find_by_email(&email)
            .await
            .ok_or_else(|| AppError::unauthorized("Email or password is incorrect"))?;

        if !verify_password(password, user.password_hash.clone()).await? {
            tracing::debug!("Password mismatch for user {}", user.id);
            return Err(AppError::unauthorized("Email or password is incorrect"));
        }

        let token = self.tokens.generate_token(&user.id)?;
        tracing::info!("User {} logged in", user.id);

        Ok(IssuedToken {
            token,
            user_id: user.id,
        })
    }

    /// Decodes a token without checking that its user still exists
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.verify_token(token)
    }

    /// Resolves a token to a live user
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.verify_token(token)?;

        self.users.find_by_id(&claims.user_id).await.ok_or_else(|| {
            AppError::unauthorized("The user belonging to this token no longer exists")
        })
    }

    pub fn token_lifetime_seconds(&self) -> i64 {
        self.tokens.expiry().num_seconds()
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        let email = normalize_email(email);
        self.users.find_one(|user| user.email == email).await
    }
}

// bcrypt is deliberately slow; keep it off the async workers
async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal_error(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::internal_error(format!("Password hashing failed: {}", e)))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::internal_error(format!("Password check task failed: {}", e)))?
        .map_err(|e| AppError::internal_error(format!("Password check failed: {}", e)))
}
