//! Sessions and the account service behind them.
//!
//! A [`Session`] is an HS256 JWT plus the user it was issued for. It is never
//! stored globally; callers carry it in a [`Context`] and hand that to every
//! data operation.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use db::models::user;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use util::config;
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// Per-call context. Anonymous contexts can still read through providers
/// that do not need a login.
#[derive(Debug, Clone, Default)]
pub struct Context {
    session: Option<Session>,
}

impl Context {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The live session, or `NotAuthenticated` when there is none or it has
    /// expired.
    pub fn require_session(&self) -> Result<&Session, AppError> {
        match &self.session {
            Some(s) if !s.is_expired() => Ok(s),
            _ => Err(AppError::NotAuthenticated),
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUp {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 120, message = "Full name is too long"))]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

fn jwt_secret() -> Result<String, AppError> {
    let secret = config::jwt_secret();
    if secret.is_empty() {
        return Err(AppError::Token("JWT_SECRET is not configured".into()));
    }
    Ok(secret)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Validation(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Signs a session for `user` valid for `JWT_DURATION_MINUTES`.
pub fn issue_session(user: &user::Model) -> Result<Session, AppError> {
    let now = Utc::now();
    let expires_at = now + Duration::minutes(config::jwt_duration_minutes() as i64);
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret()?.as_bytes()),
    )?;

    Ok(Session {
        access_token: token,
        user: SessionUser {
            id: user.id.clone(),
            email: user.email.clone(),
        },
        expires_at,
    })
}

/// Rebuilds a session from a bearer token, rejecting bad signatures and
/// expired tokens.
pub fn verify_token(token: &str) -> Result<Session, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret()?.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| AppError::NotAuthenticated)?;

    let expires_at =
        DateTime::from_timestamp(data.claims.exp as i64, 0).ok_or(AppError::NotAuthenticated)?;

    Ok(Session {
        access_token: token.to_owned(),
        user: SessionUser {
            id: data.claims.sub,
            email: data.claims.email,
        },
        expires_at,
    })
}

/// Accounts backed by the `users` table.
#[derive(Clone)]
pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn sign_up(&self, req: SignUp) -> Result<Session, AppError> {
        req.validate()?;

        if user::Model::find_by_email(&self.db, &req.email).await?.is_some() {
            return Err(AppError::Conflict(format!("account {}", req.email)));
        }

        let hash = hash_password(&req.password)?;
        let created =
            user::Model::create(&self.db, &req.email, &hash, req.full_name.as_deref()).await?;
        tracing::info!(user_id = %created.id, "account created");
        issue_session(&created)
    }

    pub async fn sign_in_with_password(&self, creds: Credentials) -> Result<Session, AppError> {
        creds.validate()?;

        let found = user::Model::find_by_email(&self.db, &creds.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(&creds.password, &found.password_hash) {
            tracing::warn!(email = %found.email, "rejected sign-in");
            return Err(AppError::InvalidCredentials);
        }
        issue_session(&found)
    }

    /// Tokens are stateless, so signing out just drops the session.
    pub fn sign_out(&self, session: Session) -> Context {
        tracing::info!(user_id = %session.user.id, "signed out");
        Context::anonymous()
    }

    pub async fn get_user(&self, ctx: &Context) -> Result<user::Model, AppError> {
        let session = ctx.require_session()?;
        user::Entity::find_by_id(session.user.id.clone())
            .one(&self.db)
            .await?
            .ok_or(AppError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::setup_test_db;
    use util::test_helpers::setup_test_config;

    fn sign_up(email: &str) -> SignUp {
        SignUp {
            email: email.into(),
            password: "correct horse".into(),
            full_name: Some("Sipho Dlamini".into()),
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        setup_test_config();
        let auth = AuthService::new(setup_test_db().await);

        let session = auth.sign_up(sign_up("Tech@Shop.example")).await.unwrap();
        assert_eq!(session.user.email, "tech@shop.example");
        assert!(!session.is_expired());

        let again = auth
            .sign_in_with_password(Credentials {
                email: "tech@shop.example".into(),
                password: "correct horse".into(),
            })
            .await
            .unwrap();
        assert_eq!(again.user.id, session.user.id);

        let ctx = Context::with_session(again);
        let user = auth.get_user(&ctx).await.unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Sipho Dlamini"));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        setup_test_config();
        let auth = AuthService::new(setup_test_db().await);
        auth.sign_up(sign_up("a@b.example")).await.unwrap();

        let err = auth
            .sign_in_with_password(Credentials {
                email: "a@b.example".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_accounts_conflict() {
        setup_test_config();
        let auth = AuthService::new(setup_test_db().await);
        auth.sign_up(sign_up("dup@b.example")).await.unwrap();
        let err = auth.sign_up(sign_up("DUP@b.example")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn weak_sign_up_fails_validation() {
        setup_test_config();
        let auth = AuthService::new(setup_test_db().await);
        let err = auth
            .sign_up(SignUp {
                email: "not-an-email".into(),
                password: "short".into(),
                full_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn tokens_round_trip_and_sign_out_clears_context() {
        setup_test_config();
        let auth = AuthService::new(setup_test_db().await);
        let session = auth.sign_up(sign_up("t@b.example")).await.unwrap();

        let restored = verify_token(&session.access_token).unwrap();
        assert_eq!(restored.user, session.user);
        assert!(verify_token("garbage").is_err());

        let ctx = auth.sign_out(session);
        assert!(matches!(ctx.require_session(), Err(AppError::NotAuthenticated)));
    }

    #[test]
    fn expired_sessions_are_not_live() {
        let ctx = Context::with_session(Session {
            access_token: "t".into(),
            user: SessionUser {
                id: "u".into(),
                email: "u@x.example".into(),
            },
            expires_at: Utc::now() - Duration::minutes(1),
        });
        assert!(ctx.require_session().is_err());
        assert_eq!(ctx.bearer_token(), Some("t"));
    }
}
