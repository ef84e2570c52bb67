//! Identity store: registration, login, and user administration

use common::{ServiceError, ServiceResult};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::identity::Identity;
use crate::models::{LoginCredentials, NewUser, Role, SessionToken, User, UserPage, UserQuery, UserView};
use crate::policy::{ensure_admin, ensure_can_mutate};
use crate::repositories::user;
use crate::session::SessionManager;
use crate::validation::{validate_password, validate_username};

/// A freshly authenticated user and its session token
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub session: SessionToken,
}

/// Identity store service
#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    sessions: SessionManager,
}

impl AuthService {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        let sessions = SessionManager::new(pool.clone(), config.session_ttl());
        Self { pool, sessions }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Register a user and open a session for it
    ///
    /// Only an admin may hand out the admin role.
    pub async fn register(
        &self,
        new_user: &NewUser,
        acting: Option<&Identity>,
    ) -> ServiceResult<Authenticated> {
        let username = new_user.username.trim();
        validate_username(username)?;
        validate_password(&new_user.password)?;

        let role = match new_user.role.as_deref() {
            Some(raw) => raw.parse::<Role>()?,
            None => Role::default(),
        };

        if role == Role::Admin && !acting.is_some_and(Identity::is_admin) {
            warn!("Rejected admin registration for {}", username);
            return Err(ServiceError::validation(
                "Only an admin can create another admin",
            ));
        }

        let mut tx = self.pool.begin().await?;
        self.sessions.cleanup_expired_sessions(&mut tx).await?;

        if user::username_exists(&mut tx, username).await? {
            return Err(ServiceError::validation("Username already taken"));
        }

        let created = user::insert(&mut tx, username, &new_user.password, role).await?;
        let session = self.sessions.create_session(&mut tx, created.id).await?;

        tx.commit().await?;

        info!("Registered user {} with role {}", created.username, created.role);
        Ok(Authenticated {
            user: created,
            session,
        })
    }

    /// Verify credentials, stamp the login time, and open a session
    pub async fn authenticate(&self, credentials: &LoginCredentials) -> ServiceResult<Authenticated> {
        let mut tx = self.pool.begin().await?;
        self.sessions.cleanup_expired_sessions(&mut tx).await?;

        let Some(found) = user::find_by_username(&mut tx, credentials.username.trim()).await? else {
            warn!("Login attempt for unknown user {}", credentials.username);
            return Err(ServiceError::Authentication);
        };

        if !user::verify_password(&found, &credentials.password)? {
            warn!("Invalid password for user {}", found.username);
            return Err(ServiceError::Authentication);
        }

        user::touch_last_login(&mut tx, found.id).await?;
        let session = self.sessions.create_session(&mut tx, found.id).await?;
        let refreshed = user::find_by_id(&mut tx, found.id)
            .await?
            .ok_or(ServiceError::Authentication)?;

        tx.commit().await?;

        info!("User {} logged in", refreshed.username);
        Ok(Authenticated {
            user: refreshed,
            session,
        })
    }

    /// Drop the session behind `token`; idempotent
    pub async fn end_session(&self, token: &str) -> ServiceResult<()> {
        self.sessions.delete_session(token).await
    }

    /// Resolve a bearer token to its identity
    pub async fn resolve_session(&self, token: &str) -> ServiceResult<Option<Identity>> {
        self.sessions.resolve(token).await
    }

    pub async fn get_user(&self, id: i64) -> ServiceResult<UserView> {
        let mut conn = self.pool.acquire().await?;
        user::find_by_id(&mut conn, id)
            .await?
            .map(|u| UserView::from(&u))
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    /// Admin-only paginated user index
    pub async fn list_users(&self, acting: &Identity, query: &UserQuery) -> ServiceResult<UserPage> {
        ensure_admin(acting)?;

        let mut conn = self.pool.acquire().await?;
        let (users, total) = user::list(&mut conn, query).await?;

        Ok(UserPage {
            items: users.iter().map(UserView::from).collect(),
            page: query.page(),
            per_page: query.per_page(),
            total,
        })
    }

    /// Admin-only username search
    pub async fn search_users(&self, acting: &Identity, term: &str) -> ServiceResult<Vec<UserView>> {
        ensure_admin(acting)?;
        if term.trim().is_empty() {
            return Err(ServiceError::validation("Search term not provided"));
        }

        let mut conn = self.pool.acquire().await?;
        let users = user::search(&mut conn, term).await?;
        Ok(users.iter().map(UserView::from).collect())
    }

    /// Mark a profile as complete; allowed for the user itself or an admin
    pub async fn complete_profile(&self, acting: &Identity, user_id: i64) -> ServiceResult<UserView> {
        ensure_can_mutate(acting, Some(user_id), "profile")?;

        let mut tx = self.pool.begin().await?;
        if !user::mark_profile_completed(&mut tx, user_id).await? {
            return Err(ServiceError::not_found("User not found"));
        }
        let updated = user::find_by_id(&mut tx, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        tx.commit().await?;

        Ok(UserView::from(&updated))
    }

    /// Delete a user together with everything it owns
    pub async fn delete_user(&self, acting: &Identity, user_id: i64) -> ServiceResult<()> {
        ensure_admin(acting)?;
        if acting.id == user_id {
            return Err(ServiceError::forbidden("You cannot delete your own account"));
        }

        let mut tx = self.pool.begin().await?;
        if !user::delete(&mut tx, user_id).await? {
            return Err(ServiceError::not_found("User not found"));
        }
        tx.commit().await?;

        info!("User {} deleted by {}", user_id, acting.username);
        Ok(())
    }

    /// Change a user's role
    pub async fn update_role(
        &self,
        acting: &Identity,
        user_id: i64,
        new_role: &str,
    ) -> ServiceResult<UserView> {
        ensure_admin(acting)?;
        let role = new_role.parse::<Role>()?;

        let mut tx = self.pool.begin().await?;
        if !user::set_role(&mut tx, user_id, role).await? {
            return Err(ServiceError::not_found("User not found"));
        }
        let updated = user::find_by_id(&mut tx, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        tx.commit().await?;

        info!("User {} is now {}", updated.username, updated.role);
        Ok(UserView::from(&updated))
    }

    /// Make sure the bootstrap admin exists; an existing user keeps its password
    pub async fn ensure_admin(&self, username: &str, password: &str) -> ServiceResult<UserView> {
        validate_username(username)?;

        let mut tx = self.pool.begin().await?;
        let admin = match user::find_by_username(&mut tx, username).await? {
            Some(existing) if existing.role == Role::Admin => existing,
            Some(existing) => {
                user::set_role(&mut tx, existing.id, Role::Admin).await?;
                info!("Promoted {} to admin", existing.username);
                user::find_by_id(&mut tx, existing.id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("User not found"))?
            }
            None => {
                validate_password(password)?;
                info!("Creating bootstrap admin {}", username);
                user::insert(&mut tx, username, password, Role::Admin).await?
            }
        };
        tx.commit().await?;

        Ok(UserView::from(&admin))
    }
}
