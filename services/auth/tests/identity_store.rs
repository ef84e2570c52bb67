//! Integration tests for the identity store against an in-memory database

use auth::models::{LoginCredentials, NewUser, UserQuery};
use auth::{AuthConfig, AuthService, Identity, Role};
use common::ServiceError;
use common::database::{DatabaseConfig, connect};
use sqlx::SqlitePool;

const PASSWORD: &str = "Str0ng!Pass";

async fn setup() -> (SqlitePool, AuthService) {
    let pool = connect(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory database");
    let service = AuthService::new(pool.clone(), &AuthConfig::default());
    (pool, service)
}

fn new_user(username: &str, password: &str, role: Option<&str>) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: password.to_string(),
        role: role.map(str::to_string),
    }
}

async fn admin(service: &AuthService) -> Identity {
    let view = service.ensure_admin("root", PASSWORD).await.unwrap();
    Identity::new(view.id, view.username, view.role)
}

#[tokio::test]
async fn weak_password_is_rejected() {
    let (pool, service) = setup().await;

    let err = service
        .register(&new_user("sam", "weak", None), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn register_creates_user_and_session() {
    let (_pool, service) = setup().await;

    let registered = service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();
    assert_eq!(registered.user.role, Role::Attendee);
    assert!(!registered.user.profile_completed);
    assert_ne!(registered.user.password_hash, PASSWORD);

    let identity = service
        .resolve_session(&registered.session.token)
        .await
        .unwrap()
        .expect("session resolves");
    assert_eq!(identity.id, registered.user.id);
    assert_eq!(identity.username, "sam");
}

#[tokio::test]
async fn duplicate_username_is_a_validation_error() {
    let (_pool, service) = setup().await;

    service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();
    let err = service
        .register(&new_user("sam", PASSWORD, Some("artist")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("taken")));
}

#[tokio::test]
async fn only_admin_can_register_admin() {
    let (_pool, service) = setup().await;

    let err = service
        .register(&new_user("eve", PASSWORD, Some("admin")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let attendee = service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();
    let err = service
        .register(
            &new_user("eve", PASSWORD, Some("admin")),
            Some(&Identity::from(&attendee.user)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let root = admin(&service).await;
    let created = service
        .register(&new_user("second_admin", PASSWORD, Some("admin")), Some(&root))
        .await
        .unwrap();
    assert_eq!(created.user.role, Role::Admin);
}

#[tokio::test]
async fn unknown_role_is_rejected() {
    let (_pool, service) = setup().await;
    let err = service
        .register(&new_user("sam", PASSWORD, Some("wizard")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn authenticate_updates_last_login() {
    let (_pool, service) = setup().await;
    let registered = service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();
    assert!(registered.user.last_login.is_none());

    let logged_in = service
        .authenticate(&LoginCredentials {
            username: "sam".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();
    assert!(logged_in.user.last_login.is_some());
    assert_ne!(logged_in.session.token, registered.session.token);
}

#[tokio::test]
async fn bad_credentials_fail_authentication() {
    let (_pool, service) = setup().await;
    service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();

    let wrong_password = service
        .authenticate(&LoginCredentials {
            username: "sam".into(),
            password: "Wr0ng!Pass".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(wrong_password, ServiceError::Authentication));

    let unknown = service
        .authenticate(&LoginCredentials {
            username: "nobody".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(unknown, ServiceError::Authentication));
}

#[tokio::test]
async fn end_session_is_idempotent() {
    let (_pool, service) = setup().await;
    let registered = service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();
    let token = registered.session.token;

    service.end_session(&token).await.unwrap();
    service.end_session(&token).await.unwrap();
    assert!(service.resolve_session(&token).await.unwrap().is_none());
}

async fn session_rows(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn opening_a_session_reaps_expired_ones() {
    let (pool, service) = setup().await;
    service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();
    let credentials = LoginCredentials {
        username: "sam".to_string(),
        password: PASSWORD.to_string(),
    };
    for _ in 0..3 {
        service.authenticate(&credentials).await.unwrap();
    }
    assert_eq!(session_rows(&pool).await, 4);

    sqlx::query("UPDATE sessions SET expires_at = '2000-01-01T00:00:00+00:00'")
        .execute(&pool)
        .await
        .unwrap();

    let fresh = service.authenticate(&credentials).await.unwrap();
    assert_eq!(session_rows(&pool).await, 1);
    assert!(
        service
            .resolve_session(&fresh.session.token)
            .await
            .unwrap()
            .is_some()
    );

    sqlx::query("UPDATE sessions SET expires_at = '2000-01-01T00:00:00+00:00'")
        .execute(&pool)
        .await
        .unwrap();
    service
        .register(&new_user("ella", PASSWORD, None), None)
        .await
        .unwrap();
    assert_eq!(session_rows(&pool).await, 1);
}

#[tokio::test]
async fn expired_sessions_do_not_resolve() {
    let (pool, _) = setup().await;
    let service = AuthService::new(
        pool.clone(),
        &AuthConfig {
            session_ttl_seconds: 1,
        },
    );
    let registered = service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();

    sqlx::query("UPDATE sessions SET expires_at = '2000-01-01T00:00:00+00:00'")
        .execute(&pool)
        .await
        .unwrap();

    assert!(
        service
            .resolve_session(&registered.session.token)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn user_listing_is_admin_gated_and_paginated() {
    let (_pool, service) = setup().await;
    let root = admin(&service).await;

    for name in ["artist_one", "artist_two", "venue_one"] {
        let role = if name.starts_with("artist") { "artist" } else { "venue" };
        service
            .register(&new_user(name, PASSWORD, Some(role)), None)
            .await
            .unwrap();
    }

    let page = service
        .list_users(
            &root,
            &UserQuery {
                page: Some(1),
                per_page: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 4);

    let artists = service
        .list_users(
            &root,
            &UserQuery {
                role: Some("artist".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(artists.total, 2);
    assert!(artists.items.iter().all(|u| u.role == Role::Artist));

    let outsider = Identity::new(artists.items[0].id, "artist_one", Role::Artist);
    let err = service
        .list_users(&outsider, &UserQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Authorization(_)));

    let found = service.search_users(&root, "ARTIST").await.unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn complete_profile_is_self_or_admin() {
    let (_pool, service) = setup().await;
    let sam = service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();
    let lee = service
        .register(&new_user("lee", PASSWORD, None), None)
        .await
        .unwrap();

    let err = service
        .complete_profile(&Identity::from(&lee.user), sam.user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Authorization(_)));

    let view = service
        .complete_profile(&Identity::from(&sam.user), sam.user.id)
        .await
        .unwrap();
    assert!(view.profile_completed);
}

#[tokio::test]
async fn update_role_validates_label() {
    let (_pool, service) = setup().await;
    let root = admin(&service).await;
    let sam = service
        .register(&new_user("sam", PASSWORD, None), None)
        .await
        .unwrap();

    let err = service
        .update_role(&root, sam.user.id, "owner")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let view = service.update_role(&root, sam.user.id, "venue").await.unwrap();
    assert_eq!(view.role, Role::Venue);
}

#[tokio::test]
async fn delete_user_cascades_owned_resources() {
    let (pool, service) = setup().await;
    let root = admin(&service).await;
    let owner = service
        .register(&new_user("owner", PASSWORD, Some("venue")), None)
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO venues (name, organizer, email, earnings, creator_id) VALUES ('Loft', 'Jane', 'j@x.com', '1000', ?)",
    )
    .bind(owner.user.id)
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO artists (name, creator_id) VALUES ('Band', ?)")
        .bind(owner.user.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = service.delete_user(&root, root.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Authorization(_)));

    service.delete_user(&root, owner.user.id).await.unwrap();

    let venues: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM venues")
        .fetch_one(&pool)
        .await
        .unwrap();
    let artists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
        .fetch_one(&pool)
        .await
        .unwrap();
    let sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
        .bind(owner.user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((venues, artists, sessions), (0, 0, 0));

    let err = service.get_user(owner.user.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
