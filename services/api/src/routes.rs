//! API service routes

use auth::models::{LoginCredentials, NewUser, UpdateRole, UserQuery};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::ApiError,
    middleware::{Acting, resolve_identity},
    models::{
        ArtistUpdate, AttendeeUpdate, EventUpdate, NewArtist, NewAttendee, NewEvent, NewTour,
        NewVenue, RatingRequest, TourUpdate, VenueUpdate, from_payload,
    },
    state::AppState,
};

/// `?name=` filter shared by every search route
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

impl SearchQuery {
    fn term(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Body of a rating change
#[derive(Debug, Deserialize)]
pub struct RatingChange {
    pub rating: i64,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/users", get(list_users))
        .route("/users/search", get(search_users))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route("/users/:id/complete-profile", patch(complete_profile))
        .route("/users/:id/role", put(update_role))
        .route("/event-types", get(event_types))
        .route("/venues", get(list_venues).post(create_venue))
        .route("/venues/search", get(search_venues))
        .route(
            "/venues/:id",
            get(get_venue).put(update_venue).delete(delete_venue),
        )
        .route("/venues/:id/average-rating", get(average_rating))
        .route("/venues/:id/ratings", get(venue_ratings).post(rate_venue))
        .route(
            "/venues/:id/ratings/:attendee_id",
            put(update_rating).delete(delete_rating),
        )
        .route("/artists", get(list_artists).post(create_artist))
        .route("/artists/search", get(search_artists))
        .route(
            "/artists/:id",
            get(get_artist).put(update_artist).delete(delete_artist),
        )
        .route("/events", get(list_events).post(create_event))
        .route("/events/search", get(search_events))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route(
            "/events/:id/attendees/:attendee_id",
            post(add_attendee_to_event).delete(remove_attendee_from_event),
        )
        .route(
            "/events/:id/artists/:artist_id",
            post(add_artist_to_event).delete(remove_artist_from_event),
        )
        .route("/attendees", get(list_attendees).post(create_attendee))
        .route("/attendees/search", get(search_attendees))
        .route(
            "/attendees/:id",
            get(get_attendee).put(update_attendee).delete(delete_attendee),
        )
        .route("/attendees/:id/favorite-events", get(favorite_events))
        .route("/tours", get(list_tours).post(create_tour))
        .route("/tours/search", get(search_tours))
        .route(
            "/tours/:id",
            get(get_tour).put(update_tour).delete(delete_tour),
        )
        .route(
            "/tours/:id/events/:event_id",
            post(add_event_to_tour).delete(remove_event_from_tour),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_identity,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match common::database::health_check(&state.db_pool).await {
        Ok(true) => "ok",
        _ => "unavailable",
    };

    Json(json!({
        "status": "ok",
        "service": "events-api",
        "database": database
    }))
}

fn deleted(what: &str) -> Json<Value> {
    Json(json!({ "message": format!("{} deleted successfully", what) }))
}

// Identity

/// Register a user; an admin session may hand out the admin role
pub async fn register(
    acting: Option<Acting>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let new_user: NewUser = from_payload(payload)?;
    let acting = acting.map(|Acting(identity)| identity);
    let created = state.auth.register(&new_user, acting.as_ref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": auth::models::UserView::from(&created.user),
            "session": created.session,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials: LoginCredentials = from_payload(payload)?;
    let authenticated = state.auth.authenticate(&credentials).await?;

    Ok(Json(json!({
        "user": auth::models::UserView::from(&authenticated.user),
        "session": authenticated.session,
    })))
}

pub async fn logout(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.end_session(bearer.token()).await?;
    Ok(Json(json!({"message": "Logged out"})))
}

pub async fn list_users(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.list_users(&acting, &query).await?))
}

pub async fn search_users(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.search_users(&acting, query.term()).await?))
}

pub async fn get_user(
    Acting(_acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.get_user(id).await?))
}

pub async fn complete_profile(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.complete_profile(&acting, id).await?))
}

pub async fn update_role(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let change: UpdateRole = from_payload(payload)?;
    Ok(Json(state.auth.update_role(&acting, id, &change.role).await?))
}

pub async fn delete_user(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.delete_user(&acting, id).await?;
    Ok(deleted("User"))
}

// Venues

pub async fn list_venues(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.venues.list().await?))
}

pub async fn search_venues(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.venues.search(query.term()).await?))
}

pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.venues.get(id).await?))
}

pub async fn create_venue(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let venue: NewVenue = from_payload(payload)?;
    let created = state.venues.create(&acting, venue).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_venue(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let update: VenueUpdate = from_payload(payload)?;
    Ok(Json(state.venues.update(&acting, id, update).await?))
}

pub async fn delete_venue(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.venues.delete(&acting, id).await?;
    Ok(deleted("Venue"))
}

pub async fn average_rating(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let average = state.venues.average_rating(id).await?;
    Ok(Json(json!({ "venue_id": id, "average_rating": average })))
}

pub async fn venue_ratings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.associations.venue_ratings(id).await?))
}

pub async fn rate_venue(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let request: RatingRequest = from_payload(payload)?;
    Ok(Json(state.associations.rate_venue(&acting, id, &request).await?))
}

pub async fn update_rating(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path((id, attendee_id)): Path<(i64, i64)>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let change: RatingChange = from_payload(payload)?;
    let updated = state
        .associations
        .update_rating(&acting, id, attendee_id, change.rating)
        .await?;
    Ok(Json(updated))
}

pub async fn delete_rating(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path((id, attendee_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .associations
        .delete_rating(&acting, id, attendee_id)
        .await?;
    Ok(deleted("Rating"))
}

// Artists

pub async fn list_artists(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.artists.list().await?))
}

pub async fn search_artists(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.artists.search(query.term()).await?))
}

pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.artists.get(id).await?))
}

pub async fn create_artist(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let artist: NewArtist = from_payload(payload)?;
    let created = state.artists.create(&acting, artist).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_artist(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let update: ArtistUpdate = from_payload(payload)?;
    Ok(Json(state.artists.update(&acting, id, update).await?))
}

pub async fn delete_artist(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.artists.delete(&acting, id).await?;
    Ok(deleted("Artist"))
}

// Events

pub async fn event_types(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.events.event_types())
}

pub async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.events.list().await?))
}

pub async fn search_events(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.events.search(query.term()).await?))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.events.get(id).await?))
}

pub async fn create_event(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let event: NewEvent = from_payload(payload)?;
    let created = state.events.create(&acting, event).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_event(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let update: EventUpdate = from_payload(payload)?;
    Ok(Json(state.events.update(&acting, id, update).await?))
}

pub async fn delete_event(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.events.delete(&acting, id).await?;
    Ok(deleted("Event"))
}

pub async fn add_attendee_to_event(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path((id, attendee_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .associations
        .add_attendee_to_event(&acting, id, attendee_id)
        .await?;
    Ok(Json(state.events.get(id).await?))
}

pub async fn remove_attendee_from_event(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path((id, attendee_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .associations
        .remove_attendee_from_event(&acting, id, attendee_id)
        .await?;
    Ok(Json(state.events.get(id).await?))
}

pub async fn add_artist_to_event(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path((id, artist_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .associations
        .add_artist_to_event(&acting, id, artist_id)
        .await?;
    Ok(Json(state.events.get(id).await?))
}

pub async fn remove_artist_from_event(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path((id, artist_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .associations
        .remove_artist_from_event(&acting, id, artist_id)
        .await?;
    Ok(Json(state.events.get(id).await?))
}

// Attendees

pub async fn list_attendees(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.attendees.list().await?))
}

pub async fn search_attendees(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.attendees.search(query.term()).await?))
}

pub async fn get_attendee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.attendees.get(id).await?))
}

pub async fn create_attendee(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let attendee: NewAttendee = from_payload(payload)?;
    let created = state.attendees.create(&acting, attendee).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_attendee(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let update: AttendeeUpdate = from_payload(payload)?;
    Ok(Json(state.attendees.update(&acting, id, update).await?))
}

pub async fn delete_attendee(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.attendees.delete(&acting, id).await?;
    Ok(deleted("Attendee"))
}

pub async fn favorite_events(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.associations.favorite_events(id).await?))
}

// Tours

pub async fn list_tours(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.tours.list().await?))
}

pub async fn search_tours(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.tours.search(query.term()).await?))
}

pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.tours.get(id).await?))
}

pub async fn create_tour(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let tour: NewTour = from_payload(payload)?;
    let created = state.tours.create(&acting, tour).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_tour(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let update: TourUpdate = from_payload(payload)?;
    Ok(Json(state.tours.update(&acting, id, update).await?))
}

pub async fn delete_tour(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.tours.delete(&acting, id).await?;
    Ok(deleted("Tour"))
}

pub async fn add_event_to_tour(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path((id, event_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .associations
        .add_event_to_tour(&acting, id, event_id)
        .await?;
    Ok(Json(state.tours.get(id).await?))
}

pub async fn remove_event_from_tour(
    Acting(acting): Acting,
    State(state): State<AppState>,
    Path((id, event_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .associations
        .remove_event_from_tour(&acting, id, event_id)
        .await?;
    Ok(Json(state.tours.get(id).await?))
}
