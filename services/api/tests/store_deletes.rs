//! Deleting entities through the stores and what goes with them

mod support;

use api::AppState;
use api::models::{NewArtist, NewTour, RatingRequest};
use auth::{Identity, Role};
use common::ServiceError;
use sqlx::SqlitePool;
use support::{attendee, count, event_at, loft, seed_user, setup};

struct Fixture {
    event_id: i64,
    attendee_id: i64,
    artist_id: i64,
    tour_id: i64,
    venue_id: i64,
}

/// One of everything, with every link between them in place
async fn linked_catalog(pool: &SqlitePool, state: &AppState, owner: &Identity) -> Fixture {
    let venue = state.venues.create(owner, loft()).await.unwrap();
    let event = state
        .events
        .create(owner, event_at("Jazz Night", Some(venue.id)))
        .await
        .unwrap();
    let artist = state
        .artists
        .create(
            owner,
            NewArtist {
                name: "Nina".into(),
                age: None,
                background: None,
                songs: vec![],
            },
        )
        .await
        .unwrap();

    let mut payload = attendee("Sam", "Lee", "sam@x.com");
    payload.favorite_event_ids = vec![event.id];
    payload.favorite_artist_ids = vec![artist.id];
    let sam = state.attendees.create(owner, payload).await.unwrap();

    state
        .associations
        .add_attendee_to_event(owner, event.id, sam.id)
        .await
        .unwrap();
    state
        .associations
        .add_artist_to_event(owner, event.id, artist.id)
        .await
        .unwrap();
    state
        .associations
        .rate_venue(
            owner,
            venue.id,
            &RatingRequest {
                attendee_id: sam.id,
                rating: 4,
            },
        )
        .await
        .unwrap();
    let tour = state
        .tours
        .create(
            owner,
            NewTour {
                name: "Spring Tour".into(),
                start_date: "2025-03-01".into(),
                end_date: "2025-04-30".into(),
                description: None,
                social_media: None,
                event_ids: vec![event.id],
            },
        )
        .await
        .unwrap();

    assert_eq!(count(pool, "SELECT COUNT(*) FROM tour_events").await, 1);
    Fixture {
        event_id: event.id,
        attendee_id: sam.id,
        artist_id: artist.id,
        tour_id: tour.id,
        venue_id: venue.id,
    }
}

#[tokio::test]
async fn attendee_delete_drops_ratings_attendance_and_favorites() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;
    let linked = linked_catalog(&pool, &state, &jane).await;

    state.attendees.delete(&jane, linked.attendee_id).await.unwrap();

    for table in [
        "attendee_venues",
        "attendee_events",
        "attendee_favorite_events",
        "attendee_favorite_artists",
    ] {
        assert_eq!(
            count(&pool, &format!("SELECT COUNT(*) FROM {}", table)).await,
            0,
            "{} still has rows",
            table
        );
    }
    assert!(matches!(
        state.attendees.get(linked.attendee_id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert_eq!(
        state.venues.average_rating(linked.venue_id).await.unwrap(),
        api::models::AverageRating::Unrated
    );
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM events").await, 1);
}

#[tokio::test]
async fn event_delete_drops_every_link_to_it() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;
    let linked = linked_catalog(&pool, &state, &jane).await;

    state.events.delete(&jane, linked.event_id).await.unwrap();

    for table in [
        "attendee_events",
        "attendee_favorite_events",
        "artist_events",
        "tour_events",
    ] {
        assert_eq!(
            count(&pool, &format!("SELECT COUNT(*) FROM {}", table)).await,
            0,
            "{} still has rows",
            table
        );
    }
    assert!(state.tours.get(linked.tour_id).await.unwrap().events.is_empty());
    assert!(state.artists.get(linked.artist_id).await.unwrap().events.is_empty());
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM attendee_venues").await, 1);
}

#[tokio::test]
async fn artist_and_tour_deletes_keep_the_event() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;
    let linked = linked_catalog(&pool, &state, &jane).await;

    state.artists.delete(&jane, linked.artist_id).await.unwrap();
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM artist_events").await, 0);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM attendee_favorite_artists").await,
        0
    );

    state.tours.delete(&jane, linked.tour_id).await.unwrap();
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM tour_events").await, 0);
    assert!(matches!(
        state.tours.get(linked.tour_id).await,
        Err(ServiceError::NotFound(_))
    ));

    let event = state.events.get(linked.event_id).await.unwrap();
    assert!(event.artists.is_empty());
    assert_eq!(event.attendees.len(), 1);
}

#[tokio::test]
async fn deletes_by_a_stranger_leave_rows_in_place() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;
    let mallory = seed_user(&pool, "mallory", Role::Attendee).await;
    let linked = linked_catalog(&pool, &state, &jane).await;

    assert!(matches!(
        state.attendees.delete(&mallory, linked.attendee_id).await,
        Err(ServiceError::Authorization(_))
    ));
    assert!(matches!(
        state.events.delete(&mallory, linked.event_id).await,
        Err(ServiceError::Authorization(_))
    ));
    assert!(matches!(
        state.artists.delete(&mallory, linked.artist_id).await,
        Err(ServiceError::Authorization(_))
    ));
    assert!(matches!(
        state.tours.delete(&mallory, linked.tour_id).await,
        Err(ServiceError::Authorization(_))
    ));

    for table in ["attendees", "events", "artists", "tours"] {
        assert_eq!(
            count(&pool, &format!("SELECT COUNT(*) FROM {}", table)).await,
            1,
            "{} lost its row",
            table
        );
    }
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM attendee_venues").await, 1);
}
