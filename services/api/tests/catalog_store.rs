//! Venue, artist and attendee stores against an in-memory database

mod support;

use api::models::{
    ArtistUpdate, AttendeeUpdate, AverageRating, NamedSummary, NewArtist, VenueUpdate,
    from_payload,
};
use auth::Role;
use common::ServiceError;
use serde_json::json;
use support::{attendee, count, event_at, loft, seed_user, setup};

#[tokio::test]
async fn venue_view_lists_its_events() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;

    let venue = state.venues.create(&jane, loft()).await.unwrap();
    let event = state
        .events
        .create(&jane, event_at("Jazz Night", Some(venue.id)))
        .await
        .unwrap();

    let view = state.venues.get(venue.id).await.unwrap();
    assert_eq!(
        view.events,
        vec![NamedSummary {
            id: event.id,
            name: "Jazz Night".into()
        }]
    );
    assert!(view.ratings.is_empty());
    assert_eq!(view.average_rating, AverageRating::Unrated);
    assert_eq!(view.creator.unwrap().username, "jane");

    let body = serde_json::to_value(state.venues.get(venue.id).await.unwrap()).unwrap();
    assert_eq!(body["average_rating"], json!("No ratings yet"));
}

#[tokio::test]
async fn non_owner_cannot_update_venue() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;
    let mallory = seed_user(&pool, "mallory", Role::Venue).await;
    let venue = state.venues.create(&jane, loft()).await.unwrap();

    let err = state
        .venues
        .update(
            &mallory,
            venue.id,
            VenueUpdate {
                name: Some("Taken Over".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Authorization(_)));
    assert_eq!(state.venues.get(venue.id).await.unwrap().name, "The Loft");

    let err = state.venues.delete(&mallory, venue.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Authorization(_)));
}

#[tokio::test]
async fn admin_can_update_any_venue() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;
    let root = seed_user(&pool, "root", Role::Admin).await;
    let venue = state.venues.create(&jane, loft()).await.unwrap();

    let update: VenueUpdate = from_payload(json!({"earnings": "about 2k"})).unwrap();
    let view = state.venues.update(&root, venue.id, update).await.unwrap();
    assert_eq!(view.earnings, "about 2k");
    assert_eq!(view.creator.unwrap().id, jane.id);
}

#[tokio::test]
async fn venue_delete_removes_events_and_ratings() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;
    let venue = state.venues.create(&jane, loft()).await.unwrap();
    let event = state
        .events
        .create(&jane, event_at("Jazz Night", Some(venue.id)))
        .await
        .unwrap();
    let sam = state
        .attendees
        .create(&jane, attendee("Sam", "Lee", "sam@x.com"))
        .await
        .unwrap();
    state
        .associations
        .add_attendee_to_event(&jane, event.id, sam.id)
        .await
        .unwrap();
    state
        .associations
        .rate_venue(
            &jane,
            venue.id,
            &api::models::RatingRequest {
                attendee_id: sam.id,
                rating: 4,
            },
        )
        .await
        .unwrap();

    state.venues.delete(&jane, venue.id).await.unwrap();

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM venues").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM events").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM attendee_venues").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM attendee_events").await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM attendees").await, 1);
    assert!(matches!(
        state.events.get(event.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn venue_search_distinguishes_blank_and_missing() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;
    state.venues.create(&jane, loft()).await.unwrap();

    let found = state.venues.search("LOFT").await.unwrap();
    assert_eq!(found.len(), 1);

    assert!(matches!(
        state.venues.search("basement").await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        state.venues.search("  ").await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn search_wildcards_match_literally() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Venue).await;
    state.venues.create(&jane, loft()).await.unwrap();

    for term in ["%", "_"] {
        assert!(matches!(
            state.venues.search(term).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    let mut percent = loft();
    percent.name = "100% Club".into();
    state.venues.create(&jane, percent).await.unwrap();
    let found = state.venues.search("%").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "100% Club");

    let sam = state
        .attendees
        .create(&jane, attendee("Sam", "Lee", "sam@x.com"))
        .await
        .unwrap();
    assert_eq!(sam.first_name, "Sam");
    assert!(state.attendees.search("_").await.unwrap().is_empty());
}

#[tokio::test]
async fn artist_update_skips_unknown_fields() {
    let (pool, state) = setup().await;
    let nina = seed_user(&pool, "nina", Role::Artist).await;
    let artist = state
        .artists
        .create(
            &nina,
            NewArtist {
                name: "Nina".into(),
                age: Some(30),
                background: None,
                songs: vec!["Feeling Good".into()],
            },
        )
        .await
        .unwrap();

    let update: ArtistUpdate =
        from_payload(json!({"background": "Jazz singer", "genre": "jazz"})).unwrap();
    let view = state.artists.update(&nina, artist.id, update).await.unwrap();
    assert_eq!(view.background.as_deref(), Some("Jazz singer"));
    assert_eq!(view.songs, vec!["Feeling Good".to_string()]);

    assert!(matches!(
        state.artists.search("nobody").await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_a_user_removes_what_it_owns() {
    let (pool, state) = setup().await;
    let root = seed_user(&pool, "root", Role::Admin).await;
    let owner = seed_user(&pool, "owner", Role::Artist).await;

    let venue = state.venues.create(&owner, loft()).await.unwrap();
    let artist = state
        .artists
        .create(
            &owner,
            NewArtist {
                name: "Nina".into(),
                age: None,
                background: None,
                songs: vec![],
            },
        )
        .await
        .unwrap();
    let sam = state
        .attendees
        .create(&owner, attendee("Sam", "Lee", "sam@x.com"))
        .await
        .unwrap();

    state.auth.delete_user(&root, owner.id).await.unwrap();

    assert!(matches!(
        state.artists.get(artist.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        state.venues.get(venue.id).await,
        Err(ServiceError::NotFound(_))
    ));

    let survivor = state.attendees.get(sam.id).await.unwrap();
    assert!(survivor.creator.is_none());
}

#[tokio::test]
async fn attendee_email_is_unique_and_search_may_be_empty() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Attendee).await;
    state
        .attendees
        .create(&jane, attendee("Sam", "Lee", "sam@x.com"))
        .await
        .unwrap();

    let err = state
        .attendees
        .create(&jane, attendee("Samuel", "Lee", "sam@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    assert_eq!(state.attendees.search("lee").await.unwrap().len(), 1);
    assert!(state.attendees.search("nobody").await.unwrap().is_empty());
    assert!(matches!(
        state.attendees.search("").await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn attendee_update_replaces_favorites() {
    let (pool, state) = setup().await;
    let jane = seed_user(&pool, "jane", Role::Attendee).await;
    let first = state.events.create(&jane, event_at("Jazz Night", None)).await.unwrap();
    let second = state.events.create(&jane, event_at("Open Mic", None)).await.unwrap();

    let mut payload = attendee("Sam", "Lee", "sam@x.com");
    payload.favorite_event_ids = vec![first.id, 999];
    payload.social_media = Some(json!({"instagram": "@samlee"}));
    let sam = state.attendees.create(&jane, payload).await.unwrap();
    assert_eq!(sam.favorite_events.len(), 1);
    assert_eq!(sam.social_media, Some(json!({"instagram": "@samlee"})));

    let update: AttendeeUpdate =
        from_payload(json!({"favorite_event_ids": [second.id]})).unwrap();
    let view = state.attendees.update(&jane, sam.id, update).await.unwrap();
    assert_eq!(
        view.favorite_events,
        vec![NamedSummary {
            id: second.id,
            name: "Open Mic".into()
        }]
    );

    assert!(from_payload::<AttendeeUpdate>(json!({"nickname": "sammy"})).is_err());
}
