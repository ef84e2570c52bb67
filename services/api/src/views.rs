//! Read-views assembled from an entity and its related rows
//!
//! Every builder re-queries the store on the connection it is given, so a
//! view built inside a transaction sees that transaction's writes.

use common::ServiceResult;
use sqlx::{Row, SqliteConnection};

use crate::models::{
    AttendeeSummary, DATE_FORMAT, NamedSummary,
    artist::{Artist, ArtistView},
    attendee::{Attendee, AttendeeView},
    event::{Event, EventView},
    tour::{Tour, TourView},
    venue::{Venue, VenueView},
};
use crate::repositories::{association, creator_summary, venue as venue_rows};

async fn named(conn: &mut SqliteConnection, sql: &str, id: i64) -> ServiceResult<Vec<NamedSummary>> {
    let rows = sqlx::query(sql).bind(id).fetch_all(&mut *conn).await?;
    rows.iter()
        .map(|row| -> ServiceResult<NamedSummary> {
            Ok(NamedSummary {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })
        })
        .collect()
}

async fn attendees(
    conn: &mut SqliteConnection,
    sql: &str,
    id: i64,
) -> ServiceResult<Vec<AttendeeSummary>> {
    let rows = sqlx::query(sql).bind(id).fetch_all(&mut *conn).await?;
    rows.iter()
        .map(|row| -> ServiceResult<AttendeeSummary> {
            Ok(AttendeeSummary {
                id: row.try_get("id")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
            })
        })
        .collect()
}

pub async fn venue(conn: &mut SqliteConnection, venue: &Venue) -> ServiceResult<VenueView> {
    let creator = creator_summary(conn, venue.creator_id).await?;
    let events = named(
        conn,
        "SELECT id, name FROM events WHERE venue_id = ? ORDER BY id",
        venue.id,
    )
    .await?;
    let ratings = association::ratings_for_venue(conn, venue.id).await?;
    let average_rating = venue_rows::average_rating(conn, venue.id).await?;

    Ok(VenueView {
        id: venue.id,
        name: venue.name.clone(),
        organizer: venue.organizer.clone(),
        email: venue.email.clone(),
        earnings: venue.earnings.clone(),
        description: venue.description.clone(),
        creator,
        events,
        ratings,
        average_rating,
    })
}

pub async fn event(conn: &mut SqliteConnection, event: &Event) -> ServiceResult<EventView> {
    let creator = creator_summary(conn, event.creator_id).await?;
    let venue = match event.venue_id {
        Some(venue_id) => named(conn, "SELECT id, name FROM venues WHERE id = ?", venue_id)
            .await?
            .into_iter()
            .next(),
        None => None,
    };
    let attendees = attendees(
        conn,
        r#"
        SELECT attendees.id, attendees.first_name, attendees.last_name
        FROM attendees
        JOIN attendee_events ON attendee_events.attendee_id = attendees.id
        WHERE attendee_events.event_id = ?
        ORDER BY attendees.id
        "#,
        event.id,
    )
    .await?;
    let artists = named(
        conn,
        r#"
        SELECT artists.id, artists.name
        FROM artists
        JOIN artist_events ON artist_events.artist_id = artists.id
        WHERE artist_events.event_id = ?
        ORDER BY artists.id
        "#,
        event.id,
    )
    .await?;

    Ok(EventView {
        id: event.id,
        name: event.name.clone(),
        date: event.date.format(DATE_FORMAT).to_string(),
        time: event.time.clone(),
        location: event.location.clone(),
        description: event.description.clone(),
        event_type: event.event_type.clone(),
        creator,
        venue,
        attendees,
        artists,
    })
}

pub async fn attendee(conn: &mut SqliteConnection, attendee: &Attendee) -> ServiceResult<AttendeeView> {
    let creator = creator_summary(conn, attendee.creator_id).await?;
    let favorite_events = association::favorite_events(conn, attendee.id).await?;
    let favorite_artists = named(
        conn,
        r#"
        SELECT artists.id, artists.name
        FROM artists
        JOIN attendee_favorite_artists fav ON fav.artist_id = artists.id
        WHERE fav.attendee_id = ?
        ORDER BY artists.id
        "#,
        attendee.id,
    )
    .await?;
    let venue_ratings = association::ratings_by_attendee(conn, attendee.id).await?;

    Ok(AttendeeView {
        id: attendee.id,
        first_name: attendee.first_name.clone(),
        last_name: attendee.last_name.clone(),
        email: attendee.email.clone(),
        preferred_event_type: attendee.preferred_event_type.clone(),
        creator,
        favorite_events,
        favorite_event_types: attendee.favorite_event_types.clone(),
        favorite_artists,
        social_media: attendee.social_media.clone(),
        venue_ratings,
    })
}

pub async fn artist(conn: &mut SqliteConnection, artist: &Artist) -> ServiceResult<ArtistView> {
    let creator = creator_summary(conn, artist.creator_id).await?;
    let events = named(
        conn,
        r#"
        SELECT events.id, events.name
        FROM events
        JOIN artist_events ON artist_events.event_id = events.id
        WHERE artist_events.artist_id = ?
        ORDER BY events.id
        "#,
        artist.id,
    )
    .await?;
    let favorited_by = attendees(
        conn,
        r#"
        SELECT attendees.id, attendees.first_name, attendees.last_name
        FROM attendees
        JOIN attendee_favorite_artists fav ON fav.attendee_id = attendees.id
        WHERE fav.artist_id = ?
        ORDER BY attendees.id
        "#,
        artist.id,
    )
    .await?;

    Ok(ArtistView {
        id: artist.id,
        name: artist.name.clone(),
        age: artist.age,
        background: artist.background.clone(),
        events,
        songs: artist.songs.clone(),
        favorited_by,
        creator,
    })
}

pub async fn tour(conn: &mut SqliteConnection, tour: &Tour) -> ServiceResult<TourView> {
    let creator = creator_summary(conn, tour.creator_id).await?;
    let events = named(
        conn,
        r#"
        SELECT events.id, events.name
        FROM events
        JOIN tour_events ON tour_events.event_id = events.id
        WHERE tour_events.tour_id = ?
        ORDER BY events.id
        "#,
        tour.id,
    )
    .await?;

    Ok(TourView {
        id: tour.id,
        name: tour.name.clone(),
        start_date: tour.start_date.format(DATE_FORMAT).to_string(),
        end_date: tour.end_date.format(DATE_FORMAT).to_string(),
        description: tour.description.clone(),
        creator,
        social_media: tour.social_media.clone(),
        events: events.into_iter().map(|event| event.name).collect(),
    })
}
