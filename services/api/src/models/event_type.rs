//! Event-type vocabulary offered to the front-end

/// Labels the front-end offers in its event-type picker
pub const EVENT_TYPES: [&str; 16] = [
    "Concert",
    "Comedy Show",
    "Drag Shows",
    "Karaoke",
    "Open Mic",
    "Dance Party",
    "DJ Set",
    "Festival",
    "Theater",
    "Poetry Slam",
    "Trivia Night",
    "Art Exhibition",
    "Workshop",
    "Networking",
    "Sports",
    "Film Screening",
];

/// Whether `label` is one of [`EVENT_TYPES`] (exact match)
pub fn is_known(label: &str) -> bool {
    EVENT_TYPES.contains(&label)
}
