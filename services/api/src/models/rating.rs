//! Attendee-venue rating models

use common::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// One attendee's rating of one venue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRow {
    pub attendee_id: i64,
    pub venue_id: i64,
    pub rating: i64,
}

/// Rating submission payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRequest {
    pub attendee_id: i64,
    pub rating: i64,
}

/// Ratings are whole stars from 1 to 5
pub fn validate_rating(rating: i64) -> ServiceResult<i64> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(ServiceError::validation(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_through_five() {
        for rating in 1..=5 {
            assert_eq!(validate_rating(rating).unwrap(), rating);
        }
    }

    #[test]
    fn rejects_zero_and_six() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }
}
