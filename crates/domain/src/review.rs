//! Property reviews

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Public author info attached to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    /// Author's given name
    pub first_name: String,
}

/// A review of a stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review id
    pub id: u64,
    /// Reviewing guest
    pub guest_id: u64,
    /// Reviewed listing
    pub property_id: u64,
    /// Rating, 1 to 5
    pub rating: u8,
    /// Optional comment
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation timestamp, as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Author info
    #[serde(default)]
    pub author: Option<ReviewAuthor>,
}

/// Envelope returned by review submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewEnvelope {
    /// Stored review
    pub review: Review,
}

/// Body of `POST /properties/:id/reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    /// Rating, 1 to 5
    pub rating: u8,
    /// Optional comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl NewReview {
    /// Lowest accepted rating.
    pub const MIN_RATING: u8 = 1;
    /// Highest accepted rating.
    pub const MAX_RATING: u8 = 5;

    /// Checks the rating bounds. Blank comments are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidRating`] outside 1..=5.
    pub fn validated(mut self) -> DomainResult<Self> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating) {
            return Err(DomainError::InvalidRating(self.rating));
        }
        self.comment = self.comment.filter(|c| !c.trim().is_empty());
        Ok(self)
    }
}

/// Mean rating over `reviews`, or `None` when there are none.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Some(f64::from(total) / f64::from(u32::try_from(reviews.len()).unwrap_or(u32::MAX)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: 1,
            guest_id: 1,
            property_id: 1,
            rating,
            comment: None,
            created_at: None,
            author: None,
        }
    }

    #[test]
    fn test_rating_bounds() {
        let ok = NewReview {
            rating: 5,
            comment: Some("  ".to_string()),
        };
        assert_eq!(ok.validated().unwrap().comment, None);

        for rating in [0, 6] {
            let bad = NewReview {
                rating,
                comment: None,
            };
            assert_eq!(bad.validated(), Err(DomainError::InvalidRating(rating)));
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[review(4), review(5)]), Some(4.5));
    }
}
