//! Businesses listed in the directory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directory listing.
///
/// `average_rating` is a cache of the mean of all ratings, rewritten every
/// time a rating is saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category_id: i64,
    pub address: String,
    pub hours: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// Account that manages the listing (set on creation or claim approval)
    pub owner_id: Option<i64>,
    pub created_by: Option<i64>,
    pub average_rating: f64,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when a business is created
#[derive(Debug, Clone, Default)]
pub struct CreateBusinessInput {
    pub name: String,
    pub description: String,
    pub category_id: i64,
    pub address: String,
    pub hours: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub owner_id: Option<i64>,
    pub created_by: Option<i64>,
    pub photo: Option<String>,
}

/// Editable fields; `None` leaves the stored value alone
#[derive(Debug, Clone, Default)]
pub struct UpdateBusinessInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub address: Option<String>,
    pub hours: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub photo: Option<String>,
}

impl Business {
    pub fn apply(&mut self, input: UpdateBusinessInput) {
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(description) = input.description {
            self.description = description;
        }
        if let Some(category_id) = input.category_id {
            self.category_id = category_id;
        }
        if let Some(address) = input.address {
            self.address = address;
        }
        if let Some(hours) = input.hours {
            self.hours = hours;
        }
        if input.phone.is_some() {
            self.phone = input.phone;
        }
        if input.email.is_some() {
            self.email = input.email;
        }
        if input.website.is_some() {
            self.website = input.website;
        }
        if input.photo.is_some() {
            self.photo = input.photo;
        }
        self.updated_at = Utc::now();
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// What SQL `AVG` followed by `round2` yields for `scores`.
    fn average_of(scores: &[i32]) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }
        let sum: i64 = scores.iter().map(|&s| s as i64).sum();
        round2(sum as f64 / scores.len() as f64)
    }

    #[test]
    fn test_average_of_rounds_to_two_places() {
        assert_eq!(average_of(&[]), 0.0);
        assert_eq!(average_of(&[5]), 5.0);
        assert_eq!(average_of(&[4, 5, 5]), 4.67);
        assert_eq!(average_of(&[1, 2]), 1.5);
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let now = Utc::now();
        let mut business = Business {
            id: 1,
            name: "Café".into(),
            description: "old".into(),
            category_id: 1,
            address: "Granada".into(),
            hours: "8-5".into(),
            phone: Some("2552-0000".into()),
            email: None,
            website: None,
            owner_id: Some(3),
            created_by: Some(3),
            average_rating: 4.0,
            photo: None,
            created_at: now,
            updated_at: now,
        };
        business.apply(UpdateBusinessInput {
            description: Some("new".into()),
            ..Default::default()
        });
        assert_eq!(business.description, "new");
        assert_eq!(business.name, "Café");
        assert_eq!(business.phone.as_deref(), Some("2552-0000"));
    }

    proptest! {
        #[test]
        fn prop_average_within_score_bounds(scores in proptest::collection::vec(1i32..=5, 1..50)) {
            let avg = average_of(&scores);
            prop_assert!((1.0..=5.0).contains(&avg));
            prop_assert_eq!(round2(avg), avg);
        }
    }
}
