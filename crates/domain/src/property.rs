//! Property listings and listing filters

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::request::FormPart;

/// A listed property, as returned by `GET /properties/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Listing id
    pub id: u64,
    /// Owning host
    pub host_id: u64,
    /// Listing title
    pub title: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// State or region
    pub state: String,
    /// Nightly rate
    pub price_per_night: f64,
    /// Guest capacity
    pub max_guests: u32,
    /// Bedroom count
    pub num_bedrooms: u32,
    /// Bathroom count; halves allowed
    pub num_bathrooms: f64,
    /// Amenity labels
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Power backup arrangement, e.g. "Solar Inverter (24/7)"
    #[serde(default)]
    pub power_backup_details: Option<String>,
    /// Latitude
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Photo URLs
    #[serde(default)]
    pub listing_photos: Vec<String>,
    /// Creation timestamp, as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp, as sent by the backend.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Envelope returned by listing create and update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyEnvelope {
    /// Stored listing
    pub property: Property,
}

/// Query filters for `GET /properties`. Unset fields are not sent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyFilter {
    /// City substring
    pub city: Option<String>,
    /// State substring
    pub state: Option<String>,
    /// Lowest nightly rate
    pub min_price: Option<f64>,
    /// Highest nightly rate
    pub max_price: Option<f64>,
    /// Minimum bedrooms
    pub min_bedrooms: Option<u32>,
    /// Minimum guest capacity
    pub min_guests: Option<u32>,
    /// Desired check-in; only applied together with `check_out`.
    pub check_in: Option<NaiveDate>,
    /// Desired check-out; only applied together with `check_in`.
    pub check_out: Option<NaiveDate>,
}

impl PropertyFilter {
    /// Checks price bounds and stay ordering.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> DomainResult<()> {
        for price in [self.min_price, self.max_price].into_iter().flatten() {
            if !price.is_finite() || price < 0.0 {
                return Err(DomainError::InvalidPrice(price.to_string()));
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(DomainError::InvalidPriceRange { min, max });
        }
        if let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out)
            && check_out <= check_in
        {
            return Err(DomainError::InvalidStayRange {
                check_in,
                check_out,
            });
        }
        Ok(())
    }

    /// Returns the set filters as query pairs, in a stable order.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                query.push((key.to_string(), value));
            }
        };

        push("city", self.city.clone());
        push("state", self.state.clone());
        push("min_price", self.min_price.map(|p| p.to_string()));
        push("max_price", self.max_price.map(|p| p.to_string()));
        push("min_bedrooms", self.min_bedrooms.map(|n| n.to_string()));
        push("min_guests", self.min_guests.map(|n| n.to_string()));
        if let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out) {
            push("check_in", Some(check_in.format("%Y-%m-%d").to_string()));
            push("check_out", Some(check_out.format("%Y-%m-%d").to_string()));
        }
        query
    }
}

/// A photo attached to a new listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPhoto {
    /// File name; its extension drives the content type.
    pub file_name: String,
    /// Image bytes
    pub bytes: Vec<u8>,
}

/// Form for `POST /properties`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewListing {
    /// Listing title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// State or region
    pub state: String,
    /// Nightly rate
    pub price_per_night: f64,
    /// Guest capacity
    pub max_guests: u32,
    /// Bedroom count
    pub num_bedrooms: u32,
    /// Bathroom count
    pub num_bathrooms: f64,
    /// Amenity labels
    pub amenities: Vec<String>,
    /// Power backup arrangement
    pub power_backup_details: Option<String>,
    /// Latitude
    pub latitude: Option<f64>,
    /// Longitude
    pub longitude: Option<f64>,
    /// Photos to upload
    pub photos: Vec<ListingPhoto>,
}

impl NewListing {
    /// Checks required fields and numeric ranges.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self) -> DomainResult<()> {
        for (name, value) in [
            ("title", &self.title),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::MissingField(name));
            }
        }
        if !self.price_per_night.is_finite() || self.price_per_night <= 0.0 {
            return Err(DomainError::InvalidPrice(self.price_per_night.to_string()));
        }
        if self.max_guests == 0 {
            return Err(DomainError::NoGuests);
        }
        if !self.num_bathrooms.is_finite() || self.num_bathrooms < 0.0 {
            return Err(DomainError::InvalidPrice(self.num_bathrooms.to_string()));
        }
        Ok(())
    }

    /// Builds the multipart form, photos last under `listing_photos`.
    #[must_use]
    pub fn into_form(self) -> Vec<FormPart> {
        let mut parts = vec![
            FormPart::text("title", self.title),
            FormPart::text("address", self.address),
            FormPart::text("city", self.city),
            FormPart::text("state", self.state),
            FormPart::text("price_per_night", self.price_per_night.to_string()),
            FormPart::text("max_guests", self.max_guests.to_string()),
            FormPart::text("num_bedrooms", self.num_bedrooms.to_string()),
            FormPart::text("num_bathrooms", self.num_bathrooms.to_string()),
            FormPart::text("amenities", self.amenities.join(",")),
        ];
        if let Some(description) = self.description {
            parts.push(FormPart::text("description", description));
        }
        if let Some(power) = self.power_backup_details {
            parts.push(FormPart::text("power_backup_details", power));
        }
        if let Some(latitude) = self.latitude {
            parts.push(FormPart::text("latitude", latitude.to_string()));
        }
        if let Some(longitude) = self.longitude {
            parts.push(FormPart::text("longitude", longitude.to_string()));
        }
        parts.extend(
            self.photos
                .into_iter()
                .map(|photo| FormPart::file("listing_photos", photo.file_name, photo.bytes)),
        );
        parts
    }
}

/// Partial update for `PATCH /properties/:id`. Only text fields are sent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New address
    pub address: Option<String>,
    /// New city
    pub city: Option<String>,
    /// New state
    pub state: Option<String>,
    /// New nightly rate
    pub price_per_night: Option<f64>,
    /// New capacity
    pub max_guests: Option<u32>,
    /// New bedroom count
    pub num_bedrooms: Option<u32>,
    /// New bathroom count
    pub num_bathrooms: Option<f64>,
    /// Replacement amenity list
    pub amenities: Option<Vec<String>>,
    /// New power backup arrangement
    pub power_backup_details: Option<String>,
    /// New latitude
    pub latitude: Option<f64>,
    /// New longitude
    pub longitude: Option<f64>,
}

impl ListingUpdate {
    /// Builds the multipart form from the set fields.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyUpdate`] if no field is set.
    pub fn into_form(self) -> DomainResult<Vec<FormPart>> {
        let text = [
            ("title", self.title),
            ("description", self.description),
            ("address", self.address),
            ("city", self.city),
            ("state", self.state),
            ("price_per_night", self.price_per_night.map(|v| v.to_string())),
            ("max_guests", self.max_guests.map(|v| v.to_string())),
            ("num_bedrooms", self.num_bedrooms.map(|v| v.to_string())),
            ("num_bathrooms", self.num_bathrooms.map(|v| v.to_string())),
            ("amenities", self.amenities.map(|a| a.join(","))),
            ("power_backup_details", self.power_backup_details),
            ("latitude", self.latitude.map(|v| v.to_string())),
            ("longitude", self.longitude.map(|v| v.to_string())),
        ];

        let parts: Vec<FormPart> = text
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| FormPart::text(name, value)))
            .collect();

        if parts.is_empty() {
            return Err(DomainError::EmptyUpdate);
        }
        Ok(parts)
    }
}
