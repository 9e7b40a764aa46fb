//! Listing endpoints: search, details, host listings and listing edits.

use shortlet_domain::{
    ApiRequest, ListingUpdate, NewListing, Property, PropertyEnvelope, PropertyFilter, RequestBody,
};
use tracing::info;

use super::ShortletApi;
use crate::error::ClientResult;
use crate::ports::HttpTransport;

impl<T: HttpTransport> ShortletApi<T> {
    /// `GET /properties`, with only the set filter fields as query pairs.
    ///
    /// # Errors
    ///
    /// Rejects inverted price or date ranges before sending.
    pub async fn list_properties(&self, filter: &PropertyFilter) -> ClientResult<Vec<Property>> {
        filter.validate()?;
        let request = ApiRequest::get("/properties").with_query(filter.to_query());
        self.client.send_json(request).await
    }

    /// `GET /properties/:id`.
    ///
    /// # Errors
    ///
    /// [`crate::ClientError::Remote`] with status 404 for an unknown id.
    pub async fn get_property(&self, id: u64) -> ClientResult<Property> {
        self.client
            .send_json(ApiRequest::get(format!("/properties/{id}")))
            .await
    }

    /// `GET /my-listings`: listings owned by the logged-in host.
    ///
    /// # Errors
    ///
    /// Any client error.
    pub async fn my_listings(&self) -> ClientResult<Vec<Property>> {
        self.client.send_json(ApiRequest::get("/my-listings")).await
    }

    /// `POST /properties` as multipart form data, photos under
    /// `listing_photos`.
    ///
    /// # Errors
    ///
    /// Missing text fields or a non-positive price are rejected before
    /// sending.
    pub async fn create_property(&self, listing: NewListing) -> ClientResult<Property> {
        listing.validate()?;
        let photos = listing.photos.len();
        let request = ApiRequest::post("/properties")
            .with_body(RequestBody::Multipart(listing.into_form()));
        let PropertyEnvelope { property } = self.client.send_json(request).await?;
        info!(property_id = property.id, photos, "listing created");
        Ok(property)
    }

    /// `PATCH /properties/:id` with the set fields as form data.
    ///
    /// # Errors
    ///
    /// An update with no fields is rejected before sending.
    pub async fn update_property(&self, id: u64, update: ListingUpdate) -> ClientResult<Property> {
        let request = ApiRequest::patch(format!("/properties/{id}"))
            .with_body(RequestBody::Multipart(update.into_form()?));
        let PropertyEnvelope { property } = self.client.send_json(request).await?;
        Ok(property)
    }

    /// `DELETE /properties/:id`.
    ///
    /// # Errors
    ///
    /// Any client error.
    pub async fn delete_property(&self, id: u64) -> ClientResult<()> {
        self.client
            .send(ApiRequest::delete(format!("/properties/{id}")))
            .await?;
        info!(property_id = id, "listing deleted");
        Ok(())
    }
}
