//! Property reviews.

use shortlet_domain::{ApiRequest, NewReview, RequestBody, Review, ReviewEnvelope};

use super::ShortletApi;
use crate::error::ClientResult;
use crate::ports::HttpTransport;

impl<T: HttpTransport> ShortletApi<T> {
    /// `GET /properties/:id/reviews`.
    ///
    /// # Errors
    ///
    /// Any client error.
    pub async fn reviews(&self, property_id: u64) -> ClientResult<Vec<Review>> {
        self.client
            .send_json(ApiRequest::get(format!("/properties/{property_id}/reviews")))
            .await
    }

    /// `POST /properties/:id/reviews`. Ratings run from 1 to 5; a blank
    /// comment is dropped.
    ///
    /// # Errors
    ///
    /// An out-of-range rating is rejected before sending.
    pub async fn submit_review(&self, property_id: u64, review: NewReview) -> ClientResult<Review> {
        let review = review.validated()?;
        let request = ApiRequest::post(format!("/properties/{property_id}/reviews"))
            .with_body(RequestBody::json(&review)?);
        let ReviewEnvelope { review } = self.client.send_json(request).await?;
        Ok(review)
    }
}
