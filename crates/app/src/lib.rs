//! Shortlet - command-line front end for the booking backend.
//!
//! Wires the reqwest transport, a token store and the authenticated client
//! into a [`SessionHolder`] and a [`ShortletApi`], and maps parsed commands
//! onto them.

pub mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use shortlet_application::ports::{TokenStore, TransportError};
use shortlet_application::{
    AuthenticatedClient, ClientError, InMemoryTokenStore, SessionEvents, SessionHolder,
    ShortletApi,
};
use shortlet_domain::{
    BookingRequest, ListingPhoto, ListingUpdate, NewAccount, NewListing, NewReview,
    ProfileUpdate, PropertyFilter, average_rating,
};
use shortlet_infrastructure::{
    ClientConfig, ConfigError, FileTokenStore, ReqwestTransport, SerializationError, SystemClock,
    to_json_stable,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::cli::{Command, ListingArgs};

/// Errors reported by the command-line front end.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad configuration value.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("could not create HTTP client: {0}")]
    Transport(#[from] TransportError),

    /// A request failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Command output could not be rendered.
    #[error("could not render output: {0}")]
    Output(#[from] SerializationError),

    /// A local input file could not be read.
    #[error("could not read {}: {source}", path.display())]
    Input {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl AppError {
    /// Message suitable for printing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// A connected client: the session plus the typed API sharing its
/// authenticated transport.
#[derive(Debug)]
pub struct App {
    session: SessionHolder<ReqwestTransport>,
    api: ShortletApi<ReqwestTransport>,
}

impl App {
    /// Builds the client stack from `config` and restores any persisted
    /// session. Without a session file the session lives in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the session
    /// file cannot be read.
    pub async fn connect(config: &ClientConfig) -> Result<Self, AppError> {
        let transport = ReqwestTransport::new(config)?;
        let store: Arc<dyn TokenStore> = match &config.session_file {
            Some(path) => Arc::new(
                FileTokenStore::open(path)
                    .await
                    .map_err(ClientError::from)?,
            ),
            None => Arc::new(InMemoryTokenStore::new()),
        };

        let client = Arc::new(
            AuthenticatedClient::new(transport, store, SessionEvents::new())
                .with_policy(config.refresh_policy()),
        );
        let session = SessionHolder::new(Arc::clone(&client));
        let api = ShortletApi::new(client, Arc::new(SystemClock::new()));

        let restored = session.restore().await?;
        debug!(
            base_url = %config.base_url,
            authenticated = restored.is_authenticated(),
            "client ready"
        );

        Ok(Self { session, api })
    }

    /// The session holder.
    #[must_use]
    pub const fn session(&self) -> &SessionHolder<ReqwestTransport> {
        &self.session
    }

    /// The typed API.
    #[must_use]
    pub const fn api(&self) -> &ShortletApi<ReqwestTransport> {
        &self.api
    }

    /// Runs one command and renders its result as JSON.
    ///
    /// # Errors
    ///
    /// Returns the first failure; nothing is rendered in that case.
    #[allow(clippy::too_many_lines)]
    pub async fn execute(&self, command: Command) -> Result<String, AppError> {
        let output = match command {
            Command::Login { email, password } => {
                let user = self.session.login(&email, &password).await?;
                info!(user_id = user.id, "logged in");
                to_json_stable(&user)?
            }
            Command::Signup {
                email,
                password,
                first_name,
                last_name,
            } => {
                let account = NewAccount {
                    email,
                    password,
                    first_name,
                    last_name,
                };
                to_json_stable(&self.session.signup(&account).await?)?
            }
            Command::Logout => {
                self.session.logout().await?;
                to_json_stable(&json!({ "logged_out": true }))?
            }
            Command::Whoami { refresh } => {
                let user = if refresh {
                    Some(self.session.refresh_profile().await?)
                } else {
                    self.session.current_user()
                };
                to_json_stable(&user)?
            }
            Command::UpdateProfile {
                first_name,
                last_name,
                profile_pic_url,
            } => {
                let update = ProfileUpdate {
                    first_name,
                    last_name,
                    profile_pic_url,
                };
                to_json_stable(&self.session.update_profile(&update).await?)?
            }
            Command::Properties {
                city,
                state,
                min_price,
                max_price,
                min_bedrooms,
                min_guests,
                check_in,
                check_out,
            } => {
                let filter = PropertyFilter {
                    city,
                    state,
                    min_price,
                    max_price,
                    min_bedrooms,
                    min_guests,
                    check_in,
                    check_out,
                };
                to_json_stable(&self.api.list_properties(&filter).await?)?
            }
            Command::Property { id } => {
                let property = self.api.get_property(id).await?;
                let reviews = self.api.reviews(id).await?;
                to_json_stable(&json!({
                    "property": property,
                    "average_rating": average_rating(&reviews),
                    "review_count": reviews.len(),
                }))?
            }
            Command::MyListings => to_json_stable(&self.api.my_listings().await?)?,
            Command::CreateListing(args) => {
                let listing = read_listing(args).await?;
                to_json_stable(&self.api.create_property(listing).await?)?
            }
            Command::UpdateListing {
                id,
                title,
                description,
                price_per_night,
                max_guests,
                amenities,
            } => {
                let update = ListingUpdate {
                    title,
                    description,
                    price_per_night,
                    max_guests,
                    amenities,
                    ..ListingUpdate::default()
                };
                to_json_stable(&self.api.update_property(id, update).await?)?
            }
            Command::DeleteListing { id } => {
                self.api.delete_property(id).await?;
                to_json_stable(&json!({ "deleted": id }))?
            }
            Command::BookedDates { property_id } => {
                to_json_stable(&self.api.disabled_dates(property_id).await?)?
            }
            Command::Quote {
                property_id,
                check_in,
                check_out,
            } => {
                let property = self.api.get_property(property_id).await?;
                let available = self.api.is_available(property_id, check_in, check_out).await?;
                let estimate =
                    self.api
                        .estimate_stay(check_in, check_out, property.price_per_night);
                to_json_stable(&json!({
                    "property_id": property_id,
                    "price_per_night": property.price_per_night,
                    "available": available,
                    "nights": estimate.map(|e| e.nights),
                    "total_price": estimate.map(|e| e.total_price),
                }))?
            }
            Command::Book {
                property_id,
                check_in,
                check_out,
                guests,
            } => {
                let property = self.api.get_property(property_id).await?;
                let request = BookingRequest::new(check_in, check_out, guests);
                to_json_stable(&self.api.request_booking(&property, request).await?)?
            }
            Command::MyBookings => to_json_stable(&self.api.my_bookings().await?)?,
            Command::HostBookings => to_json_stable(&self.api.host_bookings().await?)?,
            Command::Confirm { booking_id } => {
                to_json_stable(&self.api.confirm_booking(booking_id).await?)?
            }
            Command::Cancel { booking_id } => {
                to_json_stable(&self.api.cancel_booking(booking_id).await?)?
            }
            Command::Pay { booking_id } => {
                to_json_stable(&self.api.initiate_payment(booking_id).await?)?
            }
            Command::Reviews { property_id } => {
                to_json_stable(&self.api.reviews(property_id).await?)?
            }
            Command::Review {
                property_id,
                rating,
                comment,
            } => {
                let review = NewReview { rating, comment };
                to_json_stable(&self.api.submit_review(property_id, review).await?)?
            }
        };

        Ok(output)
    }

    /// Lets background work started by the last command finish, such as
    /// the profile reload that follows a token refresh.
    pub async fn finish(&self) {
        self.session.wait_for_reloads().await;
    }
}

async fn read_listing(args: ListingArgs) -> Result<NewListing, AppError> {
    let mut photos = Vec::with_capacity(args.photos.len());
    for path in &args.photos {
        photos.push(read_photo(path).await?);
    }

    Ok(NewListing {
        title: args.title,
        description: args.description,
        address: args.address,
        city: args.city,
        state: args.state,
        price_per_night: args.price_per_night,
        max_guests: args.max_guests,
        num_bedrooms: args.bedrooms,
        num_bathrooms: args.bathrooms,
        amenities: args.amenities,
        power_backup_details: args.power_backup,
        latitude: args.latitude,
        longitude: args.longitude,
        photos,
    })
}

async fn read_photo(path: &Path) -> Result<ListingPhoto, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| AppError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "photo".to_string(), |n| n.to_string_lossy().into_owned());

    Ok(ListingPhoto { file_name, bytes })
}
