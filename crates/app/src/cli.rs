//! CLI argument parsing and logging setup.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How log lines are written to stderr.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line fields
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
    /// Single-line human-readable
    Compact,
}

/// Top-level arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "shortlet",
    version,
    about = "Browse, book and host short-let apartments from the terminal"
)]
pub struct Args {
    /// API root, e.g. "http://127.0.0.1:5000/api"
    #[arg(long, env = "SHORTLET_BASE_URL")]
    pub base_url: Option<String>,

    /// File the session is persisted to
    #[arg(long, env = "SHORTLET_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Keep the session in memory for this invocation only
    #[arg(long)]
    pub ephemeral: bool,

    /// Log output format (logs go to stderr; filter with RUST_LOG)
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Operations the CLI can perform.
#[allow(missing_docs)]
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Log in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SHORTLET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SHORTLET_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Forget the persisted session
    Logout,
    /// Show the logged-in user
    Whoami {
        /// Fetch the profile from the server instead of the cached copy
        #[arg(long)]
        refresh: bool,
    },
    /// Change profile fields
    UpdateProfile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        profile_pic_url: Option<String>,
    },
    /// Search listings
    Properties {
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        min_bedrooms: Option<u32>,
        #[arg(long)]
        min_guests: Option<u32>,
        /// Only listings free from this date (requires --check-out)
        #[arg(long, requires = "check_out")]
        check_in: Option<NaiveDate>,
        #[arg(long, requires = "check_in")]
        check_out: Option<NaiveDate>,
    },
    /// Show one listing
    Property { id: u64 },
    /// Listings owned by the logged-in host
    MyListings,
    /// Publish a listing
    CreateListing(ListingArgs),
    /// Change fields of a listing
    UpdateListing {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price_per_night: Option<f64>,
        #[arg(long)]
        max_guests: Option<u32>,
        /// Comma-separated, replaces the current list
        #[arg(long, value_delimiter = ',')]
        amenities: Option<Vec<String>>,
    },
    /// Remove a listing
    DeleteListing { id: u64 },
    /// Dates that cannot be booked for a listing
    BookedDates { property_id: u64 },
    /// Nights and price for a stay
    Quote {
        property_id: u64,
        #[arg(long)]
        check_in: NaiveDate,
        #[arg(long)]
        check_out: NaiveDate,
    },
    /// Request a booking
    Book {
        property_id: u64,
        #[arg(long)]
        check_in: NaiveDate,
        #[arg(long)]
        check_out: NaiveDate,
        #[arg(long, default_value = "1")]
        guests: u32,
    },
    /// Bookings made by the logged-in guest
    MyBookings,
    /// Bookings on the logged-in host's listings
    HostBookings,
    /// Confirm a pending booking (host)
    Confirm { booking_id: u64 },
    /// Cancel a booking (host)
    Cancel { booking_id: u64 },
    /// Start paying for a booking
    Pay { booking_id: u64 },
    /// Reviews of a listing
    Reviews { property_id: u64 },
    /// Review a listing
    Review {
        property_id: u64,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
    },
}

/// Fields of a new listing.
#[allow(missing_docs)]
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct ListingArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub price_per_night: f64,
    #[arg(long)]
    pub max_guests: u32,
    #[arg(long, default_value = "1")]
    pub bedrooms: u32,
    #[arg(long, default_value = "1")]
    pub bathrooms: f64,
    #[arg(long, value_delimiter = ',')]
    pub amenities: Vec<String>,
    #[arg(long)]
    pub power_backup: Option<String>,
    #[arg(long)]
    pub latitude: Option<f64>,
    #[arg(long)]
    pub longitude: Option<f64>,
    /// Image to upload; repeat for several
    #[arg(long = "photo")]
    pub photos: Vec<PathBuf>,
}

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`
/// filter.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
