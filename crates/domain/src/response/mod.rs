//! HTTP response domain types

mod spec;

pub use spec::ApiResponse;
