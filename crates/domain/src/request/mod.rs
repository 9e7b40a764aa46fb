//! HTTP request domain types

mod body;
mod method;
mod spec;

pub use body::{FormPart, FormValue, RequestBody};
pub use method::HttpMethod;
pub use spec::ApiRequest;
