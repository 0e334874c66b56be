pub mod search_request;
pub mod search_response;

// Keep re-exports unique so downstream crates see a single symbol per type.
pub use search_request::{RequestError, SearchRequest};
pub use search_response::{JobPosting, SearchResponse};
