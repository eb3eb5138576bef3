pub mod search;

pub use search::{ListingsResponse, SearchQuery, SearchResponse, SearchStrategy};
