//! External fallback tools consumed by the workflow.

pub mod websearch;

pub use websearch::{DuckDuckGoSearch, WebSearchProvider};
