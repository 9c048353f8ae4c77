mod cache;
mod element_set;
mod error;
mod group;
mod parse;
mod source;

#[cfg(test)]
pub mod testing;

pub use cache::{fetch_groups, CatalogCache};
pub use element_set::ElementSet;
pub use error::FetchError;
pub use group::{default_groups, GroupCategory, ObjectGroup};
pub use source::{CatalogSource, FeedSource};
