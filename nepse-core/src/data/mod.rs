//! Data acquisition and persistence

pub mod html;
pub mod http;
pub mod listing;
pub mod source;
pub mod store;

pub use http::{HttpClient, HttpSettings, HttpTableSource};
pub use listing::{ListingError, Sector, SectorListing};
pub use source::{FetchError, MemoryPages, PageSource, RawRow};
pub use store::{CalendarStore, PriceStore, StoreError, WriteOutcome};
