//! Pure HTML transforms from rendered markup to domain records.
//!
//! Nothing in here performs I/O; both extractors take a markup string and
//! return records, which keeps them trivially testable against fixture
//! HTML.

pub mod detail;
pub mod listing;

pub use detail::extract_detail;
pub use listing::extract_posts;
