//! Output module for crawl reports
//!
//! This module handles:
//! - Collection counts read back from the store
//! - Printing the summary of a finished crawl session

pub mod stats;

pub use stats::{load_statistics, print_session, print_statistics, CrawlStatistics};
