//! Output module for mirrored pages and crawl reporting
//!
//! This module handles:
//! - Mapping normalized URLs to page files in the output tree
//! - Writing rendered documents to disk
//! - Recording crawl statistics and the final summary

mod layout;
pub mod stats;

pub use layout::{page_file_path, write_page, PAGE_FILE_NAME};
pub use stats::{print_summary, CrawlStats};
