//! Utility functions shared by front ends.

pub mod dates;

pub use dates::{donation_suggestion, format_last_used};
