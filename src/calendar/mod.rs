//! The weekly calendar view
//!
//! Days are calendar dates of the server wall-clock timestamps: tasks are bucketed on the date part of their `created_date`, and no timezone conversion happens on either side.
//! Weeks start on Sunday.

pub mod anchor;
pub mod week;

pub use anchor::WeekAnchor;
pub use week::{project, DayBucket, Week};

/// How many days a calendar view shows
pub const DAYS_PER_WEEK: i64 = 7;
