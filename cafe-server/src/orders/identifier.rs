//! Human-facing order identifiers
//!
//! - Order number: `CO` + local date `YYYYMMDD` + 4 random digits. Unique in
//!   practice; the UNIQUE column catches the rare clash and settlement retries.
//! - Pickup code: one letter from the current hour + 3 random digits, only
//!   distinguishable within a serving window.

use chrono::{DateTime, Local, TimeZone, Timelike};
use rand::Rng;

/// Source of order numbers and pickup codes
///
/// Settlement takes this as a trait object so tests can force collisions.
pub trait OrderNumberSource: Send + Sync {
    fn next_order_number(&self) -> String;
    fn next_pickup_code(&self) -> String;
}

/// Clock + thread-local RNG generator
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierGenerator;

impl IdentifierGenerator {
    pub fn order_number_at<Tz: TimeZone>(at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
        format!("CO{}{suffix:04}", at.format("%Y%m%d"))
    }

    pub fn pickup_code_at<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
        // hour is 0..=23, always inside A..Z
        let letter = char::from(b'A' + (at.hour() % 26) as u8);
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000);
        format!("{letter}{suffix:03}")
    }
}

impl OrderNumberSource for IdentifierGenerator {
    fn next_order_number(&self) -> String {
        Self::order_number_at(&Local::now())
    }

    fn next_pickup_code(&self) -> String {
        Self::pickup_code_at(&Local::now())
    }
}
