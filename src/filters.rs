// Filtering, searching and sorting of the synced collections, backing the
// filter/sort/search pickers of the UI.

use crate::models::{Booking, BookingStatus, WishlistItem};
use chrono::{DateTime, NaiveDate};
use std::cmp::Ordering;

// Criteria for narrowing the booking list. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub statuses: Option<Vec<BookingStatus>>,
    pub hotel_ids: Option<Vec<String>>,
    pub check_in_from: Option<NaiveDate>,
    pub check_in_to: Option<NaiveDate>,
    pub hotel_name_contains: Option<String>,
}

impl BookingFilter {
    // Live bookings checking in today or later
    pub fn upcoming(today: NaiveDate) -> Self {
        Self {
            statuses: Some(vec![BookingStatus::Pending, BookingStatus::Confirmed]),
            check_in_from: Some(today),
            ..Default::default()
        }
    }

    pub fn past(today: NaiveDate) -> Self {
        Self {
            check_in_to: today.pred_opt(),
            ..Default::default()
        }
    }

    pub fn cancelled() -> Self {
        Self {
            statuses: Some(vec![BookingStatus::Cancelled]),
            ..Default::default()
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        if !self
            .statuses
            .as_ref()
            .map_or(true, |statuses| statuses.contains(&booking.status))
        {
            return false;
        }

        if !self
            .hotel_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(&booking.hotel_id))
        {
            return false;
        }

        if !self.hotel_name_contains.as_ref().map_or(true, |needle| {
            booking
                .hotel_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        }) {
            return false;
        }

        if self.check_in_from.is_some() || self.check_in_to.is_some() {
            let Some(check_in) = parse_date(&booking.check_in) else {
                return false;
            };
            if self.check_in_from.map_or(false, |from| check_in < from) {
                return false;
            }
            if self.check_in_to.map_or(false, |to| check_in > to) {
                return false;
            }
        }

        true
    }
}

pub fn filter_bookings(bookings: &[Booking], filter: &BookingFilter) -> Vec<Booking> {
    bookings
        .iter()
        .filter(|booking| filter.matches(booking))
        .cloned()
        .collect()
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WishlistSort {
    #[default]
    Recent,
    PriceLowToHigh,
    PriceHighToLow,
    RatingHighToLow,
    Name,
}

// Stable, so equal keys keep their server order
pub fn sort_wishlist(items: &mut [WishlistItem], sort: WishlistSort) {
    match sort {
        WishlistSort::Recent => items.sort_by(|a, b| compare_added(b, a)),
        WishlistSort::PriceLowToHigh => items.sort_by(|a, b| a.price.total_cmp(&b.price)),
        WishlistSort::PriceHighToLow => items.sort_by(|a, b| b.price.total_cmp(&a.price)),
        WishlistSort::RatingHighToLow => items.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        WishlistSort::Name => items.sort_by(|a, b| {
            a.hotel_name
                .to_lowercase()
                .cmp(&b.hotel_name.to_lowercase())
        }),
    }
}

// Unparseable dates sort as oldest
fn compare_added(a: &WishlistItem, b: &WishlistItem) -> Ordering {
    parse_date(&a.added_date).cmp(&parse_date(&b.added_date))
}

/// Case-insensitive match on hotel name or location; blank query keeps all.
pub fn search_wishlist(items: &[WishlistItem], query: &str) -> Vec<WishlistItem> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return items.to_vec();
    }

    items
        .iter()
        .filter(|item| {
            item.hotel_name.to_lowercase().contains(&query)
                || item.location.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}
