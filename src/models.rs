use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/300x200?text=Hotel";

// Client-side wishlist entry, flattened from the server's nested record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    /// Wishlist entry id, distinct from `hotel_id`.
    pub id: String,
    pub hotel_id: String,
    pub hotel_name: String,
    pub location: String,
    pub image: String,
    pub price: f64,
    pub rating: f64,
    pub added_date: String,
}

// Wire shape of `GET /wishlist/` entries
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawWishlistEntry {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub hotel: RawHotel,
    #[serde(deserialize_with = "lenient::string")]
    pub added_at: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawHotel {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(deserialize_with = "lenient::string")]
    pub city: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub images: RawImages,
    #[serde(deserialize_with = "lenient::or_default")]
    pub pricing: RawPricing,
    #[serde(deserialize_with = "lenient::or_default")]
    pub rating: RawRating,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawImages {
    pub primary: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPricing {
    pub starting_from: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawRating {
    pub average: Option<f64>,
}

impl From<RawWishlistEntry> for WishlistItem {
    fn from(entry: RawWishlistEntry) -> Self {
        let hotel = entry.hotel;

        WishlistItem {
            id: entry.id,
            hotel_id: hotel.id,
            hotel_name: hotel.name,
            location: format!("{}, {}", hotel.address, hotel.city),
            image: hotel
                .images
                .primary
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
            price: hotel.pricing.starting_from.unwrap_or(0.0),
            rating: hotel.rating.average.unwrap_or(0.0),
            added_date: entry.added_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hotel_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub hotel_name: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    pub status: BookingStatus,
    pub total_amount: f64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub image: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub booking_date: String,
}

// Payload for `POST /bookings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub hotel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

/// Decodes the array under `key` of a response's `data` one record at a
/// time. Records that fail to decode are logged and skipped; only a `data`
/// whose `key` is not an array is an error. Absent or `null` means empty.
pub fn decode_list<T: DeserializeOwned>(
    data: Option<Value>,
    key: &str,
) -> Result<Vec<T>, serde_json::Error> {
    let records = match data.and_then(|mut data| data.get_mut(key).map(Value::take)) {
        None | Some(Value::Null) => Vec::new(),
        Some(records) => serde_json::from_value::<Vec<Value>>(records)?,
    };

    let mut decoded = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<T>(record) {
            Ok(value) => decoded.push(value),
            Err(e) => warn!(key, index, error = %e, "skipping malformed record"),
        }
    }
    Ok(decoded)
}

// Field decoders for loosely typed server records
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    // Ids come back as strings or numbers; `null` reads as empty
    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(optional_string(deserializer)?.unwrap_or_default())
    }

    pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wishlist_entry_with_empty_nested_objects() {
        let raw: RawWishlistEntry = serde_json::from_value(json!({
            "id": "w1",
            "hotel": {
                "id": "h1",
                "name": "Grand Hotel",
                "address": "1 Main St",
                "city": "Metropolis",
                "images": {},
                "pricing": {},
                "rating": {}
            },
            "addedAt": "2024-01-01"
        }))
        .unwrap();

        let item = WishlistItem::from(raw);
        assert_eq!(
            item,
            WishlistItem {
                id: "w1".to_string(),
                hotel_id: "h1".to_string(),
                hotel_name: "Grand Hotel".to_string(),
                location: "1 Main St, Metropolis".to_string(),
                image: PLACEHOLDER_IMAGE_URL.to_string(),
                price: 0.0,
                rating: 0.0,
                added_date: "2024-01-01".to_string(),
            }
        );
    }

    #[test]
    fn test_wishlist_entry_with_full_hotel() {
        let raw: RawWishlistEntry = serde_json::from_value(json!({
            "id": "w2",
            "hotel": {
                "id": "h2",
                "name": "Sea View",
                "address": "9 Beach Rd",
                "city": "Lisbon",
                "images": { "primary": "https://img.example.com/h2.jpg" },
                "pricing": { "startingFrom": 89.5 },
                "rating": { "average": 4.7 }
            },
            "addedAt": "2024-03-15T10:00:00Z"
        }))
        .unwrap();

        let item: WishlistItem = raw.into();
        assert_eq!(item.image, "https://img.example.com/h2.jpg");
        assert_eq!(item.price, 89.5);
        assert_eq!(item.rating, 4.7);
        assert_eq!(item.added_date, "2024-03-15T10:00:00Z");
    }

    #[test]
    fn test_wishlist_entry_missing_hotel_object() {
        let raw: RawWishlistEntry =
            serde_json::from_value(json!({ "id": "w3", "addedAt": "2024-01-01" })).unwrap();
        let item = WishlistItem::from(raw);
        assert_eq!(item.hotel_id, "");
        assert_eq!(item.image, PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn test_wishlist_entry_with_numeric_ids_and_nulls() {
        let raw: RawWishlistEntry = serde_json::from_value(json!({
            "id": 17,
            "hotel": { "id": 3, "name": null, "images": null, "rating": { "average": 4.2 } },
            "addedAt": null
        }))
        .unwrap();

        let item = WishlistItem::from(raw);
        assert_eq!(item.id, "17");
        assert_eq!(item.hotel_id, "3");
        assert_eq!(item.hotel_name, "");
        assert_eq!(item.image, PLACEHOLDER_IMAGE_URL);
        assert_eq!(item.rating, 4.2);
        assert_eq!(item.added_date, "");
    }

    #[test]
    fn test_booking_requires_id() {
        let result = serde_json::from_value::<Booking>(json!({
            "hotelId": "h1",
            "checkIn": "2024-07-01",
            "checkOut": "2024-07-04",
            "guests": 2,
            "status": "pending",
            "totalAmount": 10.0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_list_skips_bad_records() {
        let data = json!({ "items": [{ "id": "w1" }, 5, { "id": "w2", "hotel": true }, { "id": 3 }] });
        let entries = decode_list::<RawWishlistEntry>(Some(data), "items").unwrap();
        let ids: Vec<String> = entries.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["w1", "3"]);
    }

    #[test]
    fn test_decode_list_missing_key_is_empty() {
        let entries = decode_list::<Booking>(Some(json!({ "total": 0 })), "bookings").unwrap();
        assert!(entries.is_empty());
        assert!(decode_list::<Booking>(Some(json!({ "bookings": 1 })), "bookings").is_err());
    }

    #[test]
    fn test_booking_wire_format() {
        let booking: Booking = serde_json::from_value(json!({
            "id": "b1",
            "hotelId": "h1",
            "hotelName": "Grand Hotel",
            "checkIn": "2024-07-01",
            "checkOut": "2024-07-04",
            "guests": 2,
            "status": "confirmed",
            "totalAmount": 360.0,
            "image": "https://img.example.com/h1.jpg",
            "bookingDate": "2024-05-20"
        }))
        .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.room_id, None);

        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["hotelId"], "h1");
        assert_eq!(value["status"], "confirmed");
        assert!(value.get("roomId").is_none());
    }

    #[test]
    fn test_unknown_booking_status_rejected() {
        let result = serde_json::from_value::<BookingStatus>(json!("refunded"));
        assert!(result.is_err());
    }
}
