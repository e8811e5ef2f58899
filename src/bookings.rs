// Booking synchronization unit.
//
// Unlike the wishlist, a failed fetch is surfaced through `error` and the
// previous collection is kept. Cancellation flips the local status in place
// once the server accepts it.

use crate::api::ApiClient;
use crate::error::{expect_success, SyncError};
use crate::filters::{filter_bookings, BookingFilter};
use crate::models::{decode_list, Booking, BookingStatus, NewBooking};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const BOOKINGS_PATH: &str = "/bookings";

const FETCH_FAILED: &str = "Failed to fetch bookings";
const CREATE_FAILED: &str = "Booking failed";
const CANCEL_FAILED: &str = "Cancellation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Reload bookings from the server when a cancellation is refused, so
    /// local and server state cannot drift apart until the next refresh.
    pub reconcile_on_cancel_failure: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            reconcile_on_cancel_failure: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingState {
    pub bookings: Vec<Booking>,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
}

pub struct BookingStore {
    client: Arc<dyn ApiClient>,
    policy: SyncPolicy,
    state: watch::Sender<BookingState>,
}

impl BookingStore {
    pub async fn mount(client: Arc<dyn ApiClient>) -> Self {
        Self::mount_with_policy(client, SyncPolicy::default()).await
    }

    pub async fn mount_with_policy(client: Arc<dyn ApiClient>, policy: SyncPolicy) -> Self {
        let (state, _) = watch::channel(BookingState::default());
        let store = Self {
            client,
            policy,
            state,
        };
        store.fetch(false).await;
        store
    }

    pub async fn fetch(&self, is_refresh: bool) {
        self.state.send_modify(|state| {
            if is_refresh {
                state.refreshing = true;
            } else {
                state.loading = true;
            }
            state.error = None;
        });

        let outcome = match self.client.get(BOOKINGS_PATH).await {
            Ok(response) if response.success => decode_bookings(response.data).map_err(|e| {
                warn!(error = %e, "undecodable bookings payload");
                FETCH_FAILED.to_string()
            }),
            Ok(response) => Err(response.error_or(FETCH_FAILED)),
            Err(e) => {
                warn!(error = %e, "bookings fetch failed");
                Err(FETCH_FAILED.to_string())
            }
        };

        self.state.send_modify(|state| {
            match outcome {
                Ok(bookings) => {
                    debug!(count = bookings.len(), is_refresh, "bookings fetched");
                    state.bookings = bookings;
                }
                Err(message) => state.error = Some(message),
            }
            state.loading = false;
            state.refreshing = false;
        });
    }

    /// Creates a booking and reloads the collection. Returns the server's data.
    pub async fn create_booking(&self, booking: &NewBooking) -> Result<Value, SyncError> {
        let body = serde_json::to_value(booking)?;
        let result = self.client.post(BOOKINGS_PATH, body).await;
        let response = expect_success(result, CREATE_FAILED).map_err(|err| {
            warn!(hotel_id = %booking.hotel_id, error = %err, "booking creation failed");
            err
        })?;

        info!(hotel_id = %booking.hotel_id, "booking created");
        self.fetch(false).await;
        Ok(response.data.unwrap_or(Value::Null))
    }

    pub async fn cancel_booking(&self, booking_id: &str) -> Result<(), SyncError> {
        let result = self
            .client
            .patch(&format!("{}/{}/cancel", BOOKINGS_PATH, booking_id), None)
            .await;

        match expect_success(result, CANCEL_FAILED) {
            Ok(_) => {
                self.state.send_modify(|state| {
                    state
                        .bookings
                        .iter_mut()
                        .filter(|booking| booking.id == booking_id)
                        .for_each(|booking| booking.status = BookingStatus::Cancelled);
                });
                info!(booking_id, "booking cancelled");
                Ok(())
            }
            Err(err) => {
                warn!(booking_id, error = %err, "booking cancellation failed");
                if self.policy.reconcile_on_cancel_failure {
                    self.fetch(false).await;
                }
                Err(err)
            }
        }
    }

    pub async fn refresh(&self) {
        self.fetch(true).await;
    }

    pub fn snapshot(&self) -> BookingState {
        self.state.borrow().clone()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.state.borrow().bookings.clone()
    }

    pub fn filtered(&self, filter: &BookingFilter) -> Vec<Booking> {
        filter_bookings(&self.state.borrow().bookings, filter)
    }

    pub fn subscribe(&self) -> watch::Receiver<BookingState> {
        self.state.subscribe()
    }
}

fn decode_bookings(data: Option<Value>) -> Result<Vec<Booking>, serde_json::Error> {
    decode_list(data, "bookings")
}
