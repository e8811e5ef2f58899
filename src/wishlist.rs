// Wishlist synchronization unit.
//
// Fetch failures are swallowed: the collection is emptied and `error` stays
// `None`, so an empty wishlist and a failed fetch look the same to callers.
// Removal is applied locally as soon as the server accepts it; a rejected
// removal triggers a reconciling fetch before the error is raised.

use crate::api::ApiClient;
use crate::error::{expect_success, SyncError};
use crate::models::{decode_list, RawWishlistEntry, WishlistItem};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const WISHLIST_PATH: &str = "/wishlist/";

const ADD_FAILED: &str = "Failed to add to wishlist";
const REMOVE_FAILED: &str = "Failed to remove from wishlist";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WishlistState {
    pub items: Vec<WishlistItem>,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
}

pub struct WishlistStore {
    client: Arc<dyn ApiClient>,
    state: watch::Sender<WishlistState>,
}

impl WishlistStore {
    /// Creates the store and performs the initial fetch.
    pub async fn mount(client: Arc<dyn ApiClient>) -> Self {
        let store = Self::unmounted(client);
        store.fetch(false).await;
        store
    }

    fn unmounted(client: Arc<dyn ApiClient>) -> Self {
        let (state, _) = watch::channel(WishlistState::default());
        Self { client, state }
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

        let items = match self.client.get(WISHLIST_PATH).await {
            Ok(response) if response.success => match decode_items(response.data) {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = %e, "discarding undecodable wishlist payload");
                    Vec::new()
                }
            },
            Ok(response) => {
                warn!(error = %response.error_or("no message"), "wishlist fetch rejected");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "wishlist fetch failed");
                Vec::new()
            }
        };

        debug!(count = items.len(), is_refresh, "wishlist fetched");
        self.state.send_modify(|state| {
            state.items = items;
            state.loading = false;
            state.refreshing = false;
        });
    }

    /// Adds a hotel and reloads the whole wishlist. Returns the server's data.
    pub async fn add_to_wishlist(&self, hotel_id: &str) -> Result<Value, SyncError> {
        let result = self
            .client
            .post(WISHLIST_PATH, json!({ "hotelId": hotel_id }))
            .await;
        let response = expect_success(result, ADD_FAILED).map_err(|err| {
            warn!(hotel_id, error = %err, "add to wishlist failed");
            err
        })?;

        info!(hotel_id, "hotel added to wishlist");
        self.fetch(false).await;
        Ok(response.data.unwrap_or(Value::Null))
    }

    pub async fn remove_from_wishlist(&self, item_id: &str) -> Result<(), SyncError> {
        let result = self.client.delete(&format!("/wishlist/{}", item_id)).await;

        match expect_success(result, REMOVE_FAILED) {
            Ok(_) => {
                self.state
                    .send_modify(|state| state.items.retain(|item| item.id != item_id));
                info!(item_id, "wishlist entry removed");
                Ok(())
            }
            Err(err) => {
                warn!(item_id, error = %err, "remove from wishlist failed, reloading");
                self.fetch(false).await;
                Err(err)
            }
        }
    }

    /// No-op when no entry references `hotel_id`.
    pub async fn remove_from_wishlist_by_hotel_id(&self, hotel_id: &str) -> Result<(), SyncError> {
        let entry_id = self.entry_id_for(hotel_id);

        match entry_id {
            Some(entry_id) => self.remove_from_wishlist(&entry_id).await,
            None => {
                debug!(hotel_id, "hotel not in wishlist, nothing to remove");
                Ok(())
            }
        }
    }

    /// Flips membership of `hotel_id` and returns the new membership.
    pub async fn toggle(&self, hotel_id: &str) -> Result<bool, SyncError> {
        if self.is_in_wishlist(hotel_id) {
            self.remove_from_wishlist_by_hotel_id(hotel_id).await?;
        } else {
            self.add_to_wishlist(hotel_id).await?;
        }
        Ok(self.is_in_wishlist(hotel_id))
    }

    pub fn is_in_wishlist(&self, hotel_id: &str) -> bool {
        self.state
            .borrow()
            .items
            .iter()
            .any(|item| item.hotel_id == hotel_id)
    }

    // Pull-to-refresh
    pub async fn refresh(&self) {
        self.fetch(true).await;
    }

    pub async fn force_refresh(&self) {
        self.fetch(false).await;
    }

    pub fn snapshot(&self) -> WishlistState {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<WishlistItem> {
        self.state.borrow().items.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WishlistState> {
        self.state.subscribe()
    }

    fn entry_id_for(&self, hotel_id: &str) -> Option<String> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|item| item.hotel_id == hotel_id)
            .map(|item| item.id.clone())
    }
}

fn decode_items(data: Option<Value>) -> Result<Vec<WishlistItem>, serde_json::Error> {
    let entries = decode_list::<RawWishlistEntry>(data, "items")?;

    // Entry ids must be unique locally; the first occurrence wins
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        if seen.insert(entry.id.clone()) {
            items.push(WishlistItem::from(entry));
        } else {
            debug!(id = %entry.id, "dropping duplicate wishlist entry");
        }
    }
    Ok(items)
}
