// Composition root: created on app start, shut down on app exit, and handed
// to whichever UI layer needs the stores.

use crate::api::{ApiClient, ClientConfig, ClientError, HttpApiClient};
use crate::bookings::{BookingStore, SyncPolicy};
use crate::session::{Navigator, RoutingGuard, SessionHandle};
use crate::wishlist::WishlistStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct AppServices {
    client: Arc<dyn ApiClient>,
    session: SessionHandle,
    wishlist: Arc<WishlistStore>,
    bookings: Arc<BookingStore>,
    guard: JoinHandle<()>,
}

impl AppServices {
    /// Mounts both stores (initial fetches run concurrently) and starts the
    /// routing guard on `session`.
    pub async fn start(
        client: Arc<dyn ApiClient>,
        session: SessionHandle,
        navigator: Arc<dyn Navigator>,
        policy: SyncPolicy,
    ) -> Self {
        let (wishlist, bookings) = futures::join!(
            WishlistStore::mount(client.clone()),
            BookingStore::mount_with_policy(client.clone(), policy)
        );
        let guard = RoutingGuard::new(navigator).spawn(session.subscribe());

        info!(
            wishlist = wishlist.items().len(),
            bookings = bookings.bookings().len(),
            "app services started"
        );

        Self {
            client,
            session,
            wishlist: Arc::new(wishlist),
            bookings: Arc::new(bookings),
            guard,
        }
    }

    // Same as `start`, over HTTP
    pub async fn connect(
        config: ClientConfig,
        session: SessionHandle,
        navigator: Arc<dyn Navigator>,
        policy: SyncPolicy,
    ) -> Result<Self, ClientError> {
        let client = Arc::new(HttpApiClient::new(config)?);
        Ok(Self::start(client, session, navigator, policy).await)
    }

    pub fn client(&self) -> Arc<dyn ApiClient> {
        self.client.clone()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn wishlist(&self) -> Arc<WishlistStore> {
        self.wishlist.clone()
    }

    pub fn bookings(&self) -> Arc<BookingStore> {
        self.bookings.clone()
    }

    pub async fn shutdown(self) {
        self.guard.abort();
        // Aborting yields a cancelled JoinError, which is expected here
        let _ = self.guard.await;
        info!("app services stopped");
    }
}
