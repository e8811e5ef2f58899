// Client-side data layer for the hotel booking app

// Export modules for each part of the client
pub mod api;
pub mod app;
pub mod bookings;
pub mod error;
pub mod filters;
pub mod models;
pub mod session;
pub mod wishlist;

// Re-export key types for convenience
pub use api::{ApiClient, ApiError, ApiResponse, ClientConfig, ClientError, HttpApiClient, Method};
pub use app::AppServices;
pub use bookings::{BookingState, BookingStore, SyncPolicy};
pub use error::SyncError;
pub use filters::{filter_bookings, search_wishlist, sort_wishlist, BookingFilter, WishlistSort};
pub use models::{Booking, BookingStatus, NewBooking, WishlistItem};
pub use session::{
    decide_route, Navigator, RouteTarget, RoutingGuard, SessionHandle, SessionState, User,
};
pub use wishlist::{WishlistState, WishlistStore};
