//! currybot — a chat bot for currency conversion and paginated listings.
//!
//! The core is a snapshot cache with a time-to-live refresh policy over a
//! remote pricing API ([`cache`], [`snapshot`], [`pricing`]) and a
//! book-style paginated embed driven by reaction events ([`book`]). The
//! [`bot`] module ties both to a chat gateway abstracted in [`transport`].

/// Book-style paginated embeds with per-user navigation sessions.
pub mod book;
/// Command grammar and event dispatch.
pub mod bot;
/// TTL refresh policy over the snapshot store.
pub mod cache;
/// Settings loading.
pub mod config;
/// Currency conversion and catalog listing.
pub mod convert;
/// Remote pricing API client.
pub mod pricing;
/// Timestamped on-disk dataset snapshots.
pub mod snapshot;
/// Chat gateway abstraction and local console adapter.
pub mod transport;
