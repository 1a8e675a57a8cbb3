// SPDX-License-Identifier: MPL-2.0

//! Snapshot gallery
//!
//! - [`Catalog`]: ordered listing and deletion over storage
//! - [`FavoritesStore`]: persisted favourite flags
//! - [`ViewerSession`] / [`CatalogView`]: the viewer and list screens, kept
//!   consistent through [`ViewerOutcome`]

pub mod catalog;
pub mod favorites;
pub mod viewer;

pub use catalog::{Catalog, CatalogEntry, CatalogListing};
pub use favorites::FavoritesStore;
pub use viewer::{CatalogView, ResumeAction, ViewerOutcome, ViewerSession, ViewerStep};
