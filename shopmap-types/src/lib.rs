//! # shopmap-types
//!
//! Data types shared by the shopmap store locator core.
//!
//! This crate provides the plain data that flows between the map core and its
//! collaborators:
//!
//! - **Shop types**: `ShopPoint`, `Product`
//! - **Viewport types**: `Bounds`, `Viewport`, `ViewportEvent`
//! - **Search types**: `ProductMatch`, `PlaceMatch`, `PlatformStats`
//! - **Report types**: `ReportKind`, `ReportRequest`
//!
//! All types are serializable with Serde and use the `geo` crate's `Point`
//! for coordinates (x = longitude, y = latitude).
//!
//! ## Examples
//!
//! ```rust
//! use shopmap_types::shop::ShopPoint;
//!
//! let shop = ShopPoint::new("Żabka", "zabka", "Marszałkowska 1, Warszawa", 52.2297, 21.0122);
//! assert_eq!(shop.position().x(), 21.0122);
//! ```

pub mod report;
pub mod search;
pub mod shop;
pub mod viewport;

pub use report::{ReportKind, ReportRequest, ReportSource};
pub use search::{PlaceMatch, PlatformStats, ProductMatch};
pub use shop::{Product, ShopPoint};
pub use viewport::{Bounds, Viewport, ViewportEvent, zoom_level};
