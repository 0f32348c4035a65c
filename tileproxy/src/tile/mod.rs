//! Tile identity.
//!
//! Provides the [`TileKey`] type that names a single tile of a single upstream
//! provider. The key doubles as the cache key and as the shape of the HTTP
//! path (`provider/z/x/y`), so encoding and decoding live here as well.

mod key;

pub use key::{TileKey, TileKeyError, MAX_ZOOM};

pub(crate) use key::is_valid_provider_id;
