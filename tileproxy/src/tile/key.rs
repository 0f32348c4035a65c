//! Canonical tile key.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Highest zoom level accepted.
///
/// At zoom 30 the grid is 2^30 tiles wide, the largest power of two whose
/// indices still fit comfortably in a `u32`.
pub const MAX_ZOOM: u8 = 30;

/// Errors produced while building or parsing a [`TileKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileKeyError {
    /// Provider id is empty or contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid provider id: {0:?}")]
    InvalidProvider(String),

    /// Zoom level is above [`MAX_ZOOM`].
    #[error("zoom level {0} exceeds maximum of {MAX_ZOOM}")]
    InvalidZoom(u8),

    /// Column or row index lies outside the grid for the zoom level.
    #[error("tile {x}/{y} is outside the {size}x{size} grid at zoom {z}")]
    OutOfRange { z: u8, x: u32, y: u32, size: u64 },

    /// A path segment could not be parsed as a number.
    #[error("invalid {field} segment: {value:?}")]
    InvalidSegment { field: &'static str, value: String },

    /// The encoded form does not have exactly four segments.
    #[error("expected provider/z/x/y, got {0:?}")]
    WrongShape(String),
}

/// Identifies one tile of one upstream provider.
///
/// Keys are immutable; equality and hashing are structural. The provider id is
/// reference counted so cloning a key (which the cache and the coalescer do on
/// every request) never copies the string.
///
/// # Example
///
/// ```
/// use tileproxy::tile::TileKey;
///
/// let key = TileKey::new("osm", 3, 4, 5).unwrap();
/// assert_eq!(key.encode(), "osm/3/4/5");
/// assert_eq!(TileKey::decode("osm/3/4/5").unwrap(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    provider: Arc<str>,
    z: u8,
    x: u32,
    y: u32,
}

impl TileKey {
    /// Create a validated tile key.
    ///
    /// # Errors
    ///
    /// Fails when the provider id is malformed, the zoom exceeds
    /// [`MAX_ZOOM`], or `x`/`y` are not below `2^z`.
    pub fn new(provider: &str, z: u8, x: u32, y: u32) -> Result<Self, TileKeyError> {
        if !is_valid_provider_id(provider) {
            return Err(TileKeyError::InvalidProvider(provider.to_string()));
        }
        if z > MAX_ZOOM {
            return Err(TileKeyError::InvalidZoom(z));
        }
        let size = grid_size(z);
        if u64::from(x) >= size || u64::from(y) >= size {
            return Err(TileKeyError::OutOfRange { z, x, y, size });
        }

        Ok(Self {
            provider: Arc::from(provider),
            z,
            x,
            y,
        })
    }

    /// Build a key from raw path segments.
    ///
    /// The `y` segment may carry a file extension (`12.png`), which is
    /// ignored: clients commonly request tiles by file name.
    pub fn from_parts(provider: &str, z: &str, x: &str, y: &str) -> Result<Self, TileKeyError> {
        let y = match y.split_once('.') {
            Some((stem, _ext)) => stem,
            None => y,
        };

        let z = parse_segment::<u8>("z", z)?;
        let x = parse_segment::<u32>("x", x)?;
        let y = parse_segment::<u32>("y", y)?;

        Self::new(provider, z, x, y)
    }

    /// Parse the `provider/z/x/y` form produced by [`encode`](Self::encode).
    pub fn decode(encoded: &str) -> Result<Self, TileKeyError> {
        let mut parts = encoded.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(provider), Some(z), Some(x), Some(y), None) => {
                let z = parse_segment::<u8>("z", z)?;
                let x = parse_segment::<u32>("x", x)?;
                let y = parse_segment::<u32>("y", y)?;
                Self::new(provider, z, x, y)
            }
            _ => Err(TileKeyError::WrongShape(encoded.to_string())),
        }
    }

    /// Render the key as `provider/z/x/y`.
    pub fn encode(&self) -> String {
        format!("{}/{}/{}/{}", self.provider, self.z, self.x, self.y)
    }

    /// Provider id.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Zoom level.
    pub fn z(&self) -> u8 {
        self.z
    }

    /// Column index.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row index (XYZ scheme, 0 at the north edge).
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Row index in the TMS scheme (0 at the south edge).
    pub fn tms_y(&self) -> u32 {
        // grid_size(z) - 1 fits u32 for z <= MAX_ZOOM
        (grid_size(self.z) - 1 - u64::from(self.y)) as u32
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.provider, self.z, self.x, self.y)
    }
}

/// Returns true for ids made only of ASCII alphanumerics, `-` and `_`.
pub(crate) fn is_valid_provider_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn grid_size(z: u8) -> u64 {
    1u64 << z
}

fn parse_segment<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, TileKeyError> {
    // FromStr for integers accepts a leading '+', which would break the round trip
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TileKeyError::InvalidSegment {
            field,
            value: value.to_string(),
        });
    }
    value.parse::<T>().map_err(|_| TileKeyError::InvalidSegment {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_valid_key() {
        let key = TileKey::new("osm", 18, 100000, 125184).unwrap();
        assert_eq!(key.provider(), "osm");
        assert_eq!(key.z(), 18);
        assert_eq!(key.x(), 100000);
        assert_eq!(key.y(), 125184);
    }

    #[test]
    fn test_zoom_zero_has_single_tile() {
        assert!(TileKey::new("osm", 0, 0, 0).is_ok());
        assert!(matches!(
            TileKey::new("osm", 0, 1, 0),
            Err(TileKeyError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_out_of_range_rejected() {
        // At zoom 3 the grid is 8x8
        assert!(TileKey::new("osm", 3, 7, 7).is_ok());
        assert!(TileKey::new("osm", 3, 8, 0).is_err());
        assert!(TileKey::new("osm", 3, 0, 8).is_err());
    }

    #[test]
    fn test_zoom_above_max_rejected() {
        assert_eq!(
            TileKey::new("osm", MAX_ZOOM + 1, 0, 0),
            Err(TileKeyError::InvalidZoom(MAX_ZOOM + 1))
        );
    }

    #[test]
    fn test_max_zoom_edge() {
        let max_index = (1u32 << MAX_ZOOM) - 1;
        assert!(TileKey::new("osm", MAX_ZOOM, max_index, max_index).is_ok());
    }

    #[test]
    fn test_invalid_provider_rejected() {
        assert!(matches!(
            TileKey::new("", 1, 0, 0),
            Err(TileKeyError::InvalidProvider(_))
        ));
        assert!(matches!(
            TileKey::new("a/b", 1, 0, 0),
            Err(TileKeyError::InvalidProvider(_))
        ));
        assert!(TileKey::new("zmni_lks-92", 1, 0, 0).is_ok());
    }

    #[test]
    fn test_encode_format() {
        let key = TileKey::new("zmni", 12, 2310, 1207).unwrap();
        assert_eq!(key.encode(), "zmni/12/2310/1207");
        assert_eq!(key.to_string(), key.encode());
    }

    #[test]
    fn test_decode_wrong_shape() {
        assert!(matches!(
            TileKey::decode("osm/1/0"),
            Err(TileKeyError::WrongShape(_))
        ));
        assert!(matches!(
            TileKey::decode("osm/1/0/0/0"),
            Err(TileKeyError::WrongShape(_))
        ));
    }

    #[test]
    fn test_decode_rejects_signs_and_garbage() {
        assert!(TileKey::decode("osm/+1/0/0").is_err());
        assert!(TileKey::decode("osm/1/-0/0").is_err());
        assert!(TileKey::decode("osm/1/0/abc").is_err());
        assert!(TileKey::decode("osm/1//0").is_err());
    }

    #[test]
    fn test_from_parts_strips_extension() {
        let key = TileKey::from_parts("osm", "3", "4", "5.png").unwrap();
        assert_eq!(key, TileKey::new("osm", 3, 4, 5).unwrap());
    }

    #[test]
    fn test_from_parts_reports_field() {
        let err = TileKey::from_parts("osm", "3", "x", "5").unwrap_err();
        assert_eq!(
            err,
            TileKeyError::InvalidSegment {
                field: "x",
                value: "x".to_string()
            }
        );
    }

    #[test]
    fn test_from_parts_zoom_overflow() {
        // 300 does not fit in u8
        assert!(matches!(
            TileKey::from_parts("osm", "300", "0", "0"),
            Err(TileKeyError::InvalidSegment { field: "z", .. })
        ));
    }

    #[test]
    fn test_tms_y_flips_rows() {
        let key = TileKey::new("osm", 2, 1, 0).unwrap();
        assert_eq!(key.tms_y(), 3);
        let key = TileKey::new("osm", 2, 1, 3).unwrap();
        assert_eq!(key.tms_y(), 0);
    }

    #[test]
    fn test_equal_keys_hash_equal() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(TileKey::new("osm", 5, 1, 2).unwrap());
        set.insert(TileKey::decode("osm/5/1/2").unwrap());
        assert_eq!(set.len(), 1);
    }

    fn valid_key() -> impl Strategy<Value = TileKey> {
        ("[a-z0-9_-]{1,12}", 0u8..=MAX_ZOOM).prop_flat_map(|(provider, z)| {
            let max = (1u64 << z) as u32;
            (Just(provider), Just(z), 0..max.max(1), 0..max.max(1))
                .prop_map(|(p, z, x, y)| TileKey::new(&p, z, x, y).unwrap())
        })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(key in valid_key()) {
            prop_assert_eq!(TileKey::decode(&key.encode()).unwrap(), key);
        }
    }
}
