/*!
 * Geographic coordinates.
 *
 * Most of the heavy lifting is done by the `geo` and `h3o` crates, this is the small common
 * currency passed between them and the rest of the crate.
 */
use h3o::LatLng;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Create a new coordinate from a latitude and longitude in degrees.
    pub fn new(lat: f64, lon: f64) -> Self {
        Coord { lat, lon }
    }

    /// Both components are neither NaN nor infinite.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Are these two coordinates within `eps` degrees of each other in both directions?
    pub fn is_close(&self, other: Coord, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lon - other.lon).abs() <= eps
    }

    /// Convert to a point for planar geometry, x is longitude and y is latitude.
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }

    /// Convert into a coordinate the hexagonal index understands.
    ///
    /// Returns `None` for non-finite coordinates.
    pub fn to_lat_lng(self) -> Option<LatLng> {
        LatLng::new(self.lat, self.lon).ok()
    }
}

impl From<LatLng> for Coord {
    fn from(ll: LatLng) -> Self {
        Coord {
            lat: ll.lat(),
            lon: ll.lng(),
        }
    }
}

impl From<geo::Coord<f64>> for Coord {
    fn from(c: geo::Coord<f64>) -> Self {
        Coord { lat: c.y, lon: c.x }
    }
}
