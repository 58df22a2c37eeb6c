/*!
 * The region of interest.
 *
 * A boundary is a single closed ring of longitude/latitude vertices with no holes. The Morocco
 * boundary is embedded in the crate and built once on first use.
 */
use crate::{coord::Coord, error::ForesightError};
use geo::{Contains, LineString, Polygon};
use h3o::{
    geom::{ContainmentMode, TilerBuilder},
    CellIndex, LatLng, Resolution,
};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet as HashSet;
use serde_json::{json, Value};

/// Outline of Morocco as (longitude, latitude) pairs. The first and last vertex coincide.
#[rustfmt::skip]
const MOROCCO_RING: [[f64; 2]; 64] = [
    [-5.193863, 35.755182], [-4.591006, 35.330712], [-3.640057, 35.399855],
    [-2.604306, 35.179093], [-2.169914, 35.168396], [-1.792986, 34.527919],
    [-1.733455, 33.919713], [-1.388049, 32.864015], [-1.124551, 32.651522],
    [-1.307899, 32.262889], [-2.616605, 32.094346], [-3.06898, 31.724498],
    [-3.647498, 31.637294], [-3.690441, 30.896952], [-4.859646, 30.501188],
    [-5.242129, 30.000443], [-6.060632, 29.7317], [-7.059228, 29.579228],
    [-8.674116, 28.841289], [-8.66559, 27.656426], [-8.817809, 27.656426],
    [-8.817828, 27.656426], [-8.794884, 27.120696], [-9.413037, 27.088476],
    [-9.735343, 26.860945], [-10.189424, 26.860945], [-10.551263, 26.990808],
    [-11.392555, 26.883424], [-11.71822, 26.104092], [-12.030759, 26.030866],
    [-12.500963, 24.770116], [-13.89111, 23.691009], [-14.221168, 22.310163],
    [-14.630833, 21.86094], [-14.750955, 21.5006], [-17.002962, 21.420734],
    [-17.020428, 21.42231], [-16.973248, 21.885745], [-16.589137, 22.158234],
    [-16.261922, 22.67934], [-16.326414, 23.017768], [-15.982611, 23.723358],
    [-15.426004, 24.359134], [-15.089332, 24.520261], [-14.824645, 25.103533],
    [-14.800926, 25.636265], [-14.43994, 26.254418], [-13.773805, 26.618892],
    [-13.139942, 27.640148], [-13.121613, 27.654148], [-12.618837, 28.038186],
    [-11.688919, 28.148644], [-10.900957, 28.832142], [-10.399592, 29.098586],
    [-9.564811, 29.933574], [-9.814718, 31.177736], [-9.434793, 32.038096],
    [-9.300693, 32.564679], [-8.657476, 33.240245], [-7.654178, 33.697065],
    [-6.912544, 34.110476], [-6.244342, 35.145865], [-5.929994, 35.759988],
    [-5.193863, 35.755182],
];

static_assertions::assert_impl_all!(Boundary: Send, Sync);

static MOROCCO: Lazy<Boundary> = Lazy::new(|| Boundary::build("Morocco", &MOROCCO_RING));

/// A named, closed polygon describing a region of interest.
#[derive(Debug, Clone)]
pub struct Boundary {
    name: String,
    ring: Vec<[f64; 2]>,
    polygon: Polygon<f64>,
}

impl Boundary {
    /// The embedded boundary of Morocco.
    pub fn morocco() -> &'static Boundary {
        &MOROCCO
    }

    /// Build a boundary from a closed ring of (longitude, latitude) pairs.
    ///
    /// The ring needs at least four vertices, the first and last must be identical, and every
    /// vertex must be finite.
    pub fn from_ring(name: &str, ring: &[[f64; 2]]) -> Result<Self, ForesightError> {
        if ring.len() < 4 {
            return Err(ForesightError::InvalidBoundary(
                "a ring needs at least four vertices",
            ));
        }

        if ring.first() != ring.last() {
            return Err(ForesightError::InvalidBoundary(
                "first and last vertex must coincide",
            ));
        }

        if ring.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ForesightError::InvalidBoundary("vertices must be finite"));
        }

        Ok(Self::build(name, ring))
    }

    fn build(name: &str, ring: &[[f64; 2]]) -> Self {
        let exterior: LineString<f64> = ring.iter().map(|&[lon, lat]| (lon, lat)).collect();
        let polygon = Polygon::new(exterior, vec![]);

        Boundary {
            name: name.to_owned(),
            ring: ring.to_vec(),
            polygon,
        }
    }

    /// The name of the region.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The closed ring of (longitude, latitude) vertices.
    pub fn ring(&self) -> &[[f64; 2]] {
        &self.ring
    }

    /// The boundary as a planar polygon, x is longitude and y is latitude.
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// The boundary as a GeoJSON Feature.
    pub fn geojson_feature(&self) -> Value {
        json!({
            "type": "Feature",
            "properties": { "name": self.name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [self.ring],
            },
        })
    }

    /// Is the coordinate strictly inside the boundary?
    ///
    /// Points on an edge or vertex are not contained. Non-finite coordinates are never contained.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.is_finite() && self.polygon.contains(&coord.to_point())
    }

    /// Does the coverage at the cell's resolution include this cell?
    ///
    /// Same rule as [Boundary::coverage], the center of the cell must be inside, but it only
    /// looks at one cell, so the cost does not depend on the resolution.
    pub fn covers_cell(&self, cell: CellIndex) -> bool {
        self.contains(Coord::from(LatLng::from(cell)))
    }

    /// Every hexagonal cell at `resolution` whose center lies inside the boundary.
    ///
    /// The size of this set grows about sevenfold with each resolution, at resolution 7 and up it
    /// is expensive to build for a country. Use [Boundary::covers_cell] for membership tests.
    pub fn coverage(&self, resolution: Resolution) -> Result<HashSet<CellIndex>, ForesightError> {
        let mut tiler = TilerBuilder::new(resolution)
            .containment_mode(ContainmentMode::ContainsCentroid)
            .build();

        tiler
            .add(self.polygon.clone())
            .map_err(|err| ForesightError::InvalidGeometry(err.to_string()))?;

        Ok(tiler.into_coverage().collect())
    }
}
