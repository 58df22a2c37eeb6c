/*!
 * Turn cell aggregates into a map.
 *
 * Cells are colored on a linear scale from the lowest to the highest fire probability in the set.
 * When every cell has the same probability, or there are no cells, the scale collapses and every
 * cell gets the low end color.
 */
use crate::{
    error::ForesightResult,
    grid::CellAggregate,
    kml::KmlFile,
};
use serde_json::{json, Value};
use std::{
    fmt::Write,
    path::{Path, PathBuf},
};
use strum::{Display, EnumString};

const FILL_OPACITY: f64 = 0.7;
const OUTLINE_COLOR: &str = "ff000000";
const OUTLINE_WIDTH: f64 = 0.3;

/// Consumes cell aggregates and produces some kind of visual artifact.
pub trait MapRenderer {
    /// A handle to whatever was produced, e.g. the path of a file.
    type Artifact;

    fn render(&mut self, cells: &[CellAggregate]) -> ForesightResult<Self::Artifact>;
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// As a web color, e.g. `#e74c3c`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// As a KML color with the given opacity, KML orders the channels aabbggrr.
    pub fn to_kml(self, opacity: f64) -> String {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("{:02x}{:02x}{:02x}{:02x}", alpha, self.2, self.1, self.0)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// Linear color scale cyan, yellow, red.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    const LOW: Rgb = Rgb(0x00, 0xFF, 0xFF);
    const MID: Rgb = Rgb(0xF1, 0xC4, 0x0F);
    const HIGH: Rgb = Rgb(0xE7, 0x4C, 0x3C);

    /// A scale spanning the fire probabilities of `cells`.
    pub fn for_cells(cells: &[CellAggregate]) -> Self {
        let (min, max) = cells
            .iter()
            .map(|c| c.fire_prob)
            .filter(|p| p.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            });

        if min > max {
            ColorScale { min: 0.0, max: 0.0 }
        } else {
            ColorScale { min, max }
        }
    }

    /// Does this scale span a range of values?
    pub fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }

    /// The color for a value, values outside the scale get the color of the nearest end.
    pub fn color(&self, value: f64) -> Rgb {
        if self.is_degenerate() || !value.is_finite() {
            return Self::LOW;
        }

        let t = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if t < 0.5 {
            Self::LOW.lerp(Self::MID, t * 2.0)
        } else {
            Self::MID.lerp(Self::HIGH, t * 2.0 - 1.0)
        }
    }
}

/// The kinds of files the renderers can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    #[strum(serialize = "kml")]
    Kml,
    #[strum(serialize = "geojson", serialize = "json")]
    GeoJson,
}

impl OutputFormat {
    /// Pick a format from a file extension, KML unless it looks like GeoJSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or(OutputFormat::Kml)
    }
}

fn describe_cell(buf: &mut String, cell: &CellAggregate) {
    buf.clear();
    let _ = write!(
        buf,
        concat!(
            "<h3>Fire Probability: {:.2}%</h3>",
            "<h3>H3 Cell: {}</h3>",
            "<h3>Latitude: {:.6}</h3>",
            "<h3>Longitude: {:.6}</h3>",
            "<h3>Points: {}</h3>",
        ),
        cell.fire_prob * 100.0,
        cell.cell_id,
        cell.center.lat,
        cell.center.lon,
        cell.count,
    );
}

/// Writes a KML file with one filled hexagon per cell.
#[derive(Debug, Clone)]
pub struct KmlRenderer {
    path: PathBuf,
}

impl KmlRenderer {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        KmlRenderer {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MapRenderer for KmlRenderer {
    type Artifact = PathBuf;

    fn render(&mut self, cells: &[CellAggregate]) -> ForesightResult<PathBuf> {
        let scale = ColorScale::for_cells(cells);

        let mut kfile = KmlFile::create(&self.path)?;

        let summary = format!(
            "{} cells, fire probability {:.4} - {:.4}",
            cells.len(),
            scale.min,
            scale.max
        );
        kfile.start_folder("Fire Risk", &summary)?;

        let mut description = String::new();
        for cell in cells {
            describe_cell(&mut description, cell);
            let color = scale.color(cell.fire_prob).to_kml(FILL_OPACITY);
            kfile.write_cell_polygon(cell, &description, &color, OUTLINE_COLOR, OUTLINE_WIDTH)?;
        }

        kfile.finish_folder()?;
        kfile.finish()?;

        log::info!("wrote {} cells to {}", cells.len(), self.path.display());

        Ok(self.path.clone())
    }
}

/// Writes a GeoJSON FeatureCollection with one polygon feature per cell.
#[derive(Debug, Clone)]
pub struct GeoJsonRenderer {
    path: PathBuf,
}

impl GeoJsonRenderer {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        GeoJsonRenderer {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Build the FeatureCollection without writing it anywhere.
    pub fn feature_collection(cells: &[CellAggregate]) -> Value {
        let scale = ColorScale::for_cells(cells);

        let features: Vec<Value> = cells
            .iter()
            .map(|cell| {
                let ring: Vec<[f64; 2]> = cell.boundary.iter().map(|c| [c.lon, c.lat]).collect();

                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [ring],
                    },
                    "properties": {
                        "fire_prob": cell.fire_prob,
                        "cell_id": cell.cell_id.to_string(),
                        "lat": cell.center.lat,
                        "lon": cell.center.lon,
                        "count": cell.count,
                        "fill": scale.color(cell.fire_prob).to_hex(),
                        "fill-opacity": FILL_OPACITY,
                    },
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }
}

impl MapRenderer for GeoJsonRenderer {
    type Artifact = PathBuf;

    fn render(&mut self, cells: &[CellAggregate]) -> ForesightResult<PathBuf> {
        let collection = Self::feature_collection(cells);

        let f = std::fs::File::create(&self.path)?;
        let mut output = std::io::BufWriter::new(f);
        serde_json::to_writer(&mut output, &collection)?;
        std::io::Write::flush(&mut output)?;

        log::info!("wrote {} cells to {}", cells.len(), self.path.display());

        Ok(self.path.clone())
    }
}
