/*!
 * Rows of the input table.
 *
 * A [RawRow] is what comes out of a CSV file, every field may be missing. Before a row is scored it
 * is validated into a [FeatureRow], which has every value the scorer may ask for.
 */
use crate::{coord::Coord, error::ForesightError};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// The names of every feature the scorer may ask for.
pub const FEATURE_NAMES: [&str; 13] = [
    "temperature_max",
    "wind_speed_max",
    "precipitation_total",
    "relative_humidity",
    "soil_moisture",
    "evapotranspiration",
    "shortwave_radiation",
    "day_of_year",
    "day_of_week",
    "is_weekend",
    "longitude",
    "latitude",
    "sea_distance",
];

/// Position of a feature in [FEATURE_NAMES], and so in [FeatureRow::values].
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|&f| f == name)
}

/// Anything with a geographic location.
pub trait Located {
    fn coord(&self) -> Coord;
}

/// A row tagged with its position in the input table.
impl<T: Located> Located for (usize, T) {
    fn coord(&self) -> Coord {
        self.1.coord()
    }
}

/// A row as read from the input table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub temperature_max: Option<f64>,
    pub wind_speed_max: Option<f64>,
    pub precipitation_total: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub evapotranspiration: Option<f64>,
    pub shortwave_radiation: Option<f64>,
    pub day_of_year: Option<f64>,
    pub day_of_week: Option<f64>,
    pub is_weekend: Option<f64>,
    pub sea_distance: Option<f64>,
}

impl Located for RawRow {
    /// Missing coordinates come back as NaN, which no boundary contains.
    fn coord(&self) -> Coord {
        Coord {
            lat: self.latitude.unwrap_or(f64::NAN),
            lon: self.longitude.unwrap_or(f64::NAN),
        }
    }
}

impl RawRow {
    /// Check that every feature is present.
    ///
    /// `row` is the position of this row in the input table, it is only used for the error.
    pub fn validate(&self, row: usize) -> Result<FeatureRow, ForesightError> {
        let need = |value: Option<f64>, feature: &'static str| {
            value.ok_or(ForesightError::MissingFeature { row, feature })
        };

        Ok(FeatureRow {
            temperature_max: need(self.temperature_max, "temperature_max")?,
            wind_speed_max: need(self.wind_speed_max, "wind_speed_max")?,
            precipitation_total: need(self.precipitation_total, "precipitation_total")?,
            relative_humidity: need(self.relative_humidity, "relative_humidity")?,
            soil_moisture: need(self.soil_moisture, "soil_moisture")?,
            evapotranspiration: need(self.evapotranspiration, "evapotranspiration")?,
            shortwave_radiation: need(self.shortwave_radiation, "shortwave_radiation")?,
            day_of_year: need(self.day_of_year, "day_of_year")?,
            day_of_week: need(self.day_of_week, "day_of_week")?,
            is_weekend: need(self.is_weekend, "is_weekend")?,
            longitude: need(self.longitude, "longitude")?,
            latitude: need(self.latitude, "latitude")?,
            sea_distance: need(self.sea_distance, "sea_distance")?,
        })
    }
}

/// A complete set of model inputs for one location and day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Maximum temperature, °C.
    pub temperature_max: f64,
    /// Maximum wind speed, km/h.
    pub wind_speed_max: f64,
    /// Total precipitation, mm.
    pub precipitation_total: f64,
    /// Relative humidity, %.
    pub relative_humidity: f64,
    /// Soil moisture as a fraction 0 - 1.
    pub soil_moisture: f64,
    pub evapotranspiration: f64,
    /// Shortwave radiation, W/m².
    pub shortwave_radiation: f64,
    /// 1 - 366
    pub day_of_year: f64,
    /// 1 is Monday, 7 is Sunday.
    pub day_of_week: f64,
    /// 1 on Saturday and Sunday, 0 otherwise.
    pub is_weekend: f64,
    pub longitude: f64,
    pub latitude: f64,
    /// Distance from the sea, km.
    pub sea_distance: f64,
}

impl Located for FeatureRow {
    fn coord(&self) -> Coord {
        Coord {
            lat: self.latitude,
            lon: self.longitude,
        }
    }
}

impl FeatureRow {
    /// Look up a feature by its exact name.
    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|idx| self.values()[idx])
    }

    /// Every feature in the order of [FEATURE_NAMES].
    pub fn values(&self) -> [f64; 13] {
        [
            self.temperature_max,
            self.wind_speed_max,
            self.precipitation_total,
            self.relative_humidity,
            self.soil_moisture,
            self.evapotranspiration,
            self.shortwave_radiation,
            self.day_of_year,
            self.day_of_week,
            self.is_weekend,
            self.longitude,
            self.latitude,
            self.sea_distance,
        ]
    }

    /// Overwrite the calendar features.
    pub fn set_calendar(&mut self, cal: CalendarFeatures) {
        self.day_of_year = cal.day_of_year;
        self.day_of_week = cal.day_of_week;
        self.is_weekend = cal.is_weekend;
    }
}

/// The date derived model inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarFeatures {
    pub day_of_year: f64,
    pub day_of_week: f64,
    pub is_weekend: f64,
}

impl From<NaiveDate> for CalendarFeatures {
    fn from(date: NaiveDate) -> Self {
        let weekday = date.weekday();
        let is_weekend = matches!(weekday, Weekday::Sat | Weekday::Sun);

        CalendarFeatures {
            day_of_year: date.ordinal() as f64,
            day_of_week: weekday.number_from_monday() as f64,
            is_weekend: if is_weekend { 1.0 } else { 0.0 },
        }
    }
}

/// A row along with the probability the scorer assigned it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRow {
    pub features: FeatureRow,
    pub predicted_probability: f64,
}

impl Located for ScoredRow {
    fn coord(&self) -> Coord {
        self.features.coord()
    }
}

impl ScoredRow {
    /// Build a row that only carries a location and a probability.
    pub fn at(lat: f64, lon: f64, predicted_probability: f64) -> Self {
        ScoredRow {
            features: FeatureRow {
                latitude: lat,
                longitude: lon,
                ..FeatureRow::default()
            },
            predicted_probability,
        }
    }
}
