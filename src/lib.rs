pub use boundary::Boundary;
pub use coord::Coord;
pub use error::{ForesightError, ForesightResult};
pub use filter::{count_non_finite, filter_points};
pub use grid::{check_resolution, generate_h3_grid, CellAggregate};
pub use input::{read_rows, read_rows_from};
pub use kml::{KmlDocument, KmlFile};
pub use model::LightGbmModel;
pub use pipeline::{
    run_pipeline, score_and_aggregate, score_rows, PipelineOptions, DEFAULT_RESOLUTION,
};
pub use render::{ColorScale, GeoJsonRenderer, KmlRenderer, MapRenderer, OutputFormat, Rgb};
pub use row::{
    feature_index, CalendarFeatures, FeatureRow, Located, RawRow, ScoredRow, FEATURE_NAMES,
};
pub use scorer::{MissingFeaturePolicy, RiskLevel, RiskScorer};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod boundary;
mod coord;
mod error;
mod filter;
mod grid;
mod input;
mod kml;
mod model;
mod pipeline;
mod render;
mod row;
mod scorer;
