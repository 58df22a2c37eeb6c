/*!
 * The whole batch, from raw rows to a rendered map.
 *
 * Boundary → containment filter → scorer → hex grid aggregation → renderer. Each step runs to
 * completion before the next starts, and nothing is shared between runs except the read-only
 * boundary and model.
 */
use crate::{
    boundary::Boundary,
    error::{ForesightError, ForesightResult},
    filter::{count_non_finite, filter_points},
    grid::{check_resolution, generate_h3_grid, CellAggregate},
    render::MapRenderer,
    row::{RawRow, ScoredRow},
    scorer::{MissingFeaturePolicy, RiskScorer},
};
use log::{info, warn};

/// H3 resolution used when the caller has no preference.
pub const DEFAULT_RESOLUTION: i32 = 6;

/// Settings for a single run of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// H3 resolution, 0 - 15.
    pub resolution: i32,
    /// What to do with rows that can't be scored.
    pub missing_features: MissingFeaturePolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            resolution: DEFAULT_RESOLUTION,
            missing_features: MissingFeaturePolicy::Abort,
        }
    }
}

impl PipelineOptions {
    pub fn with_resolution(resolution: i32) -> Self {
        PipelineOptions {
            resolution,
            ..Self::default()
        }
    }
}

/**
 * Validate and score rows, preserving their order.
 *
 * #Arguments
 * * rows - rows tagged with their position in the input table.
 * * scorer - the model.
 * * policy - whether a row with missing features aborts the run or is left out.
 */
pub fn score_rows<S: RiskScorer + ?Sized>(
    rows: Vec<(usize, RawRow)>,
    scorer: &S,
    policy: MissingFeaturePolicy,
) -> Result<Vec<ScoredRow>, ForesightError> {
    let mut scored = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for (idx, raw) in rows {
        let features = match raw.validate(idx) {
            Ok(features) => features,
            Err(err) if policy == MissingFeaturePolicy::Skip => {
                warn!("skipping row: {}", err);
                skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        let predicted_probability = scorer.score(&features)?;

        scored.push(ScoredRow {
            features,
            predicted_probability,
        });
    }

    if skipped > 0 {
        warn!("{} rows skipped for missing features", skipped);
    }

    Ok(scored)
}

/// Run every step except rendering.
pub fn score_and_aggregate<S: RiskScorer + ?Sized>(
    rows: Vec<RawRow>,
    options: &PipelineOptions,
    boundary: &Boundary,
    scorer: &S,
) -> Result<Vec<CellAggregate>, ForesightError> {
    // Fail before any row is looked at.
    check_resolution(options.resolution)?;

    let total = rows.len();
    let non_finite = count_non_finite(&rows);
    if non_finite > 0 {
        warn!(
            "{} of {} rows have missing or non-finite coordinates and were dropped",
            non_finite, total
        );
    }

    let indexed: Vec<(usize, RawRow)> = rows.into_iter().enumerate().collect();
    let inside = filter_points(indexed, boundary);
    info!("{} of {} rows inside {}", inside.len(), total, boundary.name());

    let scored = score_rows(inside, scorer, options.missing_features)?;
    info!("scored {} rows", scored.len());

    let cells = generate_h3_grid(boundary, &scored, options.resolution)?;
    info!(
        "{} cells at resolution {}",
        cells.len(),
        options.resolution
    );

    Ok(cells)
}

/// Take a table of rows in Morocco all the way to a rendered map.
pub fn run_pipeline<S, R>(
    rows: Vec<RawRow>,
    options: &PipelineOptions,
    scorer: &S,
    renderer: &mut R,
) -> ForesightResult<R::Artifact>
where
    S: RiskScorer + ?Sized,
    R: MapRenderer + ?Sized,
{
    let cells = score_and_aggregate(rows, options, Boundary::morocco(), scorer)?;
    renderer.render(&cells)
}
