/*!
 * Aggregate point predictions onto the H3 hexagonal grid.
 *
 * Every row is hashed to the cell that contains it. Only cells that belong to the coverage of the
 * boundary are kept, so a point that sneaks inside the boundary while its cell's center does not
 * is left out. Surviving rows are averaged per cell.
 */
use crate::{
    boundary::Boundary,
    coord::Coord,
    error::ForesightError,
    row::{Located, ScoredRow},
};
use h3o::{CellIndex, LatLng, Resolution};
use rustc_hash::FxHashMap as HashMap;
use serde::Serialize;

/// Convert a caller supplied resolution into an H3 resolution without clamping.
pub fn check_resolution(resolution: i32) -> Result<Resolution, ForesightError> {
    u8::try_from(resolution)
        .ok()
        .and_then(|res| Resolution::try_from(res).ok())
        .ok_or(ForesightError::InvalidResolution(resolution))
}

/// The cell containing a coordinate, `None` if the coordinate is not finite.
pub fn cell_for(coord: Coord, resolution: Resolution) -> Option<CellIndex> {
    coord.to_lat_lng().map(|ll| ll.to_cell(resolution))
}

/// The aggregated fire risk of a single hexagonal cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellAggregate {
    /// H3 index of the cell, serialized as its hexadecimal string.
    #[serde(serialize_with = "serialize_cell")]
    pub cell_id: CellIndex,
    /// Mean predicted probability of every row in this cell.
    pub fire_prob: f64,
    /// The number of rows that contributed to `fire_prob`.
    pub count: usize,
    /// The hexagon outline, closed so the first and last vertex are the same.
    #[serde(serialize_with = "serialize_ring")]
    pub boundary: Vec<Coord>,
    /// The center of the cell.
    #[serde(serialize_with = "serialize_coord")]
    pub center: Coord,
}

impl CellAggregate {
    pub(crate) fn new(cell_id: CellIndex, fire_prob: f64, count: usize) -> Self {
        let mut boundary: Vec<Coord> = cell_id.boundary().iter().map(|&ll| ll.into()).collect();
        if let Some(&first) = boundary.first() {
            boundary.push(first);
        }

        let center: Coord = LatLng::from(cell_id).into();

        CellAggregate {
            cell_id,
            fire_prob,
            count,
            boundary,
            center,
        }
    }
}

fn serialize_cell<S: serde::Serializer>(cell: &CellIndex, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(cell)
}

fn serialize_coord<S: serde::Serializer>(coord: &Coord, s: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeTuple;

    let mut tup = s.serialize_tuple(2)?;
    tup.serialize_element(&coord.lat)?;
    tup.serialize_element(&coord.lon)?;
    tup.end()
}

fn serialize_ring<S: serde::Serializer>(ring: &[Coord], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(ring.iter().map(|c| [c.lon, c.lat]))
}

/// Running sum for the mean of one cell.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/**
 * Aggregate scored rows onto the hexagonal grid.
 *
 * #Arguments
 * * boundary - only cells whose center lies inside this boundary are kept.
 * * rows - the scored rows, in any order.
 * * resolution - the H3 resolution, 0 - 15.
 *
 * #Returns
 * One aggregate per occupied cell, in no particular order. An empty vector if no row survives.
 */
pub fn generate_h3_grid(
    boundary: &Boundary,
    rows: &[ScoredRow],
    resolution: i32,
) -> Result<Vec<CellAggregate>, ForesightError> {
    let resolution = check_resolution(resolution)?;

    let mut cells: HashMap<CellIndex, Accumulator> = HashMap::default();
    let mut unindexed = 0;

    for row in rows {
        let cell = match cell_for(row.coord(), resolution) {
            Some(cell) => cell,
            None => {
                unindexed += 1;
                continue;
            }
        };

        let acc = cells.entry(cell).or_default();
        acc.sum += row.predicted_probability;
        acc.count += 1;
    }

    // Coverage is tested once per occupied cell, never built for the whole boundary.
    let occupied = cells.len();
    cells.retain(|&cell, _| boundary.covers_cell(cell));

    if unindexed > 0 {
        log::debug!("skipped {} rows with non-finite coordinates", unindexed);
    }
    if cells.len() < occupied {
        log::debug!(
            "skipped {} cells with centers outside {} at resolution {}",
            occupied - cells.len(),
            boundary.name(),
            resolution
        );
    }

    Ok(cells
        .into_iter()
        .map(|(cell, acc)| CellAggregate::new(cell, acc.sum / acc.count as f64, acc.count))
        .collect())
}
