use foresight::{
    check_resolution, filter_points, generate_h3_grid, run_pipeline, score_and_aggregate,
    Boundary, CellAggregate, Coord, FeatureRow, ForesightError, GeoJsonRenderer, KmlRenderer,
    LightGbmModel, MissingFeaturePolicy, PipelineOptions, RawRow, RiskLevel, RiskScorer,
    ScoredRow,
};
use h3o::{CellIndex, LatLng, Resolution};
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
 *                                          Helpers
 *-----------------------------------------------------------------------------------------------*/
// Marrakech, well inside the country.
const MARRAKECH: (f64, f64) = (31.63, -8.0);
const MADRID: (f64, f64) = (40.42, -3.70);
const ALGIERS: (f64, f64) = (36.75, 3.06);
const MID_ATLANTIC: (f64, f64) = (33.0, -12.0);

fn raw(lat: f64, lon: f64, temperature_max: f64) -> RawRow {
    RawRow {
        longitude: Some(lon),
        latitude: Some(lat),
        temperature_max: Some(temperature_max),
        wind_speed_max: Some(20.0),
        precipitation_total: Some(0.0),
        relative_humidity: Some(40.0),
        soil_moisture: Some(0.2),
        evapotranspiration: Some(3.0),
        shortwave_radiation: Some(250.0),
        day_of_year: Some(150.0),
        day_of_week: Some(3.0),
        is_weekend: Some(0.0),
        sea_distance: Some(50.0),
    }
}

fn by_temperature(row: &FeatureRow) -> f64 {
    row.temperature_max / 100.0
}

fn center_of(lat: f64, lon: f64, res: Resolution) -> (CellIndex, LatLng) {
    let cell = LatLng::new(lat, lon).unwrap().to_cell(res);
    (cell, LatLng::from(cell))
}

fn sorted(mut cells: Vec<CellAggregate>) -> Vec<CellAggregate> {
    cells.sort_by_key(|c| c.cell_id);
    cells
}

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("foresight-{}-{}", std::process::id(), name));
    path
}

/*-------------------------------------------------------------------------------------------------
 *                                     Boundary and filter
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_filter_keeps_only_points_in_morocco() {
    let morocco = Boundary::morocco();

    let rows = vec![
        ScoredRow::at(MADRID.0, MADRID.1, 0.9),
        ScoredRow::at(MARRAKECH.0, MARRAKECH.1, 0.3),
        ScoredRow::at(ALGIERS.0, ALGIERS.1, 0.9),
        ScoredRow::at(MID_ATLANTIC.0, MID_ATLANTIC.1, 0.9),
        ScoredRow::at(f64::NAN, -8.0, 0.9),
        ScoredRow::at(34.02, -6.84, 0.6), // Rabat
    ];

    let kept = filter_points(rows, morocco);
    let probs: Vec<f64> = kept.iter().map(|r| r.predicted_probability).collect();
    assert_eq!(probs, vec![0.3, 0.6]);
}

#[test]
fn test_coverage_grows_with_resolution() {
    let morocco = Boundary::morocco();

    let mut last = 0;
    for res in 2..=5 {
        let res = check_resolution(res).unwrap();
        let count = morocco.coverage(res).unwrap().len();
        assert!(count >= last, "{} cells at {} but {} before", count, res, last);
        last = count;
    }

    assert!(last > 0);
}

/*-------------------------------------------------------------------------------------------------
 *                                        Aggregation
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_single_row_at_cell_center() {
    let (cell, center) = center_of(MARRAKECH.0, MARRAKECH.1, Resolution::Six);
    let rows = vec![ScoredRow::at(center.lat(), center.lng(), 0.42)];

    let cells = generate_h3_grid(Boundary::morocco(), &rows, 6).unwrap();

    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].cell_id, cell);
    assert_eq!(cells[0].fire_prob, 0.42);
    assert_eq!(cells[0].count, 1);
    assert!(cells[0].center.is_close(Coord::from(center), 1.0e-9));
    assert!(cells[0].boundary.len() >= 7);
    assert_eq!(cells[0].boundary.first(), cells[0].boundary.last());
}

#[test]
fn test_cell_probability_is_mean() {
    let (cell, center) = center_of(MARRAKECH.0, MARRAKECH.1, Resolution::Six);
    let (lat, lon) = (center.lat(), center.lng());

    // A few meters apart, all in the same cell.
    let rows = vec![
        ScoredRow::at(lat, lon, 0.2),
        ScoredRow::at(lat + 1.0e-4, lon, 0.4),
        ScoredRow::at(lat, lon - 1.0e-4, 0.9),
    ];

    let cells = generate_h3_grid(Boundary::morocco(), &rows, 6).unwrap();

    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].cell_id, cell);
    assert_eq!(cells[0].count, 3);
    assert!((cells[0].fire_prob - 0.5).abs() < 1.0e-12);
}

#[test]
fn test_aggregation_is_idempotent() {
    let rows: Vec<ScoredRow> = (0..50)
        .map(|i| {
            let i = i as f64;
            ScoredRow::at(30.0 + i * 0.05, -9.0 + i * 0.06, (i % 10.0) / 10.0)
        })
        .collect();

    let first = sorted(generate_h3_grid(Boundary::morocco(), &rows, 5).unwrap());
    let second = sorted(generate_h3_grid(Boundary::morocco(), &rows, 5).unwrap());

    assert!(!first.is_empty());
    assert_eq!(first, second);

    let total: usize = first.iter().map(|c| c.count).sum();
    assert!(total <= rows.len());
}

#[test]
fn test_cells_are_restricted_to_boundary() {
    let res = Resolution::Six;
    let (cell_a, center_a) = center_of(MARRAKECH.0, MARRAKECH.1, res);

    let cell_b = cell_a
        .grid_disk::<Vec<_>>(1)
        .into_iter()
        .find(|&c| c != cell_a)
        .unwrap();
    let center_b = LatLng::from(cell_b);

    // Vector from the center of A to the center of B, in (lon, lat).
    let (a_lon, a_lat) = (center_a.lng(), center_a.lat());
    let (d_lon, d_lat) = (center_b.lng() - a_lon, center_b.lat() - a_lat);
    // A narrow perpendicular.
    let (n_lon, n_lat) = (-d_lat * 0.05, d_lon * 0.05);

    let along = |t: f64| (a_lon + t * d_lon, a_lat + t * d_lat);

    // A thin strip from just behind the center of A to well past the edge shared with B, but
    // stopping short of the center of B.
    let (s_lon, s_lat) = along(-0.1);
    let (e_lon, e_lat) = along(0.7);
    let ring = [
        [s_lon - n_lon, s_lat - n_lat],
        [e_lon - n_lon, e_lat - n_lat],
        [e_lon + n_lon, e_lat + n_lat],
        [s_lon + n_lon, s_lat + n_lat],
        [s_lon - n_lon, s_lat - n_lat],
    ];
    let strip = Boundary::from_ring("strip", &ring).unwrap();

    let coverage = strip.coverage(res).unwrap();
    assert!(coverage.contains(&cell_a));
    assert!(!coverage.contains(&cell_b));

    let (in_a_lon, in_a_lat) = along(0.2);
    let (in_b_lon, in_b_lat) = along(0.65);
    let rows = vec![
        ScoredRow::at(in_a_lat, in_a_lon, 0.3),
        ScoredRow::at(in_b_lat, in_b_lon, 0.8),
    ];

    // Both points are inside the strip.
    let rows = filter_points(rows, &strip);
    assert_eq!(rows.len(), 2);

    // But only A's center is.
    let cells = generate_h3_grid(&strip, &rows, 6).unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].cell_id, cell_a);
    assert_eq!(cells[0].count, 1);
    assert_eq!(cells[0].fire_prob, 0.3);
}

#[test]
fn test_pipeline_at_finest_resolutions() {
    let rows = vec![
        raw(MARRAKECH.0, MARRAKECH.1, 30.0),
        raw(34.02, -6.84, 60.0),
        raw(MADRID.0, MADRID.1, 90.0),
    ];

    for res in 7..=15 {
        let opts = PipelineOptions::with_resolution(res);
        let cells =
            score_and_aggregate(rows.clone(), &opts, Boundary::morocco(), &by_temperature).unwrap();
        assert_eq!(cells.len(), 2, "resolution {}", res);
    }
}

#[test]
fn test_empty_input_is_not_an_error() {
    let cells = generate_h3_grid(Boundary::morocco(), &[], 6).unwrap();
    assert!(cells.is_empty());

    // Every row outside.
    let rows = vec![ScoredRow::at(MADRID.0, MADRID.1, 0.5)];
    let rows = filter_points(rows, Boundary::morocco());
    let cells = generate_h3_grid(Boundary::morocco(), &rows, 6).unwrap();
    assert!(cells.is_empty());
}

#[test]
fn test_invalid_resolution() {
    let rows = vec![ScoredRow::at(MARRAKECH.0, MARRAKECH.1, 0.5)];

    for res in [-1, 16] {
        assert_eq!(
            generate_h3_grid(Boundary::morocco(), &rows, res).unwrap_err(),
            ForesightError::InvalidResolution(res)
        );
    }

    assert!(generate_h3_grid(Boundary::morocco(), &rows, 0).is_ok());
    assert_eq!(generate_h3_grid(Boundary::morocco(), &rows, 15).unwrap().len(), 1);
}

/*-------------------------------------------------------------------------------------------------
 *                                         Pipeline
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_pipeline_with_stub_scorer() {
    let (_, center) = center_of(MARRAKECH.0, MARRAKECH.1, Resolution::Six);
    let rows = vec![
        raw(MADRID.0, MADRID.1, 40.0),
        raw(center.lat(), center.lng(), 30.0),
        raw(center.lat() + 1.0e-4, center.lng(), 50.0),
        raw(34.02, -6.84, 20.0),
    ];

    let opts = PipelineOptions::with_resolution(6);
    let cells = score_and_aggregate(rows, &opts, Boundary::morocco(), &by_temperature).unwrap();

    assert_eq!(cells.len(), 2);

    let marrakech = cells.iter().find(|c| c.count == 2).unwrap();
    assert!((marrakech.fire_prob - 0.4).abs() < 1.0e-12);

    let rabat = cells.iter().find(|c| c.count == 1).unwrap();
    assert!((rabat.fire_prob - 0.2).abs() < 1.0e-12);
}

#[test]
fn test_pipeline_missing_feature() {
    let mut incomplete = raw(34.02, -6.84, 30.0);
    incomplete.soil_moisture = None;

    // Rows outside are never validated.
    let mut outside = raw(MADRID.0, MADRID.1, 30.0);
    outside.sea_distance = None;

    let rows = vec![outside, raw(MARRAKECH.0, MARRAKECH.1, 30.0), incomplete];

    let opts = PipelineOptions::with_resolution(5);
    let err =
        score_and_aggregate(rows.clone(), &opts, Boundary::morocco(), &by_temperature).unwrap_err();
    assert_eq!(
        err,
        ForesightError::MissingFeature {
            row: 2,
            feature: "soil_moisture"
        }
    );

    let opts = PipelineOptions {
        resolution: 5,
        missing_features: MissingFeaturePolicy::Skip,
    };
    let cells = score_and_aggregate(rows, &opts, Boundary::morocco(), &by_temperature).unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].count, 1);
}

#[test]
fn test_run_pipeline_rejects_resolution() {
    let path = temp_path("rejected.kml");
    let mut renderer = KmlRenderer::new(&path);

    let rows = vec![raw(MARRAKECH.0, MARRAKECH.1, 30.0)];
    let err = run_pipeline(
        rows,
        &PipelineOptions::with_resolution(16),
        &by_temperature,
        &mut renderer,
    )
    .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ForesightError>(),
        Some(&ForesightError::InvalidResolution(16))
    );

    // Nothing rendered.
    assert!(!path.exists());
}

#[test]
fn test_run_pipeline_kml() {
    let path = temp_path("risk.kml");
    let mut renderer = KmlRenderer::new(&path);

    let rows = vec![
        raw(MARRAKECH.0, MARRAKECH.1, 30.0),
        raw(34.02, -6.84, 80.0),
        raw(MADRID.0, MADRID.1, 99.0),
    ];
    let written = run_pipeline(
        rows,
        &PipelineOptions::default(),
        &by_temperature,
        &mut renderer,
    )
    .unwrap();
    assert_eq!(written, path);

    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(text.starts_with("<?xml"));
    assert!(text.trim_end().ends_with("</kml>"));
    assert_eq!(text.matches("<Placemark>").count(), 2);
    assert_eq!(text.matches("<Polygon>").count(), 2);

    // Lowest and highest cells sit at opposite ends of the color scale.
    assert!(text.contains("ffff00</color>"));
    assert!(text.contains("3c4ce7</color>"));
}

#[test]
fn test_run_pipeline_geojson_empty() {
    let path = temp_path("empty.geojson");
    let mut renderer = GeoJsonRenderer::new(&path);

    let rows = vec![raw(MADRID.0, MADRID.1, 30.0)];
    run_pipeline(
        rows,
        &PipelineOptions::default(),
        &by_temperature,
        &mut renderer,
    )
    .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["type"], "FeatureCollection");
    assert_eq!(value["features"].as_array().map(|f| f.len()), Some(0));
}

/*-------------------------------------------------------------------------------------------------
 *                                           Model
 *-----------------------------------------------------------------------------------------------*/
const STUMP: &str = "tree
version=v3
num_class=1
num_tree_per_iteration=1
max_feature_idx=1
objective=binary sigmoid:1
feature_names=temperature_max relative_humidity

Tree=0
num_leaves=2
split_feature=0
threshold=35
decision_type=2
left_child=-1
right_child=-2
leaf_value=-2 2
shrinkage=1

end of trees
";

#[test]
fn test_model_file_drives_pipeline() {
    let model_path = temp_path("stump.txt");
    std::fs::write(&model_path, STUMP).unwrap();
    let model = LightGbmModel::load(&model_path).unwrap();
    std::fs::remove_file(&model_path).unwrap();

    let cool = raw(MARRAKECH.0, MARRAKECH.1, 25.0).validate(0).unwrap();
    let cool = model.score(&cool).unwrap();
    let hot = raw(MARRAKECH.0, MARRAKECH.1, 45.0).validate(0).unwrap();
    let hot = model.score(&hot).unwrap();

    assert_eq!(RiskLevel::from_probability(cool), RiskLevel::Low);
    assert_eq!(RiskLevel::from_probability(hot), RiskLevel::High);

    let rows = vec![raw(MARRAKECH.0, MARRAKECH.1, 45.0)];
    let cells = score_and_aggregate(
        rows,
        &PipelineOptions::default(),
        Boundary::morocco(),
        &model,
    )
    .unwrap();

    assert_eq!(cells.len(), 1);
    assert!((cells[0].fire_prob - hot).abs() < 1.0e-12);
}
