use clap::Parser;
use foresight::{
    read_rows, run_pipeline, ForesightResult, GeoJsonRenderer, KmlRenderer, LightGbmModel,
    MissingFeaturePolicy, OutputFormat, PipelineOptions, DEFAULT_RESOLUTION,
};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Map wildfire risk over Morocco on a hexagonal grid.
///
/// This program reads a CSV table of weather and land features, scores every row inside Morocco
/// with a trained model, averages the scores over H3 cells, and writes the cells out as KML or
/// GeoJSON.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "firemap")]
#[clap(author, version, about)]
struct FireMapOptionsInit {
    /// The path to the CSV file with one row per location.
    input: PathBuf,

    /// The path to the LightGBM text model file.
    ///
    /// If this is not specified, then the program will check for it in the "FORESIGHT_MODEL"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "FORESIGHT_MODEL")]
    model: PathBuf,

    /// The path to the map file to produce from this run.
    ///
    /// If this is not specified, then the program will create one automatically by replacing the
    /// file extension on the input file with "*.kml". A ".geojson" or ".json" extension produces
    /// GeoJSON instead of KML.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// The H3 resolution of the grid, 0 (coarsest) to 15 (finest).
    #[clap(short, long)]
    #[clap(default_value_t=DEFAULT_RESOLUTION)]
    #[clap(allow_hyphen_values = true)]
    resolution: i32,

    /// Leave out rows with missing features instead of stopping.
    #[clap(long)]
    skip_incomplete: bool,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct FireMapOptionsChecked {
    /// The path to the input table.
    input: PathBuf,

    /// The path to the model file.
    model: PathBuf,

    /// The path to the map file.
    output: PathBuf,

    /// The format of the map file.
    format: OutputFormat,

    /// Settings passed along to the pipeline.
    pipeline: PipelineOptions,

    /// Verbose output
    verbose: bool,
}

impl Display for FireMapOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "       Input: {}", self.input.display())?;
        writeln!(f, "       Model: {}", self.model.display())?;
        writeln!(f, "      Output: {} ({})", self.output.display(), self.format)?;
        writeln!(f, "  Resolution: {}", self.pipeline.resolution)?;
        writeln!(
            f,
            "  Incomplete: {:?}",
            self.pipeline.missing_features
        )?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> ForesightResult<FireMapOptionsChecked> {
    let FireMapOptionsInit {
        input,
        model,
        output,
        resolution,
        skip_incomplete,
        verbose,
    } = FireMapOptionsInit::parse();

    let output = match output {
        Some(v) => v,
        None => {
            let mut clone = input.clone();
            clone.set_extension("kml");
            clone
        }
    };

    let format = OutputFormat::from_path(&output);

    let missing_features = if skip_incomplete {
        MissingFeaturePolicy::Skip
    } else {
        MissingFeaturePolicy::Abort
    };

    let checked = FireMapOptionsChecked {
        input,
        model,
        output,
        format,
        pipeline: PipelineOptions {
            resolution,
            missing_features,
        },
        verbose,
    };

    if verbose {
        println!("{}", checked);
    }

    Ok(checked)
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> ForesightResult<()> {
    let opts = parse_args()?;

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    //
    // Load the model and the data.
    //
    let model = LightGbmModel::load(&opts.model)?;
    log::info!(
        "loaded {} trees from {}",
        model.num_trees(),
        opts.model.display()
    );

    let rows = read_rows(&opts.input)?;

    //
    // Score, aggregate, and draw.
    //
    let written = match opts.format {
        OutputFormat::Kml => {
            let mut renderer = KmlRenderer::new(&opts.output);
            run_pipeline(rows, &opts.pipeline, &model, &mut renderer)?
        }
        OutputFormat::GeoJson => {
            let mut renderer = GeoJsonRenderer::new(&opts.output);
            run_pipeline(rows, &opts.pipeline, &model, &mut renderer)?
        }
    };

    log::info!("map written to {}", written.display());

    Ok(())
}
