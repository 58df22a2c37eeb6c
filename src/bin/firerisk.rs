use chrono::NaiveDate;
use clap::Parser;
use foresight::{
    Boundary, CalendarFeatures, Coord, FeatureRow, ForesightResult, LightGbmModel, RiskLevel,
    RiskScorer,
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
/// Score the wildfire risk for a single set of conditions.
///
/// Any feature not given on the command line takes a typical summer value for central Morocco.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "firerisk")]
#[clap(author, version, about)]
#[clap(allow_negative_numbers = true)]
struct FireRiskOptionsInit {
    /// The path to the LightGBM text model file.
    ///
    /// If this is not specified, then the program will check for it in the "FORESIGHT_MODEL"
    /// environment variable.
    #[clap(short, long)]
    #[clap(env = "FORESIGHT_MODEL")]
    model: PathBuf,

    /// Maximum temperature (°C).
    #[clap(long, default_value_t = 30.0)]
    temperature_max: f64,

    /// Maximum wind speed (km/h).
    #[clap(long, default_value_t = 20.0)]
    wind_speed_max: f64,

    /// Total precipitation (mm).
    #[clap(long, default_value_t = 0.0)]
    precipitation_total: f64,

    /// Relative humidity (%).
    #[clap(long, default_value_t = 40.0)]
    relative_humidity: f64,

    /// Soil moisture (m³/m³).
    #[clap(long, default_value_t = 0.2)]
    soil_moisture: f64,

    /// Evapotranspiration (mm).
    #[clap(long, default_value_t = 3.0)]
    evapotranspiration: f64,

    /// Shortwave radiation (W/m²).
    #[clap(long, default_value_t = 250.0)]
    shortwave_radiation: f64,

    /// Day of the year, 1 - 366.
    #[clap(long, default_value_t = 150.0)]
    day_of_year: f64,

    /// Day of the week, 1 is Monday and 7 is Sunday.
    #[clap(long, default_value_t = 3.0)]
    day_of_week: f64,

    /// Is it a weekend day, 0 or 1.
    #[clap(long, default_value_t = 0.0)]
    is_weekend: f64,

    /// Longitude in decimal degrees.
    #[clap(long, default_value_t = -7.0)]
    longitude: f64,

    /// Latitude in decimal degrees.
    #[clap(long, default_value_t = 32.0)]
    latitude: f64,

    /// Distance to the sea (km).
    #[clap(long, default_value_t = 50.0)]
    sea_distance: f64,

    /// Derive the day of the year, day of the week, and weekend flag from a date (YYYY-MM-DD).
    ///
    /// Overrides those three options when given.
    #[clap(short, long)]
    #[clap(parse(try_from_str=parse_date))]
    date: Option<NaiveDate>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|err| format!("Argument is not a valid date (YYYY-MM-DD): {}: {}", date, err))
}

#[derive(Debug)]
struct FireRiskOptionsChecked {
    /// The path to the model file.
    model: PathBuf,

    /// The conditions to score.
    features: FeatureRow,

    /// Verbose output
    verbose: bool,
}

impl Display for FireRiskOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let r = &self.features;

        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "               Model: {}", self.model.display())?;
        writeln!(f, "     temperature_max: {:>10.2}", r.temperature_max)?;
        writeln!(f, "      wind_speed_max: {:>10.2}", r.wind_speed_max)?;
        writeln!(f, " precipitation_total: {:>10.2}", r.precipitation_total)?;
        writeln!(f, "   relative_humidity: {:>10.2}", r.relative_humidity)?;
        writeln!(f, "       soil_moisture: {:>10.3}", r.soil_moisture)?;
        writeln!(f, "  evapotranspiration: {:>10.2}", r.evapotranspiration)?;
        writeln!(f, " shortwave_radiation: {:>10.2}", r.shortwave_radiation)?;
        writeln!(f, "         day_of_year: {:>10}", r.day_of_year)?;
        writeln!(f, "         day_of_week: {:>10}", r.day_of_week)?;
        writeln!(f, "          is_weekend: {:>10}", r.is_weekend)?;
        writeln!(f, "           longitude: {:>10.4}", r.longitude)?;
        writeln!(f, "            latitude: {:>10.4}", r.latitude)?;
        writeln!(f, "        sea_distance: {:>10.2}", r.sea_distance)?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
///
/// If there is missing data, try to fill it in with environment variables.
fn parse_args() -> ForesightResult<FireRiskOptionsChecked> {
    let FireRiskOptionsInit {
        model,
        temperature_max,
        wind_speed_max,
        precipitation_total,
        relative_humidity,
        soil_moisture,
        evapotranspiration,
        shortwave_radiation,
        day_of_year,
        day_of_week,
        is_weekend,
        longitude,
        latitude,
        sea_distance,
        date,
        verbose,
    } = FireRiskOptionsInit::parse();

    let mut features = FeatureRow {
        temperature_max,
        wind_speed_max,
        precipitation_total,
        relative_humidity,
        soil_moisture,
        evapotranspiration,
        shortwave_radiation,
        day_of_year,
        day_of_week,
        is_weekend,
        longitude,
        latitude,
        sea_distance,
    };

    if let Some(date) = date {
        features.set_calendar(CalendarFeatures::from(date));
    }

    let checked = FireRiskOptionsChecked {
        model,
        features,
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
        LevelFilter::Warn
    };
    SimpleLogger::new().with_level(level).init()?;

    let location = Coord::new(opts.features.latitude, opts.features.longitude);
    if !Boundary::morocco().contains(location) {
        log::warn!(
            "({:.4}, {:.4}) is outside {}, the model was not trained there",
            location.lat,
            location.lon,
            Boundary::morocco().name()
        );
    }

    let model = LightGbmModel::load(&opts.model)?;
    let prob = model.score(&opts.features)?;
    let level = RiskLevel::from_probability(prob);

    println!("Fire probability: {:.2}%", prob * 100.0);
    println!(
        "      Risk level: {} - {}",
        Into::<&'static str>::into(level),
        level.advice()
    );

    Ok(())
}
