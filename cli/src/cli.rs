use std::path::PathBuf;

/// Spatial statistics for SuAVE surveys
#[derive(clap::Parser, Debug)]
#[command(name = "suave-spatial", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// List the columns of a survey and which ones are numeric
    Columns(ColumnsArgs),

    /// Fit a geographically-weighted regression and compute Moran's I of its residuals
    Gwr(GwrArgs),

    /// Add a column computed from existing numeric columns
    Derive(DeriveArgs),

    /// Upload a CSV file to the survey host as a new survey
    Publish(PublishArgs),
}

/// Where the survey comes from: a local file, or the host's launch parameters.
#[derive(clap::Args, Debug)]
pub struct SourceArgs {
    /// Local CSV file to read instead of fetching from the survey host
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Survey CSV file name on the host (the `csv` launch parameter)
    #[arg(long, required_unless_present = "input")]
    pub csv: Option<String>,

    /// URL the survey is viewed at (the `surveyurl` launch parameter)
    #[arg(long)]
    pub survey_url: Option<String>,
}

/// Publishing the result as a new survey.
#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    /// Upload the augmented table as a new survey
    #[arg(long)]
    pub publish: bool,

    /// Name of the new survey, defaults to a name derived from the CSV file name
    #[arg(long)]
    pub survey_name: Option<String>,

    /// Survey host user (the `user` launch parameter)
    #[arg(long)]
    pub user: Option<String>,

    /// Survey host password
    #[arg(long, env = "SUAVE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Session cookie header to use instead of logging in
    #[arg(long, conflicts_with = "password")]
    pub cookie: Option<String>,

    /// Deep-zoom collection to attach (the `dzc` launch parameter)
    #[arg(long)]
    pub dzc: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(clap::Args, Debug)]
pub struct GwrArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Dependent variable
    #[arg(short, long)]
    pub dependent: String,

    /// Independent variables, in coefficient order
    #[arg(short = 'x', long = "independent", required = true, num_args = 1..)]
    pub independent: Vec<String>,

    /// JSON file with model settings
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output CSV of the augmented table, defaults to "./augmented.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Also write the local coefficients as CSV
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub coefficients: Option<PathBuf>,

    /// Also write fitted values and residuals as CSV
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub residuals: Option<PathBuf>,

    /// Also draw an SVG map
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub map: Option<PathBuf>,

    /// Column to color the map by, defaults to the residuals
    #[arg(long, requires = "map")]
    pub map_column: Option<String>,

    #[command(flatten)]
    pub upload: UploadArgs,
}

#[derive(clap::Args, Debug)]
pub struct DeriveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Column to transform, or the first operand
    pub column: String,

    /// Unary operation (log, sqrt, abs, square, negate); applied to the first operand with --op
    #[arg(long)]
    pub unary: Option<String>,

    /// Binary operator (+, -, *, /)
    #[arg(long, requires = "with")]
    pub op: Option<String>,

    /// Second operand
    #[arg(long)]
    pub with: Option<String>,

    /// Unary operation applied to the second operand
    #[arg(long, requires = "with")]
    pub with_unary: Option<String>,

    /// Name of the new variable
    #[arg(short, long, default_value = "new_var")]
    pub name: String,

    /// Decimal places to round to
    #[arg(long, default_value_t = 2)]
    pub round: u32,

    /// Output CSV of the augmented table, defaults to "./augmented.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub upload: UploadArgs,
}

#[derive(clap::Args, Debug)]
pub struct PublishArgs {
    /// CSV file to upload
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// URL of the survey the file was derived from
    #[arg(long)]
    pub survey_url: Option<String>,

    #[command(flatten)]
    pub upload: UploadArgs,
}
