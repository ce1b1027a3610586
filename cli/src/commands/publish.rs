use anyhow::{Context, Result};
use suave_spatial::{survey::SurveyLocation, FeatureTable};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::PublishArgs) -> Result<()> {
    let table = FeatureTable::read_csv(&args.file)?;
    let csv_name = args.file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .context("[publish] input path has no file name")?;
    let location = SurveyLocation::new(args.survey_url.as_deref(), &csv_name)?;

    super::publish_table(&table, &args.upload, &location.referer(), &csv_name, cli.verbose)
}
