use std::path::PathBuf;

use anyhow::{Context, Result};
use suave_spatial::{render, PipelineConfig, RegressionSpec, Session};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::GwrArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    }
    .with_verbose(cli.verbose);

    let loaded = super::load(&args.source, cli.verbose)?;
    let mut session = Session::new(loaded.csv_name.clone());
    session.load(loaded.table);

    let spec = RegressionSpec::new(args.dependent.trim(), args.independent.iter().map(|name| name.trim()));
    let outcome = suave_spatial::run(&mut session, &spec, &config)?;

    let model = &outcome.model;
    println!("bandwidth: {} nearest neighbours", model.bandwidth);
    println!("AICc: {:.4}", model.aicc);
    println!("R²: {:.4}", model.r2);
    println!("effective parameters: {:.3}", model.effective_params);
    println!("rows used: {} (dropped {}, without geometry {})",
        model.len(), outcome.metadata.rows_dropped, outcome.metadata.rows_without_geometry);
    match (&outcome.moran, &outcome.metadata.autocorrelation_error) {
        (Some(moran), _) => {
            println!("Moran's I ({:?}): {:.4} (expected {:.4})", moran.weights, moran.global_i, moran.expected_i);
            if let Some(p) = moran.p_value {
                println!("pseudo p-value ({} permutations): {p:.4}", moran.permutations);
            }
        }
        (None, Some(reason)) => eprintln!("warning: Moran's I skipped: {reason}"),
        (None, None) => {}
    }

    let output = args.output.clone().unwrap_or_else(|| PathBuf::from("augmented.csv"));
    super::write_file(&output, &outcome.augmented.to_csv_bytes()?, cli.verbose)?;
    if let Some(path) = &args.coefficients {
        super::write_file(path, &outcome.coefficients_csv()?, cli.verbose)?;
    }
    if let Some(path) = &args.residuals {
        super::write_file(path, &outcome.residuals_csv()?, cli.verbose)?;
    }
    if let Some(path) = &args.map {
        let column = args.map_column.clone()
            .unwrap_or_else(|| suave_spatial::assemble::numeric_column_name(suave_spatial::assemble::RESIDUAL));
        render::write_svg_file(&outcome.geo()?, Some(&column), path)?;
        if cli.verbose > 0 { eprintln!("[render] wrote {}", path.display()); }
    }

    if args.upload.publish {
        let location = loaded.location.as_ref()
            .context("[publish] --survey-url is required to publish")?;
        super::publish_table(&outcome.augmented, &args.upload, &location.referer(), &loaded.csv_name, cli.verbose)?;
    }

    Ok(())
}
