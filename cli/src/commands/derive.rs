use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use suave_spatial::derive::{self, BinaryOp, Expression, Operand, UnaryOp};

fn parse_unary(op: &Option<String>) -> Result<Option<UnaryOp>> {
    op.as_deref().map(|op| op.parse::<UnaryOp>().map_err(|e| anyhow!("[derive] {e}"))).transpose()
}

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::DeriveArgs) -> Result<()> {
    let expr = match (&args.op, &args.with) {
        (Some(op), Some(with)) => {
            let op = op.parse::<BinaryOp>().map_err(|e| anyhow!("[derive] {e}"))?;
            let mut left = Operand::column(args.column.trim());
            left.transform = parse_unary(&args.unary)?;
            let mut right = Operand::column(with.trim());
            right.transform = parse_unary(&args.with_unary)?;
            Expression::Binary { left, op, right }
        }
        (None, None) => {
            let op = parse_unary(&args.unary)?
                .context("[derive] give --unary, or --op with --with")?;
            Expression::Unary { op, column: args.column.trim().to_string() }
        }
        _ => bail!("[derive] --op and --with go together"),
    };

    let loaded = super::load(&args.source, cli.verbose)?;
    let (table, report) = derive::apply(&loaded.table, &expr, &args.name, args.round)?;

    println!("{}: {} values computed, {} left empty", report.column, report.computed, report.failures.len());
    if cli.verbose > 0 {
        for (row, reason) in &report.failures {
            eprintln!("[derive] row {row}: {reason}");
        }
    }

    let output = args.output.clone().unwrap_or_else(|| PathBuf::from("augmented.csv"));
    super::write_file(&output, &table.to_csv_bytes()?, cli.verbose)?;

    if args.upload.publish {
        let location = loaded.location.as_ref()
            .context("[publish] --survey-url is required to publish")?;
        super::publish_table(&table, &args.upload, &location.referer(), &loaded.csv_name, cli.verbose)?;
    }

    Ok(())
}
