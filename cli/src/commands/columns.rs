use anyhow::Result;
use suave_spatial::table::ColumnKind;

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::ColumnsArgs) -> Result<()> {
    let loaded = super::load(&args.source, cli.verbose)?;
    let table = &loaded.table;

    println!("{} rows", table.height());
    for column in table.schema() {
        let kind = match column.kind {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Geometry => "geometry",
        };
        let nulls = if column.nullable { " (has empty cells)" } else { "" };
        println!("{:<40} {kind}{nulls}", column.name);
    }

    Ok(())
}
