use arrow::array::Array;
use std::{env, path::Path, process::exit};
use tripscraper::schema::{canonical_field, DESCRIPTION_KEY};
use tripscraper::sink::read_parquet;

fn main() {
    // Expect exactly one CLI argument: path to an output parquet file.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <PARQUET_FILE>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect(Path::new(&args[1])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print the schema, row count and per-column null counts of an output table,
/// flagging columns that are not part of the canonical schema.
fn inspect(path: &Path) -> anyhow::Result<()> {
    let batch = read_parquet(path)?;
    let file_size = std::fs::metadata(path)?.len();

    println!("=== Output table: {} ===", path.display());
    println!("Total rows:        {}", batch.num_rows());
    println!("File-size on disk: {} bytes", file_size);
    println!();

    println!("=== Columns ===");
    let schema = batch.schema();
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let semantic = canonical_field(field.name())
            .map(|f| f.ty.to_string())
            .unwrap_or_else(|| "not canonical".to_string());
        println!(
            "- {:<22} | {:<10} | {:<28} | nulls: {:<8} | {}",
            field.name(),
            semantic,
            format!("{}", field.data_type()),
            column.null_count(),
            field.metadata().get(DESCRIPTION_KEY).map(String::as_str).unwrap_or("")
        );
    }
    Ok(())
}
