use hvs_msa::process::{extract, xlsx::read_workbook, Cell, TableLayout};
use std::collections::BTreeMap;
use std::{env, fs, path::Path, process::exit};

fn main() {
    // Expect a workbook path and an optional row limit.
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <XLSX_FILE> [MAX_ROWS]", args[0]);
        exit(1);
    }
    let max_rows = match args.get(2).map(|s| s.parse::<usize>()) {
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            eprintln!("MAX_ROWS must be a number");
            exit(1);
        }
        None => usize::MAX,
    };
    if let Err(e) = inspect_xlsx(Path::new(&args[1]), max_rows) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Print the parsed grid with row/column indices, then what the default
/// layout extracts from it.
fn inspect_xlsx(path: &Path, max_rows: usize) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let source_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "workbook".to_string());
    let table = read_workbook(&source_id, &bytes)?;

    println!("=== Workbook: {} ===", path.display());
    println!("Rows:    {}", table.height());
    println!("Columns: {}", table.width());
    println!();

    println!("=== Grid ===");
    for (r, row) in table.rows.iter().enumerate().take(max_rows) {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_empty())
            .map(|(c, cell)| match cell {
                Cell::Number(n) => format!("[{c}] {n}"),
                Cell::Text(s) => format!("[{c}] {s:?}"),
                Cell::Empty => String::new(),
            })
            .collect();
        println!("{:>5} | {}", r, cells.join("  "));
    }
    println!();

    let layout = TableLayout::default();
    println!("=== Default layout {:?} ===", layout);
    match extract(&table, &layout) {
        Ok(rows) => {
            let mut per_area: BTreeMap<&str, usize> = BTreeMap::new();
            for row in &rows {
                *per_area.entry(row.area_name.as_str()).or_default() += 1;
            }
            println!("Extracted rows: {}", rows.len());
            println!("Areas:          {}", per_area.len());
            for (area, n) in per_area {
                println!("- {:<60} {}", area, n);
            }
        }
        Err(e) => println!("Extraction failed: {}", e),
    }
    Ok(())
}
