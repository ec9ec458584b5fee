// workbook_utils.rs
use crate::tsv_utils::TsvBuilder;
use calamine::{open_workbook, Reader, Xls, Xlsx};
use chrono::{DateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::error::Error;
use std::fs::{create_dir_all, metadata, read_dir};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Sheet names containing any of these substrings likely hold abundance data.
pub const MICROBIOME_KEYWORDS: [&str; 6] =
    ["otu", "asv", "abundance", "microbiome", "taxa", "species"];

/// Sheet names containing any of these substrings likely hold sample metadata.
pub const METADATA_KEYWORDS: [&str; 5] =
    ["metadata", "sample", "participant", "demographic", "diet"];

const WORKBOOK_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

const PREVIEW_COLUMNS: usize = 5;

lazy_static! {
    static ref COFFEE_RE: Regex = Regex::new(r"(?i)coffee|caffeine|beverage").unwrap();
}

/// Lists the workbook candidates in `data_dir`, sorted by file name.
fn workbook_candidates(data_dir: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut candidates = Vec::new();

    for entry in read_dir(data_dir)? {
        let entry = entry?;
        let file_path = entry.path();
        if let Some(ext) = file_path.extension().and_then(|s| s.to_str()) {
            if WORKBOOK_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                candidates.push(file_path);
            }
        }
    }

    candidates.sort();
    Ok(candidates)
}

/// Scans `data_dir` for workbook files and returns a `TsvBuilder` with their
/// name, last-modified timestamp, and size in megabytes.
pub fn list_workbook_files(data_dir: &str) -> Result<TsvBuilder, Box<dyn Error>> {
    let mut builder = TsvBuilder::new();
    builder.set_header(vec!["file_name", "last_modified", "mb_size"]);

    for file_path in workbook_candidates(data_dir)? {
        let file_name = match file_path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };

        let metadata = metadata(&file_path)?;
        let modified_time = metadata.modified()?;
        let file_size_mb = metadata.len() as f64 / (1024.0 * 1024.0);

        let timestamp = modified_time.duration_since(UNIX_EPOCH)?.as_secs() as i64;
        let formatted_timestamp = match Utc.timestamp_opt(timestamp, 0) {
            chrono::LocalResult::Single(datetime) => {
                let datetime: DateTime<Utc> = datetime;
                datetime.format("%Y-%m-%d %H:%M:%S").to_string()
            }
            _ => String::new(),
        };
        let formatted_file_size = format!("{:.2}", file_size_mb);

        builder.add_row(vec![&file_name, &formatted_timestamp, &formatted_file_size]);
    }

    Ok(builder)
}

/// Picks the workbook to explore. An explicit path wins; otherwise the first
/// candidate by name is used and any alternatives are printed so the operator
/// can rerun with a path argument. Zero candidates is reported and returns
/// `Ok(None)`.
pub fn find_workbook_file(
    data_dir: &str,
    explicit: Option<&str>,
) -> Result<Option<PathBuf>, Box<dyn Error>> {
    if let Some(path) = explicit {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(Some(path));
        }
        println!("Workbook not found at {}", path.display());
        return Ok(None);
    }

    let mut candidates = workbook_candidates(data_dir)?;
    if candidates.is_empty() {
        println!("No workbook files found in {}/", data_dir);
        println!(
            "Move the downloaded supplementary workbook into {}/",
            data_dir
        );
        return Ok(None);
    }

    if candidates.len() > 1 {
        println!("Multiple workbook files found; using the first by name:");
        for (i, candidate) in candidates.iter().enumerate() {
            let marker = if i == 0 { "->" } else { "  " };
            println!("{} {}", marker, candidate.display());
        }
        println!("Pass an explicit path argument to select another file.");
    }

    Ok(Some(candidates.remove(0)))
}

/// Returns the sheet names of the workbook at `workbook_path`, dispatching on
/// the file extension.
pub fn get_sheet_names(workbook_path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let extension = workbook_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") => {
            let workbook: Xlsx<_> = open_workbook(workbook_path)?;
            Ok(workbook.sheet_names().to_vec())
        }
        Some("xls") => {
            let workbook: Xls<_> = open_workbook(workbook_path)?;
            Ok(workbook.sheet_names().to_vec())
        }
        _ => Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("unsupported workbook file: {}", workbook_path.display()),
        ))),
    }
}

/// Loads one full sheet into a `TsvBuilder`; load failures are recorded on the
/// builder's internal error rather than returned.
pub fn load_sheet(workbook_path: &Path, sheet_name: &str) -> TsvBuilder {
    let path_str = workbook_path.to_string_lossy();
    let extension = workbook_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("xls") => TsvBuilder::from_xls(&path_str, sheet_name, "SHEET_NAME"),
        _ => TsvBuilder::from_xlsx(&path_str, sheet_name, "SHEET_NAME"),
    }
}

/// Enumerates the sheets of the workbook, printing each one's shape and
/// leading column names. A sheet that fails to load gets its error printed
/// inline and is otherwise skipped. Returns the sheet names for the
/// classification passes.
pub fn preview_sheets(workbook_path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let display_name = workbook_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| workbook_path.display().to_string());

    println!("Exploring workbook: {}", display_name);
    println!("{}", "=".repeat(50));

    let sheet_names = get_sheet_names(workbook_path)?;
    println!("Found {} sheets:", sheet_names.len());

    for (i, sheet) in sheet_names.iter().enumerate() {
        println!("{}. {}", i + 1, sheet);

        let builder = load_sheet(workbook_path, sheet);
        if let Some(e) = builder.get_error() {
            println!("   Error reading sheet: {}", e);
            println!();
            continue;
        }

        let (rows, cols) = builder.shape();
        println!("   Shape: ({}, {})", rows, cols);

        let headers = builder.get_headers().unwrap_or(&[]);
        let shown = headers.len().min(PREVIEW_COLUMNS);
        let ellipsis = if headers.len() > shown { "..." } else { "" };
        println!("   Columns: [{}]{}", headers[..shown].join(", "), ellipsis);
        println!();
    }

    Ok(sheet_names)
}

/// Classifies sheet names by substring match against the microbiome and
/// metadata keyword sets. The two matches are independent, so a name can land
/// in both lists or in neither.
pub fn classify_sheets(sheet_names: &[String]) -> (Vec<String>, Vec<String>) {
    let mut microbiome_sheets = Vec::new();
    let mut metadata_sheets = Vec::new();

    for sheet in sheet_names {
        let sheet_lower = sheet.to_lowercase();
        if MICROBIOME_KEYWORDS
            .iter()
            .any(|word| sheet_lower.contains(word))
        {
            microbiome_sheets.push(sheet.clone());
        }
        if METADATA_KEYWORDS
            .iter()
            .any(|word| sheet_lower.contains(word))
        {
            metadata_sheets.push(sheet.clone());
        }
    }

    (microbiome_sheets, metadata_sheets)
}

/// Loads every sheet in full and scans the column labels for
/// coffee/caffeine/beverage mentions, printing up to three non-empty sample
/// values per matched column. Sheets that fail to load are skipped silently.
/// Returns whether anything matched.
pub fn scan_for_coffee_columns(workbook_path: &Path, sheet_names: &[String]) -> bool {
    println!("Looking for coffee consumption data...");

    let mut coffee_found = false;

    for sheet in sheet_names {
        let builder = load_sheet(workbook_path, sheet);
        if builder.get_error().is_some() {
            continue;
        }
        let headers = match builder.get_headers() {
            Some(headers) => headers,
            None => continue,
        };

        let matched: Vec<(usize, &String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| COFFEE_RE.is_match(header))
            .collect();
        if matched.is_empty() {
            continue;
        }

        coffee_found = true;
        println!("Found coffee data in sheet '{}':", sheet);
        for (index, header) in matched {
            println!("   - {}", header);
            let values: Vec<&String> = builder
                .get_data()
                .map(|rows| {
                    rows.iter()
                        .filter_map(|row| row.get(index))
                        .filter(|value| !value.is_empty())
                        .take(3)
                        .collect()
                })
                .unwrap_or_default();
            if !values.is_empty() {
                println!("     Sample values: {:?}", values);
            }
        }
        println!();
    }

    if !coffee_found {
        println!("No obvious coffee columns found. Manual inspection needed.");
    }

    coffee_found
}

/// Runs the exploration procedure: locate a workbook in `data_dir` (an
/// explicit path argument overrides discovery), preview its sheets, classify
/// them, scan for coffee columns, and print next-steps guidance. Performs no
/// file output beyond creating the input directory.
pub fn explore_workbook(data_dir: &str, explicit: Option<&str>) -> Result<(), Box<dyn Error>> {
    println!("PREDICT1 Workbook Explorer");
    println!("{}", "=".repeat(40));

    create_dir_all(data_dir)?;

    let mut listing = list_workbook_files(data_dir)?;
    if listing.get_data().is_some() {
        println!("Workbook candidates in {}/:", data_dir);
        listing.print_table();
        println!();
    }

    let workbook_path = match find_workbook_file(data_dir, explicit)? {
        Some(path) => path,
        None => return Ok(()),
    };

    let sheet_names = preview_sheets(&workbook_path)?;

    println!("Looking for microbiome data...");
    let (microbiome_sheets, metadata_sheets) = classify_sheets(&sheet_names);
    println!("Potential microbiome sheets: {:?}", microbiome_sheets);
    println!("Potential metadata sheets: {:?}", metadata_sheets);
    println!();

    scan_for_coffee_columns(&workbook_path, &sheet_names);

    println!("{}", "=".repeat(60));
    println!("NEXT STEPS");
    println!("{}", "=".repeat(60));
    println!("1. Review the sheet analysis above");
    println!("2. Identify which sheets contain:");
    println!("   - Microbiome abundance data (OTU/species counts)");
    println!("   - Sample metadata (including coffee consumption)");
    println!("3. Load the matching sheets in the downstream analysis");
    println!();
    println!("Create a mapping like:");
    println!("   feature_table_sheet = \"Sheet_Name_With_OTU_Data\"");
    println!("   metadata_sheet = \"Sheet_Name_With_Sample_Info\"");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classify_recognizes_microbiome_and_metadata_names() {
        let names = strings(&["OTU_Abundance", "Participant_Metadata", "Notes"]);
        let (microbiome, metadata) = classify_sheets(&names);

        assert_eq!(microbiome, vec!["OTU_Abundance"]);
        assert_eq!(metadata, vec!["Participant_Metadata"]);
    }

    #[test]
    fn classify_allows_both_lists_or_neither() {
        let names = strings(&["Species_Sample_Mix", "Changelog"]);
        let (microbiome, metadata) = classify_sheets(&names);

        assert_eq!(microbiome, vec!["Species_Sample_Mix"]);
        assert_eq!(metadata, vec!["Species_Sample_Mix"]);

        let (microbiome, metadata) = classify_sheets(&strings(&["Changelog"]));
        assert!(microbiome.is_empty());
        assert!(metadata.is_empty());
    }

    #[test]
    fn coffee_pattern_matches_case_insensitively() {
        assert!(COFFEE_RE.is_match("Coffee_cups_per_day"));
        assert!(COFFEE_RE.is_match("CAFFEINE_mg"));
        assert!(COFFEE_RE.is_match("daily beverage intake"));
        assert!(!COFFEE_RE.is_match("tea_cups_per_day"));
    }

    #[test]
    fn find_workbook_file_reports_empty_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let found =
            find_workbook_file(dir.path().to_str().unwrap(), None).expect("scan should succeed");
        assert!(found.is_none());
    }

    #[test]
    fn find_workbook_file_picks_first_candidate_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        File::create(dir.path().join("zz_later.xlsx")).expect("create");
        File::create(dir.path().join("aa_first.xlsx")).expect("create");
        File::create(dir.path().join("notes.txt")).expect("create");

        let found = find_workbook_file(dir.path().to_str().unwrap(), None)
            .expect("scan should succeed")
            .expect("candidate expected");
        assert_eq!(found.file_name().unwrap(), "aa_first.xlsx");
    }

    #[test]
    fn find_workbook_file_prefers_explicit_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let explicit = dir.path().join("chosen.xls");
        File::create(&explicit).expect("create");
        File::create(dir.path().join("other.xlsx")).expect("create");

        let found = find_workbook_file(
            dir.path().to_str().unwrap(),
            Some(explicit.to_str().unwrap()),
        )
        .expect("scan should succeed")
        .expect("explicit path expected");
        assert_eq!(found, explicit);

        let missing = find_workbook_file(dir.path().to_str().unwrap(), Some("missing.xlsx"))
            .expect("scan should succeed");
        assert!(missing.is_none());
    }

    #[test]
    fn list_workbook_files_reports_candidates_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        File::create(dir.path().join("study.xlsx")).expect("create");
        File::create(dir.path().join("readme.md")).expect("create");

        let listing = list_workbook_files(dir.path().to_str().unwrap()).expect("listing");
        assert_eq!(
            listing.get_headers().unwrap(),
            &["file_name", "last_modified", "mb_size"]
        );
        let rows = listing.get_data().expect("one row");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "study.xlsx");
    }

    #[test]
    fn explore_workbook_aborts_cleanly_with_no_candidates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = explore_workbook(dir.path().to_str().unwrap(), None);
        assert!(result.is_ok());
    }

    #[test]
    fn explore_workbook_creates_a_missing_input_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("data").join("raw");
        let result = explore_workbook(nested.to_str().unwrap(), None);
        assert!(result.is_ok());
        assert!(nested.is_dir());
    }
}
