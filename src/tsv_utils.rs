// tsv_utils.rs
use calamine::{open_workbook, Reader, Xls, Xlsx};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::error::Error;
use std::fs::File;
use std::io::{Error as IoError, ErrorKind};

/// Represents a TsvBuilder object. This struct allows you to specify headers, corresponding data, a limit on how much data to consider for subsequent manipulations, as well as an internal error handler.
#[derive(Debug)]
pub struct TsvBuilder {
    headers: Vec<String>,
    data: Vec<Vec<String>>,
    limit: Option<usize>,
    error: Option<Box<dyn Error>>,
}

impl TsvBuilder {
    /// Creates a new, empty `TsvBuilder`.
    ///
    /// ```
    /// use biomeprep::tsv_utils::TsvBuilder;
    ///
    /// let builder = TsvBuilder::new();
    ///
    /// // Initially, there are no headers or data
    /// assert!(builder.get_headers().is_none());
    /// assert!(builder.get_data().is_none());
    /// ```
    pub fn new() -> Self {
        TsvBuilder {
            headers: Vec::new(),
            data: Vec::new(),
            limit: None,
            error: None,
        }
    }

    /// Builds a `TsvBuilder` directly from headers and rows.
    ///
    /// ```
    /// use biomeprep::tsv_utils::TsvBuilder;
    ///
    /// let builder = TsvBuilder::from_raw_data(
    ///     vec!["#SampleID".to_string(), "age".to_string()],
    ///     vec![vec!["Sample_00000".to_string(), "34".to_string()]],
    /// );
    ///
    /// assert_eq!(builder.get_headers().unwrap(), &["#SampleID", "age"]);
    /// assert_eq!(builder.shape(), (1, 2));
    /// ```
    pub fn from_raw_data(headers: Vec<String>, data: Vec<Vec<String>>) -> Self {
        TsvBuilder {
            headers,
            data,
            limit: None,
            error: None,
        }
    }

    /// Creates a deep copy of the `TsvBuilder`, leaving the original untouched.
    pub fn from_copy(&self) -> Self {
        TsvBuilder {
            headers: self.headers.clone(),
            data: self.data.clone(),
            limit: self.limit,
            error: None,
        }
    }

    /// Reads data from a tab-separated file at the specified `file_path` and returns a `TsvBuilder`.
    ///
    /// If the file cannot be opened or a record fails to parse, the builder's
    /// internal error is set and `get_headers`/`get_data` report what was read
    /// up to that point.
    pub fn from_tsv(file_path: &str) -> Self {
        let mut builder = TsvBuilder::new();

        match File::open(file_path) {
            Ok(file) => {
                let mut rdr = csv::ReaderBuilder::new().delimiter(b'\t').from_reader(file);

                if let Ok(hdrs) = rdr.headers() {
                    builder.headers = hdrs.iter().map(String::from).collect();
                }

                for result in rdr.records() {
                    match result {
                        Ok(record) => builder.data.push(record.iter().map(String::from).collect()),
                        Err(e) => {
                            builder.error = Some(Box::new(e));
                            break;
                        }
                    }
                }
            }
            Err(e) => builder.error = Some(Box::new(e)),
        }

        builder
    }

    /// Parses an in-memory tab-separated payload, e.g. an HTTP response body.
    ///
    /// ```
    /// use biomeprep::tsv_utils::TsvBuilder;
    ///
    /// let payload = "#SampleID\tage\nSample_00000\t42\nSample_00001\t28\n";
    /// let builder = TsvBuilder::from_tsv_str(payload);
    ///
    /// assert_eq!(builder.get_headers().unwrap(), &["#SampleID", "age"]);
    /// assert_eq!(builder.shape(), (2, 2));
    /// ```
    pub fn from_tsv_str(tsv_data: &str) -> Self {
        let mut builder = TsvBuilder::new();
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(tsv_data.as_bytes());

        if let Ok(hdrs) = rdr.headers() {
            builder.headers = hdrs.iter().map(String::from).collect();
        }

        for result in rdr.records() {
            match result {
                Ok(record) => builder.data.push(record.iter().map(String::from).collect()),
                Err(e) => {
                    builder.error = Some(Box::new(e));
                    break;
                }
            }
        }

        builder
    }

    /// Reads one worksheet from an XLS workbook at `file_path` and returns a `TsvBuilder`.
    ///
    /// The sheet is addressed either by name (`identifier_type` of
    /// `"SHEET_NAME"`) or by 1-based position (`"SHEET_ID"`). The first
    /// worksheet row becomes the headers.
    pub fn from_xls(file_path: &str, sheet_identifier: &str, identifier_type: &str) -> Self {
        let mut builder = TsvBuilder::new();

        match open_workbook::<Xls<_>, _>(file_path) {
            Ok(mut workbook) => {
                let sheet_names = workbook.sheet_names();
                let sheet_name_opt = match identifier_type {
                    "SHEET_NAME" => Some(sheet_identifier.to_string()),
                    "SHEET_ID" => {
                        if let Ok(index) = sheet_identifier.parse::<usize>() {
                            if index > 0 && index <= sheet_names.len() {
                                Some(sheet_names[index - 1].clone())
                            } else {
                                None
                            }
                        } else {
                            None
                        }
                    }
                    _ => None,
                };

                match sheet_name_opt {
                    Some(sheet_name) => match workbook.worksheet_range(&sheet_name) {
                        Ok(range) => {
                            for row in range.rows() {
                                let row_data: Vec<String> =
                                    row.iter().map(|cell| cell.to_string()).collect();
                                if builder.headers.is_empty() {
                                    builder.headers = row_data;
                                } else {
                                    builder.data.push(row_data);
                                }
                            }
                        }
                        Err(e) => {
                            builder.error = Some(Box::new(e) as Box<dyn Error>);
                        }
                    },
                    None => {
                        let error =
                            IoError::new(ErrorKind::InvalidInput, "Sheet identifier not found");
                        builder.error = Some(Box::new(error) as Box<dyn Error>);
                    }
                }
            }
            Err(e) => {
                builder.error = Some(Box::new(e) as Box<dyn Error>);
            }
        }

        builder
    }

    /// Reads one worksheet from an XLSX workbook at `file_path` and returns a `TsvBuilder`.
    ///
    /// Same addressing scheme as [`TsvBuilder::from_xls`].
    pub fn from_xlsx(file_path: &str, sheet_identifier: &str, identifier_type: &str) -> Self {
        let mut builder = TsvBuilder::new();

        match open_workbook::<Xlsx<_>, _>(file_path) {
            Ok(mut workbook) => {
                let sheet_names = workbook.sheet_names();
                let sheet_name_opt = match identifier_type {
                    "SHEET_NAME" => Some(sheet_identifier.to_string()),
                    "SHEET_ID" => {
                        if let Ok(index) = sheet_identifier.parse::<usize>() {
                            if index > 0 && index <= sheet_names.len() {
                                Some(sheet_names[index - 1].clone())
                            } else {
                                None
                            }
                        } else {
                            None
                        }
                    }
                    _ => None,
                };

                match sheet_name_opt {
                    Some(sheet_name) => match workbook.worksheet_range(&sheet_name) {
                        Ok(range) => {
                            for row in range.rows() {
                                let row_data: Vec<String> =
                                    row.iter().map(|cell| cell.to_string()).collect();
                                if builder.headers.is_empty() {
                                    builder.headers = row_data;
                                } else {
                                    builder.data.push(row_data);
                                }
                            }
                        }
                        Err(e) => {
                            builder.error = Some(Box::new(e) as Box<dyn Error>);
                        }
                    },
                    None => {
                        let error =
                            IoError::new(ErrorKind::InvalidInput, "Sheet identifier not found");
                        builder.error = Some(Box::new(error) as Box<dyn Error>);
                    }
                }
            }
            Err(e) => {
                builder.error = Some(Box::new(e) as Box<dyn Error>);
            }
        }

        builder
    }

    /// Sets the headers, replacing any existing ones.
    pub fn set_header(&mut self, header: Vec<&str>) -> &mut Self {
        self.headers = header.iter().map(|&h| h.to_string()).collect();
        self
    }

    /// Appends a single data row.
    pub fn add_row(&mut self, row: Vec<&str>) -> &mut Self {
        self.data.push(row.iter().map(|&cell| cell.to_string()).collect());
        self
    }

    /// Appends multiple data rows.
    pub fn add_rows(&mut self, rows: Vec<Vec<&str>>) -> &mut Self {
        for row in rows {
            self.data.push(row.iter().map(|&cell| cell.to_string()).collect());
        }
        self
    }

    /// Checks if the builder contains headers or data.
    pub fn has_data(&self) -> bool {
        !self.headers.is_empty() || !self.data.is_empty()
    }

    /// Checks if the builder contains headers.
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Retrieves a reference to the headers if any exist.
    pub fn get_headers(&self) -> Option<&[String]> {
        if self.has_headers() {
            Some(&self.headers)
        } else {
            None
        }
    }

    /// Retrieves a reference to the data rows if any exist.
    pub fn get_data(&self) -> Option<&Vec<Vec<String>>> {
        if !self.data.is_empty() {
            Some(&self.data)
        } else {
            None
        }
    }

    /// Retrieves the internal error, if one was recorded while loading.
    pub fn get_error(&self) -> Option<&dyn Error> {
        self.error.as_deref()
    }

    /// Returns `(row_count, column_count)`, counting header columns.
    pub fn shape(&self) -> (usize, usize) {
        (self.data.len(), self.headers.len())
    }

    /// Returns the 0-based position of `column_name` in the headers, if present.
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column_name)
    }

    /// Downsamples the data to `limit` rows using a seeded generator, so the
    /// same seed always selects the same rows. A `limit` of zero, or one at
    /// least as large as the data, leaves the rows untouched.
    ///
    /// ```
    /// use biomeprep::tsv_utils::TsvBuilder;
    ///
    /// let headers = vec!["id".to_string()];
    /// let data: Vec<Vec<String>> = (0..10).map(|i| vec![i.to_string()]).collect();
    ///
    /// let mut a = TsvBuilder::from_raw_data(headers.clone(), data.clone());
    /// let mut b = TsvBuilder::from_raw_data(headers, data);
    /// a.limit_random_seeded(4, 42);
    /// b.limit_random_seeded(4, 42);
    ///
    /// assert_eq!(a.get_data().unwrap(), b.get_data().unwrap());
    /// assert_eq!(a.shape().0, 4);
    /// ```
    pub fn limit_random_seeded(&mut self, limit: usize, seed: u64) -> &mut Self {
        if limit >= self.data.len() || limit == 0 {
            self.limit = Some(self.data.len());
            return self;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let sample = self
            .data
            .as_slice()
            .choose_multiple(&mut rng, limit)
            .cloned()
            .collect();

        self.data = sample;
        self.limit = Some(limit);
        self
    }

    /// Saves data in the `TsvBuilder` to a tab-separated file at `new_file_path`, overwriting.
    pub fn save_as(&mut self, new_file_path: &str) -> Result<&mut Self, Box<dyn Error>> {
        let file = File::create(new_file_path)?;
        let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(file);

        // Write the headers
        if !self.headers.is_empty() {
            wtr.write_record(&self.headers)?;
        }

        // Ensure each data row has the same number of elements as there are headers
        let headers_len = self.headers.len();
        for record in &mut self.data {
            // Pad the record with empty strings if it has fewer elements than headers
            while record.len() < headers_len {
                record.push("".to_string());
            }

            wtr.write_record(record)?;
        }

        wtr.flush()?;

        Ok(self)
    }

    /// Prints each header on its own line.
    pub fn print_columns(&mut self) -> &mut Self {
        println!();
        for header in &self.headers {
            println!("{}", header);
        }
        self
    }

    /// Prints the number of data rows.
    pub fn print_row_count(&mut self) -> &mut Self {
        let row_count = self.data.len();
        println!();
        println!("Row count: {}", row_count);

        self
    }

    /// Prints a compact aligned preview of the table: at most the first five
    /// rows and eight columns, with a trailing note for whatever was omitted.
    pub fn print_table(&mut self) -> &mut Self {
        const MAX_ROWS: usize = 5;
        const MAX_COLS: usize = 8;
        const MAX_CELL_WIDTH: usize = 24;

        if self.headers.is_empty() && self.data.is_empty() {
            println!();
            println!("<empty table>");
            return self;
        }

        fn clip(cell: &str) -> String {
            if cell.chars().count() > MAX_CELL_WIDTH {
                let clipped: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
                format!("{}...", clipped)
            } else {
                cell.to_string()
            }
        }

        let shown_cols = self.headers.len().min(MAX_COLS);
        let shown_rows = self.data.len().min(MAX_ROWS);

        let mut widths: Vec<usize> = self.headers[..shown_cols]
            .iter()
            .map(|h| clip(h).chars().count())
            .collect();
        for row in &self.data[..shown_rows] {
            for (i, width) in widths.iter_mut().enumerate() {
                if let Some(cell) = row.get(i) {
                    *width = (*width).max(clip(cell).chars().count());
                }
            }
        }

        println!();
        let header_line: Vec<String> = self.headers[..shown_cols]
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:width$}", clip(h), width = widths[i]))
            .collect();
        println!("|{}|", header_line.join("|"));
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        println!("|{}|", separator.join("|"));
        for row in &self.data[..shown_rows] {
            let line: Vec<String> = (0..shown_cols)
                .map(|i| {
                    let cell = row.get(i).map(|c| clip(c)).unwrap_or_default();
                    format!("{:width$}", cell, width = widths[i])
                })
                .collect();
            println!("|{}|", line.join("|"));
        }

        let omitted_rows = self.data.len().saturating_sub(shown_rows);
        let omitted_cols = self.headers.len().saturating_sub(shown_cols);
        if omitted_rows > 0 || omitted_cols > 0 {
            println!("({} more rows, {} more columns)", omitted_rows, omitted_cols);
        }

        self
    }
}
