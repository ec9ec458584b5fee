// lib.rs
//! # BIOMEPREP
//!
//! Acquisition and exploration helpers for microbiome research datasets. One
//! half of this crate downloads (or, failing that, synthesizes) an American
//! Gut Project sample subset and serializes it as tab-separated files; the
//! other half opens a PREDICT1-style supplementary workbook and triages its
//! sheets so a human knows where the abundance data and the sample metadata
//! live.
//!
//! ## `tsv_utils`
//!
//! - **Purpose**: The tabular core of the crate.
//! - **Features**:
//!   - **TsvBuilder**: An in-memory table with chainable methods for loading,
//!     shaping, and persisting tab-separated data:
//!   - **Flexible Initialization**: Start empty, from raw rows, from a `.tsv`
//!     file, from a tab-separated payload string, or from an XLSX/XLS
//!     worksheet.
//!   - **Custom Headers and Rows**: Set headers and append rows effortlessly.
//!   - **Deterministic Downsampling**: Sample a fixed number of rows with a
//!     caller-supplied seed, reproducibly.
//!   - **Console Previews**: Print columns, row counts, or a compact aligned
//!     table for quick inspection.
//!   - **Tab-Separated Saving**: Serialize to a `.tsv` path, padding ragged
//!     rows to header width.
//!
//! ## `api_utils`
//!
//! - **Purpose**: Make single-attempt HTTP calls gracefully.
//! - **Features**:
//!   - **ApiCallBuilder**: A small builder over `reqwest` with basic
//!     authentication, JSON-object query parameters, and a fixed request
//!     timeout. One attempt per call; failures surface as plain errors for
//!     the caller to degrade on.
//!
//! ## `synth_utils`
//!
//! - **Purpose**: Generate a realistic synthetic gut-microbiome cohort from a
//!   fixed seed.
//! - **Features**:
//!   - Per-sample metadata (age, gender, country, diet, coffee consumption,
//!     antibiotics history, BMI) drawn from fixed vocabularies and
//!     distributions.
//!   - An OTU-by-sample feature table of negative-binomial counts.
//!   - Rank-coherent taxonomy strings assembled from a fixed lineage table.
//!
//! ## `acquisition_utils`
//!
//! - **Purpose**: The acquisition procedure end to end.
//! - **Features**:
//!   - Reads optional Qiita credentials from the environment; absence is a
//!     normal, reported condition.
//!   - One authenticated metadata fetch for a fixed study, deterministically
//!     downsampled to the requested cohort size.
//!   - Falls back to the synthetic cohort on any credential, status, or
//!     network failure, then writes `metadata.tsv`, `feature-table.tsv`, and
//!     `taxonomy.tsv`.
//!
//! ## `workbook_utils`
//!
//! - **Purpose**: The exploration procedure for supplementary workbooks.
//! - **Features**:
//!   - Locates a workbook in the input directory with a deterministic
//!     first-match policy when several candidates exist.
//!   - Enumerates sheets, previews shapes and leading column names, and
//!     classifies sheet names against microbiome and metadata keyword sets.
//!   - Scans every sheet for coffee/caffeine/beverage columns and prints a
//!     few sample values per hit.
//!
//! ## License
//!
//! This project is licensed under the MIT License - see the LICENSE file for details.

pub mod acquisition_utils;
pub mod api_utils;
pub mod synth_utils;
pub mod tsv_utils;
pub mod workbook_utils;
