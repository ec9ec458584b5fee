// acquisition_utils.rs
use crate::api_utils::ApiCallBuilder;
use crate::synth_utils::{self, SynthConfig};
use crate::tsv_utils::TsvBuilder;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::error::Error;
use std::fs::create_dir_all;

pub const QIITA_BASE_URL: &str = "https://qiita.ucsd.edu/api/v1";
pub const AGP_STUDY_ID: u32 = 10317;
pub const FETCH_TIMEOUT_SECS: u64 = 30;

// Seed for the downsampling draw and the synthetic fallback.
pub const SAMPLE_SEED: u64 = 42;

const QIITA_USERNAME_VAR: &str = "QIITA_USERNAME";
const QIITA_PASSWORD_VAR: &str = "QIITA_PASSWORD";

/// Represents one acquisition run: where to fetch from, how large a cohort to
/// produce, and where the three TSV files land.
#[derive(Debug)]
pub struct AcquisitionConfig {
    pub base_url: String,
    pub study_id: u32,
    pub n_samples: usize,
    pub n_otus: usize,
    pub output_dir: String,
    pub use_auth: bool,
    pub seed: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        AcquisitionConfig {
            base_url: QIITA_BASE_URL.to_string(),
            study_id: AGP_STUDY_ID,
            n_samples: 1000,
            n_otus: 500,
            output_dir: "data/raw".to_string(),
            use_auth: true,
            seed: SAMPLE_SEED,
        }
    }
}

/// Reads Qiita credentials from the `QIITA_USERNAME` and `QIITA_PASSWORD`
/// environment variables. Absence is an expected condition, reported on
/// stdout, and simply routes the run onto the synthetic path.
pub fn get_qiita_credentials() -> Option<(String, String)> {
    let username = env::var(QIITA_USERNAME_VAR).ok().filter(|v| !v.is_empty());
    let password = env::var(QIITA_PASSWORD_VAR).ok().filter(|v| !v.is_empty());

    match (username, password) {
        (Some(username), Some(password)) => {
            println!("Found Qiita credentials for user: {}", username);
            Some((username, password))
        }
        _ => {
            println!("No Qiita credentials found in environment variables");
            println!(
                "  Set {} and {} to authenticate",
                QIITA_USERNAME_VAR, QIITA_PASSWORD_VAR
            );
            None
        }
    }
}

/// Fetches the sample metadata for `study_id` with one authenticated GET and
/// parses the tab-separated payload. When the study holds more than `limit`
/// samples, the rows are downsampled deterministically with [`SAMPLE_SEED`].
///
/// Every failure mode (transport error, 401, any other non-200, an empty or
/// unparseable payload) comes back as `Err`; partial payloads are discarded.
pub async fn fetch_samples_with_auth(
    base_url: &str,
    username: &str,
    password: &str,
    study_id: u32,
    limit: usize,
) -> Result<TsvBuilder, Box<dyn Error>> {
    println!();
    println!("Authenticating with Qiita as {}...", username);

    let endpoint = format!("{}/study/{}/metadata", base_url, study_id);
    let (status, body) = ApiCallBuilder::call("GET", &endpoint)
        .basic_auth(username, password)
        .timeout(FETCH_TIMEOUT_SECS)
        .execute_with_status()
        .await?;

    if status == 401 {
        return Err("authentication failed - check username/password".into());
    }
    if status != 200 {
        let excerpt: String = body.chars().take(200).collect();
        return Err(format!("API error: {}\n  Response: {}", status, excerpt).into());
    }

    println!("Authentication successful");

    let mut metadata = TsvBuilder::from_tsv_str(&body);
    if let Some(e) = metadata.get_error() {
        return Err(format!("metadata payload did not parse: {}", e).into());
    }
    let row_count = metadata.get_data().map(|rows| rows.len()).unwrap_or(0);
    if row_count == 0 {
        return Err("metadata payload contained no samples".into());
    }
    println!("Retrieved {} samples from study {}", row_count, study_id);

    if row_count > limit {
        metadata.limit_random_seeded(limit, SAMPLE_SEED);
        println!("Filtered to {} samples", limit);
    }

    Ok(metadata)
}

/// Runs the acquisition procedure: attempt the authenticated fetch, fall back
/// to a fully synthetic cohort on any failure, and write `metadata.tsv`,
/// `feature-table.tsv`, and `taxonomy.tsv` into the output directory,
/// overwriting whatever is there. When real metadata is retrieved, the feature
/// table and taxonomy are still synthesized, over the fetched sample
/// identifiers, so the three files always join on matching ids.
///
/// Only filesystem errors propagate; the network path degrades silently into
/// the fallback with a printed diagnostic.
pub async fn download_study_sample(config: &AcquisitionConfig) -> Result<(), Box<dyn Error>> {
    create_dir_all(&config.output_dir)?;

    println!();
    println!("{}", "=".repeat(70));
    println!(
        "DOWNLOADING {} SAMPLES FROM AMERICAN GUT PROJECT",
        config.n_samples
    );
    println!("{}", "=".repeat(70));

    let mut fetched: Option<TsvBuilder> = None;
    if config.use_auth {
        if let Some((username, password)) = get_qiita_credentials() {
            match fetch_samples_with_auth(
                &config.base_url,
                &username,
                &password,
                config.study_id,
                config.n_samples,
            )
            .await
            {
                Ok(metadata) => fetched = Some(metadata),
                Err(e) => println!("Error fetching data: {}", e),
            }
        }
    }

    let (mut metadata, mut features, mut taxonomy) = match fetched {
        Some(metadata) => {
            let ids: Vec<String> = metadata
                .get_data()
                .map(|rows| rows.iter().filter_map(|row| row.first().cloned()).collect())
                .unwrap_or_default();
            let otus = synth_utils::otu_ids(config.n_otus);
            let mut rng = StdRng::seed_from_u64(config.seed);

            println!("  Creating feature table...");
            let features = synth_utils::synth_feature_table(&otus, &ids, &mut rng);
            println!("  Creating taxonomy...");
            let taxonomy = synth_utils::synth_taxonomy(&otus, &mut rng);
            (metadata, features, taxonomy)
        }
        None => {
            println!();
            println!("Using synthetic data for demonstration");
            let synth_config = SynthConfig {
                n_samples: config.n_samples,
                n_otus: config.n_otus,
                seed: config.seed,
            };
            synth_utils::synth_cohort(&synth_config)
        }
    };

    let metadata_path = format!("{}/metadata.tsv", config.output_dir);
    metadata.save_as(&metadata_path)?;
    let (rows, cols) = metadata.shape();
    println!();
    println!("Saved metadata: {}", metadata_path);
    println!("  Shape: {} samples x {} columns", rows, cols.saturating_sub(1));

    let feature_path = format!("{}/feature-table.tsv", config.output_dir);
    features.save_as(&feature_path)?;
    let (otu_rows, feature_cols) = features.shape();
    println!("Saved feature table: {}", feature_path);
    println!(
        "  Shape: {} OTUs x {} samples",
        otu_rows,
        feature_cols.saturating_sub(1)
    );

    let taxonomy_path = format!("{}/taxonomy.tsv", config.output_dir);
    taxonomy.save_as(&taxonomy_path)?;
    println!("Saved taxonomy: {}", taxonomy_path);

    println!();
    println!("{}", "=".repeat(70));
    println!("ALL FILES GENERATED SUCCESSFULLY");
    println!("{}", "=".repeat(70));
    println!("Output directory: {}", config.output_dir);
    println!("  - metadata.tsv");
    println!("  - feature-table.tsv");
    println!("  - taxonomy.tsv");
    println!("{}", "=".repeat(70));
    println!();

    Ok(())
}
