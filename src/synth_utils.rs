// synth_utils.rs
use crate::tsv_utils::TsvBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma, Normal, Poisson};

pub const GENDERS: [&str; 2] = ["male", "female"];
pub const COUNTRIES: [&str; 4] = ["USA", "Canada", "UK", "Australia"];
pub const DIET_TYPES: [&str; 3] = ["Omnivore", "Vegetarian", "Vegan"];
pub const COFFEE_LEVELS: [&str; 3] = ["none", "occasional", "daily"];
pub const ANTIBIOTIC_ANSWERS: [&str; 2] = ["Yes", "No"];

const SAMPLE_TYPE: &str = "Stool";

// Negative binomial parameters for the OTU counts: r successes, success
// probability p, realized below as a Gamma(r, (1 - p) / p) -> Poisson mixture.
const NB_R: f64 = 5.0;
const NB_P: f64 = 0.5;

// Reference gut lineages, phylum through species. Each taxonomy draw takes one
// whole row, so every generated string is rank-coherent.
const LINEAGES: [[&str; 6]; 4] = [
    [
        "Firmicutes",
        "Clostridia",
        "Clostridiales",
        "Lachnospiraceae",
        "Roseburia",
        "faecalis",
    ],
    [
        "Bacteroidetes",
        "Bacteroidia",
        "Bacteroidales",
        "Bacteroidaceae",
        "Bacteroides",
        "thetaiotaomicron",
    ],
    [
        "Proteobacteria",
        "Gammaproteobacteria",
        "Enterobacteriales",
        "Enterobacteriaceae",
        "Escherichia",
        "coli",
    ],
    [
        "Actinobacteria",
        "Actinobacteria",
        "Bifidobacteriales",
        "Bifidobacteriaceae",
        "Bifidobacterium",
        "longum",
    ],
];

/// Represents a synthetic cohort specification: how many samples and OTUs to
/// generate, and the seed that makes the draws reproducible.
#[derive(Debug)]
pub struct SynthConfig {
    pub n_samples: usize,
    pub n_otus: usize,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            n_samples: 1000,
            n_otus: 500,
            seed: 42,
        }
    }
}

/// Zero-padded sample identifiers: `Sample_00000`, `Sample_00001`, ...
pub fn sample_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Sample_{:05}", i)).collect()
}

/// Zero-padded OTU identifiers: `OTU_0000`, `OTU_0001`, ...
pub fn otu_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("OTU_{:04}", i)).collect()
}

/// Generates the per-sample metadata table: one row per identifier with
/// demographic, dietary, and clinical attributes drawn from fixed vocabularies
/// and distributions. Ages are uniform in 18..80, BMI is Normal(25, 5)
/// truncated to an integer.
pub fn synth_metadata(ids: &[String], rng: &mut StdRng) -> TsvBuilder {
    let mut builder = TsvBuilder::new();
    builder.set_header(vec![
        "#SampleID",
        "age",
        "gender",
        "country",
        "sample_type",
        "diet_type",
        "coffee_consumption",
        "antibiotics_past_year",
        "bmi",
    ]);

    let bmi_dist = Normal::new(25.0, 5.0).unwrap();

    for id in ids {
        let age = rng.gen_range(18..80).to_string();
        let gender = GENDERS[rng.gen_range(0..GENDERS.len())];
        let country = COUNTRIES[rng.gen_range(0..COUNTRIES.len())];
        let diet = DIET_TYPES[rng.gen_range(0..DIET_TYPES.len())];
        let coffee = COFFEE_LEVELS[rng.gen_range(0..COFFEE_LEVELS.len())];
        let antibiotics = ANTIBIOTIC_ANSWERS[rng.gen_range(0..ANTIBIOTIC_ANSWERS.len())];
        let bmi = (bmi_dist.sample(rng) as i64).to_string();

        builder.add_row(vec![
            id.as_str(),
            age.as_str(),
            gender,
            country,
            SAMPLE_TYPE,
            diet,
            coffee,
            antibiotics,
            bmi.as_str(),
        ]);
    }

    builder
}

/// Generates the OTU-by-sample feature table. Each cell is a non-negative
/// count drawn negative-binomial(r = 5, p = 0.5) per (OTU, sample) pair; the
/// column order matches `sample_ids` exactly so the table joins cleanly
/// against the metadata.
pub fn synth_feature_table(
    otu_ids: &[String],
    sample_ids: &[String],
    rng: &mut StdRng,
) -> TsvBuilder {
    let mut headers = Vec::with_capacity(sample_ids.len() + 1);
    headers.push("#OTU ID".to_string());
    headers.extend(sample_ids.iter().cloned());

    let gamma = Gamma::new(NB_R, (1.0 - NB_P) / NB_P).unwrap();

    let mut rows = Vec::with_capacity(otu_ids.len());
    for otu in otu_ids {
        let mut row = Vec::with_capacity(sample_ids.len() + 1);
        row.push(otu.clone());
        for _ in sample_ids {
            let lambda: f64 = gamma.sample(rng);
            // A gamma draw can underflow to zero, which Poisson::new rejects.
            let count = if lambda > 0.0 {
                match Poisson::new(lambda) {
                    Ok(poisson) => poisson.sample(rng) as u64,
                    Err(_) => 0,
                }
            } else {
                0
            };
            row.push(count.to_string());
        }
        rows.push(row);
    }

    TsvBuilder::from_raw_data(headers, rows)
}

/// Generates the taxonomy table: one `k__Bacteria;p__...;s__...` string per
/// OTU, each assembled from a single row of the lineage table.
pub fn synth_taxonomy(otu_ids: &[String], rng: &mut StdRng) -> TsvBuilder {
    let headers = vec!["#OTU ID".to_string(), "Taxonomy".to_string()];

    let mut rows = Vec::with_capacity(otu_ids.len());
    for otu in otu_ids {
        let lineage = &LINEAGES[rng.gen_range(0..LINEAGES.len())];
        let tax_string = format!(
            "k__Bacteria;p__{};c__{};o__{};f__{};g__{};s__{}",
            lineage[0], lineage[1], lineage[2], lineage[3], lineage[4], lineage[5]
        );
        rows.push(vec![otu.clone(), tax_string]);
    }

    TsvBuilder::from_raw_data(headers, rows)
}

/// Generates a full synthetic cohort: metadata, feature table, and taxonomy,
/// in that order, from one seeded generator. A fixed seed reproduces the same
/// three tables byte for byte.
pub fn synth_cohort(config: &SynthConfig) -> (TsvBuilder, TsvBuilder, TsvBuilder) {
    println!(
        "Generating synthetic data for {} samples...",
        config.n_samples
    );
    let mut rng = StdRng::seed_from_u64(config.seed);

    let ids = sample_ids(config.n_samples);
    let otus = otu_ids(config.n_otus);

    println!("  Creating metadata...");
    let metadata = synth_metadata(&ids, &mut rng);

    println!("  Creating feature table...");
    let features = synth_feature_table(&otus, &ids, &mut rng);

    println!("  Creating taxonomy...");
    let taxonomy = synth_taxonomy(&otus, &mut rng);

    (metadata, features, taxonomy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SynthConfig {
        SynthConfig {
            n_samples: 12,
            n_otus: 8,
            seed: 42,
        }
    }

    #[test]
    fn cohort_is_reproducible_for_a_fixed_seed() {
        let (meta_a, feat_a, tax_a) = synth_cohort(&small_config());
        let (meta_b, feat_b, tax_b) = synth_cohort(&small_config());

        assert_eq!(meta_a.get_headers(), meta_b.get_headers());
        assert_eq!(meta_a.get_data(), meta_b.get_data());
        assert_eq!(feat_a.get_headers(), feat_b.get_headers());
        assert_eq!(feat_a.get_data(), feat_b.get_data());
        assert_eq!(tax_a.get_data(), tax_b.get_data());
    }

    #[test]
    fn feature_columns_match_metadata_sample_ids() {
        let (metadata, features, _) = synth_cohort(&small_config());

        let metadata_ids: Vec<String> = metadata
            .get_data()
            .unwrap()
            .iter()
            .map(|row| row[0].clone())
            .collect();
        let feature_columns = &features.get_headers().unwrap()[1..];

        assert_eq!(feature_columns, metadata_ids.as_slice());
    }

    #[test]
    fn taxonomy_rows_match_feature_rows() {
        let (_, features, taxonomy) = synth_cohort(&small_config());

        let feature_otus: Vec<&String> = features
            .get_data()
            .unwrap()
            .iter()
            .map(|row| &row[0])
            .collect();
        let taxonomy_otus: Vec<&String> = taxonomy
            .get_data()
            .unwrap()
            .iter()
            .map(|row| &row[0])
            .collect();

        assert_eq!(feature_otus, taxonomy_otus);
    }

    #[test]
    fn feature_counts_are_non_negative_integers() {
        let (_, features, _) = synth_cohort(&small_config());

        for row in features.get_data().unwrap() {
            for cell in &row[1..] {
                cell.parse::<u64>()
                    .unwrap_or_else(|_| panic!("non-integer count: {}", cell));
            }
        }
    }

    #[test]
    fn metadata_values_stay_in_vocabulary_and_range() {
        let (metadata, _, _) = synth_cohort(&small_config());
        let headers = metadata.get_headers().unwrap();
        assert_eq!(headers[0], "#SampleID");

        for row in metadata.get_data().unwrap() {
            let age: u32 = row[1].parse().expect("numeric age");
            assert!((18..80).contains(&age), "age out of range: {}", age);
            assert!(GENDERS.contains(&row[2].as_str()));
            assert!(COUNTRIES.contains(&row[3].as_str()));
            assert_eq!(row[4], "Stool");
            assert!(DIET_TYPES.contains(&row[5].as_str()));
            assert!(COFFEE_LEVELS.contains(&row[6].as_str()));
            assert!(ANTIBIOTIC_ANSWERS.contains(&row[7].as_str()));
            row[8].parse::<i64>().expect("numeric bmi");
        }
    }

    #[test]
    fn taxonomy_lineages_are_rank_coherent() {
        let (_, _, taxonomy) = synth_cohort(&small_config());

        for row in taxonomy.get_data().unwrap() {
            let ranks: Vec<&str> = row[1].split(';').collect();
            assert_eq!(ranks.len(), 7, "taxonomy string: {}", row[1]);
            assert_eq!(ranks[0], "k__Bacteria");

            let phylum = ranks[1].trim_start_matches("p__");
            let lineage = LINEAGES
                .iter()
                .find(|l| l[0] == phylum)
                .unwrap_or_else(|| panic!("unknown phylum: {}", phylum));
            let expected: Vec<String> = [
                format!("p__{}", lineage[0]),
                format!("c__{}", lineage[1]),
                format!("o__{}", lineage[2]),
                format!("f__{}", lineage[3]),
                format!("g__{}", lineage[4]),
                format!("s__{}", lineage[5]),
            ]
            .to_vec();
            assert_eq!(&ranks[1..], expected.as_slice(), "incoherent: {}", row[1]);
        }
    }

    #[test]
    fn id_formats_are_zero_padded() {
        assert_eq!(sample_ids(2), vec!["Sample_00000", "Sample_00001"]);
        assert_eq!(otu_ids(2), vec!["OTU_0000", "OTU_0001"]);
    }
}
