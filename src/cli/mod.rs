//! Command-line interface for omics_compare
//!
//! Flags left unset fall back to the `--config` file, then to built-in defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "omics_compare")]
#[command(version)]
#[command(about = "Group comparisons, gene set enrichment and cross-modality integration for omics tables")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Output location shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output directory [default: .]
    #[arg(short, long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Output file prefix [default: omics]
    #[arg(short, long,
        long_help = "Prefix of every output file.\n\
            Files are named <prefix>_<stage>_<YYYYMMDD>.csv in the output directory.")]
    pub prefix: Option<String>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE",
        long_help = "JSON configuration file.\n\
            Any field may be omitted; command-line flags override the file.")]
    pub config: Option<PathBuf>,
}

/// Deduplication, detection filter and normalization flags
#[derive(Args, Debug, Clone)]
pub struct PrepareArgs {
    /// Normalization method [default: logcpm]
    #[arg(short = 'n', long,
        long_help = "Normalization applied after filtering.\n\
            none:            values are already on a log scale\n\
            log2:            log2(x + pseudocount), for intensities\n\
            logcpm:          log2 counts-per-million, for bulk RNA counts\n\
            ratio:           log2 of median-of-ratios scaled counts\n\
            median_centered: log2 then per-sample median subtraction, for proteomics")]
    pub normalization: Option<String>,

    /// Pseudocount added before taking logs [default: 1]
    #[arg(long)]
    pub pseudocount: Option<f64>,

    /// Detection threshold: values strictly above count as detected [default: 0]
    #[arg(long, allow_negative_numbers = true,
        long_help = "Detection threshold applied before normalization.\n\
            Values strictly above it count as detected.\n\
            Default: 0, or any observed value with -n none, since log-scale\n\
            or median-centered input can be negative.")]
    pub min_value: Option<f64>,

    /// Minimum number of samples a feature must be detected in [default: 1]
    #[arg(long)]
    pub min_samples: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare sample groups and run enrichment
    #[command(
        long_about = "Compare sample groups feature by feature.\n\n\
            Aligns the matrix with the metadata, averages duplicated features, removes\n\
            low-detection features, normalizes, tests each contrast and corrects p-values\n\
            per contrast. Significant up- and down-regulated features are then tested for\n\
            gene set over-representation.",
        after_long_help = "\
Examples:
  # Basal vs LumA on RNA counts
  omics_compare compare -x rna_counts.tsv -m samples.tsv -g subtype \\
    --numerator Basal --denominator LumA -p brca

  # Every subtype against the rest, proteomics intensities
  omics_compare compare -x protein.tsv -m samples.tsv -g subtype --one-vs-rest \\
    -n median_centered --gene-sets hallmark.gmt

  # Treatment arms at one timepoint only, Wilcoxon test
  omics_compare compare -x rna_counts.tsv -m samples.tsv -g arm --all-pairs \\
    --subset timepoint=T1 --test wilcoxon"
    )]
    Compare {
        /// Feature x sample matrix (CSV or TSV)
        #[arg(short = 'x', long,
            long_help = "Feature x sample matrix.\n\
                Format: first column = feature IDs, first row = sample IDs.\n\
                Comma or tab delimited (auto-detected). NA, NaN and empty cells are missing.")]
        matrix: PathBuf,

        /// Sample metadata (CSV or TSV)
        #[arg(short, long,
            long_help = "Sample metadata.\n\
                Format: first column = sample IDs, remaining columns = annotations.\n\
                Only samples present in both files are analysed.")]
        metadata: PathBuf,

        /// Metadata column defining the groups
        #[arg(short, long)]
        group: Option<String>,

        /// Numerator group of a single contrast
        #[arg(long, requires = "denominator")]
        numerator: Option<String>,

        /// Denominator group of a single contrast
        #[arg(long, requires = "numerator")]
        denominator: Option<String>,

        /// Compare every pair of groups
        #[arg(long)]
        all_pairs: bool,

        /// Compare every group against all remaining samples
        #[arg(long)]
        one_vs_rest: bool,

        /// Restrict to samples with COLUMN=VALUE
        #[arg(long, value_name = "COLUMN=VALUE")]
        subset: Option<String>,

        /// Statistical test [default: welch]
        #[arg(long,
            long_help = "Two-group test applied to each feature.\n\
                welch:    Welch's t-test (default)\n\
                student:  Student's t-test with pooled variance\n\
                wilcoxon: Wilcoxon rank-sum with tie correction")]
        test: Option<String>,

        /// Significance threshold on adjusted p-values [default: 0.05]
        #[arg(short, long)]
        alpha: Option<f64>,

        /// Minimum absolute log fold change to call a feature significant [default: 0]
        #[arg(long)]
        min_lfc: Option<f64>,

        /// Multiple testing correction: bh or bonferroni [default: bh]
        #[arg(long)]
        correction: Option<String>,

        /// Gene set file (.gmt, .json or long table)
        #[arg(long, value_name = "FILE",
            long_help = "Gene set catalog.\n\
                .gmt:  name, description, genes... per line\n\
                .json: {\"SET\": [\"GENE\", ...]}\n\
                other: table with gene_set and feature_id columns\n\
                If the file does not exist the embedded cancer catalog is used.")]
        gene_sets: Option<PathBuf>,

        /// Minimum set members in the universe [default: 5]
        #[arg(long)]
        min_overlap: Option<usize>,

        /// Maximum set members in the universe
        #[arg(long)]
        max_set_size: Option<usize>,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        #[command(flatten)]
        prepare: PrepareArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Deduplicate, filter and normalize a matrix
    #[command(
        long_about = "Deduplicate, filter and normalize a feature x sample matrix.\n\n\
            Outputs the normalized matrix with missing values written as NA.",
        after_long_help = "\
Examples:
  omics_compare normalize -x rna_counts.tsv -n logcpm --min-samples 3
  omics_compare normalize -x protein.tsv -n median_centered -p cptac"
    )]
    Normalize {
        /// Feature x sample matrix (CSV or TSV)
        #[arg(short = 'x', long)]
        matrix: PathBuf,

        #[command(flatten)]
        prepare: PrepareArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Gene set enrichment of a differential table
    #[command(
        long_about = "Over-representation analysis of a differential table.\n\n\
            For each contrast, significant features with positive and negative fold\n\
            change are tested separately against every gene set (hypergeometric test,\n\
            Benjamini-Hochberg across sets).",
        after_long_help = "\
Examples:
  omics_compare enrich -i brca_differential_20240301.csv --gene-sets hallmark.gmt"
    )]
    Enrich {
        /// Differential table written by `compare`
        #[arg(short, long)]
        input: PathBuf,

        /// Gene set file (.gmt, .json or long table)
        #[arg(long, value_name = "FILE")]
        gene_sets: Option<PathBuf>,

        /// Minimum set members in the universe [default: 5]
        #[arg(long)]
        min_overlap: Option<usize>,

        /// Maximum set members in the universe
        #[arg(long)]
        max_set_size: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Correlate fold changes of two modalities
    #[command(
        long_about = "Correlate two differential tables.\n\n\
            Joins the tables on contrast and feature ID, labels each pair by direction\n\
            agreement, and reports per-contrast and per-gene-set correlation with\n\
            strength bins (strong >= 0.7, moderate >= 0.4, weak otherwise).",
        after_long_help = "\
Examples:
  omics_compare integrate --left rna_differential.csv --right protein_differential.csv
  omics_compare integrate --left rna.csv --right protein.csv --method spearman"
    )]
    Integrate {
        /// Differential table of the first modality
        #[arg(long)]
        left: PathBuf,

        /// Differential table of the second modality
        #[arg(long)]
        right: PathBuf,

        /// Correlation method: pearson or spearman [default: pearson]
        #[arg(long)]
        method: Option<String>,

        /// Gene set file used for per-set correlation
        #[arg(long, value_name = "FILE")]
        gene_sets: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compare() {
        let cli = Cli::try_parse_from([
            "omics_compare",
            "compare",
            "-x",
            "m.tsv",
            "-m",
            "s.tsv",
            "-g",
            "subtype",
            "--numerator",
            "Basal",
            "--denominator",
            "LumA",
            "-n",
            "log2",
            "-p",
            "brca",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Compare {
                group,
                numerator,
                prepare,
                output,
                ..
            }) => {
                assert_eq!(group.as_deref(), Some("subtype"));
                assert_eq!(numerator.as_deref(), Some("Basal"));
                assert_eq!(prepare.normalization.as_deref(), Some("log2"));
                assert_eq!(output.prefix.as_deref(), Some("brca"));
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn test_numerator_requires_denominator() {
        let parsed = Cli::try_parse_from([
            "omics_compare",
            "compare",
            "-x",
            "m.tsv",
            "-m",
            "s.tsv",
            "--numerator",
            "Basal",
        ]);
        assert!(parsed.is_err());
    }
}
