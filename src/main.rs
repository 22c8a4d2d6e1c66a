//! omics_compare command-line interface

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{info, LevelFilter};

use omics_compare::cli::{Cli, Commands, OutputArgs, PrepareArgs};
use omics_compare::enrichment::enrich_records;
use omics_compare::io::{
    write_aligned_pairs, write_correlation_table, write_differential_table,
    write_enrichment_table, write_matrix, write_skipped, write_volcano,
};
use omics_compare::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Find the first non-flag argument (potential subcommand)
    let first_positional = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let subcommands = ["compare", "normalize", "enrich", "integrate", "help"];
    let has_subcommand = first_positional.map_or(false, |a| subcommands.contains(&a.as_str()));

    if !has_subcommand {
        if args.len() == 1 {
            print_no_args();
            return;
        }
        if args.iter().any(|a| a == "--help") {
            print_long_help();
            return;
        }
        if args.iter().any(|a| a == "-h") {
            print_short_help();
            return;
        }
        if args.iter().any(|a| a == "-V" || a == "--version") {
            println!("omics_compare {}", VERSION);
            return;
        }
        print_no_args();
        return;
    }

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Compare {
            matrix,
            metadata,
            group,
            numerator,
            denominator,
            all_pairs,
            one_vs_rest,
            subset,
            test,
            alpha,
            min_lfc,
            correction,
            gene_sets,
            min_overlap,
            max_set_size,
            threads,
            prepare,
            output,
        }) => build_compare_config(
            group,
            numerator,
            denominator,
            all_pairs,
            one_vs_rest,
            subset,
            test,
            alpha,
            min_lfc,
            correction,
            gene_sets,
            min_overlap,
            max_set_size,
            &prepare,
            &output,
        )
        .and_then(|config| run_compare(&matrix, &metadata, &config, threads)),
        Some(Commands::Normalize {
            matrix,
            prepare,
            output,
        }) => base_config(&output)
            .and_then(|config| apply_prepare(config, &prepare))
            .and_then(|config| run_normalize(&matrix, &config)),
        Some(Commands::Enrich {
            input,
            gene_sets,
            min_overlap,
            max_set_size,
            output,
        }) => base_config(&output).and_then(|mut config| {
            config.gene_sets = gene_sets.or(config.gene_sets);
            if let Some(m) = min_overlap {
                config.enrichment.min_overlap = m;
            }
            if max_set_size.is_some() {
                config.enrichment.max_set_size = max_set_size;
            }
            run_enrich(&input, &config)
        }),
        Some(Commands::Integrate {
            left,
            right,
            method,
            gene_sets,
            output,
        }) => base_config(&output).and_then(|mut config| {
            if let Some(m) = method {
                config.correlation = CorrelationMethod::from_name(&m)?;
            }
            config.gene_sets = gene_sets.or(config.gene_sets);
            run_integrate(&left, &right, &config)
        }),
        None => {
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Custom help output
// ---------------------------------------------------------------------------

fn print_no_args() {
    println!("omics_compare v{}", VERSION);
    println!("Run `omics_compare -h` for usage or `omics_compare --help` for detailed information.");
}

fn print_short_help() {
    println!("omics_compare v{}", VERSION);
    println!();
    println!("Usage: omics_compare <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  compare    Compare sample groups and run enrichment");
    println!("  normalize  Deduplicate, filter and normalize a matrix");
    println!("  enrich     Gene set enrichment of a differential table");
    println!("  integrate  Correlate fold changes of two modalities");
    println!();
    println!("Run `omics_compare <COMMAND> -h` for command-specific options.");
}

fn print_long_help() {
    println!("omics_compare v{}", VERSION);
    println!("Group comparisons, gene set enrichment and cross-modality integration for omics tables");
    println!();
    println!("Usage: omics_compare <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  compare    Compare sample groups and run enrichment");
    println!("               - Pairwise, all-pairs or one-vs-rest contrasts");
    println!("               - Welch, Student or Wilcoxon tests with BH per contrast");
    println!("               - Hypergeometric enrichment of up and down lists");
    println!("  normalize  Deduplicate, filter and normalize a matrix");
    println!("  enrich     Gene set enrichment of a differential table");
    println!("  integrate  Correlate fold changes of two modalities");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h               Print short help");
    println!("      --help       Print detailed help");
    println!("  -V, --version    Print version");
    println!();
    println!("Outputs are written as <prefix>_<stage>_<YYYYMMDD>.csv.");
    println!();
    println!("Examples:");
    println!("  omics_compare compare -x rna_counts.tsv -m samples.tsv -g subtype \\");
    println!("    --numerator Basal --denominator LumA -p brca");
    println!();
    println!("  omics_compare compare -x protein.tsv -m samples.tsv -g subtype \\");
    println!("    --one-vs-rest -n median_centered --gene-sets hallmark.gmt");
    println!();
    println!("  omics_compare integrate --left rna.csv --right protein.csv --method spearman");
}

// ---------------------------------------------------------------------------
// Configuration assembly
// ---------------------------------------------------------------------------

fn base_config(output: &OutputArgs) -> Result<AnalysisConfig> {
    let mut config = match &output.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(dir) = &output.outdir {
        config.output_dir = dir.clone();
    }
    if let Some(prefix) = &output.prefix {
        config.prefix = prefix.clone();
    }
    Ok(config)
}

fn apply_prepare(mut config: AnalysisConfig, prepare: &PrepareArgs) -> Result<AnalysisConfig> {
    let pseudocount = prepare.pseudocount.unwrap_or(1.0);
    if pseudocount < 0.0 {
        return Err(OmicsError::InvalidInput {
            reason: format!("pseudocount must be non-negative, got {}", pseudocount),
        });
    }
    if let Some(name) = &prepare.normalization {
        config.normalization = NormalizationMethod::from_name(name, pseudocount)?;
    } else if prepare.pseudocount.is_some() {
        config.normalization = with_pseudocount(config.normalization, pseudocount);
    }
    if let Some(v) = prepare.min_value {
        config.filter.min_value = Some(v);
    }
    if let Some(n) = prepare.min_samples {
        config.filter.min_samples = n;
    }
    Ok(config)
}

fn with_pseudocount(method: NormalizationMethod, pseudocount: f64) -> NormalizationMethod {
    match method {
        NormalizationMethod::None => NormalizationMethod::None,
        NormalizationMethod::Log2 { .. } => NormalizationMethod::Log2 { pseudocount },
        NormalizationMethod::LogCpm { .. } => NormalizationMethod::LogCpm { pseudocount },
        NormalizationMethod::LogMedianRatio { .. } => {
            NormalizationMethod::LogMedianRatio { pseudocount }
        }
        NormalizationMethod::Log2MedianCentered { .. } => {
            NormalizationMethod::Log2MedianCentered { pseudocount }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_compare_config(
    group: Option<String>,
    numerator: Option<String>,
    denominator: Option<String>,
    all_pairs: bool,
    one_vs_rest: bool,
    subset: Option<String>,
    test: Option<String>,
    alpha: Option<f64>,
    min_lfc: Option<f64>,
    correction: Option<String>,
    gene_sets: Option<PathBuf>,
    min_overlap: Option<usize>,
    max_set_size: Option<usize>,
    prepare: &PrepareArgs,
    output: &OutputArgs,
) -> Result<AnalysisConfig> {
    let mut config = apply_prepare(base_config(output)?, prepare)?;

    if let Some(g) = group {
        config.group_column = g;
    }

    let mut contrasts = Vec::new();
    if let (Some(num), Some(den)) = (&numerator, &denominator) {
        contrasts.push(ContrastSpec::pair(num, den));
    }
    if all_pairs {
        contrasts.push(ContrastSpec::AllPairs);
    }
    if one_vs_rest {
        contrasts.push(ContrastSpec::OneVsRest);
    }
    if !contrasts.is_empty() {
        config.contrasts = contrasts;
    }

    if let Some(spec) = subset {
        let (column, value) = spec.split_once('=').ok_or_else(|| OmicsError::InvalidInput {
            reason: format!("Invalid subset '{}'. Use: COLUMN=VALUE", spec),
        })?;
        config.subset = Some(SampleSubset {
            column: column.to_string(),
            value: value.to_string(),
        });
    }

    if let Some(t) = test {
        config.comparator.method = TestMethod::from_name(&t)?;
    }
    if let Some(a) = alpha {
        config.comparator.alpha = a;
    }
    if let Some(m) = min_lfc {
        config.comparator.min_lfc = m;
    }
    if let Some(c) = correction {
        config.comparator.correction = match c.as_str() {
            "bh" | "fdr" => Correction::BenjaminiHochberg,
            "bonferroni" => Correction::Bonferroni,
            other => {
                return Err(OmicsError::InvalidInput {
                    reason: format!("Unknown correction '{}'. Use: bh, bonferroni", other),
                })
            }
        };
    }

    config.gene_sets = gene_sets.or(config.gene_sets);
    if let Some(m) = min_overlap {
        config.enrichment.min_overlap = m;
    }
    if max_set_size.is_some() {
        config.enrichment.max_set_size = max_set_size;
    }

    config.validate()?;
    Ok(config)
}

fn naming(config: &AnalysisConfig) -> Result<OutputNaming> {
    let naming = OutputNaming::today(&config.output_dir, &config.prefix);
    naming.ensure_dir()?;
    Ok(naming)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn run_compare(
    matrix_path: &Path,
    metadata_path: &Path,
    config: &AnalysisConfig,
    threads: usize,
) -> Result<()> {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    info!("Loading feature matrix from: {}", matrix_path.display());
    let matrix = read_feature_matrix(matrix_path)?;
    info!("  {} features, {} samples", matrix.n_features(), matrix.n_samples());

    info!("Loading metadata from: {}", metadata_path.display());
    let metadata = read_metadata(metadata_path)?;

    let output = run_comparison(&matrix, &metadata, config)?;
    let naming = naming(config)?;

    for results in &output.report.results {
        print!("{}", results.summary());
    }

    let path = naming.path("differential");
    write_differential_table(&path, &output.report)?;
    info!("Differential results written to: {}", path.display());

    let path = naming.path("volcano");
    write_volcano(&path, &output.report)?;
    info!("Volcano coordinates written to: {}", path.display());

    if !output.report.skipped.is_empty() {
        let path = naming.path("skipped");
        write_skipped(&path, &output.report.skipped)?;
        info!(
            "{} skipped contrast(s) written to: {}",
            output.report.skipped.len(),
            path.display()
        );
    }

    let path = naming.path("enrichment");
    write_enrichment_table(&path, &output.enrichment)?;
    info!(
        "Enrichment results ({}) written to: {}",
        output.gene_set_source,
        path.display()
    );

    Ok(())
}

fn run_normalize(matrix_path: &Path, config: &AnalysisConfig) -> Result<()> {
    info!("Loading feature matrix from: {}", matrix_path.display());
    let matrix = read_feature_matrix(matrix_path)?;

    let deduplicated = matrix.deduplicate_features()?;
    let filtered =
        deduplicated.filter_low_detection(config.detection_threshold(), config.filter.min_samples)?;
    info!("Normalizing ({:?})...", config.normalization);
    let normalized = normalize(&filtered, config.normalization)?;

    let path = naming(config)?.path("normalized");
    write_matrix(&path, &normalized)?;
    info!("Normalized matrix written to: {}", path.display());
    Ok(())
}

fn run_enrich(input: &Path, config: &AnalysisConfig) -> Result<()> {
    info!("Loading differential table from: {}", input.display());
    let records = read_differential_table(input)?;
    let catalog = resolve_catalog(config.gene_sets.as_deref())?;
    let enrichment = enrich_records(&records, &catalog, &config.enrichment)?;

    let path = naming(config)?.path("enrichment");
    write_enrichment_table(&path, &enrichment)?;
    info!("{} enrichment records written to: {}", enrichment.len(), path.display());
    Ok(())
}

fn run_integrate(left: &Path, right: &Path, config: &AnalysisConfig) -> Result<()> {
    info!("Loading left table from: {}", left.display());
    let left = read_differential_table(left)?;
    info!("Loading right table from: {}", right.display());
    let right = read_differential_table(right)?;

    let output = run_integration(&left, &right, config)?;
    let naming = naming(config)?;

    let path = naming.path("aligned");
    write_aligned_pairs(&path, &output.pairs)?;
    info!("Aligned pairs written to: {}", path.display());

    let path = naming.path("correlation");
    write_correlation_table(&path, &output.by_contrast)?;
    info!("Per-contrast correlation written to: {}", path.display());

    let path = naming.path("geneset_correlation");
    write_correlation_table(&path, &output.by_gene_set)?;
    info!("Per-gene-set correlation written to: {}", path.display());

    for record in &output.by_contrast {
        println!(
            "{}: r = {:.3} (n = {}, {:?})",
            record.contrast, record.coefficient, record.n, record.strength
        );
    }
    Ok(())
}
