//! survplot - CLI entry point
//!
//! Joins a sample table w/ its group info and writes survival + distribution plots.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use survplot::pipeline::{self, Step};
use survplot::AnalysisConfig;

#[derive(Parser)]
#[command(name = "survplot")]
#[command(version)]
#[command(about = "Kaplan-Meier curves and expression plots over joined sample tables")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Primary table (one row per sample)
    #[arg(long, default_value = "dataset.csv", global = true)]
    dataset: PathBuf,

    /// Auxiliary table joined onto the dataset
    #[arg(long, default_value = "group_info.csv", global = true)]
    group_info: PathBuf,

    /// Join key in the dataset
    #[arg(long, default_value = "sample_id", global = true)]
    left_on: String,

    /// Join key in the group info table
    #[arg(long, default_value = "id", global = true)]
    right_on: String,

    /// Duration column for the overall curve
    #[arg(long, default_value = "Time", global = true)]
    time_col: String,

    /// Censoring indicator column for the overall curve (1 = event, 0 = censored)
    #[arg(long, default_value = "Censoring", global = true)]
    event_col: String,

    /// Expression columns for the example panels
    #[arg(long, value_delimiter = ',', default_value = "gene_1,gene_2,gene_3,gene_4", global = true)]
    genes: Vec<String>,

    /// Table for the grouped curves (defaults to the joined dataset)
    #[arg(long, global = true)]
    group_input: Option<PathBuf>,

    /// Label column to group by
    #[arg(long, default_value = "histologicalDiagnosis.label", global = true)]
    group_col: String,

    /// Duration column for the grouped curves
    #[arg(long, default_value = "info.cnvstatistics.cnvcoverage", global = true)]
    group_time_col: String,

    /// Censoring indicator column for the grouped curves
    #[arg(long, default_value = "info.death", global = true)]
    group_event_col: String,

    /// Where plots and tables go
    #[arg(short, long, default_value = "plots", global = true)]
    out_dir: PathBuf,

    /// Confidence level is 1 - alpha
    #[arg(long, default_value = "0.05", global = true)]
    alpha: f64,

    /// Don't shade confidence bands
    #[arg(long, global = true)]
    no_ci: bool,

    /// Mark censored samples on the curves
    #[arg(long, global = true)]
    censors: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Kaplan-Meier curve over the joined dataset
    Km,
    /// Box and violin plots of expression columns
    Explore,
    /// One Kaplan-Meier curve per group label + log-rank test
    Groups,
    /// Everything above (default)
    All,
}

impl From<Commands> for Step {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Km => Step::Km,
            Commands::Explore => Step::Explore,
            Commands::Groups => Step::Groups,
            Commands::All => Step::All,
        }
    }
}

impl Cli {
    fn config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::new()
            .with_inputs(&self.dataset, &self.group_info)
            .with_join_keys(&self.left_on, &self.right_on)
            .with_survival_columns(&self.time_col, &self.event_col)
            .with_gene_columns(self.genes.clone())
            .with_group_columns(&self.group_col, &self.group_time_col, &self.group_event_col)
            .with_output_dir(&self.out_dir)
            .with_alpha(self.alpha)
            .with_confidence_bands(!self.no_ci)
            .with_censor_marks(self.censors);
        if let Some(path) = &self.group_input {
            config = config.with_group_input(path);
        }
        config
    }
}

fn run(cli: Cli) -> survplot::Result<()> {
    let config = cli.config();
    let step = cli.command.unwrap_or(Commands::All).into();

    let report = pipeline::run(&config, step)?;

    if let Some(curve) = &report.overall {
        curve.print();
        println!();
    }
    if let Some(logrank) = &report.logrank {
        let labels: Vec<String> = report.groups.iter().map(|c| c.label().to_string()).collect();
        logrank.print(&labels);
        println!();
    }
    for path in &report.written {
        println!("wrote {}", path.display());
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_config() {
        let cli = Cli::try_parse_from(["survplot"]).unwrap();
        assert!(cli.command.is_none());

        let config = cli.config();
        let defaults = AnalysisConfig::default();
        assert_eq!(config.dataset_path, defaults.dataset_path);
        assert_eq!(config.gene_columns, defaults.gene_columns);
        assert_eq!(config.group_column, defaults.group_column);
        assert!(config.show_ci);
        assert!(!config.show_censors);
        assert!(config.group_input.is_none());
    }

    #[test]
    fn test_overrides_reach_config() {
        let cli = Cli::try_parse_from([
            "survplot", "groups",
            "--no-ci", "--censors",
            "--genes", "a,b,c",
            "--alpha", "0.1",
            "--group-input", "sarcoma.csv",
            "-o", "out",
        ]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Groups)));

        let config = cli.config();
        assert!(!config.show_ci);
        assert!(config.show_censors);
        assert_eq!(config.gene_columns, vec!["a", "b", "c"]);
        assert_eq!(config.alpha, 0.1);
        assert_eq!(config.group_input, Some(PathBuf::from("sarcoma.csv")));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }
}
