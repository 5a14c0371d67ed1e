use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::{
    config::AnalysisConfig,
    data::SurvivalData,
    error::Result,
    kaplan_meier::{write_curves_csv, KaplanMeierFitter, SurvivalCurve},
    logrank::{logrank_test, LogRankResult},
    plot::{plot_distributions, plot_survival, DistributionPanel, Orientation, PanelKind, SurvivalPlotOptions},
    table::Table,
};

pub const KM_PLOT: &str = "km.svg";
pub const KM_TABLE: &str = "km_table.csv";
pub const EXAMPLES_PLOT: &str = "plotting_examples.svg";
pub const GROUPS_PLOT: &str = "km_groups.svg";
pub const GROUPS_TABLE: &str = "km_groups_table.csv";

/// which part of the analysis to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Km,       // overall curve
    Explore,  // box + violin panels
    Groups,   // one curve per group label
    All,
}

/// what a run produced
#[derive(Debug, Default)]
pub struct RunReport {
    pub written: Vec<PathBuf>,
    pub overall: Option<SurvivalCurve>,
    pub groups: Vec<SurvivalCurve>,
    pub logrank: Option<LogRankResult>,
}

/// read both inputs and inner join them on the configured keys
pub fn load_joined(config: &AnalysisConfig) -> Result<Table> {
    let dataset = Table::from_path(&config.dataset_path)?;
    let group_info = Table::from_path(&config.group_info_path)?;

    let joined = dataset.inner_join(&group_info, &config.left_on, &config.right_on)?;
    log::info!(
        "joined {} ({} rows) w/ {} ({} rows) -> {} rows",
        config.dataset_path.display(),
        dataset.n_rows(),
        config.group_info_path.display(),
        group_info.n_rows(),
        joined.n_rows()
    );
    Ok(joined)
}

/// kaplan-meier over every row of the table
pub fn overall_curve(table: &Table, config: &AnalysisConfig) -> Result<SurvivalCurve> {
    let data = SurvivalData::from_table(table, &config.time_column, &config.event_column)?;
    log::info!(
        "fitting overall curve: {} samples, {} events, {} censored",
        data.n_samples(),
        data.n_events(),
        data.n_censored()
    );

    KaplanMeierFitter::new()
        .with_alpha(config.alpha)
        .with_label("all samples")
        .fit(&data)
}

/// "gene_1" -> "Gene_1"
fn display_name(column: &str) -> String {
    let mut chars = column.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// the four example panels: box + violin, each vertical and horizontal
///
/// the first two gene columns feed the vertical panels, the next two the
/// horizontal ones (falling back to the first pair when fewer are configured)
pub fn example_panels(table: &Table, config: &AnalysisConfig) -> Result<Vec<DistributionPanel>> {
    let genes = &config.gene_columns;
    let first = &genes[..genes.len().min(2)];
    let second = if genes.len() > 2 { &genes[2..genes.len().min(4)] } else { first };

    let load = |columns: &[String]| -> Result<Vec<(String, Vec<f64>)>> {
        columns
            .iter()
            .map(|c| Ok((display_name(c), table.numeric_column(c)?)))
            .collect()
    };
    let first = load(first)?;
    let second = load(second)?;

    let layout = [
        ("boxplot_1", PanelKind::Box, Orientation::Vertical, &first),
        ("boxplot_2", PanelKind::Box, Orientation::Horizontal, &second),
        ("violinplot_1", PanelKind::Violin, Orientation::Vertical, &first),
        ("violinplot_2", PanelKind::Violin, Orientation::Horizontal, &second),
    ];

    Ok(layout
        .into_iter()
        .map(|(title, kind, orientation, series)| {
            series.iter().fold(
                DistributionPanel::new(title, kind, orientation).with_axis_labels("Genes", "Expression"),
                |panel, (name, values)| panel.with_series(name.clone(), values.clone()),
            )
        })
        .collect())
}

/// one curve per distinct group label (first-appearance order) + log-rank across them
pub fn grouped_curves(
    table: &Table,
    config: &AnalysisConfig,
) -> Result<(Vec<SurvivalCurve>, Option<LogRankResult>)> {
    let groups = table.group_by(&config.group_column)?;
    log::info!("{} groups in '{}'", groups.len(), config.group_column);

    let mut curves = Vec::with_capacity(groups.len());
    let mut samples = Vec::with_capacity(groups.len());
    for (label, group) in &groups {
        let data = SurvivalData::from_table(group, &config.group_time_column, &config.group_event_column)?;
        log::debug!("group '{}': {} samples, {} events", label, data.n_samples(), data.n_events());

        curves.push(
            KaplanMeierFitter::new()
                .with_alpha(config.alpha)
                .with_label(label.as_str())
                .fit(&data)?,
        );
        samples.push(data);
    }

    let logrank = if samples.len() < 2 {
        log::warn!("fewer than 2 groups, skipping log-rank test");
        None
    } else {
        match logrank_test(&samples) {
            Ok(result) => {
                log::info!(
                    "log-rank: chi2 = {:.4}, dof = {}, p = {:.4}",
                    result.statistic,
                    result.degrees_of_freedom,
                    result.p_value
                );
                Some(result)
            }
            Err(e) => {
                log::warn!("log-rank test skipped: {}", e);
                None
            }
        }
    };

    Ok((curves, logrank))
}

fn write_table(curves: &[SurvivalCurve], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_curves_csv(curves, BufWriter::new(file))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn survival_options(config: &AnalysisConfig, title: &str, x_label: &str) -> SurvivalPlotOptions {
    SurvivalPlotOptions {
        title: title.to_string(),
        x_label: x_label.to_string(),
        show_ci: config.show_ci,
        show_censors: config.show_censors,
        size: (config.width, config.height),
        ..SurvivalPlotOptions::default()
    }
}

fn km_step(table: &Table, config: &AnalysisConfig, report: &mut RunReport) -> Result<()> {
    let curve = overall_curve(table, config)?;

    let plot_path = config.output_dir.join(KM_PLOT);
    let options = survival_options(config, "Kaplan-Meier estimate", &config.time_column);
    plot_survival(std::slice::from_ref(&curve), &options, &plot_path)?;

    let table_path = config.output_dir.join(KM_TABLE);
    write_table(std::slice::from_ref(&curve), &table_path)?;

    report.written.push(plot_path);
    report.written.push(table_path);
    report.overall = Some(curve);
    Ok(())
}

fn explore_step(table: &Table, config: &AnalysisConfig, report: &mut RunReport) -> Result<()> {
    let panels = example_panels(table, config)?;
    let path = config.output_dir.join(EXAMPLES_PLOT);
    plot_distributions(&panels, "Plotting Examples", &path, (config.width, config.height))?;
    report.written.push(path);
    Ok(())
}

fn groups_step(table: &Table, config: &AnalysisConfig, report: &mut RunReport) -> Result<()> {
    let (curves, logrank) = grouped_curves(table, config)?;

    let plot_path = config.output_dir.join(GROUPS_PLOT);
    let mut options = survival_options(config, &config.group_column, &config.group_time_column);
    options.show_ci = false; // overlaid bands turn to mud
    plot_survival(&curves, &options, &plot_path)?;

    let table_path = config.output_dir.join(GROUPS_TABLE);
    write_table(&curves, &table_path)?;

    report.written.push(plot_path);
    report.written.push(table_path);
    report.groups = curves;
    report.logrank = logrank;
    Ok(())
}

/// run one step (or all of them), writing plots + tables into the output dir
pub fn run(config: &AnalysisConfig, step: Step) -> Result<RunReport> {
    config.validate()?;
    fs::create_dir_all(&config.output_dir)?;

    let mut report = RunReport::default();

    // the grouped step can read its own table and skip the join
    if step == Step::Groups {
        if let Some(path) = &config.group_input {
            let table = Table::from_path(path)?;
            groups_step(&table, config, &mut report)?;
            return Ok(report);
        }
    }

    let joined = load_joined(config)?;
    match step {
        Step::Km => km_step(&joined, config, &mut report)?,
        Step::Explore => explore_step(&joined, config, &mut report)?,
        Step::Groups => groups_step(&joined, config, &mut report)?,
        Step::All => {
            km_step(&joined, config, &mut report)?;
            explore_step(&joined, config, &mut report)?;
            match &config.group_input {
                Some(path) => groups_step(&Table::from_path(path)?, config, &mut report)?,
                None => groups_step(&joined, config, &mut report)?,
            }
        }
    }

    Ok(report)
}

/// overall curve + its life table
pub fn run_km(config: &AnalysisConfig) -> Result<RunReport> {
    run(config, Step::Km)
}

/// box + violin panels of the gene columns
pub fn run_explore(config: &AnalysisConfig) -> Result<RunReport> {
    run(config, Step::Explore)
}

/// one curve per group label + log-rank test
pub fn run_groups(config: &AnalysisConfig) -> Result<RunReport> {
    run(config, Step::Groups)
}

pub fn run_all(config: &AnalysisConfig) -> Result<RunReport> {
    run(config, Step::All)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined() -> Table {
        let csv = "sample_id,Time,Censoring,gene_1,gene_2,gene_3,gene_4,id,histologicalDiagnosis.label\n\
                   s1,5,1,1.0,2.0,3.0,4.0,s1,A\n\
                   s2,8,0,1.5,2.5,3.5,4.5,s2,B\n\
                   s3,3,1,0.5,1.5,2.5,3.5,s3,A\n\
                   s4,9,1,2.0,3.0,4.0,5.0,s4,B\n";
        Table::from_reader(csv.as_bytes(), b',').unwrap()
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("gene_1"), "Gene_1");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_overall_curve() {
        let curve = overall_curve(&joined(), &AnalysisConfig::default()).unwrap();
        assert_eq!(curve.n_samples(), 4);
        assert_eq!(curve.label(), "all samples");
    }

    #[test]
    fn test_example_panels_layout() {
        let panels = example_panels(&joined(), &AnalysisConfig::default()).unwrap();
        let titles: Vec<&str> = panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["boxplot_1", "boxplot_2", "violinplot_1", "violinplot_2"]);

        assert_eq!(panels[0].series[0].0, "Gene_1");
        assert_eq!(panels[1].series[1].0, "Gene_4");
        assert_eq!(panels[1].orientation, Orientation::Horizontal);
        assert_eq!(panels[2].kind, PanelKind::Violin);
        assert_eq!(panels[3].series[0].1, vec![3.0, 3.5, 2.5, 4.0]);
    }

    #[test]
    fn test_example_panels_with_two_genes() {
        let config = AnalysisConfig::new().with_gene_columns(vec!["gene_1".into(), "gene_2".into()]);
        let panels = example_panels(&joined(), &config).unwrap();
        assert_eq!(panels[1].series[0].0, "Gene_1");
    }

    #[test]
    fn test_grouped_curves() {
        let config = AnalysisConfig::new()
            .with_group_columns("histologicalDiagnosis.label", "Time", "Censoring");
        let (curves, logrank) = grouped_curves(&joined(), &config).unwrap();

        let labels: Vec<&str> = curves.iter().map(SurvivalCurve::label).collect();
        assert_eq!(labels, vec!["A", "B"]);
        assert_eq!(curves[0].n_samples() + curves[1].n_samples(), 4);
        assert_eq!(logrank.unwrap().degrees_of_freedom, 1);
    }

    #[test]
    fn test_single_group_skips_logrank() {
        let csv = "g,t,e\nx,1,1\nx,2,0\n";
        let table = Table::from_reader(csv.as_bytes(), b',').unwrap();
        let config = AnalysisConfig::new().with_group_columns("g", "t", "e");

        let (curves, logrank) = grouped_curves(&table, &config).unwrap();
        assert_eq!(curves.len(), 1);
        assert!(logrank.is_none());
    }

    #[test]
    fn test_singular_logrank_still_returns_curves() {
        // group z is censored before anyone has an event
        let csv = "g,t,e\nx,1,1\nx,2,1\nz,0.5,0\nx,3,0\ny,1.5,1\ny,2.5,0\ny,4,1\n";
        let table = Table::from_reader(csv.as_bytes(), b',').unwrap();
        let config = AnalysisConfig::new().with_group_columns("g", "t", "e");

        let (curves, logrank) = grouped_curves(&table, &config).unwrap();
        let labels: Vec<&str> = curves.iter().map(SurvivalCurve::label).collect();
        assert_eq!(labels, vec!["x", "z", "y"]);
        assert_eq!(curves[1].n_samples(), 1);
        assert!(logrank.is_none());
    }

    #[test]
    fn test_run_groups_writes_plot_without_logrank() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("groups.csv");
        fs::write(&input, "g,t,e\nx,1,1\nz,0.5,0\nx,3,0\ny,1.5,1\ny,4,1\n").unwrap();
        let config = AnalysisConfig::new()
            .with_group_input(&input)
            .with_group_columns("g", "t", "e")
            .with_output_dir(dir.path().join("out"));

        let report = run_groups(&config).unwrap();
        assert_eq!(report.groups.len(), 3);
        assert!(report.logrank.is_none());
        assert!(config.output_dir.join(GROUPS_PLOT).exists());
        assert!(config.output_dir.join(GROUPS_TABLE).exists());
    }
}
