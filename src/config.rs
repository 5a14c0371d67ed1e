use std::path::PathBuf;

use crate::error::{Result, SurvError};

/// where the inputs live, which columns mean what, and how to draw
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub dataset_path: PathBuf,         // primary table
    pub group_info_path: PathBuf,      // auxiliary table joined onto it
    pub left_on: String,               // join key in the dataset
    pub right_on: String,              // join key in group info
    pub time_column: String,           // durations for the overall curve
    pub event_column: String,          // censoring indicator for the overall curve
    pub gene_columns: Vec<String>,     // first pair -> vertical panels, second -> horizontal
    pub group_input: Option<PathBuf>,  // separate table for grouped curves, joined data if None
    pub group_column: String,
    pub group_time_column: String,
    pub group_event_column: String,
    pub output_dir: PathBuf,
    pub alpha: f64,
    pub show_ci: bool,
    pub show_censors: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("dataset.csv"),
            group_info_path: PathBuf::from("group_info.csv"),
            left_on: "sample_id".to_string(),
            right_on: "id".to_string(),
            time_column: "Time".to_string(),
            event_column: "Censoring".to_string(),
            gene_columns: (1..=4).map(|i| format!("gene_{}", i)).collect(),
            group_input: None,
            group_column: "histologicalDiagnosis.label".to_string(),
            group_time_column: "info.cnvstatistics.cnvcoverage".to_string(),
            group_event_column: "info.death".to_string(),
            output_dir: PathBuf::from("plots"),
            alpha: 0.05,
            show_ci: true,
            show_censors: false,
            width: 800,
            height: 600,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs(mut self, dataset: impl Into<PathBuf>, group_info: impl Into<PathBuf>) -> Self {
        self.dataset_path = dataset.into();
        self.group_info_path = group_info.into();
        self
    }

    pub fn with_join_keys(mut self, left_on: impl Into<String>, right_on: impl Into<String>) -> Self {
        self.left_on = left_on.into();
        self.right_on = right_on.into();
        self
    }

    /// duration + censoring columns for the overall curve
    pub fn with_survival_columns(mut self, time: impl Into<String>, event: impl Into<String>) -> Self {
        self.time_column = time.into();
        self.event_column = event.into();
        self
    }

    pub fn with_gene_columns(mut self, genes: Vec<String>) -> Self {
        self.gene_columns = genes;
        self
    }

    /// label + duration + censoring columns for the per-group curves
    pub fn with_group_columns(
        mut self,
        group: impl Into<String>,
        time: impl Into<String>,
        event: impl Into<String>,
    ) -> Self {
        self.group_column = group.into();
        self.group_time_column = time.into();
        self.group_event_column = event.into();
        self
    }

    pub fn with_group_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.group_input = Some(path.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_confidence_bands(mut self, show: bool) -> Self {
        self.show_ci = show;
        self
    }

    pub fn with_censor_marks(mut self, show: bool) -> Self {
        self.show_censors = show;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// catch bad settings before any file is touched
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SurvError::invalid_parameter("alpha", self.alpha.to_string()));
        }
        if self.gene_columns.is_empty() {
            return Err(SurvError::invalid_parameter("gene_columns", "[]"));
        }
        if self.width < 100 || self.height < 100 {
            return Err(SurvError::invalid_parameter(
                "size",
                format!("{}x{}", self.width, self.height),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_sample_layout() {
        let config = AnalysisConfig::default();
        assert_eq!(config.dataset_path, PathBuf::from("dataset.csv"));
        assert_eq!(config.left_on, "sample_id");
        assert_eq!(config.right_on, "id");
        assert_eq!(config.gene_columns, vec!["gene_1", "gene_2", "gene_3", "gene_4"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = AnalysisConfig::new()
            .with_join_keys("patient", "patient")
            .with_survival_columns("os_days", "dead")
            .with_alpha(0.1)
            .with_censor_marks(true)
            .with_output_dir("out");

        assert_eq!(config.left_on, "patient");
        assert_eq!(config.time_column, "os_days");
        assert_eq!(config.alpha, 0.1);
        assert!(config.show_censors);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        assert!(AnalysisConfig::new().with_alpha(0.0).validate().is_err());
        assert!(AnalysisConfig::new().with_gene_columns(Vec::new()).validate().is_err());
        assert!(AnalysisConfig::new().with_size(10, 600).validate().is_err());
    }
}
