//! # survplot
//!
//! kaplan-meier curves and expression distribution plots over joined sample tables
//!
//! ## what you get
//!
//! - csv tables w/ an inner join on sample ids and group-by on a label column
//! - kaplan-meier estimates w/ log(-log) greenwood confidence bands
//! - log-rank test across groups
//! - box + violin summaries of expression columns
//! - svg output for all of it
//!
//! ## quick start
//!
//! ```rust
//! use survplot::{KaplanMeierFitter, SurvivalData};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let times = vec![1.0, 2.5, 3.2, 4.1];
//! let events = vec![true, false, true, true]; // true = died, false = censored
//! let data = SurvivalData::new(times, events)?;
//!
//! let curve = KaplanMeierFitter::new()
//!     .with_label("cohort")
//!     .fit(&data)?;
//!
//! assert_eq!(curve.survival_at(1.0), 0.75);
//! assert_eq!(curve.median_survival_time(), Some(3.2));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod kaplan_meier;
pub mod logrank;
pub mod pipeline;
pub mod plot;
pub mod stats;
pub mod table;

pub use config::AnalysisConfig;
pub use data::SurvivalData;
pub use error::{Result, SurvError};
pub use kaplan_meier::{KaplanMeierFitter, SurvivalCurve};
pub use logrank::{logrank_test, LogRankResult};
pub use table::Table;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_functionality() {
        let n_samples = 100;

        let times = vec![1.0; n_samples];
        let events = vec![true; n_samples];

        let data = SurvivalData::new(times, events).unwrap();
        let curve = KaplanMeierFitter::new().fit(&data).unwrap();
        assert_eq!(curve.n_samples(), n_samples);
        assert_eq!(curve.survival_at(1.0), 0.0);
    }
}
