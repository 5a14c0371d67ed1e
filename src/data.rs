use ndarray::{Array1, ArrayView1};
use crate::error::{Result, SurvError};
use crate::table::Table;

/// survival data - durations and whether the event was seen
#[derive(Debug, Clone)]
pub struct SurvivalData {
    times: Array1<f64>,    // time to event/censoring
    events: Array1<bool>,  // true = event, false = censored
}

impl SurvivalData {
    /// make new survival data from raw vecs
    pub fn new(
        times: Vec<f64>,    // survival/censoring times
        events: Vec<bool>,  // true = event occurred, false = censored
    ) -> Result<Self> {
        let n_samples = times.len();

        if events.len() != n_samples {
            return Err(SurvError::invalid_dimensions(
                format!("times len ({}) != events len ({})", n_samples, events.len())
            ));
        }

        if n_samples == 0 {
            return Err(SurvError::invalid_survival_data("no samples"));
        }

        if times.iter().any(|&t| t < 0.0 || !t.is_finite()) {
            return Err(SurvError::invalid_survival_data(
                "survival times must be non-negative & finite"
            ));
        }

        Ok(Self {
            times: Array1::from(times),
            events: Array1::from(events),
        })
    }

    /// pull durations and event flags out of two table columns
    pub fn from_table(table: &Table, time_col: &str, event_col: &str) -> Result<Self> {
        let times = table.numeric_column(time_col)?;
        if let Some(i) = times.iter().position(|t| t.is_nan()) {
            return Err(SurvError::invalid_survival_data(
                format!("'{}' row {} has no duration", time_col, i)
            ));
        }

        let events = table
            .column(event_col)?
            .into_iter()
            .enumerate()
            .map(|(i, cell)| {
                parse_event(cell).ok_or_else(|| SurvError::invalid_survival_data(
                    format!("'{}' row {}: '{}' is not a valid censoring indicator", event_col, i, cell)
                ))
            })
            .collect::<Result<Vec<bool>>>()?;

        Self::new(times, events)
    }

    /// how many samples
    pub fn n_samples(&self) -> usize {
        self.times.len()
    }

    /// survival/censoring times
    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    /// event indicators (true = event, false = censored)
    pub fn events(&self) -> ArrayView1<'_, bool> {
        self.events.view()
    }

    pub fn n_events(&self) -> usize {
        self.events.iter().filter(|&&e| e).count()
    }

    pub fn n_censored(&self) -> usize {
        self.n_samples() - self.n_events()
    }

    /// unique event times in order
    pub fn event_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self.times
            .iter()
            .zip(self.events.iter())
            .filter_map(|(time, event)| if *event { Some(*time) } else { None })
            .collect();

        times.sort_by(f64::total_cmp);
        times.dedup();
        times
    }

    /// grab a subset of samples by indices
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        if indices.iter().any(|&i| i >= self.n_samples()) {
            return Err(SurvError::invalid_dimensions(
                "subset index out of bounds"
            ));
        }

        let times: Vec<f64> = indices.iter().map(|&i| self.times[i]).collect();
        let events: Vec<bool> = indices.iter().map(|&i| self.events[i]).collect();

        Self::new(times, events)
    }
}

/// read a censoring indicator cell: 1/0, true/false, yes/no
pub fn parse_event(cell: &str) -> Option<bool> {
    let cell = cell.trim();
    match cell.to_ascii_lowercase().as_str() {
        "true" | "yes" => return Some(true),
        "false" | "no" => return Some(false),
        _ => {}
    }

    match cell.parse::<f64>() {
        Ok(v) if v == 1.0 => Some(true),
        Ok(v) if v == 0.0 => Some(false),
        _ => None,
    }
}
