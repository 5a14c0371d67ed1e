use std::io::Write;

use ndarray::{Array1, ArrayView1};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{
    data::SurvivalData,
    error::{Result, SurvError},
};

/// label used when the fitter wasn't given one
pub const DEFAULT_LABEL: &str = "KM_estimate";

/// kaplan-meier fitter w/ exponential greenwood confidence bounds
#[derive(Debug, Clone)]
pub struct KaplanMeierFitter {
    alpha: f64,            // ci level is 1 - alpha
    label: Option<String>, // legend / table label
}

impl Default for KaplanMeierFitter {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            label: None,
        }
    }
}

impl KaplanMeierFitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// confidence level is 1 - alpha, checked at fit time
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// fit the product-limit estimator to the data
    pub fn fit(&self, data: &SurvivalData) -> Result<SurvivalCurve> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SurvError::invalid_parameter("alpha", self.alpha.to_string()));
        }

        let normal = Normal::new(0.0, 1.0).map_err(|e| SurvError::numerical_error(e.to_string()))?;
        let z = normal.inverse_cdf(1.0 - self.alpha / 2.0);

        let times = data.times();
        let events = data.events();
        let n = data.n_samples();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| times[a].total_cmp(&times[b]));

        let mut timeline = Vec::new();
        let mut at_risk = Vec::new();
        let mut observed = Vec::new();
        let mut censored = Vec::new();

        // curve always starts at t = 0
        if times[order[0]] > 0.0 {
            timeline.push(0.0);
            at_risk.push(n);
            observed.push(0);
            censored.push(0);
        }

        let mut remaining = n;
        let mut i = 0;
        while i < n {
            let t = times[order[i]];
            let (mut d, mut c) = (0usize, 0usize);
            while i < n && times[order[i]] == t {
                if events[order[i]] { d += 1 } else { c += 1 }
                i += 1;
            }

            timeline.push(t);
            at_risk.push(remaining);
            observed.push(d);
            censored.push(c);
            remaining -= d + c;
        }

        let m = timeline.len();
        let mut survival = Array1::zeros(m);
        let mut ci_lower = Array1::zeros(m);
        let mut ci_upper = Array1::zeros(m);

        let mut s = 1.0;
        let mut greenwood = 0.0; // sum d / (n (n - d))
        for k in 0..m {
            let (n_k, d_k) = (at_risk[k] as f64, observed[k] as f64);
            if d_k > 0.0 {
                s *= 1.0 - d_k / n_k;
                greenwood += if n_k > d_k { d_k / (n_k * (n_k - d_k)) } else { f64::INFINITY };
            }

            let (lo, hi) = log_log_bounds(s, greenwood, z);
            survival[k] = s;
            ci_lower[k] = lo;
            ci_upper[k] = hi;
        }

        let label = self.label.clone().unwrap_or_else(|| DEFAULT_LABEL.to_string());
        log::debug!(
            "fitted '{}': {} samples, {} events, {} timeline points",
            label,
            n,
            data.n_events(),
            m
        );

        Ok(SurvivalCurve {
            label,
            alpha: self.alpha,
            timeline: Array1::from(timeline),
            survival,
            ci_lower,
            ci_upper,
            at_risk,
            observed,
            censored,
        })
    }
}

/// exp(-exp(ln(-ln s) -/+ z sqrt(v) / ln s))
fn log_log_bounds(s: f64, greenwood: f64, z: f64) -> (f64, f64) {
    if s >= 1.0 {
        return (1.0, 1.0);
    }
    if s <= 0.0 {
        return (0.0, 0.0);
    }

    let log_s = s.ln();
    let spread = z * greenwood.sqrt() / log_s; // negative
    let lower = (-((-log_s).ln() - spread).exp()).exp();
    let upper = (-((-log_s).ln() + spread).exp()).exp();
    (lower, upper)
}

/// polyline through a right-continuous step function
pub(crate) fn step_polyline(timeline: ArrayView1<f64>, values: ArrayView1<f64>) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(timeline.len() * 2);
    for k in 0..timeline.len() {
        if k > 0 {
            points.push((timeline[k], values[k - 1]));
        }
        points.push((timeline[k], values[k]));
    }
    points
}

/// a fitted survival function + the life table behind it
#[derive(Debug, Clone)]
pub struct SurvivalCurve {
    label: String,
    alpha: f64,
    timeline: Array1<f64>,  // 0 then every distinct duration
    survival: Array1<f64>,  // S(t) at each timeline point
    ci_lower: Array1<f64>,
    ci_upper: Array1<f64>,
    at_risk: Vec<usize>,
    observed: Vec<usize>,   // events at t
    censored: Vec<usize>,   // censorings at t
}

/// one life-table row, the shape written to csv
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurvivalPoint {
    pub label: String,
    pub time: f64,
    pub at_risk: usize,
    pub observed: usize,
    pub censored: usize,
    pub survival: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

impl SurvivalCurve {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn n_samples(&self) -> usize {
        self.at_risk.first().copied().unwrap_or(0)
    }

    pub fn timeline(&self) -> ArrayView1<'_, f64> {
        self.timeline.view()
    }

    pub fn survival(&self) -> ArrayView1<'_, f64> {
        self.survival.view()
    }

    pub fn ci_lower(&self) -> ArrayView1<'_, f64> {
        self.ci_lower.view()
    }

    pub fn ci_upper(&self) -> ArrayView1<'_, f64> {
        self.ci_upper.view()
    }

    pub fn at_risk(&self) -> &[usize] {
        &self.at_risk
    }

    pub fn observed(&self) -> &[usize] {
        &self.observed
    }

    pub fn censored(&self) -> &[usize] {
        &self.censored
    }

    /// last timeline point
    pub fn max_time(&self) -> f64 {
        self.timeline.iter().copied().fold(0.0, f64::max)
    }

    /// S(t) - 1 before the first point, flat after the last
    pub fn survival_at(&self, t: f64) -> f64 {
        let k = self.timeline.iter().take_while(|&&x| x <= t).count();
        if k == 0 { 1.0 } else { self.survival[k - 1] }
    }

    /// first time the curve reaches 0.5, None if it never does
    pub fn median_survival_time(&self) -> Option<f64> {
        self.timeline
            .iter()
            .zip(self.survival.iter())
            .find(|&(_, &s)| s <= 0.5)
            .map(|(&t, _)| t)
    }

    /// step-shaped polyline of S(t)
    pub fn step_points(&self) -> Vec<(f64, f64)> {
        step_polyline(self.timeline.view(), self.survival.view())
    }

    /// closed outline of the confidence band (upper forward, lower back)
    pub fn band_points(&self) -> Vec<(f64, f64)> {
        let mut points = step_polyline(self.timeline.view(), self.ci_upper.view());
        let mut lower = step_polyline(self.timeline.view(), self.ci_lower.view());
        lower.reverse();
        points.extend(lower);
        points
    }

    /// where censored samples sit on the curve
    pub fn censor_points(&self) -> Vec<(f64, f64)> {
        (0..self.len())
            .filter(|&k| self.censored[k] > 0)
            .map(|k| (self.timeline[k], self.survival[k]))
            .collect()
    }

    pub fn rows(&self) -> Vec<SurvivalPoint> {
        (0..self.len())
            .map(|k| SurvivalPoint {
                label: self.label.clone(),
                time: self.timeline[k],
                at_risk: self.at_risk[k],
                observed: self.observed[k],
                censored: self.censored[k],
                survival: self.survival[k],
                ci_lower: self.ci_lower[k],
                ci_upper: self.ci_upper[k],
            })
            .collect()
    }

    /// life table as csv, one row per timeline point
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_curves_csv(std::slice::from_ref(self), writer)
    }

    /// print the life table
    pub fn print(&self) {
        let level = ((1.0 - self.alpha) * 100.0).round();
        println!("kaplan-meier estimate: {}", self.label);
        println!("{:=<78}", "");
        println!(
            "{:>10} {:>8} {:>8} {:>8} {:>12} {:>13} {:>13}",
            "time", "at risk", "events", "censored", "survival",
            format!("lower {}%", level), format!("upper {}%", level)
        );
        println!("{:-<78}", "");
        for row in self.rows() {
            println!(
                "{:>10.4} {:>8} {:>8} {:>8} {:>12.6} {:>13.6} {:>13.6}",
                row.time, row.at_risk, row.observed, row.censored,
                row.survival, row.ci_lower, row.ci_upper
            );
        }
        match self.median_survival_time() {
            Some(t) => println!("median survival time: {:.4}", t),
            None => println!("median survival time: not reached"),
        }
    }
}

/// several life tables stacked into one csv, told apart by the label column
pub fn write_curves_csv<W: Write>(curves: &[SurvivalCurve], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for curve in curves {
        for row in curve.rows() {
            writer.serialize(row)?;
        }
    }
    writer.flush()?;
    Ok(())
}
