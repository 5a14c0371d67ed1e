//! distribution summaries behind the box + violin panels
//!
//! - box stats: linear-interpolated quartiles, 1.5 IQR whiskers, outliers
//! - violin stats: gaussian kernel density w/ scott's bandwidth

use crate::error::{Result, SurvError};

/// whisker reach, in IQRs
pub const WHISKER_IQR: f64 = 1.5;

/// density evaluation points per violin
pub const VIOLIN_POINTS: usize = 100;

/// percentile of already sorted data, `q` in `[0, 1]` - linear between closest ranks
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
}

fn finite_sorted(values: &[f64]) -> Result<Vec<f64>> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if finite.is_empty() {
        return Err(SurvError::invalid_dimensions("no finite values to summarise"));
    }
    finite.sort_by(f64::total_cmp);
    Ok(finite)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// five-number summary + outliers for one boxplot
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    /// count of finite values
    pub count: usize,
    /// mean of finite values
    pub mean: f64,
    /// first quartile
    pub q1: f64,
    /// median
    pub median: f64,
    /// third quartile
    pub q3: f64,
    /// lowest value within `q1 - 1.5 IQR`
    pub whisker_low: f64,
    /// highest value within `q3 + 1.5 IQR`
    pub whisker_high: f64,
    /// values beyond the whiskers
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// summarise data, skipping NaN/inf
    pub fn from_data(values: &[f64]) -> Result<Self> {
        let sorted = finite_sorted(values)?;

        let q1 = percentile(&sorted, 0.25);
        let median = percentile(&sorted, 0.5);
        let q3 = percentile(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;

        let whisker_low = sorted.iter().copied().find(|&x| x >= low_fence).unwrap_or(q1);
        let whisker_high = sorted.iter().rev().copied().find(|&x| x <= high_fence).unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&x| x < whisker_low || x > whisker_high)
            .collect();

        Ok(Self {
            count: sorted.len(),
            mean: mean(&sorted),
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// scott's rule: `n^(-1/5)` * sample std dev
pub fn scott_bandwidth(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    (n as f64).powf(-0.2) * variance.sqrt()
}

/// kernel density estimate for one violin
#[derive(Debug, Clone, PartialEq)]
pub struct ViolinStats {
    /// evaluation points, min to max
    pub coords: Vec<f64>,
    /// density at each coordinate
    pub density: Vec<f64>,
    pub bandwidth: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl ViolinStats {
    /// density at `points` evenly spaced coordinates
    /// (constant data -> one coordinate w/ density 1)
    pub fn from_data(values: &[f64], points: usize) -> Result<Self> {
        let sorted = finite_sorted(values)?;
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let bandwidth = scott_bandwidth(&sorted);

        let (coords, density) = if bandwidth > 0.0 && points >= 2 {
            let step = (max - min) / (points - 1) as f64;
            let norm = 1.0 / (sorted.len() as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
            let coords: Vec<f64> = (0..points).map(|i| min + step * i as f64).collect();
            let density = coords
                .iter()
                .map(|&c| {
                    norm * sorted
                        .iter()
                        .map(|&x| (-0.5 * ((c - x) / bandwidth).powi(2)).exp())
                        .sum::<f64>()
                })
                .collect();
            (coords, density)
        } else {
            (vec![min], vec![1.0])
        };

        Ok(Self {
            coords,
            density,
            bandwidth,
            min,
            max,
            mean: mean(&sorted),
            median: percentile(&sorted, 0.5),
        })
    }

    pub fn max_density(&self) -> f64 {
        self.density.iter().copied().fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_percentile() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&sorted, 0.0), 1.0);
        assert_relative_eq!(percentile(&sorted, 0.25), 1.75);
        assert_relative_eq!(percentile(&sorted, 0.5), 2.5);
        assert_relative_eq!(percentile(&sorted, 1.0), 4.0);
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_box_stats_no_outliers() {
        let data: Vec<f64> = (1..=9).map(f64::from).collect();
        let stats = BoxStats::from_data(&data).unwrap();

        assert_relative_eq!(stats.q1, 3.0);
        assert_relative_eq!(stats.median, 5.0);
        assert_relative_eq!(stats.q3, 7.0);
        assert_relative_eq!(stats.whisker_low, 1.0);
        assert_relative_eq!(stats.whisker_high, 9.0);
        assert!(stats.outliers.is_empty());
        assert_eq!(stats.count, 9);
    }

    #[test]
    fn test_box_stats_with_outlier() {
        let mut data: Vec<f64> = (1..=9).map(f64::from).collect();
        data.push(100.0);
        data.push(f64::NAN); // ignored
        let stats = BoxStats::from_data(&data).unwrap();

        assert_relative_eq!(stats.q1, 3.25);
        assert_relative_eq!(stats.median, 5.5);
        assert_relative_eq!(stats.q3, 7.75);
        assert_relative_eq!(stats.whisker_high, 9.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.count, 10);
    }

    #[test]
    fn test_box_stats_empty() {
        assert!(BoxStats::from_data(&[]).is_err());
        assert!(BoxStats::from_data(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_scott_bandwidth() {
        assert_relative_eq!(scott_bandwidth(&[1.0, 2.0, 3.0, 4.0, 5.0]), 1.145977269, epsilon = 1e-8);
        assert_eq!(scott_bandwidth(&[1.0]), 0.0);
    }

    #[test]
    fn test_violin_density() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = ViolinStats::from_data(&data, 5).unwrap();

        assert_eq!(stats.coords, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_relative_eq!(stats.density[2], 0.195149352, epsilon = 1e-8);
        assert_relative_eq!(stats.density[0], 0.134807212, epsilon = 1e-8);
        // symmetric data, symmetric density
        assert_relative_eq!(stats.density[0], stats.density[4], epsilon = 1e-12);
        assert_relative_eq!(stats.density[1], stats.density[3], epsilon = 1e-12);
        assert_relative_eq!(stats.max_density(), stats.density[2]);
        assert_relative_eq!(stats.median, 3.0);
    }

    #[test]
    fn test_violin_default_resolution() {
        let data = [0.5, 1.5, 1.7, 2.0, 4.0];
        let stats = ViolinStats::from_data(&data, VIOLIN_POINTS).unwrap();
        assert_eq!(stats.coords.len(), VIOLIN_POINTS);
        assert_relative_eq!(stats.coords[0], 0.5);
        assert_relative_eq!(stats.coords[VIOLIN_POINTS - 1], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_violin_degenerate() {
        let stats = ViolinStats::from_data(&[2.0, 2.0, 2.0], VIOLIN_POINTS).unwrap();
        assert_eq!(stats.coords, vec![2.0]);
        assert_eq!(stats.density, vec![1.0]);
    }
}
