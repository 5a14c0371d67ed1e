use ndarray::{Array1, Array2};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::{
    data::SurvivalData,
    error::{Result, SurvError},
};

/// outcome of a log-rank comparison across groups
#[derive(Debug, Clone)]
pub struct LogRankResult {
    pub statistic: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
    pub observed: Array1<f64>,  // events per group
    pub expected: Array1<f64>,  // expected events per group under H0
}

impl LogRankResult {
    /// print the test summary
    pub fn print(&self, labels: &[String]) {
        println!("log-rank test");
        println!("=============");
        println!("{:<30} {:>10} {:>10}", "group", "observed", "expected");
        println!("{:-<52}", "");
        for j in 0..self.observed.len() {
            let default_name = format!("group {}", j);
            let name = labels.get(j).map(|s| s.as_str()).unwrap_or(&default_name);
            println!("{:<30} {:>10.0} {:>10.4}", name, self.observed[j], self.expected[j]);
        }
        println!();
        println!("chi-square:          {:.6}", self.statistic);
        println!("degrees of freedom:  {}", self.degrees_of_freedom);
        println!("p-value:             {:.6}", self.p_value);
    }
}

/// do the groups share one survival function? chi-square w/ k-1 dof
pub fn logrank_test(groups: &[SurvivalData]) -> Result<LogRankResult> {
    let k = groups.len();
    if k < 2 {
        return Err(SurvError::invalid_dimensions(
            format!("log-rank needs at least 2 groups, got {}", k)
        ));
    }

    let mut event_times: Vec<f64> = groups.iter().flat_map(|g| g.event_times()).collect();
    event_times.sort_by(f64::total_cmp);
    event_times.dedup();

    if event_times.is_empty() {
        return Err(SurvError::invalid_survival_data("no events in any group"));
    }

    let observed = Array1::from(groups.iter().map(|g| g.n_events() as f64).collect::<Vec<_>>());
    let mut expected = Array1::<f64>::zeros(k);
    let mut covariance = Array2::<f64>::zeros((k, k));

    let mut at_risk = Array1::<f64>::zeros(k);
    let mut deaths = Array1::<f64>::zeros(k);
    for &t in &event_times {
        for (j, g) in groups.iter().enumerate() {
            at_risk[j] = g.times().iter().filter(|&&x| x >= t).count() as f64;
            deaths[j] = g.times()
                .iter()
                .zip(g.events().iter())
                .filter(|&(&x, &e)| e && x == t)
                .count() as f64;
        }

        let n = at_risk.sum();
        let d = deaths.sum();
        if n <= 0.0 {
            continue;
        }

        for j in 0..k {
            expected[j] += d * at_risk[j] / n;
        }

        // hypergeometric covariance, vanishes when one sample is left
        if n > 1.0 {
            let scale = d * (n - d) / (n - 1.0);
            for j in 0..k {
                for l in 0..k {
                    let delta = if j == l { 1.0 } else { 0.0 };
                    covariance[[j, l]] += scale * (at_risk[j] / n) * (delta - at_risk[l] / n);
                }
            }
        }
    }

    // drop the last group, the full covariance is singular
    let dof = k - 1;
    let diff = Array1::from((0..dof).map(|j| observed[j] - expected[j]).collect::<Vec<_>>());
    let reduced = covariance.slice(ndarray::s![0..dof, 0..dof]).to_owned();

    let statistic = if diff.iter().all(|&x| x.abs() < 1e-12) {
        0.0
    } else {
        let solved = solve_linear_system(&reduced, &diff)?;
        diff.dot(&solved).max(0.0)
    };

    let chi = ChiSquared::new(dof as f64).map_err(|e| SurvError::numerical_error(e.to_string()))?;
    let p_value = chi.sf(statistic);

    Ok(LogRankResult {
        statistic,
        degrees_of_freedom: dof,
        p_value,
        observed,
        expected,
    })
}

/// solve Ax = b, gaussian elimination w/ partial pivoting
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return Err(SurvError::invalid_dimensions("Matrix dimensions mismatch"));
    }

    let mut a_copy = a.clone();
    let mut b_copy = b.clone();

    // forward elimination
    for i in 0..n {
        let mut max_row = i;
        for k in i + 1..n {
            if a_copy[[k, i]].abs() > a_copy[[max_row, i]].abs() {
                max_row = k;
            }
        }

        if a_copy[[max_row, i]].abs() < 1e-12 {
            return Err(SurvError::numerical_error(
                "log-rank covariance is singular - some group has no one at risk at any event time"
            ));
        }

        if max_row != i {
            for j in 0..n {
                a_copy.swap([i, j], [max_row, j]);
            }
            b_copy.swap(i, max_row);
        }

        for k in i + 1..n {
            let factor = a_copy[[k, i]] / a_copy[[i, i]];
            for j in i..n {
                a_copy[[k, j]] -= factor * a_copy[[i, j]];
            }
            b_copy[k] -= factor * b_copy[i];
        }
    }

    // back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        x[i] = b_copy[i];
        for j in i + 1..n {
            x[i] -= a_copy[[i, j]] * x[j];
        }
        x[i] /= a_copy[[i, i]];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn group_a() -> SurvivalData {
        SurvivalData::new(vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![true, false, true, true, false]).unwrap()
    }

    fn group_b() -> SurvivalData {
        SurvivalData::new(vec![6.0, 7.0, 8.0, 9.0, 10.0], vec![true, true, false, true, true]).unwrap()
    }

    fn group_c() -> SurvivalData {
        SurvivalData::new(vec![2.0, 4.0, 6.0, 8.0, 10.0], vec![true, true, true, false, false]).unwrap()
    }

    #[test]
    fn test_two_groups() {
        let result = logrank_test(&[group_a(), group_b()]).unwrap();

        assert_eq!(result.degrees_of_freedom, 1);
        assert_relative_eq!(result.statistic, 4.913849004, epsilon = 1e-6);
        assert_relative_eq!(result.p_value, 0.026642209, epsilon = 1e-6);
        assert_relative_eq!(result.observed[0], 3.0);
        assert_relative_eq!(result.expected[0], 1.160714286, epsilon = 1e-6);
        assert_relative_eq!(result.expected[1], 5.839285714, epsilon = 1e-6);
    }

    #[test]
    fn test_three_groups() {
        let result = logrank_test(&[group_a(), group_b(), group_c()]).unwrap();

        assert_eq!(result.degrees_of_freedom, 2);
        assert_relative_eq!(result.statistic, 3.556702086, epsilon = 1e-6);
        assert_relative_eq!(result.p_value, 0.168916454, epsilon = 1e-6);

        // expected events sum to observed events
        assert_relative_eq!(result.expected.sum(), result.observed.sum(), epsilon = 1e-9);
    }

    #[test]
    fn test_identical_groups() {
        let result = logrank_test(&[group_a(), group_a()]).unwrap();
        assert_relative_eq!(result.statistic, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_needs_two_groups() {
        assert!(logrank_test(&[group_a()]).is_err());
    }

    #[test]
    fn test_no_events() {
        let a = SurvivalData::new(vec![1.0, 2.0], vec![false, false]).unwrap();
        let b = SurvivalData::new(vec![3.0], vec![false]).unwrap();
        assert!(logrank_test(&[a, b]).is_err());
    }

    #[test]
    fn test_group_censored_before_first_event_is_singular() {
        // nobody left at risk in `a` by the first event time
        let a = SurvivalData::new(vec![0.5], vec![false]).unwrap();
        let b = SurvivalData::new(vec![1.0, 2.0, 3.0], vec![true, true, false]).unwrap();
        let c = SurvivalData::new(vec![1.5, 2.5, 4.0], vec![true, false, true]).unwrap();

        let leading = logrank_test(&[a.clone(), b.clone(), c.clone()]);
        assert!(matches!(leading, Err(SurvError::NumericalError { .. })));
        let trailing = logrank_test(&[b.clone(), c.clone(), a]);
        assert!(matches!(trailing, Err(SurvError::NumericalError { .. })));

        let result = logrank_test(&[b, c]).unwrap();
        assert_eq!(result.degrees_of_freedom, 1);
        assert_relative_eq!(result.statistic, 0.4865, epsilon = 1e-4);
        assert_relative_eq!(result.p_value, 0.4855, epsilon = 1e-4);
    }

    #[test]
    fn test_solve_linear_system() {
        let a = Array2::from_shape_vec((2, 2), vec![2.0, 1.0, 1.0, 3.0]).unwrap();
        let b = Array1::from(vec![3.0, 5.0]);
        let x = solve_linear_system(&a, &b).unwrap();
        assert_relative_eq!(x[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.4, epsilon = 1e-12);

        let singular = Array2::zeros((2, 2));
        assert!(solve_linear_system(&singular, &b).is_err());
    }
}
