use std::path::Path;

use survplot::plot::{plot_survival, SurvivalPlotOptions};
use survplot::{KaplanMeierFitter, SurvivalData};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Kaplan-Meier Estimate - Basic Usage Example");
    println!("===========================================\n");

    // months until relapse or last follow-up
    let times = vec![1.2, 2.1, 3.5, 4.2, 5.8, 6.1, 7.3, 8.9, 9.2, 10.5,
                     2.3, 3.1, 4.8, 5.2, 6.9, 7.1, 8.3, 9.8, 10.1, 11.2];

    let events = vec![true, false, true, true, false, true, true, false, true, false,
                      true, true, false, true, true, false, true, true, false, true];

    let data = SurvivalData::new(times, events)?;

    println!("Dataset Information:");
    println!("  - Number of samples: {}", data.n_samples());
    println!("  - Number of events: {}", data.n_events());
    println!("  - Number of censored: {}", data.n_censored());
    println!();

    let curve = KaplanMeierFitter::new()
        .with_label("cohort")
        .with_alpha(0.05)
        .fit(&data)?;
    curve.print();
    println!();

    for t in [3.0, 6.0, 9.0] {
        println!("S({:.1}) = {:.4}", t, curve.survival_at(t));
    }

    let options = SurvivalPlotOptions {
        x_label: "months".to_string(),
        show_censors: true,
        ..SurvivalPlotOptions::default()
    };
    plot_survival(std::slice::from_ref(&curve), &options, Path::new("basic_usage_km.svg"))?;
    println!("\nwrote basic_usage_km.svg");

    Ok(())
}
