use std::path::Path;

use survplot::plot::{plot_survival, SurvivalPlotOptions};
use survplot::{logrank_test, KaplanMeierFitter, SurvivalData, Table};

const SARCOMA: &str = "\
histologicalDiagnosis.label,info.cnvstatistics.cnvcoverage,info.death
Leiomyosarcoma,0.12,1
Leiomyosarcoma,0.35,0
Liposarcoma,0.08,0
Leiomyosarcoma,0.41,1
Liposarcoma,0.22,1
Liposarcoma,0.57,1
Synovial sarcoma,0.05,1
Leiomyosarcoma,0.66,1
Synovial sarcoma,0.18,0
Synovial sarcoma,0.29,1
Liposarcoma,0.73,0
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let table = Table::from_reader(SARCOMA.as_bytes(), b',')?;

    let mut curves = Vec::new();
    let mut groups = Vec::new();
    for (label, group) in table.group_by("histologicalDiagnosis.label")? {
        let data = SurvivalData::from_table(&group, "info.cnvstatistics.cnvcoverage", "info.death")?;
        curves.push(KaplanMeierFitter::new().with_label(label).fit(&data)?);
        groups.push(data);
    }

    let labels: Vec<String> = curves.iter().map(|c| c.label().to_string()).collect();
    logrank_test(&groups)?.print(&labels);

    let options = SurvivalPlotOptions {
        title: "survival by diagnosis".to_string(),
        x_label: "cnv coverage".to_string(),
        show_ci: false,
        ..SurvivalPlotOptions::default()
    };
    plot_survival(&curves, &options, Path::new("grouped_curves.svg"))?;
    println!("\nwrote grouped_curves.svg");

    Ok(())
}
