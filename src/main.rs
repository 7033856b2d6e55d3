use anyhow::{Context, Result};
use clap::Parser;
use concordia::analysis::{self, DistanceLadder, SurveyAnalysis};
use concordia::cli::{Cli, Command, OutputFormat};
use concordia::config::AnalysisConfig;
use concordia::correction::CorrectionModel;
use concordia::cosmology::Cosmology;
use concordia::report::{self, Report, ReportKind};
use concordia::resolution::{self, ResolutionInfo, ScheduleApplication, SchedulePreset};
use concordia::survey::SurveyRegistry;
use concordia::tension::{self, Measurement};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_toml(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_registry(path: Option<&Path>) -> Result<SurveyRegistry> {
    match path {
        Some(path) => SurveyRegistry::from_toml(path)
            .with_context(|| format!("Failed to load survey registry {}", path.display())),
        None => Ok(SurveyRegistry::published()?),
    }
}

/// Print a result as text or JSON and optionally save the JSON report
fn emit<T: Serialize>(
    format: OutputFormat,
    kind: ReportKind,
    result: T,
    text: String,
    output: Option<&Path>,
) -> Result<()> {
    let report = Report::new(kind, result);
    match format {
        OutputFormat::Text => print!("{}", text),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    if let Some(path) = output {
        report::write_report(path, &report)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        if format == OutputFormat::Text {
            println!("\nResults saved to {}", path.display());
        }
    }
    Ok(())
}

fn run_survey(
    cli: &Cli,
    name: &str,
    baseline: Option<f64>,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let registry = load_registry(cli.surveys.as_deref())?;
    let survey = registry.get(name)?;

    let mut model = config.correction_model()?;
    if let Some(a) = baseline {
        model = CorrectionModel::new(a, model.exponent)?;
    }

    let result = analysis::analyze_survey(survey, &model, &config)?;
    let text = result.to_report_string();
    emit(cli.format, ReportKind::Survey, result, text, output)
}

fn analyse_registry(
    registry: &SurveyRegistry,
    config: &AnalysisConfig,
) -> Result<Vec<SurveyAnalysis>> {
    let model = config.correction_model()?;
    registry
        .surveys()
        .iter()
        .map(|s| Ok(analysis::analyze_survey(s, &model, config)?))
        .collect()
}

fn run_cross_survey(cli: &Cli, reports: &[PathBuf], output: Option<&Path>) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let analyses = if reports.is_empty() {
        analyse_registry(&load_registry(cli.surveys.as_deref())?, &config)?
    } else {
        report::load_survey_analyses(reports).context("Failed to load survey reports")?
    };

    let result = analysis::validate_cross_survey(&analyses, &config)?;
    let text = result.to_report_string();
    emit(cli.format, ReportKind::CrossSurvey, result, text, output)
}

fn run_hubble(cli: &Cli, ladder: DistanceLadder, output: Option<&Path>) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let result = analysis::analyze_hubble(&ladder.measurement()?, &config)?;
    let text = result.to_report_string();
    emit(cli.format, ReportKind::Hubble, result, text, output)
}

fn run_concordance(cli: &Cli, without_lensing: bool, output: Option<&Path>) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let local_h0 = analysis::analyze_hubble(&DistanceLadder::Shoes.measurement()?, &config)?
        .corrected_measurement()?;
    let lensing = if without_lensing {
        None
    } else {
        let analyses = analyse_registry(&load_registry(cli.surveys.as_deref())?, &config)?;
        let validation = analysis::validate_cross_survey(&analyses, &config)?;
        Some(validation.combined.corrected_measurement()?)
    };

    let probes = analysis::default_probes(&local_h0, lensing.as_ref());
    let result = analysis::concordance(&probes)?;
    let text = result.to_report_string();
    emit(cli.format, ReportKind::Concordance, result, text, output)
}

#[derive(Serialize)]
struct TensionOutput {
    v1: f64,
    s1: f64,
    v2: f64,
    s2: f64,
    tension_sigma: f64,
}

fn run_tension(cli: &Cli, v1: f64, s1: f64, v2: f64, s2: f64) -> Result<()> {
    let t = tension::tension_sigma(v1, s1, v2, s2)?;
    let text = format!(
        "{:.4} ± {:.4} vs {:.4} ± {:.4}\nTension: {:.2}σ\n",
        v1, s1, v2, s2, t
    );
    let result = TensionOutput {
        v1,
        s1,
        v2,
        s2,
        tension_sigma: t,
    };
    emit(cli.format, ReportKind::Tension, result, text, None)
}

fn run_combine(cli: &Cli, values: &[f64], sigmas: &[f64], labels: &[String]) -> Result<()> {
    if values.len() != sigmas.len() {
        anyhow::bail!(
            "Got {} --value but {} --sigma arguments",
            values.len(),
            sigmas.len()
        );
    }
    if !labels.is_empty() && labels.len() != values.len() {
        anyhow::bail!(
            "Got {} --label for {} measurements",
            labels.len(),
            values.len()
        );
    }

    let measurements = values
        .iter()
        .zip(sigmas)
        .enumerate()
        .map(|(i, (&v, &s))| {
            let label = labels
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("m{}", i + 1));
            Measurement::new(label, v, s)
        })
        .collect::<concordia::error::Result<Vec<_>>>()?;

    let result = tension::consistency_test(&measurements)?;
    let mut text = format!(
        "Combined: {:.4} ± {:.4} (N = {})\nχ² = {:.3}",
        result.combination.mean, result.combination.sigma, result.combination.n, result.chi2
    );
    match (result.dof, result.chi2_per_dof, result.p_value) {
        (Some(dof), Some(per_dof), Some(p)) => {
            text.push_str(&format!(", dof = {}, χ²/dof = {:.3}, p = {:.4}\n", dof, per_dof, p));
        }
        _ => text.push_str(", dof undefined for a single measurement\n"),
    }
    emit(cli.format, ReportKind::Combination, result, text, None)
}

fn run_distance(cli: &Cli, z: f64, h0: f64, omega_m: f64) -> Result<()> {
    let cosmology = Cosmology::flat(h0, omega_m)?;
    let d = cosmology.distances(z)?;
    let text = format!(
        "z = {}  (H0 = {}, Ωm = {})\n\
         Hubble distance:            {:>10.1} Mpc\n\
         Angular diameter distance:  {:>10.1} Mpc\n\
         Comoving distance:          {:>10.1} Mpc\n\
         Luminosity distance:        {:>10.1} Mpc\n\
         Comoving (integrated):      {:>10.1} Mpc\n",
        z,
        h0,
        omega_m,
        d.hubble_mpc,
        d.angular_diameter_mpc,
        d.comoving_mpc,
        d.luminosity_mpc,
        d.comoving_integrated_mpc
    );
    emit(cli.format, ReportKind::Distances, d, text, None)
}

fn run_fit_baseline(cli: &Cli, z: &[f64], corrections: &[f64]) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let model = config.correction_model()?;
    let fit = model.fit_baseline(z, corrections)?;

    let mut text = String::from("z       correction   implied baseline\n");
    for ((z, c), b) in z.iter().zip(corrections).zip(&fit.per_bin_baselines) {
        text.push_str(&format!("{:<7.3} {:<12.5} {:.5}\n", z, c, b));
    }
    text.push_str(&format!(
        "\nBaseline: {:.5} ± {:.5} (rms residual {:.2e}, {} bins)\n",
        fit.baseline, fit.baseline_std, fit.rms_residual, fit.n_bins
    ));
    emit(cli.format, ReportKind::BaselineFit, fit, text, None)
}

#[derive(Serialize)]
struct ResolutionOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    scale_mpc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    oversampling: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<ResolutionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<ScheduleApplication>,
}

fn run_resolution(
    cli: &Cli,
    scale_mpc: Option<f64>,
    bits: Option<u32>,
    schedule: Option<SchedulePreset>,
    initial: Option<f64>,
    oversampling: f64,
) -> Result<()> {
    if scale_mpc.is_some() && bits.is_some() {
        anyhow::bail!("Cannot specify both --scale-mpc and --bits. Choose one.");
    }
    if initial.is_some() && schedule.is_none() {
        anyhow::bail!("--initial only applies to a schedule walk. Add --schedule.");
    }

    let mut text = String::new();
    let mut out = ResolutionOutput {
        scale_mpc,
        oversampling: scale_mpc.map(|_| oversampling),
        level: None,
        schedule: None,
    };

    let level = match (scale_mpc, bits) {
        (Some(scale), None) => {
            let n = resolution::physical_scale_to_resolution(scale, oversampling)?;
            text.push_str(&format!(
                "Scale {} Mpc at {} cells per scale needs N = {} bits\n",
                scale, oversampling, n
            ));
            Some(n)
        }
        (None, Some(n)) => Some(n),
        _ => None,
    };
    if let Some(n) = level {
        let info = resolution::resolution_info(n)?;
        text.push_str(&format!(
            "N = {}: cell size {:.4e} Mpc ({:.3} kpc, {:.1} pc), {} scale\n",
            info.bits, info.cell_size_mpc, info.cell_size_kpc, info.cell_size_pc, info.category
        ));
        out.level = Some(info);
    }

    if let Some(preset) = schedule {
        let config = load_config(cli.config.as_deref())?;
        let start = initial.unwrap_or(0.0);
        let applied =
            resolution::apply_schedule(start, &preset.levels(), &config.level_corrections())?;
        text.push_str(&format!("Schedule {:?}:\n", preset));
        for (level, (value, step)) in applied
            .levels
            .iter()
            .zip(applied.values.iter().zip(&applied.corrections))
        {
            match level {
                Some(n) => text.push_str(&format!(
                    "  N={:<2} ({:>10.4} Mpc)  {:+.4}  → {:.4}\n",
                    n,
                    resolution::cell_size_mpc(*n),
                    step,
                    value
                )),
                None => text.push_str(&format!("  start                      {:.4}\n", value)),
            }
        }
        text.push_str(&format!("Total correction: {:+.4}\n", applied.total_correction));
        out.schedule = Some(applied);
    }

    emit(cli.format, ReportKind::Resolution, out, text, None)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(cli.debug);

    match &cli.command {
        Command::Survey {
            name,
            baseline,
            output,
        } => run_survey(&cli, name, *baseline, output.as_deref()),
        Command::CrossSurvey { reports, output } => {
            run_cross_survey(&cli, reports, output.as_deref())
        }
        Command::Hubble { ladder, output } => run_hubble(&cli, *ladder, output.as_deref()),
        Command::Tension { v1, s1, v2, s2 } => run_tension(&cli, *v1, *s1, *v2, *s2),
        Command::Combine {
            values,
            sigmas,
            labels,
        } => run_combine(&cli, values, sigmas, labels),
        Command::Concordance {
            without_lensing,
            output,
        } => run_concordance(&cli, *without_lensing, output.as_deref()),
        Command::Distance { z, h0, omega_m } => run_distance(&cli, *z, *h0, *omega_m),
        Command::FitBaseline { z, corrections } => run_fit_baseline(&cli, z, corrections),
        Command::Resolution {
            scale_mpc,
            bits,
            schedule,
            initial,
            oversampling,
        } => run_resolution(&cli, *scale_mpc, *bits, *schedule, *initial, *oversampling),
    }
}
