use anyhow::Context;
use clap::{Parser, Subcommand};
use mtf_core::{
    derive_risk_assessment, CoreConfig, LlmBackend, PatientContext, PatientId, ScanResult,
    ScanService,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mtf")]
#[command(about = "Minimal trauma fracture report scanning CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a radiology report file and print the result with its risk assessment
    Scan {
        /// Path to a plain-text radiology report
        #[arg(long)]
        report: PathBuf,
        /// Patient identifier
        #[arg(long)]
        patient_id: String,
        /// Patient age in years
        #[arg(long)]
        age: Option<u32>,
        /// Patient gender
        #[arg(long)]
        gender: Option<String>,
        /// Medical history item (repeatable)
        #[arg(long = "history")]
        history: Vec<String>,
    },
    /// Derive a risk assessment from a saved scan result JSON file
    Assess {
        /// Path to a scanResult JSON document
        #[arg(long)]
        scan: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays pipeable JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("mtf_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scan {
            report,
            patient_id,
            age,
            gender,
            history,
        }) => {
            let report_text = std::fs::read_to_string(&report)
                .with_context(|| format!("failed to read report {}", report.display()))?;
            let patient = build_patient_context(&patient_id, age, gender, history)?;

            let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
            let service = ScanService::new(LlmBackend::from_config(&cfg)?);

            let scan_result = service.scan(&report_text, &patient).await?;
            let risk_assessment = derive_risk_assessment(&scan_result, Some(&patient));

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "scanResult": scan_result,
                    "riskAssessment": risk_assessment,
                    "mock": service.is_mock(),
                }))?
            );
        }
        Some(Commands::Assess { scan }) => {
            let scan_result = load_scan_result(&scan)?;
            let risk_assessment = derive_risk_assessment(&scan_result, None);
            println!("{}", serde_json::to_string_pretty(&risk_assessment)?);
        }
        None => {
            println!("Use 'mtf --help' for commands");
        }
    }

    Ok(())
}

fn build_patient_context(
    patient_id: &str,
    age: Option<u32>,
    gender: Option<String>,
    history: Vec<String>,
) -> anyhow::Result<PatientContext> {
    let patient_id = PatientId::new(patient_id).context("invalid --patient-id")?;
    Ok(PatientContext {
        patient_id,
        age: age.map(serde_json::Value::from),
        gender: gender.map(serde_json::Value::from),
        medical_history: if history.is_empty() {
            None
        } else {
            Some(serde_json::Value::from(history))
        },
    })
}

/// Read a scan result, accepting either a bare `scanResult` or a full scan response envelope.
fn load_scan_result(path: &Path) -> anyhow::Result<ScanResult> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scan result {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let scan = value
        .pointer("/data/scanResult")
        .or_else(|| value.get("scanResult"))
        .unwrap_or(&value)
        .clone();

    serde_json::from_value(scan).context("document does not contain a valid scan result")
}
