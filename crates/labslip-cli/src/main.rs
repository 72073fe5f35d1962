use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use labslip_core::config::LabSlipConfig;
use labslip_core::crown::detect_crown_procedures;
use labslip_core::models::{Lab, ProcedureData, SlipStatus};
use labslip_core::render::SlipRenderer;
use labslip_core::service::LabSlipManager;
use labslip_core::store::SlipStore;

#[derive(Parser)]
#[command(name = "labslip")]
#[command(about = "Dental lab slip tracker", long_about = None)]
struct Cli {
    /// Path to a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database path (in-memory when omitted)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Log filter, e.g. info or labslip_core=debug
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full workflow against a sample day's schedule
    Demo {
        /// Directory for rendered PDFs
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },

    /// Render one slip as a printable PDF
    Render {
        /// Slip ID
        id: String,

        /// Directory for the rendered PDF
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },

    /// List slips past their due date
    Overdue,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .init();

    let config = match &cli.config {
        Some(path) => LabSlipConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => LabSlipConfig::default(),
    };

    let store = match &cli.db {
        Some(path) => SlipStore::open(path)?,
        None => SlipStore::open_in_memory()?,
    };

    match cli.cmd {
        Commands::Demo { out_dir } => run_demo(&config, &store, &out_dir),
        Commands::Render { id, out_dir } => render_one(&config, &store, &id, &out_dir),
        Commands::Overdue => report_overdue(&config, &store),
    }
}

fn run_demo(config: &LabSlipConfig, store: &SlipStore, out_dir: &Path) -> Result<()> {
    // Seed the receiving lab and make it the default for new slips
    let mut lab = Lab::new("Crown Masters Dental Lab".into());
    lab.contact = Some("Sam Rivera".into());
    lab.email = Some("orders@crownmasters.example.com".into());
    store.insert_lab(&lab)?;

    let mut config = config.clone();
    config.default_lab_id = Some(lab.id.clone());
    let manager = LabSlipManager::with_store(config.clone(), store);

    let feed = sample_feed();
    println!("Schedule: {} procedures", feed.len());

    let crowns = detect_crown_procedures(&feed);
    println!("Crown procedures detected: {}", crowns.len());

    let mut slips = Vec::new();
    for procedure in &crowns {
        let slip = manager.create_slip(procedure)?;
        println!(
            "  Created slip {} for {} ({}), due {}",
            slip.id, slip.patient_name, slip.procedure_code, slip.due_date
        );
        slips.push(slip);
    }

    // Print and send the first case
    let first = slips.first().context("no crown slips created")?;
    std::fs::create_dir_all(out_dir)?;
    let stored = manager
        .get_slip(&first.id)?
        .context("created slip missing from store")?;
    let renderer = SlipRenderer::new(config.practice.clone());
    let path = renderer.write_pdf(&stored, out_dir)?;
    println!("Rendered {}", path.display());

    for (status, notes) in [
        (SlipStatus::Sent, "Sent to lab via courier"),
        (
            SlipStatus::InProgress,
            "Lab confirmed receipt, crown in fabrication",
        ),
        (SlipStatus::Completed, "Crown received and inspected"),
    ] {
        manager.transition_slip(&first.id, status, Some(notes.into()))?;
        println!("  {} -> {}", first.patient_name, status.as_str());
    }

    let done = manager
        .get_slip(&first.id)?
        .context("created slip missing from store")?;
    println!(
        "{}: {} with {} history entries",
        done.patient_name,
        done.status.as_str(),
        done.history().len()
    );

    let job = manager.request_document(&done.id);
    println!("Document job: {} ({})", job.pdf_url, job.message);

    println!("Pending slips: {}", manager.pending_slips()?.len());
    println!("Overdue slips: {}", manager.overdue_slips()?.len());

    Ok(())
}

fn render_one(config: &LabSlipConfig, store: &SlipStore, id: &str, out_dir: &Path) -> Result<()> {
    let manager = LabSlipManager::with_store(config.clone(), store);
    let slip = manager
        .get_slip(id)?
        .with_context(|| format!("no lab slip with id {}", id))?;

    std::fs::create_dir_all(out_dir)?;
    let renderer = SlipRenderer::new(config.practice.clone());
    let path = renderer.write_pdf(&slip, out_dir)?;
    println!("Rendered {}", path.display());

    Ok(())
}

fn report_overdue(config: &LabSlipConfig, store: &SlipStore) -> Result<()> {
    let manager = LabSlipManager::with_store(config.clone(), store);
    let overdue = manager.overdue_slips()?;

    if overdue.is_empty() {
        println!("No overdue lab slips");
        return Ok(());
    }

    println!("{} overdue lab slip(s):", overdue.len());
    for slip in overdue {
        println!(
            "  {}  due {}  {}  {}",
            slip.id,
            slip.due_date,
            slip.status.as_str(),
            slip.patient_name
        );
    }

    Ok(())
}

/// A sample day's schedule the way the PMS feed would hand it over.
fn sample_feed() -> Vec<ProcedureData> {
    let mut cleaning = ProcedureData::new("Alice Johnson".into(), "D1110".into());
    cleaning.procedure_description = Some("Prophylaxis - adult".into());

    let mut ceramic_crown = ProcedureData::new("Bob Wilson".into(), "D2740".into());
    ceramic_crown.procedure_description = Some("Crown - porcelain/ceramic".into());
    ceramic_crown.tooth_number = Some("14".into());
    ceramic_crown.shade = Some("A2".into());
    ceramic_crown.special_instructions = Some(
        "Please match the shade of the adjacent crown on tooth 13. \
         Patient has a metal allergy, use full ceramic."
            .into(),
    );

    let mut exam = ProcedureData::new("Carol Davis".into(), "D0150".into());
    exam.procedure_description = Some("Comprehensive oral evaluation".into());

    let mut pfm_crown = ProcedureData::new("David Brown".into(), "D2750".into());
    pfm_crown.procedure_description = Some("Crown - porcelain fused to high noble metal".into());
    pfm_crown.tooth_number = Some("30".into());
    pfm_crown.shade = Some("B1".into());

    vec![cleaning, ceramic_crown, exam, pfm_crown]
}
