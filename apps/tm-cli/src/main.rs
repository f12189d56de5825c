use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tm_app::{
    AppError, AppResult, BatchPlan, DispatchOutcome, IntakeTarget, LocalBackend, MatrixPage,
    MatrixView, SessionContext, TydexOutcome, WorkbenchConfig, export_csv, export_file_name,
    intake, load_config, load_inputs, test_summary,
};
use tm_core::{Protocol, RunNumber, RunRecord};
use tm_sheet::SheetFiles;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tm-cli")]
#[command(about = "Tire test-matrix workbench CLI", long_about = None)]
struct Cli {
    /// Path to the workbench YAML config (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Selection {
    /// Project name
    #[arg(long)]
    project: Option<String>,
    /// Protocol (MF62, MF52, FTire, CDTire, Custom)
    #[arg(long)]
    protocol: Option<Protocol>,
    /// Saved project id; selects archived mode
    #[arg(long)]
    project_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract protocol sheets into the project's run matrix
    Extract {
        #[command(flatten)]
        selection: Selection,
        /// Tire inputs YAML file
        #[arg(long)]
        inputs: PathBuf,
        /// Workbooks (every worksheet is read) or CSV sheets, picked by extension
        #[arg(required = true)]
        sheets: Vec<PathBuf>,
    },
    /// Show the run matrix with current statuses
    Matrix {
        #[command(flatten)]
        selection: Selection,
    },
    /// Dispatch one run
    Run {
        #[command(flatten)]
        selection: Selection,
        run: RunNumber,
    },
    /// Generate the Tydex file of a completed run
    Tydex {
        #[command(flatten)]
        selection: Selection,
        run: RunNumber,
    },
    /// Open the generated Tydex file of a run
    OpenTydex {
        #[command(flatten)]
        selection: Selection,
        run: RunNumber,
    },
    /// Export the run matrix as CSV
    Export {
        #[command(flatten)]
        selection: Selection,
        /// Output directory (file name is derived from project and protocol)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the batch script of every job
    Batch {
        #[command(flatten)]
        selection: Selection,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Count runs per test
    Summary {
        #[command(flatten)]
        selection: Selection,
    },
    /// Mark an archived project complete
    Complete {
        #[command(flatten)]
        selection: Selection,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => WorkbenchConfig::default(),
    };

    let result = match cli.command {
        Commands::Extract {
            selection,
            inputs,
            sheets,
        } => cmd_extract(config, &selection, &inputs, sheets).await,
        Commands::Matrix { selection } => cmd_matrix(config, &selection).await,
        Commands::Run { selection, run } => cmd_run(config, &selection, run).await,
        Commands::Tydex { selection, run } => cmd_tydex(config, &selection, run).await,
        Commands::OpenTydex { selection, run } => cmd_open_tydex(config, &selection, run).await,
        Commands::Export { selection, output } => {
            cmd_export(config, &selection, output.as_deref())
        }
        Commands::Batch { selection, output } => cmd_batch(config, &selection, output.as_deref()),
        Commands::Summary { selection } => cmd_summary(config, &selection),
        Commands::Complete { selection } => cmd_complete(config, &selection).await,
    };

    if let Err(e) = &result {
        eprintln!("✗ {}", e.user_message());
    }
    result
}

/// Records of the selected matrix and the session reading them.
struct Loaded {
    backend: LocalBackend,
    session: SessionContext,
    records: Vec<RunRecord>,
}

impl Loaded {
    fn target(&self) -> AppResult<(&str, Protocol)> {
        self.session.target()
    }

    fn into_page(self) -> AppResult<MatrixPage<LocalBackend>> {
        let timeouts = self.backend.config().into();
        Ok(MatrixPage::new(self.session, self.backend, &self.records)?.with_timeouts(timeouts))
    }
}

fn load(config: WorkbenchConfig, selection: &Selection) -> AppResult<Loaded> {
    let backend = LocalBackend::new(config)?;
    let (project, protocol, records) = match &selection.project_id {
        Some(project_id) => {
            let snapshot = backend.store().load_archive(project_id)?;
            let project = selection.project.clone().unwrap_or(snapshot.project);
            (Some(project), Some(snapshot.protocol), snapshot.records)
        }
        None => {
            let (Some(project), Some(protocol)) = (&selection.project, selection.protocol) else {
                return Err(AppError::ConfigurationMissing);
            };
            let records = backend.store().load_runs(project, protocol)?;
            (Some(project.clone()), Some(protocol), records)
        }
    };
    tracing::debug!(
        records = records.len(),
        archived = selection.project_id.is_some(),
        "Loaded run matrix"
    );
    let session = SessionContext::new(project, protocol, selection.project_id.clone());
    Ok(Loaded {
        backend,
        session,
        records,
    })
}

async fn cmd_extract(
    config: WorkbenchConfig,
    selection: &Selection,
    inputs_path: &Path,
    sheets: Vec<PathBuf>,
) -> AppResult<()> {
    let (Some(project), Some(protocol)) = (&selection.project, selection.protocol) else {
        return Err(AppError::ConfigurationMissing);
    };
    let inputs = load_inputs(inputs_path)?;
    let backend = LocalBackend::new(config)?;
    let target = IntakeTarget {
        project: project.clone(),
        protocol,
        project_id: selection.project_id.clone(),
    };

    let report = intake(
        &SheetFiles::new(sheets),
        &inputs,
        backend.store(),
        &backend,
        &target,
    )
    .await?;

    println!(
        "✓ Extracted {} runs for {} ({})",
        report.extraction.records.len(),
        project,
        protocol
    );
    for skipped in &report.extraction.skipped {
        println!(
            "  skipped {} row {}: {:?}",
            skipped.sheet,
            skipped.row + 1,
            skipped.reason
        );
    }
    if let Some(digest) = &report.archive_digest {
        println!("✓ Archived snapshot {}", digest);
    }
    Ok(())
}

fn print_matrix(view: &MatrixView) {
    let mut header = vec!["run"];
    header.extend(view.header());
    header.extend(["status", "actions"]);
    println!("{}", header.join("\t"));

    for row in &view.rows {
        let actions: Vec<String> = row.actions().iter().map(|a| format!("{a:?}")).collect();
        println!(
            "{}\t{}\t{}\t{}",
            row.run(),
            row.cells.join("\t"),
            row.status.label(),
            actions.join(",")
        );
    }
}

async fn cmd_matrix(config: WorkbenchConfig, selection: &Selection) -> AppResult<()> {
    let page = load(config, selection)?.into_page()?;
    page.refresh(None).await?;
    let view = page.view();
    print_matrix(&view);

    let summary = page.completion();
    println!(
        "\n{}/{} runs completed{}",
        summary.completed,
        summary.total,
        if summary.completable {
            " - project can be marked complete"
        } else {
            ""
        }
    );
    Ok(())
}

async fn cmd_run(config: WorkbenchConfig, selection: &Selection, run: RunNumber) -> AppResult<()> {
    let page = load(config, selection)?.into_page()?;
    page.reconcile(run).await?;

    match page.dispatch(run).await? {
        DispatchOutcome::Completed {
            message,
            completion,
        } => {
            println!("✓ Run {} completed {}", run, message);
            println!("  {}/{} runs completed", completion.completed, completion.total);
        }
        DispatchOutcome::AlreadyInFlight => println!("Run {} is already running", run),
    }
    Ok(())
}

async fn cmd_tydex(config: WorkbenchConfig, selection: &Selection, run: RunNumber) -> AppResult<()> {
    let page = load(config, selection)?.into_page()?;
    page.reconcile(run).await?;

    match page.generate_tydex(run).await? {
        TydexOutcome::Generated { message } => println!("✓ Tydex generated {}", message),
        TydexOutcome::AlreadyGenerated => println!("Tydex already generated for run {}", run),
        TydexOutcome::InProgress => println!("Tydex generation in progress for run {}", run),
    }
    Ok(())
}

async fn cmd_open_tydex(
    config: WorkbenchConfig,
    selection: &Selection,
    run: RunNumber,
) -> AppResult<()> {
    let page = load(config, selection)?.into_page()?;
    let path = page.open_tydex(run).await?;
    println!("{}", path.display());
    Ok(())
}

fn cmd_export(config: WorkbenchConfig, selection: &Selection, output: Option<&Path>) -> AppResult<()> {
    let loaded = load(config, selection)?;
    let (project, protocol) = loaded.target()?;

    match output {
        Some(dir) => {
            let path = dir.join(export_file_name(project, protocol));
            let file = File::create(&path).map_err(|e| AppError::Export(format!(
                "Failed to create {}: {}",
                path.display(),
                e
            )))?;
            export_csv(&loaded.records, protocol, file)?;
            println!("✓ Exported {} runs to {}", loaded.records.len(), path.display());
        }
        None => export_csv(&loaded.records, protocol, io::stdout().lock())?,
    }
    Ok(())
}

fn cmd_batch(config: WorkbenchConfig, selection: &Selection, output: Option<&Path>) -> AppResult<()> {
    let loaded = load(config, selection)?;
    let (project, protocol) = loaded.target()?;
    let plan = BatchPlan::build(project, protocol, &loaded.records)?;

    let config = loaded.backend.config();
    let project_dir = config.project_dir(project, protocol.key());
    let script = plan.render_script(&config.job_command, &project_dir.to_string_lossy());

    match output {
        Some(path) => {
            std::fs::write(path, &script)?;
            println!("✓ Batch file written: {} commands", plan.test_count());
        }
        None => io::stdout().write_all(script.as_bytes())?,
    }
    Ok(())
}

fn cmd_summary(config: WorkbenchConfig, selection: &Selection) -> AppResult<()> {
    let loaded = load(config, selection)?;
    let (_, protocol) = loaded.target()?;
    let summary = test_summary(&loaded.records, protocol);

    if summary.is_empty() {
        println!("No tests found");
    } else {
        println!("Tests ({} total runs):", loaded.records.len());
        for (name, count) in summary {
            println!("  {} - {}", name, count);
        }
    }
    Ok(())
}

async fn cmd_complete(config: WorkbenchConfig, selection: &Selection) -> AppResult<()> {
    let page = load(config, selection)?.into_page()?;
    page.refresh(None).await?;
    page.mark_complete().await?;
    println!("✓ Project marked complete");
    Ok(())
}
