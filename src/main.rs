use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use quill::banner::{BannerInfo, print_banner, print_session_summary};
use quill::config::{GenerationArgs, ServerArgs};
use quill::engine::{AssessmentEngine, AssessmentState, EngineConfig};
use quill::events::Event;
use quill::ingest::{BlobRef, FieldInput, FieldKind};
use quill::logging;
use quill::server::{self, AppState};
use quill::spinner::Spinner;
use quill::storage::{HttpBlobSource, LocalBlobStore, file_url};

#[derive(Parser)]
#[command(
    name = "quill",
    version,
    about = "Turns an assignment brief into a plan, then a finished draft."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "QUILL_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        #[command(flatten)]
        generation: GenerationArgs,
        #[command(flatten)]
        server: ServerArgs,
    },
    /// Run both stages once on local files or text and print the result
    Run {
        #[command(flatten)]
        generation: GenerationArgs,
        #[command(flatten)]
        fields: FieldArgs,
        /// Stop after the plan
        #[arg(long)]
        plan_only: bool,
    },
}

#[derive(Args)]
struct FieldArgs {
    /// Task sheet file
    #[arg(long, conflicts_with = "task_sheet_text")]
    task_sheet: Option<PathBuf>,
    /// Task sheet as text
    #[arg(long)]
    task_sheet_text: Option<String>,

    /// Additional material file
    #[arg(long, conflicts_with = "additional_material_text")]
    additional_material: Option<PathBuf>,
    /// Additional material as text
    #[arg(long)]
    additional_material_text: Option<String>,

    /// Marking rubric file
    #[arg(long, conflicts_with = "rubric_text")]
    rubric: Option<PathBuf>,
    /// Marking rubric as text
    #[arg(long)]
    rubric_text: Option<String>,

    /// Specific instructions file
    #[arg(long, conflicts_with = "specific_instructions_text")]
    specific_instructions: Option<PathBuf>,
    /// Specific instructions as text
    #[arg(long)]
    specific_instructions_text: Option<String>,

    /// Past work file
    #[arg(long, conflicts_with = "past_work_text")]
    past_work: Option<PathBuf>,
    /// Past work as text
    #[arg(long)]
    past_work_text: Option<String>,
}

impl FieldArgs {
    fn into_inputs(self) -> Result<Vec<FieldInput>> {
        [
            (FieldKind::TaskSheet, self.task_sheet, self.task_sheet_text),
            (
                FieldKind::AdditionalMaterial,
                self.additional_material,
                self.additional_material_text,
            ),
            (FieldKind::Rubric, self.rubric, self.rubric_text),
            (
                FieldKind::SpecificInstructions,
                self.specific_instructions,
                self.specific_instructions_text,
            ),
            (FieldKind::PastWork, self.past_work, self.past_work_text),
        ]
        .into_iter()
        .map(|(kind, path, text)| match (path, text) {
            (Some(path), _) => local_upload(kind, &path),
            (None, Some(text)) => Ok(FieldInput::text(kind, text)),
            (None, None) => Ok(FieldInput::empty(kind)),
        })
        .collect()
    }
}

fn local_upload(kind: FieldKind, path: &Path) -> Result<FieldInput> {
    let path = path
        .canonicalize()
        .with_context(|| format!("cannot open {} for {kind}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(FieldInput::upload(
        kind,
        BlobRef {
            url: file_url(&path),
            file_name,
            mime_type,
        },
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { generation, server } => {
            logging::init(cli.log_json);
            serve(generation, server).await
        }
        Command::Run {
            generation,
            fields,
            plan_only,
        } => {
            logging::init_with(logging::QUIET_FILTER, cli.log_json);
            run(generation, fields.into_inputs()?, plan_only).await
        }
    }
}

async fn serve(generation: GenerationArgs, args: ServerArgs) -> Result<()> {
    let public_url = args.public_url();
    let blobs = Arc::new(LocalBlobStore::open(
        args.blob_dir(),
        &public_url,
        args.blob_token.clone(),
    )?);

    print_banner(&BannerInfo {
        public_url: &public_url,
        model: &generation.model,
        auth_status: generation.auth_status(),
        uploads: if blobs.can_sign() {
            "enabled"
        } else {
            "disabled (BLOB_READ_WRITE_TOKEN not set)"
        },
        blob_dir: blobs.dir(),
    });

    let engine = AssessmentEngine::new(
        generation.planner(),
        generation.writer(),
        blobs.clone(),
        EngineConfig::default(),
    );

    server::serve(
        args.bind,
        AppState {
            engine: Arc::new(engine),
            blobs,
        },
    )
    .await
}

async fn run(generation: GenerationArgs, inputs: Vec<FieldInput>, plan_only: bool) -> Result<()> {
    let engine = AssessmentEngine::new(
        generation.planner(),
        generation.writer(),
        Arc::new(HttpBlobSource::with_local_files()),
        EngineConfig::default(),
    );
    let user_agent = concat!("quill/", env!("CARGO_PKG_VERSION"));

    let spinner = Spinner::start("reading inputs");
    let mut events = engine.events().subscribe();

    let work = async {
        let planned = engine
            .generate_plan(&AssessmentState::default(), &inputs, user_agent)
            .await;
        if plan_only || planned.plan.is_none() {
            return planned;
        }
        let plan = planned.plan.clone();
        engine
            .generate_final(&planned, plan.as_deref(), user_agent)
            .await
    };
    tokio::pin!(work);

    let state = loop {
        tokio::select! {
            state = &mut work => break state,
            Ok(event) = events.recv() => report(&spinner, &event),
        }
    };
    spinner.stop().await;

    if let Some(plan) = &state.plan {
        println!("# Plan\n\n{plan}\n");
    }
    if let Some(text) = &state.final_assessment {
        println!("# Assessment\n\n{text}");
    }
    print_session_summary(engine.session_usage());

    if let Some(error) = state.error.or(state.error_agent2) {
        bail!(error);
    }
    Ok(())
}

fn report(spinner: &Spinner, event: &Event) {
    match event {
        Event::FieldResolved {
            field,
            provided: true,
            failed,
        } => {
            let mark = if *failed { "!" } else { "✓" };
            spinner.println(&format!("  {mark} {field}"));
        }
        Event::FieldResolved { .. } => {}
        Event::StageStarted { stage } => spinner.set_label(format!("generating {stage}")),
        Event::StageFinished { stage, ok: false } => {
            spinner.println(&format!("  ✗ {stage} failed"));
        }
        Event::StageFinished { .. } => {}
    }
}
