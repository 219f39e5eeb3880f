use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use versecast::{
    BlobStore, CredentialSet, DirBlobStore, ElevenLabsClient, FfmpegToolchain, ProgressState,
    ProgressStore, RasterSlideRenderer, RunOutcome, S3BlobStore, Scripture, Session, SessionParts,
    SessionSettings, VersecastConfig,
};

#[derive(Parser, Debug)]
#[command(name = "versecast", version, about = "Narrated verse videos, one chapter per run")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Configuration file (JSON). Defaults to `versecast.json` when present.
    #[arg(long, global = true, env = "VERSECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of an HTTP object store for progress and videos.
    #[arg(long, global = true, env = "VERSECAST_STORE_URL")]
    store_url: Option<String>,

    /// S3 bucket for progress and videos, used when no URL is given.
    #[arg(long, global = true, env = "S3_BUCKET_NAME")]
    s3_bucket: Option<String>,

    /// Region of the S3 bucket.
    #[arg(long, global = true, env = "AWS_REGION")]
    s3_region: Option<String>,

    /// Directory used as the object store when neither URL nor bucket is given.
    #[arg(long, global = true, env = "VERSECAST_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Bearer token for the HTTP object store.
    #[arg(long, global = true, env = "VERSECAST_STORE_TOKEN", hide_env_values = true)]
    store_token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Produce, upload and commit the next chapter (requires `ffmpeg` on PATH).
    Run,
    /// Show the next chapter and the credential in use.
    Status(StatusArgs),
    /// Render the slides of a chapter to PNG files, without narration.
    Slides(SlidesArgs),
    /// Start the next run from the first credential again.
    ResetCredentials,
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SlidesArgs {
    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Book index (0-based). Defaults to the persisted cursor.
    #[arg(long, requires = "chapter")]
    book: Option<usize>,

    /// Chapter index (0-based).
    #[arg(long, requires = "book")]
    chapter: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the variables may come from the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = VersecastConfig::load(cli.global.config.as_deref()).context("load configuration")?;

    match cli.cmd {
        Command::Run => cmd_run(&cfg, &cli.global),
        Command::Status(args) => cmd_status(&cfg, &cli.global, args),
        Command::Slides(args) => cmd_slides(&cfg, &cli.global, args),
        Command::ResetCredentials => cmd_reset_credentials(&cfg, &cli.global),
    }
}

fn open_store(cfg: &VersecastConfig, global: &GlobalArgs) -> anyhow::Result<Arc<dyn BlobStore>> {
    if let Some(url) = global.store_url.clone().or_else(|| cfg.store.url.clone()) {
        let store = versecast::HttpBlobStore::new(
            url,
            global.store_token.clone(),
            cfg.http_timeout(),
        )?;
        return Ok(Arc::new(store));
    }
    if let Some(bucket) = global.s3_bucket.clone().or_else(|| cfg.store.bucket.clone()) {
        let region = global.s3_region.clone().or_else(|| cfg.store.region.clone());
        let store = S3BlobStore::from_env(&bucket, region.as_deref())?;
        return Ok(Arc::new(store));
    }
    let dir = global
        .store_dir
        .clone()
        .unwrap_or_else(|| cfg.store.dir.clone());
    Ok(Arc::new(DirBlobStore::new(dir)))
}

fn progress_store(cfg: &VersecastConfig, store: Arc<dyn BlobStore>) -> ProgressStore {
    ProgressStore::new(store, cfg.store.state_key.clone(), cfg.paths.local_state.clone())
}

fn load_source(cfg: &VersecastConfig) -> anyhow::Result<Scripture> {
    Scripture::from_path(&cfg.source)
        .with_context(|| format!("load source text '{}'", cfg.source.display()))
}

fn load_renderer(cfg: &VersecastConfig) -> anyhow::Result<RasterSlideRenderer> {
    RasterSlideRenderer::from_font_files(cfg.slide_style(), &cfg.fonts.body, &cfg.fonts.title)
        .context("load slide fonts")
}

fn cmd_run(cfg: &VersecastConfig, global: &GlobalArgs) -> anyhow::Result<()> {
    let source = load_source(cfg)?;
    let store = open_store(cfg, global)?;
    let credentials = CredentialSet::from_env();
    tracing::info!(credentials = credentials.len(), "credentials discovered");

    let toolchain = FfmpegToolchain::default();
    toolchain.check_available()?;

    let provider = ElevenLabsClient::new(cfg.http.speech_base_url.clone(), cfg.http_timeout())?;
    let mut session = Session::new(SessionParts {
        source,
        progress: progress_store(cfg, store.clone()),
        artifacts: store,
        provider: Box::new(provider),
        credentials,
        toolchain: Box::new(toolchain),
        renderer: Box::new(load_renderer(cfg)?),
        settings: SessionSettings {
            work_dir: cfg.paths.work_dir.clone(),
            output_dir: cfg.paths.output_dir.clone(),
            artifact_prefix: cfg.store.artifact_prefix.clone(),
            narration: cfg.narration_settings(),
            mux: cfg.mux_options(),
            rotation: cfg.rotation_policy(),
        },
    })?;

    match session.run_once()? {
        RunOutcome::Completed(report) => {
            eprintln!(
                "{} {}: {} slide(s), {:.1}s -> {}",
                report.book_name,
                report.chapter_number,
                report.slides,
                report.duration_seconds,
                report.artifact_key
            );
        }
        RunOutcome::SkippedEmpty { title, .. } => {
            eprintln!("{title}: no verses, skipped");
        }
        RunOutcome::SourceExhausted => {
            eprintln!("every chapter has been processed");
        }
    }
    Ok(())
}

fn cmd_status(cfg: &VersecastConfig, global: &GlobalArgs, args: StatusArgs) -> anyhow::Result<()> {
    let source = load_source(cfg)?;
    let progress = progress_store(cfg, open_store(cfg, global)?);
    let report = versecast::status_report(&source, &progress, CredentialSet::from_env().len());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    match &report.next_chapter {
        Some(title) => println!("next: {title}"),
        None => println!("next: (source exhausted)"),
    }
    println!("progress: {}/{} chapters", report.completed, report.total);
    println!(
        "credential: #{} of {}",
        report.state.credential_index, report.credentials
    );
    Ok(())
}

fn cmd_slides(cfg: &VersecastConfig, global: &GlobalArgs, args: SlidesArgs) -> anyhow::Result<()> {
    let source = load_source(cfg)?;
    let state = match (args.book, args.chapter) {
        (Some(book), Some(chapter)) => ProgressState {
            book,
            chapter,
            credential_index: 0,
        },
        _ => progress_store(cfg, open_store(cfg, global)?).load(),
    };

    let mut renderer = load_renderer(cfg)?;
    let paths = versecast::render_chapter_slides(&source, &state, &mut renderer, &args.out)?;
    for p in &paths {
        eprintln!("wrote {}", p.display());
    }
    Ok(())
}

fn cmd_reset_credentials(cfg: &VersecastConfig, global: &GlobalArgs) -> anyhow::Result<()> {
    let progress = progress_store(cfg, open_store(cfg, global)?);
    let state = progress.record_credential_index(0)?;
    eprintln!(
        "credential index reset; next run starts at book {} chapter {}",
        state.book, state.chapter
    );
    Ok(())
}
