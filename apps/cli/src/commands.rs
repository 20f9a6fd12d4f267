//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use positioning_collector::Collector;
use positioning_core::pipeline::{
    ProgressReporter, RunRequest, RunSummary, Stages, SynthesisRequest,
};
use positioning_core::{ProviderClient, ReferenceCorpus};
use positioning_render::compositor_from_config;
use positioning_shared::{
    AppConfig, CollectConfig, EnvVars, GenerationOverrides, GenerationSettings, PageRecord,
    PositioningError, ProviderChoice, init_config, load_config, load_config_from,
    resolve_generation, slugify,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Competitive positioning engine: collect sites, synthesize a brief, render it.
#[derive(Parser)]
#[command(
    name = "positioning",
    version,
    about = "Collect competitor websites and turn them into a rendered positioning brief.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.positioning/positioning.toml).
    #[arg(long, global = true, env = "POSITIONING_CONFIG")]
    pub config: Option<PathBuf>,

    /// KEY=value override file merged under the process environment.
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,

    /// Artifact directory (overrides `defaults.output_dir`).
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Collect one company's website into `<slug>-positioning.json`.
    Collect {
        /// Company name.
        company: String,
        /// Website root URL.
        url: String,
    },

    /// Generate a positioning brief from collected artifacts.
    Synthesize {
        /// The target's collection artifact.
        input: PathBuf,

        /// Competitor names or slugs with artifacts in the output directory.
        #[arg(long, num_args = 1..)]
        competitors: Vec<String>,

        /// Model override.
        #[arg(long)]
        model: Option<String>,

        /// Provider override: anthropic or openrouter.
        #[arg(long)]
        provider: Option<ProviderChoice>,

        /// Brief path (defaults to `<slug>-brief.json` in the output directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a brief to HTML, and to PDF when a compositor is available.
    Render {
        /// Brief JSON file.
        brief: PathBuf,
    },

    /// Run collect, synthesize and render for a company and its competitors.
    ///
    /// Generation credentials are checked before any page is fetched, so a
    /// missing API key fails the run up front.
    #[command(alias = "run")]
    Coordinate {
        /// Company name.
        company: String,
        /// Website root URL.
        url: String,

        /// Competitors as `Name:URL`.
        #[arg(long, num_args = 1..)]
        competitors: Vec<String>,

        /// Model override.
        #[arg(long)]
        model: Option<String>,

        /// Provider override: anthropic or openrouter.
        #[arg(long)]
        provider: Option<ProviderChoice>,

        /// Reuse collection artifacts already in the output directory.
        #[arg(long)]
        skip_collection: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "positioning=info",
        1 => "positioning=debug",
        _ => "positioning=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

/// Config, environment and directories resolved once per invocation.
struct Context {
    config: AppConfig,
    env: EnvVars,
    output_dir: PathBuf,
    /// Relative reference-file paths resolve against this.
    base_dir: PathBuf,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };

        let mut env = EnvVars::from_process();
        env.merge_file(&cli.env_file)?;

        let base_dir = std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}"))?;
        let output_dir = cli
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

        Ok(Self {
            config,
            env,
            output_dir,
            base_dir,
        })
    }

    fn generation(&self, provider: Option<ProviderChoice>, model: Option<String>) -> Result<GenerationSettings> {
        let overrides = GenerationOverrides { provider, model };
        let settings = resolve_generation(&self.config, &self.env, &overrides)?;
        info!(provider = %settings.provider, model = %settings.model, "generation provider resolved");
        Ok(settings)
    }

    fn corpus(&self) -> ReferenceCorpus {
        ReferenceCorpus::load(&self.config.defaults, &self.base_dir)
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&cli),
        },
        Command::Collect { company, url } => {
            let ctx = Context::load(&cli)?;
            cmd_collect(&ctx, company, url).await
        }
        Command::Synthesize {
            input,
            competitors,
            model,
            provider,
            output,
        } => {
            let ctx = Context::load(&cli)?;
            cmd_synthesize(&ctx, input, competitors, model.clone(), *provider, output.clone())
                .await
        }
        Command::Render { brief } => {
            let ctx = Context::load(&cli)?;
            cmd_render(&ctx, brief)
        }
        Command::Coordinate {
            company,
            url,
            competitors,
            model,
            provider,
            skip_collection,
        } => {
            let ctx = Context::load(&cli)?;
            let settings = ctx.generation(*provider, model.clone())?;
            let request = RunRequest {
                company: company.clone(),
                website: url.clone(),
                competitors: competitors.clone(),
                skip_collection: *skip_collection,
                model: settings.model.clone(),
                repair_attempts: settings.repair_attempts,
                date: today(),
            };
            cmd_coordinate(&ctx, &settings, request).await
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_collect(ctx: &Context, company: &str, url: &str) -> Result<()> {
    let collector = Collector::from_config(&CollectConfig::from(&ctx.config))?;

    info!(company, url, "collecting");
    let reporter = CliProgress::new();
    let path = positioning_core::collect_company(&collector, &ctx.output_dir, company, url, &reporter)
        .await?;
    reporter.finish();

    println!("{}", path.display());
    Ok(())
}

async fn cmd_synthesize(
    ctx: &Context,
    input: &Path,
    competitors: &[String],
    model: Option<String>,
    provider: Option<ProviderChoice>,
    output: Option<PathBuf>,
) -> Result<()> {
    if !input.exists() {
        return Err(PositioningError::input_not_found(input).into());
    }

    let settings = ctx.generation(provider, model)?;
    let client = ProviderClient::from_settings(&settings)?;

    let request = SynthesisRequest {
        input: input.to_path_buf(),
        competitor_slugs: competitors
            .iter()
            .map(|c| slugify(c))
            .filter(|s| !s.is_empty())
            .collect(),
        output,
        model: settings.model.clone(),
        repair_attempts: settings.repair_attempts,
        date: today(),
    };

    let reporter = CliProgress::new();
    let path =
        positioning_core::synthesize(&client, &ctx.corpus(), &ctx.output_dir, &request, &reporter)
            .await?;
    reporter.finish();

    println!("{}", path.display());
    Ok(())
}

fn cmd_render(ctx: &Context, brief: &Path) -> Result<()> {
    let compositor = compositor_from_config(&ctx.config.render);

    let reporter = CliProgress::new();
    let document =
        positioning_core::render(brief, &ctx.output_dir, compositor.as_deref(), &reporter)?;
    reporter.finish();

    println!("{}", document.html_path.display());
    if let Some(pdf) = &document.pdf_path {
        println!("{}", pdf.display());
    }
    Ok(())
}

async fn cmd_coordinate(
    ctx: &Context,
    settings: &GenerationSettings,
    request: RunRequest,
) -> Result<()> {
    let client = ProviderClient::from_settings(settings)?;
    let collector = Collector::from_config(&CollectConfig::from(&ctx.config))?;
    let corpus = ctx.corpus();
    let compositor = compositor_from_config(&ctx.config.render);

    let stages = Stages {
        collector: &collector,
        client: &client,
        corpus: &corpus,
        compositor: compositor.as_deref(),
        output_dir: &ctx.output_dir,
    };

    info!(
        company = %request.company,
        competitors = request.competitors.len(),
        "starting run"
    );

    let reporter = CliProgress::new();
    let summary = positioning_core::coordinate(&stages, &request, &reporter).await?;

    println!();
    println!("  Positioning brief complete!");
    println!("  Company:     {}", summary.company);
    println!("  Competitors: {}", list_or_none(&summary.competitors_included));
    if !summary.competitors_failed.is_empty() {
        println!("  Failed:      {}", summary.competitors_failed.join(", "));
    }
    println!("  Brief:       {}", summary.brief_path.display());
    println!("  HTML:        {}", summary.document.html_path.display());
    if let Some(pdf) = &summary.document.pdf_path {
        println!("  PDF:         {}", pdf.display());
    }
    println!("  Time:        {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    let config: AppConfig = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_collected(&self, company: &str, page: &PageRecord) {
        self.spinner
            .set_message(format!("{company}: {} ({})", page.url, page.page_type));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}
