use anyhow::Context;
use clap::Parser;
use llm_relay::{
    ColorPalette, HttpCompletionClient, InteractiveSession, JobSpec, Mode, Pipeline, Settings,
    dry_run,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "llm-relay",
    version,
    about = "Relay word-bounded chunks of text files to an LLM completion endpoint",
    long_about = "Split a text file into word-count-bounded chunks, send each chunk to a remote \
    completion endpoint for continuation or summarization, and write the responses in chunk order.\n\n\
    USAGE EXAMPLES:\n  \
      # Continue a long text, 1500 words per chunk\n  \
      llm-relay -i draft.txt -o continued.txt\n\n  \
      # Summarize every file in a directory\n  \
      llm-relay -i notes/ -o summaries/ --summary\n\n  \
      # Estimate cost without any network calls\n  \
      llm-relay -i draft.txt -o unused.txt --dry-run\n\n  \
      # Chat with the model line by line\n  \
      llm-relay -i draft.txt -o unused.txt --interactive"
)]
struct Cli {
    /// Input file or directory
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Output file or directory
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// Words per chunk
    #[arg(short, long, default_value_t = 1500)]
    tokens: usize,

    /// Language of the input text (key into the configured model table)
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Estimate chunk count and cost without making API requests
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Interactive mode: send each input line to the model
    #[arg(short = 'm', long)]
    interactive: bool,

    /// Generate summaries instead of continuations
    #[arg(short, long)]
    summary: bool,

    /// Sampling temperature
    #[arg(short = 'p', long, default_value_t = 0.5)]
    temperature: f32,

    /// Path to a settings file (default: ./llm-relay.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            let colors = ColorPalette::default();
            eprintln!("{}", colors.paint("error", &format!("Error: {e}")));
            std::process::exit(1);
        }
    };

    let colors = settings.colors.clone();
    if let Err(e) = run(&cli, settings) {
        eprintln!("{}", colors.paint("error", &format!("Error: {e:#}")));
        std::process::exit(1);
    }
}

fn run(cli: &Cli, settings: Settings) -> anyhow::Result<()> {
    let model = settings.models.model_for(&cli.language)?.to_string();
    let colors = settings.colors.clone();

    // Mode precedence: dry-run > interactive > single file > directory.
    if cli.dry_run {
        run_dry_run(cli, &settings, &colors)
    } else if cli.interactive {
        let client = HttpCompletionClient::from_settings(&settings)
            .context("Failed to create completion client")?;
        let session = InteractiveSession::new(client, model, cli.temperature, colors)
            .context("Failed to start interactive session")?;
        session.run().context("Interactive session failed")?;
        Ok(())
    } else if cli.input.is_file() || cli.input.is_dir() {
        let client = HttpCompletionClient::from_settings(&settings)
            .context("Failed to create completion client")?;

        let job = JobSpec {
            model,
            chunk_size: cli.tokens,
            temperature: cli.temperature,
            mode: if cli.summary {
                Mode::Summarization
            } else {
                Mode::Continuation
            },
        };

        let pipeline = Pipeline::new(client, job, settings.worker_count(), colors.clone())
            .context("Failed to create pipeline")?;

        if cli.input.is_file() {
            let stats = pipeline
                .process_file(&cli.input, &cli.output)
                .context("File processing failed")?;
            println!(
                "{}",
                colors.paint(
                    "info",
                    &format!(
                        "Processed {} -> {} ({} chunks in {:.2}s)",
                        cli.input.display(),
                        cli.output.display(),
                        stats.chunks,
                        stats.duration.as_secs_f64()
                    ),
                )
            );
        } else {
            let stats = pipeline
                .process_directory(&cli.input, &cli.output)
                .context("Directory processing failed")?;
            println!(
                "{}",
                colors.paint(
                    "info",
                    &format!(
                        "Processed {} file(s) ({} chunks in {:.2}s)",
                        stats.files_processed,
                        stats.total_chunks,
                        stats.duration.as_secs_f64()
                    ),
                )
            );
        }
        Ok(())
    } else {
        anyhow::bail!(
            "Input path is not a valid file or directory: {}",
            cli.input.display()
        );
    }
}

fn run_dry_run(cli: &Cli, settings: &Settings, colors: &ColorPalette) -> anyhow::Result<()> {
    let report = dry_run(&cli.input, cli.tokens, settings.cost_metric).context("Dry run failed")?;

    println!(
        "{}",
        colors.paint(
            "info",
            &format!(
                "Dry run: Estimated cost: {} {}, Estimated API calls: {}",
                report.estimated_cost, report.metric, report.api_calls
            ),
        )
    );
    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("llm_relay=info"),
        1 => EnvFilter::new("llm_relay=debug"),
        _ => EnvFilter::new("llm_relay=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .init();

    Ok(())
}
