use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use rulegen::cli::{Cli, Commands, ConfigAction, Display, OutputFormat, SelectionArgs};
use rulegen::config::{ProjectPaths, RulegenConfig};
use rulegen::engine::{self, GenerateOptions, RunStatus};
use rulegen::error::Result;
use rulegen::fragment::{DirFragmentStore, FragmentStore};
use rulegen::output::OutputWriter;
use rulegen::target::builtin_adapters;

/// Context for command output handling.
struct OutputContext<'a> {
    display: &'a Display,
    writer: &'a OutputWriter,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(RunStatus::Failed) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("rulegen=debug")
    } else {
        EnvFilter::new("rulegen=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<RunStatus> {
    let display = Display::new();
    let writer = OutputWriter::new(cli.output);
    let out = OutputContext {
        display: &display,
        writer: &writer,
    };
    let fragments_override = cli.fragments;

    match cli.command {
        Commands::Init => cmd_init(&out).await,
        Commands::Generate {
            selection,
            target,
            dry_run,
        } => cmd_generate(&out, &selection, target, dry_run, fragments_override).await,
        Commands::Check { selection, target } => {
            cmd_generate(&out, &selection, target, true, fragments_override).await
        }
        Commands::List => cmd_list(&out, fragments_override).await,
        Commands::Targets => cmd_targets(&out),
        Commands::Config { action } => cmd_config(&out, action).await,
    }
}

/// Walk up from the current directory to the nearest initialized project,
/// falling back to the current directory itself.
fn find_project_root() -> Result<PathBuf> {
    let current = std::env::current_dir()?;

    let mut path = current.as_path();
    loop {
        if path.join(".rulegen").exists() {
            return Ok(path.to_path_buf());
        }
        match path.parent() {
            Some(parent) => path = parent,
            None => return Ok(current),
        }
    }
}

fn load_store(paths: &ProjectPaths, out: &OutputContext<'_>) -> Result<DirFragmentStore> {
    let store = DirFragmentStore::load(&paths.fragments_dir)?;
    if out.writer.format() == OutputFormat::Text {
        for warning in store.warnings() {
            out.display.print_warning(&warning.to_string());
        }
    }
    Ok(store)
}

async fn project_paths(fragments_override: Option<PathBuf>) -> Result<(RulegenConfig, ProjectPaths)> {
    let root = find_project_root()?;
    let config = RulegenConfig::load(&root.join(".rulegen")).await?;
    let mut paths = ProjectPaths::new(root, &config);
    if let Some(dir) = fragments_override {
        paths.fragments_dir = dir;
    }
    Ok((config, paths))
}

async fn cmd_init(out: &OutputContext<'_>) -> Result<RunStatus> {
    let root = std::env::current_dir()?;
    let config = RulegenConfig::default();
    let paths = ProjectPaths::new(root, &config);

    if paths.rulegen_dir.exists() {
        if out.writer.format() == OutputFormat::Text {
            out.display
                .print_warning("rulegen is already initialized in this project.");
        }
        return Ok(RunStatus::Success);
    }

    paths.ensure_dirs().await?;
    config.save(&paths.rulegen_dir).await?;

    if out.writer.format() == OutputFormat::Text {
        out.display.print_success("Initialized rulegen.");
        out.display
            .print_info(&format!("Configuration: {}", paths.config_file().display()));
        out.display.print_info(&format!(
            "Fragments: {}",
            paths.fragments_dir.display()
        ));
    } else {
        out.writer.emit_message("Initialized rulegen");
    }

    Ok(RunStatus::Success)
}

async fn cmd_generate(
    out: &OutputContext<'_>,
    selection_args: &SelectionArgs,
    targets: Vec<String>,
    dry_run: bool,
    fragments_override: Option<PathBuf>,
) -> Result<RunStatus> {
    let (config, paths) = project_paths(fragments_override).await?;
    let selection = selection_args.to_selection()?;
    let store = load_store(&paths, out)?;

    let targets = if targets.is_empty() {
        config.targets.clone()
    } else {
        targets
    };

    let spinner = if out.writer.format() == OutputFormat::Text && !dry_run {
        Some(out.display.create_spinner("Generating rule trees..."))
    } else {
        None
    };

    let options = GenerateOptions { dry_run };
    let summaries =
        engine::generate(&selection, &store, &targets, &paths.root, &options).await?;

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    let status = engine::overall_status(&summaries);

    match out.writer.format() {
        OutputFormat::Text => {
            if dry_run {
                out.display.print_info("Dry run, nothing written.");
            }
            for summary in &summaries {
                out.display.print_target_summary(summary);
            }
            match status {
                RunStatus::Success => out.display.print_success("Generation complete."),
                RunStatus::SuccessWithWarnings => {
                    out.display.print_warning("Generation completed with warnings.")
                }
                RunStatus::Failed => out.display.print_error("Generation failed."),
            }
        }
        OutputFormat::Json | OutputFormat::Stream => out.writer.emit_run(&summaries),
    }

    Ok(status)
}

async fn cmd_list(
    out: &OutputContext<'_>,
    fragments_override: Option<PathBuf>,
) -> Result<RunStatus> {
    let (_, paths) = project_paths(fragments_override).await?;
    let store = load_store(&paths, out)?;
    let fragments = store.all();

    match out.writer.format() {
        OutputFormat::Text => {
            out.display.print_header("Fragment Catalog");
            out.display.print_fragments_table(&fragments);
        }
        OutputFormat::Json | OutputFormat::Stream => out.writer.emit_fragments(&fragments),
    }

    Ok(RunStatus::Success)
}

fn cmd_targets(out: &OutputContext<'_>) -> Result<RunStatus> {
    let adapters = builtin_adapters();
    match out.writer.format() {
        OutputFormat::Text => {
            out.display.print_header("Targets");
            out.display.print_targets_table(&adapters);
        }
        OutputFormat::Json | OutputFormat::Stream => {
            let names: Vec<&str> = adapters.iter().map(|a| a.name()).collect();
            out.writer.emit_message(&names.join(","));
        }
    }
    Ok(RunStatus::Success)
}

async fn cmd_config(out: &OutputContext<'_>, action: ConfigAction) -> Result<RunStatus> {
    let root = find_project_root()?;
    let rulegen_dir = root.join(".rulegen");

    match action {
        ConfigAction::Show => {
            let config = RulegenConfig::load(&rulegen_dir).await?;
            match out.writer.format() {
                OutputFormat::Text => {
                    let yaml = serde_yaml_bw::to_string(&config)?;
                    println!("{}", yaml);
                }
                OutputFormat::Json | OutputFormat::Stream => {
                    let json = serde_json::to_string_pretty(&config)?;
                    println!("{}", json);
                }
            }
        }
        ConfigAction::Reset => {
            let config = RulegenConfig::default();
            tokio::fs::create_dir_all(&rulegen_dir).await?;
            config.save(&rulegen_dir).await?;
            if out.writer.format() == OutputFormat::Text {
                out.display.print_success("Configuration reset to defaults.");
            }
        }
    }

    Ok(RunStatus::Success)
}
