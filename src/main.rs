use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use docbuild::config::{loader, validator};
use docbuild::log_collector::{default_logs_path, LogCollector};
use docbuild::{locate, log_parsed, report, BuildOrchestrator, DocBuildConfig};

/// Build the documentation: cmaps, cheatsheet PDF and the static site.
#[derive(Parser, Debug)]
#[command(name = "docbuild", version, about, long_about = None)]
struct Cli {
    /// Repository root the build starts from
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to <root>/docbuild.toml, then the user config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the full and parsed log files (defaults to <root>/logs)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Echo debug output to the console
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline (default)
    Build {
        /// Write a JSON report of every stage to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Search path used to find the site generator instead of $PATH
        #[arg(long)]
        search_path: Option<std::ffi::OsString>,
    },
    /// Print the stages and the commands they run, without running them
    Plan,
    /// Print the URL of the generated documentation
    Locate {
        /// Open the documentation in the default web browser
        #[arg(short, long)]
        open: bool,

        /// Open the search page for this term instead of the index
        #[arg(short, long, requires = "open")]
        search: Option<String>,
    },
}

impl Cli {
    /// Only a build leaves session log files behind.
    fn writes_log_files(&self) -> bool {
        matches!(self.command, None | Some(Command::Build { .. }))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let console_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let collector = if cli.writes_log_files() {
        let log_dir = cli
            .log_dir
            .clone()
            .unwrap_or_else(|| default_logs_path(&cli.root));
        let (collector, fallback) = LogCollector::new_or_console(log_dir, console_level);
        if let Some(reason) = fallback {
            eprintln!("[Main] WARNING: {}; logging to the console only", reason);
        }
        collector
    } else {
        LogCollector::console_only(console_level)
    };
    if let Err(e) = collector.install() {
        eprintln!("[Main] WARNING: Failed to set LogCollector as global logger: {}", e);
    }
    if let Some(path) = collector.full_log_path() {
        log::debug!("[Main] Logging to {}", path.display());
    }

    let code = run(&cli);

    if let Err(e) = collector.flush_pending() {
        eprintln!("[Main] WARNING: Failed to flush logs: {}", e);
    }
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn run(cli: &Cli) -> i32 {
    let config = match load_config(&cli.root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(msg) => {
            log::error!("[Main] {}", msg);
            return 1;
        }
    };

    match &cli.command {
        None => build(&cli.root, config, None, None),
        Some(Command::Build {
            report,
            search_path,
        }) => build(&cli.root, config, report.as_deref(), search_path.clone()),
        Some(Command::Plan) => {
            let orch = BuildOrchestrator::with_system_runner(cli.root.clone(), config);
            for (i, step) in orch.plan().iter().enumerate() {
                println!("{:>2}. {:<24} {}", i + 1, step.stage, step.description);
            }
            0
        }
        Some(Command::Locate { open, search }) => {
            print_docs_url(&cli.root, &config, *open, search.as_deref())
        }
    }
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<DocBuildConfig, String> {
    let config = loader::resolve_config(root, explicit).map_err(|e| e.to_string())?;
    validator::validate_config(&config).map_err(|e| e.to_string())?;
    Ok(config)
}

fn build(
    root: &Path,
    config: DocBuildConfig,
    report_path: Option<&Path>,
    search_path: Option<std::ffi::OsString>,
) -> i32 {
    // Fail early on a root that does not exist
    let root = match root.canonicalize() {
        Ok(root) => root,
        Err(e) => {
            log::error!("[Main] Repository root {} unusable: {}", root.display(), e);
            return 1;
        }
    };
    let mut orch = BuildOrchestrator::with_system_runner(root, config);
    if let Some(search_path) = search_path {
        orch = orch.with_search_path(search_path);
    }

    let outcome = orch.run();

    if let Some(path) = report_path {
        if let Err(e) = report::save_report(orch.state(), path) {
            log::warn!("[Main] Could not write build report: {}", e);
        }
    }

    match outcome {
        Ok(()) => 0,
        Err(e) => {
            log::error!("[Main] {}", e);
            e.exit_code()
        }
    }
}

fn print_docs_url(root: &Path, config: &DocBuildConfig, open: bool, search: Option<&str>) -> i32 {
    let out_dir = locate::output_dir(root, config);
    let index = out_dir.join("index.html");
    let url = locate::docs_url(&out_dir, None);

    if !index.is_file() {
        log::warn!(
            "[Main] {} does not exist yet, run `docbuild build` first",
            index.display()
        );
    }
    log_parsed!("Documentation URL: {}", url);
    println!("{}", url);

    match locate::url_to_open(&out_dir, open, search) {
        Some(target) => match locate::open_in_browser(&target) {
            Ok(()) => {
                log::debug!("[Main] Opened {} in the default browser", target);
                0
            }
            Err(e) => {
                log::error!("[Main] Failed to open {} in the default web browser: {}", target, e);
                1
            }
        },
        None => {
            println!("To open it, run again with --open");
            0
        }
    }
}
