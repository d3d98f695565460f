use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use oupcrawl_core::{HarvestConfig, LocalArtifacts};
use oupcrawl_jats::ArticleExtractor;
use oupcrawl_package::{FtpConnector, credentials};

mod pipeline;
mod sink;

use pipeline::{HarvestSource, Harvester};
use sink::{JsonArraySink, RecordSink};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "oupcrawl",
    about = "Harvest Oxford University Press JATS bundles into normalized records",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print run summaries as JSON. Also enabled by OUPCRAWL_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Harvest a local bundle, or every new bundle on the FTP server.
    Crawl {
        /// Local bundle to harvest instead of listing the server.
        #[arg(long)]
        package_path: Option<PathBuf>,
        /// Remote root folder holding one subfolder per delivery.
        #[arg(long)]
        ftp_folder: Option<String>,
        #[arg(long)]
        ftp_host: Option<String>,
        /// netrc file with the login for the FTP host.
        #[arg(long)]
        ftp_netrc: Option<PathBuf>,
        /// Output file, `-` for stdout. Defaults to a new file in the output directory.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Extract a single XML document and print its record.
    Parse {
        xml: PathBuf,
        #[arg(long)]
        pdf: Option<PathBuf>,
        #[arg(long)]
        pdfa: Option<PathBuf>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Print the config file location.
    Path,
    /// Write the default configuration if no file exists yet.
    Init,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    debug!(?cli, "arguments parsed");

    let json_output = cli.json || std::env::var("OUPCRAWL_JSON").as_deref() == Ok("1");
    let config = HarvestConfig::load().context("loading configuration")?;

    match cli.command {
        Commands::Crawl {
            package_path,
            ftp_folder,
            ftp_host,
            ftp_netrc,
            output,
        } => {
            let mut config = config;
            if let Some(host) = ftp_host {
                config.transfer.host = Some(host);
            }
            if let Some(folder) = ftp_folder {
                config.transfer.folder = folder;
            }
            if let Some(netrc) = ftp_netrc {
                config.transfer.netrc = Some(netrc);
            }

            let source = match package_path {
                Some(path) => HarvestSource::Local(path),
                None => {
                    let Some(host) = config.transfer.host.as_deref() else {
                        bail!("no FTP host: pass --ftp-host or set transfer.host in the config");
                    };
                    let credentials = credentials::resolve(host, config.transfer.netrc.as_deref())
                        .with_context(|| format!("resolving credentials for {host}"))?;
                    HarvestSource::Remote {
                        credentials,
                        folder: config.transfer.folder.clone(),
                    }
                }
            };

            let (mut sink, destination) = open_sink(output.as_deref(), &config)?;
            let connector = Arc::new(FtpConnector::new(config.transfer.port));
            let harvester = Harvester::new(config, connector);
            let summary = harvester.run(&source, sink.as_mut()).await?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "summary": summary, "output": destination },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                eprintln!(
                    "{} records written ({} documents, {} filtered, {} failed) from {} bundles",
                    summary.emitted, summary.documents, summary.filtered, summary.failed, summary.bundles
                );
                if let Some(path) = destination {
                    eprintln!("Output: {}", path.display());
                }
            }
        }

        Commands::Parse { xml, pdf, pdfa } => {
            let artifacts = LocalArtifacts {
                xml: Some(xml.clone()),
                pdf,
                pdfa,
            };
            let extractor = ArticleExtractor::from_config(&config.publisher);
            match extractor
                .extract_file(&xml, &artifacts)
                .with_context(|| format!("extracting {}", xml.display()))?
            {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => {
                    eprintln!("Article type of {} is not harvested", xml.display());
                    std::process::exit(2);
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::to_value(&config)?)?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Path => {
                println!("{}", HarvestConfig::config_path().display());
            }
            ConfigAction::Init => {
                let path = HarvestConfig::config_path();
                if path.exists() {
                    eprintln!("Config already exists: {}", path.display());
                    std::process::exit(1);
                }
                HarvestConfig::default().save_to(&path)?;
                println!("Wrote {}", path.display());
            }
        },
    }

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "done");
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// `RUST_LOG` wins over the verbosity flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_sink(
    output: Option<&Path>,
    config: &HarvestConfig,
) -> Result<(Box<dyn RecordSink>, Option<PathBuf>)> {
    match output {
        Some(path) if path == Path::new("-") => Ok((Box::new(JsonArraySink::stdout()), None)),
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating output file {}", path.display()))?;
            Ok((
                Box::new(JsonArraySink::new(std::io::BufWriter::new(file))),
                Some(path.to_path_buf()),
            ))
        }
        None => {
            let (sink, path) = JsonArraySink::create_in(&config.storage.output_dir)?;
            Ok((Box::new(sink), Some(path)))
        }
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
