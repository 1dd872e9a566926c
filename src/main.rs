use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use intent_console::batch::BatchEvaluator;
use intent_console::config::EvalConfig;
use intent_console::export;
use intent_console::format::{self, DataFormat};
use intent_console::predictor::HttpPredictor;
use intent_console::store::MemoryBatchStore;
use intent_console::transcoder;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "intent-console")]
#[command(about = "Batch-evaluate NLU intent predictions and convert training data formats")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a batch evaluation of a dataset against an NLU server
    Evaluate {
        /// Dataset file (.csv, .txt or .json)
        file: PathBuf,

        /// NLU server base URL (or set NLU_SERVER_URL)
        #[arg(long)]
        server_url: Option<String>,

        /// Confidence threshold for recognition
        #[arg(short, long, default_value_t = 0.80)]
        threshold: f64,

        /// Name recorded with the batch
        #[arg(long, default_value = "cli-run")]
        test_name: String,

        /// Declared input format; auto-detected when omitted
        #[arg(long)]
        format: Option<String>,

        /// Write per-item results as CSV to this path
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },
    /// Convert a dataset between csv, json and yaml
    Convert {
        file: PathBuf,

        /// Target format: csv, json or yaml
        #[arg(short, long)]
        to: String,

        /// Source format; auto-detected when omitted
        #[arg(long)]
        from: Option<String>,
    },
    /// Print the detected format of a file
    Detect { file: PathBuf },
}

fn parse_format(name: &str) -> Result<DataFormat> {
    match DataFormat::from_name(name) {
        Some(f) if f != DataFormat::Unknown => Ok(f),
        _ => bail!("unsupported format '{}'; expected csv, json or yaml", name),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    match args.command {
        Command::Evaluate {
            file,
            server_url,
            threshold,
            test_name,
            format,
            export_csv,
        } => {
            let blob = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            let declared = format.as_deref().map(parse_format).transpose()?;

            let server_url = server_url
                .or_else(|| std::env::var("NLU_SERVER_URL").ok())
                .unwrap_or_else(|| "http://localhost:5005".to_string());
            info!("NLU server: {}", server_url);

            let config = EvalConfig {
                confidence_threshold: threshold,
                server_url: Some(server_url.clone()),
                ..EvalConfig::default()
            };
            let evaluator = BatchEvaluator::new(config)?;
            let predictor = HttpPredictor::new(server_url);
            let store = MemoryBatchStore::new();

            let outcome = evaluator
                .run(&predictor, &store, &test_name, &file_name, &blob, declared)
                .await?;

            let summary = &outcome.record.summary;
            println!("Batch {}", outcome.record.id);
            println!(
                "  recognized: {}/{} ({:.1}%)",
                summary.recognized_count, summary.total_count, summary.recognition_rate_pct
            );
            match summary.average_response_time_ms {
                Some(avg) => println!("  avg response time: {:.1} ms", avg),
                None => println!("  avg response time: n/a"),
            }
            if let Some(e) = &outcome.persist_error {
                eprintln!("warning: results were not persisted: {}", e);
            }

            if let Some(path) = export_csv {
                let csv = export::to_csv(&outcome.record.items)?;
                fs::write(&path, csv)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("  exported: {}", path.display());
            }
        }
        Command::Convert { file, to, from } => {
            let blob = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let target = parse_format(&to)?;
            let source = match from.as_deref() {
                Some(name) => parse_format(name)?,
                None => {
                    let detected = format::detect(&blob);
                    if detected == DataFormat::Unknown {
                        bail!(
                            "could not detect the format of {}; pass --from",
                            file.display()
                        );
                    }
                    detected
                }
            };
            print!("{}", transcoder::convert(&blob, source, target)?);
        }
        Command::Detect { file } => {
            let blob = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            println!("{}", format::detect(&blob));
        }
    }

    Ok(())
}
