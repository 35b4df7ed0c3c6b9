//! Listino CLI
//!
//! Downloads a price list, keeps the rows for one listino, adds the
//! discounted price and publishes the result.

mod config;

use clap::{Parser, Subcommand};
use config::{FtpArgs, OutputArgs, ProcessingArgs};
use listino_core::{
    decode, detect, run_and_close, DetectOptions, Detection, FtpStore, JobOutcome, JobSpec,
    LocalStore, Result, Row,
};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listino")]
#[command(about = "Price list filter and discount calculator", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the price list on the FTP server
    Run {
        #[command(flatten)]
        ftp: FtpArgs,

        /// Remote path of the price list
        #[arg(long, env = "FTP_INPUT_PATH")]
        input_path: Option<String>,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        processing: ProcessingArgs,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        report_json: bool,
    },

    /// Process a price list inside a local directory tree
    Local {
        /// Directory that plays the role of the server root
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Path of the price list relative to the root
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        processing: ProcessingArgs,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        report_json: bool,
    },

    /// Show how a local CSV file would be read
    Inspect {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Input delimiter; detected when not set
        #[arg(long, value_parser = listino_core::parse_delimiter)]
        delimiter: Option<u8>,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Print the detection result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli.command) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            ftp,
            input_path,
            output,
            processing,
            report_json,
        } => cmd_run(&ftp, input_path, &output, &processing, report_json),
        Commands::Local {
            root,
            input,
            output,
            processing,
            report_json,
        } => cmd_local(&root, input, &output, &processing, report_json),
        Commands::Inspect {
            file,
            delimiter,
            limit,
            json,
        } => cmd_inspect(&file, delimiter, limit, json),
    }
}

fn job_spec(input_path: String, output: &OutputArgs) -> Result<JobSpec> {
    Ok(JobSpec {
        input_path,
        output_dir: output.output_dir(),
        output_name: output.output_name()?,
    })
}

fn cmd_run(
    ftp: &FtpArgs,
    input_path: Option<String>,
    output: &OutputArgs,
    processing: &ProcessingArgs,
    report_json: bool,
) -> Result<()> {
    // Everything is validated before the first connection attempt
    let ftp_settings = ftp.ftp_settings()?;
    let input_path = config::required(&input_path, "FTP_INPUT_PATH")?;
    let job = job_spec(input_path, output)?;
    let settings = processing.pipeline_settings()?;

    let store = FtpStore::connect(&ftp_settings)?;
    let outcome = run_and_close(store, &job, &settings)?;
    report(&outcome, report_json)
}

fn cmd_local(
    root: &PathBuf,
    input: String,
    output: &OutputArgs,
    processing: &ProcessingArgs,
    report_json: bool,
) -> Result<()> {
    let job = job_spec(input, output)?;
    let settings = processing.pipeline_settings()?;

    let store = LocalStore::new(root)?;
    let outcome = run_and_close(store, &job, &settings)?;
    report(&outcome, report_json)
}

fn report(outcome: &JobOutcome, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match outcome {
        JobOutcome::EmptyInput => warn!("run finished without output"),
        JobOutcome::Published {
            directory,
            filename,
            bytes,
            report,
        } => {
            info!(
                rows_in = report.rows_in,
                rows_kept = report.rows_kept,
                computed = report.augmentation.computed(),
                warnings = report.warnings.len(),
                bytes,
                "done: {}/{}",
                directory.trim_end_matches('/'),
                filename
            );
        }
    }
    Ok(())
}

/// What `inspect` found out about a file
#[derive(Debug, Serialize)]
struct InspectReport {
    detection: Detection,
    charset: &'static str,
    lossy: bool,
    header_in_source: bool,
    headers: Vec<String>,
    row_count: usize,
    /// The first rows, up to the requested limit
    rows: Vec<Row>,
}

fn inspect(bytes: &[u8], delimiter: Option<u8>, limit: usize) -> InspectReport {
    let options = DetectOptions {
        delimiter,
        has_header: None,
    };
    let detection = detect(bytes, &options);
    let decoded = decode(bytes, &detection.dialect);
    let table = decoded.table;

    InspectReport {
        detection,
        charset: decoded.charset,
        lossy: decoded.lossy,
        header_in_source: table.header_in_source,
        row_count: table.rows.len(),
        headers: table.headers,
        rows: table.rows.into_iter().take(limit).collect(),
    }
}

fn cmd_inspect(file: &PathBuf, delimiter: Option<u8>, limit: usize, json: bool) -> Result<()> {
    let bytes = fs::read(file).map_err(|e| listino_core::Error::File {
        path: file.clone(),
        source: e,
    })?;
    let report = inspect(&bytes, delimiter, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let detection = &report.detection;
    let dialect = &detection.dialect;
    println!("File: {}", file.display());
    println!("Charset: {}{}", report.charset, if report.lossy { " (lossy)" } else { "" });
    println!(
        "Delimiter: {} ({:?}{})",
        (dialect.delimiter as char).escape_default(),
        detection.method,
        if detection.fallback_used { ", fallback" } else { "" }
    );
    println!("Quote: {} ({:?})", dialect.quote as char, dialect.quote_style);
    println!(
        "Header: {}",
        if report.header_in_source { "yes" } else { "no (synthesized)" }
    );
    println!("Columns: {}", report.headers.len());
    println!("Rows: {}", report.row_count);
    println!();

    // Print header
    println!("{}", report.headers.join("\t"));
    println!("{}", "-".repeat(report.headers.len() * 12));

    for row in &report.rows {
        println!("{}", row.cells.join("\t"));
    }

    if report.row_count > report.rows.len() {
        println!("... ({} more rows)", report.row_count - report.rows.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_report_carries_headers_and_rows() {
        let report = inspect(b"CODICE;LIPREZZO\nA1;1,50\nA2;2,00\nA3;3,00\n", None, 2);
        assert_eq!(report.detection.dialect.delimiter, b';');
        assert_eq!(report.charset, "UTF-8");
        assert!(report.header_in_source);
        assert_eq!(report.headers, vec!["CODICE", "LIPREZZO"]);
        assert_eq!(report.row_count, 3);
        assert_eq!(report.rows.len(), 2);

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["headers"][1], "LIPREZZO");
        assert_eq!(json["rows"][0][1], "1,50");
        assert_eq!(json["charset"], "UTF-8");
        assert_eq!(json["detection"]["fallback_used"], false);
    }
}
