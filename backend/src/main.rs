//! Metre CLI - Process measurement sheets into import-ready workbooks
//!
//! # Main Commands
//!
//! ```bash
//! metre serve                        # Start HTTP server (port 3000)
//! metre process Meetstaat.xlsx       # Write "Meetstaat Processed.xlsx"
//! metre preview Meetstaat.xlsx       # Processed preview as JSON
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! metre inspect Meetstaat.xlsx       # Parsed sheet as JSON, before transform
//! metre units                        # Unit to quantity type table
//! ```

use clap::{Parser, Subcommand};
use metre::{
    api::logs::LOG_BROADCASTER, parse_file, port_from_env, process_file, units_description,
    PreviewResponse, ProcessOptions, SheetInfo,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "metre")]
#[command(about = "Process measurement sheets into import-ready workbooks", long_about = None)]
struct Cli {
    /// Do not echo pipeline logs to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a sheet and write the result workbook
    Process {
        /// Input sheet (xlsx, xls, ods, csv)
        input: PathBuf,

        /// Property name used in the Elemental Query column
        #[arg(short = 'p', long)]
        element_query_param: Option<String>,

        /// Output workbook (default: "<input> Processed.xlsx" beside the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Process a sheet and print a JSON preview
    Preview {
        /// Input sheet
        input: PathBuf,

        /// Property name used in the Elemental Query column
        #[arg(short = 'p', long)]
        element_query_param: Option<String>,

        /// Number of rows in the preview
        #[arg(long)]
        rows: Option<usize>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the parsed sheet as JSON, without transforming it
    Inspect {
        /// Input sheet
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the unit to quantity type table
    Units,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: METRE_PORT or 3000)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    LOG_BROADCASTER.set_echo(!cli.quiet);

    let options = ProcessOptions::from_env();

    let result = match cli.command {
        Commands::Process {
            input,
            element_query_param,
            output,
        } => cmd_process(
            &input,
            options.with_element_query_param(element_query_param),
            output.as_deref(),
        ),

        Commands::Preview {
            input,
            element_query_param,
            rows,
            output,
        } => cmd_preview(
            &input,
            options
                .with_element_query_param(element_query_param)
                .with_preview_rows(rows),
            output.as_deref(),
        ),

        Commands::Inspect { input, output } => cmd_inspect(&input, output.as_deref()),

        Commands::Units => cmd_units(),

        Commands::Serve { port } => cmd_serve(port.unwrap_or_else(port_from_env), options).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_process(
    input: &Path,
    options: ProcessOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let result = process_file(input, &options)?;

    let target = match output {
        Some(p) => p.to_path_buf(),
        None => input.with_file_name(&result.file_name),
    };
    fs::write(&target, &result.output)?;

    eprintln!("\n📊 Results: {} rows kept, {} dropped", result.dataset.row_count(), result.dropped_rows);
    for warning in result.warning_messages() {
        eprintln!("   ⚠️  {}", warning);
    }
    eprintln!("💾 Output written to: {}", target.display());
    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_preview(
    input: &Path,
    options: ProcessOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Previewing: {}", input.display());

    let result = process_file(input, &options)?;
    let preview = PreviewResponse::from_result(&result, options.preview_rows, &options.element_query_param);

    let json = serde_json::to_string_pretty(&preview)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_inspect(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Inspecting: {}", input.display());

    let parsed = parse_file(input)?;
    let info = SheetInfo::from(&parsed);

    eprintln!("   Format: {}", info.format);
    eprintln!("   Sheet: {}", info.sheet_name);
    if let Some(ref encoding) = info.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(delimiter) = info.delimiter {
        eprintln!("   Delimiter: '{}'", format_delimiter(delimiter));
    }
    eprintln!("   Columns: {}", info.columns.join(", "));
    eprintln!("✅ Parsed {} rows", info.row_count);

    let json = serde_json::to_string_pretty(&parsed.dataset)?;
    write_output(&json, output)?;

    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn cmd_units() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", units_description());
    Ok(())
}

async fn cmd_serve(port: u16, options: ProcessOptions) -> Result<(), Box<dyn std::error::Error>> {
    metre::server::start_server(port, options).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
