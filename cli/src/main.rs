//! faxtiff CLI - PDF to Group 4 fax TIFF batch converter

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use faxtiff::ConvertSummary;

#[derive(Parser)]
#[command(name = "faxtiff")]
#[command(version)]
#[command(about = "Convert a PDF into a multi-page Group 4 fax TIFF", long_about = None)]
struct Cli {
    /// Base name of the document, without the .pdf extension
    #[arg(value_name = "FILE_NAME")]
    file_name: String,

    /// Folder containing the input; the output TIFF is written alongside it
    #[arg(value_name = "FOLDER_PATH")]
    folder: PathBuf,

    /// Fax target resolution in DPI (recorded but not applied as a
    /// separate constraint)
    #[arg(value_name = "FAX_DPI")]
    fax_resolution: f64,

    /// Printer target resolution in DPI; drives page scaling
    #[arg(value_name = "PRINTER_DPI")]
    printer_resolution: f64,

    /// Password for protected documents
    #[arg(long)]
    password: Option<String>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(summary) => {
            println!(
                "{} {} ({} pages)",
                "Processed".green().bold(),
                summary.output.display(),
                summary.pages
            );
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: &Cli) -> faxtiff::Result<ConvertSummary> {
    let input = cli.folder.join(format!("{}.pdf", cli.file_name));
    let output = cli.folder.join(format!("{}.tif", cli.file_name));
    log::debug!(
        "converting {} -> {} (fax {} dpi, printer {} dpi)",
        input.display(),
        output.display(),
        cli.fax_resolution,
        cli.printer_resolution
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Converting {}...", input.display()));

    let mut builder = faxtiff::FaxTiff::new()
        .with_printer_dpi(cli.printer_resolution)
        .with_fax_dpi(cli.fax_resolution);
    if let Some(ref password) = cli.password {
        builder = builder.with_password(password);
    }
    let result = builder.convert(&input, &output);

    match &result {
        Ok(_) => pb.finish_and_clear(),
        Err(_) => pb.finish_and_clear(),
    }
    result
}
