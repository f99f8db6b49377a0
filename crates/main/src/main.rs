use std::error::Error;

use clap::Parser;
use cv_document::output::{generate, open_in_viewer, OutputTarget};
use log::{error, info};

mod cv;

/// Generates the curriculum vitae PDF and opens it in the default viewer.
///
/// The document is written to the system temporary directory. Fonts are looked up under
/// `assets/fonts` or in the directory named by the `CV_FONTS_DIR` environment variable.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {}

fn main() {
    let _cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        error!("{}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let document = cv::build()?;
    let target = OutputTarget::in_temp_dir(cv::OUTPUT_FILE_NAME);

    info!(
        "Generating PDF document to path: {}",
        target.directory.join(&target.file_name).display()
    );
    let path = generate(&document, &target)?;

    info!("Opening generated PDF document in system viewer app...");
    open_in_viewer(&path)?;
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
