// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PRISM — Privacy Redacting Image Scanning Middleware
//
// Entry point. Initialises logging, loads settings, opens the scanner, and
// runs one scanning session.

mod args;
mod operator;

use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use prism_core::error::{PrismError, Result};
use prism_core::human_errors::humanize_error;
use prism_core::{Archive, ArchiveConfig, OcrEngineKind, SessionConfig};
use prism_document::{Extractor, OverlayLibrary, PdfWriter, Redactor, TesseractCli, TextExtractor};
use prism_pipeline::{AcquisitionSettings, RunController, RunState};
use prism_scanner::{DeviceSession, backend_for};
use tracing::{error, info, warn};

use args::Cli;
use operator::{ConsoleOperator, render};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    info!("PRISM starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "PRISM stopped");
            eprintln!("{}", render(&humanize_error(&err)));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.apply(ArchiveConfig::load_or_default(&cli.config)?);
    let session = SessionConfig::new(
        cli.date.unwrap_or_else(|| Local::now().date_naive()),
        cli.form_type,
        cli.subject_id.clone(),
        cli.count,
        cli.sides.sides(),
        cli.duplex,
        !cli.no_ocr,
    )?;

    let archive = Archive::from_config(&config);
    archive.ensure_layout()?;

    let redactor = Redactor::new(OverlayLibrary::new(&config.overlay_dir));
    if session.form_type.requires_redaction() {
        let overlays = redactor.overlays();
        for &side in &session.sides {
            if !overlays.contains(session.form_type, side) {
                warn!(form_type = %session.form_type, side = %side, "overlay not installed");
                println!(
                    "Warning: no overlay for form {} {side} side in {}; that side will not be redacted or extracted.",
                    session.form_type,
                    overlays.dir().display()
                );
            }
        }
    }

    let extractor = if session.ocr_enabled {
        Some(build_extractor(&config, &session)?)
    } else {
        None
    };

    let device = DeviceSession::open(backend_for(&cli.backend), config.device.as_deref())?;
    println!("Using scanner: {}", device.device());

    let settings = AcquisitionSettings {
        resolution_dpi: config.resolution_dpi,
        color_mode: config.color_mode,
    };
    let mut controller = RunController::new(
        session,
        archive,
        device,
        redactor,
        extractor,
        Box::new(ConsoleOperator::new(cli.is_interactive())),
        settings,
    )?;

    let mut state = RunState::new(controller.config());
    let result = controller.run(&mut state);
    // Releases the scanner before anything else can fail.
    drop(controller);

    println!();
    print!("{}", state.report.summary());
    let saved = match &cli.report {
        Some(path) => state.report.save(path).map(|()| {
            println!("Report written to {}", path.display());
        }),
        None => Ok(()),
    };
    result?;
    saved
}

fn build_extractor(config: &ArchiveConfig, session: &SessionConfig) -> Result<Extractor> {
    let ocr: Box<dyn TextExtractor> = match config.ocr_engine {
        OcrEngineKind::Tesseract => {
            let tesseract = TesseractCli::new();
            if !tesseract.is_available() {
                return Err(PrismError::Config(
                    "tesseract was not found on PATH; install it, choose --engine ocrs, or pass --no-ocr".into(),
                ));
            }
            Box::new(tesseract)
        }
        OcrEngineKind::Ocrs => ocrs_engine(config)?,
    };
    let pdf = PdfWriter::new(config.pdf_page_size).with_title(format!(
        "Form {} {} {}",
        session.form_type, session.subject_id, session.date
    ));
    let extractor = Extractor::new(ocr, Box::new(pdf));
    info!(engine = extractor.engine_name(), page_size = ?config.pdf_page_size, "OCR engine ready");
    Ok(extractor)
}

#[cfg(feature = "ocr")]
fn ocrs_engine(config: &ArchiveConfig) -> Result<Box<dyn TextExtractor>> {
    let dir = config
        .ocr_model_dir
        .clone()
        .unwrap_or_else(prism_document::ocr::engine::default_model_dir);
    Ok(Box::new(prism_document::OcrEngine::from_model_dir(dir)?))
}

#[cfg(not(feature = "ocr"))]
fn ocrs_engine(_config: &ArchiveConfig) -> Result<Box<dyn TextExtractor>> {
    Err(PrismError::Config(
        "this build has no ocrs support; rebuild with --features ocr or use --engine tesseract".into(),
    ))
}
