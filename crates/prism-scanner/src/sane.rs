// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SANE backend driving the `scanimage` command-line tool.
//
//   scanimage -L                    device listing
//   scanimage --help -d <dev>       option listing, searched for a duplex source
//   scanimage -d <dev> --format=png single page to stdout
//   ... --source <duplex> --batch   both sides into a temporary directory

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Output};

use image::DynamicImage;
use prism_core::Side;
use prism_core::error::{PrismError, Result};
use tracing::{debug, info, instrument, warn};

use crate::traits::{AcquireRequest, DeviceDescriptor, ScannerBackend};

/// Parse `scanimage -L` output.
///
/// Lines look like ``device `epson2:net:10.0.0.5' is a Epson DS-530 flatbed scanner``.
pub fn parse_device_list(stdout: &str) -> Vec<DeviceDescriptor> {
    stdout
        .lines()
        .filter_map(|line| {
            let start = line.find('`')? + 1;
            let len = line[start..].find('\'')?;
            let id = &line[start..start + len];
            let rest = &line[start + len + 1..];
            let description = rest.trim().strip_prefix("is a ").unwrap_or(rest.trim());
            Some(DeviceDescriptor::new(id, description))
        })
        .collect()
}

/// Find the value of the `--source` option that scans both sides.
///
/// `scanimage --help` lists sources as ``--source Flatbed|ADF Front|ADF Duplex [Flatbed]``.
pub fn parse_duplex_source(help: &str) -> Option<String> {
    let line = help.lines().find(|l| l.trim_start().starts_with("--source"))?;
    let values = line.trim_start().strip_prefix("--source")?;
    let values = values.split('[').next().unwrap_or(values);
    values
        .split('|')
        .map(str::trim)
        .find(|v| v.to_ascii_lowercase().contains("duplex"))
        .map(str::to_owned)
}

/// `scanimage` driver. Duplex sources are looked up once per device.
pub struct ScanimageBackend {
    program: OsString,
    duplex_sources: HashMap<String, Option<String>>,
}

impl Default for ScanimageBackend {
    fn default() -> Self {
        Self {
            program: OsString::from("scanimage"),
            duplex_sources: HashMap::new(),
        }
    }
}

impl ScanimageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    fn run(&self, cmd: &mut Command) -> std::io::Result<Output> {
        debug!(?cmd, "running scanimage");
        cmd.output()
    }

    fn base_command(&self, device: &DeviceDescriptor, request: &AcquireRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-d")
            .arg(&device.id)
            .arg("--format=png")
            .arg("--resolution")
            .arg(request.resolution_dpi.to_string())
            .arg("--mode")
            .arg(request.color_mode.sane_keyword());
        cmd
    }

    fn duplex_source(&mut self, device: &DeviceDescriptor) -> Option<String> {
        if let Some(cached) = self.duplex_sources.get(&device.id) {
            return cached.clone();
        }
        let mut cmd = Command::new(&self.program);
        cmd.arg("--help").arg("-d").arg(&device.id);
        let source = match self.run(&mut cmd) {
            Ok(out) => parse_duplex_source(&String::from_utf8_lossy(&out.stdout)),
            Err(err) => {
                warn!(error = %err, "could not query scanner options");
                None
            }
        };
        self.duplex_sources.insert(device.id.clone(), source.clone());
        source
    }

    fn acquire_simplex(
        &mut self,
        device: &DeviceDescriptor,
        request: &AcquireRequest,
    ) -> Result<Vec<DynamicImage>> {
        let side = request.side;
        let output = self
            .run(&mut self.base_command(device, request))
            .map_err(|err| acquisition(side, format!("cannot run scanimage: {err}")))?;
        if !output.status.success() {
            return Err(acquisition(
                side,
                format!(
                    "scanimage exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        let image = image::load_from_memory(&output.stdout)
            .map_err(|err| acquisition(side, format!("unreadable scan: {err}")))?;
        Ok(vec![image])
    }

    fn acquire_duplex(
        &mut self,
        device: &DeviceDescriptor,
        request: &AcquireRequest,
    ) -> Result<Vec<DynamicImage>> {
        let source = self
            .duplex_source(device)
            .ok_or(PrismError::DuplexUnsupported)?;
        let side = request.side;
        let batch_dir = tempfile::tempdir()
            .map_err(|err| acquisition(side, format!("cannot create batch directory: {err}")))?;
        let pattern = batch_dir.path().join("page%d.png");

        let mut cmd = self.base_command(device, request);
        cmd.arg("--source")
            .arg(&source)
            .arg(format!("--batch={}", pattern.display()))
            .arg("--batch-count=2");
        let output = self
            .run(&mut cmd)
            .map_err(|err| acquisition(side, format!("cannot run scanimage: {err}")))?;

        // The feeder running dry after one sheet exits non-zero but still
        // leaves the pages it did scan.
        let images = read_batch(batch_dir.path())?;
        if images.is_empty() {
            return Err(acquisition(
                side,
                format!(
                    "duplex pass produced no pages ({}): {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(images)
    }
}

fn acquisition(side: Side, detail: String) -> PrismError {
    PrismError::Acquisition { side, detail }
}

/// Decode `page1.png`, `page2.png`, ... until the first gap.
fn read_batch(dir: &Path) -> Result<Vec<DynamicImage>> {
    let mut images = Vec::new();
    for n in 1.. {
        let path = dir.join(format!("page{n}.png"));
        if !path.is_file() {
            break;
        }
        let image = image::open(&path).map_err(|err| PrismError::Acquisition {
            side: if n == 1 { Side::Front } else { Side::Back },
            detail: format!("unreadable batch page {}: {err}", path.display()),
        })?;
        images.push(image);
    }
    Ok(images)
}

impl ScannerBackend for ScanimageBackend {
    fn name(&self) -> &str {
        "sane"
    }

    #[instrument(skip(self))]
    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-L");
        let output = self.run(&mut cmd).map_err(|err| {
            PrismError::DeviceUnavailable(format!(
                "cannot run {}: {err}",
                self.program.to_string_lossy()
            ))
        })?;
        let devices = parse_device_list(&String::from_utf8_lossy(&output.stdout));
        info!(count = devices.len(), "SANE devices listed");
        Ok(devices)
    }

    fn open(&mut self, device: &DeviceDescriptor) -> Result<()> {
        // scanimage claims the device per invocation; probing options here
        // surfaces an unreachable scanner before the first form.
        let mut cmd = Command::new(&self.program);
        cmd.arg("--help").arg("-d").arg(&device.id);
        let output = self.run(&mut cmd).map_err(|err| {
            PrismError::DeviceUnavailable(format!("cannot run scanimage: {err}"))
        })?;
        if !output.status.success() {
            return Err(PrismError::DeviceUnavailable(format!(
                "{} did not respond: {}",
                device.id,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let source = parse_duplex_source(&String::from_utf8_lossy(&output.stdout));
        self.duplex_sources.insert(device.id.clone(), source);
        Ok(())
    }

    fn supports_duplex(&mut self, device: &DeviceDescriptor) -> bool {
        self.duplex_source(device).is_some()
    }

    #[instrument(skip(self, device), fields(device = %device.id, side = %request.side, duplex = request.duplex))]
    fn acquire(
        &mut self,
        device: &DeviceDescriptor,
        request: &AcquireRequest,
    ) -> Result<Vec<DynamicImage>> {
        let images = if request.duplex {
            self.acquire_duplex(device, request)?
        } else {
            self.acquire_simplex(device, request)?
        };
        info!(pages = images.len(), "Acquired");
        Ok(images)
    }

    fn close(&mut self, device: &DeviceDescriptor) {
        self.duplex_sources.remove(&device.id);
        debug!(device = %device.id, "scanimage session closed");
    }
}
