// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles shared by the pipeline's unit tests.

use std::collections::VecDeque;

use chrono::NaiveDate;
use image::{DynamicImage, Rgb, RgbImage};
use prism_core::error::{PrismError, Result};
use prism_core::{FormType, LogicalForm, SubjectId};
use prism_scanner::{AcquireRequest, DeviceDescriptor, DeviceSession, ScannerBackend};

/// Scanner that replays a fixed list of results, one per `acquire` call.
pub struct ScriptedBackend {
    duplex: bool,
    script: VecDeque<Result<Vec<DynamicImage>>>,
}

impl ScriptedBackend {
    pub fn simplex(script: Vec<Result<Vec<DynamicImage>>>) -> Self {
        Self {
            duplex: false,
            script: script.into(),
        }
    }

    pub fn duplex(script: Vec<Result<Vec<DynamicImage>>>) -> Self {
        Self {
            duplex: true,
            script: script.into(),
        }
    }
}

impl ScannerBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>> {
        Ok(vec![DeviceDescriptor::new("scripted:0", "scripted scanner")])
    }

    fn open(&mut self, _device: &DeviceDescriptor) -> Result<()> {
        Ok(())
    }

    fn supports_duplex(&mut self, _device: &DeviceDescriptor) -> bool {
        self.duplex
    }

    fn acquire(
        &mut self,
        _device: &DeviceDescriptor,
        request: &AcquireRequest,
    ) -> Result<Vec<DynamicImage>> {
        self.script.pop_front().unwrap_or_else(|| {
            Err(PrismError::Acquisition {
                side: request.side,
                detail: "script exhausted".into(),
            })
        })
    }

    fn close(&mut self, _device: &DeviceDescriptor) {}
}

pub fn open_session(backend: ScriptedBackend) -> DeviceSession {
    DeviceSession::open(Box::new(backend), None).expect("scripted session")
}

/// A small page with a gradient so redaction is visible.
pub fn blank() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(20, 26, |x, y| {
        Rgb([200 + (x as u8 % 50), 200 + (y as u8 % 50), 220])
    }))
}

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
}

pub fn form(sequence: u32) -> LogicalForm {
    LogicalForm {
        date: date(),
        form_type: FormType::TYPE_A,
        subject_id: SubjectId::parse("1234567890").expect("valid id"),
        sequence,
    }
}
