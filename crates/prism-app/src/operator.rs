// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Console operator — prints hand-off prompts, waits for Enter, and shows
// problems as they happen.

use std::io::{BufRead, Write};

use prism_core::PrismError;
use prism_core::human_errors::{OperatorNotice, Severity, humanize_error};
use prism_pipeline::{HandOff, Operator};
use tracing::warn;

pub struct ConsoleOperator {
    /// Block on Enter at each hand-off.
    wait: bool,
}

impl ConsoleOperator {
    pub fn new(wait: bool) -> Self {
        Self { wait }
    }
}

impl Operator for ConsoleOperator {
    fn hand_off(&mut self, hand_off: &HandOff) {
        println!();
        if !self.wait {
            println!("{hand_off}");
            return;
        }
        print!("{hand_off}, then press Enter... ");
        if let Err(err) = std::io::stdout().flush() {
            warn!(error = %err, "stdout flush failed");
        }
        let mut line = String::new();
        if let Err(err) = std::io::stdin().lock().read_line(&mut line) {
            warn!(error = %err, "could not read operator input; continuing");
        }
    }

    fn notify(&mut self, form: u32, err: &PrismError) {
        println!("Form {form}: {}", render(&humanize_error(err)));
    }
}

/// One-paragraph rendering of a notice.
pub fn render(notice: &OperatorNotice) -> String {
    let label = match notice.severity {
        Severity::Notice => "note",
        Severity::ActionRequired => "action needed",
        Severity::Fatal => "stopped",
    };
    let mut out = format!("[{label}] {}\n  {}", notice.message, notice.suggestion);
    if notice.rescan {
        out.push_str("\n  Rescanning this form may recover the missing output.");
    }
    out
}
