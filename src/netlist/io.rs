// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for reading and parsing netlists from disk.
//!
//! Handles plain `.v`/`.gv` inputs and gzip-compressed `.gz` inputs, and
//! renders parse errors with the offending source line and a caret under the
//! reported column.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Result, anyhow};
use flate2::read::MultiGzDecoder;

use crate::netlist::design::Design;
use crate::netlist::error::NetlistError;
use crate::netlist::parse::Parser as NetlistParser;
use crate::netlist::scan::TokenScanner;

fn is_gz(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)
        .map_err(|e| anyhow!(format!("opening netlist '{}': {}", path.display(), e)))?;
    if is_gz(path) {
        Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(file))
    }
}

/// Returns line `lineno` (1-based) of the netlist at `path`, if readable.
pub fn read_line(path: &Path, lineno: u32) -> Option<String> {
    let reader = BufReader::new(open_reader(path).ok()?);
    reader
        .lines()
        .nth((lineno as usize).checked_sub(1)?)
        .and_then(|r| r.ok())
}

/// Formats `err` followed, when it has a position and `line` is available, by
/// the source line and a caret under the error column.
pub fn describe_error_with_context(err: &NetlistError, line: Option<&str>) -> String {
    match err.pos() {
        Some(pos) => format!(
            "{} @ {}\n{}\n{}^",
            err,
            pos,
            line.unwrap_or("<line unavailable>"),
            " ".repeat((pos.colno as usize).saturating_sub(1))
        ),
        None => err.to_string(),
    }
}

/// Parses a netlist (optionally gzipped) into a `Design`, with error messages
/// that include source-line context.
pub fn parse_netlist_from_path(path: &Path) -> Result<Design> {
    let reader = open_reader(path)?;
    let parser: NetlistParser<Box<dyn Read>> = NetlistParser::new(TokenScanner::new(reader));
    let design = parser.parse_design().map_err(|e| {
        let line = e.pos().and_then(|pos| read_line(path, pos.lineno));
        anyhow!(
            "{}: {}",
            path.display(),
            describe_error_with_context(&e, line.as_deref())
        )
    })?;
    log::info!(
        "parsed {} modules from {}",
        design.len(),
        path.display()
    );
    Ok(design)
}
