// SPDX-License-Identifier: Apache-2.0

//! Command line tool that parses a structural netlist and reports how many
//! instances of each cell a module contains once its hierarchy is flattened.
//!
//! ```text
//! hiercount TopCell.v --top TopCell
//! AND2            : 1 placements
//! INV             : 2 placements
//! cellB           : 1 placements
//! ```

mod report_cli_error;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use hiercount::netlist::design::Design;
use hiercount::netlist::io::parse_netlist_from_path;
use hiercount::netlist::report::PlacementReport;
use report_cli_error::report_cli_error_and_exit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Count the cells placed under a module of a structural netlist.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input netlist (`.v`, `.gv`, or gzip-compressed `.gz`).
    netlist: PathBuf,

    /// Module whose hierarchy is flattened. Defaults to the only module that
    /// no other module instantiates.
    #[arg(long)]
    top: Option<String>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print the parsed design tree before the report.
    #[arg(long, default_value_t = false)]
    dump_design: bool,
}

fn pick_top(design: &Design, requested: Option<&str>) -> Result<String> {
    if let Some(top) = requested {
        return Ok(top.to_string());
    }
    let roots: Vec<&str> = design
        .root_modules()
        .into_iter()
        .map(|idx| design.resolve(design.module_at(idx).name))
        .collect();
    match roots.as_slice() {
        [only] => Ok(only.to_string()),
        [] => Err(anyhow!("no top module candidates; pass --top")),
        many => Err(anyhow!(
            "multiple top module candidates ({}); pass --top",
            many.join(", ")
        )),
    }
}

fn run(args: &Args) -> Result<()> {
    let design = parse_netlist_from_path(&args.netlist)?;
    if args.dump_design {
        println!("{}\n", design);
    }
    let top = pick_top(&design, args.top.as_deref())?;
    log::info!("counting instances under {}", top);
    let counts = design.count_instances(&top)?;
    let report = PlacementReport::new(&design, &top, counts)?;
    match args.format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn main() {
    let _ = env_logger::builder().try_init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        let netlist = args.netlist.display().to_string();
        report_cli_error_and_exit(&e.to_string(), vec![("netlist", netlist.as_str())]);
    }
}
