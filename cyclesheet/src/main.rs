//! A command-line application to export the fatigue cycles of the most
//! damaged calculation nodes into a spreadsheet, one sheet per node.

#![allow(clippy::needless_return)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

mod discovery;

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use fatigue::prelude::*;
use fatigue_sheets::prelude::*;
use log::*;

use crate::discovery::newest_with_prefix;

/// What to write the sheets as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "snake_case")]
enum OutputFormat {
  /// One xlsx workbook.
  Xlsx,
  /// One CSV file per sheet, named after the output file.
  Csv
}

/// The arguments passed to the exporter.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about)]
struct Cli {
  /// Export this many of the most damaged nodes.
  #[arg(short = 'n', long = "top", default_value_t = 10, conflicts_with = "nodes")]
  top: usize,
  /// Export these nodes instead. Can be specified more than once, or
  /// comma-separated.
  #[arg(short = 'l', long = "nodes", num_args = 1.., value_delimiter = ',')]
  nodes: Vec<NodeId>,
  /// Export settings.
  #[command(flatten)]
  settings: ExportSettings,
  /// Path to write output to.
  #[arg(short = 'o', long = "outfile", default_value = "table.xlsx")]
  outfile: PathBuf,
  /// Output format.
  #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Xlsx)]
  format: OutputFormat,
  /// The delimiter used in CSV output.
  #[arg(short = 'd', long = "delim", default_value = ",")]
  delim: char,
  /// Directory to look for reports in.
  #[arg(short = 'D', long = "dir", default_value = ".")]
  dir: PathBuf,
  /// Summary report. If absent, the newest "BaseMoments*" file is used.
  #[arg(long = "summary")]
  summary: Option<PathBuf>,
  /// Local reduced stress report. If absent, the newest
  /// "Report (Local Reduced Stress)*" file is used.
  #[arg(long = "local")]
  local: Option<PathBuf>,
  /// Elastic reduced stress report. If absent, the newest
  /// "Report (Elastic Reduced Stress)*" file is used.
  #[arg(long = "elastic")]
  elastic: Option<PathBuf>,
  /// Accumulated fatigue damage report. If absent, the newest
  /// "Report (Accumulated Fatigue Damage)*" file is used.
  #[arg(long = "damage")]
  damage: Option<PathBuf>,
  /// Output extra/debug info while parsing and exporting.
  #[arg(short = 'v', long = "verbose")]
  verbose: bool
}

impl Cli {
  /// The node selection the arguments ask for.
  fn selection(&self) -> NodeSelection {
    return if self.nodes.is_empty() {
      NodeSelection::Top(self.top)
    } else {
      NodeSelection::List(self.nodes.clone())
    };
  }

  /// The path given for a report, if any.
  fn given_path(&self, family: ReportFamily) -> Option<&PathBuf> {
    return match family {
      ReportFamily::Summary => self.summary.as_ref(),
      ReportFamily::LocalStress => self.local.as_ref(),
      ReportFamily::ElasticStress => self.elastic.as_ref(),
      ReportFamily::FatigueDamage => self.damage.as_ref()
    };
  }

  /// Works out where a report is, or exits.
  fn report_path(&self, family: ReportFamily) -> PathBuf {
    if let Some(path) = self.given_path(family) {
      if !path.is_file() {
        error!("Provided {} report path either does not exist or is not a file!", family);
        std::process::exit(1);
      }
      return path.clone();
    }
    return match newest_with_prefix(&self.dir, family.file_prefix()) {
      Ok(Some(path)) => path,
      Ok(None) => {
        error!(
          "No file starting with \"{}\" in {}!",
          family.file_prefix(),
          self.dir.display()
        );
        std::process::exit(1);
      },
      Err(e) => {
        error!("Could not look for reports in {}: {}", self.dir.display(), e);
        std::process::exit(1);
      }
    };
  }
}

/// Prints the selected nodes.
fn print_nodes(nodes: &[&Node]) {
  println!("{:<10}{:<14}{:>8}{:>6}", "node", "damage", "moment", "comp");
  for node in nodes {
    let component = node.component()
      .map_or("-".to_string(), |c| c.to_string());
    println!(
      "{:<10}{:<14.5e}{:>8}{:>6}",
      node.num(),
      node.damage(),
      node.base_moment(),
      component
    );
  }
}

fn main() -> io::Result<()> {
  // init cli stuff
  let args = Cli::parse();
  let log_level = if args.verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };
  env_logger::builder().filter_level(log_level).init();
  // find and parse the reports
  let paths = ReportPaths {
    summary: args.report_path(ReportFamily::Summary),
    local: args.report_path(ReportFamily::LocalStress),
    elastic: args.report_path(ReportFamily::ElasticStress),
    damage: args.report_path(ReportFamily::FatigueDamage)
  };
  let reports = match ReportSet::load(&paths) {
    Ok(r) => r,
    Err(e) => {
      error!("{}", e);
      std::process::exit(1);
    }
  };
  // show what we're exporting
  let selection = args.selection();
  print_nodes(&reports.nodes.select(&selection));
  let book = build_workbook(&reports, &selection, &args.settings);
  // write it out
  let result = match args.format {
    OutputFormat::Xlsx => save_workbook(&book, &args.outfile),
    OutputFormat::Csv => {
      let dir = match args.outfile.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new(".")
      };
      let stem = args.outfile.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
      write_sheets(&book, dir, stem, args.delim).map(|_| SaveOutcome::Saved)
    }
  };
  match result {
    Ok(SaveOutcome::Saved) => info!("All done."),
    Ok(SaveOutcome::Locked) => std::process::exit(1),
    Err(e) => {
      error!("{}", e);
      std::process::exit(1);
    }
  }
  return Ok(());
}
