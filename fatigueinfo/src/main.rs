//! Dumps information on a set of fatigue reports: the most damaged nodes,
//! which tables were found for them and, optionally, the tables themselves.

#![allow(clippy::needless_return)] // i'll never forgive rust for this

use std::fmt::Display;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use fatigue::prelude::*;
use log::{LevelFilter, info, warn, error};

#[derive(Parser)]
#[command(author, version)]
struct Cli {
  /// Number of most damaged nodes to list.
  #[arg(short = 'n', long = "top", default_value_t = 10)]
  top: usize,
  /// Print the tables of this node.
  #[arg(short = 'N', long = "node")]
  node: Option<NodeId>,
  /// Local reduced stress report.
  #[arg(long = "local")]
  local: Option<PathBuf>,
  /// Elastic reduced stress report.
  #[arg(long = "elastic")]
  elastic: Option<PathBuf>,
  /// Accumulated fatigue damage report.
  #[arg(long = "damage")]
  damage: Option<PathBuf>,
  /// Print everything that was read as JSON instead.
  #[arg(long)]
  json: bool,
  /// Output extra/debug info while parsing.
  #[arg(short, long)]
  verbose: bool,
  /// Summary report path.
  summary: PathBuf
}

const INDENT: &str = "  ";

/// Unwraps a parse result, or logs the error and exits.
fn or_exit<T, E: Display>(result: Result<T, E>, family: ReportFamily) -> T {
  return match result {
    Ok(x) => x,
    Err(e) => {
      error!("Could not read the {} report: {}", family, e);
      std::process::exit(1);
    }
  };
}

/// Prints a node's local stresses.
fn print_local(table: &LocalStressTable) {
  println!("{:<10}{:<10}{:<10}{:<10}{:<10}", "moment", "temp", "sij", "sjk", "sik");
  for s in table.iter() {
    println!(
      "{:<10}{:<10.1}{:<10.2}{:<10.2}{:<10.2}",
      s.moment(),
      s.temperature(),
      s.sij(),
      s.sjk(),
      s.sik()
    );
  }
}

/// Prints a node's elastic stresses, and the moments they resolve to.
fn print_elastic(table: &ElasticStressTable, res: Option<&Resolution>) {
  println!("{:<6}{:<10}{:<10}{:<10}{:<8}", "id", "temp", "sll", "sfl", "moment");
  for s in table.iter() {
    let moment = res.and_then(|r| s.real_id(r))
      .map_or("-".to_string(), |m| m.to_string());
    println!(
      "{:<6}{:<10.1}{:<10.2}{:<10.2}{:<8}",
      s.id(),
      s.temperature(),
      s.sll(),
      s.sfl(),
      moment
    );
  }
}

/// Prints a node's cycles with their endpoint labels.
fn print_cycles(node: NodeId, table: &CycleTable, resolver: &EndpointResolver) {
  for c in table.iter() {
    println!(
      "{:>3} - {:<3} {:>8.2}{:>8.2}{:>8.2}{:>7.1}{:>7.1}{:>7.2}{:>10.0}{:>10.1} {:>11.4e}  {}",
      c.first_id,
      c.second_id,
      c.sfmax,
      c.sfmin,
      c.saf,
      c.tmin,
      c.tmax,
      c.r,
      c.ndop,
      c.n,
      c.a,
      resolver.endpoints(node, c).label(true)
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
  // parse the summary
  if !args.summary.is_file() {
    error!("Provided path either does not exist or is not a file!");
    std::process::exit(1);
  }
  info!("Parsing the summary report...");
  let nodes = or_exit(
    NodeRegistry::parse_file(&args.summary),
    ReportFamily::Summary
  );
  let mut reports = ReportSet { nodes, ..Default::default() };
  // parse whatever else we were given
  if let Some(path) = &args.local {
    info!("Parsing the {} report...", ReportFamily::LocalStress);
    reports.local = or_exit(
      LocalStressIndex::parse_file(path, &reports.nodes),
      ReportFamily::LocalStress
    );
  }
  if let Some(path) = &args.elastic {
    info!("Parsing the {} report...", ReportFamily::ElasticStress);
    reports.elastic = or_exit(
      ElasticStressIndex::parse_file(path, &reports.nodes),
      ReportFamily::ElasticStress
    );
  }
  if let Some(path) = &args.damage {
    info!("Parsing the {} report...", ReportFamily::FatigueDamage);
    reports.cycles = or_exit(
      CycleClassifier::parse_file(path, &reports.nodes),
      ReportFamily::FatigueDamage
    );
  }
  info!("Done parsing.");
  if args.json {
    println!("{}", serde_json::to_string_pretty(&reports)?);
    return Ok(());
  }
  // print the ranking
  let failed = reports.nodes.iter().filter(|n| n.has_failed()).count();
  info!("{} nodes found, {} of them failed.", reports.nodes.len(), failed);
  info!("Local table length is {}.", reports.table_length());
  info!("Most damaged nodes:");
  for node in reports.nodes.top(args.top) {
    let num = node.num();
    let component = node.component()
      .map_or("unknown".to_string(), |c| c.name().to_string());
    info!(
      "{}- Node {}: damage {:.5e}, base moment {}, component {}",
      INDENT,
      num,
      node.damage(),
      node.base_moment(),
      component
    );
    info!(
      "{}{}- {} local, {} elastic samples, {} cycle types",
      INDENT,
      INDENT,
      reports.local.get(num).map_or(0, |t| t.len()),
      reports.elastic.get(num).map_or(0, |t| t.len()),
      reports.cycles.get(num).map_or(0, |t| t.len())
    );
  }
  // print one node's tables
  let num = match args.node {
    Some(num) => num,
    None => return Ok(())
  };
  let node = match reports.nodes.get(num) {
    Some(node) => node,
    None => {
      error!("Node {} is not in the summary report!", num);
      std::process::exit(1);
    }
  };
  let local = reports.local.get(num);
  match local {
    Some(table) => print_local(table),
    None => warn!("No local stresses for node {}.", num)
  }
  let res = local.zip(node.component())
    .map(|(local, component)| Resolution { local, component });
  match reports.elastic.get(num) {
    Some(table) => print_elastic(table, res.as_ref()),
    None => warn!("No elastic stresses for node {}.", num)
  }
  match reports.cycles.get(num) {
    Some(table) => print_cycles(num, table, &reports.resolver(true)),
    None => warn!("No cycles for node {}.", num)
  }
  return Ok(());
}
