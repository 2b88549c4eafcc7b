//! This module ties the four reports together: it loads them in the order
//! their gates require and resolves compacted cycle endpoints across the
//! elastic and local stress tables.

use std::fmt::Display;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::cycles::*;
use crate::elastic::*;
use crate::errors::*;
use crate::local::*;
use crate::nodes::*;

/// The report families produced by the fatigue calculation.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum ReportFamily {
  /// Per-node damage, base moment and component.
  Summary,
  /// Local reduced stresses over time.
  LocalStress,
  /// Elastic reduced stresses.
  ElasticStress,
  /// Accumulated fatigue damage, by cycle type.
  FatigueDamage
}

impl ReportFamily {
  /// Returns all the families, in loading order.
  pub const fn all() -> &'static [Self] {
    return &[
      Self::Summary,
      Self::LocalStress,
      Self::ElasticStress,
      Self::FatigueDamage
    ];
  }

  /// The start of the file names the calculation gives these reports.
  pub const fn file_prefix(&self) -> &'static str {
    return match self {
      Self::Summary => "BaseMoments",
      Self::LocalStress => "Report (Local Reduced Stress)",
      Self::ElasticStress => "Report (Elastic Reduced Stress)",
      Self::FatigueDamage => "Report (Accumulated Fatigue Damage)"
    };
  }

  /// A human-readable name.
  pub const fn name(&self) -> &'static str {
    return match self {
      Self::Summary => "summary",
      Self::LocalStress => "local reduced stress",
      Self::ElasticStress => "elastic reduced stress",
      Self::FatigueDamage => "accumulated fatigue damage"
    };
  }
}

impl Display for ReportFamily {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.name());
  }
}

/// Wraps an I/O error with the report it came from.
fn report_err(family: ReportFamily) -> impl FnOnce(io::Error) -> LoadError {
  return move |source| LoadError::Report { family, source };
}

/// Where each report lives.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportPaths {
  /// The summary report.
  pub summary: PathBuf,
  /// The local reduced stress report.
  pub local: PathBuf,
  /// The elastic reduced stress report.
  pub elastic: PathBuf,
  /// The accumulated fatigue damage report.
  pub damage: PathBuf
}

/// Everything read from one set of reports.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReportSet {
  /// Nodes and their attributes.
  pub nodes: NodeRegistry,
  /// Local stresses of each node.
  pub local: LocalStressIndex,
  /// Elastic stresses of each node.
  pub elastic: ElasticStressIndex,
  /// Cycle types of each node.
  pub cycles: CycleClassifier
}

impl ReportSet {
  /// Loads the four report files, in gating order.
  pub fn load(paths: &ReportPaths) -> Result<Self, LoadError> {
    /// Logs the file we're about to read.
    fn announce(family: ReportFamily, path: &Path) {
      match path.file_name().and_then(|s| s.to_str()) {
        Some(name) => info!("Parsing the {} report ({})...", family, name),
        None => info!("Parsing the {} report...", family)
      }
    }
    announce(ReportFamily::Summary, &paths.summary);
    let nodes = NodeRegistry::parse_file(&paths.summary)?;
    info!("Found {} nodes.", nodes.len());
    announce(ReportFamily::LocalStress, &paths.local);
    let local = LocalStressIndex::parse_file(&paths.local, &nodes)
      .map_err(report_err(ReportFamily::LocalStress))?;
    announce(ReportFamily::ElasticStress, &paths.elastic);
    let elastic = ElasticStressIndex::parse_file(&paths.elastic, &nodes)
      .map_err(report_err(ReportFamily::ElasticStress))?;
    announce(ReportFamily::FatigueDamage, &paths.damage);
    let cycles = CycleClassifier::parse_file(&paths.damage, &nodes)
      .map_err(report_err(ReportFamily::FatigueDamage))?;
    info!(
      "Done parsing: {} local, {} elastic and {} cycle tables.",
      local.len(),
      elastic.len(),
      cycles.len()
    );
    return Ok(Self { nodes, local, elastic, cycles });
  }

  /// Reads the four reports from BufRead instances, in gating order.
  pub fn from_readers<A, B, C, D>(
    summary: A,
    local: B,
    elastic: C,
    damage: D
  ) -> Result<Self, LoadError>
  where A: BufRead, B: BufRead, C: BufRead, D: BufRead {
    let nodes = NodeRegistry::parse_bufread(summary)?;
    let local = LocalStressIndex::parse_bufread(local, &nodes)
      .map_err(report_err(ReportFamily::LocalStress))?;
    let elastic = ElasticStressIndex::parse_bufread(elastic, &nodes)
      .map_err(report_err(ReportFamily::ElasticStress))?;
    let cycles = CycleClassifier::parse_bufread(damage, &nodes)
      .map_err(report_err(ReportFamily::FatigueDamage))?;
    return Ok(Self { nodes, local, elastic, cycles });
  }

  /// The largest local table length among all nodes.
  pub fn table_length(&self) -> usize {
    return self.local.table_length();
  }

  /// Finds the moments behind a cycle's extreme stresses, through the node's
  /// elastic samples. None if either can't be found.
  pub fn resolve(
    &self,
    node: NodeId,
    cycle: &CycleRecord
  ) -> Option<(MomentId, MomentId)> {
    let elastic = self.elastic.get(node)?;
    let res = Resolution {
      local: self.local.get(node)?,
      component: self.nodes.get(node)?.component()?
    };
    let first = elastic.search_by_stress(cycle.sfmax, &res)?;
    let second = elastic.search_by_stress(cycle.sfmin, &res)?;
    return Some((first, second));
  }

  /// Creates an endpoint resolver. If `enabled` is false, compacted
  /// endpoints are left as they are.
  pub fn resolver(&self, enabled: bool) -> EndpointResolver<'_> {
    return EndpointResolver {
      reports: self,
      table_length: self.table_length(),
      enabled
    };
  }
}

/// The endpoints of a cycle, as they should be reported.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoints {
  /// Both endpoints are moments already.
  Direct(MomentId, MomentId),
  /// Compacted endpoints that weren't (or couldn't be) resolved.
  Compacted(usize, usize),
  /// Compacted endpoints and the moments they were resolved to.
  Resolved {
    /// The ids in the damage report.
    compacted: (usize, usize),
    /// The moments they stand for.
    moments: (MomentId, MomentId)
  }
}

impl Endpoints {
  /// A label like "3-17". When `annotate` is set, resolved endpoints show
  /// the compacted ids too, like "40-41 (3-17)".
  pub fn label(&self, annotate: bool) -> String {
    return match self {
      Self::Direct(a, b) | Self::Compacted(a, b) => format!("{}-{}", a, b),
      Self::Resolved { compacted: (a, b), moments: (x, y) } => if annotate {
        format!("{}-{} ({}-{})", a, b, x, y)
      } else {
        format!("{}-{}", x, y)
      }
    };
  }
}

/// Works out the endpoints of cycles against a fixed set of reports.
#[derive(Copy, Clone, Debug)]
pub struct EndpointResolver<'a> {
  /// The reports.
  reports: &'a ReportSet,
  /// Endpoints above this are compacted.
  table_length: usize,
  /// Whether to resolve compacted endpoints at all.
  enabled: bool
}

impl EndpointResolver<'_> {
  /// The endpoints of a node's cycle.
  pub fn endpoints(&self, node: NodeId, cycle: &CycleRecord) -> Endpoints {
    let (a, b) = (cycle.first_id, cycle.second_id);
    if !cycle.is_compacted(self.table_length) {
      return Endpoints::Direct(a, b);
    }
    if !self.enabled {
      return Endpoints::Compacted(a, b);
    }
    return match self.reports.resolve(node, cycle) {
      Some(moments) => Endpoints::Resolved { compacted: (a, b), moments },
      None => {
        debug!("Could not resolve cycle {}-{} of node {}.", a, b, node);
        Endpoints::Compacted(a, b)
      }
    };
  }
}
