//! This module builds sheets out of a loaded set of reports.

use fatigue::prelude::*;
use log::*;

use crate::prelude::*;

/// Builds the sheet of one node: its cycles above the limit, in the
/// classifier's order, with their endpoints labelled.
pub fn build_sheet(
  reports: &ReportSet,
  resolver: &EndpointResolver,
  node: &Node,
  settings: &ExportSettings
) -> Sheet {
  let mut sheet = Sheet::new(node);
  let table = match reports.cycles.get(node.num()) {
    Some(t) => t,
    None => {
      warn!("Node {} has no cycle table, its sheet will be empty.", node.num());
      return sheet;
    }
  };
  for cycle in table.above(settings.limit) {
    let label = resolver.endpoints(node.num(), cycle).label(settings.annotate);
    sheet.rows.push(SheetRow::new(label, cycle));
  }
  debug!(
    "Sheet {} has {} of {} cycle types.",
    sheet.name,
    sheet.rows.len(),
    table.len()
  );
  return sheet;
}

/// Builds a workbook with one sheet per selected node.
pub fn build_workbook(
  reports: &ReportSet,
  selection: &NodeSelection,
  settings: &ExportSettings
) -> Workbook {
  let resolver = reports.resolver(settings.resolves_endpoints());
  let sheets = reports.nodes
    .select(selection)
    .into_iter()
    .map(|node| build_sheet(reports, &resolver, node, settings))
    .collect();
  return Workbook { sheets };
}
