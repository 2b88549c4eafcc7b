//! This module holds the knobs of a sheet export.

use clap::Args;
use serde::{Deserialize, Serialize};

/// Cycles at or below this damage are left out by default.
pub const DEFAULT_LIMIT: f64 = 1e-8;

/// How cycle tables become sheets.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Args)]
pub struct ExportSettings {
  /// Only cycle types whose damage exceeds this are written.
  #[arg(long = "limit", default_value_t = DEFAULT_LIMIT)]
  pub limit: f64,
  /// Collapse history: leave compacted cycle endpoints as they are in the
  /// damage report instead of resolving them to moments.
  #[arg(short = 'c', long = "collapse")]
  pub collapse: bool,
  /// Show the compacted endpoints next to the resolved ones, like
  /// "40-41 (3-17)".
  #[arg(short = 'a', long = "annotate", conflicts_with = "collapse")]
  pub annotate: bool
}

impl Default for ExportSettings {
  fn default() -> Self {
    return Self {
      limit: DEFAULT_LIMIT,
      collapse: false,
      annotate: false
    };
  }
}

impl ExportSettings {
  /// Whether compacted endpoints should be resolved.
  pub fn resolves_endpoints(&self) -> bool {
    return !self.collapse;
  }
}
