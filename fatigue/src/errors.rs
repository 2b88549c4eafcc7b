//! Contains the error types for node bookkeeping and report loading.

use std::fmt::Display;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::nodes::NodeId;
use crate::reports::ReportFamily;

/// The write-once attributes of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
  /// Accumulated fatigue damage.
  Damage,
  /// Base calculated moment of time.
  BaseMoment,
  /// Reduced stress component.
  Component
}

impl Attribute {
  /// Returns a lowercase name for the attribute.
  pub const fn name(&self) -> &'static str {
    return match self {
      Self::Damage => "damage",
      Self::BaseMoment => "base moment",
      Self::Component => "component"
    };
  }
}

impl Display for Attribute {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.name());
  }
}

/// Errors when setting the attributes of a node.
#[derive(Copy, Clone, Debug, Error, PartialEq)]
pub enum NodeError {
  /// The attribute was already set once.
  #[error("node {node} already has its {attribute} set")]
  AlreadySet {
    /// The offending node.
    node: NodeId,
    /// The attribute we tried to overwrite.
    attribute: Attribute
  },
  /// The component number is not 1, 2 or 3.
  #[error("node {node} cannot use component {value} (expected 1, 2 or 3)")]
  BadComponent {
    /// The offending node.
    node: NodeId,
    /// The rejected component number.
    value: usize
  },
  /// The damage is negative or not a number.
  #[error("node {node} cannot have a damage of {value}")]
  BadDamage {
    /// The offending node.
    node: NodeId,
    /// The rejected damage.
    value: f64
  }
}

/// Errors when reading the summary report.
#[derive(Debug, Error)]
pub enum SummaryError {
  /// The file could not be read.
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
  /// An attribute line showed up before any node header.
  #[error("line {line}: node attribute found before any node header")]
  NoCurrentNode {
    /// The line number.
    line: usize
  },
  /// A recognised line did not carry a readable value.
  #[error("line {line}: could not read a value from \"{text}\"")]
  BadValue {
    /// The line number.
    line: usize,
    /// The line itself.
    text: String
  },
  /// A node rejected the value.
  #[error("line {line}: {source}")]
  Node {
    /// The line number.
    line: usize,
    /// What the node complained about.
    #[source]
    source: NodeError
  }
}

/// Errors when loading a whole set of reports.
#[derive(Debug, Error)]
pub enum LoadError {
  /// The summary report was unreadable or inconsistent.
  #[error("could not read the summary report: {0}")]
  Summary(#[from] SummaryError),
  /// One of the gated reports was unreadable.
  #[error("could not read the {family} report: {source}")]
  Report {
    /// Which report.
    family: ReportFamily,
    /// The actual error.
    #[source]
    source: io::Error
  }
}
