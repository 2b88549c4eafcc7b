//! This module implements the node registry: the per-node attributes read
//! from the summary report. Every other table is gated by it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::util::*;

/// A calculation node number.
pub type NodeId = usize;

/// Damage at and above which a node is considered to have failed.
pub const FAILURE_DAMAGE: f64 = 1.0;

/// The reduced stress components a node can be governed by. Each one picks
/// a difference between two of the three principal local stresses.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
  Hash
)]
pub enum Component {
  /// Component 1: si - sj.
  Ij,
  /// Component 2: sj - sk.
  Jk,
  /// Component 3: si - sk.
  Ik
}

impl Component {
  /// Returns all the components, in report order.
  pub const fn all() -> &'static [Self] {
    return &[Self::Ij, Self::Jk, Self::Ik];
  }

  /// Returns the number the reports use for this component.
  pub const fn number(&self) -> usize {
    return match self {
      Self::Ij => 1,
      Self::Jk => 2,
      Self::Ik => 3
    };
  }

  /// Returns the name of the stress difference it selects.
  pub const fn name(&self) -> &'static str {
    return match self {
      Self::Ij => "SIJ",
      Self::Jk => "SJK",
      Self::Ik => "SIK"
    };
  }
}

impl TryFrom<usize> for Component {
  type Error = ();

  fn try_from(value: usize) -> Result<Self, Self::Error> {
    return match value {
      1 => Ok(Self::Ij),
      2 => Ok(Self::Jk),
      3 => Ok(Self::Ik),
      _ => Err(())
    };
  }
}

impl Display for Component {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.number());
  }
}

/// A calculation node and the attributes the summary report gave it. Each
/// attribute can be set exactly once.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Node {
  /// The node number.
  num: NodeId,
  /// Accumulated fatigue damage, if known.
  damage: Option<f64>,
  /// Base calculated moment of time, if known.
  base_moment: Option<usize>,
  /// Governing reduced stress component, if known.
  component: Option<Component>
}

impl Node {
  /// Creates a node with no attributes set.
  pub fn new(num: NodeId) -> Self {
    return Self {
      num,
      damage: None,
      base_moment: None,
      component: None
    };
  }

  /// The node number.
  pub fn num(&self) -> NodeId {
    return self.num;
  }

  /// Accumulated damage (zero until set).
  pub fn damage(&self) -> f64 {
    return self.damage.unwrap_or(0.0);
  }

  /// Base calculated moment of time (zero until set).
  pub fn base_moment(&self) -> usize {
    return self.base_moment.unwrap_or(0);
  }

  /// The governing component, if it was set.
  pub fn component(&self) -> Option<Component> {
    return self.component;
  }

  /// Whether the node's damage signals failure.
  pub fn has_failed(&self) -> bool {
    return self.damage() >= FAILURE_DAMAGE;
  }

  /// Sets the damage. Fails if already set, negative or not finite.
  pub fn set_damage(&mut self, value: f64) -> Result<(), NodeError> {
    if self.damage.is_some() {
      return Err(self.already_set(Attribute::Damage));
    }
    if !value.is_finite() || value < 0.0 {
      return Err(NodeError::BadDamage { node: self.num, value });
    }
    self.damage = Some(value);
    return Ok(());
  }

  /// Sets the base moment. Fails if already set.
  pub fn set_base_moment(&mut self, value: usize) -> Result<(), NodeError> {
    if self.base_moment.is_some() {
      return Err(self.already_set(Attribute::BaseMoment));
    }
    self.base_moment = Some(value);
    return Ok(());
  }

  /// Sets the component from its report number. Fails if already set or if
  /// the number isn't 1, 2 or 3.
  pub fn set_component(&mut self, value: usize) -> Result<(), NodeError> {
    if self.component.is_some() {
      return Err(self.already_set(Attribute::Component));
    }
    let component = Component::try_from(value)
      .map_err(|_| NodeError::BadComponent { node: self.num, value })?;
    self.component = Some(component);
    return Ok(());
  }

  /// Builds an "already set" error for this node.
  fn already_set(&self, attribute: Attribute) -> NodeError {
    return NodeError::AlreadySet { node: self.num, attribute };
  }
}

/// Which nodes to look at.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeSelection {
  /// The given number of most damaged nodes.
  Top(usize),
  /// An explicit list of nodes, in the given order.
  List(Vec<NodeId>)
}

impl Default for NodeSelection {
  fn default() -> Self {
    return Self::Top(10);
  }
}

/// The line shapes the summary report is read by.
#[derive(Copy, Clone, Debug, PartialEq)]
enum SummaryLine {
  /// A new node starts.
  Node(NodeId),
  /// The current node's damage.
  Damage(f64),
  /// The current node's base moment.
  BaseMoment(usize),
  /// The current node's component number.
  Component(usize)
}

/// Line prefixes recognised in the summary report.
mod prefixes {
  /// Starts a node.
  pub(super) const NODE: &str = "Calculation node";
  /// Damage line.
  pub(super) const DAMAGE: &str = "a = ";
  /// Base moment line.
  pub(super) const BASE_MOMENT: &str = "Base calculated moment of time";
  /// Component line, as the solver spells it.
  pub(super) const COMPONENT: &str = "reduced sterss component";
  /// Component line, spelled correctly.
  pub(super) const COMPONENT_FIXED: &str = "reduced stress component";
}

impl SummaryLine {
  /// Decodes a summary line. Ok(None) means the line is irrelevant, Err
  /// means it looked relevant but its value was unreadable.
  fn decode(line: &str) -> Result<Option<Self>, ()> {
    /// Returns what's between the first and second delimiters, trimmed.
    fn after(s: &str, delim: char) -> Result<&str, ()> {
      return s.split(delim).nth(1).map(str::trim).ok_or(());
    }
    if line.starts_with(prefixes::NODE) {
      let num = after(line, ':')?.parse().map_err(|_| ())?;
      return Ok(Some(Self::Node(num)));
    }
    if line.starts_with(prefixes::DAMAGE) {
      let cleaned = line.replace(',', ".");
      let cleaned = cleaned.trim().trim_end_matches('.');
      let damage = after(cleaned, '=')?.parse().map_err(|_| ())?;
      return Ok(Some(Self::Damage(damage)));
    }
    if line.starts_with(prefixes::BASE_MOMENT) {
      let cleaned = line.replace(',', "");
      let moment = after(&cleaned, ':')?.parse().map_err(|_| ())?;
      return Ok(Some(Self::BaseMoment(moment)));
    }
    if line.starts_with(prefixes::COMPONENT)
      || line.starts_with(prefixes::COMPONENT_FIXED) {
      let cleaned = line.replace('.', "");
      let component = after(&cleaned, ':')?.parse().map_err(|_| ())?;
      return Ok(Some(Self::Component(component)));
    }
    return Ok(None);
  }
}

/// All known nodes, by number.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeRegistry {
  /// The nodes.
  nodes: BTreeMap<NodeId, Node>
}

impl NodeRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Adds a node if it isn't known yet, and returns it.
  pub fn add(&mut self, num: NodeId) -> &mut Node {
    return self.nodes.entry(num).or_insert_with(|| Node::new(num));
  }

  /// Looks a node up.
  pub fn get(&self, num: NodeId) -> Option<&Node> {
    return self.nodes.get(&num);
  }

  /// Looks a node up, mutably.
  pub fn get_mut(&mut self, num: NodeId) -> Option<&mut Node> {
    return self.nodes.get_mut(&num);
  }

  /// Number of known nodes.
  pub fn len(&self) -> usize {
    return self.nodes.len();
  }

  /// Whether there are no nodes at all.
  pub fn is_empty(&self) -> bool {
    return self.nodes.is_empty();
  }

  /// Iterates over the nodes in ascending number order.
  pub fn iter(&self) -> impl Iterator<Item = &Node> {
    return self.nodes.values();
  }

  /// All nodes from most to least damaged. Equal damages go in ascending
  /// node number order.
  pub fn ranked(&self) -> Vec<&Node> {
    return self.nodes.values()
      .sorted_by(|a, b| {
        b.damage().total_cmp(&a.damage()).then(a.num.cmp(&b.num))
      })
      .collect();
  }

  /// The `k` most damaged nodes.
  pub fn top(&self, k: usize) -> Vec<&Node> {
    let mut ranked = self.ranked();
    ranked.truncate(k);
    return ranked;
  }

  /// Applies a selection. Unknown nodes in an explicit list are skipped,
  /// and so are repeats of a node already listed.
  pub fn select(&self, selection: &NodeSelection) -> Vec<&Node> {
    return match selection {
      NodeSelection::Top(k) => self.top(*k),
      NodeSelection::List(nums) => {
        let mut seen = BTreeSet::new();
        nums.iter()
          .filter(|num| {
            let first = seen.insert(**num);
            if !first {
              warn!("Node {} is listed more than once, keeping the first.", num);
            }
            first
          })
          .filter_map(|num| {
            let node = self.get(*num);
            if node.is_none() {
              warn!("Node {} is not in the summary report, skipping it.", num);
            }
            node
          })
          .collect()
      }
    };
  }

  /// Reads a summary report from a BufRead instance.
  pub fn parse_bufread<R: BufRead>(reader: R) -> Result<Self, SummaryError> {
    let mut registry = Self::new();
    let mut current: Option<NodeId> = None;
    try_for_each_line(reader, |line, text| {
      let decoded = match SummaryLine::decode(text) {
        Ok(Some(d)) => d,
        Ok(None) => return Ok(()),
        Err(()) => return Err(SummaryError::BadValue {
          line,
          text: text.to_string()
        })
      };
      if let SummaryLine::Node(num) = decoded {
        debug!("Line {} starts node {}.", line, num);
        current = Some(num);
        registry.add(num);
        return Ok(());
      }
      let node = current
        .and_then(|num| registry.get_mut(num))
        .ok_or(SummaryError::NoCurrentNode { line })?;
      let result = match decoded {
        SummaryLine::Damage(x) => node.set_damage(x),
        SummaryLine::BaseMoment(m) => node.set_base_moment(m),
        SummaryLine::Component(c) => node.set_component(c),
        SummaryLine::Node(_) => Ok(())
      };
      return result.map_err(|source| SummaryError::Node { line, source });
    })?;
    return Ok(registry);
  }

  /// Utility method -- reads and parses a summary report file.
  pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, SummaryError> {
    let file = File::open(path.as_ref())?;
    return Self::parse_bufread(BufReader::new(file));
  }
}
