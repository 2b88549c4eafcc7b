//! This module implements the generic, one-pass scanner for the gated
//! reports. Those files repeat the same header shapes for every node,
//! component and base moment, and only the block whose headers match what
//! the summary report said about a node is of interest.
//!
//! The scanner is an explicit state machine. The transition function is
//! pure; the [`Scanner`] around it keeps line counts, remembers which nodes
//! were already captured and forwards records into a [`BlockSink`].

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::marker::PhantomData;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::nodes::*;
use crate::util::*;

/// The header values a block must carry to belong to a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
  /// The node the block would belong to.
  pub node: NodeId,
  /// The node's governing component. If unknown, nothing matches.
  pub component: Option<Component>,
  /// The node's base moment.
  pub base_moment: usize
}

impl Gate {
  /// Checks whether a component header value is the one we want.
  pub fn accepts_component(&self, value: usize) -> bool {
    return self.component.is_some_and(|c| c.number() == value);
  }
}

impl From<&Node> for Gate {
  fn from(node: &Node) -> Self {
    return Self {
      node: node.num(),
      component: node.component(),
      base_moment: node.base_moment()
    };
  }
}

/// The states of a gated scan.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
  /// Looking for a node header.
  SeekNode,
  /// Looking for the node's component header.
  SeekComponent(Gate),
  /// Looking for the node's base moment header.
  SeekMoment(Gate),
  /// Reading data records, after skipping some label lines.
  ReadRecords {
    /// The node the records belong to.
    gate: Gate,
    /// Label lines left to skip.
    skip: usize
  }
}

/// What a line did to a scan.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanEvent<R> {
  /// Nothing.
  Useless,
  /// A node header for a node the summary report doesn't know.
  UnknownNode(NodeId),
  /// A node header for a node whose block was already read.
  AlreadyCaptured(NodeId),
  /// A node header for a node we want.
  NodeFound(Gate),
  /// The component header we wanted.
  ComponentMatched(Gate),
  /// A header for another component showed up before our base moment.
  ComponentLeft(Gate),
  /// The base moment header we wanted. Records follow.
  MomentMatched(Gate),
  /// A label line between the headers and the records.
  Label(Gate),
  /// A data record.
  Record(NodeId, R),
  /// The block ended on this line.
  EndOfBlock(NodeId),
  /// Another node header showed up before this node's block did.
  Abandoned(NodeId)
}

impl<R> ScanEvent<R> {
  /// Whether the event came from a line worth a second look in the state
  /// we've just moved into.
  fn reexamine(&self) -> bool {
    return matches!(self, Self::EndOfBlock(_) | Self::Abandoned(_));
  }
}

/// The result of feeding one line to the transition function.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<R> {
  /// The next state.
  pub state: ScanState,
  /// What happened.
  pub event: ScanEvent<R>
}

impl<R> Step<R> {
  /// Convenience constructor.
  fn to(state: ScanState, event: ScanEvent<R>) -> Self {
    return Self { state, event };
  }

  /// Whether the same line must be fed again in the new state.
  pub fn reexamine(&self) -> bool {
    return self.event.reexamine();
  }
}

/// Describes one family of gated report: its header shapes and how to turn a
/// data line into a record.
pub trait BlockLayout {
  /// The record type in the data lines.
  type Record;
  /// Name of the report, for logging.
  const NAME: &'static str;
  /// Shapes of node header lines.
  const NODE_HEADERS: &'static [HeaderPattern];
  /// Shapes of component header lines. Empty if there's no component gate.
  const COMPONENT_HEADERS: &'static [HeaderPattern];
  /// Shapes of base moment header lines.
  const MOMENT_HEADERS: &'static [HeaderPattern];
  /// Label lines between the base moment header and the first record.
  const LABEL_LINES: usize;

  /// Decodes the whitespace-separated fields of a data line (with decimal
  /// commas already replaced). None means the line isn't a record.
  fn decode(fields: &[&str]) -> Option<Self::Record>;
}

/// Everything a transition may look at besides the line.
#[derive(Copy, Clone, Debug)]
pub struct ScanContext<'a> {
  /// The known nodes.
  pub registry: &'a NodeRegistry,
  /// The nodes whose block has already been read.
  pub captured: &'a BTreeSet<NodeId>
}

/// The transition function of the scan.
pub fn transition<L: BlockLayout>(
  state: ScanState,
  line: &str,
  ctx: &ScanContext
) -> Step<L::Record> {
  let node_header = || header_value(L::NODE_HEADERS, line);
  return match state {
    ScanState::SeekNode => {
      let num = match node_header() {
        Some(num) => num,
        None => return Step::to(state, ScanEvent::Useless)
      };
      if ctx.captured.contains(&num) {
        return Step::to(state, ScanEvent::AlreadyCaptured(num));
      }
      match ctx.registry.get(num) {
        Some(node) => {
          let gate = Gate::from(node);
          let next = if L::COMPONENT_HEADERS.is_empty() {
            ScanState::SeekMoment(gate)
          } else {
            ScanState::SeekComponent(gate)
          };
          Step::to(next, ScanEvent::NodeFound(gate))
        },
        None => Step::to(state, ScanEvent::UnknownNode(num))
      }
    },
    ScanState::SeekComponent(gate) => {
      if node_header().is_some() {
        return Step::to(ScanState::SeekNode, ScanEvent::Abandoned(gate.node));
      }
      match header_value(L::COMPONENT_HEADERS, line) {
        Some(c) if gate.accepts_component(c) => Step::to(
          ScanState::SeekMoment(gate),
          ScanEvent::ComponentMatched(gate)
        ),
        _ => Step::to(state, ScanEvent::Useless)
      }
    },
    ScanState::SeekMoment(gate) => {
      if node_header().is_some() {
        return Step::to(ScanState::SeekNode, ScanEvent::Abandoned(gate.node));
      }
      if let Some(c) = header_value(L::COMPONENT_HEADERS, line) {
        if !gate.accepts_component(c) {
          return Step::to(
            ScanState::SeekComponent(gate),
            ScanEvent::ComponentLeft(gate)
          );
        }
      }
      match header_value(L::MOMENT_HEADERS, line) {
        Some(m) if m == gate.base_moment => Step::to(
          ScanState::ReadRecords { gate, skip: L::LABEL_LINES },
          ScanEvent::MomentMatched(gate)
        ),
        _ => Step::to(state, ScanEvent::Useless)
      }
    },
    ScanState::ReadRecords { gate, skip } if skip > 0 => Step::to(
      ScanState::ReadRecords { gate, skip: skip - 1 },
      ScanEvent::Label(gate)
    ),
    ScanState::ReadRecords { gate, .. } => {
      let normalised = normalise_decimals(line);
      let fields = normalised.split_whitespace().collect::<Vec<_>>();
      match L::decode(&fields) {
        Some(rec) => Step::to(state, ScanEvent::Record(gate.node, rec)),
        None => Step::to(ScanState::SeekNode, ScanEvent::EndOfBlock(gate.node))
      }
    }
  };
}

/// Something that gets filled by a scan. Tables are only created and grown
/// through these calls.
pub trait BlockSink<R> {
  /// A wanted node header was found: make sure there's a table for it.
  fn open(&mut self, gate: &Gate);
  /// A record was read for a node.
  fn push(&mut self, node: NodeId, record: R);
  /// The node's block is over.
  fn close(&mut self, node: NodeId);
}

/// Counters kept while scanning a report.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
  /// Lines consumed.
  pub lines: usize,
  /// Blocks read to the end.
  pub blocks: usize,
  /// Records read.
  pub records: usize,
  /// Nodes for which no matching block was found before another node began.
  pub abandoned: usize
}

/// The one-pass scanner for a gated report. It doesn't care how lines are
/// fed into it.
pub struct Scanner<'a, L: BlockLayout> {
  /// The known nodes.
  registry: &'a NodeRegistry,
  /// Where we are.
  state: ScanState,
  /// The nodes whose block has been read.
  captured: BTreeSet<NodeId>,
  /// Line of the current block's base moment header.
  block_start: usize,
  /// Counters.
  summary: ScanSummary,
  /// The report layout.
  layout: PhantomData<L>
}

impl<'a, L: BlockLayout> Scanner<'a, L> {
  /// Instantiates a new scanner gated by a registry.
  pub fn new(registry: &'a NodeRegistry) -> Self {
    return Self {
      registry,
      state: ScanState::SeekNode,
      captured: BTreeSet::new(),
      block_start: 0,
      summary: ScanSummary::default(),
      layout: PhantomData
    };
  }

  /// The current state.
  pub fn state(&self) -> ScanState {
    return self.state;
  }

  /// Consumes a line, forwarding whatever it yields into a sink.
  pub fn consume<S: BlockSink<L::Record>>(&mut self, line: &str, sink: &mut S) {
    self.summary.lines += 1;
    loop {
      let ctx = ScanContext {
        registry: self.registry,
        captured: &self.captured
      };
      let step = transition::<L>(self.state, line, &ctx);
      self.state = step.state;
      let again = step.reexamine();
      self.dispatch(step.event, sink);
      if !again {
        break;
      }
    }
  }

  /// Acts on an event.
  fn dispatch<S: BlockSink<L::Record>>(
    &mut self,
    event: ScanEvent<L::Record>,
    sink: &mut S
  ) {
    let lineno = self.summary.lines;
    match event {
      ScanEvent::NodeFound(gate) => {
        debug!("Found node {} on line {}.", gate.node, lineno);
        sink.open(&gate);
      },
      ScanEvent::MomentMatched(gate) => {
        debug!(
          "Started a {} block for node {} on line {}.",
          L::NAME,
          gate.node,
          lineno
        );
        self.block_start = lineno;
      },
      ScanEvent::Record(node, rec) => {
        self.summary.records += 1;
        sink.push(node, rec);
      },
      ScanEvent::EndOfBlock(node) => self.close_block(node, sink),
      ScanEvent::Abandoned(node) => {
        warn!(
          "No {} block for node {} before line {}, moving on.",
          L::NAME,
          node,
          lineno
        );
        self.summary.abandoned += 1;
      },
      ScanEvent::AlreadyCaptured(node) => debug!(
        "Ignoring repeated header for node {} on line {}.",
        node,
        lineno
      ),
      _ => {}
    }
  }

  /// Closes the block of a node.
  fn close_block<S: BlockSink<L::Record>>(&mut self, node: NodeId, sink: &mut S) {
    debug!(
      "Finishing up a {} block for node {} (lines {}-{}).",
      L::NAME,
      node,
      self.block_start,
      self.summary.lines
    );
    sink.close(node);
    self.captured.insert(node);
    self.summary.blocks += 1;
  }

  /// Finishes up: a block still being read at end of input is closed.
  pub fn finish<S: BlockSink<L::Record>>(mut self, sink: &mut S) -> ScanSummary {
    match self.state {
      ScanState::ReadRecords { gate, .. } => self.close_block(gate.node, sink),
      ScanState::SeekComponent(gate) | ScanState::SeekMoment(gate) => {
        warn!("No {} block for node {} before the end.", L::NAME, gate.node);
        self.summary.abandoned += 1;
      },
      ScanState::SeekNode => {}
    }
    return self.summary;
  }
}

/// Scans a report from a BufRead instance into a sink.
pub fn scan_bufread<L, S, R>(
  reader: R,
  registry: &NodeRegistry,
  sink: &mut S
) -> io::Result<ScanSummary>
where
  L: BlockLayout,
  S: BlockSink<L::Record>,
  R: BufRead
{
  let mut scanner = Scanner::<L>::new(registry);
  try_for_each_line(reader, |_, line| {
    scanner.consume(line, sink);
    return Ok::<(), io::Error>(());
  })?;
  let summary = scanner.finish(sink);
  debug!(
    "Scanned {} lines of the {} report: {} blocks, {} records.",
    summary.lines,
    L::NAME,
    summary.blocks,
    summary.records
  );
  return Ok(summary);
}

/// Utility function -- opens and scans a report file.
pub fn scan_file<L, S, P>(
  path: P,
  registry: &NodeRegistry,
  sink: &mut S
) -> io::Result<ScanSummary>
where
  L: BlockLayout,
  S: BlockSink<L::Record>,
  P: AsRef<Path>
{
  let file = File::open(path.as_ref())?;
  return scan_bufread::<L, S, _>(BufReader::new(file), registry, sink);
}
