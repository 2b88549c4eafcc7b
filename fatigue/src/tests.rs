use std::collections::BTreeSet;
use std::io::Cursor;

use crate::prelude::*;

const SUMMARY: &str = "\
Fatigue summary
Calculation node: 101
a = 0,0235.
Base calculated moment of time: 7
reduced sterss component: 2.
Calculation node: 202
a = 0,5
Base calculated moment of time: 1,234
reduced stress component: 1
Calculation node: 303
a = 0,0001
Base calculated moment of time: 3
reduced sterss component: 3.
";

const LOCAL: &str = "\
Local reduced stress report
> Calculation node 999
>>moment 7 -> calculation results Table
id temp x y z si sj sk
1 20,0 0 0 0 1,0 1,0 1,0

> Calculation node 101
>>moment 3 -> calculation results Table
id temp x y z si sj sk
1 20,0 0 0 0 500,0 0,0 0,0

>>moment 7 -> calculation results Table
id temp x y z si sj sk
1 20,0 0 0 0 100,0 60,0 10,0
2 150,0 0 0 0 300,0 120,0 -20,0
3 300,0 0 0 0 50,0 -10,0 -40,0

> Calculation node 303
>>moment 3 -> calculation results Table
id temp x y z si sj sk
1 20,0 0 0 0 10,0 5,0 1,0
";

const ELASTIC: &str = "\
Elastic reduced stress report
> Calculation node 101
> Component number 1
> Base calculated moment of time 7
header one
header two
1 20,0 200,0 0,3 1,0 2,0 40,0 0,0 999,0
end of component
> Component number 2
> Base calculated moment of time 3
header one
header two
1 20,0 200,0 0,3 1,0 2,0 50,0 0,0 -1,0
> Base calculated moment of time 7
header one
header two
1 20,0 200,0 0,3 1,0 2,0 50,0 0,0 -55,5
2 150,0 200,0 0,3 1,0 2,0 140,0 0,0 210,25
3 999,0 200,0 0,3 1,0 2,0 30,0 0,0 77,0
end
> Calculation node 303
> Component number 3
> Base calculated moment of time 3
header one
header two
1 20,0 200,0 0,3 9,0
";

/// A 22-column line of the damage report.
fn cycle_row(first: usize, second: usize, sfmax: &str, sfmin: &str, a: &str) -> String {
  return format!(
    "{} - {} 0 0 {} {} 100,0 20,0 150,0 -0,5 0 0 0 0 0 0 0 0 1000 10,0 {}",
    first, second, sfmax, sfmin, a
  );
}

fn damage_report() -> String {
  return [
    "Accumulated fatigue damage report".to_string(),
    "> Calculation node: 101".to_string(),
    "> Component number: 1".to_string(),
    "> Base calculated moment of time 7".to_string(),
    "h1".to_string(),
    "h2".to_string(),
    cycle_row(1, 2, "10,0", "0,0", "0,9"),
    "total".to_string(),
    "> Component number: 2".to_string(),
    "> Base calculated moment of time 7".to_string(),
    "h1".to_string(),
    "h2".to_string(),
    cycle_row(1, 3, "150,5", "-20,0", "3,0E-03"),
    cycle_row(1, 2, "100,0", "60,0", "5,0E-09"),
    cycle_row(4, 5, "210,25", "-55,5", "2,0E-02"),
    cycle_row(6, 7, "77,0", "-55,5", "5,0E-04"),
    "Total damage 0,0235".to_string(),
    "> Calculation node: 202".to_string(),
    "> Component number: 1".to_string(),
    "> Base calculated moment of time 1234".to_string(),
    "h1".to_string(),
    "h2".to_string(),
    cycle_row(2, 3, "90,0", "-90,0", "0,5"),
    "".to_string(),
    "> Calculation node: 101".to_string(),
    "> Component number: 2".to_string(),
    "> Base calculated moment of time 7".to_string(),
    "h1".to_string(),
    "h2".to_string(),
    cycle_row(1, 2, "10,0", "0,0", "0,7"),
  ].join("\n");
}

fn registry() -> NodeRegistry {
  return NodeRegistry::parse_bufread(Cursor::new(SUMMARY)).unwrap();
}

fn reports() -> ReportSet {
  let damage = damage_report();
  return ReportSet::from_readers(
    Cursor::new(SUMMARY),
    Cursor::new(LOCAL),
    Cursor::new(ELASTIC),
    Cursor::new(damage.as_bytes())
  ).unwrap();
}

fn assert_near(a: f64, b: f64) {
  assert!((a - b).abs() < 1e-12, "{} != {}", a, b);
}

#[test]
fn node_attributes_are_write_once() {
  let mut node = Node::new(1);
  assert_eq!(node.damage(), 0.0);
  assert_eq!(node.base_moment(), 0);
  assert_eq!(node.component(), None);
  node.set_damage(0.0).unwrap();
  assert_eq!(
    node.set_damage(0.5),
    Err(NodeError::AlreadySet { node: 1, attribute: Attribute::Damage })
  );
  node.set_base_moment(0).unwrap();
  assert_eq!(
    node.set_base_moment(4),
    Err(NodeError::AlreadySet { node: 1, attribute: Attribute::BaseMoment })
  );
  node.set_component(2).unwrap();
  assert_eq!(
    node.set_component(2),
    Err(NodeError::AlreadySet { node: 1, attribute: Attribute::Component })
  );
  assert_eq!(node.damage(), 0.0);
  assert_eq!(node.component(), Some(Component::Jk));
}

#[test]
fn node_attributes_are_range_checked() {
  let mut node = Node::new(7);
  assert_eq!(
    node.set_component(4),
    Err(NodeError::BadComponent { node: 7, value: 4 })
  );
  assert_eq!(
    node.set_component(0),
    Err(NodeError::BadComponent { node: 7, value: 0 })
  );
  assert!(node.set_damage(-1.0).is_err());
  assert!(node.set_damage(f64::NAN).is_err());
  // failed writes don't count as writes
  node.set_component(3).unwrap();
  node.set_damage(1.5).unwrap();
  assert!(node.has_failed());
}

#[test]
fn summary_report() {
  let nodes = registry();
  assert_eq!(nodes.len(), 3);
  let n101 = nodes.get(101).unwrap();
  assert_near(n101.damage(), 0.0235);
  assert_eq!(n101.base_moment(), 7);
  assert_eq!(n101.component(), Some(Component::Jk));
  let n202 = nodes.get(202).unwrap();
  assert_eq!(n202.base_moment(), 1234);
  assert_eq!(n202.component(), Some(Component::Ij));
  assert_eq!(nodes.get(303).unwrap().component(), Some(Component::Ik));
  assert!(nodes.get(404).is_none());
}

#[test]
fn summary_report_errors() {
  let parse = |s: &str| NodeRegistry::parse_bufread(Cursor::new(s.to_string()));
  assert!(matches!(
    parse("a = 0,5\n"),
    Err(SummaryError::NoCurrentNode { line: 1 })
  ));
  assert!(matches!(
    parse("Calculation node: 1\na = 0,5\na = 0,6\n"),
    Err(SummaryError::Node {
      line: 3,
      source: NodeError::AlreadySet { node: 1, attribute: Attribute::Damage }
    })
  ));
  assert!(matches!(
    parse("Calculation node: 1\nreduced sterss component: 4.\n"),
    Err(SummaryError::Node {
      line: 2,
      source: NodeError::BadComponent { node: 1, value: 4 }
    })
  ));
  assert!(matches!(
    parse("Calculation node: 1\nBase calculated moment of time: soon\n"),
    Err(SummaryError::BadValue { line: 2, .. })
  ));
  assert!(matches!(
    parse("Calculation node: one\n"),
    Err(SummaryError::BadValue { line: 1, .. })
  ));
}

#[test]
fn ranking_by_damage() {
  let mut nodes = NodeRegistry::new();
  for (num, damage) in [(1, 0.1), (2, 0.9), (3, 0.5)] {
    nodes.add(num).set_damage(damage).unwrap();
  }
  let top = nodes.top(2).iter().map(|n| n.num()).collect::<Vec<_>>();
  assert_eq!(top, vec![2, 3]);
  assert_eq!(nodes.top(10).len(), 3);
  assert!(nodes.top(0).is_empty());
}

#[test]
fn ranking_ties_go_by_node_number() {
  let mut nodes = NodeRegistry::new();
  for (num, damage) in [(30, 0.5), (10, 0.5), (20, 0.7), (5, 0.0)] {
    nodes.add(num).set_damage(damage).unwrap();
  }
  let ranked = nodes.ranked().iter().map(|n| n.num()).collect::<Vec<_>>();
  assert_eq!(ranked, vec![20, 10, 30, 5]);
}

#[test]
fn selecting_nodes() {
  let nodes = registry();
  let listed = nodes.select(&NodeSelection::List(vec![303, 404, 101]))
    .iter()
    .map(|n| n.num())
    .collect::<Vec<_>>();
  assert_eq!(listed, vec![303, 101]);
  let top = nodes.select(&NodeSelection::Top(1));
  assert_eq!(top[0].num(), 202);
}

#[test]
fn listed_repeats_are_dropped() {
  let nodes = registry();
  let listed = nodes.select(&NodeSelection::List(vec![101, 303, 101, 404, 303]))
    .iter()
    .map(|n| n.num())
    .collect::<Vec<_>>();
  assert_eq!(listed, vec![101, 303]);
}

#[test]
fn local_stress_differences() {
  let s = LocalStressSample::new(4, 20.0, 300.0, 120.0, -20.0);
  assert_near(s.sij(), 180.0);
  assert_near(s.sjk(), 140.0);
  assert_near(s.sik(), 320.0);
  assert_near(s.reduced(Component::Ij), s.sij());
  assert_near(s.reduced(Component::Jk), s.sjk());
  assert_near(s.reduced(Component::Ik), s.sik());
}

#[test]
fn transitions() {
  let nodes = registry();
  let captured = BTreeSet::new();
  let ctx = ScanContext { registry: &nodes, captured: &captured };
  let gate = Gate {
    node: 101,
    component: Some(Component::Jk),
    base_moment: 7
  };
  let step = transition::<CycleLayout>(
    ScanState::SeekNode,
    "> Calculation node: 101",
    &ctx
  );
  assert_eq!(step.state, ScanState::SeekComponent(gate));
  assert_eq!(step.event, ScanEvent::NodeFound(gate));
  // the local report has no component gate
  let step = transition::<LocalStressLayout>(
    ScanState::SeekNode,
    "> Calculation node 101",
    &ctx
  );
  assert_eq!(step.state, ScanState::SeekMoment(gate));
  // unknown nodes are skipped
  let step = transition::<CycleLayout>(
    ScanState::SeekNode,
    "> Calculation node: 999",
    &ctx
  );
  assert_eq!(step.state, ScanState::SeekNode);
  assert_eq!(step.event, ScanEvent::UnknownNode(999));
  // wrong component, then the right one
  let seek = ScanState::SeekComponent(gate);
  let step = transition::<CycleLayout>(seek, "> Component number: 1", &ctx);
  assert_eq!(step.state, seek);
  let step = transition::<CycleLayout>(seek, "> Component number: 2", &ctx);
  assert_eq!(step.state, ScanState::SeekMoment(gate));
  // another component while looking for the moment
  let step = transition::<CycleLayout>(
    ScanState::SeekMoment(gate),
    "> Component number: 3",
    &ctx
  );
  assert_eq!(step.state, seek);
  assert_eq!(step.event, ScanEvent::ComponentLeft(gate));
  // the moment, then two label lines
  let step = transition::<CycleLayout>(
    ScanState::SeekMoment(gate),
    "> Base calculated moment of time 7",
    &ctx
  );
  assert_eq!(step.state, ScanState::ReadRecords { gate, skip: 2 });
  let step = transition::<CycleLayout>(step.state, "h1", &ctx);
  assert_eq!(step.state, ScanState::ReadRecords { gate, skip: 1 });
  let step = transition::<CycleLayout>(step.state, "h2", &ctx);
  let reading = ScanState::ReadRecords { gate, skip: 0 };
  assert_eq!(step.state, reading);
  // a record, then a terminator
  let row = cycle_row(4, 5, "210,25", "-55,5", "2,0E-02");
  let step = transition::<CycleLayout>(reading, &row, &ctx);
  assert_eq!(step.state, reading);
  match step.event {
    ScanEvent::Record(101, rec) => {
      assert_eq!((rec.first_id, rec.second_id), (4, 5));
      assert_near(rec.sfmax, 210.25);
      assert_near(rec.sfmin, -55.5);
      assert_near(rec.saf, 100.0);
      assert_near(rec.tmin, 20.0);
      assert_near(rec.tmax, 150.0);
      assert_near(rec.r, -0.5);
      assert_near(rec.ndop, 1000.0);
      assert_near(rec.n, 10.0);
      assert_near(rec.a, 0.02);
    },
    other => panic!("expected a record, got {:?}", other)
  }
  let step = transition::<CycleLayout>(reading, "1 - 2 too short", &ctx);
  assert_eq!(step.state, ScanState::SeekNode);
  assert_eq!(step.event, ScanEvent::EndOfBlock(101));
  assert!(step.reexamine());
}

#[test]
fn captured_nodes_are_not_read_twice() {
  let nodes = registry();
  let captured = BTreeSet::from([101]);
  let ctx = ScanContext { registry: &nodes, captured: &captured };
  let step = transition::<ElasticStressLayout>(
    ScanState::SeekNode,
    "> Calculation node 101",
    &ctx
  );
  assert_eq!(step.state, ScanState::SeekNode);
  assert!(matches!(step.event, ScanEvent::AlreadyCaptured(101)));
}

#[test]
fn local_stress_report() {
  let nodes = registry();
  let local = LocalStressIndex::parse_bufread(Cursor::new(LOCAL), &nodes)
    .unwrap();
  assert_eq!(local.len(), 2);
  assert!(local.get(999).is_none());
  assert!(local.get(202).is_none());
  let t101 = local.get(101).unwrap();
  assert_eq!(t101.len(), 3);
  let m2 = t101.get(2).unwrap();
  assert_near(m2.temperature(), 150.0);
  assert_near(m2.si(), 300.0);
  assert_near(m2.sjk(), 140.0);
  assert_eq!(local.get(303).unwrap().len(), 1);
  assert_eq!(local.table_length(), 3);
}

#[test]
fn headers_of_another_node_abandon_the_search() {
  let mut nodes = NodeRegistry::new();
  nodes.add(101).set_base_moment(7).unwrap();
  nodes.add(303).set_base_moment(7).unwrap();
  let text = "\
> Calculation node 101
>>moment 3 -> calculation results Table
label
1 20,0 0 0 0 1,0 1,0 1,0
> Calculation node 303
>>moment 7 -> calculation results Table
label
1 20,0 0 0 0 10,0 5,0 1,0
2 40,0 0 0 0 10,0 5,0 1,0
";
  let mut local = LocalStressIndex::new();
  let summary = scan_bufread::<LocalStressLayout, _, _>(
    Cursor::new(text),
    &nodes,
    &mut local
  ).unwrap();
  assert_eq!(summary.abandoned, 1);
  assert_eq!(summary.blocks, 1);
  assert_eq!(summary.records, 2);
  assert!(local.get(101).unwrap().is_empty());
  assert_eq!(local.get(303).unwrap().len(), 2);
}

#[test]
fn only_results_table_headers_open_local_blocks() {
  let mut nodes = NodeRegistry::new();
  nodes.add(101).set_base_moment(7).unwrap();
  let text = "\
> Calculation node 101
> Base calculated moment of time 7
>>moment 0 -> calculation results Table
label
1 20,0 0 0 0 1,0 1,0 1,0
>>moment 7 -> calculation results Table
label
1 20,0 0 0 0 10,0 5,0 1,0
2 40,0 0 0 0 10,0 5,0 1,0
";
  let local = LocalStressIndex::parse_bufread(Cursor::new(text), &nodes)
    .unwrap();
  let t101 = local.get(101).unwrap();
  assert_eq!(t101.len(), 2);
  assert_near(t101.get(2).unwrap().temperature(), 40.0);
}

#[test]
fn elastic_stress_report() {
  let nodes = registry();
  let elastic = ElasticStressIndex::parse_bufread(Cursor::new(ELASTIC), &nodes)
    .unwrap();
  let t101 = elastic.get(101).unwrap();
  assert_eq!(t101.len(), 3);
  let first = t101.iter().next().unwrap();
  assert_eq!(first.id(), 1);
  assert_near(first.rpe(), 200.0);
  assert_near(first.nu(), 0.3);
  assert_near(first.sll(), 50.0);
  assert_near(first.sfl(), -55.5);
  // five columns: sll is the third one
  let t303 = elastic.get(303).unwrap();
  let only = t303.iter().next().unwrap();
  assert_near(only.sll(), 200.0);
  assert_near(only.sfl(), 9.0);
}

#[test]
fn real_id_resolution() {
  let mut local = LocalStressTable::new(101);
  local.add(LocalStressSample::new(1, 20.0, 100.0, 60.0, 10.0));
  local.add(LocalStressSample::new(2, 150.0, 300.0, 120.0, -20.0));
  let res = Resolution { local: &local, component: Component::Jk };
  let sample = ElasticStressSample::new(1, 150.004, 200.0, 0.3, 140.00005, 9.0);
  assert_eq!(sample.cached_real_id(), None);
  assert_eq!(sample.real_id(&res), Some(2));
  assert_eq!(sample.cached_real_id(), Some(2));
  // the resolution is frozen once found
  let other = LocalStressTable::new(101);
  let res = Resolution { local: &other, component: Component::Ij };
  assert_eq!(sample.real_id(&res), Some(2));
}

#[test]
fn real_id_without_a_match() {
  let mut local = LocalStressTable::new(101);
  local.add(LocalStressSample::new(3, 300.0, 50.0, -10.0, -40.0));
  let res = Resolution { local: &local, component: Component::Jk };
  // right stress, wrong temperature
  let sample = ElasticStressSample::new(3, 999.0, 200.0, 0.3, 30.0, 77.0);
  assert_eq!(sample.real_id(&res), None);
  assert_eq!(sample.cached_real_id(), None);
  // right temperature, stress of another component
  let sample = ElasticStressSample::new(3, 300.0, 200.0, 0.3, 60.0, 77.0);
  assert_eq!(sample.real_id(&res), None);
  let res = Resolution { local: &local, component: Component::Ij };
  assert_eq!(sample.real_id(&res), Some(3));
}

#[test]
fn searching_by_stress_takes_the_first_match() {
  let mut local = LocalStressTable::new(1);
  local.add(LocalStressSample::new(1, 20.0, 100.0, 60.0, 10.0));
  let res = Resolution { local: &local, component: Component::Ij };
  let mut elastic = ElasticStressTable::new(1);
  elastic.add(ElasticStressSample::new(1, 20.0, 0.0, 0.0, 40.0, 5.0));
  elastic.add(ElasticStressSample::new(2, 99.0, 0.0, 0.0, 40.0, 7.0));
  elastic.add(ElasticStressSample::new(3, 20.0, 0.0, 0.0, 40.0, 7.0));
  assert_eq!(elastic.search_by_stress(5.00009, &res), Some(1));
  // sample 2 matches the stress but not a moment; sample 3 is never tried
  assert_eq!(elastic.search_by_stress(7.0, &res), None);
  assert_eq!(elastic.search_by_stress(6.0, &res), None);
}

#[test]
fn damage_report_is_gated_and_sorted() {
  let nodes = registry();
  let damage = damage_report();
  let cycles = CycleClassifier::parse_bufread(Cursor::new(damage), &nodes)
    .unwrap();
  let t101 = cycles.get(101).unwrap();
  let damages = t101.iter().map(|c| c.a).collect::<Vec<_>>();
  assert_eq!(damages, vec![2.0e-2, 3.0e-3, 5.0e-4, 5.0e-9]);
  assert_eq!(t101.above(1e-8).count(), 3);
  assert_near(t101.total_damage(), 0.0235 + 5.0e-9);
  let t202 = cycles.get(202).unwrap();
  assert_eq!(t202.len(), 1);
  assert!(cycles.get(303).is_none());
}

#[test]
fn end_of_input_closes_the_block() {
  let mut nodes = NodeRegistry::new();
  let node = nodes.add(5);
  node.set_component(1).unwrap();
  node.set_base_moment(2).unwrap();
  let text = [
    "> Calculation node: 5".to_string(),
    "> Component number: 1".to_string(),
    "> Base calculated moment of time: 2".to_string(),
    "h1".to_string(),
    "h2".to_string(),
    cycle_row(1, 2, "1,0", "0,0", "1,0E-03"),
    cycle_row(2, 3, "1,0", "0,0", "5,0E-02"),
  ].join("\n");
  let cycles = CycleClassifier::parse_bufread(Cursor::new(text), &nodes)
    .unwrap();
  let first = cycles.get(5).unwrap().iter().next().unwrap();
  assert_eq!((first.first_id, first.second_id), (2, 3));
}

#[test]
fn endpoint_resolution() {
  let reports = reports();
  assert_eq!(reports.table_length(), 3);
  let table = reports.cycles.get(101).unwrap();
  let resolver = reports.resolver(true);
  let endpoints = table.iter()
    .map(|c| resolver.endpoints(101, c))
    .collect::<Vec<_>>();
  assert_eq!(endpoints, vec![
    Endpoints::Resolved { compacted: (4, 5), moments: (2, 1) },
    Endpoints::Direct(1, 3),
    Endpoints::Compacted(6, 7),
    Endpoints::Direct(1, 2)
  ]);
  assert_eq!(endpoints[0].label(false), "2-1");
  assert_eq!(endpoints[0].label(true), "4-5 (2-1)");
  assert_eq!(endpoints[2].label(true), "6-7");
  // disabled resolution leaves compacted ids alone
  let raw = reports.resolver(false);
  let first = table.iter().next().unwrap();
  assert_eq!(raw.endpoints(101, first), Endpoints::Compacted(4, 5));
  assert_eq!(reports.resolve(202, first), None);
}
