//! Synthetic maps and plans shared by the unit tests.

use crate::map::{Lane, LaneGraph, LaneRecord, RoadMap};
use crate::models::{ChangeLaneType, LaneRange, Passage, RequestWaypoint, Road, RoutingResponse};
use crate::spatial::Vec2;
use std::io;
use std::sync::{Arc, Mutex};

/// Lateral spacing between parallel lanes in the fixtures.
pub const LANE_WIDTH: f64 = 3.5;

pub fn straight_lane(id: &str, from: (f64, f64), to: (f64, f64)) -> LaneRecord {
    LaneRecord {
        id: id.to_string(),
        points: vec![Vec2::new(from.0, from.1), Vec2::new(to.0, to.1)],
        left_neighbor_forward_ids: Vec::new(),
        right_neighbor_forward_ids: Vec::new(),
        predecessor_ids: Vec::new(),
        successor_ids: Vec::new(),
    }
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|id| id.to_string()).collect()
}

pub trait LaneRecordExt {
    fn left(self, list: &[&str]) -> Self;
    fn right(self, list: &[&str]) -> Self;
    fn predecessors(self, list: &[&str]) -> Self;
    fn successors(self, list: &[&str]) -> Self;
}

impl LaneRecordExt for LaneRecord {
    fn left(mut self, list: &[&str]) -> Self {
        self.left_neighbor_forward_ids = ids(list);
        self
    }

    fn right(mut self, list: &[&str]) -> Self {
        self.right_neighbor_forward_ids = ids(list);
        self
    }

    fn predecessors(mut self, list: &[&str]) -> Self {
        self.predecessor_ids = ids(list);
        self
    }

    fn successors(mut self, list: &[&str]) -> Self {
        self.successor_ids = ids(list);
        self
    }
}

#[derive(Default)]
pub struct TestMap {
    records: Vec<LaneRecord>,
}

impl TestMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lane(mut self, record: LaneRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn build(self) -> FixtureMap {
        FixtureMap {
            map: Arc::new(RoadMap::from_records(self.records).expect("fixture map")),
        }
    }
}

pub struct FixtureMap {
    pub map: Arc<RoadMap>,
}

impl FixtureMap {
    pub fn lane(&self, id: &str) -> Arc<Lane> {
        self.map
            .lane_by_id(id)
            .unwrap_or_else(|| panic!("fixture lane {} missing", id))
    }

    pub fn graph(&self) -> &dyn LaneGraph {
        self.map.as_ref()
    }
}

pub fn passage(ranges: &[(&str, f64, f64)], change_lane_type: ChangeLaneType, can_exit: bool) -> Passage {
    Passage {
        segments: ranges
            .iter()
            .map(|&(id, start_s, end_s)| LaneRange::new(id, start_s, end_s))
            .collect(),
        can_exit,
        change_lane_type,
    }
}

/// Three parallel lanes (`L`, `C`, `R` from left to right) over two 100 m
/// sections, followed by a single lane `C2`. `LP` feeds `L0` from behind and
/// is not on the route.
///
/// Road 0 passages: `p0 = [L0]`, `p1 = [C0, C1]` (can exit), `p2 = [R1]`.
/// Road 1 passage: `p0 = [C2]` (can exit).
pub fn lane_change_scenario() -> (FixtureMap, RoutingResponse) {
    let l = LANE_WIDTH;
    let map = TestMap::new()
        .lane(straight_lane("LP", (-50.0, l), (0.0, l)).successors(&["L0"]))
        .lane(
            straight_lane("L0", (0.0, l), (100.0, l))
                .right(&["C0"])
                .predecessors(&["LP"])
                .successors(&["L1"]),
        )
        .lane(
            straight_lane("C0", (0.0, 0.0), (100.0, 0.0))
                .left(&["L0"])
                .right(&["R0"])
                .successors(&["C1"]),
        )
        .lane(
            straight_lane("R0", (0.0, -l), (100.0, -l))
                .left(&["C0"])
                .successors(&["R1"]),
        )
        .lane(
            straight_lane("L1", (100.0, l), (200.0, l))
                .right(&["C1"])
                .predecessors(&["L0"]),
        )
        .lane(
            straight_lane("C1", (100.0, 0.0), (200.0, 0.0))
                .left(&["L1"])
                .right(&["R1"])
                .predecessors(&["C0"])
                .successors(&["C2"]),
        )
        .lane(
            straight_lane("R1", (100.0, -l), (200.0, -l))
                .left(&["C1"])
                .predecessors(&["R0"]),
        )
        .lane(straight_lane("C2", (200.0, 0.0), (300.0, 0.0)).predecessors(&["C1"]))
        .build();

    let response = RoutingResponse {
        roads: vec![
            Road {
                id: "road-0".into(),
                passages: vec![
                    passage(&[("L0", 0.0, 100.0)], ChangeLaneType::Forward, false),
                    passage(
                        &[("C0", 0.0, 100.0), ("C1", 0.0, 100.0)],
                        ChangeLaneType::Right,
                        true,
                    ),
                    passage(&[("R1", 0.0, 100.0)], ChangeLaneType::Right, false),
                ],
            },
            Road {
                id: "road-1".into(),
                passages: vec![passage(&[("C2", 0.0, 100.0)], ChangeLaneType::Forward, true)],
            },
        ],
        request_waypoints: vec![
            RequestWaypoint {
                lane_id: "L0".into(),
                s: 0.0,
            },
            RequestWaypoint {
                lane_id: "C2".into(),
                s: 100.0,
            },
        ],
    };

    (map, response)
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-local subscriber and returns what it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    let logs = buffer
        .0
        .lock()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();
    (value, logs)
}
