// Replay log records: the init record, per-step records and the cells they describe.
//
// A log is one JSON document `{"init": InitRecord, "steps": [StepRecord, ...]}`.

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;
use crate::recorder::decompress_replay;

/// Type tag of a cell that holds nothing in particular.
pub const EMPTY_FIELD: &str = ".";

/// Facing of an ant on the hex grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Northwest,
    West,
    Southwest,
    Southeast,
    East,
    Northeast,
}

/// An ant occupying a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ant {
    pub id: u32,
    pub program_counter: u32,
    pub swarm_id: String,
    pub carries_food: bool,
    pub direction: Direction,
    pub rest_time: u32,
    pub register: [bool; 6],
}

/// Marker bits one swarm has left on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub swarm_id: String,
    pub values: [bool; 7],
}

/// One hex cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub x: usize,
    pub y: usize,
    /// Terrain/owner tag: `.` plain, `#` rock, a swarm letter for a base.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ant: Option<Ant>,
}

impl Field {
    /// A plain cell with no markers, food or ant.
    pub fn empty(x: usize, y: usize) -> Self {
        Field {
            x,
            y,
            kind: EMPTY_FIELD.to_string(),
            markers: Vec::new(),
            food: None,
            ant: None,
        }
    }
}

/// Score and ant count of one swarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub swarm_id: String,
    pub score: i64,
    pub ants: u32,
}

/// A swarm's behaviour program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brain {
    pub name: String,
    pub swarm_id: String,
    pub instructions: Vec<String>,
}

/// The one-time record at the head of a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRecord {
    pub width: usize,
    pub height: usize,
    pub brains: Vec<Brain>,
    /// Occupied or notable cells. Coordinates not listed are empty.
    pub fields: Vec<Field>,
}

impl InitRecord {
    /// Standings before the first step: score 0 and the ants placed on the board.
    ///
    /// Index 0 deliberately does not borrow the first step's standings, so
    /// stepping back to the start shows the board and scores before any step.
    pub fn initial_standings(&self) -> Vec<Standing> {
        self.brains
            .iter()
            .map(|brain| Standing {
                swarm_id: brain.swarm_id.clone(),
                score: 0,
                ants: self
                    .fields
                    .iter()
                    .filter(|f| {
                        f.ant
                            .as_ref()
                            .is_some_and(|ant| ant.swarm_id == brain.swarm_id)
                    })
                    .count() as u32,
            })
            .collect()
    }
}

/// One simulation tick: fresh standings and the cells that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub standings: Vec<Standing>,
    pub fields: Vec<Field>,
}

/// A complete log held in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    pub init: InitRecord,
    pub steps: Vec<StepRecord>,
}

impl Replay {
    /// Parse an uncompressed log in one pass.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        serde_json::from_str(json).map_err(ReplayError::Json)
    }

    /// Decompress and parse a gzipped log in one pass.
    pub fn from_gzip(data: &[u8]) -> Result<Self, ReplayError> {
        Self::from_json(&decompress_replay(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ant(id: u32, swarm: &str) -> Ant {
        Ant {
            id,
            program_counter: 0,
            swarm_id: swarm.into(),
            carries_food: false,
            direction: Direction::Northwest,
            rest_time: 0,
            register: [false; 6],
        }
    }

    #[test]
    fn test_field_wire_format() {
        let json = r#"{"x":1,"y":0,"markers":[],"type":"A","ant":{"id":0,"program_counter":3,
            "swarm_id":"A","carries_food":true,"direction":"southeast","rest_time":2,
            "register":[true,false,false,false,false,true]}}"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.kind, "A");
        assert_eq!(field.food, None);
        let ant = field.ant.unwrap();
        assert_eq!(ant.direction, Direction::Southeast);
        assert!(ant.carries_food);
        assert_eq!(ant.program_counter, 3);
    }

    #[test]
    fn test_field_markers_default_to_empty() {
        let field: Field = serde_json::from_str(r##"{"x":2,"y":3,"type":"#"}"##).unwrap();
        assert!(field.markers.is_empty());
        assert_eq!(field.kind, "#");
    }

    #[test]
    fn test_empty_field_omits_optional_keys() {
        let json = serde_json::to_string(&Field::empty(4, 5)).unwrap();
        assert_eq!(json, r#"{"x":4,"y":5,"type":".","markers":[]}"#);
    }

    #[test]
    fn test_initial_standings_counts_ants() {
        let mut a1 = Field::empty(0, 0);
        a1.ant = Some(ant(0, "A"));
        let mut a2 = Field::empty(1, 0);
        a2.ant = Some(ant(1, "A"));
        let mut b = Field::empty(0, 1);
        b.ant = Some(ant(2, "B"));
        let init = InitRecord {
            width: 2,
            height: 2,
            brains: vec![
                Brain {
                    name: "brainA".into(),
                    swarm_id: "A".into(),
                    instructions: vec!["jump 0".into()],
                },
                Brain {
                    name: "brainB".into(),
                    swarm_id: "B".into(),
                    instructions: vec!["jump 0".into()],
                },
            ],
            fields: vec![a1, a2, b],
        };

        let standings = init.initial_standings();
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].ants, 2);
        assert_eq!(standings[1].ants, 1);
        assert!(standings.iter().all(|s| s.score == 0));
    }

    #[test]
    fn test_replay_from_json_rejects_garbage() {
        assert!(matches!(
            Replay::from_json("{\"init\": 3}"),
            Err(ReplayError::Json(_))
        ));
    }
}
