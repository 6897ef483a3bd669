// Dense board state: exactly one field per coordinate, indexed by `y * width + x`.

use serde::Serialize;

use crate::error::ReplayError;
use crate::protocol::{Field, InitRecord};

/// The fully materialized board at one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    width: usize,
    height: usize,
    fields: Vec<Field>,
}

impl Snapshot {
    /// Build the board described by an init record. Coordinates the record
    /// does not list are empty fields.
    pub fn from_init(init: &InitRecord) -> Result<Self, ReplayError> {
        let (width, height) = (init.width, init.height);
        let mut snapshot = Snapshot {
            width,
            height,
            fields: (0..width * height)
                .map(|i| Field::empty(i % width, i / width))
                .collect(),
        };
        snapshot.overwrite(&init.fields)?;
        Ok(snapshot)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// All fields in row-major order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Field> {
        if x < self.width && y < self.height {
            self.fields.get(y * self.width + x)
        } else {
            None
        }
    }

    fn index_of(&self, field: &Field) -> Result<usize, ReplayError> {
        if field.x < self.width && field.y < self.height {
            Ok(field.y * self.width + field.x)
        } else {
            Err(ReplayError::UnknownCoordinate {
                x: field.x,
                y: field.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Current values at the coordinates of `changes`, in the same order.
    pub fn capture(&self, changes: &[Field]) -> Result<Vec<Field>, ReplayError> {
        changes
            .iter()
            .map(|f| self.index_of(f).map(|i| self.fields[i].clone()))
            .collect()
    }

    /// Replace the fields at the coordinates of `changes`.
    ///
    /// Every coordinate is checked before anything is written, so a bad
    /// change list leaves the board untouched.
    pub fn overwrite(&mut self, changes: &[Field]) -> Result<(), ReplayError> {
        let indices = changes
            .iter()
            .map(|f| self.index_of(f))
            .collect::<Result<Vec<_>, _>>()?;
        for (i, field) in indices.into_iter().zip(changes) {
            self.fields[i] = field.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init(width: usize, height: usize, fields: Vec<Field>) -> InitRecord {
        InitRecord {
            width,
            height,
            brains: Vec::new(),
            fields,
        }
    }

    fn rock(x: usize, y: usize) -> Field {
        Field {
            kind: "#".into(),
            ..Field::empty(x, y)
        }
    }

    #[test]
    fn test_dense_from_sparse_init() {
        let snapshot = Snapshot::from_init(&init(3, 2, vec![rock(2, 1)])).unwrap();
        assert_eq!(snapshot.fields().len(), 6);
        for (i, f) in snapshot.fields().iter().enumerate() {
            assert_eq!((f.x, f.y), (i % 3, i / 3));
        }
        assert_eq!(snapshot.get(2, 1).unwrap().kind, "#");
        assert_eq!(snapshot.get(0, 0).unwrap().kind, ".");
        assert!(snapshot.get(3, 0).is_none());
    }

    #[test]
    fn test_init_outside_board_is_rejected() {
        assert!(matches!(
            Snapshot::from_init(&init(2, 2, vec![rock(2, 0)])),
            Err(ReplayError::UnknownCoordinate { x: 2, y: 0, .. })
        ));
    }

    #[test]
    fn test_capture_then_overwrite_restores() {
        let mut snapshot = Snapshot::from_init(&init(2, 2, Vec::new())).unwrap();
        let original = snapshot.clone();
        let changes = vec![rock(1, 1), rock(0, 1)];
        let undo = snapshot.capture(&changes).unwrap();
        snapshot.overwrite(&changes).unwrap();
        assert_eq!(snapshot.get(1, 1).unwrap().kind, "#");
        snapshot.overwrite(&undo).unwrap();
        assert_eq!(snapshot, original);
    }

    #[test]
    fn test_bad_change_leaves_board_untouched() {
        let mut snapshot = Snapshot::from_init(&init(2, 2, Vec::new())).unwrap();
        let original = snapshot.clone();
        let result = snapshot.overwrite(&[rock(0, 0), rock(0, 5)]);
        assert!(matches!(
            result,
            Err(ReplayError::UnknownCoordinate { x: 0, y: 5, .. })
        ));
        assert_eq!(snapshot, original);
    }
}
