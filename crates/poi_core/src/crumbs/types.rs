use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::Point2;
use crate::MissingInputError;

#[derive(Debug, Clone, PartialEq)]
pub struct Breadcrumb {
    pub player_id: String,
    pub time_step: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub life: Option<f64>,
}

impl Breadcrumb {
    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// All breadcrumbs of one match grouped by player. Players iterate in id
/// order and each player's breadcrumbs are sorted by `time_step`; rows that
/// share a time step keep their input order.
#[derive(Debug, Clone, Default)]
pub struct BreadcrumbTable {
    players: BTreeMap<String, Vec<Breadcrumb>>,
    row_count: usize,
    skipped_rows: usize,
}

impl BreadcrumbTable {
    pub fn from_breadcrumbs(breadcrumbs: impl IntoIterator<Item = Breadcrumb>) -> Self {
        let mut table = Self::default();
        for breadcrumb in breadcrumbs {
            table.push(breadcrumb);
        }
        table.finish();
        table
    }

    pub(crate) fn push(&mut self, breadcrumb: Breadcrumb) {
        self.row_count += 1;
        self.players
            .entry(breadcrumb.player_id.clone())
            .or_default()
            .push(breadcrumb);
    }

    /// Keeps the player visible to the analysis even though none of its rows
    /// survived validation.
    pub(crate) fn record_skipped_row(&mut self, player_id: &str) {
        self.skipped_rows += 1;
        self.players.entry(player_id.to_string()).or_default();
    }

    pub(crate) fn finish(&mut self) {
        for breadcrumbs in self.players.values_mut() {
            breadcrumbs.sort_by_key(|breadcrumb| breadcrumb.time_step);
        }
    }

    pub fn players(&self) -> impl Iterator<Item = (&str, &[Breadcrumb])> {
        self.players
            .iter()
            .map(|(player_id, breadcrumbs)| (player_id.as_str(), breadcrumbs.as_slice()))
    }

    pub fn player(&self, player_id: &str) -> Option<&[Breadcrumb]> {
        self.players.get(player_id).map(Vec::as_slice)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

#[derive(Debug, Error)]
pub enum BreadcrumbError {
    #[error(transparent)]
    MissingInput(#[from] MissingInputError),
    #[error("failed to read breadcrumbs {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("breadcrumbs {path} line {line}: time_step '{value}' is not an integer")]
    InvalidTimeStep {
        path: PathBuf,
        line: u64,
        value: f64,
    },
    #[error("breadcrumbs {path} line {line}: player_id must not be empty")]
    EmptyPlayerId { path: PathBuf, line: u64 },
    #[error("failed to write breadcrumbs {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crumb(player_id: &str, time_step: i64, z: f64) -> Breadcrumb {
        Breadcrumb {
            player_id: player_id.to_string(),
            time_step,
            x: 0.0,
            y: 0.0,
            z,
            life: Some(1.0),
        }
    }

    #[test]
    fn players_are_sorted_and_crumbs_ordered_by_time() {
        let table = BreadcrumbTable::from_breadcrumbs(vec![
            crumb("b", 3, 1.0),
            crumb("a", 2, 1.0),
            crumb("b", 1, 2.0),
            crumb("b", 1, 3.0),
        ]);
        let ids = table.players().map(|(id, _)| id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b"]);
        let b = table.player("b").expect("b");
        assert_eq!(
            b.iter().map(|c| (c.time_step, c.z)).collect::<Vec<_>>(),
            vec![(1, 2.0), (1, 3.0), (3, 1.0)]
        );
        assert_eq!(table.row_count(), 4);
    }

    #[test]
    fn skipped_rows_still_register_the_player() {
        let mut table = BreadcrumbTable::default();
        table.record_skipped_row("ghost");
        table.finish();
        assert_eq!(table.player("ghost").map(<[Breadcrumb]>::len), Some(0));
        assert_eq!(table.skipped_rows(), 1);
        assert_eq!(table.row_count(), 0);
    }
}
