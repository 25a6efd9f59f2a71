use crate::crumbs::Breadcrumb;
use crate::geometry::Point2;

use super::assign::NoBreadcrumbsError;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOutcome {
    pub player_id: String,
    pub survival_time: i64,
    pub died: bool,
    pub final_position: Point2,
}

/// Heuristic defeat check on the final life sample. A missing value never
/// counts as a defeat; NaN is treated as the extractor's defeat sentinel.
pub fn is_defeated(life: Option<f64>, defeat_life_threshold: f64) -> bool {
    match life {
        Some(value) => value.is_nan() || value <= defeat_life_threshold,
        None => false,
    }
}

/// `breadcrumbs` must be sorted by time step.
pub fn player_outcome(
    player_id: &str,
    breadcrumbs: &[Breadcrumb],
    defeat_life_threshold: f64,
) -> Result<PlayerOutcome, NoBreadcrumbsError> {
    let last = breadcrumbs.last().ok_or_else(|| NoBreadcrumbsError {
        player_id: player_id.to_string(),
    })?;
    Ok(PlayerOutcome {
        player_id: player_id.to_string(),
        survival_time: last.time_step,
        died: is_defeated(last.life, defeat_life_threshold),
        final_position: last.position(),
    })
}
