use thiserror::Error;

use crate::catalog::ZoneCatalog;
use crate::crumbs::Breadcrumb;
use crate::geometry::Point2;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("player '{player_id}' has no breadcrumbs")]
pub struct NoBreadcrumbsError {
    pub player_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingPoint {
    pub time_step: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandingPoint {
    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerLanding {
    pub player_id: String,
    pub zone_name: Option<String>,
    pub landing: LandingPoint,
}

/// Lowest breadcrumb with `time_step <= first + window`, where `first` is the
/// player's earliest time step. `breadcrumbs` must be sorted by time step; on
/// equal altitude the earlier sample wins.
pub fn landing_point<'a>(
    player_id: &str,
    breadcrumbs: &'a [Breadcrumb],
    window: usize,
) -> Result<&'a Breadcrumb, NoBreadcrumbsError> {
    let Some(first) = breadcrumbs.first() else {
        return Err(NoBreadcrumbsError {
            player_id: player_id.to_string(),
        });
    };
    let window = i64::try_from(window).unwrap_or(i64::MAX);
    let last_step = first.time_step.saturating_add(window);
    let mut lowest = first;
    for breadcrumb in breadcrumbs
        .iter()
        .take_while(|breadcrumb| breadcrumb.time_step <= last_step)
    {
        if breadcrumb.z < lowest.z {
            lowest = breadcrumb;
        }
    }
    Ok(lowest)
}

pub fn assign_landing(
    player_id: &str,
    breadcrumbs: &[Breadcrumb],
    catalog: &ZoneCatalog,
    window: usize,
) -> Result<PlayerLanding, NoBreadcrumbsError> {
    let landed = landing_point(player_id, breadcrumbs, window)?;
    let zone_name = catalog
        .classify(landed.position())
        .map(|zone| zone.name.clone());
    Ok(PlayerLanding {
        player_id: player_id.to_string(),
        zone_name,
        landing: LandingPoint {
            time_step: landed.time_step,
            x: landed.x,
            y: landed.y,
            z: landed.z,
        },
    })
}
