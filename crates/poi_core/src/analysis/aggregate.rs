use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::ZoneCatalog;

use super::assign::PlayerLanding;
use super::outcome::PlayerOutcome;

pub const MAX_SURVIVAL_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneAggregate {
    pub zone_name: String,
    pub label: String,
    pub landing_count: usize,
    pub death_count: usize,
    pub avg_survival_time: f64,
    pub survival_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeathLocationAggregate {
    pub zone_name: String,
    pub label: String,
    pub death_count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct ZoneAccumulator {
    landings: usize,
    deaths: usize,
    survival_sum: i128,
}

/// Joins landings with outcomes by player id and groups by landing zone.
/// Players without a zone are left out. Zones nobody landed in are omitted;
/// the rest keep catalog order.
pub fn aggregate_zones(
    catalog: &ZoneCatalog,
    landings: &[PlayerLanding],
    outcomes: &[PlayerOutcome],
) -> Vec<ZoneAggregate> {
    let outcome_by_player = outcomes
        .iter()
        .map(|outcome| (outcome.player_id.as_str(), outcome))
        .collect::<HashMap<_, _>>();

    let mut accumulators = vec![ZoneAccumulator::default(); catalog.len()];
    for landing in landings {
        let Some(zone_idx) = landing
            .zone_name
            .as_deref()
            .and_then(|name| catalog.position(name))
        else {
            continue;
        };
        let Some(outcome) = outcome_by_player.get(landing.player_id.as_str()) else {
            continue;
        };
        let acc = &mut accumulators[zone_idx];
        acc.landings += 1;
        acc.survival_sum += i128::from(outcome.survival_time);
        if outcome.died {
            acc.deaths += 1;
        }
    }

    let mut aggregates = catalog
        .zones()
        .iter()
        .zip(accumulators)
        .filter(|(_, acc)| acc.landings > 0)
        .map(|(zone, acc)| ZoneAggregate {
            zone_name: zone.name.clone(),
            label: zone.label.clone(),
            landing_count: acc.landings,
            death_count: acc.deaths,
            avg_survival_time: acc.survival_sum as f64 / acc.landings as f64,
            survival_score: 0.0,
        })
        .collect::<Vec<_>>();
    apply_survival_scores(&mut aggregates);
    aggregates
}

/// Linear rescale of `avg_survival_time` onto 0..=100 across the given zones.
/// When every zone ties, each one scores 100.
pub fn apply_survival_scores(aggregates: &mut [ZoneAggregate]) {
    let Some(first) = aggregates.first() else {
        return;
    };
    let (min, max) = aggregates.iter().fold(
        (first.avg_survival_time, first.avg_survival_time),
        |(min, max), agg| (min.min(agg.avg_survival_time), max.max(agg.avg_survival_time)),
    );
    let span = max - min;
    for agg in aggregates.iter_mut() {
        agg.survival_score = if span > 0.0 {
            ((agg.avg_survival_time - min) / span * MAX_SURVIVAL_SCORE)
                .clamp(0.0, MAX_SURVIVAL_SCORE)
        } else {
            MAX_SURVIVAL_SCORE
        };
    }
}

/// Counts defeated players by the zone containing their final position.
pub fn aggregate_death_locations(
    catalog: &ZoneCatalog,
    outcomes: &[PlayerOutcome],
) -> Vec<DeathLocationAggregate> {
    let mut counts = vec![0usize; catalog.len()];
    for outcome in outcomes.iter().filter(|outcome| outcome.died) {
        if let Some(idx) = catalog
            .classify(outcome.final_position)
            .and_then(|zone| catalog.position(&zone.name))
        {
            counts[idx] += 1;
        }
    }

    catalog
        .zones()
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(zone, death_count)| DeathLocationAggregate {
            zone_name: zone.name.clone(),
            label: zone.label.clone(),
            death_count,
        })
        .collect()
}
