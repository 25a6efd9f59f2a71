use serde::Serialize;

use super::aggregate::{DeathLocationAggregate, ZoneAggregate};
use super::assign::{NoBreadcrumbsError, PlayerLanding};
use super::outcome::PlayerOutcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub players_total: usize,
    pub players_zoned: usize,
    pub players_unzoned: usize,
    pub players_skipped: usize,
    pub deaths_total: usize,
    pub breadcrumb_rows: usize,
    pub skipped_rows: usize,
}

/// Everything one analysis run computed, in memory. `landings` and
/// `outcomes` are parallel and ordered by player id.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub landings: Vec<PlayerLanding>,
    pub outcomes: Vec<PlayerOutcome>,
    pub zone_aggregates: Vec<ZoneAggregate>,
    pub death_locations: Vec<DeathLocationAggregate>,
    pub skipped_players: Vec<NoBreadcrumbsError>,
    pub totals: RunTotals,
}

impl AnalysisReport {
    pub fn render_human_readable(&self) -> String {
        let totals = &self.totals;
        let mut output = format!(
            "players={} zoned={} unzoned={} skipped={} deaths={} breadcrumb_rows={} skipped_rows={}",
            totals.players_total,
            totals.players_zoned,
            totals.players_unzoned,
            totals.players_skipped,
            totals.deaths_total,
            totals.breadcrumb_rows,
            totals.skipped_rows
        );

        let mut hotspots = self.zone_aggregates.iter().collect::<Vec<_>>();
        hotspots.sort_by(|a, b| b.landing_count.cmp(&a.landing_count));
        output.push_str("\nlanding_hotspots:");
        for agg in hotspots {
            output.push_str(&format!(
                "\n  zone={} label={} landings={}",
                agg.zone_name, agg.label, agg.landing_count
            ));
        }

        let mut safest = self.zone_aggregates.iter().collect::<Vec<_>>();
        safest.sort_by(|a, b| b.survival_score.total_cmp(&a.survival_score));
        output.push_str("\nsafest_landing_spots:");
        for agg in safest {
            output.push_str(&format!(
                "\n  zone={} label={} survival_score={:.1} avg_survival_time={:.2} landings={}",
                agg.zone_name,
                agg.label,
                agg.survival_score,
                agg.avg_survival_time,
                agg.landing_count
            ));
        }

        let mut deadliest = self.death_locations.iter().collect::<Vec<_>>();
        deadliest.sort_by(|a, b| b.death_count.cmp(&a.death_count));
        output.push_str("\ndeadliest_zones:");
        for death in deadliest {
            output.push_str(&format!(
                "\n  zone={} label={} deaths={}",
                death.zone_name, death.label, death.death_count
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str, landings: usize, score: f64) -> ZoneAggregate {
        ZoneAggregate {
            zone_name: name.to_string(),
            label: name.to_lowercase(),
            landing_count: landings,
            death_count: 0,
            avg_survival_time: score,
            survival_score: score,
        }
    }

    #[test]
    fn tables_are_sorted_with_catalog_order_on_ties() {
        let report = AnalysisReport {
            zone_aggregates: vec![zone("A", 1, 0.0), zone("B", 3, 100.0), zone("C", 1, 50.0)],
            death_locations: vec![
                DeathLocationAggregate {
                    zone_name: "A".to_string(),
                    label: "a".to_string(),
                    death_count: 2,
                },
                DeathLocationAggregate {
                    zone_name: "C".to_string(),
                    label: "c".to_string(),
                    death_count: 5,
                },
            ],
            totals: RunTotals {
                players_total: 6,
                players_zoned: 5,
                players_unzoned: 1,
                ..RunTotals::default()
            },
            ..AnalysisReport::default()
        };
        let text = report.render_human_readable();
        let lines = text.lines().collect::<Vec<_>>();
        assert!(lines[0].starts_with("players=6 zoned=5 unzoned=1 skipped=0"));
        assert_eq!(lines[1], "landing_hotspots:");
        assert!(lines[2].contains("zone=B"));
        assert!(lines[3].contains("zone=A"));
        assert!(lines[4].contains("zone=C"));
        assert_eq!(lines[5], "safest_landing_spots:");
        assert!(lines[6].contains("zone=B") && lines[6].contains("survival_score=100.0"));
        assert!(lines[7].contains("zone=C"));
        assert_eq!(lines[9], "deadliest_zones:");
        assert!(lines[10].contains("zone=C") && lines[10].ends_with("deaths=5"));
    }
}
