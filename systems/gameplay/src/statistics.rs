//! Running score kept from gameplay events.

use mikanbox_core::{StatisticsEvent, StatisticsSink};

/// Points awarded per erased item, multiplied by the cascade depth.
pub const POINTS_PER_MIKAN: u64 = 10;

/// Aggregated session statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Pairs that entered the grid.
    pub pairs_spawned: u64,
    /// Pairs that came to rest.
    pub pairs_landed: u64,
    /// Chains erased.
    pub chains: u64,
    /// Items erased.
    pub erased: u64,
    /// Spoil applications that increased an item's damage.
    pub spoiled: u64,
    /// Deepest cascade reached.
    pub longest_cascade: u32,
    /// Accumulated score.
    pub score: u64,
    /// Whether the session ended.
    pub game_over: bool,
    cascade: u32,
}

impl StatisticsSink for Statistics {
    fn notify(&mut self, event: &StatisticsEvent) {
        match *event {
            StatisticsEvent::PairSpawned => self.pairs_spawned += 1,
            StatisticsEvent::PairLanded => self.pairs_landed += 1,
            StatisticsEvent::ChainsCleared { chains, cascade } => {
                self.chains += chains as u64;
                self.cascade = cascade;
                self.longest_cascade = self.longest_cascade.max(cascade);
            }
            StatisticsEvent::MikansErased { count } => {
                self.erased += count as u64;
                self.score += count as u64 * POINTS_PER_MIKAN * u64::from(self.cascade.max(1));
            }
            StatisticsEvent::ItemsSpoiled { count } => self.spoiled += count as u64,
            StatisticsEvent::GameOver => self.game_over = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deeper_cascades_score_more_per_item() {
        let mut statistics = Statistics::default();
        statistics.notify(&StatisticsEvent::ChainsCleared {
            chains: 1,
            cascade: 1,
        });
        statistics.notify(&StatisticsEvent::MikansErased { count: 4 });
        statistics.notify(&StatisticsEvent::ChainsCleared {
            chains: 2,
            cascade: 2,
        });
        statistics.notify(&StatisticsEvent::MikansErased { count: 8 });

        assert_eq!(statistics.chains, 3);
        assert_eq!(statistics.erased, 12);
        assert_eq!(statistics.longest_cascade, 2);
        assert_eq!(statistics.score, 40 + 160);
    }
}
