//! Built-in task definitions
//!
//! Order matters: it is the display order and the catalog index. Bump
//! `CATALOG_VERSION` whenever an entry changes so stored copies are upgraded.

use crate::domain::{TaskFrequency, TaskScope, MAX_ILVL};
use super::CatalogEntry;

pub const CATALOG_VERSION: u32 = 3;

fn entry(label: &str, frequency: TaskFrequency, scope: TaskScope, min_ilvl: u32, amount: u32, icon: &str) -> CatalogEntry {
    CatalogEntry {
        label: label.to_string(),
        frequency,
        scope,
        min_ilvl,
        max_ilvl: MAX_ILVL,
        amount,
        icon_path: Some(icon.to_string()),
        days_filter: Vec::new(),
        shared: false,
    }
}

impl CatalogEntry {
    fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    fn on_days(mut self, days: &[u8]) -> Self {
        self.days_filter = days.to_vec();
        self
    }
}

pub(super) fn builtin_entries() -> Vec<CatalogEntry> {
    use TaskFrequency::{Daily, Weekly};
    use TaskScope::{Character, Roster};

    vec![
        // Daily, per character
        entry("Una's Tasks", Daily, Character, 0, 3, "tasks/una_daily.png"),
        entry("Chaos Dungeon", Daily, Character, 250, 2, "tasks/chaos_dungeon.png").shared(),
        entry("Guardian", Daily, Character, 302, 2, "tasks/guardian.png").shared(),
        entry("Guild Donation", Daily, Character, 0, 1, "tasks/guild.png"),
        // Daily, per roster
        entry("Chaos Gate", Daily, Roster, 250, 1, "tasks/chaos_gate.png").shared().on_days(&[1, 4, 6, 0]),
        entry("Field Boss", Daily, Roster, 250, 1, "tasks/field_boss.png").shared().on_days(&[2, 5, 0]),
        entry("Adventure Island", Daily, Roster, 0, 1, "tasks/adventure_island.png").shared(),
        entry("Rapport", Daily, Roster, 0, 6, "tasks/rapport.png"),
        entry("Ghost Ship", Daily, Roster, 460, 1, "tasks/ghost_ship.png").shared().on_days(&[2, 4, 6]),
        // Weekly, per character
        entry("Una's Weekly Tasks", Weekly, Character, 0, 3, "tasks/una_weekly.png"),
        entry("Aira's Oculus", Weekly, Character, 1325, 1, "tasks/abyss_dungeon.png").shared(),
        entry("Oreha Preveza", Weekly, Character, 1340, 1, "tasks/abyss_dungeon.png").shared(),
        entry("Argos", Weekly, Character, 1370, 1, "tasks/abyss_raid.png").shared(),
        entry("Guild Weekly Bloodstones", Weekly, Character, 0, 1, "tasks/guild.png"),
        // Weekly, per roster
        entry("Challenge Guardian Raid", Weekly, Roster, 302, 3, "tasks/guardian.png").shared(),
        entry("Challenge Abyss Dungeon", Weekly, Roster, 340, 2, "tasks/abyss_dungeon.png").shared(),
        entry("Pirate Coin Shop", Weekly, Roster, 0, 1, "tasks/pirate_coins.png"),
    ]
}
