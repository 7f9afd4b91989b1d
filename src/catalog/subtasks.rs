//! Built-in subtask table
//!
//! Grouped by parent, ascending item level within each group.

use crate::domain::Subtask;

pub fn builtin_subtasks() -> Vec<Subtask> {
    vec![
        // T1 Guardians
        Subtask::new("Ur'nil", "Guardian", "guardians/guardian_23.png", 302),
        Subtask::new("Lumerus", "Guardian", "guardians/guardian_22.png", 340),
        Subtask::new("Icy Legoros", "Guardian", "guardians/guardian_11.png", 380),
        Subtask::new("Vertus", "Guardian", "guardians/guardian_00.png", 420),
        Subtask::new("Chromanium", "Guardian", "guardians/guardian_02.png", 460),
        Subtask::new("Nacrasena", "Guardian", "guardians/guardian_07.png", 500),
        Subtask::new("Flame Fox Yoho", "Guardian", "guardians/guardian_19.png", 540),
        Subtask::new("Tytalos", "Guardian", "guardians/guardian_21.png", 580),
        // T2 Guardians
        Subtask::new("Dark Legoros", "Guardian", "guardians/guardian_10.png", 802),
        Subtask::new("Helgaia", "Guardian", "guardians/guardian_01.png", 840),
        Subtask::new("Calventus", "Guardian", "guardians/guardian_17.png", 880),
        Subtask::new("Achates", "Guardian", "guardians/guardian_20.png", 920),
        Subtask::new("Frost Helgaia", "Guardian", "guardians/guardian_14.png", 960),
        Subtask::new("Lava Chromanium", "Guardian", "guardians/guardian_15.png", 1000),
        Subtask::new("Levanos", "Guardian", "guardians/guardian_09.png", 1040),
        Subtask::new("Alberhastic", "Guardian", "guardians/guardian_28.png", 1080),
        // T3 Guardians
        Subtask::new("Armored Nacrasena", "Guardian", "guardians/guardian_08.png", 1302),
        Subtask::new("Igrexion", "Guardian", "guardians/guardian_26.png", 1340),
        Subtask::new("Night Fox Yoho", "Guardian", "guardians/guardian_18.png", 1370),
        // T3 Abyss
        Subtask::new("Aira's Oculus (Normal)", "Aira's Oculus", "abyss_dungeons/abyss_dg_09.png", 1325),
        Subtask::new("Aira's Oculus (Hard)", "Aira's Oculus", "abyss_dungeons/abyss_dg_09.png", 1370),
        Subtask::new("Oreha Preveza (Normal)", "Oreha Preveza", "abyss_dungeons/abyss_dg_10.png", 1340),
        Subtask::new("Oreha Preveza (Hard)", "Oreha Preveza", "abyss_dungeons/abyss_dg_10.png", 1370),
        // Argos phases
        Subtask::new("Argos P1", "Argos", "abyss_raids/abyss_02.png", 1370),
        Subtask::new("Argos P2", "Argos", "abyss_raids/abyss_02.png", 1385),
        Subtask::new("Argos P3", "Argos", "abyss_raids/abyss_02.png", 1400),
    ]
}
