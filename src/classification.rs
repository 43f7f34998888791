use serde::{Deserialize, Serialize};

/// Final damage verdict of the inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageClassification {
    #[serde(rename = "Danos Mínimos", alias = "minimal")]
    Minimal,
    #[serde(rename = "Danos Parciais", alias = "partial")]
    Partial,
    #[serde(rename = "Danos Severos", alias = "severe")]
    Severe,
    #[serde(rename = "Ruína", alias = "ruin")]
    Ruin,
}

impl DamageClassification {
    pub const ALL: [DamageClassification; 4] = [
        DamageClassification::Minimal,
        DamageClassification::Partial,
        DamageClassification::Severe,
        DamageClassification::Ruin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DamageClassification::Minimal => "Danos Mínimos",
            DamageClassification::Partial => "Danos Parciais",
            DamageClassification::Severe => "Danos Severos",
            DamageClassification::Ruin => "Ruína",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label.trim())
    }
}

// Levels and percentages are assigned labels, not a function of rank.
pub fn destruction_level(classification: Option<DamageClassification>) -> &'static str {
    match classification {
        Some(DamageClassification::Minimal) => "Sem Destruição",
        Some(DamageClassification::Partial) => "Destruição Parcial Leve",
        Some(DamageClassification::Severe) => "Destruição Parcial Grave",
        Some(DamageClassification::Ruin) => "Destruição Total",
        None => "",
    }
}

pub fn destruction_percentage(classification: Option<DamageClassification>) -> &'static str {
    match classification {
        Some(DamageClassification::Minimal) => "10%",
        Some(DamageClassification::Partial) => "40%",
        Some(DamageClassification::Severe) => "70%",
        Some(DamageClassification::Ruin) => "100%",
        None => "",
    }
}
