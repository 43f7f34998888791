//! Registry of responsible engineers referenced by `ReportRecord::engineer_id`.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineerRecord {
    pub id: String,
    pub name: String,
    /// State of the CREA professional license, e.g. "PR".
    pub license_state: String,
    pub license_number: String,
    #[serde(default)]
    pub professional_address: String,
    #[serde(default)]
    pub phone: String,
}

impl EngineerRecord {
    /// "CREA PR 12345/D" style license line.
    pub fn license_display(&self) -> String {
        format!("CREA {} {}", self.license_state, self.license_number)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineerRegistry {
    engineers: Vec<EngineerRecord>,
}

impl EngineerRegistry {
    pub fn new(engineers: Vec<EngineerRecord>) -> Self {
        Self { engineers }
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::EngineerError(format!("{}: {}", path.display(), e)))?;
        let engineers: Vec<EngineerRecord> = serde_json::from_str(&content)
            .map_err(|e| AppError::EngineerError(format!("Invalid JSON: {}", e)))?;
        Ok(Self::new(engineers))
    }

    pub fn find(&self, id: &str) -> Option<&EngineerRecord> {
        self.engineers.iter().find(|e| e.id == id)
    }

    /// Replace the record with the same id, or append a new one.
    pub fn upsert(&mut self, engineer: EngineerRecord) {
        match self.engineers.iter_mut().find(|e| e.id == engineer.id) {
            Some(existing) => *existing = engineer,
            None => self.engineers.push(engineer),
        }
    }

    pub fn len(&self) -> usize {
        self.engineers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engineers.is_empty()
    }
}
