//! Report description file: the JSON form of one inspection, applied to a
//! fresh `ReportRecord` through its mutation operations.

use crate::classification::DamageClassification;
use crate::error::AppError;
use crate::model::{BuildingType, DamageCategory, Photo, ReportRecord, ScalarField, Zone};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UrbanFields {
    pub tax_indication: String,
    pub municipal_registration: String,
    pub title_deed_number: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuralFields {
    pub federal_registry_number: String,
    pub incra_code: String,
}

#[derive(Debug, Deserialize)]
pub struct DamageDescription {
    pub category: DamageCategory,
    #[serde(default)]
    pub description: String,
    /// Image files, relative to the report file.
    #[serde(default)]
    pub photos: Vec<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportDescription {
    pub municipality: String,
    /// YYYY-MM-DD creation date of the record, defaults to today. Consumed
    /// by `ReportRecord::new`; the record itself has no date setter.
    pub inspection_date: Option<String>,
    pub engineer_id: Option<String>,
    pub zone: Zone,
    pub urban: UrbanFields,
    pub rural: RuralFields,
    pub owner: String,
    pub requester: String,
    pub requester_tax_id: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub building_type: BuildingType,
    pub building_type_other: String,
    pub damages: Vec<DamageDescription>,
    pub classification: Option<DamageClassification>,
}

impl ReportDescription {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::ReportError(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        serde_json::from_str(content).map_err(|e| AppError::ReportError(format!("Invalid JSON: {}", e)))
    }

    /// Build the record. Photo paths resolve against `base_dir`; unreadable
    /// photos are skipped.
    pub fn into_record(self, base_dir: &Path) -> Result<ReportRecord, AppError> {
        let date = parse_date(&self.inspection_date)?;
        let mut record = ReportRecord::new(date);

        for (field, value) in [
            (ScalarField::Municipality, &self.municipality),
            (ScalarField::Owner, &self.owner),
            (ScalarField::Requester, &self.requester),
            (ScalarField::RequesterTaxId, &self.requester_tax_id),
            (ScalarField::Address, &self.address),
            (ScalarField::TaxIndication, &self.urban.tax_indication),
            (ScalarField::MunicipalRegistration, &self.urban.municipal_registration),
            (ScalarField::TitleDeedNumber, &self.urban.title_deed_number),
            (ScalarField::FederalRegistryNumber, &self.rural.federal_registry_number),
            (ScalarField::IncraCode, &self.rural.incra_code),
            (ScalarField::BuildingTypeOther, &self.building_type_other),
        ] {
            record.set_field(field, value);
        }

        record.set_zone(self.zone);
        record.set_engineer(self.engineer_id);
        record.set_building_type(self.building_type);
        record.set_classification(self.classification);
        if !self.latitude.trim().is_empty() || !self.longitude.trim().is_empty() {
            record.set_coordinates_text(&self.latitude, &self.longitude);
        }

        for damage in self.damages {
            if record.damage_entry(damage.category).is_some() {
                warn!(category = damage.category.label(), "duplicate damage category ignored");
                continue;
            }
            record.toggle_damage(damage.category);
            record.set_damage_description(damage.category, &damage.description);
            let photos = damage
                .photos
                .iter()
                .filter_map(|p| read_photo(&base_dir.join(p)))
                .collect();
            record.append_photos(damage.category, photos);
        }

        Ok(record)
    }
}

fn parse_date(date_str: &Option<String>) -> Result<NaiveDate, AppError> {
    match date_str {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| AppError::ReportError(format!("Invalid inspection date: {}", s))),
        None => Ok(Local::now().date_naive()),
    }
}

fn read_photo(path: &Path) -> Option<Photo> {
    match std::fs::read(path) {
        Ok(data) => Some(Photo {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            data,
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "photo skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyIdentifiers;

    #[test]
    fn applies_fields_through_masks() {
        let description = ReportDescription::parse(
            r#"{
                "municipality": "Ponta Grossa",
                "inspection_date": "2025-05-20",
                "zone": "rural",
                "rural": { "incra_code": "9501234567891" },
                "requester_tax_id": "52998224725",
                "building_type": "Outro",
                "building_type_other": "Estufa",
                "damages": [
                    { "category": "roof", "description": "Telhas quebradas" },
                    { "category": "Cobertura" }
                ],
                "classification": "Danos Parciais"
            }"#,
        )
        .unwrap();
        let record = description.into_record(Path::new(".")).unwrap();

        assert_eq!(record.get(ScalarField::RequesterTaxId), "529.982.247-25");
        assert_eq!(record.inspection_date(), NaiveDate::from_ymd_opt(2025, 5, 20).unwrap());
        assert!(matches!(
            record.property_identifiers(),
            PropertyIdentifiers::Rural(r) if r.incra_code == "950.123.456.789-1"
        ));
        assert_eq!(record.building_type_display(), "Estufa");
        assert_eq!(record.damage_items().len(), 1);
        assert_eq!(record.damage_items()[0].description, "Telhas quebradas");
        assert_eq!(record.classification(), Some(DamageClassification::Partial));
    }

    #[test]
    fn missing_photos_are_skipped() {
        let description = ReportDescription::parse(
            r#"{ "damages": [ { "category": "walls", "photos": ["does-not-exist.jpg"] } ] }"#,
        )
        .unwrap();
        let record = description.into_record(Path::new("/nonexistent")).unwrap();
        assert!(record.damage_items()[0].photos.is_empty());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            ReportDescription::parse("{ not json"),
            Err(AppError::ReportError(_))
        ));
        assert!(ReportDescription::parse(r#"{ "zone": "suburbano" }"#).is_err());
        let bad_date = ReportDescription::parse(r#"{ "inspection_date": "20/05/2025" }"#).unwrap();
        assert!(bad_date.into_record(Path::new(".")).is_err());
    }
}
