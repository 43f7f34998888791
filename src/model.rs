//! The in-progress inspection report and its controlled mutations.
//!
//! Every mutation applies one user action as a single state transition.
//! Switching zone never clears the inactive identifier group.

use crate::classification::DamageClassification;
use crate::geo::GeoPoint;
use crate::masks::MaskedField;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Municipalities offered by the form. Other names are accepted with a warning.
pub const PARANA_MUNICIPALITIES: &[&str] = &[
    "Antonina",
    "Apucarana",
    "Arapongas",
    "Araucária",
    "Cambé",
    "Campo Largo",
    "Campo Mourão",
    "Cascavel",
    "Castro",
    "Colombo",
    "Curitiba",
    "Foz do Iguaçu",
    "Francisco Beltrão",
    "Guarapuava",
    "Guaratuba",
    "Irati",
    "Londrina",
    "Maringá",
    "Matinhos",
    "Morretes",
    "Paranaguá",
    "Paranavaí",
    "Pato Branco",
    "Piraquara",
    "Ponta Grossa",
    "Pontal do Paraná",
    "São José dos Pinhais",
    "Sarandi",
    "Telêmaco Borba",
    "Toledo",
    "Umuarama",
    "União da Vitória",
];

pub fn is_known_municipality(name: &str) -> bool {
    let name = name.trim();
    PARANA_MUNICIPALITIES
        .iter()
        .any(|m| m.eq_ignore_ascii_case(name) || *m == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Zone {
    #[default]
    #[serde(rename = "Urbano", alias = "urban")]
    Urban,
    #[serde(rename = "Rural", alias = "rural")]
    Rural,
}

impl Zone {
    pub fn label(self) -> &'static str {
        match self {
            Zone::Urban => "Urbano",
            Zone::Rural => "Rural",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrbanIdentifiers {
    pub tax_indication: String,
    pub municipal_registration: String,
    pub title_deed_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuralIdentifiers {
    pub federal_registry_number: String,
    pub incra_code: String,
}

/// The identifier group selected by the report's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyIdentifiers<'a> {
    Urban(&'a UrbanIdentifiers),
    Rural(&'a RuralIdentifiers),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildingType {
    #[default]
    #[serde(rename = "Casa de Alvenaria", alias = "masonry_house")]
    MasonryHouse,
    #[serde(rename = "Casa de Madeira", alias = "wooden_house")]
    WoodenHouse,
    #[serde(rename = "Casa Mista", alias = "mixed_house")]
    MixedHouse,
    #[serde(rename = "Apartamento", alias = "apartment")]
    Apartment,
    #[serde(rename = "Estabelecimento Comercial", alias = "commercial")]
    Commercial,
    #[serde(rename = "Galpão", alias = "shed")]
    Shed,
    #[serde(rename = "Outro", alias = "other")]
    Other,
}

impl BuildingType {
    pub fn label(self) -> &'static str {
        match self {
            BuildingType::MasonryHouse => "Casa de Alvenaria",
            BuildingType::WoodenHouse => "Casa de Madeira",
            BuildingType::MixedHouse => "Casa Mista",
            BuildingType::Apartment => "Apartamento",
            BuildingType::Commercial => "Estabelecimento Comercial",
            BuildingType::Shed => "Galpão",
            BuildingType::Other => "Outro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageCategory {
    #[serde(rename = "Cobertura", alias = "roof")]
    Roof,
    #[serde(rename = "Forro", alias = "ceiling")]
    Ceiling,
    #[serde(rename = "Paredes", alias = "walls")]
    Walls,
    #[serde(rename = "Estrutura", alias = "structure")]
    Structure,
    #[serde(rename = "Fundação", alias = "foundation")]
    Foundation,
    #[serde(rename = "Piso", alias = "floor")]
    Floor,
    #[serde(rename = "Esquadrias", alias = "frames")]
    Frames,
    #[serde(rename = "Instalações Elétricas", alias = "electrical")]
    Electrical,
    #[serde(rename = "Instalações Hidráulicas", alias = "plumbing")]
    Plumbing,
    #[serde(rename = "Muros", alias = "boundary_walls")]
    BoundaryWalls,
    #[serde(rename = "Mobiliário", alias = "furniture")]
    Furniture,
}

impl DamageCategory {
    pub fn label(self) -> &'static str {
        match self {
            DamageCategory::Roof => "Cobertura",
            DamageCategory::Ceiling => "Forro",
            DamageCategory::Walls => "Paredes",
            DamageCategory::Structure => "Estrutura",
            DamageCategory::Foundation => "Fundação",
            DamageCategory::Floor => "Piso",
            DamageCategory::Frames => "Esquadrias",
            DamageCategory::Electrical => "Instalações Elétricas",
            DamageCategory::Plumbing => "Instalações Hidráulicas",
            DamageCategory::BoundaryWalls => "Muros",
            DamageCategory::Furniture => "Mobiliário",
        }
    }
}

/// An attached photograph, kept as the encoded bytes the user supplied.
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    pub name: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photo")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageEntry {
    pub category: DamageCategory,
    pub description: String,
    pub photos: Vec<Photo>,
}

/// Decimal-degree strings as shown in the form. Always written as a pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

impl Coordinates {
    /// `None` unless both components parse as finite numbers.
    pub fn point(&self) -> Option<GeoPoint> {
        GeoPoint::parse(&self.latitude, &self.longitude)
    }
}

/// Free-text and masked scalar fields editable through `set_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    Municipality,
    Owner,
    Requester,
    RequesterTaxId,
    Address,
    TaxIndication,
    MunicipalRegistration,
    TitleDeedNumber,
    FederalRegistryNumber,
    IncraCode,
    BuildingTypeOther,
}

impl ScalarField {
    fn mask(self) -> Option<MaskedField> {
        match self {
            ScalarField::RequesterTaxId => Some(MaskedField::Cpf),
            ScalarField::TitleDeedNumber => Some(MaskedField::TitleDeed),
            ScalarField::FederalRegistryNumber => Some(MaskedField::Nirf),
            ScalarField::IncraCode => Some(MaskedField::Incra),
            _ => None,
        }
    }
}

/// A masked field whose value fails its advisory check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWarning {
    pub field: MaskedField,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    id: String,
    municipality: String,
    inspection_date: NaiveDate,
    engineer_id: Option<String>,
    zone: Zone,
    urban: UrbanIdentifiers,
    rural: RuralIdentifiers,
    owner: String,
    requester: String,
    requester_tax_id: String,
    address: String,
    coordinates: Coordinates,
    building_type: BuildingType,
    building_type_other: String,
    damage_items: Vec<DamageEntry>,
    classification: Option<DamageClassification>,
}

impl ReportRecord {
    pub fn new(inspection_date: NaiveDate) -> Self {
        Self {
            id: generate_short_id(),
            municipality: String::new(),
            inspection_date,
            engineer_id: None,
            zone: Zone::default(),
            urban: UrbanIdentifiers::default(),
            rural: RuralIdentifiers::default(),
            owner: String::new(),
            requester: String::new(),
            requester_tax_id: String::new(),
            address: String::new(),
            coordinates: Coordinates::default(),
            building_type: BuildingType::default(),
            building_type_other: String::new(),
            damage_items: Vec::new(),
            classification: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn inspection_date(&self) -> NaiveDate {
        self.inspection_date
    }

    pub fn engineer_id(&self) -> Option<&str> {
        self.engineer_id.as_deref()
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn urban(&self) -> &UrbanIdentifiers {
        &self.urban
    }

    pub fn rural(&self) -> &RuralIdentifiers {
        &self.rural
    }

    pub fn property_identifiers(&self) -> PropertyIdentifiers<'_> {
        match self.zone {
            Zone::Urban => PropertyIdentifiers::Urban(&self.urban),
            Zone::Rural => PropertyIdentifiers::Rural(&self.rural),
        }
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    pub fn building_type(&self) -> BuildingType {
        self.building_type
    }

    /// Label shown in the report; the free-text override wins for `Other`.
    pub fn building_type_display(&self) -> &str {
        match self.building_type {
            BuildingType::Other => self.building_type_other.as_str(),
            other => other.label(),
        }
    }

    pub fn damage_items(&self) -> &[DamageEntry] {
        &self.damage_items
    }

    pub fn damage_entry(&self, category: DamageCategory) -> Option<&DamageEntry> {
        self.damage_items.iter().find(|d| d.category == category)
    }

    pub fn classification(&self) -> Option<DamageClassification> {
        self.classification
    }

    pub fn get(&self, field: ScalarField) -> &str {
        match field {
            ScalarField::Municipality => &self.municipality,
            ScalarField::Owner => &self.owner,
            ScalarField::Requester => &self.requester,
            ScalarField::RequesterTaxId => &self.requester_tax_id,
            ScalarField::Address => &self.address,
            ScalarField::TaxIndication => &self.urban.tax_indication,
            ScalarField::MunicipalRegistration => &self.urban.municipal_registration,
            ScalarField::TitleDeedNumber => &self.urban.title_deed_number,
            ScalarField::FederalRegistryNumber => &self.rural.federal_registry_number,
            ScalarField::IncraCode => &self.rural.incra_code,
            ScalarField::BuildingTypeOther => &self.building_type_other,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Store a scalar value, passing masked fields through their mask.
    pub fn set_field(&mut self, field: ScalarField, value: &str) {
        let value = match field.mask() {
            Some(mask) => mask.mask(value),
            None => value.to_string(),
        };
        let slot = match field {
            ScalarField::Municipality => &mut self.municipality,
            ScalarField::Owner => &mut self.owner,
            ScalarField::Requester => &mut self.requester,
            ScalarField::RequesterTaxId => &mut self.requester_tax_id,
            ScalarField::Address => &mut self.address,
            ScalarField::TaxIndication => &mut self.urban.tax_indication,
            ScalarField::MunicipalRegistration => &mut self.urban.municipal_registration,
            ScalarField::TitleDeedNumber => &mut self.urban.title_deed_number,
            ScalarField::FederalRegistryNumber => &mut self.rural.federal_registry_number,
            ScalarField::IncraCode => &mut self.rural.incra_code,
            ScalarField::BuildingTypeOther => &mut self.building_type_other,
        };
        *slot = value;
    }

    pub fn set_zone(&mut self, zone: Zone) {
        self.zone = zone;
    }

    pub fn set_engineer(&mut self, engineer_id: Option<String>) {
        self.engineer_id = engineer_id.filter(|id| !id.trim().is_empty());
    }

    pub fn set_building_type(&mut self, building_type: BuildingType) {
        self.building_type = building_type;
    }

    pub fn set_classification(&mut self, classification: Option<DamageClassification>) {
        self.classification = classification;
    }

    /// Select or deselect a category. Deselecting drops its description and
    /// photos. Returns whether the category is selected afterwards.
    pub fn toggle_damage(&mut self, category: DamageCategory) -> bool {
        if let Some(pos) = self.damage_items.iter().position(|d| d.category == category) {
            self.damage_items.remove(pos);
            false
        } else {
            self.damage_items.push(DamageEntry {
                category,
                description: String::new(),
                photos: Vec::new(),
            });
            true
        }
    }

    /// Returns `false` when the category is not selected.
    pub fn set_damage_description(&mut self, category: DamageCategory, description: &str) -> bool {
        match self.entry_mut(category) {
            Some(entry) => {
                entry.description = description.to_string();
                true
            }
            None => false,
        }
    }

    /// Returns `false` when the category is not selected.
    pub fn append_photos(&mut self, category: DamageCategory, photos: Vec<Photo>) -> bool {
        match self.entry_mut(category) {
            Some(entry) => {
                entry.photos.extend(photos);
                true
            }
            None => false,
        }
    }

    pub fn remove_photo(&mut self, category: DamageCategory, index: usize) -> Option<Photo> {
        let entry = self.entry_mut(category)?;
        (index < entry.photos.len()).then(|| entry.photos.remove(index))
    }

    /// Store a picked position; both components are written together.
    pub fn set_coordinates(&mut self, point: GeoPoint) {
        self.coordinates = Coordinates {
            latitude: format!("{:.6}", point.lat),
            longitude: format!("{:.6}", point.lon),
        };
    }

    /// Store manually typed coordinates as one pair, valid or not.
    pub fn set_coordinates_text(&mut self, latitude: &str, longitude: &str) {
        self.coordinates = Coordinates {
            latitude: latitude.trim().to_string(),
            longitude: longitude.trim().to_string(),
        };
    }

    fn entry_mut(&mut self, category: DamageCategory) -> Option<&mut DamageEntry> {
        self.damage_items.iter_mut().find(|d| d.category == category)
    }

    // ========================================================================
    // Advisory validation
    // ========================================================================

    /// Filled masked fields of the active zone (plus the requester tax ID)
    /// that fail their check. Never blocks preview or export.
    pub fn validation_warnings(&self) -> Vec<FieldWarning> {
        let mut checks = vec![(MaskedField::Cpf, self.requester_tax_id.as_str())];
        match self.property_identifiers() {
            PropertyIdentifiers::Urban(urban) => {
                checks.push((MaskedField::TitleDeed, urban.title_deed_number.as_str()));
            }
            PropertyIdentifiers::Rural(rural) => {
                checks.push((MaskedField::Nirf, rural.federal_registry_number.as_str()));
                checks.push((MaskedField::Incra, rural.incra_code.as_str()));
            }
        }

        checks
            .into_iter()
            .filter(|(field, value)| !value.trim().is_empty() && !field.validate(value))
            .map(|(field, value)| FieldWarning {
                field,
                value: value.to_string(),
            })
            .collect()
    }
}

fn generate_short_id() -> String {
    let uuid = Uuid::new_v4();
    let hex = format!("{:x}", uuid);
    hex[..8].to_uppercase()
}
