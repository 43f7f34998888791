//! Projection of a report into the printed document structure.
//!
//! Rendering is a pure function of the record, the selected engineer and the
//! map snapshot. Page breaks and header/footer stamping happen later, in
//! `export`.

use crate::classification::{destruction_level, destruction_percentage};
use crate::engineers::EngineerRecord;
use crate::map::MapSnapshot;
use crate::model::{DamageEntry, PropertyIdentifiers, ReportRecord, ScalarField};
use crate::raster::{decode_photo, flatten_on_white};
use image::{DynamicImage, RgbImage};
use std::sync::Arc;
use tracing::warn;

/// Marker printed in place of any empty value.
pub const NOT_PROVIDED: &str = "NÃO INFORMADO";

pub const REPORT_TITLE: &str = "LAUDO DE IMÓVEL AFETADO POR EVENTO CLIMÁTICO";

const HEADER_LINES: [&str; 3] = [
    "ESTADO DO PARANÁ",
    "COORDENADORIA ESTADUAL DA DEFESA CIVIL",
    "FUNDO ESTADUAL PARA CALAMIDADES PÚBLICAS",
];

const FOOTER_LINES: [&str; 3] = [
    "Palácio das Araucárias - 1º andar - Setor C | Centro Cívico | Curitiba/PR | CEP 80.530-140",
    "E-mail: defesacivil@defesacivil.pr.gov.br | Fone: (41) 3281-2500",
    "\"Defesa Civil somos todos nós\"",
];

const PHOTOS_PER_ROW: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayValue {
    Provided(String),
    Missing,
}

impl DisplayValue {
    /// Empty or whitespace-only input is `Missing`.
    pub fn of(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            DisplayValue::Missing
        } else {
            DisplayValue::Provided(trimmed.to_string())
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DisplayValue::Provided(text) => text,
            DisplayValue::Missing => NOT_PROVIDED,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DisplayValue::Missing)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Heading(String),
    Field { label: String, value: DisplayValue },
    Note(String),
    MapImage(Arc<RgbImage>),
    /// Shown when no snapshot could be produced.
    MapPlaceholder { coordinates: DisplayValue },
    PhotoRow(Vec<Arc<RgbImage>>),
    Signature {
        name: Option<String>,
        role: String,
        license: Option<String>,
    },
    Spacer(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Title,
    GeneralInfo,
    Property,
    Location,
    Map,
    Damage,
    Classification,
    Signature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    /// Must not be split across a page boundary when it fits on one page.
    pub keep_together: bool,
    pub blocks: Vec<Block>,
}

impl Section {
    fn new(kind: SectionKind, keep_together: bool) -> Self {
        Self {
            kind,
            keep_together,
            blocks: Vec::new(),
        }
    }

    fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    fn field(&mut self, label: &str, value: &str) -> &mut Self {
        self.push(Block::Field {
            label: label.to_string(),
            value: DisplayValue::of(value),
        })
    }
}

/// Institutional branding repeated at the top or bottom of every page.
#[derive(Debug, Clone, PartialEq)]
pub struct Chrome {
    pub lines: Vec<String>,
    pub left_logo: Option<Arc<RgbImage>>,
    pub right_logo: Option<Arc<RgbImage>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub header: Option<Chrome>,
    pub body: Vec<Section>,
    pub footer: Option<Chrome>,
}

impl Document {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.body.iter().find(|s| s.kind == kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Branding {
    pub header_left_logo: Option<DynamicImage>,
    pub header_right_logo: Option<DynamicImage>,
    pub footer_logo: Option<DynamicImage>,
}

pub struct Renderer {
    header: Chrome,
    footer: Chrome,
}

impl Renderer {
    pub fn new(branding: &Branding) -> Self {
        let prepare = |logo: &Option<DynamicImage>| logo.as_ref().map(|l| Arc::new(flatten_on_white(l)));
        Self {
            header: Chrome {
                lines: HEADER_LINES.iter().map(|s| s.to_string()).collect(),
                left_logo: prepare(&branding.header_left_logo),
                right_logo: prepare(&branding.header_right_logo),
            },
            footer: Chrome {
                lines: FOOTER_LINES.iter().map(|s| s.to_string()).collect(),
                left_logo: None,
                right_logo: prepare(&branding.footer_logo),
            },
        }
    }

    pub fn render(
        &self,
        record: &ReportRecord,
        engineer: Option<&EngineerRecord>,
        snapshot: Option<&MapSnapshot>,
    ) -> Document {
        let mut body = vec![
            title_section(),
            general_section(record),
            property_section(record),
            location_section(record),
            map_section(record, snapshot),
        ];
        body.extend(damage_sections(record.damage_items()));
        body.push(classification_section(record));
        body.push(signature_section(engineer));

        Document {
            title: format!("{} - {}", REPORT_TITLE, record.id()),
            header: Some(self.header.clone()),
            body,
            footer: Some(self.footer.clone()),
        }
    }
}

fn title_section() -> Section {
    let mut section = Section::new(SectionKind::Title, true);
    section.push(Block::Title(REPORT_TITLE.to_string()));
    section
}

fn general_section(record: &ReportRecord) -> Section {
    let mut section = Section::new(SectionKind::GeneralInfo, false);
    section
        .field("Município", record.get(ScalarField::Municipality))
        .field("Data", &record.inspection_date().format("%d/%m/%Y").to_string())
        .field("Nº do laudo", record.id());
    section
}

fn property_section(record: &ReportRecord) -> Section {
    let mut section = Section::new(SectionKind::Property, false);
    section
        .push(Block::Heading("INFORMAÇÕES DO IMÓVEL".to_string()))
        .field("Zona", record.zone().label());

    match record.property_identifiers() {
        PropertyIdentifiers::Urban(urban) => {
            section
                .field("Indicação fiscal", &urban.tax_indication)
                .field("Inscrição municipal", &urban.municipal_registration)
                .field("Matrícula", &urban.title_deed_number);
        }
        PropertyIdentifiers::Rural(rural) => {
            section
                .field("NIRF", &rural.federal_registry_number)
                .field("Código INCRA", &rural.incra_code);
        }
    }

    section
        .field("Proprietário", record.get(ScalarField::Owner))
        .field("Requerente", record.get(ScalarField::Requester))
        .field("CPF do requerente", record.get(ScalarField::RequesterTaxId))
        .field("Tipologia", record.building_type_display());
    section
}

fn coordinates_text(record: &ReportRecord) -> String {
    let coords = record.coordinates();
    match coords.point() {
        Some(point) => point.to_string(),
        None if coords.latitude.trim().is_empty() && coords.longitude.trim().is_empty() => {
            String::new()
        }
        None => format!("{}, {}", coords.latitude, coords.longitude),
    }
}

fn location_section(record: &ReportRecord) -> Section {
    let mut section = Section::new(SectionKind::Location, false);
    section
        .field("Endereço", record.get(ScalarField::Address))
        .field("Coordenadas", &coordinates_text(record));
    section
}

fn map_section(record: &ReportRecord, snapshot: Option<&MapSnapshot>) -> Section {
    let mut section = Section::new(SectionKind::Map, true);
    section.push(Block::Heading("LOCALIZAÇÃO DO IMÓVEL".to_string()));
    match snapshot {
        Some(snapshot) => {
            let rgb = flatten_on_white(&DynamicImage::ImageRgba8(snapshot.image.clone()));
            section.push(Block::MapImage(Arc::new(rgb)));
        }
        None => {
            section.push(Block::MapPlaceholder {
                coordinates: DisplayValue::of(&coordinates_text(record)),
            });
        }
    }
    section
}

fn photo_rows(entry: &DamageEntry) -> Vec<Block> {
    let photos: Vec<Arc<RgbImage>> = entry
        .photos
        .iter()
        .filter_map(|photo| match decode_photo(&photo.data) {
            Ok(image) => Some(Arc::new(image)),
            Err(e) => {
                warn!(photo = %photo.name, category = entry.category.label(), error = %e, "photo skipped");
                None
            }
        })
        .collect();

    photos
        .chunks(PHOTOS_PER_ROW)
        .map(|row| Block::PhotoRow(row.to_vec()))
        .collect()
}

/// One section per damage entry; the first also carries the heading so the
/// heading never ends a page alone.
fn damage_sections(entries: &[DamageEntry]) -> Vec<Section> {
    let heading = Block::Heading("LEVANTAMENTO DE DANOS".to_string());

    if entries.is_empty() {
        let mut section = Section::new(SectionKind::Damage, true);
        section
            .push(heading)
            .push(Block::Note("Nenhum dano registrado.".to_string()));
        return vec![section];
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut section = Section::new(SectionKind::Damage, true);
            if i == 0 {
                section.push(heading.clone());
            }
            section.field(&entry.category.label().to_uppercase(), &entry.description);
            for row in photo_rows(entry) {
                section.push(row);
            }
            section.push(Block::Spacer(3.0));
            section
        })
        .collect()
}

fn classification_section(record: &ReportRecord) -> Section {
    let classification = record.classification();
    let mut section = Section::new(SectionKind::Classification, true);
    section
        .push(Block::Heading("AÇÕES DO EVENTO CLIMÁTICO".to_string()))
        .field("Classificação", classification.map(|c| c.label()).unwrap_or(""))
        .field("Nível de destruição", destruction_level(classification))
        .field(
            "Percentual considerado de destruição",
            destruction_percentage(classification),
        );
    section
}

fn signature_section(engineer: Option<&EngineerRecord>) -> Section {
    let mut section = Section::new(SectionKind::Signature, true);
    section.push(Block::Signature {
        name: engineer
            .map(|e| e.name.trim().to_uppercase())
            .filter(|n| !n.is_empty()),
        role: "Engenheiro(a) Civil".to_string(),
        license: engineer.map(|e| e.license_display()),
    });
    section
}
