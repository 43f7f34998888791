// laudo-pdf: Generate damage assessment reports for properties affected by climate events

use clap::Parser;
use laudo_pdf::engineers::EngineerRegistry;
use laudo_pdf::error::AppError;
use laudo_pdf::export::{export_pdf, output_file_name};
use laudo_pdf::geo::GeoPoint;
use laudo_pdf::geocode::{Geocoder, NominatimGeocoder, DEFAULT_GEOCODER_URL};
use laudo_pdf::geolocation::{FixedLocation, GeolocationOptions};
use laudo_pdf::input::ReportDescription;
use laudo_pdf::map::layers::{
    DEFAULT_PLACES_URL, DEFAULT_SATELLITE_URL, DEFAULT_STREET_URL, DEFAULT_TRANSPORTATION_URL,
};
use laudo_pdf::map::{ArcGisExportService, HeadlessMap, LayerEndpoints, MapCompositor, MapStyle};
use laudo_pdf::model::{is_known_municipality, ScalarField};
use laudo_pdf::raster::load_image;
use laudo_pdf::render::{Branding, Renderer};
use laudo_pdf::session::{InspectionSession, DEFAULT_ZOOM};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate damage assessment reports for properties affected by climate events")]
struct Args {
    /// Report description file (JSON)
    #[arg(short, long)]
    report: PathBuf,

    /// Engineer registry file (JSON array of engineers)
    #[arg(short, long)]
    engineers: Option<PathBuf>,

    /// Output filename (defaults to {municipality}_{date}_{owner}.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Map zoom level for the location snapshot
    #[arg(short, long, default_value_t = DEFAULT_ZOOM)]
    zoom: u8,

    /// Map style: street, satellite or hybrid
    #[arg(long, default_value = "hybrid")]
    map_style: MapStyle,

    /// Skip geocoding and map services; the report shows a map placeholder
    #[arg(long)]
    offline: bool,

    /// Also write the map snapshot as PNG
    #[arg(long)]
    map_png: Option<PathBuf>,

    /// Device position as "lat,lon", used as the inspected location
    #[arg(long, allow_hyphen_values = true)]
    gps: Option<String>,

    /// Header logo (file path or URL), left side
    #[arg(long)]
    header_logo: Option<String>,

    /// Header logo (file path or URL), right side
    #[arg(long)]
    header_right_logo: Option<String>,

    /// Footer logo (file path or URL)
    #[arg(long)]
    footer_logo: Option<String>,

    #[arg(long, env = "LAUDO_STREET_URL", default_value = DEFAULT_STREET_URL, hide_default_value = true)]
    street_url: String,

    #[arg(long, env = "LAUDO_SATELLITE_URL", default_value = DEFAULT_SATELLITE_URL, hide_default_value = true)]
    satellite_url: String,

    #[arg(long, env = "LAUDO_TRANSPORTATION_URL", default_value = DEFAULT_TRANSPORTATION_URL, hide_default_value = true)]
    transportation_url: String,

    #[arg(long, env = "LAUDO_PLACES_URL", default_value = DEFAULT_PLACES_URL, hide_default_value = true)]
    places_url: String,

    #[arg(long, env = "LAUDO_GEOCODER_URL", default_value = DEFAULT_GEOCODER_URL)]
    geocoder_url: String,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("laudo_pdf=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<(), AppError> {
    let args = Args::parse();

    // Load report and engineers
    let description = ReportDescription::load(&args.report)?;
    let base_dir = args.report.parent().unwrap_or_else(|| Path::new("."));
    let record = description.into_record(base_dir)?;

    let engineers = match &args.engineers {
        Some(path) => EngineerRegistry::load(path)?,
        None => EngineerRegistry::default(),
    };

    let branding = Branding {
        header_left_logo: load_optional_image(&args.header_logo),
        header_right_logo: load_optional_image(&args.header_right_logo),
        footer_logo: load_optional_image(&args.footer_logo),
    };

    let geocoder: Option<Box<dyn Geocoder>> = if args.offline {
        None
    } else {
        Some(Box::new(NominatimGeocoder::new(args.geocoder_url.clone())))
    };

    let mut session = InspectionSession::new(record, engineers, HeadlessMap::new(), geocoder);
    session.set_zoom(args.zoom);

    locate(&mut session, &args)?;
    report_warnings(&session);

    // Map snapshot
    if args.offline {
        session.refresh_preview(None, args.map_style);
    } else {
        let service = ArcGisExportService::new(LayerEndpoints {
            street: args.street_url.clone(),
            satellite: args.satellite_url.clone(),
            transportation: args.transportation_url.clone(),
            places: args.places_url.clone(),
        });
        let compositor = MapCompositor::new(&service);
        session.refresh_preview(Some(&compositor), args.map_style);
    }

    if let Some(path) = &args.map_png {
        match session.snapshot() {
            Some(snapshot) => {
                snapshot.save_png(path)?;
                info!(path = %path.display(), "map snapshot written");
            }
            None => warn!(path = %path.display(), "no map snapshot available, PNG not written"),
        }
    }

    // Render and export
    let document = Renderer::new(&branding).render(session.record(), session.engineer(), session.snapshot());
    let output_file = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(output_file_name(session.record())));
    let summary = export_pdf(&document, &output_file)?;

    let record = session.record();
    println!("✓ Generated: {}", summary.path.display());
    println!("  Municipality: {}", record.get(ScalarField::Municipality));
    println!("  Date: {}", record.inspection_date().format("%d/%m/%Y"));
    println!("  Pages: {}", summary.pages);
    println!("  Report ID: {}", record.id());

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// A logo that cannot be loaded leaves its slot empty; the band is still
/// drawn.
fn load_optional_image(source: &Option<String>) -> Option<::image::DynamicImage> {
    let source = source.as_deref()?;
    match load_image(source) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(source, error = %e, "logo unavailable, band rendered without it");
            None
        }
    }
}

/// Settle the inspected position: a device fix wins, then typed
/// coordinates, then the municipality centre.
fn locate(session: &mut InspectionSession<HeadlessMap>, args: &Args) -> Result<(), AppError> {
    if let Some(gps) = &args.gps {
        let fix = GeoPoint::parse_pair(gps).ok_or_else(|| AppError::CoordinateError(gps.clone()))?;
        match session.locate_device(&FixedLocation::new(Some(fix)), &GeolocationOptions::default()) {
            Ok(point) => info!(%point, "using device location"),
            Err(e) => warn!(error = %e, "device location unavailable"),
        }
        return Ok(());
    }

    match session.record().coordinates().point() {
        Some(point) => {
            if session.record().get(ScalarField::Address).trim().is_empty() {
                session.pick_location(point);
            }
        }
        None => {
            let municipality = session.record().get(ScalarField::Municipality).to_string();
            if !municipality.trim().is_empty() {
                session.change_municipality(&municipality);
            }
        }
    }
    Ok(())
}

fn report_warnings(session: &InspectionSession<HeadlessMap>) {
    let record = session.record();

    let municipality = record.get(ScalarField::Municipality);
    if !municipality.trim().is_empty() && !is_known_municipality(municipality) {
        warn!(municipality, "municipality is not in the Paraná list");
    }

    for warning in record.validation_warnings() {
        warn!(field = warning.field.label(), value = %warning.value, "field failed validation");
    }

    if let Some(id) = record.engineer_id() {
        if session.engineer().is_none() {
            warn!(engineer_id = id, "engineer not found in registry, signature left blank");
        }
    }
}
