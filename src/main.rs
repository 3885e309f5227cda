use clap::Parser;
use geogate::fence::{
    GeofenceValidator, InvalidReason, ReferencePoint, ValidationOutcome, ValidationReport,
    DEFAULT_ANCHOR, DEFAULT_RADIUS_KM,
};
use geogate::geo::Coordinate;
use geogate::geocode::BanGeocoder;
use geogate::server;
use std::time::Duration;

/// Geogate: address geofence validator
///
/// Resolves a free-text address through the national address index and
/// accepts it only when it lies within a fixed radius of a reference point.
/// Human verdict goes to stderr, the JSON report to stdout.
///
/// Exit codes: 0 = accepted, 1 = rejected (not found / out of range) or
/// usage error, 2 = lookup failure.
///
/// Examples:
///   geogate "8 Boulevard du Port Amiens"
///   geogate --address "Place Bellecour Lyon" --radius-km 500
///   geogate --lat 45.7640 --lon 4.8357 "Place Bellecour Lyon"
///   geogate --serve --port 8080
#[derive(Parser, Debug)]
#[command(name = "geogate", version, about, long_about = None)]
struct Cli {
    /// Address to validate (positional). Example: geogate "8 Boulevard du Port Amiens"
    #[arg(index = 1)]
    address_positional: Option<String>,

    /// Address to validate (named).
    #[arg(long)]
    address: Option<String>,

    /// Reference latitude (-90 to 90). Defaults to central Paris.
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Reference longitude (-180 to 180). Defaults to central Paris.
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Maximum allowed distance from the reference point, in kilometers.
    #[arg(long, default_value_t = DEFAULT_RADIUS_KM)]
    radius_km: f64,

    /// Lookup timeout in seconds.
    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    /// Run the HTTP API server instead of a one-shot validation.
    #[arg(long)]
    serve: bool,

    /// Server bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server bind port.
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() {
    // Usage errors exit 1 like the manual flag checks below; clap's default
    // exit code 2 is reserved for lookup failures.
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        std::process::exit(if e.use_stderr() { 1 } else { 0 });
    });

    // ── Build the reference point from flags ────────────────────

    let anchor = match (cli.lat, cli.lon) {
        (Some(lat), Some(lon)) => {
            let anchor = Coordinate::new(lat, lon);
            if !anchor.in_bounds() {
                eprintln!("Error: Invalid coordinates. Lat: -90..90, Lon: -180..180");
                std::process::exit(1);
            }
            anchor
        }
        (None, None) => DEFAULT_ANCHOR,
        _ => {
            eprintln!("Error: --lat and --lon must be provided together.");
            std::process::exit(1);
        }
    };

    if !cli.radius_km.is_finite() || cli.radius_km <= 0.0 {
        eprintln!("Error: --radius-km must be a positive number.");
        std::process::exit(1);
    }
    if cli.timeout_secs == 0 {
        eprintln!("Error: --timeout-secs must be at least 1.");
        std::process::exit(1);
    }

    let reference = ReferencePoint::new(anchor, cli.radius_km);
    let geocoder = BanGeocoder::with_timeout(Duration::from_secs(cli.timeout_secs));
    let validator = GeofenceValidator::new(reference, Box::new(geocoder));

    // ── Server mode ─────────────────────────────────────────────

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start async runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(server::start(&cli.host, cli.port, validator));
        return;
    }

    // ── One-shot validation ─────────────────────────────────────

    let address = match cli.address.as_deref().or(cli.address_positional.as_deref()) {
        Some(a) if !a.trim().is_empty() => a.trim().to_string(),
        _ => {
            eprintln!("Error: No address specified.");
            eprintln!();
            eprintln!("Usage:");
            eprintln!("  geogate \"8 Boulevard du Port Amiens\"");
            eprintln!("  geogate --address \"Place Bellecour Lyon\" --radius-km 500");
            eprintln!("  geogate --serve --port 8080");
            std::process::exit(1);
        }
    };

    eprintln!(
        "  \u{1F4CD} Reference ({:.4}, {:.4}), radius {} km",
        reference.anchor.latitude, reference.anchor.longitude, reference.max_distance_km
    );

    let report = validator.evaluate(&address);
    print_verdict(&report);

    // JSON to stdout
    println!("{}", serde_json::to_string_pretty(&report).unwrap());

    std::process::exit(match report.outcome {
        ValidationOutcome::Valid => 0,
        ValidationOutcome::Invalid(InvalidReason::LookupFailed) => 2,
        ValidationOutcome::Invalid(_) => 1,
    });
}

fn print_verdict(report: &ValidationReport) {
    let label = report
        .matched
        .as_ref()
        .map(|m| m.label.as_str())
        .unwrap_or("(no match)");

    match report.outcome {
        ValidationOutcome::Valid => {
            eprintln!("  \u{2713} Accepted: {}", label);
        }
        ValidationOutcome::Invalid(InvalidReason::OutOfRange) => {
            eprintln!("  \u{2717} Out of range: {}", label);
        }
        ValidationOutcome::Invalid(InvalidReason::AddressNotFound) => {
            eprintln!("  \u{2717} Address not found");
        }
        ValidationOutcome::Invalid(InvalidReason::LookupFailed) => {
            eprintln!("  \u{26A0} Lookup failed, try again later");
        }
    }

    if let Some(d) = report.distance_km {
        eprintln!(
            "    {:.1} km from reference (limit {} km)",
            d, report.reference.max_distance_km
        );
    }
}
