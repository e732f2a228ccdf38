//! Registry commands: load validation and the offline proximity filter.

use std::path::Path;

use anyhow::Context;
use farmalog_core::{filter_within_radius, load_column_mapping, load_registry, Area, Registry};

/// Loads the column mapping and the registry, failing with the loader's
/// diagnostic when either is unusable.
///
/// # Errors
///
/// Returns an error if the mapping or the registry cannot be read or
/// validated.
pub(crate) fn load(registry: &Path, columns: &Path) -> anyhow::Result<Registry> {
    let mapping = load_column_mapping(columns)
        .with_context(|| format!("loading column mapping {}", columns.display()))?;
    load_registry(registry, &mapping)
        .with_context(|| format!("loading registry {}", registry.display()))
}

/// Print record and hub counts per province–canton.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn run_check(registry: &Registry) -> anyhow::Result<()> {
    println!(
        "{} points of sale, {} hubs",
        registry.len(),
        registry.hubs().count()
    );
    println!("{:<20} {:<20} {:>8}", "PROVINCE", "CANTON", "RECORDS");
    for ((province, canton), count) in registry.counts_by_area() {
        println!("{province:<20} {canton:<20} {count:>8}");
    }
    Ok(())
}

/// Resolve an area label, defaulting to the first catalog area.
pub(crate) fn resolve_area(label: Option<&str>) -> anyhow::Result<Area> {
    match label {
        None => Ok(Area::default()),
        Some(label) => Area::from_label(label)
            .copied()
            .with_context(|| format!("unknown area \"{label}\"")),
    }
}

pub(crate) fn run_nearby(
    registry: &Registry,
    origin: &str,
    area: Option<&str>,
    radius_km: f64,
    json: bool,
) -> anyhow::Result<()> {
    let origin = registry
        .find(origin)
        .with_context(|| format!("point of sale \"{origin}\" not found"))?;
    let area = resolve_area(area)?;
    if !radius_km.is_finite() || radius_km < 0.0 {
        anyhow::bail!("radius must be a non-negative number of kilometers");
    }

    let results = filter_within_radius(origin.coordinate, registry.in_area(area), radius_km);
    tracing::debug!(matches = results.len(), "proximity filter ran");

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!(
            "No points of sale within {radius_km:.1} km of {} in {}",
            origin.name,
            area.label()
        );
        return Ok(());
    }
    println!(
        "Points of sale within {radius_km:.1} km of {} in {}",
        origin.name,
        area.label()
    );
    println!("{:>8}  {:<4} {:<40} ADDRESS", "KM", "HUB", "NAME");
    for row in &results {
        let p = row.point_of_sale;
        println!(
            "{:>8.2}  {:<4} {:<40} {}",
            row.distance_km,
            if p.is_hub() { "yes" } else { "" },
            p.name,
            p.address
        );
    }
    Ok(())
}
