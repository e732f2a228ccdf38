//! `route` command: one directions call and its distance summary.

use anyhow::Context;
use farmalog_core::{summarize, Coordinate, Registry};
use farmalog_maps::MapsClient;

/// At most two transfer stops become waypoints.
const MAX_TRANSFERS: usize = 2;

pub(crate) fn transfer_waypoints(
    registry: &Registry,
    transfers: &[String],
) -> anyhow::Result<Vec<Coordinate>> {
    if transfers.len() > MAX_TRANSFERS {
        anyhow::bail!("at most {MAX_TRANSFERS} transfer stops are supported");
    }
    transfers
        .iter()
        .map(|name| {
            registry
                .find(name)
                .map(|p| p.coordinate)
                .with_context(|| format!("transfer stop \"{name}\" not found"))
        })
        .collect()
}

pub(crate) async fn run_route(
    registry: &Registry,
    origin: &str,
    transfers: &[String],
    to: Option<Coordinate>,
    address: Option<&str>,
) -> anyhow::Result<()> {
    let origin = registry
        .find(origin)
        .with_context(|| format!("point of sale \"{origin}\" not found"))?;
    let waypoints = transfer_waypoints(registry, transfers)?;

    let config = farmalog_core::load_app_config()?;
    let maps = MapsClient::from_config(&config)?;

    let destination = match (to, address) {
        (Some(coordinate), _) => coordinate,
        (None, Some(address)) => {
            let suggestion = maps
                .autocomplete(address)
                .await?
                .into_iter()
                .next()
                .with_context(|| format!("no address suggestions for \"{address}\""))?;
            let location = maps
                .place_location(&suggestion.place_id)
                .await?
                .with_context(|| format!("\"{}\" did not resolve", suggestion.description))?;
            println!("Customer: {}", suggestion.description);
            location.coordinate
        }
        (None, None) => anyhow::bail!("either --to or --address is required"),
    };

    let Some(route) = maps
        .directions(origin.coordinate, destination, &waypoints)
        .await?
    else {
        println!("No driving route found");
        return Ok(());
    };

    let summary = summarize(&route.leg_meters, waypoints.len());
    println!("Origin → customer: {}", summary.total_text());
    println!("Origin → last transfer: {}", summary.partial_text());
    Ok(())
}
