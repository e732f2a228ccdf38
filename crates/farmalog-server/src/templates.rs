//! HTML templates for the planner page.
//!
//! The page is a sidebar form posting to `/session/selection`, the nearby
//! table, the distance summary and a Maps JavaScript widget configured by an
//! embedded JSON document.


use farmalog_core::selection::{MAX_RADIUS_KM, MIN_RADIUS_KM, RADIUS_STEP_KM};
use farmalog_core::{Nearby, Registry, SelectionState, AREAS, OVERLAYS};

use crate::planner::{MapWidget, Plan};

/// Escape HTML special characters for safe rendering.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn base_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Farmalog</title>
    <style>{STYLE}</style>
</head>
<body>
    <header id="main-header"><a href="/" class="logo">Farmalog</a></header>
    {content}
</body>
</html>"#,
        title = html_escape(title),
    )
}

/// Error page for rejected input or a failed Maps call.
pub fn error_page(title: &str, message: &str) -> String {
    let content = format!(
        r#"<main class="error">
        <h1>{}</h1>
        <p>{}</p>
        <p><a href="/">Volver</a></p>
    </main>"#,
        html_escape(title),
        html_escape(message),
    );
    base_template(title, &content)
}

fn select_options<'a, I>(names: I, selected: Option<&str>, placeholder: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = format!(r#"<option value="">{}</option>"#, html_escape(placeholder));
    for name in names {
        let attr = if selected == Some(name) { " selected" } else { "" };
        let escaped = html_escape(name);
        out.push_str(&format!(r#"<option value="{escaped}"{attr}>{escaped}</option>"#));
    }
    out
}

fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}

fn sidebar(registry: &Registry, selection: &SelectionState) -> String {
    let current_area = selection.area.label();
    let mut areas = String::new();
    for area in &AREAS {
        let label = area.label();
        let attr = if label == current_area { " selected" } else { "" };
        let escaped = html_escape(&label);
        areas.push_str(&format!(r#"<option value="{escaped}"{attr}>{escaped}</option>"#));
    }

    let origins = select_options(
        registry.hub_names(),
        selection.origin.as_deref(),
        "Selecciona una base o hub",
    );
    let stops = registry.names_in_area(&selection.area);
    let transfers = select_options(
        stops.iter().copied(),
        selection.transfer.as_deref(),
        "Selecciona un punto de venta",
    );
    let second_transfers = select_options(
        stops.iter().copied(),
        selection.second_transfer.as_deref(),
        "Selecciona un punto de venta",
    );

    let suggestions = if selection.suggestions.is_empty() {
        String::new()
    } else {
        let pending = selection.pending_suggestion().map(|s| s.place_id.as_str());
        let mut options = String::new();
        for s in &selection.suggestions {
            let attr = if pending == Some(s.place_id.as_str()) {
                " selected"
            } else {
                ""
            };
            options.push_str(&format!(
                r#"<option value="{}"{attr}>{}</option>"#,
                html_escape(&s.place_id),
                html_escape(&s.description),
            ));
        }
        format!(
            r#"<label>Sugerencias
            <select name="suggestion">{options}</select></label>"#
        )
    };

    let mut overlays = String::new();
    for overlay in &OVERLAYS {
        let on = selection.overlays.enabled_keys().contains(&overlay.key);
        overlays.push_str(&format!(
            r#"<label class="check"><input type="checkbox" name="{}"{}> {}</label>"#,
            overlay.key,
            checked(on),
            html_escape(overlay.label),
        ));
    }

    format!(
        r#"<aside id="sidebar">
        <form method="post" action="/session/selection">
            <label>Provincia - Cantón
            <select name="area">{areas}</select></label>
            <label>Origen (base o hub)
            <select name="origin">{origins}</select></label>
            <label class="check"><input type="checkbox" name="transfer_enabled"{transfer_on}> Transferencia</label>
            <select name="transfer">{transfers}</select>
            <label class="check"><input type="checkbox" name="second_transfer_enabled"{second_on}> Segunda transferencia</label>
            <select name="second_transfer">{second_transfers}</select>
            <label>Dirección del cliente
            <input type="text" name="address" value="{address}" autocomplete="off"></label>
            {suggestions}
            <label>Radio de búsqueda: <output id="radius-value">{radius:.1}</output> km
            <input type="range" name="radius_km" min="{MIN_RADIUS_KM}" max="{MAX_RADIUS_KM}" step="{RADIUS_STEP_KM}" value="{radius}"
                oninput="document.getElementById('radius-value').value = Number(this.value).toFixed(1)"></label>
            <fieldset><legend>Capas KML</legend>{overlays}</fieldset>
            <button type="submit">Actualizar</button>
        </form>
        <form method="post" action="/session/reset">
            <button type="submit" class="secondary">Reiniciar</button>
        </form>
    </aside>"#,
        transfer_on = checked(selection.transfer_enabled),
        second_on = checked(selection.second_transfer_enabled),
        address = html_escape(&selection.address_query),
        radius = selection.radius_km,
    )
}

fn nearby_section(selection: &SelectionState, nearby: &Nearby<'_>) -> String {
    match nearby {
        Nearby::NotComputed => r#"<p class="hint">Selecciona un origen y la dirección del cliente para ver las farmacias cercanas.</p>"#
            .to_string(),
        Nearby::Empty => r#"<p class="warning">⚠️ No hay farmacias cercanas.</p>"#.to_string(),
        Nearby::Found(rows) => {
            let mut body = String::new();
            for row in rows {
                let p = row.point_of_sale;
                let distance = format!("{:.2}", row.distance_km);
                let cells: [&str; 14] = [
                    p.hub.as_deref().unwrap_or_default(),
                    &p.name,
                    &distance,
                    &p.extension,
                    &p.phone,
                    &p.canton,
                    &p.parish,
                    &p.address,
                    &p.kind,
                    &p.hours.weekdays,
                    &p.hours.saturday,
                    &p.hours.sunday,
                    &p.hours.holidays,
                    &p.status,
                ];
                body.push_str("<tr>");
                for cell in cells {
                    body.push_str(&format!("<td>{}</td>", html_escape(cell)));
                }
                body.push_str("</tr>");
            }
            format!(
                r#"<h2>✅ Farmacias dentro de {radius:.1} km en {canton}, {province}</h2>
        <div class="table-wrap"><table class="nearby">
            <thead><tr>
                <th>Base o Hub</th><th>Nombre Farmacia</th><th>Distancia (km)</th>
                <th>Extensión Farmacia</th><th>Celular Punto de venta</th><th>Cantón</th>
                <th>Parroquia</th><th>Dirección Farmacia</th><th>Tipo Farmacia</th>
                <th>Horario Apertura-Cierre Lunes-Viernes</th><th>Horario Apertura-Cierre Sábado</th>
                <th>Horario Apertura-Cierre Domingo</th><th>Horario Apertura-Cierre Festivos</th>
                <th>Estado Farmacia</th>
            </tr></thead>
            <tbody>{body}</tbody>
        </table></div>"#,
                radius = selection.radius_km,
                canton = html_escape(selection.area.canton),
                province = html_escape(selection.area.province),
            )
        }
    }
}

fn summary_section(plan: &Plan<'_>) -> String {
    plan.route.map_or_else(String::new, |route| {
        format!(
            r#"<div class="summary">
            <strong>Distancia origen → cliente:</strong> {}&nbsp;&nbsp;
            <strong>Origen → último PDV transf.:</strong> {}
        </div>"#,
            route.total_text(),
            route.partial_text(),
        )
    })
}

/// JSON for a `<script type="application/json">` block. `</` is escaped so
/// the document cannot close the element early.
fn embed_json(map: &MapWidget) -> String {
    serde_json::to_string(map)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize map widget");
            "null".to_string()
        })
        .replace("</", "<\\/")
}

fn map_section(map: &MapWidget, browser_key: &str) -> String {
    format!(
        r#"<div id="map"></div>
    <script id="map-config" type="application/json">{config}</script>
    <script>{MAP_SCRIPT}</script>
    <script async defer src="https://maps.googleapis.com/maps/api/js?key={key}&amp;libraries=geometry,places&amp;callback=initMap"></script>"#,
        config = embed_json(map),
        key = html_escape(browser_key),
    )
}

/// The planner page for one session.
pub fn index_page(
    registry: &Registry,
    selection: &SelectionState,
    plan: &Plan<'_>,
    browser_key: &str,
) -> String {
    let content = format!(
        r#"<div id="layout">
    {sidebar}
    <main>
        {nearby}
        {summary}
        {map}
    </main>
    </div>"#,
        sidebar = sidebar(registry, selection),
        nearby = nearby_section(selection, &plan.nearby),
        summary = summary_section(plan),
        map = map_section(&plan.map, browser_key),
    );
    base_template("Planificador de entregas", &content)
}

const STYLE: &str = r"
body { margin: 0; font-family: system-ui, sans-serif; color: #222; }
#main-header { padding: 0.6rem 1rem; background: #0b5; }
#main-header .logo { color: #fff; font-weight: bold; text-decoration: none; }
#layout { display: flex; }
#sidebar { width: 300px; padding: 1rem; background: #f4f6f8; }
#sidebar label { display: block; margin: 0.6rem 0 0.2rem; }
#sidebar label.check { display: flex; gap: 0.4rem; align-items: center; }
#sidebar select, #sidebar input[type=text], #sidebar input[type=range] { width: 100%; }
#sidebar button { margin-top: 0.8rem; width: 100%; }
main { flex: 1; padding: 1rem; min-width: 0; }
.table-wrap { max-height: 220px; overflow: auto; }
table.nearby { border-collapse: collapse; font-size: 0.85rem; }
table.nearby th, table.nearby td { border: 1px solid #ddd; padding: 0.2rem 0.4rem; white-space: nowrap; }
.summary { font-size: 150%; margin: 0.8rem 0; }
.warning { color: #a60; }
.hint { color: #666; }
#map { height: 650px; width: 100%; }
";

const MAP_SCRIPT: &str = r"
function initMap() {
  const cfg = JSON.parse(document.getElementById('map-config').textContent);
  const map = new google.maps.Map(document.getElementById('map'), {
    center: cfg.center,
    zoom: cfg.zoom,
  });
  const icon = (color, size) => ({
    url: 'https://maps.google.com/mapfiles/ms/icons/' + color + '-dot.png',
    scaledSize: new google.maps.Size(size, size),
  });

  cfg.hubs.forEach((hub) => new google.maps.Marker({
    position: hub.position, map, clickable: false, title: hub.name, icon: icon('blue', 32),
  }));
  if (cfg.origin) {
    new google.maps.Marker({
      position: cfg.origin.position, map, clickable: false, title: cfg.origin.name, icon: icon('red', 64),
    });
  }
  if (cfg.polyline) {
    new google.maps.Polyline({
      path: google.maps.geometry.encoding.decodePath(cfg.polyline),
      geodesic: true, strokeColor: '#F00', strokeWeight: 4, map,
    });
  }
  if (cfg.bounds) {
    const bounds = new google.maps.LatLngBounds();
    cfg.bounds.forEach((p) => bounds.extend(p));
    map.fitBounds(bounds);
  }
  if (cfg.customer) {
    const marker = new google.maps.Marker({
      position: cfg.customer, map, draggable: true, icon: icon('green', 64),
    });
    const geocoder = new google.maps.Geocoder();
    marker.addListener('dragend', () => {
      const pos = marker.getPosition();
      const send = (address) => fetch('/session/destination', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        credentials: 'same-origin',
        body: JSON.stringify({ lat: pos.lat(), lng: pos.lng(), address }),
      }).then(() => window.location.reload());
      geocoder.geocode({ location: pos }, (results, status) => {
        send(status === 'OK' && results[0] ? results[0].formatted_address : null);
      });
    });
  }
  cfg.kml_layers.forEach((url) => new google.maps.KmlLayer({ url, map, preserveViewport: true }));
}
";
