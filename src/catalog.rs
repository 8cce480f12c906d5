//! Fixed vocabularies: administrative regions, common diseases, and the
//! approximate map center for each region (used for pins when a report
//! carries no GPS fix).

use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

pub const REGIONS: [&str; 14] = [
    "Addis Ababa",
    "Afar",
    "Amhara",
    "Benishangul-Gumuz",
    "Dire Dawa",
    "Gambela",
    "Harari",
    "Oromia",
    "Sidama",
    "Somali",
    "South Ethiopia",
    "South West Ethiopia Peoples'",
    "Tigray",
    "Central Ethiopia",
];

pub const DISEASES: [&str; 10] = [
    "Malaria",
    "Cholera",
    "Pneumonia",
    "Measles",
    "Typhoid Fever",
    "Dysentery",
    "Tuberculosis",
    "COVID-19",
    "Influenza",
    "Other",
];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RegionCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

pub fn is_known_region(region: &str) -> bool {
    REGIONS.contains(&region)
}

pub fn region_coordinate(region: &str) -> Option<RegionCoordinate> {
    let (latitude, longitude, zoom) = match region {
        "Addis Ababa" => (9.02497, 38.74689, 10),
        "Afar" => (11.8000, 41.0000, 7),
        "Amhara" => (11.5986, 37.9603, 7),
        "Benishangul-Gumuz" => (10.7675, 35.5830, 7),
        "Dire Dawa" => (9.5931, 41.8661, 10),
        "Gambela" => (8.2500, 34.5833, 8),
        "Harari" => (9.3100, 42.1200, 10),
        "Oromia" => (7.5460, 39.6319, 6),
        "Sidama" => (6.8600, 38.3000, 8),
        "Somali" => (6.5428, 44.0737, 6),
        "South Ethiopia" => (6.0000, 37.0000, 7),
        "South West Ethiopia Peoples'" => (7.0000, 36.0000, 7),
        "Tigray" => (13.5000, 39.4999, 7),
        "Central Ethiopia" => (7.8000, 38.5000, 7),
        _ => return None,
    };
    Some(RegionCoordinate {
        latitude,
        longitude,
        zoom,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/meta", get(meta))
}

#[derive(Debug, Serialize)]
struct RegionMeta {
    name: &'static str,
    latitude: f64,
    longitude: f64,
    zoom: u8,
}

/// Serves the dropdown vocabularies and region pin coordinates.
async fn meta() -> Json<Value> {
    let regions: Vec<RegionMeta> = REGIONS
        .iter()
        .filter_map(|name| {
            region_coordinate(name).map(|c| RegionMeta {
                name,
                latitude: c.latitude,
                longitude: c.longitude,
                zoom: c.zoom,
            })
        })
        .collect();
    Json(json!({ "regions": regions, "diseases": DISEASES }))
}
