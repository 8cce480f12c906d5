use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date, UtcOffset};
use uuid::Uuid;

use crate::catalog;
use crate::error::{ApiError, FieldErrors};

/// Patient gender vocabulary, matching the report form options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientGender {
    Male,
    Female,
    Other,
    NotSpecified,
}

impl PatientGender {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "other" => Some(Self::Other),
            "not_specified" => Some(Self::NotSpecified),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::NotSpecified => "not_specified",
        }
    }
}

/// A complete GPS fix. Stored and returned only as a full pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Incoming location payload. Either coordinate may be missing; the pair is
/// dropped during normalization when incomplete.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PartialLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Report creation payload as received from the wire. Gender stays a raw
/// string so an unknown value becomes a field error, not a 422.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub suspected_disease: String,
    pub patient_name: Option<String>,
    pub patient_age: Option<i32>,
    pub patient_gender: Option<String>,
    pub location: Option<PartialLocation>,
    pub region: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// A validated, normalized report ready for insertion.
#[derive(Debug)]
pub struct NewReport {
    pub timestamp: i64,
    pub symptoms: String,
    pub suspected_disease: String,
    pub patient_name: Option<String>,
    pub patient_age: Option<i32>,
    pub patient_gender: Option<PatientGender>,
    pub location: Option<Location>,
    pub region: Option<String>,
    pub is_anonymous: bool,
}

impl CreateReport {
    /// Applies the report validation rules and location normalization.
    /// Returns every offending field at once.
    pub fn validate(self) -> Result<NewReport, ApiError> {
        let mut errors = FieldErrors::new();

        let symptoms = self.symptoms.trim().to_string();
        if symptoms.is_empty() {
            errors.push("symptoms", "Symptoms are required");
        }

        let suspected_disease = self.suspected_disease.trim().to_string();
        if suspected_disease.is_empty() {
            errors.push("suspectedDisease", "Suspected disease is required");
        }

        if self.timestamp.is_none() {
            errors.push("timestamp", "Timestamp is required");
        }

        let patient_gender = match self.patient_gender.as_deref() {
            None => None,
            Some(raw) => match PatientGender::parse(raw) {
                Some(g) => Some(g),
                None => {
                    errors.push("patientGender", "Invalid patient gender");
                    None
                }
            },
        };

        // A half-filled pair carries no usable position; store nothing.
        let location = self.location.and_then(|loc| match (loc.latitude, loc.longitude) {
            (Some(latitude), Some(longitude))
                if latitude.is_finite() && longitude.is_finite() =>
            {
                Some(Location {
                    latitude,
                    longitude,
                })
            }
            _ => None,
        });

        let region = self
            .region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if let Some(r) = &region {
            if !catalog::is_known_region(r) {
                errors.push("region", "Unknown region");
            }
        }
        // Anonymous community reports carry a region in lieu of precise GPS.
        if self.is_anonymous && region.is_none() {
            errors.push("region", "Region is required for anonymous reports");
        }

        let patient_name = self
            .patient_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        match (self.timestamp, errors.is_empty()) {
            (Some(timestamp), true) => Ok(NewReport {
                timestamp,
                symptoms,
                suspected_disease,
                patient_name,
                patient_age: self.patient_age,
                patient_gender,
                location,
                region,
                is_anonymous: self.is_anonymous,
            }),
            _ => Err(ApiError::validation("Invalid report data", errors)),
        }
    }
}

/// Report as returned by the API. `location` serializes as `null` when
/// absent, matching the original wire format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub timestamp: i64,
    pub symptoms: String,
    pub suspected_disease: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_gender: Option<PatientGender>,
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub is_anonymous: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

/// Query filters for listing reports. All conjunctive.
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilters {
    pub region: Option<String>,
    pub disease: Option<String>,
    /// Calendar day, `YYYY-MM-DD`.
    pub date: Option<String>,
}

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Expands a calendar day to an inclusive `[start, end]` range in epoch
/// millis at the given UTC offset.
pub fn day_bounds(date_str: &str, offset_hours: i8) -> Result<(i64, i64), ApiError> {
    let date = Date::parse(date_str.trim(), DATE_FORMAT).map_err(|_| {
        ApiError::single_field("Invalid filters", "date", "Date must be formatted as YYYY-MM-DD")
    })?;
    let offset = UtcOffset::from_hms(offset_hours, 0, 0).map_err(|e| ApiError::Internal(e.into()))?;
    let start_ms = date.midnight().assume_offset(offset).unix_timestamp() * 1000;
    let end_ms = start_ms + 24 * 60 * 60 * 1000 - 1;
    Ok((start_ms, end_ms))
}
