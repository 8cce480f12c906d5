use axum::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{Location, NewReport, PatientGender, Report};

/// A report row. Location is flattened to two nullable columns; validation
/// and a table constraint guarantee they are set or null together.
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: Uuid,
    pub timestamp_ms: i64,
    pub symptoms: String,
    pub suspected_disease: String,
    pub patient_name: Option<String>,
    pub patient_age: Option<i32>,
    pub patient_gender: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: Option<String>,
    pub is_anonymous: bool,
    pub created_at: OffsetDateTime,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        };
        Report {
            id: row.id,
            timestamp: row.timestamp_ms,
            symptoms: row.symptoms,
            suspected_disease: row.suspected_disease,
            patient_name: row.patient_name,
            patient_age: row.patient_age,
            patient_gender: row.patient_gender.as_deref().and_then(PatientGender::parse),
            location,
            region: row.region,
            is_anonymous: row.is_anonymous,
            created_at: row.created_at,
        }
    }
}

/// Storage seam for reports. Handlers only see this trait; tests swap the
/// Postgres implementation for an in-memory one.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert(&self, report: &NewReport) -> anyhow::Result<ReportRow>;

    /// Filters are conjunctive; the time range is inclusive epoch millis.
    /// Results come back newest-first.
    async fn list(
        &self,
        region: Option<&str>,
        disease: Option<&str>,
        range_ms: Option<(i64, i64)>,
    ) -> anyhow::Result<Vec<ReportRow>>;

    async fn delete_all(&self) -> anyhow::Result<u64>;
}

pub struct PgReportStore {
    db: PgPool,
}

impl PgReportStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn insert(&self, report: &NewReport) -> anyhow::Result<ReportRow> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            INSERT INTO reports (timestamp_ms, symptoms, suspected_disease, patient_name,
                                 patient_age, patient_gender, latitude, longitude, region,
                                 is_anonymous)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, timestamp_ms, symptoms, suspected_disease, patient_name, patient_age,
                      patient_gender, latitude, longitude, region, is_anonymous, created_at
            "#,
        )
        .bind(report.timestamp)
        .bind(&report.symptoms)
        .bind(&report.suspected_disease)
        .bind(&report.patient_name)
        .bind(report.patient_age)
        .bind(report.patient_gender.map(|g| g.as_str()))
        .bind(report.location.map(|l| l.latitude))
        .bind(report.location.map(|l| l.longitude))
        .bind(&report.region)
        .bind(report.is_anonymous)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(
        &self,
        region: Option<&str>,
        disease: Option<&str>,
        range_ms: Option<(i64, i64)>,
    ) -> anyhow::Result<Vec<ReportRow>> {
        let (from_ms, to_ms) = match range_ms {
            Some((from, to)) => (Some(from), Some(to)),
            None => (None, None),
        };
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT id, timestamp_ms, symptoms, suspected_disease, patient_name, patient_age,
                   patient_gender, latitude, longitude, region, is_anonymous, created_at
            FROM reports
            WHERE ($1::text IS NULL OR region = $1)
              AND ($2::text IS NULL OR suspected_disease = $2)
              AND ($3::bigint IS NULL OR timestamp_ms >= $3)
              AND ($4::bigint IS NULL OR timestamp_ms <= $4)
            ORDER BY timestamp_ms DESC
            "#,
        )
        .bind(region)
        .bind(disease)
        .bind(from_ms)
        .bind(to_ms)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM reports").execute(&self.db).await?;
        Ok(result.rows_affected())
    }
}
