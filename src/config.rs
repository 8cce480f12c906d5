use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenAiConfig {
    /// Missing key is a request-time error from the summary endpoint,
    /// not a startup failure.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub genai: GenAiConfig,
    /// UTC offset used when a date filter is expanded to a calendar day.
    /// Defaults to East Africa Time.
    pub day_offset_hours: i8,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "outbreak-watch".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "outbreak-watch-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 12),
        };
        let genai = GenAiConfig {
            api_key: std::env::var("GOOGLE_API_KEY").ok(),
            model: std::env::var("GENAI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into()),
            base_url: std::env::var("GENAI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
        };
        let day_offset_hours = match std::env::var("DAY_OFFSET_HOURS") {
            Ok(raw) => parse_day_offset(&raw)?,
            Err(_) => 3,
        };
        Ok(Self {
            database_url,
            jwt,
            genai,
            day_offset_hours,
        })
    }
}

/// A bad offset fails at startup, not as a 500 on the first date filter.
fn parse_day_offset(raw: &str) -> anyhow::Result<i8> {
    let hours: i8 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("DAY_OFFSET_HOURS must be an integer, got {raw:?}"))?;
    anyhow::ensure!(
        (-23..=23).contains(&hours),
        "DAY_OFFSET_HOURS must be between -23 and 23, got {hours}"
    );
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_offset_accepts_whole_hours() {
        assert_eq!(parse_day_offset("3").unwrap(), 3);
        assert_eq!(parse_day_offset("-23").unwrap(), -23);
        assert_eq!(parse_day_offset(" 0 ").unwrap(), 0);
    }

    #[test]
    fn day_offset_rejects_out_of_range() {
        assert!(parse_day_offset("24").is_err());
        assert!(parse_day_offset("-24").is_err());
    }

    #[test]
    fn day_offset_rejects_non_integers() {
        assert!(parse_day_offset("east-africa").is_err());
        assert!(parse_day_offset("2.5").is_err());
    }
}
