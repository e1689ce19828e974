// src/sources/calendar.rs
//! TradingEconomics economic-calendar provider. Records with malformed dates
//! are skipped, not fatal to the batch.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDateTime};
use serde::Deserialize;

use super::CalendarProvider;
use crate::calendar::CalendarEvent;
use crate::error::LensError;

const TE_ENDPOINT: &str = "https://api.tradingeconomics.com/calendar";
const TE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Deserialize)]
struct TeRecord {
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "Category", default)]
    category: Option<String>,
}

pub struct TradingEconomicsProvider {
    http: reqwest::Client,
    api_key: String,
    countries: Vec<String>,
    days_ahead: u32,
}

impl TradingEconomicsProvider {
    pub fn new(api_key: impl Into<String>, countries: Vec<String>, days_ahead: u32) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("fx-lens/0.1 (+github.com/lumlich/fx-lens)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: api_key.into(),
            countries,
            days_ahead,
        }
    }

    /// Reads `TRADINGECONOMICS_API_KEY` from the environment.
    pub fn from_env(countries: Vec<String>, days_ahead: u32) -> Result<Self, LensError> {
        let key = std::env::var("TRADINGECONOMICS_API_KEY")
            .map_err(|_| LensError::MissingApiKey("tradingeconomics"))?;
        Ok(Self::new(key, countries, days_ahead))
    }
}

#[async_trait]
impl CalendarProvider for TradingEconomicsProvider {
    async fn fetch_upcoming(&self) -> Result<Vec<CalendarEvent>, LensError> {
        let today = Local::now().date_naive();
        let end = today + Days::new(u64::from(self.days_ahead));

        let resp = self
            .http
            .get(TE_ENDPOINT)
            .query(&[
                ("c", self.api_key.clone()),
                ("country", self.countries.join(",")),
                ("start_date", today.format("%Y-%m-%d").to_string()),
                ("end_date", end.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LensError::Transport(format!(
                "calendar API returned HTTP {}",
                resp.status()
            )));
        }

        let records: Vec<TeRecord> = resp
            .json()
            .await
            .map_err(|e| LensError::MalformedResponse(e.to_string()))?;
        Ok(events_from_records(records))
    }

    fn name(&self) -> &'static str {
        "tradingeconomics"
    }
}

fn events_from_records(records: Vec<TeRecord>) -> Vec<CalendarEvent> {
    let mut events = Vec::with_capacity(records.len());
    for rec in records {
        let Some(raw) = rec.date.as_deref() else {
            continue;
        };
        let Ok(dt) = NaiveDateTime::parse_from_str(raw, TE_DATE_FORMAT) else {
            continue;
        };
        let date = dt.date();
        events.push(CalendarEvent {
            date,
            weekday: date.format("%a").to_string(),
            region: rec.country.unwrap_or_else(|| "Unknown".to_string()),
            event: rec.category.unwrap_or_else(|| "Event".to_string()),
        });
    }
    events
}
