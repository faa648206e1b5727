// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 and Calendar API client.
//!
//! Handles:
//! - Building the consent-screen authorization URL
//! - Authorization code exchange and token refresh
//! - Listing upcoming calendar events

use crate::config::Config;
use crate::error::AppError;
use crate::models::CalendarEvent;
use crate::time_utils::format_utc_rfc3339;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Token endpoint response (code exchange or refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    /// Only present on first consent (or when Google rotates it).
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN_SECS
}

/// Raw event list page from the Calendar API.
#[derive(Debug, Default, Deserialize)]
pub struct GoogleEventList {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub start: Option<GoogleEventTime>,
    pub end: Option<GoogleEventTime>,
}

/// Either a timed (`dateTime`) or all-day (`date`) boundary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleEventTime {
    #[serde(rename = "dateTime")]
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl GoogleEventTime {
    /// Parse into UTC; the flag is true for all-day dates.
    fn resolve(&self) -> Option<(DateTime<Utc>, bool)> {
        if let Some(raw) = self.date_time.as_deref().filter(|s| !s.is_empty()) {
            return DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| (dt.with_timezone(&Utc), false));
        }
        let raw = self.date.as_deref().filter(|s| !s.is_empty())?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| (naive.and_utc(), true))
    }
}

/// Convert raw Calendar API items into display events.
///
/// Items whose start or end cannot be resolved are skipped. Generated IDs
/// count only the events kept so far.
pub fn normalize_events(items: Vec<GoogleEvent>) -> Vec<CalendarEvent> {
    let mut events = Vec::with_capacity(items.len());

    for item in items {
        let (Some((start, all_day)), Some((end, _))) = (
            item.start.as_ref().and_then(GoogleEventTime::resolve),
            item.end.as_ref().and_then(GoogleEventTime::resolve),
        ) else {
            continue;
        };

        let id = item
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("gcal_{}", events.len()));

        events.push(CalendarEvent {
            id,
            summary: item
                .summary
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Google Calendar event".to_string()),
            start,
            end,
            all_day,
            location: item
                .location
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Google Calendar".to_string()),
        });
    }

    events
}

/// Google API client.
#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    auth_url: String,
    token_url: String,
    api_base: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    scopes: Vec<String>,
}

impl GoogleClient {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building Google HTTP client")?;

        Ok(Self {
            http,
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            api_base: config.google_api_base.clone(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
            scopes: config.google_scopes.clone(),
        })
    }

    /// Client ID, redirect URI, and secret are all set.
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.redirect_uri.is_some()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    fn credentials(&self) -> Result<(&str, &str, &str), AppError> {
        match (&self.client_id, &self.client_secret, &self.redirect_uri) {
            (Some(id), Some(secret), Some(redirect)) => {
                Ok((id.as_str(), secret.as_str(), redirect.as_str()))
            }
            _ => Err(AppError::ServiceUnavailable(
                "Google OAuth is not configured".to_string(),
            )),
        }
    }

    /// Consent-screen URL requesting offline access.
    pub fn authorization_url(&self, state: &str) -> Result<String, AppError> {
        let (client_id, _, redirect_uri) = self.credentials()?;
        let scope = self.scopes.join(" ");

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}\
             &access_type=offline&include_granted_scopes=true&prompt=consent&state={}",
            self.auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(state),
        ))
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokenResponse, AppError> {
        let (client_id, client_secret, redirect_uri) = self.credentials()?;

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Token exchange request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleTokenResponse, AppError> {
        let (client_id, client_secret, _) = self.credentials()?;

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Token refresh request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// List upcoming single events starting from `time_min`, in start order.
    pub async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        max_results: u32,
        time_min: DateTime<Utc>,
    ) -> Result<GoogleEventList, AppError> {
        let url = format!(
            "{}/calendar/v3/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("maxResults", max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("timeMin", format_utc_rfc3339(time_min)),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Calendar request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::GoogleTokenRejected);
            }

            tracing::warn!(status = %status, body = %body, "Google API request failed");
            return Err(AppError::GoogleApi(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GoogleApi(format!("JSON parse error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(raw: &str) -> Option<GoogleEventTime> {
        Some(GoogleEventTime {
            date_time: Some(raw.to_string()),
            date: None,
        })
    }

    fn all_day(raw: &str) -> Option<GoogleEventTime> {
        Some(GoogleEventTime {
            date_time: None,
            date: Some(raw.to_string()),
        })
    }

    #[test]
    fn normalize_applies_defaults_and_skips_incomplete() {
        let items = vec![
            GoogleEvent {
                id: Some("evt-1".to_string()),
                summary: Some("Standup".to_string()),
                location: Some("Room 4".to_string()),
                start: timed("2026-05-01T09:00:00-07:00"),
                end: timed("2026-05-01T09:15:00-07:00"),
            },
            GoogleEvent {
                start: timed("2026-05-02T09:00:00Z"),
                end: None,
                ..Default::default()
            },
            GoogleEvent {
                start: all_day("2026-05-03"),
                end: all_day("2026-05-04"),
                ..Default::default()
            },
        ];

        let events = normalize_events(items);
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].id, "evt-1");
        assert_eq!(
            events[0].start,
            DateTime::parse_from_rfc3339("2026-05-01T16:00:00Z").unwrap()
        );
        assert!(!events[0].all_day);

        assert_eq!(events[1].id, "gcal_1");
        assert_eq!(events[1].summary, "Google Calendar event");
        assert_eq!(events[1].location, "Google Calendar");
        assert!(events[1].all_day);
    }

    #[test]
    fn unparseable_times_are_dropped() {
        let items = vec![GoogleEvent {
            start: timed("yesterday"),
            end: timed("2026-05-01T10:00:00Z"),
            ..Default::default()
        }];
        assert!(normalize_events(items).is_empty());
    }

    #[test]
    fn token_response_defaults() {
        let parsed: GoogleTokenResponse =
            serde_json::from_str(r#"{"access_token": "a", "refreshToken": "r"}"#).unwrap();
        assert_eq!(parsed.expires_in, 3600);
        assert_eq!(parsed.refresh_token.as_deref(), Some("r"));
        assert!(parsed.id_token.is_none());
    }

    #[test]
    fn authorization_url_contains_offline_consent_params() {
        let client = GoogleClient::from_config(&Config::test_default()).unwrap();
        let url = client.authorization_url("st@te").unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("include_granted_scopes=true"));
        assert!(url.contains("state=st%40te"));
        assert!(url.contains("scope=openid%20email%20"));
    }

    #[test]
    fn unconfigured_client_is_unavailable() {
        let mut config = Config::test_default();
        config.google_client_secret = None;
        let client = GoogleClient::from_config(&config).unwrap();

        assert!(!client.is_configured());
        assert!(matches!(
            client.authorization_url("s"),
            Err(AppError::ServiceUnavailable(_))
        ));
    }
}
