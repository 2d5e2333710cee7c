//! Backend wire types and error taxonomy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors from backend calls.
///
/// Only `Transport` failures are retried; `Application` (HTTP 4xx/5xx) and
/// `Parse` are surfaced immediately. `Parse` is treated like a transport
/// failure by the feed for fallback purposes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("application error: HTTP {status}")]
    Application { status: u16 },
    #[error("malformed response: {0}")]
    Parse(String),
}

/// Body for `POST /auth/login`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

/// Response from `POST /auth/login`
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Response from `GET /api/fx_rates`
#[derive(Debug, Clone, Deserialize)]
pub struct FxRatesSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Rates keyed by pair; ordered map so fan-out order is deterministic
    pub rates: BTreeMap<String, f64>,
}

/// Body for `POST /api/game/score`
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRequest {
    pub username: String,
    pub score: f64,
    pub credits: f64,
    pub stats: StatsPayload,
}

/// Win/loss counters embedded in a score post
#[derive(Debug, Clone, Serialize)]
pub struct StatsPayload {
    pub wins: u32,
    pub losses: u32,
}

/// Response from `POST /api/game/score`
#[derive(Debug, Deserialize)]
pub struct ScoreResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// One row of `GET /api/leaderboard`
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_omits_empty_password() {
        let req = LoginRequest {
            username: "alice",
            password: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"username":"alice"}"#);

        let req = LoginRequest {
            username: "alice",
            password: Some("secret"),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""password":"secret""#));
    }

    #[test]
    fn test_fx_rates_snapshot_parse() {
        let json = r#"{
            "timestamp": "2024-01-15T10:00:00.000Z",
            "rates": {"USD_SGD": 1.3567, "USD_INR": 83.45, "EUR_USD": 1.088}
        }"#;

        let snapshot: FxRatesSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.rates.len(), 3);
        assert_eq!(snapshot.rates["USD_SGD"], 1.3567);
        // BTreeMap iteration is ordered by pair
        let pairs: Vec<&String> = snapshot.rates.keys().collect();
        assert_eq!(pairs, ["EUR_USD", "USD_INR", "USD_SGD"]);
    }

    #[test]
    fn test_fx_rates_snapshot_bad_timestamp() {
        let json = r#"{"timestamp": "not-a-time", "rates": {}}"#;
        assert!(serde_json::from_str::<FxRatesSnapshot>(json).is_err());
    }

    #[test]
    fn test_leaderboard_parse() {
        let json = r#"[
            {"rank": 1, "username": "alice", "score": 12500},
            {"rank": 2, "username": "bob", "score": 11000}
        ]"#;

        let entries: Vec<LeaderboardEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].username, "alice");
        assert_eq!(entries[1].rank, 2);
    }

    #[test]
    fn test_score_request_shape() {
        let req = ScoreRequest {
            username: "alice".to_string(),
            score: 420.0,
            credits: 12345.68,
            stats: StatsPayload { wins: 3, losses: 1 },
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""stats":{"wins":3,"losses":1}"#));
    }
}
