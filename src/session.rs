//! Tidal OAuth session handling.
//!
//! First run walks the device-authorization flow: the user approves a short
//! code at link.tidal.com, the tool polls the token endpoint until the grant
//! lands.  Tokens are persisted as JSON under `~/.config/tidalbot/` and
//! restored on later runs, renewed through the refresh token when stale.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const DEVICE_AUTH_URL: &str = "https://auth.tidal.com/v1/oauth2/device_authorization";
const TOKEN_URL: &str = "https://auth.tidal.com/v1/oauth2/token";
const DEVICE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const SCOPE: &str = "r_usr w_usr w_sub";

// Public client credentials of the TV/limited-input app class the device
// flow expects; overridable from the config file.
const DEFAULT_CLIENT_ID: &str = "zU4XHVVkc2tDPo4t";
const DEFAULT_CLIENT_SECRET: &str = "VJKhDFqJPqvsPVNBV6ukXTJmwlvbttP7wlMlrc72se4=";

// ── Types ────────────────────────────────────────────────────────────────────

/// OAuth client credentials used for login and refresh.
#[derive(Debug, Clone)]
pub struct OauthClient {
    pub id: String,
    pub secret: String,
}

impl Default for OauthClient {
    fn default() -> Self {
        OauthClient {
            id: DEFAULT_CLIENT_ID.to_string(),
            secret: DEFAULT_CLIENT_SECRET.to_string(),
        }
    }
}

/// Persisted session state: everything the API client needs per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TidalSession {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp after which the access token is stale.
    pub expiry_time: i64,
    pub user_id: u64,
    pub country_code: String,
}

#[derive(Debug, Deserialize)]
struct DeviceAuth {
    #[serde(rename = "deviceCode")]
    device_code: String,
    #[serde(rename = "userCode")]
    user_code: String,
    #[serde(rename = "verificationUriComplete")]
    verification_uri_complete: String,
    #[serde(rename = "expiresIn")]
    expires_in: u64,
    interval: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    token_type: String,
    expires_in: u64,
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    #[serde(rename = "userId")]
    user_id: u64,
    #[serde(rename = "countryCode")]
    country_code: String,
}

// ── Persistence ──────────────────────────────────────────────────────────────

/// `~/.config/tidalbot/session.json`, when HOME is known.
fn session_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config/tidalbot/session.json"))
}

impl TidalSession {
    /// Best-effort restore of a previously saved session.
    pub fn load() -> Option<TidalSession> {
        let content = std::fs::read_to_string(session_path()?).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let path = session_path().ok_or("HOME environment variable not set")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Stale a minute early so an in-flight request never races expiry.
    pub fn is_expired(&self) -> bool {
        unix_now() >= self.expiry_time - 60
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// ── Login / refresh ──────────────────────────────────────────────────────────

/// Restore a saved session, refreshing or re-authenticating as needed.
/// The resulting session is saved back to disk.
pub fn establish_session(client: &OauthClient) -> Result<TidalSession, Box<dyn Error>> {
    if let Some(saved) = TidalSession::load() {
        if !saved.is_expired() {
            println!("Restored Tidal session for user {}", saved.user_id);
            return Ok(saved);
        }
        println!("Session expired, refreshing...");
        match refresh(client, &saved) {
            Ok(fresh) => {
                fresh.save()?;
                return Ok(fresh);
            }
            Err(e) => eprintln!("Refresh failed ({}), starting a new login", e),
        }
    }

    let session = device_login(client)?;
    session.save()?;
    println!("Authentication complete, session saved");
    Ok(session)
}

fn refresh(client: &OauthClient, stale: &TidalSession) -> Result<TidalSession, Box<dyn Error>> {
    let response = ureq::post(TOKEN_URL).send_form(&[
        ("client_id", &client.id),
        ("client_secret", &client.secret),
        ("refresh_token", &stale.refresh_token),
        ("grant_type", "refresh_token"),
        ("scope", SCOPE),
    ])?;
    let token: TokenResponse = serde_json::from_reader(response.into_reader())?;

    Ok(TidalSession {
        token_type: token.token_type,
        access_token: token.access_token,
        // Tidal omits the refresh token from refresh grants; keep the old one.
        refresh_token: token
            .refresh_token
            .unwrap_or_else(|| stale.refresh_token.clone()),
        expiry_time: unix_now() + token.expires_in as i64,
        user_id: token.user.as_ref().map(|u| u.user_id).unwrap_or(stale.user_id),
        country_code: token
            .user
            .map(|u| u.country_code)
            .unwrap_or_else(|| stale.country_code.clone()),
    })
}

/// Interactive device-code login.  Blocks until the user approves the code
/// in a browser or the code expires.
pub fn device_login(client: &OauthClient) -> Result<TidalSession, Box<dyn Error>> {
    let response = ureq::post(DEVICE_AUTH_URL)
        .send_form(&[("client_id", &client.id), ("scope", SCOPE)])?;
    let device: DeviceAuth = serde_json::from_reader(response.into_reader())?;

    println!(
        "Open https://{} and approve this login (code: {})",
        device.verification_uri_complete, device.user_code
    );

    let deadline = Instant::now() + Duration::from_secs(device.expires_in);
    let poll_gap = Duration::from_secs(device.interval.max(1));

    while Instant::now() < deadline {
        thread::sleep(poll_gap);

        let result = ureq::post(TOKEN_URL).send_form(&[
            ("client_id", &client.id),
            ("client_secret", &client.secret),
            ("device_code", &device.device_code),
            ("grant_type", DEVICE_GRANT),
            ("scope", SCOPE),
        ]);

        match result {
            Ok(response) => {
                let token: TokenResponse = serde_json::from_reader(response.into_reader())?;
                let user = token.user.ok_or("token response carried no user info")?;
                return Ok(TidalSession {
                    token_type: token.token_type,
                    access_token: token.access_token,
                    refresh_token: token
                        .refresh_token
                        .ok_or("token response carried no refresh token")?,
                    expiry_time: unix_now() + token.expires_in as i64,
                    user_id: user.user_id,
                    country_code: user.country_code,
                });
            }
            // 400 = authorization_pending: the user hasn't confirmed yet.
            Err(ureq::Error::Status(400, _)) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err("device login timed out before the code was approved".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expiry_time: i64) -> TidalSession {
        TidalSession {
            token_type: "Bearer".to_string(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expiry_time,
            user_id: 12345,
            country_code: "US".to_string(),
        }
    }

    #[test]
    fn test_session_json_round_trip() {
        let original = session(1_900_000_000);
        let json = serde_json::to_string(&original).unwrap();
        let restored: TidalSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.access_token, original.access_token);
        assert_eq!(restored.refresh_token, original.refresh_token);
        assert_eq!(restored.expiry_time, original.expiry_time);
        assert_eq!(restored.user_id, original.user_id);
        assert_eq!(restored.country_code, original.country_code);
    }

    #[test]
    fn test_expiry_includes_safety_margin() {
        assert!(session(0).is_expired());
        assert!(session(unix_now() + 30).is_expired());
        assert!(!session(unix_now() + 3600).is_expired());
    }

    #[test]
    fn test_token_response_parses_device_grant_payload() {
        let json = r#"{
            "access_token": "abc",
            "refresh_token": "def",
            "token_type": "Bearer",
            "expires_in": 604800,
            "user": {"userId": 99, "countryCode": "DE", "username": "someone"}
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "abc");
        let user = token.user.unwrap();
        assert_eq!(user.user_id, 99);
        assert_eq!(user.country_code, "DE");
    }
}
