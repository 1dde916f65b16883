//! Session-authenticated access to the vendor cloud.
//!
//! [`DeviceApi`] is the transport seam: one request per method, no session
//! handling. [`Gateway`] owns the session, logs in when needed, renews it once
//! when the cloud reports it expired and bounds every request by the
//! configured timeout.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PlatformConfig;
use crate::device::DeviceAttributes;
use crate::errors::Error;
use crate::runtime::{self, Instant, Mutex};
use crate::types::ByteRgb;

type Result<T> = std::result::Result<T, Error>;

/// Response codes the vendor cloud treats as success.
const SUCCESS_CODES: &[i32] = &[0, 200];
/// Response code signalling that the session is no longer valid.
const SESSION_EXPIRED_CODE: i32 = 100;

pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Map a vendor response code to a result.
///
/// # Examples
///
/// ```
/// use sengled_lights_rs::{Error, check_response};
///
/// assert!(check_response("deviceSetOnOff", 0).is_ok());
/// assert!(matches!(check_response("deviceSetOnOff", 100), Err(Error::SessionExpired)));
/// assert!(matches!(
///     check_response("deviceSetOnOff", 3),
///     Err(Error::RemoteWrite { code: 3, .. })
/// ));
/// ```
pub fn check_response(action: &str, code: i32) -> Result<()> {
    match code {
        c if SUCCESS_CODES.contains(&c) => Ok(()),
        SESSION_EXPIRED_CODE => Err(Error::SessionExpired),
        c => Err(Error::remote_write(action, c)),
    }
}

/// Login credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Identifies this process to the vendor cloud.
    pub client_id: Uuid,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
            client_id: Uuid::new_v4(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// An authenticated session with an explicit expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    token: String,
    issued_at: Instant,
    lifetime: Duration,
}

impl Session {
    /// A session issued now, valid for [`DEFAULT_SESSION_LIFETIME`].
    pub fn new(token: &str) -> Self {
        Session {
            token: token.to_string(),
            issued_at: Instant::now(),
            lifetime: DEFAULT_SESSION_LIFETIME,
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn is_expired(&self) -> bool {
        self.issued_at.elapsed() >= self.lifetime
    }
}

/// Requests understood by the vendor cloud.
///
/// Implementations perform exactly one request per call. Failures are
/// reported as [`Error::Auth`], [`Error::SessionExpired`],
/// [`Error::RemoteWrite`] or [`Error::Transport`]; [`check_response`] maps
/// vendor response codes.
pub trait DeviceApi: Send + Sync {
    fn login(&self, credentials: &Credentials) -> impl Future<Output = Result<Session>> + Send;

    fn get_devices(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<DeviceAttributes>>> + Send;

    fn set_on_off(
        &self,
        session: &Session,
        id: &str,
        on: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// `brightness` is in the vendor encoding, `0..=255`.
    fn set_brightness(
        &self,
        session: &Session,
        id: &str,
        brightness: u8,
    ) -> impl Future<Output = Result<()>> + Send;

    /// `temperature` is in the vendor encoding, `0..=100`.
    fn set_color_temperature(
        &self,
        session: &Session,
        id: &str,
        temperature: u8,
    ) -> impl Future<Output = Result<()>> + Send;

    fn set_rgb_color(
        &self,
        session: &Session,
        id: &str,
        rgb: ByteRgb,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Owns the session shared by every request of a platform.
pub struct Gateway<A> {
    api: A,
    credentials: Credentials,
    session: Mutex<Option<Session>>,
    request_timeout: Duration,
    session_lifetime: Duration,
}

impl<A: DeviceApi> Gateway<A> {
    pub fn new(api: A, config: &PlatformConfig) -> Self {
        Gateway {
            api,
            credentials: Credentials::new(&config.username, &config.password),
            session: Mutex::new(None),
            request_timeout: config.request_timeout,
            session_lifetime: config.session_lifetime,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The current session, logging in first when there is none or it has
    /// expired.
    pub async fn login(&self) -> Result<Session> {
        let mut session = self.session.lock().await;
        if let Some(current) = session.as_ref().filter(|s| !s.is_expired()) {
            return Ok(current.clone());
        }

        debug!("Logging in as {}", self.credentials.username);
        let fresh = self
            .bounded("login", self.api.login(&self.credentials))
            .await?
            .with_lifetime(self.session_lifetime);
        *session = Some(fresh.clone());
        Ok(fresh)
    }

    /// Forget `expired` if it is still the cached session. The next request
    /// logs in again.
    ///
    /// A session some other caller already renewed is kept.
    pub async fn invalidate(&self, expired: &Session) {
        let mut session = self.session.lock().await;
        if session.as_ref().is_some_and(|s| s.token == expired.token) {
            *session = None;
        }
    }

    pub async fn get_devices(&self) -> Result<Vec<DeviceAttributes>> {
        self.call("getDevices", |session| async move {
            self.api.get_devices(&session).await
        })
        .await
    }

    pub async fn set_on_off(&self, id: &str, on: bool) -> Result<()> {
        debug!("Sending {id} power {on}");
        self.call("deviceSetOnOff", |session| async move {
            self.api.set_on_off(&session, id, on).await
        })
        .await
    }

    pub async fn set_brightness(&self, id: &str, brightness: u8) -> Result<()> {
        debug!("Sending {id} brightness {brightness}");
        self.call("deviceSetBrightness", |session| async move {
            self.api.set_brightness(&session, id, brightness).await
        })
        .await
    }

    pub async fn set_color_temperature(&self, id: &str, temperature: u8) -> Result<()> {
        debug!("Sending {id} color temperature {temperature}");
        self.call("deviceSetColorTemperature", |session| async move {
            self.api.set_color_temperature(&session, id, temperature).await
        })
        .await
    }

    pub async fn set_rgb_color(&self, id: &str, rgb: ByteRgb) -> Result<()> {
        debug!(
            "Sending {id} rgb color r: {} g: {} b: {}",
            rgb.red(),
            rgb.green(),
            rgb.blue()
        );
        self.call("deviceSetRgbColor", |session| async move {
            self.api.set_rgb_color(&session, id, rgb).await
        })
        .await
    }

    /// Run a request with a valid session, renewing it once on expiry.
    async fn call<T, F, Fut>(&self, action: &str, request: F) -> Result<T>
    where
        F: Fn(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = self.login().await?;
        match self.bounded(action, request(session.clone())).await {
            Err(Error::SessionExpired) => {
                warn!("Session expired during {action}, logging in again");
                self.invalidate(&session).await;
                let session = self.login().await?;
                self.bounded(action, request(session)).await
            }
            result => result,
        }
    }

    async fn bounded<T>(
        &self,
        action: &str,
        request: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        runtime::timeout(self.request_timeout, request)
            .await
            .map_err(|_| Error::timeout(action))?
    }
}
