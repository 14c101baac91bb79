//! The session client.

use crate::config::ClientConfig;
use crate::credentials::{AccessKey, AuthToken};
use crate::envelope::Envelope;
use crate::error::{ClientError, ClientResult};
use crate::mutation::Mutation;
use crate::telemetry::ErrorReporter;
use cpmtool_device::{DeviceCache, DeviceName, DeviceResolver, HostPlatform};
use reqwest::{Client, Method};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

const CHECK_DEVICE: &str = "check_device";
const GET_KEY_DATA: &str = "get_key_data";
const ACCOUNT_LOGIN: &str = "account_login";
const ACCOUNT_REGISTER: &str = "account_register";
const ACCOUNT_DELETE: &str = "account_delete";
const GET_DATA: &str = "get_data";

/// Body field carrying the auth token.
const AUTH_FIELD: &str = "account_auth";

/// Client for the account service.
///
/// Starts unauthenticated; a successful [`login`](Self::login) or
/// [`register`](Self::register) stores the auth token used by every
/// privileged call afterwards. There is no logout: the token lives as long
/// as the client.
///
/// Failures are reported to the service in the background. Call
/// [`flush_reports`](Self::flush_reports) before the runtime shuts down so
/// those reports are not cancelled mid-flight. Dropping the client abandons
/// any report still in flight.
pub struct CpmClient {
    config: ClientConfig,
    http: Client,
    access_key: AccessKey,
    resolver: DeviceResolver,
    reporter: ErrorReporter,
    auth: RwLock<Option<AuthToken>>,
    pending_reports: Mutex<JoinSet<()>>,
}

impl CpmClient {
    /// Creates a client that resolves the device name from the host,
    /// prompting on standard input as a last resort.
    pub fn new(access_key: impl Into<AccessKey>, config: ClientConfig) -> ClientResult<Self> {
        let resolver = DeviceResolver::new(DeviceCache::new(&config.device_cache_path))
            .with_platform(Arc::new(HostPlatform::new(config.probe_timeout())));
        Self::with_resolver(access_key, config, resolver)
    }

    /// Creates a client with a caller-supplied device resolver.
    pub fn with_resolver(
        access_key: impl Into<AccessKey>,
        config: ClientConfig,
        resolver: DeviceResolver,
    ) -> ClientResult<Self> {
        config.validate()?;
        let access_key = access_key.into();

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let reporter = ErrorReporter::new(
            config.endpoint_url("errors"),
            access_key.clone(),
            config.telemetry_timeout(),
            config.report_errors,
        )?;

        Ok(Self {
            config,
            http,
            access_key,
            resolver,
            reporter,
            auth: RwLock::new(None),
            pending_reports: Mutex::new(JoinSet::new()),
        })
    }

    #[must_use]
    pub fn access_key(&self) -> &AccessKey {
        &self.access_key
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &DeviceResolver {
        &self.resolver
    }

    /// Whether a login or registration has succeeded.
    pub async fn is_authenticated(&self) -> bool {
        self.auth.read().await.is_some()
    }

    /// Resolves this machine's device name.
    pub async fn device_name(&self) -> ClientResult<DeviceName> {
        Ok(self.resolver.resolve().await?)
    }

    /// Waits for outstanding error reports, giving up after the configured
    /// telemetry timeout.
    pub async fn flush_reports(&self) {
        let mut pending = std::mem::take(
            &mut *self
                .pending_reports
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if pending.is_empty() {
            return;
        }

        let drain = async {
            while pending.join_next().await.is_some() {}
        };
        let finished = tokio::time::timeout(self.config.telemetry_timeout(), drain)
            .await
            .is_ok();
        if !finished {
            debug!("Abandoning {} undelivered error report(s)", pending.len());
        }
    }

    // ── Unprivileged endpoints ───────────────────────────────────

    /// Asks the service whether this key may be used from this device.
    pub async fn check_device(&self) -> ClientResult<Envelope> {
        let device = self.resolve_device(CHECK_DEVICE, &Method::GET).await?;
        self.exchange(
            Method::GET,
            CHECK_DEVICE,
            &[
                ("key", self.access_key.as_str()),
                ("device_name", device.as_str()),
            ],
            None,
        )
        .await
    }

    /// Fetches metadata about the access key.
    pub async fn get_key_data(&self) -> ClientResult<Envelope> {
        let device = self.resolve_device(GET_KEY_DATA, &Method::GET).await?;
        self.exchange(
            Method::GET,
            GET_KEY_DATA,
            &[
                ("key", self.access_key.as_str()),
                ("device_name", device.as_str()),
            ],
            None,
        )
        .await
    }

    // ── Session ──────────────────────────────────────────────────

    /// Logs into an existing account.
    ///
    /// Returns the service's status code (`0` on success). On success the
    /// returned auth token is kept for later calls.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<i64> {
        let device = self.resolve_device(ACCOUNT_LOGIN, &Method::POST).await?;
        let payload = json!({
            "account_email": email,
            "account_password": password,
            "device_name": device.as_str(),
        });

        let envelope = self.request(ACCOUNT_LOGIN, &payload).await?;
        self.accept_auth(&envelope).await;
        Ok(envelope.status_code())
    }

    /// Creates an account. Same contract as [`login`](Self::login).
    pub async fn register(&self, email: &str, password: &str) -> ClientResult<i64> {
        let payload = json!({
            "account_email": email,
            "account_password": password,
        });

        let envelope = self.request(ACCOUNT_REGISTER, &payload).await?;
        self.accept_auth(&envelope).await;
        Ok(envelope.status_code())
    }

    /// Deletes the logged-in account.
    pub async fn delete(&self) -> ClientResult<bool> {
        let payload = self.auth_payload().await?;
        let envelope = self.request(ACCOUNT_DELETE, &Value::Object(payload)).await?;
        Ok(envelope.is_ok())
    }

    /// Fetches the logged-in player's data.
    pub async fn get_player_data(&self) -> ClientResult<Envelope> {
        let payload = self.auth_payload().await?;
        self.request(GET_DATA, &Value::Object(payload)).await
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Applies `mutation` to the logged-in account.
    ///
    /// `Ok(false)` means the service (or the device gate) declined.
    pub async fn apply(&self, mutation: Mutation) -> ClientResult<bool> {
        let mut payload = self.auth_payload().await?;
        payload.extend(mutation.arguments());
        let envelope = self
            .request(mutation.endpoint(), &Value::Object(payload))
            .await?;
        Ok(envelope.is_ok())
    }

    /// Sets the top rank.
    pub async fn set_player_rank(&self) -> ClientResult<bool> {
        self.apply(Mutation::SetRank).await
    }

    /// Unlocks tire smoke.
    pub async fn unlock_smoke(&self) -> ClientResult<bool> {
        self.apply(Mutation::UnlockSmoke).await
    }

    /// Unlocks the W16 engine.
    pub async fn unlock_w16(&self) -> ClientResult<bool> {
        self.apply(Mutation::UnlockW16).await
    }

    /// Sets the race loss count to `amount`.
    pub async fn set_player_loses(&self, amount: i64) -> ClientResult<bool> {
        self.apply(Mutation::SetRaceLoses(amount)).await
    }

    /// Sets the race win count to `amount`.
    pub async fn set_player_wins(&self, amount: i64) -> ClientResult<bool> {
        self.apply(Mutation::SetRaceWins(amount)).await
    }

    /// Unlocks all male clothing.
    pub async fn unlock_equipments_male(&self) -> ClientResult<bool> {
        self.apply(Mutation::UnlockClothesMale).await
    }

    /// Unlocks all female clothing.
    pub async fn unlock_equipments_female(&self) -> ClientResult<bool> {
        self.apply(Mutation::UnlockClothesFemale).await
    }

    /// Unlocks every house.
    pub async fn unlock_houses(&self) -> ClientResult<bool> {
        self.apply(Mutation::UnlockHouses).await
    }

    /// Unlocks every animation.
    pub async fn unlock_animations(&self) -> ClientResult<bool> {
        self.apply(Mutation::UnlockAnimations).await
    }

    /// Renames the player.
    pub async fn set_player_name(&self, name: &str) -> ClientResult<bool> {
        self.apply(Mutation::SetName(name.to_string())).await
    }

    /// Changes the player's local ID.
    pub async fn set_player_localid(&self, id: &str) -> ClientResult<bool> {
        self.apply(Mutation::SetId(id.to_string())).await
    }

    /// Sets the money balance to `amount`.
    pub async fn set_player_money(&self, amount: i64) -> ClientResult<bool> {
        self.apply(Mutation::SetMoney(amount)).await
    }

    /// Sets the coin balance to `amount`.
    pub async fn set_player_coins(&self, amount: i64) -> ClientResult<bool> {
        self.apply(Mutation::SetCoins(amount)).await
    }

    /// Unlocks every horn.
    pub async fn unlock_horns(&self) -> ClientResult<bool> {
        self.apply(Mutation::UnlockHorns).await
    }

    /// Unlocks every wheel.
    pub async fn unlock_wheels(&self) -> ClientResult<bool> {
        self.apply(Mutation::UnlockWheels).await
    }

    /// Turns off engine damage.
    pub async fn disable_engine_damage(&self) -> ClientResult<bool> {
        self.apply(Mutation::DisableEngineDamage).await
    }

    /// Grants unlimited fuel.
    pub async fn unlimited_fuel(&self) -> ClientResult<bool> {
        self.apply(Mutation::UnlimitedFuel).await
    }

    // ── Plumbing ─────────────────────────────────────────────────

    /// Runs the device gate, then POSTs `payload` to `endpoint`.
    ///
    /// A gate rejection is returned as-is and `endpoint` is not called.
    async fn request(&self, endpoint: &str, payload: &Value) -> ClientResult<Envelope> {
        let gate = self.check_device().await?;
        if !gate.is_ok() {
            debug!("Device gate rejected {}: {:?}", endpoint, gate.error);
            return Ok(gate);
        }

        self.exchange(
            Method::POST,
            endpoint,
            &[("key", self.access_key.as_str())],
            Some(payload),
        )
        .await
    }

    /// Sends one request and decodes the envelope, reporting any failure.
    async fn exchange(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> ClientResult<Envelope> {
        debug!("{} {}", method, endpoint);
        let result = self.send(method.clone(), endpoint, query, body).await;
        if let Err(e) = &result {
            self.report(e, endpoint, &method);
        }
        result
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> ClientResult<Envelope> {
        let mut request = self
            .http
            .request(method, self.config.endpoint_url(endpoint))
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(reqwest::Error::without_url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(reqwest::Error::without_url)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn resolve_device(&self, endpoint: &str, method: &Method) -> ClientResult<DeviceName> {
        match self.resolver.resolve().await {
            Ok(name) => Ok(name),
            Err(e) => {
                let err = ClientError::from(e);
                self.report(&err, endpoint, method);
                Err(err)
            }
        }
    }

    async fn auth_payload(&self) -> ClientResult<Map<String, Value>> {
        let guard = self.auth.read().await;
        let token = guard.as_ref().ok_or(ClientError::AuthRequired)?;

        let mut payload = Map::new();
        payload.insert(AUTH_FIELD.to_string(), json!(token.as_str()));
        Ok(payload)
    }

    async fn accept_auth(&self, envelope: &Envelope) {
        if !envelope.is_ok() {
            return;
        }
        match envelope.field("auth").and_then(Value::as_str) {
            Some(token) => {
                *self.auth.write().await = Some(AuthToken::new(token));
                info!("Session authenticated");
            }
            None => warn!("Successful login response carried no auth token"),
        }
    }

    fn report(&self, error: &ClientError, endpoint: &str, method: &Method) {
        warn!("{} {} failed: {}", method, endpoint, error);
        let Some(delivery) = self.reporter.delivery(
            error.to_string(),
            endpoint,
            method.as_str(),
            self.resolver.cached().map(DeviceName::as_str),
        ) else {
            return;
        };

        let mut pending = self
            .pending_reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while pending.try_join_next().is_some() {}
        pending.spawn(delivery);
    }
}

impl std::fmt::Debug for CpmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpmClient")
            .field("base_url", &self.config.base_url)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
