//! Client for the cpmtool account service.
//!
//! [`CpmClient`] wraps every remote operation the service exposes: device
//! checks, account login/registration/deletion, and the gameplay-state
//! mutators listed in [`Mutation`].
//!
//! # Request flow
//!
//! Privileged calls go through the device gate first: the service is asked
//! whether this access key may be used from this device. A rejection is
//! handed back to the caller untouched and the operation endpoint is never
//! called. Otherwise the operation is sent with the access key as a query
//! parameter and the auth token in the body.
//!
//! # Results
//!
//! Anything the service answers with comes back as `Ok(..)`, including
//! `ok: false` envelopes. Transport failures, bad statuses and malformed
//! bodies come back as [`ClientError`] after being reported to the
//! service's error sink in a detached task.

mod client;
mod config;
mod credentials;
mod envelope;
mod error;
mod mutation;
mod telemetry;

pub use client::CpmClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use credentials::{AccessKey, AuthToken};
pub use envelope::Envelope;
pub use error::{ClientError, ClientResult, GENERIC_FAILURE_CODE};
pub use mutation::Mutation;
pub use telemetry::{ErrorReport, ErrorReporter, UNKNOWN_DEVICE};

pub use cpmtool_device::{DeviceName, DeviceResolver};
