//! Client-side HTTP request facade with reference-counted loading state, token injection,
//! normalized errors, and a download helper layered over a shared reqwest transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod classify;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod loading;
pub mod notify;
pub mod obs;
pub mod token;
pub mod transport;

pub use client::{ApiClient, ApiClientBuilder, Method, RequestOptions};
pub use error::{Error, ErrorKind, NormalizedError, Result, TransportFailure};
pub use loading::LoadingSignal;
pub use transport::{Payload, ResponseType};

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{
		Client as ReqwestClient, Error as ReqwestError,
		header::{HeaderMap, HeaderName, HeaderValue},
	};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tempfile as _};
