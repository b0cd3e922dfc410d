//! Mission submission and simulation lifecycle commands.
//!
//! Requests go through a [`ControlTransport`] so the client logic can be
//! exercised without a server. Mission text is validated locally; an empty
//! statement never reaches the transport.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Path accepting mission statements.
pub const MISSION_PATH: &str = "/api/py/mission-input";
/// Path starting the simulation.
pub const START_PATH: &str = "/api/start_simulation";
/// Path stopping the simulation.
pub const STOP_PATH: &str = "/api/stop_simulation";

/// Errors from the control client.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The mission statement was empty or only whitespace.
    #[error("mission statement cannot be empty")]
    EmptyMission,
    /// The request could not be sent or the body could not be read.
    #[error("request to {path} failed: {source}")]
    Http {
        /// Request path.
        path: String,
        /// Underlying client error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{path} answered HTTP {status}")]
    Status {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
    },
    /// The reply did not have the expected shape.
    #[error("unexpected reply from {path}: {detail}")]
    Reply {
        /// Request path.
        path: String,
        /// What was wrong.
        detail: String,
    },
}

/// Validated, non-empty mission text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionStatement(String);

impl MissionStatement {
    /// Accepts `text` unless it is empty or whitespace only.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::EmptyMission`] for blank text.
    ///
    /// # Examples
    ///
    /// ```
    /// use swarm_view::control::MissionStatement;
    ///
    /// assert!(MissionStatement::new("   \n").is_err());
    /// assert!(MissionStatement::new("survey the river").is_ok());
    /// ```
    pub fn new(text: impl Into<String>) -> Result<Self, ControlError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ControlError::EmptyMission);
        }
        Ok(Self(text))
    }

    /// The statement as sent.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Simulation lifecycle command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Start the simulation.
    Start,
    /// Stop the simulation.
    Stop,
}

impl Lifecycle {
    /// Request path for the command.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Start => START_PATH,
            Self::Stop => STOP_PATH,
        }
    }
}

/// Sends a JSON body to a path and returns the decoded JSON reply.
#[cfg_attr(test, mockall::automock)]
pub trait ControlTransport {
    /// Posts `body` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] if the request fails or the reply is not JSON.
    fn post_json(&self, path: &str, body: &Value) -> Result<Value, ControlError>;
}

/// [`ControlTransport`] over blocking HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base: String,
    client: Client,
}

impl HttpTransport {
    /// Targets the server at `base`, e.g. `http://localhost:8000`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Http`] if the client cannot be built.
    pub fn new(base: impl Into<String>) -> Result<Self, ControlError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("swarm_view/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ControlError::Http {
                path: String::new(),
                source,
            })?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_owned(),
            client,
        })
    }
}

impl ControlTransport for HttpTransport {
    fn post_json(&self, path: &str, body: &Value) -> Result<Value, ControlError> {
        let http = |source| ControlError::Http {
            path: path.to_owned(),
            source,
        };
        let response = self
            .client
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ControlError::Status {
                path: path.to_owned(),
                status: status.as_u16(),
            });
        }
        response.json().map_err(http)
    }
}

#[derive(Deserialize)]
struct MissionReply {
    message: String,
}

#[derive(Deserialize)]
struct StatusReply {
    status: String,
}

fn decode<T: for<'de> Deserialize<'de>>(path: &str, reply: Value) -> Result<T, ControlError> {
    serde_json::from_value(reply).map_err(|err| ControlError::Reply {
        path: path.to_owned(),
        detail: err.to_string(),
    })
}

/// Mission and lifecycle client.
#[derive(Debug)]
pub struct ControlClient<T> {
    transport: T,
}

impl<T: ControlTransport> ControlClient<T> {
    /// Wraps a transport.
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Submits a mission and returns the server's message.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] if the request fails or the reply lacks a
    /// `message`.
    pub fn submit_mission(&self, mission: &MissionStatement) -> Result<String, ControlError> {
        let body = json!({ "user_mission_statement": mission.as_str() });
        let reply = self.transport.post_json(MISSION_PATH, &body)?;
        let MissionReply { message } = decode(MISSION_PATH, reply)?;
        log::info!("mission accepted: {message}");
        Ok(message)
    }

    /// Validates `text` and submits it.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::EmptyMission`] without sending anything for
    /// blank text, otherwise as for [`Self::submit_mission`].
    pub fn submit_text(&self, text: &str) -> Result<String, ControlError> {
        self.submit_mission(&MissionStatement::new(text)?)
    }

    /// Sends a lifecycle command and returns the reported status.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] if the request fails or the reply lacks a
    /// `status`.
    pub fn lifecycle(&self, command: Lifecycle) -> Result<String, ControlError> {
        let path = command.path();
        let reply = self.transport.post_json(path, &json!({}))?;
        let StatusReply { status } = decode(path, reply)?;
        log::info!("simulation {command:?}: {status}");
        Ok(status)
    }

    /// Starts the simulation.
    ///
    /// # Errors
    ///
    /// As for [`Self::lifecycle`].
    pub fn start(&self) -> Result<String, ControlError> {
        self.lifecycle(Lifecycle::Start)
    }

    /// Stops the simulation.
    ///
    /// # Errors
    ///
    /// As for [`Self::lifecycle`].
    pub fn stop(&self) -> Result<String, ControlError> {
        self.lifecycle(Lifecycle::Stop)
    }
}
