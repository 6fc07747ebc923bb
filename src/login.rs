//! Login flow.
//!
//! Opens a socket, sends a single delimited login request on connect, and
//! resolves when the server acknowledges it. The acknowledgment is explicit:
//! the flow waits for the `lres` response carrying the request's
//! communication id, bounded by a timeout, instead of redirecting blindly on
//! a timer. Page navigation stays with the caller.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::Error;
use crate::protocol::{LoginRequest, LoginResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Disconnected,
    Connected,
    /// The server acknowledged the login; the caller can navigate away.
    Redirecting,
}

pub struct LoginClient {
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
    state: Mutex<LoginState>,
}

impl LoginClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            next_id: AtomicU64::new(0),
            state: Mutex::new(LoginState::Disconnected),
        }
    }

    /// How long to wait for the server's acknowledgment.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> LoginState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: LoginState) {
        log::debug!("[Login] {:?}", state);
        *self.state.lock().unwrap() = state;
    }

    /// Connect, send the login request for `user`, and wait for the
    /// matching acknowledgment.
    pub async fn login(&self, user: &str) -> Result<(), Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        log::info!("[Login] Connecting to {}", self.url);
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        self.set_state(LoginState::Connected);

        let (mut write, mut read) = ws_stream.split();

        let request = LoginRequest {
            id,
            user: user.to_owned(),
        };
        write.send(Message::Text(request.encode().into())).await?;
        log::debug!("[Login] Sent login request {}", id);

        let expected_id = id.to_string();
        let wait = async {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match LoginResponse::parse(text.as_str()) {
                        Some(response) if response.id == expected_id => return Ok(()),
                        Some(response) => {
                            log::warn!("[Login] Response for unexpected id {}", response.id);
                        }
                        None => log::debug!("[Login] Ignoring message: {}", text),
                    },
                    Ok(Message::Close(_)) => return Err(Error::ConnectionClosed),
                    Ok(_) => {}
                    Err(e) => return Err(Error::Socket(e)),
                }
            }
            Err(Error::ConnectionClosed)
        };

        match tokio::time::timeout(self.timeout, wait).await {
            Ok(Ok(())) => {
                log::info!("[Login] Login {} acknowledged", id);
                self.set_state(LoginState::Redirecting);
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_state(LoginState::Disconnected);
                Err(e)
            }
            Err(_) => {
                log::error!("[Login] No acknowledgment for login {} in time", id);
                self.set_state(LoginState::Disconnected);
                Err(Error::LoginTimeout)
            }
        }
    }
}
