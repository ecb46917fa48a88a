use calprov_core::AuthError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use warp::Filter;

use crate::storage::Credential;

/// OAuth2 configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Client ID from OAuth provider
    pub client_id: String,

    /// Client secret from OAuth provider
    pub client_secret: String,

    /// Authorization endpoint URL
    pub auth_url: String,

    /// Token endpoint URL
    pub token_url: String,

    /// Loopback port the redirect lands on
    pub redirect_port: u16,

    /// Scopes to request
    pub scopes: Vec<String>,
}

/// Source of fresh credentials for the credential manager.
///
/// `refresh` renews an expired credential using its refresh token;
/// `authorize` runs the interactive consent flow from scratch.
#[allow(async_fn_in_trait)]
pub trait TokenProvider {
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;

    async fn authorize(&self) -> Result<Credential, AuthError>;
}

/// Query parameters the authorization server appends to the redirect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: String,
    pub error: Option<String>,
}

type CallbackSender = Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>;

/// One-shot loopback HTTP server receiving the authorization redirect.
pub struct CallbackServer {
    addr: SocketAddr,
    params: oneshot::Receiver<CallbackParams>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl CallbackServer {
    /// Bind `127.0.0.1:<port>` and start serving in the background.
    ///
    /// Port 0 picks a free port; see [`CallbackServer::redirect_uri`].
    pub fn bind(port: u16) -> Result<Self, AuthError> {
        let (tx, rx) = oneshot::channel();
        let tx: CallbackSender = Arc::new(Mutex::new(Some(tx)));

        let callback_path = warp::path::end()
            .or(warp::path("callback").and(warp::path::end()))
            .unify();

        let routes = warp::get()
            .and(callback_path)
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::any().map(move || tx.clone()))
            .and_then(handle_callback);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(([127, 0, 0, 1], port), async move {
                shutdown_rx.await.ok();
            })
            .map_err(|_| AuthError::PortInUse(port))?;

        tokio::spawn(server);
        tracing::debug!("OAuth callback server listening on {}", addr);

        Ok(Self {
            addr,
            params: rx,
            shutdown: Some(shutdown_tx),
        })
    }

    /// Redirect URL for the bound loopback address.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Wait for the redirect, then stop the server.
    pub async fn wait(mut self) -> Result<CallbackParams, AuthError> {
        let params = (&mut self.params)
            .await
            .map_err(|_| AuthError::OAuthFailed("callback server stopped".to_string()))?;

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        Ok(params)
    }
}

async fn handle_callback(
    params: HashMap<String, String>,
    tx: CallbackSender,
) -> Result<impl warp::Reply, warp::Rejection> {
    let callback = CallbackParams {
        code: params.get("code").cloned(),
        state: params.get("state").cloned().unwrap_or_default(),
        error: params.get("error").cloned(),
    };

    if let Some(sender) = tx.lock().await.take() {
        let _ = sender.send(callback);
    }

    Ok(warp::reply::html(
        "<html><body><h1>Authorization received</h1><p>You can close this window and return to the terminal.</p></body></html>",
    ))
}

impl CallbackParams {
    /// Check the redirect against the state sent with the request and extract the code.
    pub fn into_code(self, expected_state: &str) -> Result<String, AuthError> {
        if let Some(error) = self.error {
            return Err(if error == "access_denied" {
                AuthError::OAuthCancelled
            } else {
                AuthError::OAuthFailed(error)
            });
        }

        if self.state != expected_state {
            return Err(AuthError::StateMismatch);
        }

        self.code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AuthError::OAuthFailed("redirect carried no code".to_string()))
    }
}
