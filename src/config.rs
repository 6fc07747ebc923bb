//! Deployment-derived endpoint configuration.
//!
//! The server endpoints are not part of the wire contract; they follow from
//! where the application is deployed (host, port, context path). This
//! mirrors how the sample pages compute their root URI at load time.

use url::Url;

use crate::error::Error;

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Use `wss`/`https` instead of `ws`/`http`.
    pub secure: bool,
    /// Application context path the endpoints are deployed under, e.g.
    /// `sample-shared-collection`. Empty for root deployments.
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8085,
            secure: false,
            base_path: String::new(),
        }
    }
}

impl ServerConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    fn endpoint(&self, insecure: &str, secure: &str, path: &str) -> Result<Url, Error> {
        let scheme = if self.secure { secure } else { insecure };
        let root = Url::parse(&format!("{}://{}:{}", scheme, self.host, self.port))?;

        let base = self.base_path.trim_matches('/');
        let full = if base.is_empty() {
            format!("/{}", path)
        } else {
            format!("/{}/{}", base, path)
        };

        Ok(root.join(&full)?)
    }

    /// Duplex collection endpoint.
    pub fn collection_socket_url(&self) -> Result<Url, Error> {
        self.endpoint("ws", "wss", "ws/collection")
    }

    /// Collection resource: GET subscribes to the event stream, POST writes.
    pub fn collection_stream_url(&self) -> Result<Url, Error> {
        self.endpoint("http", "https", "rest/collection")
    }

    /// Login endpoint.
    pub fn login_socket_url(&self) -> Result<Url, Error> {
        self.endpoint("ws", "wss", "auction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints() {
        let config = ServerConfig::default();
        assert_eq!(
            config.collection_socket_url().unwrap().as_str(),
            "ws://localhost:8085/ws/collection"
        );
        assert_eq!(
            config.collection_stream_url().unwrap().as_str(),
            "http://localhost:8085/rest/collection"
        );
        assert_eq!(
            config.login_socket_url().unwrap().as_str(),
            "ws://localhost:8085/auction"
        );
    }

    #[test]
    fn base_path_is_inserted_between_root_and_endpoint() {
        let config = ServerConfig::default().with_base_path("sample-shared-collection");
        assert_eq!(
            config.collection_socket_url().unwrap().as_str(),
            "ws://localhost:8085/sample-shared-collection/ws/collection"
        );

        // Surrounding slashes are tolerated
        let config = ServerConfig::default().with_base_path("/app/");
        assert_eq!(
            config.collection_stream_url().unwrap().as_str(),
            "http://localhost:8085/app/rest/collection"
        );
    }

    #[test]
    fn secure_flag_switches_schemes() {
        let config = ServerConfig::default()
            .with_secure(true)
            .with_host("example.com")
            .with_port(443);
        assert!(
            config
                .collection_socket_url()
                .unwrap()
                .as_str()
                .starts_with("wss://example.com")
        );
        assert!(
            config
                .collection_stream_url()
                .unwrap()
                .as_str()
                .starts_with("https://example.com")
        );
    }

    #[test]
    fn empty_host_is_rejected() {
        let config = ServerConfig::default().with_host("");
        assert!(matches!(
            config.collection_socket_url(),
            Err(Error::InvalidUrl(_))
        ));
    }
}
