//! Terminal rendition of the shared collection board.
//!
//! Mirrors the server-owned map over the duplex socket and reprints the
//! table on every update, local or remote.

use shared_map::{ServerConfig, SharedMap};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig::default().with_base_path("sample-shared-collection");
    let url = config.collection_socket_url()?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let map = SharedMap::over_websocket(url.as_str(), move || {
        let _ = tx.send(());
    })
    .await?;

    println!("Connected to {}", url);

    while rx.recv().await.is_some() {
        let mut keys = map.key_set();
        keys.sort();

        println!("--- {} entries ---", map.size());
        for key in keys {
            if let Some(value) = map.get(&key)? {
                println!("{:<24} {}", key, value);
            }
        }
    }

    println!("Connection closed");
    Ok(())
}
