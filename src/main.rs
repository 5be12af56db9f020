use std::sync::Arc;

use connection::Connection;
use journal::Journal;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::Semaphore,
};

mod connection;
mod journal;
mod protocol;

const BIND_ADDR: &str = "127.0.0.1:13373";
const JOURNAL_PATH: &str = "data.txt";

/// Connections past the ceiling wait in the listen backlog
/// instead of each getting a task of their own.
const MAX_CONNECTIONS: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // connect tracing to stdout
    tracing_subscriber::fmt::init();

    let listener = TcpListener::bind(BIND_ADDR).await?;
    tracing::info!("server is listening on: {}", listener.local_addr()?);

    let journal = Journal::create(JOURNAL_PATH.into());
    serve(listener, journal).await
}

async fn serve(listener: TcpListener, journal: Journal) -> anyhow::Result<()> {
    let connection_limit = Arc::new(Semaphore::new(MAX_CONNECTIONS));

    loop {
        // wait for a free slot before accepting
        let permit = connection_limit.clone().acquire_owned().await?;

        match listener.accept().await {
            Ok((conn, peer)) => {
                let journal = journal.clone();
                tokio::spawn(async move {
                    tracing::debug!(peer = %peer, "accepted a new connection");

                    if let Err(reason) = handle_connection(conn, journal).await {
                        tracing::error!(peer = %peer, "failed to handle connection: {}", reason);
                    }

                    drop(permit);
                });
            }
            Err(reason) => {
                // a failed accept must not take the listener down with it
                tracing::error!("failed to accept a connection: {}", reason);
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, journal: Journal) -> anyhow::Result<()> {
    let mut conn = Connection::new(stream);

    let payload = conn.read_payload().await?;
    tracing::debug!("received a payload of {} bytes", payload.len());

    journal.append(payload.trim_ascii().to_vec()).await?;
    conn.send_ack().await?;

    Ok(())
}
