use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{Ack, MAX_PAYLOAD_SIZE};

/// A thin wrapper around the client socket that collects the one
/// payload a connection carries and writes the acknowledgment back.
pub struct Connection<S> {
    stream: S,
}

#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    #[error("{0}")]
    Io(#[from] tokio::io::Error),

    #[error("{0}")]
    Serialize(#[from] serde_json::Error),
}

impl<S> Connection<S>
where
    S: Unpin,
    S: AsyncRead + AsyncWrite,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Reads the entire payload of the connection.
    ///
    /// there is no framing on the wire, so the payload ends when the client
    /// half-closes its side. reads loop until then, or until the cap is
    /// filled; whatever the client sends past the cap is never read.
    pub async fn read_payload(&mut self) -> Result<Vec<u8>, ConnectionError> {
        let mut payload = vec![0u8; MAX_PAYLOAD_SIZE];
        let mut filled = 0;

        while filled < MAX_PAYLOAD_SIZE {
            let rcount = self.stream.read(&mut payload[filled..]).await?;
            if rcount == 0 {
                // reached EOF, the client is done sending
                break;
            }

            filled += rcount;
        }

        payload.truncate(filled);
        Ok(payload)
    }

    /// Writes the fixed acknowledgment to the client.
    pub async fn send_ack(&mut self) -> Result<(), ConnectionError> {
        let ack = serde_json::to_vec(&Ack::ok())?;
        self.stream.write_all(&ack).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use crate::protocol::MAX_PAYLOAD_SIZE;

    use super::Connection;

    #[tokio::test]
    async fn payload_split_across_writes_is_reassembled() {
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let mut conn = Connection::new(server);

        client.write_all(b"first ").await.unwrap();
        client.write_all(b"second").await.unwrap();
        drop(client);

        let payload = conn.read_payload().await.unwrap();
        assert_eq!(payload, b"first second");
    }

    #[tokio::test]
    async fn payload_is_truncated_at_the_cap() {
        let (mut client, server) = tokio::io::duplex(2 * MAX_PAYLOAD_SIZE);
        let mut conn = Connection::new(server);

        let oversized = vec![b'x'; MAX_PAYLOAD_SIZE + 512];
        client.write_all(&oversized).await.unwrap();
        drop(client);

        let payload = conn.read_payload().await.unwrap();
        assert_eq!(payload.len(), MAX_PAYLOAD_SIZE);
        assert!(payload.iter().all(|byte| *byte == b'x'));
    }

    #[tokio::test]
    async fn immediate_close_yields_an_empty_payload() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);

        let mut conn = Connection::new(server);
        let payload = conn.read_payload().await.unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn ack_is_the_fixed_json_object() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut conn = Connection::new(server);

        conn.send_ack().await.unwrap();
        drop(conn);

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert_eq!(response, br#"{"return":"ok"}"#);
    }
}
