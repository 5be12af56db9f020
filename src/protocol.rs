use serde::Serialize;

/// The most bytes a single connection may deposit; anything past
/// the cap is never read off the socket.
pub const MAX_PAYLOAD_SIZE: usize = 10024;

/// The fixed acknowledgment sent back after a record lands in the journal.
///
/// its content never depends on the payload.
#[derive(Serialize)]
pub struct Ack {
    // "return" is a keyword, so the field only carries the name on the wire
    #[serde(rename = "return")]
    result: &'static str,
}

impl Ack {
    pub fn ok() -> Self {
        Self { result: "ok" }
    }
}
