use std::path::{Path, PathBuf};

use tokio::{
    fs::OpenOptions,
    io::AsyncWriteExt,
    sync::{mpsc, oneshot},
};

// back pressure measurement: a full queue suspends appenders
const APPEND_BUFFER_COUNT: usize = 64;

/// A handle to the shared append-only record file.
///
/// every append goes through a single writer task, so records from
/// concurrent connections can never interleave inside a line.
#[derive(Clone)]
pub struct Journal {
    sender: mpsc::Sender<Append>,
}

pub struct Append {
    record: Vec<u8>,
    response: oneshot::Sender<tokio::io::Result<()>>,
}

#[derive(thiserror::Error, Debug)]
pub enum JournalError {
    #[error("{0}")]
    Mpsc(#[from] mpsc::error::SendError<Append>),

    #[error("{0}")]
    Oneshot(#[from] oneshot::error::RecvError),

    #[error("{0}")]
    Io(#[from] tokio::io::Error),
}

impl Journal {
    /// Creates a journal handle and spawns the writer task behind it.
    ///
    /// the task runs until the last handle is dropped.
    pub fn create(path: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::channel(APPEND_BUFFER_COUNT);

        tokio::spawn(async move {
            while let Some(Append { record, response }) = rx.recv().await {
                let result = write_record(&path, &record).await;

                // the requesting connection may be gone already
                let _ = response.send(result);
            }
        });

        Self { sender: tx }
    }

    /// Appends one record to the journal, followed by a newline.
    ///
    /// returns once the writer task has confirmed that the record
    /// actually hit the file.
    pub async fn append(&self, record: Vec<u8>) -> Result<(), JournalError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(Append {
                record,
                response: tx,
            })
            .await?;
        rx.await??;

        Ok(())
    }
}

// the file is opened in append mode per record and closed again at scope
// end; a removed file reappears on the next append
async fn write_record(path: &Path, record: &[u8]) -> tokio::io::Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await?;

    file.write_all(record).await?;
    file.write_all(b"\n").await?;
    file.flush().await?;

    Ok(())
}
