//! Line-delimited JSON transport for [`IpcHandler`].
//!
//! One request envelope per input line, one reply per output line. Requests
//! are handled in arrival order.

use super::{IpcHandler, IpcResponse};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Serve requests from `reader` until it reaches end of input.
pub async fn serve<R, W>(handler: &IpcHandler, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await.context("Failed to read IPC input")? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = handler.handle_line(trimmed).await;
        send_response(&mut writer, &response).await?;
    }

    log::info!("IPC input closed");
    Ok(())
}

/// Serve on the process's stdin/stdout.
pub async fn serve_stdio(handler: &IpcHandler) -> Result<()> {
    log::info!("Serving IPC on stdio");
    serve(handler, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

async fn send_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &IpcResponse) -> Result<()> {
    let mut json = serde_json::to_string(response).context("Failed to serialize IPC response")?;
    crate::debug_log!("IPC", "-> {}", json);
    json.push('\n');
    writer
        .write_all(json.as_bytes())
        .await
        .context("Failed to write IPC response")?;
    writer.flush().await.context("Failed to flush IPC output")?;
    Ok(())
}
