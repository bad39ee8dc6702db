//! Coordination service health probe (`ruok` four-letter command).

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::{HealError, Result};

/// Send `ruok` to `addr` and return the first response line.
///
/// Connect, write and read together are bounded by `timeout`.
pub async fn ruok(addr: &str, timeout: Duration) -> Result<String> {
    let exchange = async {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(b"ruok\r\n\r\n").await?;
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).await?;
        Ok::<_, std::io::Error>(line)
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(Ok(line)) => Ok(line),
        Ok(Err(e)) => Err(HealError::Network(format!("{addr}: {e}"))),
        Err(_) => Err(HealError::Network(format!(
            "{addr}: no answer within {timeout:?}"
        ))),
    }
}

/// Whether the service at `addr` answers `imok`.
pub async fn is_healthy(addr: &str, timeout: Duration) -> bool {
    match ruok(addr, timeout).await {
        Ok(line) => line.contains("imok"),
        Err(e) => {
            tracing::debug!(error = %e, "Coordination probe failed");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serve one probe connection answering `reply`. Returns the address.
    pub(crate) async fn serve_once(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 16];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(reply.as_bytes()).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_imok_is_healthy() {
        let addr = serve_once("imok\n").await;
        assert!(is_healthy(&addr, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_other_answer_is_unhealthy() {
        let addr = serve_once("error\n").await;
        assert_eq!(ruok(&addr, Duration::from_secs(2)).await.unwrap(), "error\n");
        let addr = serve_once("error\n").await;
        assert!(!is_healthy(&addr, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        assert!(matches!(
            ruok(&addr, Duration::from_secs(2)).await,
            Err(HealError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let _hold = tokio::spawn(async move {
            let accepted = listener.accept().await;
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(accepted);
        });
        let err = ruok(&addr, Duration::from_millis(100)).await.unwrap_err();
        assert!(err.to_string().contains("no answer"));
    }
}
