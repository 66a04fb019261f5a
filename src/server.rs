use crate::account::controller::AccountController;
use crate::account::repo::LedgerRepository;
use crate::constants::NOT_FOUND;
use crate::order::controller::OrderController;
use crate::req::Method::{GET, POST};
use crate::req::Request;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot::Receiver;

/// Every controller the router dispatches to, sharing one repository.
pub struct Controllers {
    pub accounts: AccountController,
    pub orders: OrderController,
}

impl Controllers {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Controllers {
            accounts: AccountController::new(Arc::clone(&repository)),
            orders: OrderController::new(repository),
        }
    }
}

pub struct Server {
    controller: Arc<Controllers>,
    bind_address: String,
}

impl Server {
    pub fn new(controller: Arc<Controllers>, bind_address: impl Into<String>) -> Self {
        Self {
            controller,
            bind_address: bind_address.into(),
        }
    }

    pub async fn start(&self, mut shutdown_rx: Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(&self.bind_address)
            .await
            .with_context(|| format!("failed to bind {}", self.bind_address))?;
        tracing::info!(address = %self.bind_address, "server running");

        loop {
            tokio::select! {
                conn = listener.accept() => {
                    let (mut stream, peer) = conn?;
                    let controller = Arc::clone(&self.controller);

                    tokio::spawn(async move {
                        let (reader, writer) = stream.split();
                        if let Err(e) = Self::handle_client(reader, writer, &controller).await {
                            tracing::warn!(%peer, error = ?e, "connection error");
                        }
                    });
                }
                _ = &mut shutdown_rx => {
                    tracing::info!("shutting down server");
                    break;
                }
            }
        }
        Ok(())
    }

    pub async fn handle_client<Reader, Writer>(
        reader: Reader,
        mut writer: Writer,
        controller: &Controllers,
    ) -> Result<()>
    where
        Reader: AsyncRead + Unpin,
        Writer: AsyncWrite + Unpin,
    {
        let request = Request::from_reader(reader)
            .await
            .context("Failed to read request")?;
        tracing::debug!(method = ?request.method, path = %request.path, "request");

        // Route
        let (status_line, content) = match (&request.method, request.path.as_str()) {
            (POST, "/signup") => controller.accounts.signup(&request.body).await,
            (POST, "/deposit") => controller.accounts.deposit(&request.body).await,
            (POST, "/withdraw") => controller.accounts.withdraw(&request.body).await,
            (POST, "/orders") => controller.orders.execute_order(&request.body).await,
            (GET, path) if path.starts_with("/accounts/") => {
                let rest = &path["/accounts/".len()..];
                match rest.strip_suffix("/orders") {
                    Some(account_id) => {
                        let status = request.query.get("status").map(String::as_str);
                        controller.orders.get_orders(account_id, status).await
                    }
                    None => controller.accounts.get_account(rest).await,
                }
            }
            _ => (NOT_FOUND.to_string(), "".to_string()),
        };

        let response = format!(
            "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            content.len(),
            content
        );
        writer
            .write_all(response.as_bytes())
            .await
            .context("Failed to write")?;
        writer.flush().await.context("Failed to flush")
    }
}
