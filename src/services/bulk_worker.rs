// src/services/bulk_worker.rs

//! Worker de lotes: uma fila em processo e uma única task consumindo-a,
//! então cada lote é processado por no máximo um worker por vez.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use uuid::Uuid;

use crate::{common::error::AppError, services::bulk_service::BulkService};

#[derive(Clone)]
pub struct BulkQueue {
    sender: mpsc::UnboundedSender<Uuid>,
}

impl BulkQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Uuid>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn enqueue(&self, bulk_id: Uuid) -> Result<(), AppError> {
        self.sender
            .send(bulk_id)
            .map_err(|_| anyhow::anyhow!("worker de lotes encerrado; lote {bulk_id} não enfileirado").into())
    }
}

/// Tentativas e espera entre elas (exponencial a partir de `base_delay`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(500) }
    }
}

impl RetryPolicy {
    /// Espera antes da tentativa `attempt + 1` (attempt começa em 1).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

pub fn spawn_bulk_worker(
    service: BulkService,
    mut receiver: mpsc::UnboundedReceiver<Uuid>,
    policy: RetryPolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("✅ Worker de lotes iniciado");
        while let Some(bulk_id) = receiver.recv().await {
            run_with_retry(&service, bulk_id, policy).await;
        }
        tracing::info!("Fila de lotes fechada, worker encerrado");
    })
}

async fn run_with_retry(service: &BulkService, bulk_id: Uuid, policy: RetryPolicy) {
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if let Err(e) = service.record_attempt(bulk_id).await {
            tracing::warn!("Não foi possível registrar a tentativa do lote {}: {}", bulk_id, e);
        }

        match service.process(bulk_id).await {
            Ok(report) => {
                tracing::debug!(
                    "Lote {} processado na tentativa {} ({} ok, {} falhas)",
                    bulk_id,
                    attempt,
                    report.succeeded(),
                    report.failed()
                );
                return;
            }
            Err(e) if attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    "Tentativa {}/{} do lote {} falhou: {}. Nova tentativa em {:?}",
                    attempt,
                    max_attempts,
                    bulk_id,
                    e,
                    delay
                );
                sleep(delay).await;
            }
            Err(e) => {
                tracing::error!("Lote {} falhou após {} tentativas: {}", bulk_id, max_attempts, e);
                if let Err(persist) = service.fail_after_retries(bulk_id, max_attempts, &e).await {
                    tracing::error!("Não foi possível marcar o lote {} como FAIL: {}", bulk_id, persist);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_each_attempt() {
        let policy = RetryPolicy { max_attempts: 4, base_delay: Duration::from_millis(100) };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy { max_attempts: 100, base_delay: Duration::from_secs(1) };
        assert_eq!(policy.backoff(50), policy.backoff(17));
    }

    #[tokio::test]
    async fn enqueue_fails_once_the_worker_is_gone() {
        let (queue, receiver) = BulkQueue::channel();
        assert!(queue.enqueue(Uuid::new_v4()).is_ok());
        drop(receiver);
        assert!(queue.enqueue(Uuid::new_v4()).is_err());
    }
}
