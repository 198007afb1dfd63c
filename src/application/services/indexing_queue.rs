//! Background indexing worker pool.
//!
//! Knowledge ingestion runs on a fixed set of tokio tasks fed by a bounded
//! queue, detached from turn processing. Workers never take session locks.
//!
//! ## Graceful Shutdown
//!
//! `shutdown` signals the workers through a watch channel. A worker finishes
//! the job it is running, then exits; jobs still queued are dropped and
//! their waiters receive an error.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

use super::retrieval_service::RetrievalService;
use crate::application::errors::EngineError;
use crate::domain::foundation::{ErrorCode, KnowledgeSourceId};
use crate::domain::knowledge::KnowledgeSource;

/// Configuration for the indexing pool.
#[derive(Debug, Clone)]
pub struct IndexingQueueConfig {
    /// Number of worker tasks.
    pub workers: usize,

    /// Jobs that can wait before `try_enqueue` reports a full queue.
    pub capacity: usize,
}

impl Default for IndexingQueueConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            capacity: 64,
        }
    }
}

type JobResult = Result<KnowledgeSource, EngineError>;

struct IndexJob {
    source_id: KnowledgeSourceId,
    done: Option<oneshot::Sender<JobResult>>,
}

pub struct IndexingQueue {
    sender: mpsc::Sender<IndexJob>,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

fn queue_closed() -> EngineError {
    EngineError::Infrastructure {
        code: ErrorCode::InternalError,
        message: "indexing queue is shut down".to_string(),
    }
}

impl IndexingQueue {
    /// Spawns the workers. Must be called inside a tokio runtime.
    pub fn start(service: Arc<RetrievalService>, config: IndexingQueueConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..config.workers.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&service),
                    Arc::clone(&receiver),
                    shutdown_rx.clone(),
                ))
            })
            .collect();

        tracing::info!(workers = config.workers.max(1), capacity = config.capacity, "Indexing queue started");
        Self {
            sender,
            shutdown,
            workers,
        }
    }

    /// Queues a (re)index, waiting for space if the queue is full.
    pub async fn enqueue(&self, source_id: KnowledgeSourceId) -> Result<(), EngineError> {
        self.sender
            .send(IndexJob { source_id, done: None })
            .await
            .map_err(|_| queue_closed())
    }

    /// Queues a (re)index without waiting.
    pub fn try_enqueue(&self, source_id: KnowledgeSourceId) -> Result<(), EngineError> {
        self.sender
            .try_send(IndexJob { source_id, done: None })
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => EngineError::Infrastructure {
                    code: ErrorCode::InternalError,
                    message: "indexing queue is full".to_string(),
                },
                mpsc::error::TrySendError::Closed(_) => queue_closed(),
            })
    }

    /// Queues a (re)index and waits for its result.
    pub async fn enqueue_and_wait(&self, source_id: KnowledgeSourceId) -> JobResult {
        let (done, result) = oneshot::channel();
        self.sender
            .send(IndexJob {
                source_id,
                done: Some(done),
            })
            .await
            .map_err(|_| queue_closed())?;
        result.await.map_err(|_| queue_closed())?
    }

    /// Stops the workers after their current job.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        drop(self.sender);
        for handle in self.workers {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Indexing worker panicked");
            }
        }
        tracing::info!("Indexing queue stopped");
    }
}

async fn run_worker(
    worker: usize,
    service: Arc<RetrievalService>,
    receiver: Arc<Mutex<mpsc::Receiver<IndexJob>>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let job = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            job = async { receiver.lock().await.recv().await } => job,
        };

        // Channel closed: every sender is gone.
        let Some(job) = job else { break };

        tracing::debug!(worker, source_id = %job.source_id, "Indexing job started");
        let result = service.reindex_source(&job.source_id).await;
        if let Err(err) = &result {
            tracing::warn!(worker, source_id = %job.source_id, error = %err, "Indexing job failed");
        }
        if let Some(done) = job.done {
            let _ = done.send(result);
        }
    }
    tracing::debug!(worker, "Indexing worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockEmbeddingProvider;
    use crate::adapters::storage::{InMemoryKnowledgeChunkRepository, InMemoryKnowledgeSourceRepository};
    use crate::application::services::RetrievalSettings;
    use crate::domain::knowledge::{IndexStatus, TextChunker};
    use std::time::Duration;

    fn service() -> Arc<RetrievalService> {
        Arc::new(RetrievalService::new(
            Arc::new(InMemoryKnowledgeSourceRepository::new()),
            Arc::new(InMemoryKnowledgeChunkRepository::new()),
            Arc::new(MockEmbeddingProvider::new()),
            TextChunker::new(50, 10).unwrap(),
            RetrievalSettings::default(),
        ))
    }

    #[tokio::test]
    async fn indexes_queued_sources() {
        let service = service();
        let queue = IndexingQueue::start(Arc::clone(&service), IndexingQueueConfig::default());

        let source = service
            .register_source(KnowledgeSource::new("Guide", "Some reference text. More text here.").unwrap())
            .await
            .unwrap();
        let indexed = queue.enqueue_and_wait(*source.id()).await.unwrap();

        assert_eq!(indexed.status(), IndexStatus::Indexed);
        assert!(indexed.chunk_count() > 0);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn fire_and_forget_jobs_complete() {
        let service = service();
        let queue = IndexingQueue::start(Arc::clone(&service), IndexingQueueConfig { workers: 3, capacity: 8 });

        let mut ids = Vec::new();
        for i in 0..4 {
            let source = KnowledgeSource::new(format!("Doc {}", i), "Reference text about screening.").unwrap();
            ids.push(*service.register_source(source).await.unwrap().id());
        }
        for id in &ids {
            queue.enqueue(*id).await.unwrap();
        }

        for _ in 0..50 {
            let mut done = 0;
            for id in &ids {
                if service.get_source(id).await.unwrap().status() == IndexStatus::Indexed {
                    done += 1;
                }
            }
            if done == ids.len() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        for id in &ids {
            assert_eq!(service.get_source(id).await.unwrap().status(), IndexStatus::Indexed);
        }
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_source_reports_not_found() {
        let queue = IndexingQueue::start(service(), IndexingQueueConfig::default());
        let err = queue.enqueue_and_wait(KnowledgeSourceId::new()).await.unwrap_err();
        assert!(err.is_not_found());
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_workers() {
        let queue = IndexingQueue::start(service(), IndexingQueueConfig::default());
        tokio::time::timeout(Duration::from_secs(1), queue.shutdown())
            .await
            .expect("workers should stop promptly");
    }
}
