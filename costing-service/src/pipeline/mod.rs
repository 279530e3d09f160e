use std::{pin::Pin, sync::Arc, time::SystemTime};

use futures::{Stream, StreamExt};

use tariff_core::{engine, CostedReading, RawRow, RowError, TariffSchedule};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    /// Row-level rejection; downstream counts these instead of aborting.
    #[error("classify error: {0}")]
    Classify(String),
    /// Row-level rejection by a validation transform.
    #[error("transform error: {0}")]
    Transform(String),
    /// Schedule invariant violation; fails the whole batch.
    #[error("schedule error: {0}")]
    Schedule(String),
    #[error("sink error: {0}")]
    Sink(String),
}

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(
        &self,
    ) -> Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

/// The classification stage: raw rows in, costed readings out. Shares the
/// read-only schedule across batches.
#[derive(Clone)]
pub struct Classifier {
    schedule: Arc<TariffSchedule>,
}

impl Classifier {
    pub fn new(schedule: Arc<TariffSchedule>) -> Self {
        Self { schedule }
    }

    pub fn classify(
        &self,
        input: Envelope<RawRow>,
    ) -> Result<Envelope<CostedReading>, PipelineError> {
        match engine::classify_row(&input.payload, &self.schedule) {
            Ok(costed) => Ok(Envelope {
                payload: costed,
                received_at: input.received_at,
            }),
            Err(RowError::Rate(e)) => Err(PipelineError::Schedule(e.to_string())),
            Err(e) => {
                metrics::counter!("classify_rejected_rows_total").increment(1);
                Err(PipelineError::Classify(e.to_string()))
            }
        }
    }
}

pub struct Pipeline<S, K> {
    pub source: S,
    pub classifier: Classifier,
    pub transforms: Vec<Arc<dyn Transform<CostedReading, CostedReading> + Send + Sync>>,
    pub sink: K,
}

impl<S, K> Pipeline<S, K>
where
    S: Source<RawRow> + Send + Sync + 'static,
    K: Sink<CostedReading> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<(), PipelineError> {
        let raw = self.source.stream().await;

        let classifier = self.classifier;
        let mut stream: Pin<
            Box<dyn Stream<Item = Result<Envelope<CostedReading>, PipelineError>> + Send>,
        > = Box::pin(raw.map(move |item| match item {
            Ok(env) => classifier.classify(env),
            Err(e) => Err(e),
        }));

        // Apply transforms in sequence (if any).
        for t in self.transforms {
            let t_arc = t.clone();
            stream = Box::pin(stream.then(move |item| {
                let t_inner = t_arc.clone();
                async move {
                    match item {
                        Ok(env) => t_inner.apply(env).await,
                        Err(e) => Err(e),
                    }
                }
            }));
        }

        self.sink.run(stream).await
    }
}
