//! Bulk QR generation with bounded concurrency and cooperative cancellation.
use crate::analyzer::UniqueColumns;
use crate::payload::PayloadError;
use crate::payload::QrPayloadCodec;
use crate::table::Table;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("QR generation cancelled")]
    Cancelled,

    #[error("{0}")]
    Payload(#[from] PayloadError),

    #[error("QR worker failed: {0}")]
    Worker(String),
}

/// A rendered QR image for one data row.
#[derive(Clone, Debug, PartialEq)]
pub struct QrImage {
    /// Table row index; the header is row 0, so data rows start at 1
    pub row: usize,
    /// `qr_{row}.png`
    pub file_name: String,
    pub png: Vec<u8>,
}

impl QrImage {
    fn new(row: usize, png: Vec<u8>) -> Self {
        QrImage { row, file_name: format!("qr_{row}.png"), png }
    }
}

/// Renders one QR image per data row on the blocking pool, at most `concurrency` at a time.
#[derive(Clone, Debug)]
pub struct QrGenerator {
    codec: Arc<QrPayloadCodec>,
    concurrency: usize,
    /// Images finished by the current or last run
    rendered: Arc<AtomicUsize>,
}

impl QrGenerator {
    pub fn new(codec: QrPayloadCodec, concurrency: usize) -> Self {
        QrGenerator { codec: Arc::new(codec), concurrency: concurrency.max(1), rendered: Arc::default() }
    }

    pub fn codec(&self) -> &QrPayloadCodec {
        &self.codec
    }

    /// Number of images rendered so far by the running (or last) generation.
    pub fn rendered(&self) -> usize {
        self.rendered.load(Ordering::Relaxed)
    }

    /// Generates images for rows `1..table.len()`, returned in row order.
    ///
    /// Each row embeds its values at `columns`. The token is checked before every row is
    /// scheduled and again when a worker starts; once cancelled, pending workers are
    /// aborted and nothing is returned.
    pub async fn generate(
        &self,
        event_id: &str,
        table: &Table,
        columns: &UniqueColumns,
        cancel: &CancellationToken,
    ) -> Result<Vec<QrImage>, GeneratorError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();
        self.rendered.store(0, Ordering::Relaxed);

        for row in 1..table.len() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    workers.abort_all();
                    return Err(GeneratorError::Cancelled);
                }
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    permit.map_err(|e| GeneratorError::Worker(e.to_string()))?
                }
            };
            let codec = Arc::clone(&self.codec);
            let event_id = event_id.to_owned();
            let data = columns.project(table, row);
            let cancel = cancel.clone();
            let rendered = Arc::clone(&self.rendered);
            workers.spawn_blocking(move || {
                let _permit = permit;
                if cancel.is_cancelled() {
                    return Err(GeneratorError::Cancelled);
                }
                let image = QrImage::new(row, codec.encode(&event_id, data)?);
                rendered.fetch_add(1, Ordering::Relaxed);
                Ok(image)
            });
        }

        let mut images = Vec::with_capacity(table.len().saturating_sub(1));
        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    workers.abort_all();
                    return Err(GeneratorError::Cancelled);
                }
                joined = workers.join_next() => joined,
            };
            let Some(result) = joined else { break };
            match result.map_err(|e| GeneratorError::Worker(e.to_string()))? {
                Ok(image) => images.push(image),
                Err(error) => {
                    workers.abort_all();
                    return Err(error);
                }
            }
        }
        images.sort_by_key(|image| image.row);
        debug!(event_id, images = images.len(), "generated QR images");
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::find_unique_columns;
    use crate::signer::HashSigner;
    use std::time::Duration;

    fn generator(concurrency: usize) -> QrGenerator {
        let codec = QrPayloadCodec::new(HashSigner::new("generator-secret").unwrap()).with_module_size(1);
        QrGenerator::new(codec, concurrency)
    }

    fn attendees(count: usize) -> Table {
        let mut rows = vec![vec!["id".to_owned(), "email".to_owned()]];
        rows.extend((1..=count).map(|i| vec![i.to_string(), format!("guest{i}@x.com")]));
        Table::from_strings(rows)
    }

    #[tokio::test]
    async fn one_image_per_data_row_in_order() {
        let table = attendees(6);
        let columns = find_unique_columns(&table).unwrap();
        let images = generator(2).generate("evt", &table, &columns, &CancellationToken::new()).await.unwrap();

        assert_eq!(images.iter().map(|image| image.row).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(images[0].file_name, "qr_1.png");
        assert!(images.iter().all(|image| image.png.starts_with(&[0x89, b'P', b'N', b'G'])));
    }

    #[tokio::test]
    async fn header_only_table_yields_nothing() {
        let table = attendees(0);
        let columns = find_unique_columns(&table).unwrap();
        let images = generator(1).generate("evt", &table, &columns, &CancellationToken::new()).await.unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_stops_generation() {
        let table = attendees(20);
        let columns = find_unique_columns(&table).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = generator(1).generate("evt", &table, &columns, &cancel).await;
        assert!(matches!(result, Err(GeneratorError::Cancelled)));
    }

    #[tokio::test]
    async fn cancelling_mid_run_discards_rendered_rows() {
        let table = attendees(2000);
        let columns = find_unique_columns(&table).unwrap();
        let generator = generator(1);
        let cancel = CancellationToken::new();

        let running = {
            let (generator, cancel) = (generator.clone(), cancel.clone());
            tokio::spawn(async move { generator.generate("evt", &table, &columns, &cancel).await })
        };
        while generator.rendered() < 2 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        cancel.cancel();

        let result = running.await.unwrap();
        assert!(matches!(result, Err(GeneratorError::Cancelled)));
        assert!(generator.rendered() < 2000);
    }

    #[tokio::test]
    async fn images_match_direct_encoding() {
        let table = attendees(2);
        let columns = find_unique_columns(&table).unwrap();
        let generator = generator(4);
        let images = generator.generate("evt", &table, &columns, &CancellationToken::new()).await.unwrap();
        let direct = generator.codec().encode("evt", columns.project(&table, 2)).unwrap();
        assert_eq!(images[1].png, direct);
    }
}
