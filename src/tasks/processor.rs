use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinHandle, JoinSet},
    time::{sleep_until, Instant},
};

use crate::{
    ai::{BatchClassifier, ClassifyError},
    config::PipelineConfig,
    dom::{MutationRecord, Page},
    domain::ClassificationMap,
    filter::{BatchId, BatchJob, FilterEngine},
    infrastructure::shutdown::ShutdownListener,
    protocol::{Ack, Request, Response},
    storage::{self, SettingsStore},
};

const EVENT_BUFFER: usize = 256;
const IDLE_WAKE: Duration = Duration::from_secs(3600);

type BatchOutcome = (BatchId, Result<ClassificationMap, ClassifyError>);

/// Inputs to the content pipeline: observer callbacks and runtime messages.
pub enum ContentEvent {
    Mutations(Vec<MutationRecord>),
    Message {
        request: Request,
        reply: oneshot::Sender<Response>,
    },
}

/// Sending side handed to whatever observes the page or relays messages.
#[derive(Clone)]
pub struct ContentHandle {
    events: mpsc::Sender<ContentEvent>,
}

impl ContentHandle {
    /// Returns false once the processor has stopped.
    pub async fn mutations(&self, records: Vec<MutationRecord>) -> bool {
        self.events
            .send(ContentEvent::Mutations(records))
            .await
            .is_ok()
    }

    pub async fn send(&self, request: Request) -> Option<Response> {
        let (reply, response) = oneshot::channel();
        self.events
            .send(ContentEvent::Message { request, reply })
            .await
            .ok()?;
        response.await.ok()
    }
}

/// Drives a `FilterEngine` against a shared page: applies mutations, fires
/// the debounce and settle timers, and runs AI batches concurrently so new
/// cards keep flowing while a request is outstanding.
pub struct ContentProcessor<P> {
    page: Arc<Mutex<P>>,
    engine: FilterEngine,
    classifier: Arc<dyn BatchClassifier>,
    store: Arc<dyn SettingsStore>,
    events: mpsc::Receiver<ContentEvent>,
}

impl<P: Page + Send + 'static> ContentProcessor<P> {
    pub fn new(
        page: Arc<Mutex<P>>,
        config: PipelineConfig,
        classifier: Arc<dyn BatchClassifier>,
        store: Arc<dyn SettingsStore>,
    ) -> (Self, ContentHandle) {
        let (sender, events) = mpsc::channel(EVENT_BUFFER);
        let processor = Self {
            page,
            engine: FilterEngine::new(config),
            classifier,
            store,
            events,
        };
        (processor, ContentHandle { events: sender })
    }

    pub fn spawn(self, mut shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_loop(&mut shutdown).await })
    }

    async fn run_loop(mut self, shutdown: &mut ShutdownListener) {
        let settings = storage::load_or_default(self.store.as_ref()).await;
        self.with_page(|engine, page| engine.init(page, settings, Instant::now()));

        let mut batches: JoinSet<BatchOutcome> = JoinSet::new();
        loop {
            let deadline = self.engine.next_deadline();
            let wake = deadline.unwrap_or_else(|| Instant::now() + IDLE_WAKE);

            tokio::select! {
                _ = shutdown.notified() => break,
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        tracing::debug!(target: "processor", "all content handles dropped");
                        break;
                    }
                },
                Some(joined) = batches.join_next(), if !batches.is_empty() => match joined {
                    Ok((id, outcome)) => {
                        self.with_page(|engine, page| engine.complete_batch(page, id, outcome));
                    }
                    Err(err) => {
                        tracing::error!(target: "processor", error = %err, "batch task failed");
                    }
                },
                _ = sleep_until(wake), if deadline.is_some() => {
                    let job = self.with_page(|engine, page| engine.poll(page, Instant::now()));
                    if let Some(job) = job {
                        self.dispatch(job, &mut batches);
                    }
                }
            }
        }

        batches.abort_all();
        self.with_page(|engine, page| engine.teardown(page));
        tracing::info!(target: "processor", "content processor stopped");
    }

    async fn handle_event(&mut self, event: ContentEvent) {
        match event {
            ContentEvent::Mutations(records) => {
                let now = Instant::now();
                self.with_page(|engine, page| engine.handle_mutations(page, &records, now));
            }
            ContentEvent::Message { request, reply } => match request {
                Request::UpdateFilters => {
                    // acknowledge before refiltering
                    let _ = reply.send(Response::Ack(Ack::ok()));
                    let settings = storage::load_or_default(self.store.as_ref()).await;
                    let now = Instant::now();
                    self.with_page(|engine, page| engine.reload_settings(page, settings, now));
                }
                Request::GetHiddenVideos => {
                    let _ = reply.send(Response::HiddenVideos(self.engine.snapshot()));
                }
                other => {
                    tracing::debug!(target: "processor", request = ?other, "ignored message");
                    let _ = reply.send(Response::empty());
                }
            },
        }
    }

    fn dispatch(&self, job: BatchJob, batches: &mut JoinSet<BatchOutcome>) {
        let BatchJob {
            id,
            generation,
            request,
        } = job;
        tracing::debug!(
            target: "processor",
            batch = id,
            generation,
            titles = request.titles.len(),
            "dispatching batch"
        );
        let classifier = Arc::clone(&self.classifier);
        batches.spawn(async move {
            let outcome = AssertUnwindSafe(classifier.classify_batch(&request))
                .catch_unwind()
                .await
                .unwrap_or(Err(ClassifyError::Aborted));
            (id, outcome)
        });
    }

    fn with_page<R>(&mut self, f: impl FnOnce(&mut FilterEngine, &mut P) -> R) -> R {
        let mut page = self.page.lock();
        f(&mut self.engine, &mut *page)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        ai::ClassificationRequest,
        dom::{Document, El, NodeId},
        domain::{HiddenVideosSnapshot, Settings},
        filter::visibility::has_loader,
        infrastructure::shutdown::{Shutdown, ShutdownReason},
        storage::MemoryStore,
    };

    /// Hides every title containing "Stream" and remembers what it was asked.
    #[derive(Default)]
    struct StreamClassifier {
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl BatchClassifier for StreamClassifier {
        async fn classify_batch(
            &self,
            request: &ClassificationRequest,
        ) -> Result<ClassificationMap, ClassifyError> {
            self.calls.lock().push(request.titles.clone());
            Ok(request
                .titles
                .iter()
                .map(|t| (t.clone(), t.contains("Stream")))
                .collect())
        }
    }

    struct PanickingClassifier;

    #[async_trait]
    impl BatchClassifier for PanickingClassifier {
        async fn classify_batch(
            &self,
            _request: &ClassificationRequest,
        ) -> Result<ClassificationMap, ClassifyError> {
            panic!("classifier blew up")
        }
    }

    fn card(title: &str) -> El {
        El::new("ytd-rich-item-renderer")
            .child(El::new("a").attr("id", "video-title").text(title))
    }

    fn page(titles: &[&str]) -> (Arc<Mutex<Document>>, Vec<NodeId>) {
        let mut doc = Document::new("https://www.youtube.com/");
        let body = doc.body();
        let cards = titles.iter().map(|t| doc.build(body, card(t))).collect();
        doc.take_records();
        (Arc::new(Mutex::new(doc)), cards)
    }

    fn ai_settings() -> Settings {
        Settings {
            ai_enabled: true,
            ai_filter: "gaming streams".into(),
            ..Default::default()
        }
    }

    fn hidden(response: Option<Response>) -> HiddenVideosSnapshot {
        match response {
            Some(Response::HiddenVideos(snapshot)) => snapshot,
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_batch_is_classified_and_applied() {
        let (doc, cards) = page(&["Epic Valorant Stream", "My Vacation Vlog"]);
        let classifier = Arc::new(StreamClassifier::default());
        let store = Arc::new(MemoryStore::new(ai_settings()));
        let (processor, handle) = ContentProcessor::new(
            doc.clone(),
            PipelineConfig::default(),
            classifier.clone(),
            store,
        );
        let (shutdown, listener) = Shutdown::new();
        let task = processor.spawn(listener);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(classifier.calls.lock().is_empty());
        assert!(has_loader(&*doc.lock(), cards[0]));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let snapshot = hidden(handle.send(Request::GetHiddenVideos).await);
        assert_eq!(snapshot.ai_count, 1);
        assert_eq!(snapshot.hidden_videos[0].title, "Epic Valorant Stream");
        assert_eq!(classifier.calls.lock().len(), 1);
        assert!(!has_loader(&*doc.lock(), cards[1]));

        shutdown.trigger(ShutdownReason::Requested);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn update_filters_acks_then_refilters() {
        let (doc, _) = page(&["Insane clickbait", "Normal video"]);
        let store = Arc::new(MemoryStore::new(Settings::default()));
        let (processor, handle) = ContentProcessor::new(
            doc.clone(),
            PipelineConfig::default(),
            Arc::new(StreamClassifier::default()),
            store.clone(),
        );
        let (shutdown, listener) = Shutdown::new();
        let task = processor.spawn(listener);

        assert_eq!(hidden(handle.send(Request::GetHiddenVideos).await).total_count, 0);

        store.set(Settings {
            keywords: vec!["clickbait".into()],
            ..Default::default()
        });
        assert_eq!(
            handle.send(Request::UpdateFilters).await,
            Some(Response::Ack(Ack::ok()))
        );
        let snapshot = hidden(handle.send(Request::GetHiddenVideos).await);
        assert_eq!(snapshot.keyword_count, 1);

        {
            let mut page = doc.lock();
            let body = page.body();
            page.build(body, card("more clickbait"));
        }
        let records = doc.lock().take_records();
        assert!(handle.mutations(records).await);
        assert_eq!(hidden(handle.send(Request::GetHiddenVideos).await).total_count, 2);

        assert_eq!(handle.send(Request::TestBackground).await, Some(Response::empty()));

        shutdown.trigger(ShutdownReason::Requested);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_classifier_fails_open() {
        let (doc, cards) = page(&["Epic Valorant Stream"]);
        let (processor, handle) = ContentProcessor::new(
            doc.clone(),
            PipelineConfig::default(),
            Arc::new(PanickingClassifier),
            Arc::new(MemoryStore::new(ai_settings())),
        );
        let (shutdown, listener) = Shutdown::new();
        let task = processor.spawn(listener);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(hidden(handle.send(Request::GetHiddenVideos).await).total_count, 0);
        {
            let page = doc.lock();
            assert!(!has_loader(&*page, cards[0]));
            assert_eq!(page.style(cards[0], "visibility"), None);
        }

        shutdown.trigger(ShutdownReason::Requested);
        task.await.unwrap();
    }
}
