//! Shared application state

use closurecast_core::DocumentEntry;
use closurecast_model::{ModelPackage, PredictionService};
use closurecast_rag::{
    ContextAssembler, Corpus, GeminiBackend, GeminiConfig, GenerationBackend, GenerationClient,
    LexicalIndex, PromptTemplate, RetryPolicy,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Prediction service, absent when the model failed to load
    pub prediction: Option<Arc<PredictionService>>,

    /// Context assembly over the knowledge corpus (possibly empty)
    pub assembler: Arc<ContextAssembler>,

    /// Whether the corpus file was loaded
    pub corpus_loaded: bool,

    /// Generation client, absent without an API key
    pub generator: Option<Arc<GenerationClient>>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Load the model, corpus and generation client.
    ///
    /// Load failures are logged and leave the matching capability disabled;
    /// the server still starts and reports them through `/health`.
    pub fn initialize(config: ServerConfig) -> anyhow::Result<Self> {
        let prediction = match ModelPackage::load(&config.model_path) {
            Ok(package) => Some(Arc::new(PredictionService::new(Arc::new(package)))),
            Err(e) => {
                error!("Failed to load model from {}: {}", config.model_path, e);
                None
            }
        };

        let (corpus, corpus_loaded) = match Corpus::load(&config.corpus_path) {
            Ok(corpus) => (corpus, true),
            Err(e) => {
                error!("Failed to load documents from {}: {}", config.corpus_path, e);
                (Corpus::default(), false)
            }
        };

        let assembler = build_assembler(&config, Arc::new(corpus))?;

        let generator = match &config.gemini.api_key {
            Some(key) => {
                let gemini = GeminiConfig::new(key.clone())
                    .with_model(config.gemini.model.clone())
                    .with_base_url(config.gemini.base_url.clone())
                    .with_timeout(config.gemini.timeout());
                match GeminiBackend::new(gemini) {
                    Ok(backend) => {
                        info!("Gemini client initialized (model: {})", backend.model());
                        Some(Arc::new(build_generator(&config, Arc::new(backend))))
                    }
                    Err(e) => {
                        error!("Failed to initialize Gemini client: {}", e);
                        None
                    }
                }
            }
            None => {
                warn!("GEMINI_API_KEY is not set; chat is disabled");
                None
            }
        };

        Ok(Self {
            config: Arc::new(config),
            prediction,
            assembler: Arc::new(assembler),
            corpus_loaded,
            generator,
            metrics_handle: None,
        })
    }

    /// State with no model, an empty corpus and no generator
    pub fn empty(config: ServerConfig) -> anyhow::Result<Self> {
        let assembler = build_assembler(&config, Arc::new(Corpus::default()))?;

        Ok(Self {
            config: Arc::new(config),
            prediction: None,
            assembler: Arc::new(assembler),
            corpus_loaded: false,
            generator: None,
            metrics_handle: None,
        })
    }

    pub fn with_prediction(mut self, service: PredictionService) -> Self {
        self.prediction = Some(Arc::new(service));
        self
    }

    /// Replace the corpus and mark it loaded
    pub fn with_documents(mut self, entries: Vec<DocumentEntry>) -> anyhow::Result<Self> {
        let assembler = build_assembler(&self.config, Arc::new(Corpus::new(entries)))?;
        self.assembler = Arc::new(assembler);
        self.corpus_loaded = true;
        Ok(self)
    }

    pub fn with_generator(mut self, client: GenerationClient) -> Self {
        self.generator = Some(Arc::new(client));
        self
    }

    pub fn with_metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    pub fn model_loaded(&self) -> bool {
        self.prediction.is_some()
    }
}

fn build_assembler(config: &ServerConfig, corpus: Arc<Corpus>) -> anyhow::Result<ContextAssembler> {
    let index = LexicalIndex::new(corpus.clone())?.with_top_k(config.retrieval.top_k);
    let mut assembler = ContextAssembler::new(Arc::new(index), corpus)
        .with_fallback_count(config.retrieval.fallback_count);

    if let Some(template) = &config.retrieval.prompt_template {
        assembler = assembler.with_template(PromptTemplate::new(template.clone())?);
    }

    Ok(assembler)
}

/// Wrap a backend in the configured retry policy
pub fn build_generator(
    config: &ServerConfig,
    backend: Arc<dyn GenerationBackend>,
) -> GenerationClient {
    GenerationClient::new(backend).with_policy(RetryPolicy::new(
        config.gemini.max_retries,
        config.gemini.backoff(),
    ))
}
