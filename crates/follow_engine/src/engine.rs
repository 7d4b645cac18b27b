use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use engine_logging::{engine_error, engine_info};
use follow_core::{update, Effect, Msg, RunState, RunStatus, Stage};
use tokio::sync::{mpsc, watch};

use crate::assets::{AssetMaterializer, HttpImageConverter, ImageConverter, MaterializerSettings};
use crate::collector::{collect_with_fallback, CollectorSettings};
use crate::fallback::FallbackFetcher;
use crate::fetch::{PageFetcher, ProgressSink};
use crate::http::{ApiClient, CredentialProvider};
use crate::identity::{IdentityResolver, SubjectHint};
use crate::primary::PrimaryFetcher;
use crate::{EngineConfig, FetchError, ProgressUpdate};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("invalid engine configuration: {0}")]
    Config(#[from] FetchError),
}

/// Acknowledgement of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAck {
    Started,
    AlreadyRunning,
    /// The engine worker is gone.
    Unavailable,
}

enum EngineCommand {
    /// Runs the effects produced by an accepted `StartRequested`.
    Start {
        hint: SubjectHint,
        effects: Vec<Effect>,
    },
}

/// Publishes every state transition. All writes go through the reducer under
/// the watch lock, so "is a run active" and the published status never disagree.
struct StatePublisher {
    tx: watch::Sender<RunState>,
}

impl StatePublisher {
    /// Accepts a start unless a run is active. Returns the effects of the new run.
    fn try_begin(&self) -> Option<Vec<Effect>> {
        let mut effects = None;
        self.tx.send_if_modified(|state| {
            if state.status() == RunStatus::Running {
                return false;
            }
            let (next, produced) = update(std::mem::take(state), Msg::StartRequested);
            *state = next;
            effects = Some(produced);
            true
        });
        effects
    }

    fn apply(&self, msg: Msg) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.tx.send_modify(|state| {
            let (next, produced) = update(std::mem::take(state), msg);
            *state = next;
            effects = produced;
        });
        effects
    }

    fn current_stage(&self) -> Option<Stage> {
        self.tx.borrow().stage()
    }
}

impl ProgressSink for StatePublisher {
    fn emit(&self, update: ProgressUpdate) {
        self.apply(Msg::Progress {
            percent: update.percent,
            message: update.message,
        });
    }
}

/// Collaborators of one run.
struct Orchestrator {
    resolver: IdentityResolver,
    primary: Arc<dyn PageFetcher>,
    fallback: Arc<dyn PageFetcher>,
    converter: Arc<dyn ImageConverter>,
    collector: CollectorSettings,
    materializer: MaterializerSettings,
}

impl Orchestrator {
    fn new(
        config: &EngineConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, FetchError> {
        let endpoints = &config.endpoints;
        let client = Arc::new(ApiClient::new(&endpoints.base_url, &config.fetch, credentials)?);
        Ok(Self {
            resolver: IdentityResolver::new(client.clone()),
            primary: Arc::new(PrimaryFetcher::new(client.clone(), endpoints.page_size)),
            fallback: Arc::new(FallbackFetcher::with_query_hashes(
                client.clone(),
                endpoints.page_size,
                endpoints.followers_query_hash.clone(),
                endpoints.following_query_hash.clone(),
            )),
            converter: Arc::new(HttpImageConverter::new(client)),
            collector: config.collector.clone(),
            materializer: config.materializer.clone(),
        })
    }

    async fn run(&self, hint: &SubjectHint, effects: Vec<Effect>, publisher: &StatePublisher) {
        let mut pending: VecDeque<Effect> = effects.into();
        while let Some(effect) = pending.pop_front() {
            let msg = self.execute(effect, hint, publisher).await;
            pending.extend(publisher.apply(msg));
        }
    }

    async fn execute(&self, effect: Effect, hint: &SubjectHint, sink: &dyn ProgressSink) -> Msg {
        match effect {
            Effect::ResolveIdentity => match self.resolver.resolve(hint).await {
                Ok(identity) => Msg::IdentityResolved(identity),
                Err(err) => Msg::StageFailed {
                    stage: Stage::ResolvingIdentity,
                    reason: err.to_string(),
                },
            },
            Effect::Collect { subject, kind } => {
                engine_info!("Collecting {} for {}", kind, subject);
                match collect_with_fallback(
                    self.primary.as_ref(),
                    self.fallback.as_ref(),
                    &self.collector,
                    sink,
                    &subject,
                    kind,
                )
                .await
                {
                    Ok(result) => Msg::Collected { kind, result },
                    Err(err) => Msg::StageFailed {
                        stage: Stage::collecting(kind),
                        reason: err.to_string(),
                    },
                }
            }
            Effect::MaterializeAssets { entries } => {
                let materializer = AssetMaterializer::new(self.converter.as_ref(), &self.materializer);
                Msg::AssetsMaterialized(materializer.materialize(entries, sink).await)
            }
        }
    }
}

/// Host-facing control surface: start a run, poll it, check liveness.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
    state_rx: watch::Receiver<RunState>,
    publisher: Arc<StatePublisher>,
}

impl EngineHandle {
    pub fn new(
        config: EngineConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, EngineError> {
        let orchestrator = Orchestrator::new(&config, credentials)?;
        Self::spawn(orchestrator)
    }

    fn spawn(orchestrator: Orchestrator) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(RunState::new());

        let orchestrator = Arc::new(orchestrator);
        let publisher = Arc::new(StatePublisher { tx: state_tx });
        let worker_publisher = publisher.clone();
        thread::spawn(move || {
            let publisher = worker_publisher;
            runtime.block_on(async move {
                while let Some(command) = cmd_rx.recv().await {
                    match command {
                        EngineCommand::Start { hint, effects } => {
                            let run_orchestrator = orchestrator.clone();
                            let run_publisher = publisher.clone();
                            let outcome = tokio::spawn(async move {
                                run_orchestrator.run(&hint, effects, &run_publisher).await;
                            })
                            .await;
                            if let Err(err) = outcome {
                                engine_error!("Run aborted: {}", err);
                                let stage = publisher
                                    .current_stage()
                                    .unwrap_or(Stage::ResolvingIdentity);
                                publisher.apply(Msg::StageFailed {
                                    stage,
                                    reason: format!("internal error: {err}"),
                                });
                            }
                        }
                    }
                }
            });
        });

        Ok(Self {
            cmd_tx,
            state_rx,
            publisher,
        })
    }

    /// Begins a run in the background and returns immediately. On `Started` the
    /// published state is already `Running`.
    pub fn start(&self, hint: SubjectHint) -> StartAck {
        if self.cmd_tx.is_closed() {
            return StartAck::Unavailable;
        }
        let Some(effects) = self.publisher.try_begin() else {
            return StartAck::AlreadyRunning;
        };
        if self.cmd_tx.send(EngineCommand::Start { hint, effects }).is_err() {
            self.publisher.apply(Msg::StageFailed {
                stage: Stage::ResolvingIdentity,
                reason: "engine worker stopped".to_string(),
            });
            return StartAck::Unavailable;
        }
        StartAck::Started
    }

    /// Snapshot of the current run; never blocks the run.
    pub fn poll_status(&self) -> RunState {
        self.state_rx.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state_rx.clone()
    }

    /// Whether the engine worker is alive, regardless of run state.
    pub fn ping(&self) -> bool {
        !self.cmd_tx.is_closed()
    }
}
