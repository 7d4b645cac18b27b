//! Follow audit engine: transports, collection, asset materialization and the
//! effect runner behind the host-facing handle.
mod assets;
mod collector;
mod config;
mod decode;
mod engine;
mod export;
mod fallback;
mod fetch;
mod http;
mod identity;
mod persist;
mod primary;
mod retry;
mod types;
mod wire;

pub use assets::{
    AssetMaterializer, ConvertError, HttpImageConverter, ImageConverter, MaterializerSettings,
};
pub use collector::{collect_with_fallback, CollectError, CollectorSettings, ListCollector};
pub use config::{EngineConfig, Endpoints, DEFAULT_BASE_URL};
pub use decode::{decode_document, DecodeError};
pub use engine::{EngineError, EngineHandle, StartAck};
pub use export::{build_report, export_report, ExportError, ExportSummary};
pub use fallback::{FallbackFetcher, FOLLOWERS_QUERY_HASH, FOLLOWING_QUERY_HASH};
pub use fetch::{PageFetcher, ProgressSink};
pub use http::{ApiClient, CredentialProvider, FetchSettings, StaticCredentials};
pub use identity::{detect_handle, find_user_id, IdentityError, IdentityResolver, SubjectHint};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use primary::PrimaryFetcher;
pub use retry::{page_pause, RetryBudget, RetryDecision, RetryPolicy};
pub use types::{Cursor, FailureClass, FailureKind, FetchError, Page, ProgressUpdate};
