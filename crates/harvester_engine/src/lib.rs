//! Harvester engine: catalog fetching, record normalization, sinks and the harvest driver.
mod config;
mod driver;
mod fetch;
mod normalize;
mod persist;
mod progress;
mod record;
mod sink;
mod types;

pub use config::{
    ApiKey, ConfigError, HarvestConfig, DEFAULT_BASE_URL, DEFAULT_PACING_MS,
    DEFAULT_TRANSIENT_RETRIES, MAX_CONCURRENCY,
};
pub use driver::{HarvestError, Harvester};
pub use fetch::{CatalogEndpoint, FetchSettings, Fetcher, ReqwestFetcher, ENRICHMENTS};
pub use normalize::{
    select_certification, NormalizedRecord, Normalizer, DEFAULT_CERTIFICATION_REGION,
    JOIN_SEPARATOR,
};
pub use persist::{
    ensure_output_dir, write_manifest, AtomicFileWriter, ManifestSettings, PersistError,
    RunManifest,
};
pub use progress::{ChannelProgressSink, LogProgressSink, NullProgressSink, ProgressSink};
pub use record::{
    CastMember, Credits, CrewMember, KeywordList, Named, RawRecord, RegionRelease, ReleaseDates,
    ReleaseEntry,
};
pub use sink::{
    open_sink, DatasetSink, Delimiter, DelimitedSink, JsonLinesSink, MemorySink, SinkError,
    SinkFormat,
};
pub use types::{FailureKind, FetchError, FetchOutcome, HarvestEvent, HarvestSummary};
