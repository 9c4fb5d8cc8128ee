//! Bounded concurrent template downloader.
//!
//! Every catalog entry is fetched exactly once through a shared semaphore,
//! successful bodies are written to `<output_dir>/<name>`, and the outcomes
//! are folded into a [`FetchReport`] in catalog order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use templatesmith_shared::{
    FetchCatalogEntry, FetchConfig, FetchOutcome, FetchReport, Result, TemplatesmithError,
};

/// User-Agent string for download requests.
const USER_AGENT: &str = concat!("Templatesmith/", env!("CARGO_PKG_VERSION"));

/// Suffix for in-progress writes; renamed into place once complete.
const PART_SUFFIX: &str = ".part";

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for download runs.
pub trait FetchProgress: Send + Sync {
    /// Called once before the first download starts.
    fn start(&self, total: usize);
    /// Called for every entry, in catalog order.
    fn entry_done(&self, outcome: &FetchOutcome, completed: usize, total: usize);
    /// Called after the report has been built.
    fn finish(&self, report: &FetchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentFetchProgress;

impl FetchProgress for SilentFetchProgress {
    fn start(&self, _total: usize) {}
    fn entry_done(&self, _outcome: &FetchOutcome, _completed: usize, _total: usize) {}
    fn finish(&self, _report: &FetchReport) {}
}

// ---------------------------------------------------------------------------
// TemplateFetcher
// ---------------------------------------------------------------------------

/// Downloads catalog entries from a bucket prefix into a local directory.
pub struct TemplateFetcher {
    config: FetchConfig,
    base_url: Url,
    client: Client,
}

impl TemplateFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                TemplatesmithError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        let base_url = parse_base_url(&config.base_url)?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Directory templates are written into.
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Fetch every entry of `catalog` and report which ones failed.
    ///
    /// Individual failures never abort the run; the report is always produced.
    #[instrument(skip_all, fields(entries = catalog.len(), out = %self.config.output_dir.display()))]
    pub async fn fetch_all(
        &self,
        catalog: &[FetchCatalogEntry],
        progress: &dyn FetchProgress,
    ) -> Result<FetchReport> {
        let start_time = Instant::now();

        for entry in catalog {
            validate_entry_name(&entry.name)?;
        }

        let out_dir = &self.config.output_dir;
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| TemplatesmithError::io(out_dir, e))?;

        let total = catalog.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        info!(
            total,
            concurrency = self.config.concurrency,
            base_url = %self.base_url,
            "starting template download"
        );
        progress.start(total);

        let mut handles = Vec::with_capacity(total);
        for entry in catalog {
            let client = self.client.clone();
            let sem = semaphore.clone();
            let name = entry.name.clone();
            let url = self.entry_url(&name);
            let target = out_dir.join(&name);

            handles.push(tokio::spawn(async move {
                let result = match url {
                    Ok(url) => match sem.acquire_owned().await {
                        Ok(_permit) => download_to(&client, &url, &target).await,
                        Err(e) => Err(TemplatesmithError::Network(format!(
                            "worker pool closed: {e}"
                        ))),
                    },
                    Err(e) => Err(e),
                };
                (name, result)
            }));
        }

        // Join in spawn order so the report mirrors the catalog.
        let mut outcomes = Vec::with_capacity(total);
        for (idx, (entry, handle)) in catalog.iter().zip(handles).enumerate() {
            let outcome = match handle.await {
                Ok((name, Ok(bytes))) => {
                    debug!(%name, bytes, "template saved");
                    FetchOutcome {
                        name,
                        succeeded: true,
                        error: None,
                    }
                }
                Ok((name, Err(e))) => {
                    warn!(%name, error = %e, "template download failed");
                    FetchOutcome {
                        name,
                        succeeded: false,
                        error: Some(e.to_string()),
                    }
                }
                Err(e) => {
                    warn!(name = %entry.name, error = %e, "download task aborted");
                    FetchOutcome {
                        name: entry.name.clone(),
                        succeeded: false,
                        error: Some(format!("task: {e}")),
                    }
                }
            };
            progress.entry_done(&outcome, idx + 1, total);
            outcomes.push(outcome);
        }

        let report = FetchReport::from_outcomes(&outcomes);
        progress.finish(&report);

        info!(
            succeeded = report.succeeded,
            failed = report.failed.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "template download completed"
        );

        Ok(report)
    }

    fn entry_url(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|e| TemplatesmithError::Network(format!("invalid URL for {name}: {e}")))
    }
}

/// Parse the bucket prefix, forcing a trailing slash so `join` appends.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized)
        .map_err(|e| TemplatesmithError::config(format!("invalid base URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TemplatesmithError::config(format!(
            "unsupported base URL scheme '{other}'"
        ))),
    }
}

/// Entry names become file names, so they must stay inside the output directory.
fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(TemplatesmithError::validation(format!(
            "catalog entry '{name}' is not a plain file name"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

/// GET `url` and, on a success status, write the body to `target`.
///
/// Returns the number of bytes written. A failure leaves any existing file
/// at `target` untouched.
async fn download_to(client: &Client, url: &Url, target: &Path) -> Result<usize> {
    debug!(%url, "fetching template");

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| TemplatesmithError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TemplatesmithError::Network(format!("{url}: HTTP {status}")));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TemplatesmithError::Network(format!("{url}: body read failed: {e}")))?;

    let part = part_path(target);
    tokio::fs::write(&part, &body)
        .await
        .map_err(|e| TemplatesmithError::io(&part, e))?;

    if let Err(e) = tokio::fs::rename(&part, target).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(TemplatesmithError::io(target, e));
    }

    Ok(body.len())
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}
