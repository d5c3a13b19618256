//! Rehearsal Cache - demo workload
//!
//! Replays a short script through a cached, coalescing synthesis front and
//! logs the resulting metrics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rehearsal_cache::{CacheConfig, CachedFetcher, RequestFingerprint};

const SCRIPT: &[(&str, &str)] = &[
    ("HAMLET", "To be, or not to be, that is the question"),
    ("OPHELIA", "Good my lord, how does your honour for this many a day?"),
    ("HAMLET", "To be, or not to be, that is the question"),
    ("HAMLET", "I humbly thank you; well, well, well."),
    ("OPHELIA", "Good my lord, how does your honour for this many a day?"),
    ("HAMLET", "To be, or not to be, that is the question"),
];

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cached fetcher and start the expiry sweeper if configured
/// 4. Issue every script line twice, concurrently
/// 5. Log the metrics snapshot and dispose of the fetcher
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rehearsal_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env().context("invalid cache configuration")?;
    info!(
        "Configuration loaded: capacity={}, ttl_ms={}, sweep_interval_ms={:?}",
        config.capacity, config.ttl_ms, config.sweep_interval_ms
    );

    let mut fetcher = CachedFetcher::<String, String>::new(&config)?;
    if fetcher.spawn_sweeper() {
        info!("Expiry sweeper started");
    }
    let fetcher = Arc::new(fetcher);
    let synth_calls = Arc::new(AtomicUsize::new(0));

    let mut requests = JoinSet::new();
    for _round in 0..2 {
        for &(voice, text) in SCRIPT {
            let fetcher = Arc::clone(&fetcher);
            let synth_calls = Arc::clone(&synth_calls);
            requests.spawn(async move {
                let key = RequestFingerprint::new()
                    .field("text", text)
                    .field("voice", voice)
                    .field("emotion", "neutral")
                    .into_key("tts");
                let result = fetcher
                    .get_or_fetch(&key, move || synthesize(synth_calls, voice, text))
                    .await;
                (voice, result)
            });
        }
    }

    while let Some(joined) = requests.join_next().await {
        match joined.context("request task panicked")? {
            (voice, Ok(clip)) => info!(voice = voice, clip = %clip, "Line ready"),
            (voice, Err(err)) => warn!(voice = voice, error = %err, "Line failed"),
        }
    }

    let metrics = fetcher.metrics().await;
    info!(
        "Synthesis calls: {} for {} requests",
        synth_calls.load(Ordering::SeqCst),
        SCRIPT.len() * 2
    );
    info!(
        "Cache metrics: {}",
        serde_json::to_string_pretty(&metrics).context("serializing metrics")?
    );

    match Arc::try_unwrap(fetcher) {
        Ok(fetcher) => fetcher.dispose(),
        Err(_) => warn!("Fetcher still shared at shutdown"),
    }
    Ok(())
}

/// Stand-in for a text-to-speech API call.
async fn synthesize(
    calls: Arc<AtomicUsize>,
    voice: &'static str,
    text: &'static str,
) -> Result<String, String> {
    let n = calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(40)).await;
    Ok(format!(
        "clip-{:03}-{}-{}.mp3",
        n,
        voice.to_lowercase(),
        text.len()
    ))
}
