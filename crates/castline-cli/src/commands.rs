//! CLI command implementations

use crate::output::{format_record, json_line, OutputFormat};
use crate::probe::{self, ProbeBackend};
use castline_core::{
    catalog, extract, CapabilityMode, ControllerConfig, HeadlessMedia, MediaHook, PlayPolicy,
    StreamController,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Options for `play`
pub struct PlayOptions {
    pub input: Option<String>,
    pub preset: Option<String>,
    pub no_engine: bool,
    pub native: bool,
    pub block_autoplay: bool,
    pub timeout: u64,
    pub config: Option<PathBuf>,
}

#[derive(Serialize)]
struct SanitizeResult<'a> {
    input: &'a str,
    url: Option<&'a str>,
}

/// Print the URL the controller would load for `input`
pub fn sanitize(input: &str, format: &str) -> bool {
    let url = extract(input);

    match OutputFormat::from(format) {
        OutputFormat::Json => println!(
            "{}",
            json_line(&SanitizeResult {
                input,
                url: url.as_ref().map(|u| u.as_str()),
            })
        ),
        OutputFormat::Text => match &url {
            Some(url) => println!("{}", url),
            None => eprintln!("No HTTP or HTTPS URL found in input"),
        },
    }

    url.is_some()
}

#[derive(Tabled)]
struct PresetRow {
    #[tabled(rename = "ID")]
    id: &'static str,
    #[tabled(rename = "Title")]
    title: &'static str,
    #[tabled(rename = "URL")]
    url: &'static str,
}

/// List the built-in sample streams
pub fn list_catalog(format: &str) {
    match OutputFormat::from(format) {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(catalog::presets()).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Text => {
            let rows: Vec<PresetRow> = catalog::presets()
                .iter()
                .map(|p| PresetRow {
                    id: p.id,
                    title: p.title,
                    url: p.url,
                })
                .collect();
            println!("{}", Table::new(rows));
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ControllerConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(ControllerConfig::from_json(&text)?)
        }
        None => Ok(ControllerConfig::default()),
    }
}

fn resolve_input(opts: &PlayOptions) -> anyhow::Result<String> {
    if let Some(id) = &opts.preset {
        let preset = catalog::find(id)
            .ok_or_else(|| anyhow::anyhow!("Unknown preset '{}' (see `castline catalog`)", id))?;
        return Ok(preset.url.to_string());
    }
    Ok(opts.input.clone().unwrap_or_default())
}

/// Drive one load to a settled state. Returns false when it ends in error.
pub async fn play(opts: PlayOptions, format: &str) -> anyhow::Result<bool> {
    let format = OutputFormat::from(format);
    let config = load_config(opts.config.as_ref())?;
    let timeout = Duration::from_secs(opts.timeout.max(1));

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let backend = ProbeBackend::new(events_tx.clone(), timeout, !opts.no_engine)?;
    let client = backend.client().clone();
    let mut controller = StreamController::with_config(backend, config)?;

    let mut media = HeadlessMedia::new();
    if opts.native {
        media = media.with_native_type(controller.config().native_mime_type.clone());
    }
    if opts.block_autoplay {
        media = media.with_play_policy(PlayPolicy::Block(
            "play() request was blocked by the autoplay policy".into(),
        ));
    }
    controller.bind_media(media);
    controller.set_url(resolve_input(&opts)?);

    let spinner = match format {
        OutputFormat::Text => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
        OutputFormat::Json => ProgressBar::hidden(),
    };

    controller.load_stream();

    // Native mode has no engine; stand in for the element's own loader
    if controller.mode() == Some(CapabilityMode::Native) {
        if let (Some(token), Some(url)) = (controller.session_token(), controller.session_url()) {
            let armed = controller.media().map(|m| m.armed(token)).unwrap_or_default();
            if armed.contains(&MediaHook::MetadataLoaded) {
                let url = url.to_string();
                let client = client.clone();
                let tx = events_tx.clone();
                tokio::spawn(async move {
                    let event = probe::probe_native(&client, &url).await;
                    let _ = tx.send((token, event));
                });
            }
        }
    }

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let mut printed = 0u64;
    let mut timed_out = false;

    loop {
        let since = printed;
        for record in controller.history().records().filter(|r| r.sequence > since) {
            spinner.println(format_record(record, format));
            printed = record.sequence;
        }

        let settled = !controller.is_session_active()
            || controller.phase().is_some_and(|phase| phase.is_settled());
        if settled {
            break;
        }
        if let Some(phase) = controller.phase() {
            spinner.set_message(format!("{} ({})", controller.url(), phase));
        }

        tokio::select! {
            Some((token, event)) = events_rx.recv() => {
                debug!(token = %token, event = event.name(), "Event received");
                controller.handle_event(token, event);
            }
            _ = &mut deadline => {
                timed_out = true;
                break;
            }
        }
    }

    spinner.finish_and_clear();

    if timed_out {
        warn!(timeout_secs = timeout.as_secs(), "Stream did not settle in time");
        eprintln!("Timed out after {}s waiting for the stream to settle", timeout.as_secs());
        return Ok(false);
    }

    if format == OutputFormat::Json {
        println!("{}", json_line(&controller.view()));
    }

    Ok(!controller.status().is_error())
}
