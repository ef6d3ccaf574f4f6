use std::path::Path;

use anyhow::{Context, Result};
use blocker_core::{find_match, update, Msg, RuleSet, Session, Step};
use blocker_engine::{
    load_snapshot, scan_document, settings_from_stored, write_atomic, Background, HtmlSurface,
    Pipeline, RehearsalSurface, RonFileStore, SettingsStore,
};
use blocker_logging::{blocker_info, blocker_warn};

use crate::cli::Answer;
use crate::config::RunnerConfig;

/// Dry run: extracts every post of `snapshot` and reports the match decision for each.
pub fn scan(config: &RunnerConfig, snapshot: &Path, rule_overrides: &[String]) -> Result<()> {
    let profile = config.profile.compile().context("invalid surface profile")?;
    let page = load_snapshot(snapshot)?;
    blocker_info!("Loaded {:?} ({})", snapshot, page.encoding_label);

    let stored = RonFileStore::new(&config.settings_path)
        .load()
        .context("failed to load settings")?;
    let mut settings = settings_from_stored(&stored);
    if !rule_overrides.is_empty() {
        settings.rules = RuleSet::from_tokens(rule_overrides);
    }
    // Report every decision, even when blocking is switched off in the store.
    settings.enabled = true;

    let surface = HtmlSurface::parse(&page.html);
    let candidates = scan_document(&surface, &profile);
    for candidate in &candidates {
        let record = &candidate.record;
        let author = record
            .identity
            .as_ref()
            .map_or_else(|| "<unresolved>".to_string(), |identity| format!("@{identity}"));
        match find_match(record, &settings.rules) {
            Some(matched) => println!(
                "{author:<24} {:?} matched in {}",
                matched.rule,
                matched.reason.as_str()
            ),
            None => println!("{author:<24} -"),
        }
    }

    let scanned = candidates.len();
    let session = Session::new(settings, config.timings());
    let (session, _) = update(session, Msg::ScanCompleted(candidates));
    let view = session.view();
    let would_block: Vec<String> = view
        .active_identity
        .into_iter()
        .chain(view.queued)
        .map(|identity| format!("@{identity}"))
        .collect();
    println!(
        "\n{scanned} posts scanned, {} authors would be blocked: {}",
        would_block.len(),
        would_block.join(", ")
    );
    Ok(())
}

/// Runs the pipeline against `snapshot` through the rehearsal surface, with real timers.
pub async fn rehearse(
    config: &RunnerConfig,
    snapshot: &Path,
    answer: Answer,
    output: Option<&Path>,
) -> Result<()> {
    let profile = config.profile.compile().context("invalid surface profile")?;
    let page = load_snapshot(snapshot)?;
    let surface = RehearsalSurface::parse(&page.html, profile.clone());
    let channel = Background::new(RonFileStore::new(&config.settings_path));
    let mut pipeline = Pipeline::new(
        surface,
        profile,
        channel,
        config.timings(),
        config.sync_interval(),
    );

    pipeline.activate();
    loop {
        let awaiting = pipeline.view().step == Some(Step::AwaitingManualConfirm)
            && pipeline.surface().pending_confirmation().is_some();
        if awaiting && answer != Answer::Wait {
            blocker_info!("Answering the confirmation sheet: {:?}", answer);
            pipeline
                .surface_mut()
                .answer_confirmation(answer == Answer::Confirm)?;
            pipeline.observe();
            continue;
        }
        if !pipeline.advance().await {
            break;
        }
    }
    if pipeline.session().is_processing() {
        blocker_warn!("Stopped while a confirmation sheet is still open");
    }

    let view = pipeline.view();
    let blocked: Vec<String> = pipeline
        .surface()
        .blocked()
        .iter()
        .map(|identity| format!("@{identity}"))
        .collect();
    println!(
        "{} queued, {} blocked, {} failed, {} discarded, {} closed by hand, {} expired",
        view.stats.enqueued,
        view.stats.blocked,
        view.stats.failed,
        view.stats.discarded,
        view.stats.manually_closed,
        view.stats.manual_expired
    );
    println!("Blocked on the page: {}", blocked.join(", "));

    if let Some(path) = output {
        write_atomic(path, &pipeline.surface().dom().to_html())
            .with_context(|| format!("failed to write {}", path.display()))?;
        blocker_info!("Wrote rehearsed page to {:?}", path);
    }
    Ok(())
}
