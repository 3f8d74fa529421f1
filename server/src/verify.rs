use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;

use gridlock_common::games::blockgrid::ShapeCatalog;
use gridlock_common::log;
use gridlock_common::replay::{REPLAY_FILE_EXTENSION, ReplayLimits, load_replay, verify_claim};

/// One line of verification output.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    pub file: String,
    pub seed: Option<i32>,
    pub accepted: bool,
    pub claimed_score: Option<u32>,
    pub simulated_score: Option<u32>,
    pub moves: usize,
    pub game_over: Option<bool>,
    pub reason: Option<String>,
}

impl VerifyReport {
    fn failed(path: &Path, reason: String) -> Self {
        Self {
            file: path.display().to_string(),
            seed: None,
            accepted: false,
            claimed_score: None,
            simulated_score: None,
            moves: 0,
            game_over: None,
            reason: Some(reason),
        }
    }
}

/// Loads and verifies one replay file. File errors become a rejected report.
pub fn verify_file(catalog: Arc<ShapeCatalog>, path: &Path, limits: &ReplayLimits) -> VerifyReport {
    let replay = match load_replay(path) {
        Ok(replay) => replay,
        Err(e) => {
            log!("Failed to load replay {}: {}", path.display(), e);
            return VerifyReport::failed(path, e.to_string());
        }
    };

    let mut report = VerifyReport {
        file: path.display().to_string(),
        seed: Some(replay.seed),
        accepted: false,
        claimed_score: Some(replay.final_score),
        simulated_score: None,
        moves: replay.moves.len(),
        game_over: None,
        reason: None,
    };

    match verify_claim(catalog, &replay, limits) {
        Ok(verdict) => {
            report.accepted = verdict.is_accepted();
            report.simulated_score = Some(verdict.outcome.final_score);
            report.game_over = Some(verdict.outcome.game_over);
            if !verdict.score_matches() {
                report.reason = Some("Score mismatch".to_string());
            }
        }
        Err(rejection) => {
            report.simulated_score = Some(rejection.score_at_rejection);
            report.reason = Some(rejection.to_string());
        }
    }
    report
}

/// Replay files directly inside `dir`, sorted by path.
pub fn collect_replay_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read directory {}: {}", dir.display(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read directory entry: {}", e))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == REPLAY_FILE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Verifies every replay file in `dir`, one blocking task per file.
/// Reports come back in path order.
pub async fn verify_batch(
    catalog: Arc<ShapeCatalog>,
    dir: &Path,
    limits: ReplayLimits,
) -> Result<Vec<VerifyReport>, String> {
    let files = collect_replay_files(dir)?;
    log!("Verifying {} replays from {}", files.len(), dir.display());

    let mut tasks = JoinSet::new();
    for (index, path) in files.into_iter().enumerate() {
        let catalog = Arc::clone(&catalog);
        tasks.spawn_blocking(move || (index, verify_file(catalog, &path, &limits)));
    }

    let mut reports = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, report) = joined.map_err(|e| format!("Verification task failed: {}", e))?;
        reports.push((index, report));
    }
    reports.sort_by_key(|(index, _)| *index);
    Ok(reports.into_iter().map(|(_, report)| report).collect())
}
