use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use gridlock_common::GameSession;
use gridlock_common::games::blockgrid::{BotController, ShapeCatalog};
use gridlock_common::log;
use gridlock_common::replay::{ReplayLimits, generate_replay_filename, save_replay};

const MIN_THINK_TIME_MS: i64 = 400;
const MAX_THINK_TIME_MS: i64 = 3_000;

#[derive(Clone, Debug)]
pub struct SimulationOptions {
    pub games: u32,
    pub seed: Option<i32>,
    pub max_moves: u32,
    pub save_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedGame {
    pub seed: i32,
    pub score: u32,
    pub moves: u32,
    pub game_over: bool,
    pub verified: bool,
    pub replay_file: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSummary {
    pub games: Vec<SimulatedGame>,
    pub best_score: u32,
    pub average_score: f64,
    pub all_verified: bool,
}

impl SimulationSummary {
    fn from_games(games: Vec<SimulatedGame>) -> Self {
        let best_score = games.iter().map(|g| g.score).max().unwrap_or(0);
        let average_score = if games.is_empty() {
            0.0
        } else {
            games.iter().map(|g| g.score as f64).sum::<f64>() / games.len() as f64
        };
        let all_verified = games.iter().all(|g| g.verified);
        Self {
            games,
            best_score,
            average_score,
            all_verified,
        }
    }
}

/// Plays one bot game. Think time between moves is random so some moves earn
/// the speed bonus and some do not. A fixed seed makes the whole game
/// reproducible.
pub fn simulate_game(
    catalog: Arc<ShapeCatalog>,
    seed: Option<i32>,
    max_moves: u32,
    limits: &ReplayLimits,
    save_dir: Option<&Path>,
) -> Result<SimulatedGame, String> {
    let mut bot = match seed {
        Some(seed) => BotController::new(seed as u64),
        None => BotController::from_random(),
    };
    let mut session = GameSession::start_run(catalog, seed);
    let seed = session.seed();
    let mut think_rng = StdRng::seed_from_u64(!(seed as u64));
    let mut now = chrono::Utc::now().timestamp_millis();

    let moves = session.autoplay(&mut bot, max_moves, || {
        now += think_rng.random_range(MIN_THINK_TIME_MS..=MAX_THINK_TIME_MS);
        now
    });

    let verified = match session.verify(limits) {
        Ok(verdict) => verdict.is_accepted(),
        Err(rejection) => {
            log!("Simulated game {} failed verification: {}", seed, rejection);
            false
        }
    };

    let replay_file = match save_dir {
        Some(dir) => {
            let path = dir.join(generate_replay_filename(seed, session.score()));
            save_replay(&path, &session.replay_state(session.score()))
                .map_err(|e| format!("Failed to save replay {}: {}", path.display(), e))?;
            Some(path.display().to_string())
        }
        None => None,
    };

    log!(
        "Simulated game: seed {}, score {}, {} moves, verified: {}",
        seed,
        session.score(),
        moves,
        verified
    );

    Ok(SimulatedGame {
        seed,
        score: session.score(),
        moves,
        game_over: session.is_game_over(),
        verified,
        replay_file,
    })
}

/// Runs `options.games` games back to back. With a fixed seed, game `i`
/// uses `seed + i`.
pub fn simulate(
    catalog: Arc<ShapeCatalog>,
    options: &SimulationOptions,
    limits: &ReplayLimits,
) -> Result<SimulationSummary, String> {
    if let Some(dir) = &options.save_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    }

    let mut games = Vec::with_capacity(options.games as usize);
    for index in 0..options.games {
        let seed = options.seed.map(|s| s.wrapping_add(index as i32));
        games.push(simulate_game(
            Arc::clone(&catalog),
            seed,
            options.max_moves,
            limits,
            options.save_dir.as_deref(),
        )?);
    }
    Ok(SimulationSummary::from_games(games))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_common::replay::load_replay;

    fn options(games: u32, seed: i32, save_dir: Option<PathBuf>) -> SimulationOptions {
        SimulationOptions {
            games,
            seed: Some(seed),
            max_moves: 40,
            save_dir,
        }
    }

    #[test]
    fn test_simulated_games_verify() {
        let catalog = Arc::new(ShapeCatalog::standard());
        let summary = simulate(catalog, &options(3, 100, None), &ReplayLimits::default()).unwrap();

        assert_eq!(summary.games.len(), 3);
        assert!(summary.all_verified);
        let seeds: Vec<i32> = summary.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102]);
        assert!(summary.games.iter().all(|g| g.moves <= 40));
        assert!(summary.best_score as f64 >= summary.average_score);
    }

    #[test]
    fn test_simulation_saves_loadable_replays() {
        let catalog = Arc::new(ShapeCatalog::standard());
        let dir = std::env::temp_dir().join(format!("gridlock_simulate_{}", std::process::id()));
        let summary = simulate(
            catalog,
            &options(1, i32::MAX, Some(dir.clone())),
            &ReplayLimits::default(),
        )
        .unwrap();

        let game = &summary.games[0];
        let path = PathBuf::from(game.replay_file.as_ref().unwrap());
        let replay = load_replay(&path).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(replay.seed, i32::MAX);
        assert_eq!(replay.final_score, game.score);
        assert_eq!(replay.moves.len(), game.moves as usize);
    }

    #[test]
    fn test_empty_summary() {
        let summary = SimulationSummary::from_games(Vec::new());
        assert_eq!(summary.best_score, 0);
        assert_eq!(summary.average_score, 0.0);
        assert!(summary.all_verified);
    }
}
