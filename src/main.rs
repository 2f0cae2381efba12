//! Sniffy Flight entry point
//!
//! On the web the page drives `platform::web::WebGame`. Natively this runs a
//! headless demo: autopilot runs played through the full progression sequence
//! against a local leaderboard, with presentations acknowledged automatically.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use sniffy_flight::consts::FRAME_MS;
    use sniffy_flight::leaderboard::Leaderboard;
    use sniffy_flight::platform::{self, storage::JsonFileStore};
    use sniffy_flight::submission::{LeaderboardQuery, LeaderboardService};
    use sniffy_flight::{Cue, GameContext, Tuning};

    /// Frames before an autopilot run is abandoned as "won"
    const MAX_RUN_FRAMES: u32 = 60 * 60 * 5;
    const RUNS: u32 = 3;

    fn load_tuning() -> Tuning {
        let Ok(path) = std::env::var("SNIFFY_TUNING") else {
            return Tuning::default();
        };
        let loaded = std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|err| err.to_string()));
        match loaded {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(err) => {
                log::warn!("Ignoring tuning file {}: {}", path, err);
                Tuning::default()
            }
        }
    }

    pub fn run() {
        platform::init_logging();
        log::info!("Sniffy Flight (native) starting...");

        let save_path =
            std::env::var("SNIFFY_SAVE").unwrap_or_else(|_| "sniffy-save.json".to_string());
        let store = JsonFileStore::open(&save_path);
        let mut board = Leaderboard::load(&JsonFileStore::open(format!("{}.board", save_path)));
        let mut game = GameContext::new(store, load_tuning(), rand::random::<u64>());
        game.set_autopilot(true);

        for n in 1..=RUNS {
            if !game.start_run() {
                log::warn!("Could not start run {}", n);
                break;
            }
            let mut frames = 0;
            while game.is_running() && frames < MAX_RUN_FRAMES {
                for cue in game.step(FRAME_MS).cues {
                    if let Cue::Pass { points, golden } = cue {
                        log::debug!("+{} {}", points, if golden { "(golden)" } else { "" });
                    }
                }
                frames += 1;
            }
            if game.is_running() {
                log::info!("Run {} survived {} frames, stopping the demo", n, frames);
                break;
            }
            let score = game.run().map_or(0, |run| run.score);
            log::info!("Run {} over: {} points", n, score);

            while !game.can_start_run() {
                game.submit_pending(&mut board);
                for cue in game.step(FRAME_MS).cues {
                    match cue {
                        Cue::MilestoneReached { threshold } => {
                            log::info!("Milestone {} reached", threshold)
                        }
                        Cue::RankTierReached { tier } => log::info!("{}", tier.message()),
                        Cue::RewardUnlockClick { reward: Some(id) } => {
                            log::info!("Loot box: {}", game.catalog().name(id))
                        }
                        Cue::CollectionComplete => log::info!("Collection complete!"),
                        _ => {}
                    }
                }
                game.acknowledge();
            }
        }

        let progress = game.progress();
        let (have, total) = game.catalog().regular_progress(&progress.unlocked);
        log::info!(
            "Cumulative {} / best {} / {} of {} loot cosmetics ({} unlocked overall)",
            progress.cumulative_score,
            progress.best_score,
            have,
            total,
            progress.unlocked.len()
        );
        if let Ok(top) = board.query(&LeaderboardQuery::default()) {
            for (rank, entry) in top.iter().enumerate() {
                println!("{:>2}. {:<16} {:>6}", rank + 1, entry.name, entry.score);
            }
        }
        let mut board_store = JsonFileStore::open(format!("{}.board", save_path));
        if let Err(err) = board.save(&mut board_store) {
            log::warn!("Failed to save leaderboard: {}", err);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::WebGame, this is just to satisfy the compiler
}
