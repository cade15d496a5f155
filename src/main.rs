//! Game Persist entry point
//!
//! On the web the library's `WebBridge` is the entry point. Natively this
//! runs a short demo session against a save file so the save/resume cycle
//! can be watched from a terminal.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use serde::{Deserialize, Serialize};

    use game_persist::{InitInput, Runtime, SavePort};

    /// Stand-in for the real game state
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Progress {
        pub round: u32,
        pub score: u64,
        pub trees_chopped: u32,
    }

    /// Stand-in runtime: each round emits a save
    pub struct Session {
        pub progress: Progress,
        port: SavePort<Progress>,
    }

    impl Session {
        pub fn play_round(&mut self) {
            self.progress.round += 1;
            self.progress.trees_chopped += 3;
            self.progress.score += 10 * u64::from(self.progress.round);
            self.port.send(&self.progress);
        }
    }

    impl Runtime for Session {
        type State = Progress;

        fn init(input: InitInput<Progress>) -> Self {
            Self {
                progress: input.unwrap_or_default(),
                port: SavePort::new(),
            }
        }

        fn save_port(&mut self) -> &mut SavePort<Progress> {
            &mut self.port
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use game_persist::platform::logging;
    use game_persist::{PersistenceBridge, SaveCodec, Settings, StartupOutcome};

    let mut settings = Settings::default();
    if let Some(path) = std::env::args().nth(1) {
        settings.save_path = path.into();
    }
    logging::init(settings.level_filter());

    log::info!("Game Persist (native) using {}", settings.save_path.display());

    let bridge = PersistenceBridge::new(settings.store(), SaveCodec::default());
    let launched = bridge.launch::<demo::Session>();
    let mut session = launched.runtime;
    match launched.outcome {
        StartupOutcome::Empty => println!("No save found, starting a new game"),
        StartupOutcome::Restored { version } => println!(
            "Resumed at round {} (save schema v{})",
            session.progress.round, version
        ),
        StartupOutcome::Discarded(e) => println!("Save unusable ({}), starting a new game", e),
    }

    const ROUNDS: u64 = 3;
    for _ in 0..ROUNDS {
        session.play_round();
    }
    println!(
        "Round {}: score {}, {} trees chopped. Run again to resume.",
        session.progress.round, session.progress.score, session.progress.trees_chopped
    );
    let stats = launched.stats.get();
    if stats.failed + stats.skipped > 0 {
        println!("{} of {} saves were dropped", stats.failed + stats.skipped, ROUNDS);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is game_persist::web::WebBridge, this is just to satisfy the compiler
}
