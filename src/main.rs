//! Neon Arcade entry point
//!
//! Native builds run every arcade game headless under the autopilot and
//! feed the results into a profile. The browser build uses the library's
//! `web` bindings instead.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use neon_arcade::{Profile, Settings};
    use neon_arcade::adventure::{Adventure, Location};
    use neon_arcade::consts::TICK_INTERVAL_MS;
    use neon_arcade::sim::{GameConfig, GameKind, GameLoop, SessionId, autopilot};

    /// Two minutes of 60 Hz frames
    const MAX_FRAMES: usize = 60 * 120;
    /// Host frame spacing (60 Hz display)
    const FRAME_MS: f64 = 1000.0 / 60.0;

    pub fn run(seed: u64, settings: &Settings) -> Profile {
        let mut game_loop = GameLoop::new(Profile::demo());

        for game in GameKind::ALL {
            game_loop.start(&GameConfig::new(game, seed).with_settings(settings));
            let mut t = 0.0;
            let mut frames = 0;
            while frames < MAX_FRAMES {
                let input = match game_loop.session() {
                    Some(session) => autopilot::input(session),
                    None => break,
                };
                if !game_loop.frame(t, &input) {
                    break;
                }
                t += FRAME_MS;
                frames += 1;
            }

            if let Some(session) = game_loop.session() {
                log::info!(
                    "{}: {} ticks ({:.1}s logical), score {}, level {}, outcome {:?}",
                    game.id(),
                    session.ticks,
                    session.ticks as f64 * TICK_INTERVAL_MS / 1000.0,
                    session.score,
                    session.level,
                    session.outcome
                );
            }
            game_loop.stop();
        }

        let mut profile = game_loop.sink().clone();
        run_adventure(seed, settings.max_particles(), &mut profile);
        profile
    }

    /// Wander until the hero falls or the step budget runs out
    fn run_adventure(seed: u64, max_particles: usize, profile: &mut Profile) {
        let mut adventure = Adventure::new(seed, SessionId(u64::MAX), max_particles);
        for step in 0..200 {
            if adventure.over {
                break;
            }
            if adventure.health < 40 && adventure.use_potion().is_ok() {
                log::debug!("Potion used at step {}", step);
            }
            if adventure.location == Location::QuestBoard && adventure.quests_accepted == 0 {
                match adventure.accept_quest() {
                    Ok(points) => log::debug!("Quest accepted at step {} (+{})", step, points),
                    Err(e) => log::warn!("Quest not accepted: {}", e),
                }
            }
            let exits = adventure.location.exits();
            let to = exits[(seed as usize + step) % exits.len()];
            match adventure.travel(to, profile) {
                Ok(report) => log::debug!("{:?}", report),
                Err(e) => {
                    log::warn!("Adventure stopped: {}", e);
                    break;
                }
            }
        }
        log::info!(
            "mystic-legends: score {}, health {}, items {}",
            adventure.score,
            adventure.health,
            adventure.inventory.len()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let quality = args
        .next()
        .and_then(|s| neon_arcade::QualityPreset::parse(&s))
        .unwrap_or_default();
    log::info!(
        "Neon Arcade (native, headless) starting with seed {}, quality {}",
        seed,
        quality.as_str()
    );

    let settings = neon_arcade::Settings::from_preset(quality);
    let profile = headless::run(seed, &settings);
    println!(
        "{} - level {}, {} runs recorded",
        profile.username, profile.level, profile.games_played
    );
    for (game, score) in &profile.high_scores {
        println!("  {:<20} best {}", game, score);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser entry points live in `neon_arcade::web`
}
