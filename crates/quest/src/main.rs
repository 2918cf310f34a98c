mod bootstrap;
mod session;

use std::io::{self, BufRead, Write};

use tracing::{error, info};
use world::{EmptyChests, MapAtlas};

use bootstrap::{bundled_tiles, init_tracing, load_settings, resolve_paths, AppError};
use session::{start_player, Session};

fn main() {
    init_tracing();
    info!("=== Text Quest Startup ===");

    if let Err(err) = run() {
        error!(error = %err, "startup_failed");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let paths = resolve_paths()?;
    let settings = load_settings(&paths)?;

    // Deliberately the reverse of `discover_tiles`, which prefers the bundle:
    // the binary lets an edited assets directory override its compiled-in map,
    // so the bundle is only handed over when the directory is absent.
    let bundle = (!settings.maps_dir.join(&settings.map_name).is_dir())
        .then(|| bundled_tiles(&settings.maps_dir));
    let mut atlas = MapAtlas::open(bundle, &settings.maps_dir, &settings.map_name)?;
    let player = start_player(&mut atlas, &settings)?;
    let mut session = Session::new(
        atlas,
        player,
        settings.save_path.clone(),
        Box::new(EmptyChests),
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", session.view()?).map_err(AppError::Input)?;
    prompt(&mut out)?;
    for line in io::stdin().lock().lines() {
        let line = line.map_err(AppError::Input)?;
        let reply = session.handle_line(&line)?;
        for text in &reply.lines {
            writeln!(out, "{text}").map_err(AppError::Input)?;
        }
        if reply.quit {
            break;
        }
        prompt(&mut out)?;
    }
    info!(
        map = session.player().map_name(),
        position = %session.player().position(),
        "session_ended"
    );
    Ok(())
}

fn prompt(out: &mut impl Write) -> Result<(), AppError> {
    write!(out, "> ").and_then(|()| out.flush()).map_err(AppError::Input)
}
