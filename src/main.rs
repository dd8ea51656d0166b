//! Headless runner: plays a key script against a session and prints one JSON
//! line per turn or encounter step.
//!
//! Usage:
//!   shadowdelve <script> [config.toml]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use shadowdelve::{
    Notification, Session, SessionState, SimConfig,
    data::mode_line,
    script::{Command, Script},
};

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record<'a, T: Serialize> {
    Turn {
        state: SessionState,
        shadow: Option<&'static str>,
        outcome: &'a T,
    },
    Encounter {
        state: SessionState,
        shadow: Option<&'static str>,
        outcome: &'a T,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args().skip(1);
    let Some(script_path) = args.next().map(PathBuf::from) else {
        bail!("usage: shadowdelve <script> [config.toml]");
    };
    let config = match args.next() {
        Some(path) => SimConfig::load(&path).with_context(|| format!("load config {path}"))?,
        None => SimConfig::default(),
    };
    let mut script = Script::from_file(&script_path)
        .with_context(|| format!("read script {}", script_path.display()))?;
    log::info!("running {} scripted keys", script.len());

    let mut session = Session::new(config, |note: &Notification| {
        eprintln!("[T:{}] {:?}: {}", note.turn, note.severity, note.message);
    });
    session.start();

    while let Some(command) = script.next_command() {
        if command == Command::Quit {
            break;
        }
        match session.state() {
            SessionState::Playing => {
                let Some(intent) = command.intent() else {
                    log::warn!("{command:?} does nothing outside an encounter");
                    continue;
                };
                let outcome = session.resolve_turn(intent)?;
                emit(&Record::Turn {
                    state: session.state(),
                    shadow: shadow_label(&session),
                    outcome: &outcome,
                })?;
            }
            SessionState::Encounter => {
                let Some(choice) = command.encounter_choice() else {
                    log::warn!("{command:?} is not an encounter choice");
                    continue;
                };
                let outcome = session.resolve_encounter(choice)?;
                emit(&Record::Encounter {
                    state: session.state(),
                    shadow: shadow_label(&session),
                    outcome: &outcome,
                })?;
            }
            SessionState::GameOver | SessionState::Loading => break,
        }
    }

    let vitals = session.player_vitals();
    log::info!(
        "finished on floor {} after {} turns ({:?}, hp {}/{})",
        session.floor().get(),
        session.turn(),
        session.state(),
        vitals.hp,
        vitals.max_hp
    );
    Ok(())
}

/// Display name of the shadow's current mode.
fn shadow_label(session: &Session) -> Option<&'static str> {
    session
        .adversary()
        .map(|adversary| mode_line(adversary.brain.kind()).label)
}

fn emit<T: Serialize>(record: &Record<'_, T>) -> Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}
