//! The text front-end: reads commands, ticks the controller, prints frames.

use std::io::{BufRead, Write};

use tracing::{error, warn};

use life_core::{ControllerError, Frame, LifeCycleController, LifeSummary, TickInput, ZoneGeometry};
use world_rules::{Effect, Resolution, WorldBible, WorldState};

use crate::error::CliError;
use crate::script::{parse_line, Command};

/// Run commands from `input` until `quit` or end of input.
///
/// A life still running at the end is abandoned, so only completed lives
/// are ever committed.
pub fn run<G, R, W>(
    controller: &mut LifeCycleController<G>,
    input: R,
    out: &mut W,
    tick_secs: f32,
) -> Result<(), CliError>
where
    G: ZoneGeometry,
    R: BufRead,
    W: Write,
{
    for (number, line) in input.lines().enumerate() {
        let line = line?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                warn!(line = number + 1, %err, "Skipping bad command");
                writeln!(out, "? {err}")?;
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Wait(secs) => wait(controller, out, secs, tick_secs)?,
            Command::Move(position) => {
                let frame = step(controller, out, TickInput::wait(0.0).moving_to(position))?;
                if let Some(frame) = frame {
                    if frame.blocked {
                        writeln!(out, "blocked")?;
                    } else {
                        writeln!(out, "at ({:.1}, {:.1})", frame.position.x, frame.position.y)?;
                    }
                }
            }
            Command::Use(object, action) => {
                let frame = step(controller, out, TickInput::wait(0.0).interacting(object, action))?;
                if let Some(Resolution::Rejected(reason)) = frame.and_then(|frame| frame.resolution) {
                    writeln!(out, "rejected: {reason}")?;
                }
            }
            Command::Die(cause) => {
                step(controller, out, TickInput::wait(0.0).dying(cause))?;
            }
            Command::Zone(zone) => match controller.select_zone(&zone) {
                Ok(()) => writeln!(out, "next life in {zone}")?,
                Err(ControllerError::LifeInProgress) => {
                    writeln!(out, "finish this life first")?;
                }
                Err(err) => writeln!(out, "cannot select {zone}: {err}")?,
            },
            Command::Status => print_status(out, controller.store().bible(), controller.world())?,
            Command::Reset => {
                controller.reset_progress()?;
                writeln!(out, "progress reset")?;
            }
        }
    }

    controller.abandon();
    out.flush()?;
    Ok(())
}

/// Let `secs` pass in `tick_secs` steps, stopping early if the life ends.
fn wait<G: ZoneGeometry, W: Write>(
    controller: &mut LifeCycleController<G>,
    out: &mut W,
    secs: f32,
    tick_secs: f32,
) -> Result<(), CliError> {
    let mut left = secs;
    while left > 0.0 {
        let dt = left.min(tick_secs);
        left -= dt;
        match step(controller, out, TickInput::wait(dt))? {
            Some(frame) if frame.summary.is_none() => {}
            _ => return Ok(()),
        }
    }
    if let Some(session) = controller.session() {
        writeln!(out, "{:.1}s left", session.timer().remaining())?;
    }
    Ok(())
}

/// One tick. Prints interaction effects and life endings.
///
/// A failed commit is retried once; if that fails too the error is returned
/// and the process should exit.
fn step<G: ZoneGeometry, W: Write>(
    controller: &mut LifeCycleController<G>,
    out: &mut W,
    input: TickInput,
) -> Result<Option<Frame>, CliError> {
    if controller.session().is_none() {
        let life = controller.start_life()?;
        writeln!(out, "-- life {} begins in {} --", controller.world().lives + 1, controller.zone())?;
        if let Some(objective) = controller.objective() {
            writeln!(out, "objective: {objective}")?;
        }
        tracing::debug!(%life, "New life");
    }

    match controller.tick(input) {
        Ok(frame) => {
            if let Some(Resolution::Applied(effect)) = &frame.resolution {
                print_effect(out, effect)?;
            }
            if let Some(summary) = &frame.summary {
                print_summary(out, summary)?;
            }
            Ok(Some(frame))
        }
        Err(ControllerError::CommitFailed(err)) => {
            writeln!(out, "commit failed: {err}; retrying")?;
            match controller.retry_commit() {
                Ok(summary) => {
                    print_summary(out, &summary)?;
                    Ok(None)
                }
                Err(err) => {
                    error!(%err, "Commit failed twice");
                    Err(err.into())
                }
            }
        }
        Err(err) => Err(err.into()),
    }
}

fn print_effect<W: Write>(out: &mut W, effect: &Effect) -> std::io::Result<()> {
    match effect {
        Effect::PickedUp { item } => writeln!(out, "picked up {item}"),
        Effect::TimeBonus { seconds } => writeln!(out, "+{seconds:.1}s"),
        Effect::Opened => writeln!(out, "opened"),
        Effect::Burned => writeln!(out, "burned"),
        Effect::Planted => writeln!(out, "planted"),
        Effect::Talked { npc, line } => writeln!(out, "{npc}: \"{line}\""),
        Effect::Activated => writeln!(out, "activated"),
    }
}

fn print_summary<W: Write>(out: &mut W, summary: &LifeSummary) -> std::io::Result<()> {
    writeln!(
        out,
        "-- life {} {} after {:.1}s ({} events) --",
        summary.report.lives, summary.ending, summary.seconds_lived, summary.events
    )?;
    for unlocked in &summary.report.unlocks.unlocked {
        writeln!(out, "unlocked {}", unlocked.target)?;
    }
    Ok(())
}

/// Print the committed world state and the objective it implies.
pub fn print_status<W: Write>(out: &mut W, bible: &WorldBible, world: &WorldState) -> std::io::Result<()> {
    writeln!(out, "lives: {}", world.lives)?;
    writeln!(out, "objective: {}", bible.current_objective(world).unwrap_or("all done"))?;
    writeln!(out, "time lived: {:.1}s", world.time_lived_secs)?;
    writeln!(out, "zones: {}", join(world.unlocked_zones.iter()))?;
    writeln!(out, "abilities: {}", join(world.unlocked_abilities.iter()))?;
    if let Some(item) = &world.carried_over {
        writeln!(out, "carrying: {item}")?;
    }
    for (flag, value) in &world.flags {
        writeln!(out, "flag {flag} = {value:?}")?;
    }
    for (npc, memory) in &world.npc_memory {
        writeln!(out, "npc {npc}: {} visits, stage {}", memory.visits, memory.stage)?;
    }
    Ok(())
}

fn join<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    let items: Vec<String> = items.map(|item| item.to_string()).collect();
    if items.is_empty() {
        "-".to_owned()
    } else {
        items.join(", ")
    }
}
