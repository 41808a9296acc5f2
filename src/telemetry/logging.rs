//! File-channel logging. Initialized once per process; before `init` every
//! log call is a no-op, and write failures are swallowed so logging can
//! never take the simulation down.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
enum Channel {
    Combat,
    Error,
    Game,
}

struct Logger {
    files: Mutex<BTreeMap<Channel, File>>,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

pub fn init(root: &Path) -> Result<(), String> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let log_dir = root.join("log");
    std::fs::create_dir_all(&log_dir)
        .map_err(|err| format!("log directory create failed: {}", err))?;

    let mut files = BTreeMap::new();
    for (channel, name) in [
        (Channel::Combat, "combat.log"),
        (Channel::Error, "error.log"),
        (Channel::Game, "game.log"),
    ] {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join(name))
            .map_err(|err| format!("open log {} failed: {}", name, err))?;
        files.insert(channel, file);
    }

    LOGGER
        .set(Logger {
            files: Mutex::new(files),
        })
        .map_err(|_| "log system already initialized".to_string())?;
    Ok(())
}

pub fn log_game(message: &str) {
    log_line(Channel::Game, message);
}

pub fn log_combat(message: &str) {
    log_line(Channel::Combat, message);
}

pub fn log_error(message: &str) {
    log_line(Channel::Error, message);
}

fn log_line(channel: Channel, message: &str) {
    if let Some(logger) = LOGGER.get() {
        let epoch = unix_timestamp();
        let line = format!("{epoch} {message}\n");
        let _ = write_line(logger, channel, &line);
    }
}

fn write_line(logger: &Logger, channel: Channel, line: &str) -> std::io::Result<()> {
    let mut files = logger
        .files
        .lock()
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "log lock poisoned"))?;
    if let Some(file) = files.get_mut(&channel) {
        file.write_all(line.as_bytes())?;
        file.flush()?;
    }
    Ok(())
}

fn unix_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_before_init_is_a_noop() {
        // Must not panic or create files.
        log_game("uninitialized");
        log_combat("uninitialized");
        log_error("uninitialized");
    }
}
