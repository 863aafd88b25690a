use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const LOG_PREFIX: &str = "server_pollwatch_";
// Lexical order of the stamp is chronological order.
const LOG_STAMP: &str = "%Y-%m-%d_%H-%M-%S";

/// Installs the stdout + file dispatcher. `keep` counts the log files left in
/// `log_dir` after start-up, the new one included.
pub fn setup_logging(log_dir: &Path, log_level: &str, keep: usize) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    let removed = prune_logs(log_dir, keep.saturating_sub(1))?;

    let log_path = log_dir.join(format!(
        "{}{}.log",
        LOG_PREFIX,
        chrono::Local::now().format(LOG_STAMP)
    ));

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} {}: {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(parse_level(log_level))
        // Connection plumbing is noisy below info.
        .level_for("hyper_util", log::LevelFilter::Info)
        .level_for("tungstenite", log::LevelFilter::Info)
        .level_for("tokio_tungstenite", log::LevelFilter::Info)
        .chain(std::io::stdout())
        .chain(fern::log_file(&log_path)?)
        .apply()?;

    log::info!(
        "Logging to {} ({} old file(s) removed)",
        log_path.display(),
        removed
    );
    Ok(())
}

fn parse_level(log_level: &str) -> log::LevelFilter {
    log_level.trim().parse().unwrap_or(log::LevelFilter::Info)
}

/// This server's log files in `log_dir`, newest first. Other files are
/// never touched.
fn own_logs(log_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut logs: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(LOG_PREFIX) && name.ends_with(".log"))
        })
        .collect();
    logs.sort_unstable_by(|a, b| b.cmp(a));
    Ok(logs)
}

/// Deletes all but the `retain` newest log files. Returns how many went.
fn prune_logs(log_dir: &Path, retain: usize) -> Result<usize> {
    let mut removed = 0;
    for path in own_logs(log_dir)?.into_iter().skip(retain) {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Failed to delete old log file {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(dir: &Path) -> Vec<String> {
        let mut left: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        left
    }

    #[test]
    fn test_prune_keeps_newest_own_logs() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in [
            "2025-12-01_08-00-00",
            "2025-12-03_08-00-00",
            "2025-12-02_08-00-00",
        ] {
            fs::write(dir.path().join(format!("{LOG_PREFIX}{stamp}.log")), "").unwrap();
        }
        fs::write(dir.path().join("other_service.log"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(prune_logs(dir.path(), 2).unwrap(), 1);
        assert_eq!(
            names(dir.path()),
            vec![
                "notes.txt",
                "other_service.log",
                "server_pollwatch_2025-12-02_08-00-00.log",
                "server_pollwatch_2025-12-03_08-00-00.log",
            ]
        );

        assert_eq!(prune_logs(dir.path(), 0).unwrap(), 2);
        assert_eq!(names(dir.path()), vec!["notes.txt", "other_service.log"]);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), log::LevelFilter::Trace);
        assert_eq!(parse_level(" warn "), log::LevelFilter::Warn);
        assert_eq!(parse_level("off"), log::LevelFilter::Off);
        assert_eq!(parse_level("fatal"), log::LevelFilter::Info);
    }
}
