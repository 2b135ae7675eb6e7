//! Demo shell for the studykit core.
//!
//! Stands in for the app's presentation layer: appends finished sessions,
//! prints the weekly summary and achievement report, exports CSV. The
//! database path comes from `STUDYKIT_DB` (default `studykit.sqlite3`).

use std::env;
use std::process;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, TimeZone, Utc};
use log::warn;
use rand::Rng;

use studykit::achievements::{AchievementLedger, MATH_MODULE};
use studykit::models::StudyRecord;
use studykit::records::RecordStore;
use studykit::stats;
use studykit::storage::SqliteStorage;

const DAY_MS: i64 = 86_400_000;

const DEMO_MODULES: [&str; 4] = [MATH_MODULE, "图形配对", "顺序排列", "判断题"];

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let db_path = env::var("STUDYKIT_DB").unwrap_or_else(|_| "studykit.sqlite3".into());
    let storage = Arc::new(SqliteStorage::new(db_path.into())?);
    let records = RecordStore::new(storage.clone());
    let ledger = AchievementLedger::new(storage);

    match command.as_str() {
        "add" => {
            let module: String = parse_arg(&args, 1, "module")?;
            let score: u32 = parse_arg(&args, 2, "score")?;
            let total: u32 = parse_arg(&args, 3, "total")?;
            let minutes: u64 = parse_arg(&args, 4, "minutes")?;
            if total == 0 {
                bail!("total must be at least 1");
            }
            if score > total {
                bail!("score {score} exceeds total {total}");
            }

            let record = StudyRecord::new(
                module,
                score,
                total,
                minutes * 60_000,
                Utc::now().timestamp_millis(),
            );
            if let Err(err) = records.append(&record) {
                warn!("Session was not persisted: {err}");
            }
            println!("recorded {} {}/{}", record.module, record.score, record.total);
        }
        "seed" => {
            let count: usize = optional_arg(&args, 1, "count")?.unwrap_or(5);
            let mut rng = rand::thread_rng();
            let now = Utc::now().timestamp_millis();
            for _ in 0..count {
                let module = DEMO_MODULES[rng.gen_range(0..DEMO_MODULES.len())];
                let total = rng.gen_range(5..=10);
                let score = rng.gen_range(0..=total);
                let elapsed_ms = rng.gen_range(30_000..=900_000);
                let timestamp = now - rng.gen_range(0..6) * DAY_MS
                    - rng.gen_range(0..12 * 3_600_000);
                let record = StudyRecord::new(module, score, total, elapsed_ms, timestamp);
                if let Err(err) = records.append(&record) {
                    warn!("Seed session was not persisted: {err}");
                }
            }
            println!("seeded {count} demo sessions");
        }
        "recent" => {
            let limit: usize = optional_arg(&args, 1, "count")?.unwrap_or(10);
            for record in records.read_recent(limit) {
                println!(
                    "{}  {}  {}/{}  {}min",
                    local_time(record.timestamp),
                    record.module,
                    record.score,
                    record.total,
                    record.elapsed_ms / 60_000
                );
            }
        }
        "summary" => {
            let all = records.read_all();
            let now = Utc::now().timestamp_millis();
            let summary = stats::weekly_summary(&all, now);

            for day in &summary.days {
                println!(
                    "{} {}  {:>3}min  {:>3.0}%",
                    day.key,
                    day.label,
                    day.minutes,
                    day.correct_rate * 100.0
                );
            }
            println!(
                "total {}min  avg {}%  streak {}d  correct/wrong {}/{}min",
                summary.total_minutes,
                summary.avg_correct_rate,
                summary.streak_days,
                summary.correct_minutes,
                summary.wrong_minutes
            );

            let today = records.read_within_days(1);
            println!("today: {}min", stats::minutes_today(&today, now));
            for entry in stats::today_breakdown(&today, now) {
                println!("  {}  {} sessions  {}min", entry.module, entry.sessions, entry.minutes);
            }
        }
        "badges" => {
            let report = ledger.evaluate(&records.read_all(), Utc::now().timestamp_millis());
            for badge in &report.badges {
                let mark = if badge.unlocked { "x" } else { " " };
                let when = badge
                    .unlocked_at
                    .map(local_time)
                    .unwrap_or_default();
                println!(
                    "[{mark}] {:<16} {:>4.0}%  {}  {}",
                    badge.id,
                    badge.progress * 100.0,
                    badge.title,
                    when
                );
            }
            println!("points {}  level {}", report.points, report.level);
        }
        "modules" => {
            for module in records.distinct_modules() {
                println!("{module}");
            }
        }
        "export" => {
            println!("{}", records.export_csv());
        }
        "clear" => {
            records.clear();
            println!("record history cleared (achievements kept)");
        }
        other => {
            print_usage();
            bail!("unknown command '{other}'");
        }
    }

    Ok(())
}

fn parse_arg<T>(args: &[String], index: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = args
        .get(index)
        .with_context(|| format!("missing argument <{name}>"))?;
    raw.parse()
        .with_context(|| format!("invalid {name} '{raw}'"))
}

fn optional_arg<T>(args: &[String], index: usize, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match args.get(index) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .with_context(|| format!("invalid {name} '{raw}'")),
        None => Ok(None),
    }
}

fn local_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => String::new(),
    }
}

fn print_usage() {
    println!(
        "usage: studykit <command>\n\
         \n\
         \x20 add <module> <score> <total> <minutes>   record a finished session\n\
         \x20 seed [n]       append n random demo sessions (default 5)\n\
         \x20 recent [n]     list the most recent sessions (default 10)\n\
         \x20 summary        weekly summary and today's minutes\n\
         \x20 badges         achievement report\n\
         \x20 modules        distinct module names in the history\n\
         \x20 export         full history as CSV on stdout\n\
         \x20 clear          erase the record history (achievements kept)"
    );
}
