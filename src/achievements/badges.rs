use super::{BadgeProgress, Stats};

/// Module name the arithmetic badge watches for.
pub const MATH_MODULE: &str = "加减法练习";

/// Static badge rule. Thresholds are part of the persisted contract: ids
/// key the unlock ledger, so renaming one orphans its timestamp.
pub struct BadgeDef {
    pub id: &'static str,
    pub title: &'static str,
    /// Numeric target shown behind UI progress bars, when one applies.
    pub goal: Option<u32>,
    pub eval: fn(&Stats) -> BadgeProgress,
}

pub const BADGES: &[BadgeDef] = &[
    BadgeDef {
        id: "first-session",
        title: "第一次练习",
        goal: Some(1),
        eval: first_session,
    },
    BadgeDef {
        id: "ten-sessions",
        title: "坚持练习",
        goal: Some(10),
        eval: ten_sessions,
    },
    BadgeDef {
        id: "hundred-answers",
        title: "百题小达人",
        goal: Some(100),
        eval: hundred_answers,
    },
    BadgeDef {
        id: "accuracy-90",
        title: "小神算",
        goal: None,
        eval: accuracy_90,
    },
    BadgeDef {
        id: "streak-3",
        title: "连续三天",
        goal: Some(3),
        eval: streak_3,
    },
    BadgeDef {
        id: "math-3",
        title: "加减法小能手",
        goal: Some(3),
        eval: math_3,
    },
];

fn ratio(value: u64, goal: u64) -> f64 {
    (value as f64 / goal as f64).min(1.0)
}

fn first_session(stats: &Stats) -> BadgeProgress {
    BadgeProgress {
        unlocked: stats.sessions >= 1,
        progress: ratio(stats.sessions, 1),
    }
}

fn ten_sessions(stats: &Stats) -> BadgeProgress {
    BadgeProgress {
        unlocked: stats.sessions >= 10,
        progress: ratio(stats.sessions, 10),
    }
}

fn hundred_answers(stats: &Stats) -> BadgeProgress {
    BadgeProgress {
        unlocked: stats.total_answered >= 100,
        progress: ratio(stats.total_answered, 100),
    }
}

fn accuracy_90(stats: &Stats) -> BadgeProgress {
    BadgeProgress {
        unlocked: stats.best_accuracy >= 0.9,
        progress: (stats.best_accuracy / 0.9).min(1.0),
    }
}

fn streak_3(stats: &Stats) -> BadgeProgress {
    BadgeProgress {
        unlocked: stats.streak_days >= 3,
        progress: ratio(u64::from(stats.streak_days), 3),
    }
}

fn math_3(stats: &Stats) -> BadgeProgress {
    let count = stats.module_counts.get(MATH_MODULE).copied().unwrap_or(0);
    BadgeProgress {
        unlocked: count >= 3,
        progress: ratio(count, 3),
    }
}
