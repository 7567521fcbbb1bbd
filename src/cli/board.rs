//! taskboard dashboard / series / time-spent / periods command implementations

use chrono::Utc;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::role::filter_by_role;
use crate::series::{activity_series, completion_series, ChartSeries, Dimension};
use crate::unify::unified_items;
use crate::views::{
    self, completion_periods_by_user, format_minutes, priority_distribution, time_spent_by_user,
    CompletionPeriods, PriorityCount, TimeSort, UserCompletion,
};

use super::Board;

#[derive(Serialize)]
struct DashboardReport {
    #[serde(flatten)]
    overview: views::Dashboard,
    priorities: Vec<PriorityCount>,
}

pub fn dashboard(board: &Board, limit: Option<usize>, output: OutputOptions) -> Result<()> {
    let limit = limit.unwrap_or(board.config.board.preview_limit);
    if limit == 0 {
        return Err(Error::InvalidArgument("--limit must be > 0".to_string()));
    }

    let report = DashboardReport {
        overview: views::dashboard(&board.store, &board.session, limit),
        priorities: priority_distribution(filter_by_role(board.store.tasks(), &board.session)),
    };
    let overview = &report.overview;

    let mut human = HumanOutput::new(format!("Welcome, {}", overview.user_name));
    human.push_summary("Role", overview.role.to_string());
    human.push_summary("Tasks", overview.tasks_total.to_string());
    human.push_summary("Bugs", overview.bugs_total.to_string());
    for count in &report.priorities {
        human.push_summary(format!("{} priority", count.priority), count.count.to_string());
    }
    for card in overview.tasks.iter().chain(overview.bugs.iter()) {
        human.push_detail(format!(
            "{} [{}] {}: {}",
            card.id, card.status, card.title, card.description
        ));
    }
    if overview.tasks_total > overview.tasks.len() {
        human.push_next_step("taskboard tasks");
    }
    if overview.bugs_total > overview.bugs.len() {
        human.push_next_step("taskboard bugs");
    }

    emit_success(output, "dashboard", &report, Some(&human))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesSource {
    Activity,
    Completions,
}

impl SeriesSource {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "activity" | "updates" => Ok(SeriesSource::Activity),
            "completions" | "completed" => Ok(SeriesSource::Completions),
            other => Err(Error::InvalidArgument(format!(
                "unknown series source '{other}' (expected activity|completions)"
            ))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SeriesSource::Activity => "activity",
            SeriesSource::Completions => "completions",
        }
    }
}

#[derive(Serialize)]
struct SeriesReport {
    source: &'static str,
    dimension: Dimension,
    keys: &'static [&'static str],
    days: ChartSeries,
}

pub fn series(
    board: &Board,
    source: &str,
    dimension: Option<&str>,
    output: OutputOptions,
) -> Result<()> {
    let source = SeriesSource::parse(source)?;
    let dimension = match dimension {
        Some(raw) => raw.parse::<Dimension>()?,
        None => board.config.board.dimension()?,
    };

    let items = unified_items(&board.store);
    let days = match source {
        SeriesSource::Activity => activity_series(board.store.updates(), &items, dimension),
        SeriesSource::Completions => completion_series(&items, dimension, &board.session),
    };
    let report = SeriesReport {
        source: source.as_str(),
        dimension,
        keys: dimension.keys(),
        days,
    };

    let mut human = HumanOutput::new(format!(
        "{} by {}",
        if source == SeriesSource::Activity {
            "Activity"
        } else {
            "Completions"
        },
        dimension
    ));
    human.push_summary("Days", report.days.len().to_string());
    for day in &report.days {
        let counts: Vec<String> = day
            .counts()
            .iter()
            .map(|(key, count)| format!("{key}={count}"))
            .collect();
        human.push_detail(format!(
            "{} {} (total {})",
            day.date,
            counts.join(" "),
            day.total()
        ));
    }
    if report.days.is_empty() {
        human.push_warning("no dated records to chart");
    }

    emit_success(output, "series", &report, Some(&human))
}

pub fn time_spent(
    board: &Board,
    search: Option<&str>,
    sort: &str,
    output: OutputOptions,
) -> Result<()> {
    let sort: TimeSort = sort.parse()?;
    let report = time_spent_by_user(board.store.tasks(), board.store.users(), search, sort);

    let mut human = HumanOutput::new("Time spent");
    human.push_summary("Users", report.total_users.to_string());
    human.push_summary("Tasks", report.total_tasks.to_string());
    human.push_summary("Total", format_minutes(report.total_minutes));
    for user in &report.users {
        human.push_detail(format!(
            "{}: {}",
            user.user_name,
            format_minutes(user.total_minutes)
        ));
        for task in &user.tasks {
            human.push_detail(format!("  {}: {}", task.title, format_minutes(task.minutes)));
        }
    }

    emit_success(output, "time-spent", &report, Some(&human))
}

#[derive(Serialize)]
struct PeriodsReport {
    users: Vec<UserCompletion>,
}

pub fn periods(board: &Board, output: OutputOptions) -> Result<()> {
    let week_start = board.config.board.week_start()?;
    let report = PeriodsReport {
        users: completion_periods_by_user(&board.store, &board.session, Utc::now(), week_start),
    };

    let mut human = HumanOutput::new("Completed");
    human.push_summary("Users", report.users.len().to_string());
    for row in &report.users {
        human.push_detail(format!(
            "{}: tasks {}; bugs {}",
            row.user_name,
            describe_periods(&row.tasks),
            describe_periods(&row.bugs)
        ));
    }

    emit_success(output, "periods", &report, Some(&human))
}

fn describe_periods(counts: &CompletionPeriods) -> String {
    format!(
        "today {}, this week {}, this month {}",
        counts.today, counts.this_week, counts.this_month
    )
}
