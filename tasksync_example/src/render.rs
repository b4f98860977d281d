use std::fmt::Write;

use chrono::{FixedOffset, NaiveDate};
use tasksync::{Task, TaskGroups};

/// Render grouped tasks: current days ascending, then the past bucket.
pub fn render(groups: &TaskGroups, today: NaiveDate, offset: FixedOffset, offline: bool) -> String {
    let mut out = String::new();

    if offline {
        out.push_str("!! You are offline. New tasks will sync once the connection is back.\n\n");
    }

    out.push_str("== Current tasks ==\n");
    for (day, tasks) in groups.days() {
        let heading = if day == today {
            "Today".to_string()
        } else {
            day.format("%d/%m/%Y").to_string()
        };
        let _ = writeln!(out, "-- {heading}");
        for task in tasks {
            let _ = writeln!(out, "   {}", task_line(task, offset, false));
        }
    }

    out.push_str("\n== Past tasks ==\n");
    for task in groups.past() {
        let _ = writeln!(out, "   {}", task_line(task, offset, true));
    }

    out
}

fn task_line(task: &Task, offset: FixedOffset, with_day: bool) -> String {
    let local = task.date.with_timezone(&offset);
    let status = if task.completed { "Done" } else { "Pending" };
    let sync_mark = if task.synced { "" } else { " (not synced)" };
    if with_day {
        format!(
            "{} - {} on {} - {}{}",
            task.title,
            local.format("%H:%M"),
            local.format("%d/%m/%Y"),
            status,
            sync_mark
        )
    } else {
        format!("{} - {} - {}{}", task.title, local.format("%H:%M"), status, sync_mark)
    }
}
