//! Plain-text rendering of the list and board views.

use std::fmt::Write;
use taskboard_core::Task;
use taskboard_core::client::Column;
use taskboard_core::client::list::EMPTY_LIST_MESSAGE;

const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

fn checkbox(task: &Task) -> &'static str {
    if task.is_completed { "[x]" } else { "[ ]" }
}

/// One card per task with its completion box, status and description.
pub fn render_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return format!("{}\n", EMPTY_LIST_MESSAGE);
    }

    let mut out = String::new();
    for task in tasks {
        let _ = writeln!(
            out,
            "{} #{} {} ({})",
            checkbox(task),
            task.id,
            task.title,
            task.status.label()
        );
        if let Some(description) = &task.description {
            let _ = writeln!(out, "      {}", description);
        }
    }
    out
}

/// The three columns side by side is too wide for most terminals, so they are stacked.
pub fn render_board(columns: &[Column<'_>]) -> String {
    let mut out = String::new();
    for (index, column) in columns.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{} ({})", column.label(), column.count());
        if column.tasks.is_empty() {
            let _ = writeln!(out, "  -");
        }
        for task in &column.tasks {
            let _ = writeln!(out, "  #{} {}", task.id, task.title);
        }
    }
    out
}

/// Every field of one task.
pub fn render_task(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", task.id, task.title);
    let _ = writeln!(out, "Status:      {}", task.status.label());
    let _ = writeln!(out, "Completed:   {}", if task.is_completed { "yes" } else { "no" });
    if let Some(description) = &task.description {
        let _ = writeln!(out, "Description: {}", description);
    }
    let _ = writeln!(
        out,
        "Created:     {}",
        task.created_at.format(CREATED_AT_FORMAT)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use insta::assert_snapshot;
    use taskboard_core::client::kanban::columns;
    use taskboard_core::{TaskId, TaskStatus};

    fn task(id: i32, title: &str, status: TaskStatus, description: Option<&str>) -> Task {
        Task {
            id: TaskId::new(id),
            owner_id: "alice".to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            status,
            is_completed: status.is_completed(),
            created_at: Utc.with_ymd_and_hms(2025, 9, 1, 12, 30, 0).unwrap(),
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task(1, "Buy milk", TaskStatus::Todo, Some("Oat")),
            task(2, "Write report", TaskStatus::InProgress, None),
            task(3, "Book dentist", TaskStatus::Completed, None),
            task(4, "Call plumber", TaskStatus::Todo, None),
        ]
    }

    #[test]
    fn empty_list_shows_placeholder() {
        assert_eq!(
            render_list(&[]),
            "No tasks yet. Create one to get started!\n"
        );
    }

    #[test]
    fn can_render_list() {
        assert_snapshot!(render_list(&sample()), @r###"
        [ ] #1 Buy milk (To Do)
              Oat
        [ ] #2 Write report (In Progress)
        [x] #3 Book dentist (Completed)
        [ ] #4 Call plumber (To Do)
        "###);
    }

    #[test]
    fn can_render_board_columns_in_order() {
        let tasks = sample();

        assert_snapshot!(render_board(&columns(&tasks)), @r###"
        To Do (2)
          #1 Buy milk
          #4 Call plumber

        In Progress (1)
          #2 Write report

        Completed (1)
          #3 Book dentist
        "###);
    }

    #[test]
    fn empty_columns_are_marked() {
        let tasks = vec![task(1, "Only one", TaskStatus::InProgress, None)];

        assert_snapshot!(render_board(&columns(&tasks)), @r###"
        To Do (0)
          -

        In Progress (1)
          #1 Only one

        Completed (0)
          -
        "###);
    }

    #[test]
    fn can_render_task_details() {
        let task = task(1, "Buy milk", TaskStatus::Todo, Some("Oat"));

        assert_snapshot!(render_task(&task), @r###"
        #1 Buy milk
        Status:      To Do
        Completed:   no
        Description: Oat
        Created:     2025-09-01 12:30
        "###);
    }
}
