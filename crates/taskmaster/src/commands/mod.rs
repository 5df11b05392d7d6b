use std::io::Write;

use anyhow::Result;
use taskmaster_app::{AppConfig, Clock, TaskService, TaskStore, format_date, write_export};
use taskmaster_core::view::FilterMode;
use taskmaster_core::{Category, DueStatus, Task, TaskDraft};
use time::OffsetDateTime;

use crate::{Command, LsFormat};

/// Execute one CLI command against the session, writing user output to `out`.
pub fn run<S, C, W>(
    command: Command,
    service: &mut TaskService<S, C>,
    config: &AppConfig,
    out: &mut W,
) -> Result<()>
where
    S: TaskStore,
    C: Clock,
    W: Write,
{
    match command {
        Command::Add {
            title,
            description,
            priority,
            due,
            category,
        } => {
            let draft = TaskDraft::new(title)
                .with_description(description.unwrap_or_default())
                .with_priority(priority)
                .with_due_date(due)
                .with_category(category.unwrap_or_else(|| Category::default().as_str().to_owned()));
            let task = service.create(draft)?;
            writeln!(out, "created task: {} ({})", task.id, task.title)?;
        }
        Command::Edit {
            id,
            title,
            description,
            priority,
            due,
            clear_due,
            category,
        } => {
            let id = service.resolve(&id)?;
            let Some(mut draft) = service.begin_edit(id) else {
                writeln!(out, "task {id} no longer exists")?;
                return Ok(());
            };
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            if let Some(priority) = priority {
                draft.priority = priority;
            }
            if clear_due {
                draft.due_date = None;
            } else if due.is_some() {
                draft.due_date = due;
            }
            if let Some(category) = category {
                draft.category = category;
            }
            match service.submit_edit(draft)? {
                Some(task) => writeln!(out, "updated task: {} ({})", task.id, task.title)?,
                None => writeln!(out, "task {id} no longer exists")?,
            }
        }
        Command::Rm { id } => {
            let id = service.resolve(&id)?;
            match service.delete(id)? {
                Some(task) => writeln!(out, "deleted task: {} ({})", task.id, task.title)?,
                None => writeln!(out, "task {id} no longer exists")?,
            }
        }
        Command::Toggle { id } => {
            let id = service.resolve(&id)?;
            match service.toggle_complete(id)? {
                Some(task) if task.completed => {
                    writeln!(out, "completed task: {} ({})", task.id, task.title)?;
                }
                Some(task) => writeln!(out, "reopened task: {} ({})", task.id, task.title)?,
                None => writeln!(out, "task {id} no longer exists")?,
            }
        }
        Command::Show { id } => {
            let id = service.resolve(&id)?;
            match service.collection().get(id) {
                Some(task) => writeln!(out, "{}", serde_json::to_string_pretty(task)?)?,
                None => writeln!(out, "task {id} no longer exists")?,
            }
        }
        Command::Ls {
            search,
            sort,
            filter,
            format,
        } => {
            if let Some(search) = search {
                service.set_search_term(search);
            }
            if let Some(sort) = sort {
                service.set_sort_by(sort);
            }
            if let Some(filter) = filter {
                service.set_filter_by(filter);
            }

            let view = service.view_state();
            let narrowed = !view.search_term.is_empty() || view.filter_by != FilterMode::All;
            let tasks = service.visible();
            if tasks.is_empty() {
                if narrowed {
                    writeln!(out, "No tasks matched the provided filters")?;
                } else {
                    writeln!(out, "No tasks found")?;
                }
                return Ok(());
            }

            match format {
                LsFormat::Table => {
                    render_task_table(out, &tasks, service.collection().clock().now())?;
                }
                LsFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&tasks)?)?,
            }
        }
        Command::Stats => {
            let stats = service.stats();
            writeln!(out, "Total: {}", stats.total)?;
            writeln!(out, "Completed: {}", stats.completed)?;
            writeln!(out, "Pending: {}", stats.pending)?;
            writeln!(out, "High priority pending: {}", stats.high_priority_pending)?;
            writeln!(out, "Progress: {}%", stats.progress_percent())?;

            let recent = service.recent_activity();
            if !recent.is_empty() {
                writeln!(out)?;
                writeln!(out, "Recent activity:")?;
                for task in recent {
                    let mark = if task.completed { 'x' } else { ' ' };
                    writeln!(out, "  [{mark}] {} ({})", task.title, format_date(task.updated_at))?;
                }
            }
        }
        Command::Export { format, out: dir } => {
            let format = format.unwrap_or(config.export.format);
            let artifact = service.export(format)?;
            let path = write_export(&config.export_dir(dir.as_deref()), &artifact)?;
            writeln!(
                out,
                "exported {} tasks to {}",
                service.collection().len(),
                path.display()
            )?;
        }
    }

    Ok(())
}

fn render_task_table<W: Write>(out: &mut W, tasks: &[&Task], now: OffsetDateTime) -> Result<()> {
    writeln!(out, "ID | Done | Priority | Title | Category | Due")?;
    writeln!(out, "-- | ---- | -------- | ----- | -------- | ---")?;

    for task in tasks {
        let done = if task.completed { "x" } else { " " };
        let due = match (task.due_date, task.due_status(now)) {
            (None, _) => "-".to_owned(),
            (Some(due), DueStatus::Overdue) => format!("{} (overdue)", format_date(due)),
            (Some(due), DueStatus::DueToday) => format!("{} (today)", format_date(due)),
            (Some(due), _) => format_date(due),
        };
        writeln!(
            out,
            "{} | {} | {} | {} | {} | {}",
            task.id,
            done,
            task.priority.label(),
            task.title,
            task.category,
            due
        )?;
    }
    Ok(())
}
