#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use taskmaster_core::id::TaskId;
use taskmaster_core::view::{FilterMode, SortKey, ViewState, derive_view};
use taskmaster_core::{Category, Task, TaskDraft};
use time::{Duration, OffsetDateTime};

fn build_tasks(count: usize) -> Vec<Task> {
    let base = OffsetDateTime::UNIX_EPOCH;
    (0..count)
        .filter_map(|idx| {
            let category = Category::ALL[idx % Category::ALL.len()];
            let priority = u8::try_from(idx % 5 + 1).ok()?;
            let draft = TaskDraft::new(format!("Task {idx}"))
                .with_description(format!("generated task number {idx}"))
                .with_priority(priority)
                .with_category(category.as_str())
                .validate()
                .ok()?;
            let offset = i64::try_from(idx).ok()?;
            let mut task = Task::create(TaskId::new(), draft, base + Duration::minutes(offset));
            task.completed = idx % 3 == 0;
            if idx % 4 != 0 {
                task.due_date = Some(base + Duration::days(offset % 90));
            }
            Some(task)
        })
        .collect()
}

fn derive_view_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_view");
    for &count in &[100usize, 1_000, 10_000] {
        let tasks = build_tasks(count);
        for key in [SortKey::CreatedAt, SortKey::Title, SortKey::DueDate] {
            let state = ViewState::new(key, FilterMode::Pending).with_search("task");
            group.bench_with_input(
                BenchmarkId::new(key.as_str(), count),
                &tasks,
                |b, tasks| {
                    b.iter(|| black_box(derive_view(tasks, &state).len()));
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, derive_view_benchmark);
criterion_main!(benches);
