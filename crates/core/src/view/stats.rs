//! Aggregate task statistics

use serde::Serialize;

use crate::task::Task;

/// Counts over non-deleted tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub open: usize,
    /// Same as `open`; there is no separate in-progress state yet
    pub in_progress: usize,
}

impl TaskStats {
    /// Completed share of the total, 0.0 for an empty collection
    pub fn completion_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

pub fn compute_stats(tasks: &[Task]) -> TaskStats {
    let (total, completed) = tasks
        .iter()
        .filter(|task| !task.deleted)
        .fold((0, 0), |(total, completed), task| {
            (total + 1, completed + usize::from(task.completed))
        });
    let open = total - completed;

    TaskStats {
        total,
        completed,
        open,
        in_progress: open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = compute_stats(&[]);
        assert_eq!(stats, TaskStats::default());
        assert_eq!(stats.completion_ratio(), 0.0);
    }

    #[test]
    fn test_stats_skip_deleted() {
        let mut done = Task::new(1i64, "Done");
        done.completed = true;
        let open = Task::new(2i64, "Open");
        let mut deleted = Task::new(3i64, "Deleted");
        deleted.deleted = true;
        deleted.completed = true;

        let stats = compute_stats(&[done, open, deleted]);
        assert_eq!(
            stats,
            TaskStats {
                total: 2,
                completed: 1,
                open: 1,
                in_progress: 1,
            }
        );
        assert_eq!(stats.total, stats.completed + stats.open);
        assert_eq!(stats.completion_ratio(), 0.5);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(TaskStats::default()).unwrap();
        assert!(json.get("inProgress").is_some());
    }
}
