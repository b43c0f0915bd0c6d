use std::fmt;
use thiserror::Error;

/// Returned when a task sequence violates the legal adjacency cycle.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("task list does not satisfy the task ordering rules")]
pub struct InvalidTaskSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Away,
    Land,
    Wait,
    Load,
    Takeoff,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::Away,
        TaskType::Land,
        TaskType::Wait,
        TaskType::Load,
        TaskType::Takeoff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaskType::Away => "AWAY",
            TaskType::Land => "LAND",
            TaskType::Wait => "WAIT",
            TaskType::Load => "LOAD",
            TaskType::Takeoff => "TAKEOFF",
        }
    }

    pub fn from_name(name: &str) -> Option<TaskType> {
        TaskType::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An operation an aircraft is performing. The load percentage is only
/// meaningful for LOAD tasks and is 0 for every other type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    task_type: TaskType,
    load_percent: u32,
}

impl Task {
    pub fn new(task_type: TaskType) -> Task {
        Task { task_type, load_percent: 0 }
    }

    pub fn load(load_percent: u32) -> Task {
        Task { task_type: TaskType::Load, load_percent }
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn load_percent(&self) -> u32 {
        self.load_percent
    }

    /// Machine-readable form: `LOAD@<percent>` for LOAD, bare type name otherwise.
    pub fn encode(&self) -> String {
        match self.task_type {
            TaskType::Load => format!("LOAD@{}", self.load_percent),
            other => other.name().to_string(),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task_type {
            TaskType::Load => write!(f, "LOAD at {}%", self.load_percent),
            other => write!(f, "{}", other),
        }
    }
}

/// A circular list of tasks with a cursor on the current one.
///
/// Every consecutive pair of tasks, including the wrap-around from the last
/// back to the first, must follow the legal transition cycle:
/// AWAY follows AWAY or TAKEOFF, LAND follows AWAY, WAIT and LOAD follow
/// LAND or WAIT, and TAKEOFF follows LOAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
    current: usize,
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Result<TaskList, InvalidTaskSequence> {
        if tasks.is_empty() {
            return Err(InvalidTaskSequence);
        }
        for (i, task) in tasks.iter().enumerate() {
            let prev = tasks[(i + tasks.len() - 1) % tasks.len()].task_type();
            let legal = match task.task_type() {
                TaskType::Away => matches!(prev, TaskType::Away | TaskType::Takeoff),
                TaskType::Land => prev == TaskType::Away,
                TaskType::Wait | TaskType::Load => {
                    matches!(prev, TaskType::Land | TaskType::Wait)
                }
                TaskType::Takeoff => prev == TaskType::Load,
            };
            if !legal {
                return Err(InvalidTaskSequence);
            }
        }
        Ok(TaskList { tasks, current: 0 })
    }

    pub fn current(&self) -> Task {
        self.tasks[self.current]
    }

    /// The task after the current one, without moving the cursor.
    pub fn peek_next(&self) -> Task {
        self.tasks[(self.current + 1) % self.tasks.len()]
    }

    /// Moves the cursor forward by one, wrapping past the end.
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.tasks.len();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Machine-readable form: comma-joined encoded tasks starting from the
    /// current one and wrapping circularly, e.g. `WAIT,LOAD@75,TAKEOFF,AWAY,LAND`.
    pub fn encode(&self) -> String {
        (0..self.tasks.len())
            .map(|i| self.tasks[(self.current + i) % self.tasks.len()].encode())
            .collect::<Vec<String>>()
            .join(",")
    }
}

impl fmt::Display for TaskList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TaskList currently on {} [{}/{}]",
            self.current(),
            self.current + 1,
            self.tasks.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_cycle() -> Vec<Task> {
        vec![
            Task::new(TaskType::Away),
            Task::new(TaskType::Land),
            Task::new(TaskType::Wait),
            Task::load(70),
            Task::new(TaskType::Takeoff),
        ]
    }

    #[test]
    fn test_valid_cycle_constructs() {
        assert!(TaskList::new(full_cycle()).is_ok());
    }

    #[test]
    fn test_empty_list_rejected() {
        assert_eq!(TaskList::new(vec![]), Err(InvalidTaskSequence));
    }

    #[test]
    fn test_single_away_is_valid() {
        // AWAY may follow AWAY, including wrapping onto itself.
        let list = TaskList::new(vec![Task::new(TaskType::Away)]).unwrap();
        assert_eq!(list.current().task_type(), TaskType::Away);
        assert_eq!(list.peek_next().task_type(), TaskType::Away);
    }

    #[test]
    fn test_single_wait_is_invalid() {
        assert!(TaskList::new(vec![Task::new(TaskType::Wait)]).is_err());
    }

    #[test]
    fn test_illegal_adjacency_rejected() {
        // LAND directly after LAND
        let tasks = vec![
            Task::new(TaskType::Away),
            Task::new(TaskType::Land),
            Task::new(TaskType::Land),
        ];
        assert!(TaskList::new(tasks).is_err());
    }

    #[test]
    fn test_wrap_around_adjacency_checked() {
        // AWAY,LAND,WAIT is fine pairwise but AWAY cannot follow WAIT.
        let tasks = vec![
            Task::new(TaskType::Away),
            Task::new(TaskType::Land),
            Task::new(TaskType::Wait),
        ];
        assert!(TaskList::new(tasks).is_err());
    }

    #[test]
    fn test_advance_wraps_to_start() {
        let mut list = TaskList::new(full_cycle()).unwrap();
        let first = list.current();
        for _ in 0..list.len() {
            list.advance();
        }
        assert_eq!(list.current(), first);
    }

    #[test]
    fn test_peek_next_does_not_move_cursor() {
        let list = TaskList::new(full_cycle()).unwrap();
        assert_eq!(list.peek_next().task_type(), TaskType::Land);
        assert_eq!(list.current().task_type(), TaskType::Away);
    }

    #[test]
    fn test_encode_starts_from_current_and_wraps() {
        let mut list = TaskList::new(full_cycle()).unwrap();
        list.advance();
        list.advance();
        assert_eq!(list.encode(), "WAIT,LOAD@70,TAKEOFF,AWAY,LAND");
    }

    #[test]
    fn test_display() {
        let mut list = TaskList::new(full_cycle()).unwrap();
        list.advance();
        list.advance();
        assert_eq!(list.to_string(), "TaskList currently on WAIT [3/5]");
        list.advance();
        assert_eq!(list.to_string(), "TaskList currently on LOAD at 70% [4/5]");
    }

    #[test]
    fn test_task_encode() {
        assert_eq!(Task::load(65).encode(), "LOAD@65");
        assert_eq!(Task::new(TaskType::Takeoff).encode(), "TAKEOFF");
    }
}
