//! Per-slot worker lifecycle: `empty -> spawning -> running -> dead -> empty`.

use tokio::process::Child;

pub enum SlotState {
    Empty,
    Spawning,
    Running { child: Child, worker_id: String },
    Dead { worker_id: String, exit_code: Option<i32> },
}

impl SlotState {
    pub fn is_empty(&self) -> bool {
        matches!(self, SlotState::Empty)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SlotState::Running { .. })
    }

    pub fn worker_id(&self) -> Option<&str> {
        match self {
            SlotState::Running { worker_id, .. } | SlotState::Dead { worker_id, .. } => {
                Some(worker_id)
            }
            _ => None,
        }
    }
}
