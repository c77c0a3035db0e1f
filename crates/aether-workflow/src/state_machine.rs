//! 任务状态机
//!
//! 管理临床任务的状态转换，并维护 `completed_at` 与状态的一致性

use aether_core::{AetherError, ClinicalTask, Result, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 任务状态转换事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskEvent {
    /// 看板上的手动移动，可移到任意列
    Move(TaskStatus),
    /// SLA 超时，标记为延误
    SlaBreach,
}

/// 任务状态机
#[derive(Debug)]
pub struct TaskStateMachine {
    transitions: HashMap<(TaskStatus, TaskEvent), TaskStatus>,
}

impl TaskStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                transitions.insert((from, TaskEvent::Move(to)), to);
            }
        }

        // 已完成的任务不能再被标记为延误
        transitions.insert((TaskStatus::Todo, TaskEvent::SlaBreach), TaskStatus::Delayed);
        transitions.insert((TaskStatus::InProgress, TaskEvent::SlaBreach), TaskStatus::Delayed);
        transitions.insert((TaskStatus::Delayed, TaskEvent::SlaBreach), TaskStatus::Delayed);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: TaskStatus, event: TaskEvent) -> bool {
        self.transitions.contains_key(&(from, event))
    }

    /// 执行状态转换
    pub fn transition(&self, from: TaskStatus, event: TaskEvent) -> Result<TaskStatus> {
        match self.transitions.get(&(from, event)) {
            Some(to) => Ok(*to),
            None => Err(AetherError::InvalidStateTransition {
                from: from.to_string(),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 对任务应用事件，返回新的任务值
    pub fn apply(&self, task: &ClinicalTask, event: TaskEvent, now: DateTime<Utc>) -> Result<ClinicalTask> {
        let status = self.transition(task.status, event)?;
        Ok(with_status(task, status, now))
    }

    /// 获取状态的所有可能事件
    pub fn get_possible_events(&self, current_state: TaskStatus) -> Vec<TaskEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| *state == current_state)
            .map(|(_, event)| *event)
            .collect()
    }
}

impl Default for TaskStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// 替换任务状态，进入已完成时记录完成时间，离开已完成时清除
pub fn with_status(task: &ClinicalTask, status: TaskStatus, now: DateTime<Utc>) -> ClinicalTask {
    let completed_at = match (task.status, status) {
        (TaskStatus::Completed, TaskStatus::Completed) => task.completed_at.or(Some(now)),
        (_, TaskStatus::Completed) => Some(now),
        _ => None,
    };

    ClinicalTask {
        status,
        completed_at,
        ..task.clone()
    }
}
