use pamdash_core::api::ClearScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// One-at-a-time requests started from the settings page or at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    SettingsLoad,
    SettingsSave,
    HealthCheck,
    ExportLogs,
    ClearLogs,
    TestAlert,
}

#[derive(Debug, Clone, Default)]
pub enum TaskMeta {
    #[default]
    None,
    ClearLogs {
        scope: ClearScope,
    },
}

#[derive(Debug, Clone)]
pub struct TaskStarted {
    pub id: TaskId,
    pub meta: TaskMeta,
}

#[derive(Debug)]
pub struct TaskCompleted<E> {
    pub id: TaskId,
    pub result: E,
}

/// Task lifecycle state (stored in AppState, mutated only by reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    pub active: Option<TaskId>,
    pub meta: TaskMeta,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn on_started(&mut self, started: &TaskStarted) {
        self.active = Some(started.id);
        self.meta = started.meta.clone();
    }

    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
            self.meta = TaskMeta::None;
        }
        ok
    }
}

#[derive(Debug, Default, Clone)]
pub struct Tasks {
    pub settings_load: TaskState,
    pub settings_save: TaskState,
    pub health_check: TaskState,
    pub export_logs: TaskState,
    pub clear_logs: TaskState,
    pub test_alert: TaskState,
}

impl Tasks {
    pub fn state(&self, kind: TaskKind) -> &TaskState {
        match kind {
            TaskKind::SettingsLoad => &self.settings_load,
            TaskKind::SettingsSave => &self.settings_save,
            TaskKind::HealthCheck => &self.health_check,
            TaskKind::ExportLogs => &self.export_logs,
            TaskKind::ClearLogs => &self.clear_logs,
            TaskKind::TestAlert => &self.test_alert,
        }
    }

    pub fn state_mut(&mut self, kind: TaskKind) -> &mut TaskState {
        match kind {
            TaskKind::SettingsLoad => &mut self.settings_load,
            TaskKind::SettingsSave => &mut self.settings_save,
            TaskKind::HealthCheck => &mut self.health_check,
            TaskKind::ExportLogs => &mut self.export_logs,
            TaskKind::ClearLogs => &mut self.clear_logs,
            TaskKind::TestAlert => &mut self.test_alert,
        }
    }

    pub fn is_any_running(&self) -> bool {
        self.settings_load.is_running()
            || self.settings_save.is_running()
            || self.health_check.is_running()
            || self.export_logs.is_running()
            || self.clear_logs.is_running()
            || self.test_alert.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_ignores_stale_task() {
        let mut seq = TaskSeq::default();
        let mut state = TaskState::default();
        let first = seq.next_id();
        let second = seq.next_id();
        state.on_started(&TaskStarted {
            id: second,
            meta: TaskMeta::None,
        });

        assert!(!state.finish_if_active(first));
        assert!(state.is_running());
        assert!(state.finish_if_active(second));
        assert!(!state.is_running());
    }
}
