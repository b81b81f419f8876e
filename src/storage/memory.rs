//! 内存存储后端
//!
//! 不落盘，进程退出即丢失。用于测试和不需要持久化的宿主。

use parking_lot::Mutex;

use super::{PersistedState, PersistenceStore};
use crate::models::{Event, InstallData};

pub struct MemoryStore {
    state: Mutex<PersistedState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            state: Mutex::new(PersistedState::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceStore for MemoryStore {
    fn device_id(&self) -> String {
        let mut state = self.state.lock();
        let (id, _) = state.device_id_or_generate();
        id
    }

    fn is_first_install(&self) -> bool {
        !self.state.lock().first_install_complete
    }

    fn set_first_install_complete(&self) {
        self.state.lock().first_install_complete = true;
    }

    fn reset_first_install(&self) {
        self.state.lock().first_install_complete = false;
    }

    fn store_install_referrer(&self, referrer: &str) {
        self.state.lock().install_referrer = Some(referrer.to_string());
    }

    fn install_referrer(&self) -> Option<String> {
        self.state.lock().install_referrer.clone()
    }

    fn store_install_data(&self, data: &InstallData) {
        self.state.lock().install_data = Some(data.clone());
    }

    fn install_data(&self) -> Option<InstallData> {
        self.state.lock().install_data.clone()
    }

    fn store_failed_event(&self, event: &Event) {
        self.state.lock().push_failed_event(event.clone());
    }

    fn failed_events(&self) -> Vec<Event> {
        self.state.lock().failed_events.iter().cloned().collect()
    }

    fn clear_failed_events(&self) {
        self.state.lock().failed_events.clear();
    }
}
