//! 文件存储后端
//!
//! 单个 JSON 文档承载全部持久化状态，每次变更后整体写回。
//! 数据量上限很小（一条安装记录 + 至多 100 条失败事件），
//! 整读整写足够。互斥锁串行化并发的首次安装路径与事件上报路径。

use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::{error, info};

use super::{PersistedState, PersistenceStore};
use crate::errors::{Result, TrackerError};
use crate::models::{Event, InstallData};

pub struct FileStore {
    file_path: PathBuf,
    state: Mutex<PersistedState>,
}

impl FileStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        let state = Self::load_from_file(&file_path)?;

        Ok(FileStore {
            file_path,
            state: Mutex::new(state),
        })
    }

    fn load_from_file(path: &PathBuf) -> Result<PersistedState> {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<PersistedState>(&content) {
                Ok(state) => {
                    info!(
                        "Loaded tracking state from {} ({} failed events)",
                        path.display(),
                        state.failed_events.len()
                    );
                    Ok(state)
                }
                Err(e) => {
                    error!("Failed to parse tracking state file: {}", e);
                    Err(TrackerError::serialization(format!(
                        "Failed to parse tracking state file: {}",
                        e
                    )))
                }
            },
            Err(_) => {
                info!("Tracking state file not found, creating empty state");
                let state = PersistedState::default();
                let json = serde_json::to_string_pretty(&state)?;
                fs::write(path, json)?;
                Ok(state)
            }
        }
    }

    /// 写回失败只记录日志，调用方继续使用内存中的状态
    fn save(&self, state: &PersistedState) {
        let json = match serde_json::to_string_pretty(state) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize tracking state: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.file_path, json) {
            error!(
                "Failed to write tracking state to {}: {}",
                self.file_path.display(),
                e
            );
        }
    }
}

impl PersistenceStore for FileStore {
    fn device_id(&self) -> String {
        let mut state = self.state.lock();
        let (id, generated) = state.device_id_or_generate();
        if generated {
            self.save(&state);
        }
        id
    }

    fn is_first_install(&self) -> bool {
        !self.state.lock().first_install_complete
    }

    fn set_first_install_complete(&self) {
        let mut state = self.state.lock();
        state.first_install_complete = true;
        self.save(&state);
    }

    fn reset_first_install(&self) {
        let mut state = self.state.lock();
        state.first_install_complete = false;
        self.save(&state);
    }

    fn store_install_referrer(&self, referrer: &str) {
        let mut state = self.state.lock();
        state.install_referrer = Some(referrer.to_string());
        self.save(&state);
    }

    fn install_referrer(&self) -> Option<String> {
        self.state.lock().install_referrer.clone()
    }

    fn store_install_data(&self, data: &InstallData) {
        let mut state = self.state.lock();
        state.install_data = Some(data.clone());
        self.save(&state);
    }

    fn install_data(&self) -> Option<InstallData> {
        self.state.lock().install_data.clone()
    }

    fn store_failed_event(&self, event: &Event) {
        let mut state = self.state.lock();
        state.push_failed_event(event.clone());
        self.save(&state);
    }

    fn failed_events(&self) -> Vec<Event> {
        self.state.lock().failed_events.iter().cloned().collect()
    }

    fn clear_failed_events(&self) {
        let mut state = self.state.lock();
        state.failed_events.clear();
        self.save(&state);
    }
}
