//! 持久化存储
//!
//! 设备 ID、首次安装标记、install referrer、安装归因数据缓存和
//! 发送失败事件队列都通过 `PersistenceStore` 落地。所有操作同步、
//! 本地，失败时记录日志并降级，不向调用方抛错。

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::models::{Event, InstallData};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// 失败事件队列容量，FIFO 淘汰最旧的
pub const MAX_FAILED_EVENTS: usize = 100;

/// 键值持久化契约，每个逻辑键一个条目
///
/// 实现必须内部串行化访问：启动时首次安装路径和事件上报路径
/// 可能同时写入。
pub trait PersistenceStore: Send + Sync {
    /// 获取设备 ID，不存在则生成一次并持久化，此后永不变化
    fn device_id(&self) -> String;

    fn is_first_install(&self) -> bool;
    fn set_first_install_complete(&self);
    /// 测试用：重新打开首次安装窗口
    fn reset_first_install(&self);

    fn store_install_referrer(&self, referrer: &str);
    fn install_referrer(&self) -> Option<String>;

    fn store_install_data(&self, data: &InstallData);
    fn install_data(&self) -> Option<InstallData>;

    /// 追加失败事件并执行 100 条 FIFO 上限
    fn store_failed_event(&self, event: &Event);
    fn failed_events(&self) -> Vec<Event>;
    fn clear_failed_events(&self);
}

/// 持久化文档，键名沿用既有存储格式
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct PersistedState {
    #[serde(
        rename = "tracking_sdk_device_id",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub device_id: Option<String>,
    #[serde(rename = "tracking_sdk_first_install", default)]
    pub first_install_complete: bool,
    #[serde(
        rename = "tracking_sdk_install_referrer",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub install_referrer: Option<String>,
    #[serde(
        rename = "tracking_sdk_install_data",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub install_data: Option<InstallData>,
    #[serde(rename = "tracking_sdk_failed_events", default)]
    pub failed_events: VecDeque<Event>,
}

impl PersistedState {
    /// 取出或生成设备 ID；返回值为 (id, 是否新生成)
    pub fn device_id_or_generate(&mut self) -> (String, bool) {
        match &self.device_id {
            Some(id) => (id.clone(), false),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                debug!("Generated new device id: {}", id);
                self.device_id = Some(id.clone());
                (id, true)
            }
        }
    }

    /// 追加失败事件，超出容量时淘汰最旧的
    pub fn push_failed_event(&mut self, event: Event) {
        self.failed_events.push_back(event);
        while self.failed_events.len() > MAX_FAILED_EVENTS {
            self.failed_events.pop_front();
        }
    }
}

pub struct StoreFactory;

impl StoreFactory {
    /// 创建存储后端：给定路径则文件存储，否则内存存储
    pub fn create(file_path: Option<&str>) -> Result<Arc<dyn PersistenceStore>> {
        let boxed: Box<dyn PersistenceStore> = match file_path {
            Some(path) => Box::new(FileStore::new(path)?),
            None => Box::new(MemoryStore::new()),
        };
        Ok(Arc::from(boxed))
    }
}
