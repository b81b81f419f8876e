//! 宿主回调通道
//!
//! SDK 级通知以 `(事件标签, 响应体)` 二元组投递。宿主可以注册
//! 闭包回调、订阅广播流，或两者皆用。涉及宿主 UI 状态的回调
//! 必须经 `CallbackExecutor` 转投到主线程；内部状态写入则允许
//! 停留在网络层完成时所在的上下文。

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, trace};

/// 回调执行器，决定宿主回调在哪个上下文上运行
///
/// 默认的 `InlineExecutor` 在完成上下文原地执行；移动端宿主
/// 应注入转投主线程的实现。
pub trait CallbackExecutor: Send + Sync {
    fn execute(&self, task: Box<dyn FnOnce() + Send + 'static>);
}

/// 原地执行，不做线程转投
pub struct InlineExecutor;

impl CallbackExecutor for InlineExecutor {
    fn execute(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        task();
    }
}

/// 一次 SDK 通知
#[derive(Debug, Clone)]
pub struct CallbackNotice {
    pub tag: String,
    pub body: String,
}

/// 宿主注册的回调闭包
pub type HostCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// 回调总线
///
/// 闭包回调经执行器投递；广播流供异步消费端订阅，无订阅者时
/// 发送静默丢弃。
pub struct CallbackBus {
    callback: Option<HostCallback>,
    executor: Arc<dyn CallbackExecutor>,
    sender: broadcast::Sender<CallbackNotice>,
}

impl CallbackBus {
    pub fn new(callback: Option<HostCallback>, executor: Arc<dyn CallbackExecutor>) -> Self {
        let (sender, _) = broadcast::channel(64);
        CallbackBus {
            callback,
            executor,
            sender,
        }
    }

    /// 投递一次通知
    pub fn notify(&self, tag: &str, body: &str) {
        debug!("Callback notify: tag={}", tag);

        let notice = CallbackNotice {
            tag: tag.to_string(),
            body: body.to_string(),
        };
        if self.sender.send(notice).is_err() {
            trace!("No broadcast subscribers for callback notice");
        }

        if let Some(callback) = &self.callback {
            let callback = callback.clone();
            let tag = tag.to_string();
            let body = body.to_string();
            self.executor
                .execute(Box::new(move || callback(&tag, &body)));
        }
    }

    /// 订阅通知流
    pub fn subscribe(&self) -> broadcast::Receiver<CallbackNotice> {
        self.sender.subscribe()
    }
}
