//! 事件构建与上报管线
//!
//! 事件构造 → 设备元数据富化 → 网络上报 → 失败落地。

mod tracker;

pub use tracker::EventTracker;
