//! 网络传输层
//!
//! 事件上报、安装归因数据拉取和指纹匹配都经由 `NetworkClient`。
//! 超时固定 30 秒，本层不做重试，也不向调用方抛错。

mod client;

pub use client::NetworkClient;
