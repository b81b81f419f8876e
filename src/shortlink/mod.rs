//! 短链识别与提取
//!
//! 短链 token 可能以三种编码到达：链接自身的 host（冷启动 /
//! universal link）、转发的查询参数（重定向链）、fragment 编码的
//! `key=value` 状态（web 到 app 交接）。三种都要检查。

mod detector;

pub use detector::ShortLinkDetector;
