use std::fmt;

#[derive(Debug, Clone)]
pub enum TrackerError {
    Config(String),
    MalformedUrl(String),
    Network(String),
    Serialization(String),
    Storage(String),
    FileOperation(String),
}

impl TrackerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            TrackerError::Config(_) => "E001",
            TrackerError::MalformedUrl(_) => "E002",
            TrackerError::Network(_) => "E003",
            TrackerError::Serialization(_) => "E004",
            TrackerError::Storage(_) => "E005",
            TrackerError::FileOperation(_) => "E006",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            TrackerError::Config(_) => "Configuration Error",
            TrackerError::MalformedUrl(_) => "Malformed URL",
            TrackerError::Network(_) => "Network Error",
            TrackerError::Serialization(_) => "Serialization Error",
            TrackerError::Storage(_) => "Storage Error",
            TrackerError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            TrackerError::Config(msg) => msg,
            TrackerError::MalformedUrl(msg) => msg,
            TrackerError::Network(msg) => msg,
            TrackerError::Serialization(msg) => msg,
            TrackerError::Storage(msg) => msg,
            TrackerError::FileOperation(msg) => msg,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TrackerError {}

// 便捷的构造函数
impl TrackerError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        TrackerError::Config(msg.into())
    }

    pub fn malformed_url<T: Into<String>>(msg: T) -> Self {
        TrackerError::MalformedUrl(msg.into())
    }

    pub fn network<T: Into<String>>(msg: T) -> Self {
        TrackerError::Network(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        TrackerError::Serialization(msg.into())
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        TrackerError::Storage(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        TrackerError::FileOperation(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for TrackerError {
    fn from(err: url::ParseError) -> Self {
        TrackerError::MalformedUrl(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
