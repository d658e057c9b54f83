use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecaylinkError {
    Collision(String),
    Generation(String),
    Serialization(String),
    Deserialization(String),
    FileOperation(String),
    Validation(String),
    Config(String),
    Render(String),
}

impl DecaylinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            DecaylinkError::Collision(_) => "E001",
            DecaylinkError::Generation(_) => "E002",
            DecaylinkError::Serialization(_) => "E003",
            DecaylinkError::Deserialization(_) => "E004",
            DecaylinkError::FileOperation(_) => "E005",
            DecaylinkError::Validation(_) => "E006",
            DecaylinkError::Config(_) => "E007",
            DecaylinkError::Render(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            DecaylinkError::Collision(_) => "Token Collision",
            DecaylinkError::Generation(_) => "Token Generation Error",
            DecaylinkError::Serialization(_) => "Serialization Error",
            DecaylinkError::Deserialization(_) => "Deserialization Error",
            DecaylinkError::FileOperation(_) => "File Operation Error",
            DecaylinkError::Validation(_) => "Validation Error",
            DecaylinkError::Config(_) => "Configuration Error",
            DecaylinkError::Render(_) => "Render Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            DecaylinkError::Collision(msg)
            | DecaylinkError::Generation(msg)
            | DecaylinkError::Serialization(msg)
            | DecaylinkError::Deserialization(msg)
            | DecaylinkError::FileOperation(msg)
            | DecaylinkError::Validation(msg)
            | DecaylinkError::Config(msg)
            | DecaylinkError::Render(msg) => msg,
        }
    }

    /// A collision only means the random draw was unlucky; a fresh draw may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DecaylinkError::Collision(_))
    }

    /// 格式化为彩色输出（用于启动失败时的 stderr）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for DecaylinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for DecaylinkError {}

// 便捷的构造函数
impl DecaylinkError {
    pub fn collision<T: Into<String>>(msg: T) -> Self {
        DecaylinkError::Collision(msg.into())
    }

    pub fn generation<T: Into<String>>(msg: T) -> Self {
        DecaylinkError::Generation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        DecaylinkError::Serialization(msg.into())
    }

    pub fn deserialization<T: Into<String>>(msg: T) -> Self {
        DecaylinkError::Deserialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        DecaylinkError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        DecaylinkError::Validation(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        DecaylinkError::Config(msg.into())
    }

    pub fn render<T: Into<String>>(msg: T) -> Self {
        DecaylinkError::Render(msg.into())
    }
}

impl From<std::io::Error> for DecaylinkError {
    fn from(err: std::io::Error) -> Self {
        DecaylinkError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for DecaylinkError {
    fn from(err: serde_json::Error) -> Self {
        // Syntax / Data / Eof can only come out of a decoder
        if err.is_io() {
            DecaylinkError::FileOperation(err.to_string())
        } else {
            DecaylinkError::Deserialization(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, DecaylinkError>;
