use thiserror::Error;

use crate::{AccessType, GuestAddr};

/// 统一的虚拟机错误类型
///
/// 这是整个虚拟机系统的统一错误类型，所有模块都应该使用这个错误类型
/// 或可以转换为这个类型的错误。
///
/// 注意：客户机在解码阶段遇到的故障（未映射的 PC、非法指令）不使用该类型，
/// 而是作为描述符标志位带内传递，由执行引擎在运行时按客户机语义投递。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    /// 核心/基础架构错误
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// 内存管理错误
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}

/// 核心系统错误
///
/// 包含配置错误、参数错误等宿主侧的契约违规。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// 配置错误（如配置文件解析失败）
    #[error("configuration error: {message}")]
    Config {
        /// 错误描述
        message: String,
        /// 配置项路径
        path: Option<String>,
    },
    /// 无效配置
    #[error("invalid configuration field `{field}`: {message}")]
    InvalidConfig {
        /// 错误描述
        message: String,
        /// 配置字段
        field: String,
    },
    /// 无效参数
    #[error("invalid parameter `{name}` = {value}: {message}")]
    InvalidParameter {
        /// 参数名称
        name: String,
        /// 参数值
        value: String,
        /// 错误描述
        message: String,
    },
}

/// 内存管理错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MemoryError {
    /// 访问违规（例如 TLB 未命中或页面无效）
    #[error("access violation at {addr:x} ({access_type:?}): {msg}")]
    AccessViolation {
        /// 访问地址
        addr: GuestAddr,
        /// 错误描述
        msg: String,
        /// 访问类型
        access_type: AccessType,
    },
    /// 无效地址
    #[error("invalid address {0:x}")]
    InvalidAddress(GuestAddr),
}

/// 统一的结果类型
pub type VmResult<T> = Result<T, VmError>;

impl VmError {
    /// 构造无效参数错误的便捷方法
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl std::fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        VmError::Core(CoreError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            message: message.into(),
        })
    }

    /// 构造无效配置错误的便捷方法
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        VmError::Core(CoreError::InvalidConfig {
            message: message.into(),
            field: field.into(),
        })
    }
}
