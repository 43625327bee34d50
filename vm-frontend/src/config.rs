//! 前端配置（Configuration）
//!
//! 提供块描述引擎的配置项，支持：
//! - 从 TOML 文本加载（缺省字段使用默认值）
//! - 加载后统一校验

use serde::{Deserialize, Serialize};
use vm_core::{AddressSpace, CoreError, VmError, VmResult};

use crate::mips::{CpuFlavor, INSN_WIDTH};

/// 单次描述允许的最大代码窗口（字节）
pub const MAX_WINDOW_BYTES: u64 = 1 << 20;

/// 块描述引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// 客户机 CPU 型号，决定可用的指令集扩展
    pub flavor: CpuFlavor,
    /// `describe_code` 在起始 PC 之前纳入窗口的字节数
    pub window_start: u32,
    /// `describe_code` 在起始 PC 之后纳入窗口的字节数
    pub window_end: u32,
    /// 单个序列允许的最大连续指令数
    pub max_sequence: u32,
    /// 待探索分支目标栈的深度上限
    pub max_stack_depth: usize,
    /// 翻译单元（页）大小的位数；0 表示不做地址翻译校验
    pub page_shift: u8,
    /// 取指使用的地址空间
    pub address_space: AddressSpace,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            flavor: CpuFlavor::R4600,
            window_start: 128,
            window_end: 512,
            max_sequence: 64,
            max_stack_depth: 100,
            page_shift: 12,
            address_space: AddressSpace::Program,
        }
    }
}

impl FrontendConfig {
    /// 从 TOML 文本加载配置并校验
    ///
    /// # 示例
    /// ```
    /// use vm_frontend::{CpuFlavor, FrontendConfig};
    ///
    /// let config = FrontendConfig::from_toml_str("flavor = \"r5000\"\nmax_sequence = 32").unwrap();
    /// assert_eq!(config.flavor, CpuFlavor::R5000);
    /// assert_eq!(config.max_sequence, 32);
    /// assert_eq!(config.window_end, 512);
    /// ```
    pub fn from_toml_str(text: &str) -> VmResult<Self> {
        let config: FrontendConfig = toml::from_str(text).map_err(|e| {
            VmError::Core(CoreError::Config {
                message: e.message().to_string(),
                path: e.span().map(|span| format!("bytes {}..{}", span.start, span.end)),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> VmResult<()> {
        if self.max_sequence == 0 {
            return Err(VmError::invalid_config("max_sequence", "must be non-zero"));
        }
        if self.max_stack_depth == 0 {
            return Err(VmError::invalid_config("max_stack_depth", "must be non-zero"));
        }
        if self.page_shift > 32 {
            return Err(VmError::invalid_config(
                "page_shift",
                format!("{} exceeds the 32-bit page size limit", self.page_shift),
            ));
        }
        let width = u32::from(INSN_WIDTH);
        for (field, bytes) in [("window_start", self.window_start), ("window_end", self.window_end)] {
            if bytes % width != 0 {
                return Err(VmError::invalid_config(
                    field,
                    format!("{bytes} is not a multiple of the {width}-byte instruction width"),
                ));
            }
        }
        let window = u64::from(self.window_start) + u64::from(self.window_end);
        if window == 0 || window > MAX_WINDOW_BYTES {
            return Err(VmError::invalid_config(
                "window_end",
                format!("window of {window} bytes must be within 1..={MAX_WINDOW_BYTES}"),
            ));
        }
        Ok(())
    }

    /// 翻译单元掩码（页内偏移位）
    pub(crate) fn page_mask(&self) -> u64 {
        (1u64 << self.page_shift) - 1
    }
}
