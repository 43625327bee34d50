//! # vm-core - 虚拟机核心库
//!
//! 提供前端描述引擎所依赖的核心类型定义与 Trait 抽象。
//!
//! ## 主要组件
//!
//! - **类型定义**: [`GuestAddr`], [`GuestPhysAddr`] 地址类型，[`AddressSpace`] 地址空间
//! - **取指契约**: [`AddressTranslator`], [`InsnFetch`] 以及组合 trait [`InsnSource`]
//! - **错误处理**: [`VmError`] 统一错误类型
//!
//! ## 示例
//!
//! ```rust
//! use vm_core::GuestAddr;
//!
//! let pc = GuestAddr(0x8000_0000);
//! assert_eq!(pc.wrapping_add(4), GuestAddr(0x8000_0004));
//! assert_eq!(GuestAddr(0x8000_0010) - pc, 0x10);
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub mod mmu_traits;

pub use error::{CoreError, MemoryError, VmError, VmResult};
pub use mmu_traits::{AddressTranslator, InsnFetch, InsnSource};

// ============================================================================
// 基础类型定义
// ============================================================================

/// 客户机虚拟地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GuestAddr(pub u64);

impl GuestAddr {
    /// Wrapping addition
    pub fn wrapping_add(self, rhs: u64) -> Self {
        GuestAddr(self.0.wrapping_add(rhs))
    }

    /// Saturating addition, used when clamping code windows to the address space
    pub fn saturating_add(self, rhs: u64) -> Self {
        GuestAddr(self.0.saturating_add(rhs))
    }

    /// Saturating subtraction of a byte count
    pub fn saturating_sub(self, rhs: u64) -> Self {
        GuestAddr(self.0.saturating_sub(rhs))
    }

    /// 页号（`page_shift` 为 0 时返回地址本身）
    pub fn page(self, page_shift: u8) -> u64 {
        self.0 >> page_shift
    }
}

impl std::fmt::LowerHex for GuestAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl std::fmt::Display for GuestAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl std::ops::Add<u64> for GuestAddr {
    type Output = GuestAddr;

    fn add(self, rhs: u64) -> Self::Output {
        GuestAddr(self.0 + rhs)
    }
}

impl std::ops::AddAssign<u64> for GuestAddr {
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

impl std::ops::Sub for GuestAddr {
    type Output = u64;

    fn sub(self, rhs: GuestAddr) -> Self::Output {
        self.0 - rhs.0
    }
}

impl std::ops::BitAnd<u64> for GuestAddr {
    type Output = u64;

    fn bitand(self, rhs: u64) -> Self::Output {
        self.0 & rhs
    }
}

/// 客户机物理地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GuestPhysAddr(pub u64);

impl From<GuestAddr> for GuestPhysAddr {
    fn from(addr: GuestAddr) -> Self {
        GuestPhysAddr(addr.0)
    }
}

impl std::fmt::LowerHex for GuestPhysAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// 访问类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessType {
    /// 读取
    Read,
    /// 写入
    Write,
    /// 执行（取指）
    Execute,
}

/// 地址空间
///
/// 前端只通过程序空间取指；其余空间供执行引擎的翻译回调区分访问目的。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressSpace {
    /// 程序（指令）空间
    #[default]
    Program,
    /// 数据空间
    Data,
    /// I/O 空间
    Io,
}
