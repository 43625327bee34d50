//! 取指契约 Trait 拆分
//!
//! 前端描述引擎对内存子系统的全部依赖只有两件事：把虚拟 PC 翻译成物理地址，
//! 以及从物理地址读取指令字。这里将其拆分为两个细粒度接口，再组合为
//! [`InsnSource`]，与 MMU 的其余职责（写内存、MMIO 等）隔离。

use crate::{AddressSpace, GuestAddr, GuestPhysAddr, VmError};

/// 地址翻译器
///
/// 负责虚拟地址到物理地址的翻译。对前端而言该接口是只读的。
pub trait AddressTranslator {
    /// 虚拟地址翻译
    ///
    /// 返回 `Err` 表示该地址当前未映射（取指会触发故障）。调用者不得再对该地址取指。
    fn translate(&self, space: AddressSpace, va: GuestAddr) -> Result<GuestPhysAddr, VmError>;
}

/// 双通道取指接口
///
/// 某些客户机系统的指令流经过解密电路，操作码字节和操作数字节使用不同的解密方式。
/// 影响控制流的字节必须通过 [`InsnFetch::fetch_opcode`] 读取，
/// 只作为字面操作数的字节通过 [`InsnFetch::fetch_argument`] 读取。
pub trait InsnFetch {
    /// 从物理地址读取操作码通道的指令字
    fn fetch_opcode(&self, pa: GuestPhysAddr) -> u32;

    /// 从物理地址读取操作数通道的指令字
    ///
    /// 未加密的系统两条通道内容一致，默认实现直接复用操作码通道。
    fn fetch_argument(&self, pa: GuestPhysAddr) -> u32 {
        self.fetch_opcode(pa)
    }
}

/// 统一的取指来源
///
/// 组合翻译与取指接口，前端只依赖这一个 trait。
pub trait InsnSource: AddressTranslator + InsnFetch {}

// 为实现了所有子trait的类型自动实现InsnSource trait
impl<T> InsnSource for T where T: AddressTranslator + InsnFetch {}
