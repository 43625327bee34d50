//! # vm-frontend - MIPS 基本块描述引擎
//!
//! 为动态重编译器提供指令描述：给定起始 PC 和一个地址窗口，解码窗口内可达的
//! 客户机指令，输出带注解的描述符链表（读写寄存器、分支与异常行为、延迟槽、
//! 周期开销），供后端代码生成器消费。
//!
//! ## 主要组件
//!
//! - [`pool`]: 描述符池（arena + 空闲链表）
//! - [`mips`]: 按操作码分组的 MIPS III/IV 解码器
//! - [`Frontend`]: `describe_block` / `release_block` 生命周期接口
//! - [`config`]: TOML 配置
//!
//! 客户机故障（未映射 PC、非法指令）以描述符标志的形式带内传递；
//! 只有宿主侧的契约违规（非法窗口、非法配置）才返回 [`VmError`]。

use vm_core::{GuestAddr, InsnSource, VmError, VmResult};

mod builder;
pub mod config;
pub mod desc;
pub mod mips;
pub mod pool;

pub use config::{FrontendConfig, MAX_WINDOW_BYTES};
pub use desc::{DescFlags, DescId, Descriptor, RawOpcode, RegSet};
pub use mips::{CpuFlavor, IsaLevel};
pub use pool::{DescriptorPool, PoolStats};

use builder::BlockBuilder;
use mips::INSN_WIDTH;

/// 一次描述得到的描述符链表
///
/// 由调用者持有，直到交还给 [`Frontend::release_block`]。该类型不可克隆，
/// 交还即被消费，因此同一链表不会被释放两次。
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a described block must be handed back to `release_block`"]
pub struct Block {
    head: DescId,
}

impl Block {
    /// 链表头（起始 PC 的描述符）
    pub fn head(&self) -> DescId {
        self.head
    }
}

/// 按最终顺序遍历链表
pub struct ChainIter<'a> {
    pool: &'a DescriptorPool,
    cursor: Option<DescId>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = (DescId, &'a Descriptor);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let desc = self.pool.get(id);
        self.cursor = desc.next;
        Some((id, desc))
    }
}

/// 块描述引擎
///
/// 每个客户机 CPU 持有一个实例；实例内部的描述符池不可跨线程共享。
///
/// # 示例
/// ```
/// use vm_core::{AddressSpace, AddressTranslator, GuestAddr, GuestPhysAddr, InsnFetch, VmError};
/// use vm_frontend::mips::encode::{encode_beq, encode_nop};
/// use vm_frontend::{Frontend, FrontendConfig};
///
/// struct Rom(Vec<u32>);
///
/// impl AddressTranslator for Rom {
///     fn translate(&self, _space: AddressSpace, va: GuestAddr) -> Result<GuestPhysAddr, VmError> {
///         Ok(GuestPhysAddr(va.0))
///     }
/// }
///
/// impl InsnFetch for Rom {
///     fn fetch_opcode(&self, pa: GuestPhysAddr) -> u32 {
///         self.0[(pa.0 / 4) as usize]
///     }
/// }
///
/// let rom = Rom(vec![encode_beq(0, 0, 1), encode_nop(), encode_nop()]);
/// let mut frontend = Frontend::new(FrontendConfig::default())?;
/// let block = frontend.describe_block(&rom, GuestAddr(0), GuestAddr(0), GuestAddr(12))?;
/// let pcs: Vec<u64> = frontend.chain(&block).map(|(_, desc)| desc.pc.0).collect();
/// assert_eq!(pcs, [0, 8]);
/// frontend.release_block(block);
/// # Ok::<(), VmError>(())
/// ```
#[derive(Debug)]
pub struct Frontend {
    config: FrontendConfig,
    pool: DescriptorPool,
}

impl Frontend {
    /// 校验配置并创建引擎
    pub fn new(config: FrontendConfig) -> VmResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pool: DescriptorPool::new(),
        })
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    /// 描述 `[min, max)` 窗口内从 `start` 可达的代码
    ///
    /// 返回的链表至少包含一个描述符。`start` 不可映射时返回只含一个
    /// 合成故障描述符的链表，而不是错误。
    ///
    /// # Errors
    ///
    /// 窗口为空、`start` 不在窗口内、`start`/`min`/`max` 未按 4 字节对齐，
    /// 或窗口超过 [`MAX_WINDOW_BYTES`] 时返回 `CoreError::InvalidParameter`。
    pub fn describe_block(
        &mut self,
        mmu: &dyn InsnSource,
        start: GuestAddr,
        min: GuestAddr,
        max: GuestAddr,
    ) -> VmResult<Block> {
        check_window(start, min, max)?;

        let head = BlockBuilder::new(&self.config, &mut self.pool, mmu, start, min, max).build();
        let block = Block { head };

        tracing::debug!(
            start = %start,
            min = %min,
            max = %max,
            descriptors = self.chain(&block).count(),
            "described block"
        );
        Ok(block)
    }

    /// 以配置中的窗口大小描述 `start` 附近的代码
    ///
    /// 窗口为 `[start - window_start, start + window_end)`，两端在地址空间边界处截断，
    /// 截断后的上界向下对齐到指令宽度。
    pub fn describe_code(&mut self, mmu: &dyn InsnSource, start: GuestAddr) -> VmResult<Block> {
        let width = u64::from(INSN_WIDTH);
        let min = start.saturating_sub(u64::from(self.config.window_start));
        let max = start.saturating_add(u64::from(self.config.window_end));
        let max = GuestAddr(max.0 / width * width);
        self.describe_block(mmu, start, min, max)
    }

    /// 将整条链表（含延迟槽）归还描述符池
    pub fn release_block(&mut self, block: Block) {
        let mut released = 0usize;
        let mut cursor = Some(block.head);

        while let Some(id) = cursor {
            let desc = self.pool.get(id);
            cursor = desc.next;
            if let Some(slot) = desc.delay_slot {
                debug_assert!(self.pool.get(slot).delay_slot.is_none());
                self.pool.release(slot);
                released += 1;
            }
            self.pool.release(id);
            released += 1;
        }

        tracing::debug!(released, "released block");
    }

    /// 按最终顺序遍历链表
    pub fn chain<'a>(&'a self, block: &Block) -> ChainIter<'a> {
        ChainIter {
            pool: &self.pool,
            cursor: Some(block.head),
        }
    }

    pub fn descriptor(&self, id: DescId) -> &Descriptor {
        self.pool.get(id)
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

fn check_window(start: GuestAddr, min: GuestAddr, max: GuestAddr) -> VmResult<()> {
    let width = u64::from(INSN_WIDTH);
    if min >= max {
        return Err(VmError::invalid_parameter("max", max, "window is empty"));
    }
    if start < min || start >= max {
        return Err(VmError::invalid_parameter("start", start, "outside the [min, max) window"));
    }
    if start.0 % width != 0 {
        return Err(VmError::invalid_parameter("start", start, "not 4-byte aligned"));
    }
    if min.0 % width != 0 {
        return Err(VmError::invalid_parameter("min", min, "not 4-byte aligned"));
    }
    if max.0 % width != 0 {
        return Err(VmError::invalid_parameter("max", max, "not 4-byte aligned"));
    }
    if max - min > MAX_WINDOW_BYTES {
        return Err(VmError::invalid_parameter(
            "max",
            max,
            format!("window exceeds {MAX_WINDOW_BYTES} bytes"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm_core::CoreError;

    #[test]
    fn test_check_window() {
        let at = GuestAddr;
        assert!(check_window(at(0), at(0), at(4)).is_ok());
        assert!(check_window(at(0x10), at(0), at(0x20)).is_ok());

        for (start, min, max) in [
            (0, 0, 0),
            (8, 8, 4),
            (0x20, 0, 0x20),
            (0, 4, 0x20),
            (6, 0, 0x20),
            (8, 2, 0x20),
            (0, 0, 6),
            (0x10, 0, 0x22),
            (0, 0, MAX_WINDOW_BYTES + 4),
        ] {
            let err = check_window(at(start), at(min), at(max)).unwrap_err();
            assert!(
                matches!(err, VmError::Core(CoreError::InvalidParameter { .. })),
                "({start:#x}, {min:#x}, {max:#x}) -> {err}"
            );
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = FrontendConfig {
            max_stack_depth: 0,
            ..FrontendConfig::default()
        };
        assert!(Frontend::new(config).is_err());
    }

    #[test]
    fn test_describe_code_keeps_top_of_address_space_aligned() {
        struct Zeros;

        impl vm_core::AddressTranslator for Zeros {
            fn translate(
                &self,
                _space: vm_core::AddressSpace,
                va: GuestAddr,
            ) -> Result<vm_core::GuestPhysAddr, VmError> {
                Ok(va.into())
            }
        }

        impl vm_core::InsnFetch for Zeros {
            fn fetch_opcode(&self, _pa: vm_core::GuestPhysAddr) -> u32 {
                0
            }
        }

        let mut frontend = Frontend::new(FrontendConfig::default()).unwrap();
        // start + window_end 饱和到 u64::MAX，上界向下对齐
        let start = GuestAddr(u64::MAX - 0xf);
        let block = frontend.describe_code(&Zeros, start).unwrap();
        let pcs: Vec<u64> = frontend.chain(&block).map(|(_, desc)| desc.pc.0).collect();
        assert_eq!(pcs, [start.0, start.0 + 4, start.0 + 8]);
        frontend.release_block(block);
    }
}
