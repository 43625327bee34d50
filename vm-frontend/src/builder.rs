//! 块构建器
//!
//! 单次 `describe_block` 调用的全部临时状态都在 [`BlockBuilder`] 中：
//! 以 `(pc - min) / 4` 为下标的查找表、待探索分支目标栈。构建分两步：
//!
//! 1. **探索**：从起始 PC 出发顺序解码，遇到窗口内的分支目标压栈，
//!    已解码过的 PC 只更新标志，不重复解码。
//! 2. **链接**：按 `[start, max)`、`[min, start)` 的顺序遍历查找表，
//!    确定每个序列的结束位置，并把描述符依次挂到输出链表尾部。

use vm_core::{AddressTranslator, GuestAddr, InsnSource};

use crate::config::FrontendConfig;
use crate::desc::{DescFlags, DescId, Descriptor, RawOpcode, RegSet};
use crate::mips::{self, DecodeCtx, INSN_WIDTH};
use crate::pool::DescriptorPool;

/// 未映射取指时合成描述符的标志位
const FAULT_FLAGS: DescFlags = DescFlags::CAN_CAUSE_EXCEPTION
    .union(DescFlags::END_SEQUENCE)
    .union(DescFlags::REDISPATCH)
    .union(DescFlags::VALIDATE_TLB)
    .union(DescFlags::COMPILER_PAGE_FAULT)
    .union(DescFlags::VIRTUAL_NOOP);

const WIDTH: u64 = INSN_WIDTH as u64;

/// 描述窗口 `[min, max)`
#[derive(Debug, Clone, Copy)]
struct Window {
    min: GuestAddr,
    max: GuestAddr,
}

impl Window {
    fn contains(self, pc: GuestAddr) -> bool {
        pc >= self.min && pc < self.max && (pc - self.min) % WIDTH == 0
    }

    fn index(self, pc: GuestAddr) -> usize {
        ((pc - self.min) / WIDTH) as usize
    }

    fn slots(self) -> usize {
        ((self.max - self.min) / WIDTH) as usize
    }
}

/// 待探索的分支目标
#[derive(Debug, Clone, Copy)]
struct PendingTarget {
    /// 跳转来源；起始 PC 没有来源
    source: Option<GuestAddr>,
    target: GuestAddr,
}

/// 链表末尾的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeEnd {
    /// `[start, max)`：落出窗口需要重新分派
    Dispatch,
    /// `[min, start)`：落出范围回到块起点
    Wrap,
}

#[derive(Debug, Default)]
struct Chain {
    head: Option<DescId>,
    tail: Option<DescId>,
}

impl Chain {
    fn append(&mut self, pool: &mut DescriptorPool, id: DescId) {
        match self.tail {
            Some(tail) => pool.get_mut(tail).next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }
}

pub(crate) struct BlockBuilder<'a> {
    config: &'a FrontendConfig,
    pool: &'a mut DescriptorPool,
    ctx: DecodeCtx<'a>,
    start: GuestAddr,
    window: Window,
    /// PC → 描述符查找表，仅在本次构建期间存在
    table: Vec<Option<DescId>>,
}

impl<'a> BlockBuilder<'a> {
    /// 调用者保证窗口非空、已对齐且包含 `start`
    pub(crate) fn new(
        config: &'a FrontendConfig,
        pool: &'a mut DescriptorPool,
        mmu: &'a dyn InsnSource,
        start: GuestAddr,
        min: GuestAddr,
        max: GuestAddr,
    ) -> Self {
        let window = Window { min, max };
        Self {
            config,
            pool,
            ctx: DecodeCtx {
                mmu,
                flavor: config.flavor,
            },
            start,
            window,
            table: vec![None; window.slots()],
        }
    }

    /// 探索并链接，返回链表头（起始 PC 的描述符）
    pub(crate) fn build(mut self) -> DescId {
        let head = self.explore();
        let linked = self.link();
        debug_assert_eq!(linked, Some(head));
        head
    }

    fn lookup(&self, pc: GuestAddr) -> Option<DescId> {
        self.table[self.window.index(pc)]
    }

    // ========================================================================
    // 探索
    // ========================================================================

    fn explore(&mut self) -> DescId {
        let mut pending = Vec::with_capacity(self.config.max_stack_depth);
        let head = self.explore_run(self.start, &mut pending);

        while let Some(PendingTarget { source, target }) = pending.pop() {
            match self.lookup(target) {
                // 已访问：只更新标志
                Some(id) => self.mark_revisit(id, source, target),
                None => {
                    self.explore_run(target, &mut pending);
                }
            }
        }
        head
    }

    fn mark_revisit(&mut self, id: DescId, source: Option<GuestAddr>, target: GuestAddr) {
        let page_shift = self.config.page_shift;
        let desc = self.pool.get_mut(id);
        desc.flags |= DescFlags::IS_BRANCH_TARGET;
        let crosses_page =
            page_shift != 0 && source.is_some_and(|src| (src.0 ^ target.0) >> page_shift != 0);
        if crosses_page {
            desc.flags |= DescFlags::VALIDATE_TLB | DescFlags::CAN_CAUSE_EXCEPTION;
        }
    }

    /// 从未访问过的 `target` 顺序解码，直到序列结束、离开窗口或遇到已解码的 PC
    ///
    /// 返回 `target` 处的描述符。
    fn explore_run(&mut self, target: GuestAddr, pending: &mut Vec<PendingTarget>) -> DescId {
        let window = self.window;
        let page_shift = self.config.page_shift;
        let page_mask = self.config.page_mask();

        let first = self.describe_one(target, None);
        let mut id = first;
        let mut pc = target;
        loop {
            self.table[window.index(pc)] = Some(id);

            let desc = self.pool.get_mut(id);
            if pc == target {
                desc.flags |= DescFlags::IS_BRANCH_TARGET;
            }
            if desc.flags.contains(DescFlags::COMPILER_PAGE_FAULT) {
                break;
            }
            if page_shift != 0 && (pc == self.start || pc & page_mask == 0) {
                desc.flags |= DescFlags::VALIDATE_TLB | DescFlags::CAN_CAUSE_EXCEPTION;
            }

            if desc.is_branch()
                && let Some(dest) = desc.target_pc.filter(|&dest| window.contains(dest))
            {
                if pending.len() < self.config.max_stack_depth {
                    desc.flags |= DescFlags::INTRABLOCK_BRANCH;
                    pending.push(PendingTarget {
                        source: Some(pc),
                        target: dest,
                    });
                } else {
                    tracing::debug!(
                        branch = %pc,
                        target = %dest,
                        depth = pending.len(),
                        "pending-target stack full, target left unexplored"
                    );
                }
            }

            if desc.ends_sequence() {
                break;
            }
            pc = desc.fallthrough_pc();
            if !window.contains(pc) || self.lookup(pc).is_some() {
                break;
            }
            id = self.describe_one(pc, None);
        }
        first
    }

    /// 描述单条指令；分支指令连同其延迟槽一起描述
    ///
    /// `owner` 非空表示正在描述 `owner` 的延迟槽，延迟槽内的分支不再拥有延迟槽。
    fn describe_one(&mut self, pc: GuestAddr, owner: Option<DescId>) -> DescId {
        let id = self.pool.acquire(pc);

        match self.ctx.mmu.translate(self.config.address_space, pc) {
            Ok(physpc) => {
                let desc = self.pool.get_mut(id);
                desc.physpc = physpc;
                mips::describe(&self.ctx, desc);
                tracing::trace!(
                    pc = %pc,
                    opcode = format_args!("{:#010x}", desc.raw.opcode),
                    flags = ?desc.flags,
                    "described instruction"
                );
            }
            Err(error) => {
                tracing::debug!(pc = %pc, %error, "instruction fetch fault described in-band");
                describe_fault(self.pool.get_mut(id));
            }
        }

        if let Some(owner) = owner {
            let desc = self.pool.get_mut(id);
            desc.flags |= DescFlags::IN_DELAY_SLOT;
            desc.branch_owner = Some(owner);
            return id;
        }

        let desc = self.pool.get(id);
        if desc.is_branch() && desc.delay_slots > 0 {
            let slot_pc = desc.pc.wrapping_add(u64::from(desc.length));
            let slot = self.describe_one(slot_pc, Some(id));
            self.pool.get_mut(id).delay_slot = Some(slot);
        }
        id
    }

    // ========================================================================
    // 链接
    // ========================================================================

    fn link(&mut self) -> Option<DescId> {
        let split = self.window.index(self.start);
        let mut chain = Chain::default();
        self.link_range(split, self.table.len(), RangeEnd::Dispatch, &mut chain);
        self.link_range(0, split, RangeEnd::Wrap, &mut chain);
        chain.head
    }

    fn link_range(&mut self, from: usize, to: usize, range_end: RangeEnd, chain: &mut Chain) {
        let occupied: Vec<usize> = (from..to).filter(|&i| self.table[i].is_some()).collect();
        let max_sequence = self.config.max_sequence as usize;
        let mut sequence: Vec<DescId> = Vec::new();

        for (pos, &index) in occupied.iter().enumerate() {
            let Some(id) = self.table[index] else {
                continue;
            };
            let next = occupied.get(pos + 1).and_then(|&i| self.table[i]);
            let next_is_target =
                next.is_some_and(|n| self.pool.get(n).flags.contains(DescFlags::IS_BRANCH_TARGET));

            // likely 分支的延迟槽被另一条路径作为独立指令描述过
            let desc = self.pool.get(id);
            let slot_described = desc.flags.contains(DescFlags::IS_LIKELY_BRANCH) && {
                let slot_pc = desc.pc.wrapping_add(u64::from(desc.length));
                self.window.contains(slot_pc) && {
                    let slot_index = self.window.index(slot_pc);
                    slot_index < to && self.table[slot_index].is_some()
                }
            };

            let desc = self.pool.get_mut(id);
            if sequence.is_empty() {
                desc.flags |= DescFlags::IS_BRANCH_TARGET;
            }
            if slot_described || next_is_target {
                desc.flags |= DescFlags::END_SEQUENCE;
            }

            if next.is_none() {
                desc.flags |= DescFlags::END_SEQUENCE;
                // 合成故障描述符保留自己的 REDISPATCH
                if !desc.flags.contains(DescFlags::REDISPATCH) {
                    let wraps = match range_end {
                        RangeEnd::Wrap => true,
                        RangeEnd::Dispatch => {
                            self.start == self.window.min && desc.fallthrough_pc() >= self.window.max
                        }
                    };
                    desc.flags |= if wraps {
                        DescFlags::RETURN_TO_START
                    } else {
                        DescFlags::REDISPATCH
                    };
                }
            }

            sequence.push(id);
            if sequence.len() >= max_sequence {
                desc.flags |= DescFlags::END_SEQUENCE;
            }
            if desc.ends_sequence() {
                accumulate_required(self.pool, &sequence);
                sequence.clear();
            }

            chain.append(self.pool, id);
            self.table[index] = None;
        }
    }
}

/// 未映射 PC 的合成描述符：不生成代码，运行时重新分派到真实的故障处理
fn describe_fault(desc: &mut Descriptor) {
    desc.raw = RawOpcode {
        opcode: 0,
        argument: None,
    };
    desc.length = INSN_WIDTH;
    desc.cycles = 0;
    desc.flags = FAULT_FLAGS;
}

/// 反向遍历一个已结束的序列，计算每条指令真正需要产生的输出寄存器
fn accumulate_required(pool: &mut DescriptorPool, sequence: &[DescId]) {
    let mut required = RegSet::ALL;
    for &id in sequence.iter().rev() {
        if let Some(slot) = pool.get(id).delay_slot {
            required_backwards(pool.get_mut(slot), &mut required);
        }
        required_backwards(pool.get_mut(id), &mut required);
    }
}

fn required_backwards(desc: &mut Descriptor, required: &mut RegSet) {
    if desc.is_branch() {
        *required = RegSet::ALL;
    }
    desc.reg_req = desc.reg_out.and(*required);
    *required = required.replace(desc.reg_out, desc.reg_in);
}
