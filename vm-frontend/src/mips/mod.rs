//! MIPS III / MIPS IV instruction description
//!
//! Classification is a two-level dispatch: the primary opcode (bits 31..26)
//! selects an [`OpGroup`], the group's handler in [`GROUP_HANDLERS`] then
//! switches on the narrower field its format defines (funct, rt, rs).
//! Every handler is a pure function from (instruction word, descriptor) to
//! descriptor mutations and reports `false` for encodings it does not know.

use serde::{Deserialize, Serialize};
use vm_core::{GuestAddr, InsnFetch, InsnSource};

use crate::desc::{DescFlags, Descriptor, RegSet};

mod cop0;
mod cop1;
pub mod encode;
mod idt;
mod primary;
mod regimm;
mod special;

#[cfg(test)]
mod tests;

/// Every MIPS instruction is one 32-bit word.
pub const INSN_WIDTH: u8 = 4;

/// Guest CPU model, ordered by capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuFlavor {
    Vr4300,
    R4600,
    /// IDT R4650, adds the `MAD`/`MADU`/`MUL` vendor group
    R4650,
    R4700,
    R5000,
    Qed5271,
    Rm7000,
}

/// Instruction-set level implied by a [`CpuFlavor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IsaLevel {
    Mips3,
    Mips4,
}

impl CpuFlavor {
    pub fn isa_level(self) -> IsaLevel {
        if self >= CpuFlavor::R5000 {
            IsaLevel::Mips4
        } else {
            IsaLevel::Mips3
        }
    }

    pub fn has_idt_extensions(self) -> bool {
        self == CpuFlavor::R4650
    }
}

/// Read-only decode context shared by every group handler.
pub(crate) struct DecodeCtx<'a> {
    pub(crate) mmu: &'a dyn InsnSource,
    pub(crate) flavor: CpuFlavor,
}

impl DecodeCtx<'_> {
    fn is_mips4(&self) -> bool {
        self.flavor.isa_level() >= IsaLevel::Mips4
    }

    /// Record the literal operand word through the argument channel.
    fn literal(&self, desc: &mut Descriptor) {
        desc.raw.argument = Some(self.mmu.fetch_argument(desc.physpc));
    }
}

// ============================================================================
// Field extraction
// ============================================================================

fn primary(op: u32) -> u32 {
    op >> 26
}

fn rs(op: u32) -> u32 {
    (op >> 21) & 31
}

fn rt(op: u32) -> u32 {
    (op >> 16) & 31
}

fn rd(op: u32) -> u32 {
    (op >> 11) & 31
}

fn funct(op: u32) -> u32 {
    op & 63
}

fn simm(op: u32) -> i64 {
    i64::from(op as u16 as i16)
}

// FP register fields share bit positions with the integer ones
fn fr(op: u32) -> u32 {
    (op >> 21) & 31
}

fn ft(op: u32) -> u32 {
    (op >> 16) & 31
}

fn fs(op: u32) -> u32 {
    (op >> 11) & 31
}

fn fd(op: u32) -> u32 {
    (op >> 6) & 31
}

fn gpr(reg: u32) -> u32 {
    1 << reg
}

fn fpr(reg: u32) -> u32 {
    1 << reg
}

fn branch_target(pc: GuestAddr, op: u32) -> GuestAddr {
    pc.wrapping_add(4).wrapping_add((simm(op) << 2) as u64)
}

fn jump_target(pc: GuestAddr, op: u32) -> GuestAddr {
    let region = pc.wrapping_add(4) & !0x0fff_ffffu64;
    GuestAddr(region | (u64::from(op & 0x03ff_ffff) << 2))
}

/// Shared tail of every PC-relative branch.
///
/// An always-taken condition is reclassified unconditional; it ends the
/// sequence and never skips its delay slot.
fn relative_branch(desc: &mut Descriptor, op: u32, always_taken: bool, likely: bool, reads: RegSet) {
    if always_taken {
        desc.flags |= DescFlags::IS_UNCONDITIONAL_BRANCH | DescFlags::END_SEQUENCE;
    } else {
        desc.reg_in = desc.reg_in.replace(RegSet::EMPTY, reads);
        desc.flags |= DescFlags::IS_CONDITIONAL_BRANCH;
        if likely {
            desc.flags |= DescFlags::IS_LIKELY_BRANCH;
            desc.skip_slots = 1;
        }
    }
    desc.target_pc = Some(branch_target(desc.pc, op));
    desc.delay_slots = 1;
}

// ============================================================================
// Group dispatch
// ============================================================================

/// Opcode group selected by the primary opcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum OpGroup {
    Special,
    Regimm,
    Jump,
    Branch,
    Immediate,
    Load,
    Store,
    Cop0,
    Cop1,
    Cop1x,
    Cop2,
    Vendor,
    Cache,
    Invalid,
}

type GroupHandler = fn(&DecodeCtx<'_>, &mut Descriptor, u32) -> bool;

/// Handlers indexed by `OpGroup as usize`.
static GROUP_HANDLERS: [GroupHandler; 14] = [
    special::describe_special,
    regimm::describe_regimm,
    primary::describe_jump,
    primary::describe_branch,
    primary::describe_immediate,
    primary::describe_load,
    primary::describe_store,
    cop0::describe_cop0,
    cop1::describe_cop1,
    cop1::describe_cop1x,
    primary::describe_cop2,
    idt::describe_idt,
    primary::describe_cache,
    primary::describe_invalid,
];

static PRIMARY_GROUPS: [OpGroup; 64] = {
    use OpGroup::*;
    [
        // 0x00
        Special, Regimm, Jump, Jump, Branch, Branch, Branch, Branch,
        // 0x08
        Immediate, Immediate, Immediate, Immediate, Immediate, Immediate, Immediate, Immediate,
        // 0x10
        Cop0, Cop1, Cop2, Cop1x, Branch, Branch, Branch, Branch,
        // 0x18
        Immediate, Immediate, Load, Load, Vendor, Invalid, Invalid, Invalid,
        // 0x20
        Load, Load, Load, Load, Load, Load, Load, Load,
        // 0x28
        Store, Store, Store, Store, Store, Store, Store, Cache,
        // 0x30
        Load, Load, Load, Cache, Load, Load, Load, Load,
        // 0x38
        Store, Store, Store, Invalid, Store, Store, Store, Store,
    ]
};

impl OpGroup {
    pub(crate) fn of(op: u32) -> OpGroup {
        PRIMARY_GROUPS[primary(op) as usize]
    }
}

/// Mark a descriptor as an undecodable instruction.
///
/// Only the invalid-opcode trio survives; whatever a sub-decoder recorded
/// before rejecting the encoding is discarded.
pub(crate) fn invalid_opcode(desc: &mut Descriptor) {
    desc.flags = DescFlags::INVALID_OPCODE | DescFlags::WILL_CAUSE_EXCEPTION | DescFlags::END_SEQUENCE;
    desc.reg_in = RegSet::EMPTY;
    desc.reg_out = RegSet::EMPTY;
    desc.target_pc = None;
    desc.delay_slots = 0;
    desc.skip_slots = 0;
    desc.raw.argument = None;
}

/// Fill `desc` (already translated, `physpc` valid) from the instruction
/// word at its physical address.
pub(crate) fn describe(ctx: &DecodeCtx<'_>, desc: &mut Descriptor) {
    let op = ctx.mmu.fetch_opcode(desc.physpc);
    desc.raw.opcode = op;
    desc.length = INSN_WIDTH;
    desc.cycles = 1;

    let group = OpGroup::of(op);
    if !GROUP_HANDLERS[group as usize](ctx, desc, op) {
        invalid_opcode(desc);
    }

    // r0 is hardwired to zero: neither a real input nor a real output
    desc.reg_in.gpr &= !1;
    desc.reg_out.gpr &= !1;
}
