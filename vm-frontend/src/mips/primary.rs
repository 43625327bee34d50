//! Groups decided by the primary opcode alone: jumps, relative branches,
//! ALU immediates, loads, stores and the cache/prefetch hints.

use super::{DecodeCtx, fpr, gpr, jump_target, primary, relative_branch, rs, rt};
use crate::desc::{DescFlags, Descriptor, RegSet};

/// J, JAL
pub(super) fn describe_jump(_ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    if primary(op) == 0x03 {
        desc.reg_out.gpr |= gpr(31);
    }
    desc.flags |= DescFlags::IS_UNCONDITIONAL_BRANCH | DescFlags::END_SEQUENCE;
    desc.target_pc = Some(jump_target(desc.pc, op));
    desc.delay_slots = 1;
    true
}

/// BEQ, BNE, BLEZ, BGTZ and their likely forms
pub(super) fn describe_branch(_ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    let opswitch = primary(op);
    let (rs, rt) = (rs(op), rt(op));

    let (always_taken, reads) = match opswitch & 0x0f {
        // BEQ/BEQL
        0x04 => (rs == rt, gpr(rs) | gpr(rt)),
        // BNE/BNEL
        0x05 => (false, gpr(rs) | gpr(rt)),
        // BLEZ/BLEZL
        0x06 => (rs == 0, gpr(rs)),
        // BGTZ/BGTZL
        _ => (false, gpr(rs)),
    };

    let reads = RegSet { gpr: reads, ..RegSet::EMPTY };
    relative_branch(desc, op, always_taken, opswitch & 0x10 != 0, reads);
    true
}

/// ADDI, ADDIU, SLTI, SLTIU, ANDI, ORI, XORI, LUI, DADDI, DADDIU
pub(super) fn describe_immediate(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    let (rs, rt) = (rs(op), rt(op));

    match primary(op) {
        // ADDI, DADDI
        0x08 | 0x18 => {
            desc.reg_in.gpr |= gpr(rs);
            desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;
        }
        // LUI
        0x0f => {}
        _ => desc.reg_in.gpr |= gpr(rs),
    }
    desc.reg_out.gpr |= gpr(rt);
    ctx.literal(desc);
    true
}

pub(super) fn describe_load(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    let (rs, rt) = (rs(op), rt(op));

    match primary(op) {
        // LDL, LDR, LWL, LWR: 部分字节合并进目标寄存器
        0x1a | 0x1b | 0x22 | 0x26 => {
            desc.reg_in.gpr |= gpr(rs) | gpr(rt);
            desc.reg_out.gpr |= gpr(rt);
        }
        // LWC1, LDC1
        0x31 | 0x35 => {
            desc.reg_in.gpr |= gpr(rs);
            desc.reg_out.fpr |= fpr(rt);
        }
        // LWC2, LDC2
        0x32 | 0x36 => desc.reg_in.gpr |= gpr(rs),
        // LB, LH, LW, LBU, LHU, LWU, LL, LLD, LD
        _ => {
            desc.reg_in.gpr |= gpr(rs);
            desc.reg_out.gpr |= gpr(rt);
        }
    }
    desc.flags |= DescFlags::READS_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
    ctx.literal(desc);
    true
}

pub(super) fn describe_store(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    let (rs, rt) = (rs(op), rt(op));

    match primary(op) {
        // SC, SCD: 成功标志写回 rt
        0x38 | 0x3c => {
            desc.reg_in.gpr |= gpr(rs) | gpr(rt);
            desc.reg_out.gpr |= gpr(rt);
        }
        // SWC1, SDC1
        0x39 | 0x3d => {
            desc.reg_in.gpr |= gpr(rs);
            desc.reg_in.fpr |= fpr(rt);
        }
        // SWC2, SDC2
        0x3a | 0x3e => desc.reg_in.gpr |= gpr(rs),
        // SB, SH, SWL, SW, SDL, SDR, SWR, SD
        _ => desc.reg_in.gpr |= gpr(rs) | gpr(rt),
    }
    desc.flags |= DescFlags::WRITES_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
    ctx.literal(desc);
    true
}

/// CACHE, PREF
pub(super) fn describe_cache(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    match primary(op) {
        0x2f => {
            desc.reg_in.gpr |= gpr(rs(op));
            desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;
        }
        _ => {
            if !ctx.is_mips4() {
                return false;
            }
            desc.reg_in.gpr |= gpr(rs(op));
        }
    }
    ctx.literal(desc);
    true
}

/// COP2 is not implemented on any supported core.
pub(super) fn describe_cop2(_ctx: &DecodeCtx<'_>, desc: &mut Descriptor, _op: u32) -> bool {
    // 协处理器不可用，必然异常
    desc.flags |= DescFlags::WILL_CAUSE_EXCEPTION | DescFlags::END_SEQUENCE;
    true
}

pub(super) fn describe_invalid(_ctx: &DecodeCtx<'_>, _desc: &mut Descriptor, _op: u32) -> bool {
    false
}
