//! SPECIAL 组（主操作码 0x00），按 funct 字段分派

use super::{DecodeCtx, funct, gpr, rd, rs, rt};
use crate::desc::{DescFlags, Descriptor, RegSet};

/// `MULT`/`MULTU` 周期数
const MULT_CYCLES: u32 = 3;
/// `DIV`/`DIVU` 周期数
const DIV_CYCLES: u32 = 35;
const DMULT_CYCLES: u32 = 7;
const DDIV_CYCLES: u32 = 67;

pub(super) fn describe_special(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    let (rs, rt, rd) = (rs(op), rt(op), rd(op));

    match funct(op) {
        // SLL, SRL, SRA, DSLL, DSRL, DSRA, DSLL32, DSRL32, DSRA32
        0x00 | 0x02 | 0x03 | 0x38 | 0x3a | 0x3b | 0x3c | 0x3e | 0x3f => {
            desc.reg_in.gpr |= gpr(rt);
            desc.reg_out.gpr |= gpr(rd);
            true
        }

        // SLLV, SRLV, SRAV, DSLLV, DSRLV, DSRAV
        // ADDU, SUBU, AND, OR, XOR, NOR, SLT, SLTU, DADDU, DSUBU
        0x04 | 0x06 | 0x07 | 0x14 | 0x16 | 0x17 | 0x21 | 0x23 | 0x24 | 0x25 | 0x26 | 0x27 | 0x2a
        | 0x2b | 0x2d | 0x2f => {
            desc.reg_in.gpr |= gpr(rs) | gpr(rt);
            desc.reg_out.gpr |= gpr(rd);
            true
        }

        // MOVF/MOVT
        0x01 => {
            if !ctx.is_mips4() {
                return false;
            }
            desc.reg_in.gpr |= gpr(rs) | gpr(rd);
            desc.reg_in.misc |= RegSet::FCC;
            desc.reg_out.gpr |= gpr(rd);
            true
        }

        // MOVZ, MOVN
        0x0a | 0x0b => {
            if !ctx.is_mips4() {
                return false;
            }
            desc.reg_in.gpr |= gpr(rs) | gpr(rt) | gpr(rd);
            desc.reg_out.gpr |= gpr(rd);
            true
        }

        // ADD, SUB, DADD, DSUB: 溢出陷阱
        0x20 | 0x22 | 0x2c | 0x2e => {
            desc.reg_in.gpr |= gpr(rs) | gpr(rt);
            desc.reg_out.gpr |= gpr(rd);
            desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;
            true
        }

        // MULT, MULTU, DMULT, DMULTU, DIV, DIVU, DDIV, DDIVU
        0x18 | 0x19 | 0x1a | 0x1b | 0x1c | 0x1d | 0x1e | 0x1f => {
            desc.reg_in.gpr |= gpr(rs) | gpr(rt);
            desc.reg_out.misc |= RegSet::LO | RegSet::HI;
            desc.cycles = match funct(op) {
                0x18 | 0x19 => MULT_CYCLES,
                0x1a | 0x1b => DIV_CYCLES,
                0x1c | 0x1d => DMULT_CYCLES,
                _ => DDIV_CYCLES,
            };
            true
        }

        // JR
        0x08 => {
            desc.reg_in.gpr |= gpr(rs);
            desc.flags |= DescFlags::IS_UNCONDITIONAL_BRANCH | DescFlags::END_SEQUENCE;
            desc.target_pc = None;
            desc.delay_slots = 1;
            true
        }

        // JALR
        0x09 => {
            desc.reg_in.gpr |= gpr(rs);
            desc.reg_out.gpr |= gpr(rd);
            desc.flags |= DescFlags::IS_UNCONDITIONAL_BRANCH | DescFlags::END_SEQUENCE;
            desc.target_pc = None;
            desc.delay_slots = 1;
            true
        }

        // MFHI
        0x10 => {
            desc.reg_in.misc |= RegSet::HI;
            desc.reg_out.gpr |= gpr(rd);
            true
        }

        // MTHI
        0x11 => {
            desc.reg_in.gpr |= gpr(rs);
            desc.reg_out.misc |= RegSet::HI;
            true
        }

        // MFLO
        0x12 => {
            desc.reg_in.misc |= RegSet::LO;
            desc.reg_out.gpr |= gpr(rd);
            true
        }

        // MTLO
        0x13 => {
            desc.reg_in.gpr |= gpr(rs);
            desc.reg_out.misc |= RegSet::LO;
            true
        }

        // SYSCALL, BREAK
        0x0c | 0x0d => {
            desc.flags |= DescFlags::WILL_CAUSE_EXCEPTION | DescFlags::END_SEQUENCE;
            true
        }

        // SYNC
        0x0f => true,

        // TGE, TGEU, TLT, TLTU, TEQ, TNE
        0x30 | 0x31 | 0x32 | 0x33 | 0x34 | 0x36 => {
            desc.reg_in.gpr |= gpr(rs) | gpr(rt);
            desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;
            true
        }

        _ => false,
    }
}
