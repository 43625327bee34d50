//! 浮点协处理器（COP1 / COP1X）

use super::{DecodeCtx, fd, fpr, fr, fs, ft, funct, gpr, relative_branch, rs, rt};
use crate::desc::{DescFlags, Descriptor, RegSet};

/// 运算格式字段（rs）：S, D, W, L
fn is_arith_format(fmt: u32) -> bool {
    matches!(fmt, 0x10 | 0x11 | 0x14 | 0x15)
}

pub(super) fn describe_cop1(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;

    match rs(op) {
        // MFC1, DMFC1
        0x00 | 0x01 => {
            desc.reg_in.fpr |= fpr(fs(op));
            desc.reg_out.gpr |= gpr(rt(op));
            true
        }

        // CFC1: 控制寄存器中包含 FCC
        0x02 => {
            desc.reg_in.misc |= RegSet::FCC;
            desc.reg_out.gpr |= gpr(rt(op));
            true
        }

        // MTC1, DMTC1
        0x04 | 0x05 => {
            desc.reg_in.gpr |= gpr(rt(op));
            desc.reg_out.fpr |= fpr(fs(op));
            true
        }

        // CTC1
        0x06 => {
            desc.reg_in.gpr |= gpr(rt(op));
            desc.reg_out.misc |= RegSet::FCC;
            true
        }

        // BC1F, BC1T, BC1FL, BC1TL
        0x08 => {
            if rt(op) > 0x03 {
                return false;
            }
            let reads = RegSet { misc: RegSet::FCC, ..RegSet::EMPTY };
            relative_branch(desc, op, false, rt(op) & 0x02 != 0, reads);
            true
        }

        fmt if is_arith_format(fmt) => describe_arith(ctx, desc, op),

        _ => false,
    }
}

/// 格式化浮点运算，按 funct 分派
fn describe_arith(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    let (fd, fs, ft) = (fd(op), fs(op), ft(op));

    match funct(op) {
        // ADD, SUB, MUL, DIV
        0x00..=0x03 => {
            desc.reg_in.fpr |= fpr(fs) | fpr(ft);
            desc.reg_out.fpr |= fpr(fd);
            true
        }

        // SQRT, ABS, MOV, NEG, ROUND/TRUNC/CEIL/FLOOR.L/W
        // CVT.S, CVT.D, CVT.W, CVT.L
        0x04..=0x0f | 0x20 | 0x21 | 0x24 | 0x25 => {
            desc.reg_in.fpr |= fpr(fs);
            desc.reg_out.fpr |= fpr(fd);
            true
        }

        // MOVF.fmt, MOVT.fmt
        0x11 => {
            if !ctx.is_mips4() {
                return false;
            }
            desc.reg_in.fpr |= fpr(fs) | fpr(fd);
            desc.reg_in.misc |= RegSet::FCC;
            desc.reg_out.fpr |= fpr(fd);
            true
        }

        // MOVZ.fmt, MOVN.fmt
        0x12 | 0x13 => {
            if !ctx.is_mips4() {
                return false;
            }
            desc.reg_in.fpr |= fpr(fs) | fpr(fd);
            desc.reg_in.gpr |= gpr(rt(op));
            desc.reg_out.fpr |= fpr(fd);
            true
        }

        // RECIP, RSQRT
        0x15 | 0x16 => {
            if !ctx.is_mips4() {
                return false;
            }
            desc.reg_in.fpr |= fpr(fs);
            desc.reg_out.fpr |= fpr(fd);
            true
        }

        // C.cond.fmt
        0x30..=0x3f => {
            desc.reg_in.fpr |= fpr(fs) | fpr(ft);
            desc.reg_out.misc |= RegSet::FCC;
            true
        }

        _ => false,
    }
}

/// COP1X（MIPS IV 索引访存与乘加）
pub(super) fn describe_cop1x(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    if !ctx.is_mips4() {
        return false;
    }
    desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;

    match funct(op) {
        // LWXC1, LDXC1
        0x00 | 0x01 => {
            desc.reg_in.gpr |= gpr(rs(op)) | gpr(rt(op));
            desc.reg_out.fpr |= fpr(fd(op));
            desc.flags |= DescFlags::READS_MEMORY;
            true
        }

        // SWXC1, SDXC1
        0x08 | 0x09 => {
            desc.reg_in.gpr |= gpr(rs(op)) | gpr(rt(op));
            desc.reg_in.fpr |= fpr(fs(op));
            desc.flags |= DescFlags::WRITES_MEMORY;
            true
        }

        // PREFX
        0x0f => true,

        // MADD, MSUB, NMADD, NMSUB (.S/.D)
        0x20 | 0x21 | 0x28 | 0x29 | 0x30 | 0x31 | 0x38 | 0x39 => {
            desc.reg_in.fpr |= fpr(fr(op)) | fpr(fs(op)) | fpr(ft(op));
            desc.reg_out.fpr |= fpr(fd(op));
            true
        }

        _ => false,
    }
}
