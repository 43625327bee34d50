//! REGIMM 组（主操作码 0x01），按 rt 字段分派

use super::{DecodeCtx, gpr, relative_branch, rs, rt};
use crate::desc::{DescFlags, Descriptor, RegSet};

pub(super) fn describe_regimm(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    let rs = rs(op);

    match rt(op) {
        // BLTZ, BLTZL, BLTZAL, BLTZALL: r0 < 0 永不成立，保持条件分支
        0x00 | 0x02 | 0x10 | 0x12 => {
            if rt(op) & 0x10 != 0 {
                desc.reg_out.gpr |= gpr(31);
            }
            let reads = RegSet { gpr: gpr(rs), ..RegSet::EMPTY };
            relative_branch(desc, op, false, rt(op) & 0x02 != 0, reads);
            true
        }

        // BGEZ, BGEZL, BGEZAL, BGEZALL: r0 >= 0 恒成立
        0x01 | 0x03 | 0x11 | 0x13 => {
            if rt(op) & 0x10 != 0 {
                desc.reg_out.gpr |= gpr(31);
            }
            let reads = RegSet { gpr: gpr(rs), ..RegSet::EMPTY };
            relative_branch(desc, op, rs == 0, rt(op) & 0x02 != 0, reads);
            true
        }

        // TGEI, TGEIU, TLTI, TLTIU, TEQI, TNEI
        0x08 | 0x09 | 0x0a | 0x0b | 0x0c | 0x0e => {
            desc.reg_in.gpr |= gpr(rs);
            desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;
            ctx.literal(desc);
            true
        }

        _ => false,
    }
}
