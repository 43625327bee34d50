//! IDT R4650 vendor group (primary opcode 0x1c)

use super::{DecodeCtx, funct, gpr, rd, rs, rt};
use crate::desc::{Descriptor, RegSet};

const IDT_MUL_CYCLES: u32 = 3;

pub(super) fn describe_idt(ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    if !ctx.flavor.has_idt_extensions() {
        return false;
    }

    match funct(op) {
        // MAD, MADU: accumulate into HI:LO
        0x00 | 0x01 => {
            desc.reg_in.gpr |= gpr(rs(op)) | gpr(rt(op));
            desc.reg_in.misc |= RegSet::LO | RegSet::HI;
            desc.reg_out.misc |= RegSet::LO | RegSet::HI;
            desc.cycles = IDT_MUL_CYCLES;
            true
        }

        // MUL
        0x02 => {
            desc.reg_in.gpr |= gpr(rs(op)) | gpr(rt(op));
            desc.reg_out.gpr |= gpr(rd(op));
            desc.cycles = IDT_MUL_CYCLES;
            true
        }

        _ => false,
    }
}
