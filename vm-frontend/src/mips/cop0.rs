//! 系统控制协处理器（COP0，主操作码 0x10）

use super::{DecodeCtx, gpr, rd, relative_branch, rs, rt};
use crate::desc::{DescFlags, Descriptor, RegSet};

const COP0_COUNT: u32 = 9;
const COP0_STATUS: u32 = 12;
const COP0_CAUSE: u32 = 13;

/// 读取 Count / Cause 需要先同步时钟，额外计入的周期
const TIMER_SYNC_CYCLES: u32 = 250;

pub(super) fn describe_cop0(_ctx: &DecodeCtx<'_>, desc: &mut Descriptor, op: u32) -> bool {
    // 用户态下任何 COP0 指令都可能触发协处理器不可用异常
    desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;

    match rs(op) {
        // MFC0, DMFC0
        0x00 | 0x01 => {
            desc.reg_out.gpr |= gpr(rt(op));
            if rd(op) == COP0_COUNT || rd(op) == COP0_CAUSE {
                desc.cycles += TIMER_SYNC_CYCLES;
            }
            true
        }

        // CFC0
        0x02 => {
            desc.reg_out.gpr |= gpr(rt(op));
            true
        }

        // MTC0, DMTC0, CTC0
        0x04 | 0x05 | 0x06 => {
            desc.reg_in.gpr |= gpr(rt(op));
            match rd(op) {
                COP0_STATUS => {
                    desc.flags |= DescFlags::CAN_EXPOSE_EXTERNAL_INTERRUPT
                        | DescFlags::CAN_CHANGE_MODES
                        | DescFlags::END_SEQUENCE;
                }
                COP0_CAUSE => desc.flags |= DescFlags::CAN_EXPOSE_EXTERNAL_INTERRUPT,
                _ => {}
            }
            true
        }

        // BC0F, BC0T, BC0FL, BC0TL
        0x08 => {
            if rt(op) > 0x03 {
                return false;
            }
            relative_branch(desc, op, false, rt(op) & 0x02 != 0, RegSet::EMPTY);
            true
        }

        0x10..=0x1f => match op & 0x01ff_ffff {
            // TLBR, TLBP, WAIT
            0x01 | 0x08 | 0x20 => true,

            // TLBWI, TLBWR
            0x02 | 0x06 => {
                desc.flags |= DescFlags::MODIFIES_TRANSLATION;
                true
            }

            // ERET: 目标来自 EPC，没有延迟槽
            0x18 => {
                desc.flags |= DescFlags::CAN_CHANGE_MODES
                    | DescFlags::IS_UNCONDITIONAL_BRANCH
                    | DescFlags::END_SEQUENCE;
                desc.target_pc = None;
                desc.delay_slots = 0;
                true
            }

            _ => false,
        },

        _ => false,
    }
}
