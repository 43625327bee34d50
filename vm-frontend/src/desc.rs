//! Instruction descriptors
//!
//! One [`Descriptor`] holds the static analysis of a single guest instruction:
//! which registers it reads and writes, how it affects control flow, whether it
//! can fault, and what it costs. Descriptors live in the
//! [`DescriptorPool`](crate::pool::DescriptorPool) arena and reference each other
//! through [`DescId`] handles.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use vm_core::{GuestAddr, GuestPhysAddr};

/// Arena handle of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescId(pub(crate) u32);

impl DescId {
    /// Slot index inside the pool.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Per-instruction analysis flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DescFlags: u32 {
        /// Branch that may or may not be taken
        const IS_CONDITIONAL_BRANCH = 1 << 0;
        /// Branch that is always taken
        const IS_UNCONDITIONAL_BRANCH = 1 << 1;
        /// Delay slot is skipped when the branch is not taken
        const IS_LIKELY_BRANCH = 1 << 2;
        /// Described as the delay slot of another descriptor
        const IN_DELAY_SLOT = 1 << 3;
        /// Reachable from more than one place
        const IS_BRANCH_TARGET = 1 << 4;
        /// Last instruction of a native code sequence
        const END_SEQUENCE = 1 << 5;
        /// Falling off the end requires a fresh block lookup
        const REDISPATCH = 1 << 6;
        /// Falling off the end wraps back to the block start
        const RETURN_TO_START = 1 << 7;
        /// Branch target lies inside the described window
        const INTRABLOCK_BRANCH = 1 << 8;
        /// Undecodable or disabled encoding
        const INVALID_OPCODE = 1 << 9;
        /// Always raises an exception
        const WILL_CAUSE_EXCEPTION = 1 << 10;
        /// Raises an exception for some operand values
        const CAN_CAUSE_EXCEPTION = 1 << 11;
        const READS_MEMORY = 1 << 12;
        const WRITES_MEMORY = 1 << 13;
        /// Cached translation must be re-checked before entering here
        const VALIDATE_TLB = 1 << 14;
        /// Rewrites the address translation (TLB write)
        const MODIFIES_TRANSLATION = 1 << 15;
        /// May switch privilege or ISA mode
        const CAN_CHANGE_MODES = 1 << 16;
        /// May unmask a pending external interrupt
        const CAN_EXPOSE_EXTERNAL_INTERRUPT = 1 << 17;
        /// Synthetic descriptor standing in for an unmapped fetch
        const COMPILER_PAGE_FAULT = 1 << 18;
        /// Occupies an address but generates no code
        const VIRTUAL_NOOP = 1 << 19;

        const IS_BRANCH = Self::IS_CONDITIONAL_BRANCH.bits() | Self::IS_UNCONDITIONAL_BRANCH.bits();
    }
}

/// Per register-class bitmask.
///
/// `gpr` and `fpr` carry one bit per architectural register; `misc` carries
/// [`RegSet::LO`], [`RegSet::HI`] and [`RegSet::FCC`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RegSet {
    pub gpr: u32,
    pub fpr: u32,
    pub misc: u32,
}

impl RegSet {
    pub const LO: u32 = 1 << 0;
    pub const HI: u32 = 1 << 1;
    pub const FCC: u32 = 1 << 2;

    pub const EMPTY: RegSet = RegSet { gpr: 0, fpr: 0, misc: 0 };
    pub const ALL: RegSet = RegSet {
        gpr: !0,
        fpr: !0,
        misc: !0,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn has_gpr(&self, reg: u32) -> bool {
        self.gpr & (1 << reg) != 0
    }

    pub fn has_fpr(&self, reg: u32) -> bool {
        self.fpr & (1 << reg) != 0
    }

    /// Bitwise AND of every class.
    pub fn and(self, other: RegSet) -> RegSet {
        RegSet {
            gpr: self.gpr & other.gpr,
            fpr: self.fpr & other.fpr,
            misc: self.misc & other.misc,
        }
    }

    /// `self & !clear | set`, class by class.
    pub fn replace(self, clear: RegSet, set: RegSet) -> RegSet {
        RegSet {
            gpr: (self.gpr & !clear.gpr) | set.gpr,
            fpr: (self.fpr & !clear.fpr) | set.fpr,
            misc: (self.misc & !clear.misc) | set.misc,
        }
    }
}

/// Instruction words as fetched through the two read channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawOpcode {
    /// Word read through the opcode channel; drives every decode decision
    pub opcode: u32,
    /// Word read through the argument channel, present only for formats that
    /// carry literal operand data
    pub argument: Option<u32>,
}

/// Static analysis result of one guest instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub pc: GuestAddr,
    pub physpc: GuestPhysAddr,
    pub raw: RawOpcode,
    /// Instruction length in bytes
    pub length: u8,
    /// Number of architectural delay slots following a branch
    pub delay_slots: u8,
    /// Slots skipped on the not-taken path of a likely branch
    pub skip_slots: u8,
    pub flags: DescFlags,
    /// Static branch target; `None` when unknown or dynamic
    pub target_pc: Option<GuestAddr>,
    pub cycles: u32,
    pub reg_in: RegSet,
    pub reg_out: RegSet,
    /// Outputs that later instructions of the same sequence actually consume
    pub reg_req: RegSet,
    pub next: Option<DescId>,
    pub delay_slot: Option<DescId>,
    /// Controlling branch of a delay-slot descriptor (attribution only)
    pub branch_owner: Option<DescId>,
}

impl Descriptor {
    pub(crate) fn new(pc: GuestAddr) -> Self {
        Self {
            pc,
            physpc: pc.into(),
            raw: RawOpcode::default(),
            length: 0,
            delay_slots: 0,
            skip_slots: 0,
            flags: DescFlags::empty(),
            target_pc: None,
            cycles: 0,
            reg_in: RegSet::EMPTY,
            reg_out: RegSet::EMPTY,
            reg_req: RegSet::EMPTY,
            next: None,
            delay_slot: None,
            branch_owner: None,
        }
    }

    /// Reinitialize every field for reuse at `pc`.
    pub(crate) fn reset(&mut self, pc: GuestAddr) {
        *self = Self::new(pc);
    }

    pub fn is_branch(&self) -> bool {
        self.flags.intersects(DescFlags::IS_BRANCH)
    }

    pub fn ends_sequence(&self) -> bool {
        self.flags.contains(DescFlags::END_SEQUENCE)
    }

    /// Address execution continues at when a branch is not taken.
    pub fn fallthrough_pc(&self) -> GuestAddr {
        let width = u64::from(self.length);
        self.pc.wrapping_add(width * (1 + u64::from(self.skip_slots)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_branch_covers_both_kinds() {
        let mut desc = Descriptor::new(GuestAddr(0));
        assert!(!desc.is_branch());
        desc.flags |= DescFlags::IS_CONDITIONAL_BRANCH;
        assert!(desc.is_branch());
        desc.flags = DescFlags::IS_UNCONDITIONAL_BRANCH;
        assert!(desc.is_branch());
        assert!(!desc.flags.contains(DescFlags::IS_BRANCH));
    }

    #[test]
    fn test_reset_clears_stale_state() {
        let mut desc = Descriptor::new(GuestAddr(0x40));
        desc.flags = DescFlags::END_SEQUENCE | DescFlags::REDISPATCH;
        desc.reg_out.gpr = 0xff;
        desc.target_pc = Some(GuestAddr(0x80));
        desc.next = Some(DescId(3));
        desc.cycles = 35;

        desc.reset(GuestAddr(0x100));
        assert_eq!(desc, Descriptor::new(GuestAddr(0x100)));
    }

    #[test]
    fn test_fallthrough_skips_likely_slot() {
        let mut desc = Descriptor::new(GuestAddr(0x10));
        desc.length = 4;
        assert_eq!(desc.fallthrough_pc(), GuestAddr(0x14));
        desc.skip_slots = 1;
        assert_eq!(desc.fallthrough_pc(), GuestAddr(0x18));
    }

    #[test]
    fn test_regset_replace() {
        let req = RegSet::ALL;
        let out = RegSet {
            gpr: 1 << 4,
            fpr: 0,
            misc: RegSet::LO,
        };
        let input = RegSet {
            gpr: 1 << 5,
            fpr: 1 << 2,
            misc: 0,
        };
        let next = req.replace(out, input);
        assert!(!next.has_gpr(4));
        assert!(next.has_gpr(5));
        assert!(next.has_fpr(2));
        assert_eq!(next.misc & RegSet::LO, 0);
    }
}
