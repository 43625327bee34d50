//! MIPS 分组解码器单元测试

use vm_core::{AddressSpace, AddressTranslator, GuestAddr, GuestPhysAddr, InsnFetch, VmError};

use super::encode::*;
use super::*;

/// 单字指令源：操作码通道与操作数通道可以不同
struct OneWord {
    opcode: u32,
    argument: u32,
}

impl AddressTranslator for OneWord {
    fn translate(&self, _space: AddressSpace, va: GuestAddr) -> Result<GuestPhysAddr, VmError> {
        Ok(GuestPhysAddr(va.0))
    }
}

impl InsnFetch for OneWord {
    fn fetch_opcode(&self, _pa: GuestPhysAddr) -> u32 {
        self.opcode
    }

    fn fetch_argument(&self, _pa: GuestPhysAddr) -> u32 {
        self.argument
    }
}

fn decode_at(flavor: CpuFlavor, pc: u64, opcode: u32) -> Descriptor {
    let mmu = OneWord { opcode, argument: opcode };
    let ctx = DecodeCtx { mmu: &mmu, flavor };
    let mut desc = Descriptor::new(GuestAddr(pc));
    describe(&ctx, &mut desc);
    desc
}

fn decode(opcode: u32) -> Descriptor {
    decode_at(CpuFlavor::R4600, 0x1000, opcode)
}

fn decode_mips4(opcode: u32) -> Descriptor {
    decode_at(CpuFlavor::R5000, 0x1000, opcode)
}

fn is_invalid(desc: &Descriptor) -> bool {
    desc.flags
        == DescFlags::INVALID_OPCODE | DescFlags::WILL_CAUSE_EXCEPTION | DescFlags::END_SEQUENCE
}

#[test]
fn test_flavor_ordering() {
    assert!(CpuFlavor::Vr4300 < CpuFlavor::R4600);
    assert_eq!(CpuFlavor::R4700.isa_level(), IsaLevel::Mips3);
    assert_eq!(CpuFlavor::R5000.isa_level(), IsaLevel::Mips4);
    assert_eq!(CpuFlavor::Rm7000.isa_level(), IsaLevel::Mips4);
    assert!(CpuFlavor::R4650.has_idt_extensions());
    assert!(!CpuFlavor::R4700.has_idt_extensions());
}

#[test]
fn test_group_table() {
    assert_eq!(OpGroup::of(encode_nop()), OpGroup::Special);
    assert_eq!(OpGroup::of(encode_bgez(1, 0)), OpGroup::Regimm);
    assert_eq!(OpGroup::of(encode_beql(1, 2, 0)), OpGroup::Branch);
    assert_eq!(OpGroup::of(encode_lui(1, 0)), OpGroup::Immediate);
    assert_eq!(OpGroup::of(encode_ld(1, 2, 0)), OpGroup::Load);
    assert_eq!(OpGroup::of(encode_sc(1, 2, 0)), OpGroup::Store);
    assert_eq!(OpGroup::of(encode_pref(0, 2, 0)), OpGroup::Cache);
    assert_eq!(OpGroup::of(encode_madd_s(0, 1, 2, 3)), OpGroup::Cop1x);
    assert_eq!(OpGroup::of(0x3b << 26), OpGroup::Invalid);
    assert_eq!(OpGroup::of(0x1d << 26), OpGroup::Invalid);
}

#[test]
fn test_nop_defaults() {
    let desc = decode(encode_nop());
    assert_eq!(desc.length, INSN_WIDTH);
    assert_eq!(desc.cycles, 1);
    assert!(desc.flags.is_empty());
    assert!(desc.reg_in.is_empty());
    assert!(desc.reg_out.is_empty());
    assert_eq!(desc.raw.argument, None);
}

#[test]
fn test_addu_masks() {
    let desc = decode(encode_addu(3, 4, 5));
    assert_eq!(desc.reg_in.gpr, (1 << 4) | (1 << 5));
    assert_eq!(desc.reg_out.gpr, 1 << 3);
    assert!(!desc.flags.contains(DescFlags::CAN_CAUSE_EXCEPTION));

    let desc = decode(encode_add(3, 4, 5));
    assert!(desc.flags.contains(DescFlags::CAN_CAUSE_EXCEPTION));
}

#[test]
fn test_zero_register_is_masked() {
    // addu r0, r0, r7
    let desc = decode(encode_addu(0, 0, 7));
    assert_eq!(desc.reg_in.gpr, 1 << 7);
    assert_eq!(desc.reg_out.gpr, 0);
}

#[test]
fn test_multiply_divide_cycles() {
    assert_eq!(decode(encode_mult(1, 2)).cycles, 3);
    assert_eq!(decode(encode_div(1, 2)).cycles, 35);
    assert_eq!(decode(encode_dmult(1, 2)).cycles, 7);
    assert_eq!(decode(encode_ddiv(1, 2)).cycles, 67);

    let desc = decode(encode_mult(1, 2));
    assert_eq!(desc.reg_out.misc, RegSet::LO | RegSet::HI);
    assert_eq!(decode(encode_mflo(4)).reg_in.misc, RegSet::LO);
    assert_eq!(decode(encode_mfhi(4)).reg_in.misc, RegSet::HI);
}

#[test]
fn test_syscall_and_break_always_trap() {
    for op in [encode_syscall(), encode_break()] {
        let desc = decode(op);
        assert!(desc.flags.contains(DescFlags::WILL_CAUSE_EXCEPTION | DescFlags::END_SEQUENCE));
        assert!(!desc.flags.contains(DescFlags::INVALID_OPCODE));
    }
}

#[test]
fn test_conditional_branch() {
    let desc = decode(encode_bne(1, 2, 3));
    assert!(desc.flags.contains(DescFlags::IS_CONDITIONAL_BRANCH));
    assert!(!desc.flags.contains(DescFlags::END_SEQUENCE));
    assert_eq!(desc.target_pc, Some(GuestAddr(0x1000 + 4 + 12)));
    assert_eq!(desc.delay_slots, 1);
    assert_eq!(desc.skip_slots, 0);
    assert_eq!(desc.reg_in.gpr, (1 << 1) | (1 << 2));
}

#[test]
fn test_backward_branch_target() {
    let desc = decode(encode_bne(1, 2, -2));
    assert_eq!(desc.target_pc, Some(GuestAddr(0x1000 + 4 - 8)));
}

#[test]
fn test_always_taken_branches_become_unconditional() {
    for op in [
        encode_beq(0, 0, 4),
        encode_beq(5, 5, 4),
        encode_beql(7, 7, 4),
        encode_blez(0, 4),
        encode_bgez(0, 4),
        encode_bgezl(0, 4),
        encode_bgezal(0, 4),
    ] {
        let desc = decode(op);
        assert!(desc.flags.contains(DescFlags::IS_UNCONDITIONAL_BRANCH | DescFlags::END_SEQUENCE), "{op:#010x}");
        assert!(!desc.flags.contains(DescFlags::IS_CONDITIONAL_BRANCH));
        assert!(!desc.flags.contains(DescFlags::IS_LIKELY_BRANCH));
        assert_eq!(desc.skip_slots, 0);
        assert_eq!(desc.delay_slots, 1);
    }
}

#[test]
fn test_never_taken_zero_compare_stays_conditional() {
    assert!(decode(encode_bgtz(0, 4)).flags.contains(DescFlags::IS_CONDITIONAL_BRANCH));
    assert!(decode(encode_bltz(0, 4)).flags.contains(DescFlags::IS_CONDITIONAL_BRANCH));
}

#[test]
fn test_likely_branch_skips_slot() {
    let desc = decode(encode_bnel(1, 2, 8));
    assert!(desc.flags.contains(DescFlags::IS_CONDITIONAL_BRANCH | DescFlags::IS_LIKELY_BRANCH));
    assert_eq!(desc.skip_slots, 1);
    assert_eq!(desc.fallthrough_pc(), GuestAddr(0x1008));
}

#[test]
fn test_link_branches_write_ra() {
    assert!(decode(encode_bltzal(3, 2)).reg_out.has_gpr(REG_RA));
    assert!(decode(encode_bgezal(0, 2)).reg_out.has_gpr(REG_RA));
    assert!(decode(encode_jal(0x2000)).reg_out.has_gpr(REG_RA));
    assert!(!decode(encode_j(0x2000)).reg_out.has_gpr(REG_RA));
}

#[test]
fn test_jump_target_keeps_region_bits() {
    let desc = decode_at(CpuFlavor::R4600, 0x8000_1000, encode_j(0x0004_0000));
    assert_eq!(desc.target_pc, Some(GuestAddr(0x8004_0000)));
    assert!(desc.flags.contains(DescFlags::IS_UNCONDITIONAL_BRANCH | DescFlags::END_SEQUENCE));
}

#[test]
fn test_register_jumps_are_dynamic() {
    let desc = decode(encode_jr(REG_RA));
    assert_eq!(desc.target_pc, None);
    assert_eq!(desc.delay_slots, 1);
    assert!(desc.reg_in.has_gpr(REG_RA));

    let desc = decode(encode_jalr(REG_RA, 9));
    assert_eq!(desc.target_pc, None);
    assert!(desc.reg_out.has_gpr(REG_RA));
}

#[test]
fn test_loads_and_stores() {
    let desc = decode(encode_lw(2, 29, 16));
    assert!(desc.flags.contains(DescFlags::READS_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION));
    assert!(!desc.flags.contains(DescFlags::WRITES_MEMORY));
    assert_eq!(desc.reg_in.gpr, 1 << 29);
    assert_eq!(desc.reg_out.gpr, 1 << 2);

    let desc = decode(encode_sw(2, 29, 16));
    assert!(desc.flags.contains(DescFlags::WRITES_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION));
    assert!(!desc.flags.contains(DescFlags::READS_MEMORY));
    assert_eq!(desc.reg_in.gpr, (1 << 2) | (1 << 29));
    assert!(desc.reg_out.is_empty());

    let desc = decode(encode_sc(2, 29, 0));
    assert!(desc.flags.contains(DescFlags::WRITES_MEMORY));
    assert_eq!(desc.reg_out.gpr, 1 << 2);

    let desc = decode(encode_lwc1(4, 29, 0));
    assert_eq!(desc.reg_out.fpr, 1 << 4);
    assert_eq!(desc.reg_out.gpr, 0);
}

#[test]
fn test_literal_formats_read_argument_stream() {
    let mmu = OneWord {
        opcode: encode_addiu(2, 0, 0x10),
        argument: encode_addiu(2, 0, 0x7777),
    };
    let ctx = DecodeCtx { mmu: &mmu, flavor: CpuFlavor::R4600 };
    let mut desc = Descriptor::new(GuestAddr(0));
    describe(&ctx, &mut desc);
    assert_eq!(desc.raw.opcode, encode_addiu(2, 0, 0x10));
    assert_eq!(desc.raw.argument, Some(encode_addiu(2, 0, 0x7777)));

    // 分支不携带字面操作数
    assert_eq!(decode(encode_bne(1, 2, 3)).raw.argument, None);
    assert_eq!(decode(encode_teqi(1, 3)).raw.argument, Some(encode_teqi(1, 3)));
}

#[test]
fn test_cop0_moves() {
    let desc = decode(encode_mtc0(4, 12));
    assert!(desc.flags.contains(
        DescFlags::CAN_EXPOSE_EXTERNAL_INTERRUPT
            | DescFlags::CAN_CHANGE_MODES
            | DescFlags::END_SEQUENCE
            | DescFlags::CAN_CAUSE_EXCEPTION
    ));

    let desc = decode(encode_mtc0(4, 13));
    assert!(desc.flags.contains(DescFlags::CAN_EXPOSE_EXTERNAL_INTERRUPT));
    assert!(!desc.flags.contains(DescFlags::END_SEQUENCE));

    assert_eq!(decode(encode_mfc0(4, 9)).cycles, 251);
    assert_eq!(decode(encode_mfc0(4, 13)).cycles, 251);
    assert_eq!(decode(encode_mfc0(4, 12)).cycles, 1);
}

#[test]
fn test_tlb_and_eret() {
    assert!(decode(encode_tlbwi()).flags.contains(DescFlags::MODIFIES_TRANSLATION));
    assert!(!decode(encode_tlbp()).flags.contains(DescFlags::MODIFIES_TRANSLATION));

    let desc = decode(encode_eret());
    assert!(desc.flags.contains(
        DescFlags::IS_UNCONDITIONAL_BRANCH | DescFlags::END_SEQUENCE | DescFlags::CAN_CHANGE_MODES
    ));
    assert_eq!(desc.delay_slots, 0);
    assert_eq!(desc.target_pc, None);
}

#[test]
fn test_cop1_arith_and_compare() {
    let desc = decode(encode_add_fmt(FMT_D, 2, 4, 6));
    assert_eq!(desc.reg_in.fpr, (1 << 4) | (1 << 6));
    assert_eq!(desc.reg_out.fpr, 1 << 2);
    assert!(desc.flags.contains(DescFlags::CAN_CAUSE_EXCEPTION));

    let desc = decode(encode_c_eq_fmt(FMT_S, 1, 3));
    assert_eq!(desc.reg_out.misc, RegSet::FCC);

    let desc = decode(encode_bc1tl(4));
    assert!(desc.flags.contains(DescFlags::IS_LIKELY_BRANCH));
    assert_eq!(desc.reg_in.misc, RegSet::FCC);
    assert!(!decode(encode_bc1t(4)).flags.contains(DescFlags::IS_LIKELY_BRANCH));
}

#[test]
fn test_mips4_gates() {
    for op in [
        encode_movz(1, 2, 3),
        encode_pref(0, 2, 0),
        encode_recip_fmt(FMT_S, 1, 2),
        encode_madd_s(1, 2, 3, 4),
        encode_lwxc1(1, 2, 3),
    ] {
        assert!(is_invalid(&decode(op)), "{op:#010x} should be invalid on MIPS III");
        assert!(!decode_mips4(op).flags.contains(DescFlags::INVALID_OPCODE));
    }

    let desc = decode_mips4(encode_madd_s(1, 2, 3, 4));
    assert_eq!(desc.reg_in.fpr, (1 << 2) | (1 << 3) | (1 << 4));
    assert_eq!(desc.reg_out.fpr, 1 << 1);

    let desc = decode_mips4(encode_lwxc1(1, 2, 3));
    assert!(desc.flags.contains(DescFlags::READS_MEMORY));
    assert_eq!(desc.raw.argument, None);
}

#[test]
fn test_idt_group_requires_r4650() {
    assert!(is_invalid(&decode(encode_idt_mul(1, 2, 3))));

    let desc = decode_at(CpuFlavor::R4650, 0, encode_idt_mul(1, 2, 3));
    assert_eq!(desc.cycles, 3);
    assert_eq!(desc.reg_out.gpr, 1 << 1);

    let desc = decode_at(CpuFlavor::R4650, 0, encode_idt_mad(2, 3));
    assert_eq!(desc.reg_out.misc, RegSet::LO | RegSet::HI);
    assert_eq!(desc.reg_in.misc, RegSet::LO | RegSet::HI);
}

#[test]
fn test_cache_and_cop2() {
    let desc = decode(encode_cache(0x19, 4, 0));
    assert_eq!(desc.flags, DescFlags::CAN_CAUSE_EXCEPTION);

    let desc = decode(0x12 << 26);
    assert_eq!(desc.flags, DescFlags::WILL_CAUSE_EXCEPTION | DescFlags::END_SEQUENCE);
    assert!(!desc.flags.contains(DescFlags::INVALID_OPCODE));
}

#[test]
fn test_invalid_opcode_discards_partial_state() {
    // COP0 rs=0x03 未定义：CAN_CAUSE_EXCEPTION 已写入后被拒绝
    let desc = decode((0x10 << 26) | (0x03 << 21));
    assert!(is_invalid(&desc));

    let desc = decode(0x3b << 26);
    assert!(is_invalid(&desc));
    assert!(desc.reg_in.is_empty() && desc.reg_out.is_empty());
    assert_eq!(desc.target_pc, None);
}
