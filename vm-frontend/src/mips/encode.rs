//! MIPS instruction encoders
//!
//! Register operands are masked to 5 bits. Branch offsets are in
//! instructions relative to the delay slot, as the hardware interprets them.

pub const REG_RA: u32 = 31;

pub fn encode_i_type(opcode: u32, rs: u32, rt: u32, imm: u16) -> u32 {
    ((opcode & 0x3f) << 26) | ((rs & 31) << 21) | ((rt & 31) << 16) | u32::from(imm)
}

pub fn encode_r_type(rs: u32, rt: u32, rd: u32, sa: u32, funct: u32) -> u32 {
    ((rs & 31) << 21) | ((rt & 31) << 16) | ((rd & 31) << 11) | ((sa & 31) << 6) | (funct & 0x3f)
}

/// J-format; only bits 27..2 of `target` are encodable.
pub fn encode_j_type(opcode: u32, target: u64) -> u32 {
    ((opcode & 0x3f) << 26) | (((target >> 2) as u32) & 0x03ff_ffff)
}

pub fn encode_nop() -> u32 {
    0
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

pub fn encode_beq(rs: u32, rt: u32, offset: i16) -> u32 { encode_i_type(0x04, rs, rt, offset as u16) }
pub fn encode_bne(rs: u32, rt: u32, offset: i16) -> u32 { encode_i_type(0x05, rs, rt, offset as u16) }
pub fn encode_blez(rs: u32, offset: i16) -> u32 { encode_i_type(0x06, rs, 0, offset as u16) }
pub fn encode_bgtz(rs: u32, offset: i16) -> u32 { encode_i_type(0x07, rs, 0, offset as u16) }
pub fn encode_beql(rs: u32, rt: u32, offset: i16) -> u32 { encode_i_type(0x14, rs, rt, offset as u16) }
pub fn encode_bnel(rs: u32, rt: u32, offset: i16) -> u32 { encode_i_type(0x15, rs, rt, offset as u16) }

pub fn encode_regimm(selector: u32, rs: u32, imm: u16) -> u32 { encode_i_type(0x01, rs, selector, imm) }
pub fn encode_bltz(rs: u32, offset: i16) -> u32 { encode_regimm(0x00, rs, offset as u16) }
pub fn encode_bgez(rs: u32, offset: i16) -> u32 { encode_regimm(0x01, rs, offset as u16) }
pub fn encode_bgezl(rs: u32, offset: i16) -> u32 { encode_regimm(0x03, rs, offset as u16) }
pub fn encode_bltzal(rs: u32, offset: i16) -> u32 { encode_regimm(0x10, rs, offset as u16) }
pub fn encode_bgezal(rs: u32, offset: i16) -> u32 { encode_regimm(0x11, rs, offset as u16) }
pub fn encode_teqi(rs: u32, imm: i16) -> u32 { encode_regimm(0x0c, rs, imm as u16) }

pub fn encode_j(target: u64) -> u32 { encode_j_type(0x02, target) }
pub fn encode_jal(target: u64) -> u32 { encode_j_type(0x03, target) }
pub fn encode_jr(rs: u32) -> u32 { encode_r_type(rs, 0, 0, 0, 0x08) }
pub fn encode_jalr(rd: u32, rs: u32) -> u32 { encode_r_type(rs, 0, rd, 0, 0x09) }

pub fn encode_syscall() -> u32 { encode_r_type(0, 0, 0, 0, 0x0c) }
pub fn encode_break() -> u32 { encode_r_type(0, 0, 0, 0, 0x0d) }

// ---------------------------------------------------------------------------
// Integer ALU
// ---------------------------------------------------------------------------

pub fn encode_addi(rt: u32, rs: u32, imm: i16) -> u32 { encode_i_type(0x08, rs, rt, imm as u16) }
pub fn encode_addiu(rt: u32, rs: u32, imm: i16) -> u32 { encode_i_type(0x09, rs, rt, imm as u16) }
pub fn encode_ori(rt: u32, rs: u32, imm: u16) -> u32 { encode_i_type(0x0d, rs, rt, imm) }
pub fn encode_lui(rt: u32, imm: u16) -> u32 { encode_i_type(0x0f, 0, rt, imm) }

pub fn encode_sll(rd: u32, rt: u32, sa: u32) -> u32 { encode_r_type(0, rt, rd, sa, 0x00) }
pub fn encode_add(rd: u32, rs: u32, rt: u32) -> u32 { encode_r_type(rs, rt, rd, 0, 0x20) }
pub fn encode_addu(rd: u32, rs: u32, rt: u32) -> u32 { encode_r_type(rs, rt, rd, 0, 0x21) }
pub fn encode_or(rd: u32, rs: u32, rt: u32) -> u32 { encode_r_type(rs, rt, rd, 0, 0x25) }
pub fn encode_movz(rd: u32, rs: u32, rt: u32) -> u32 { encode_r_type(rs, rt, rd, 0, 0x0a) }
pub fn encode_mult(rs: u32, rt: u32) -> u32 { encode_r_type(rs, rt, 0, 0, 0x18) }
pub fn encode_div(rs: u32, rt: u32) -> u32 { encode_r_type(rs, rt, 0, 0, 0x1a) }
pub fn encode_dmult(rs: u32, rt: u32) -> u32 { encode_r_type(rs, rt, 0, 0, 0x1c) }
pub fn encode_ddiv(rs: u32, rt: u32) -> u32 { encode_r_type(rs, rt, 0, 0, 0x1e) }
pub fn encode_mflo(rd: u32) -> u32 { encode_r_type(0, 0, rd, 0, 0x12) }
pub fn encode_mfhi(rd: u32) -> u32 { encode_r_type(0, 0, rd, 0, 0x10) }

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

pub fn encode_lw(rt: u32, base: u32, offset: i16) -> u32 { encode_i_type(0x23, base, rt, offset as u16) }
pub fn encode_ld(rt: u32, base: u32, offset: i16) -> u32 { encode_i_type(0x37, base, rt, offset as u16) }
pub fn encode_lwc1(ft: u32, base: u32, offset: i16) -> u32 { encode_i_type(0x31, base, ft, offset as u16) }
pub fn encode_sw(rt: u32, base: u32, offset: i16) -> u32 { encode_i_type(0x2b, base, rt, offset as u16) }
pub fn encode_sc(rt: u32, base: u32, offset: i16) -> u32 { encode_i_type(0x38, base, rt, offset as u16) }
pub fn encode_cache(op: u32, base: u32, offset: i16) -> u32 { encode_i_type(0x2f, base, op, offset as u16) }
pub fn encode_pref(hint: u32, base: u32, offset: i16) -> u32 { encode_i_type(0x33, base, hint, offset as u16) }

// ---------------------------------------------------------------------------
// Coprocessors
// ---------------------------------------------------------------------------

pub fn encode_mfc0(rt: u32, rd: u32) -> u32 { encode_i_type(0x10, 0x00, rt, ((rd & 31) << 11) as u16) }
pub fn encode_mtc0(rt: u32, rd: u32) -> u32 { encode_i_type(0x10, 0x04, rt, ((rd & 31) << 11) as u16) }
pub fn encode_tlbwi() -> u32 { (0x10 << 26) | (1 << 25) | 0x02 }
pub fn encode_tlbp() -> u32 { (0x10 << 26) | (1 << 25) | 0x08 }
pub fn encode_eret() -> u32 { (0x10 << 26) | (1 << 25) | 0x18 }

pub const FMT_S: u32 = 0x10;
pub const FMT_D: u32 = 0x11;

pub fn encode_cop1_arith(fmt: u32, ft: u32, fs: u32, fd: u32, funct: u32) -> u32 {
    (0x11 << 26) | ((fmt & 31) << 21) | ((ft & 31) << 16) | ((fs & 31) << 11) | ((fd & 31) << 6) | (funct & 0x3f)
}

pub fn encode_add_fmt(fmt: u32, fd: u32, fs: u32, ft: u32) -> u32 { encode_cop1_arith(fmt, ft, fs, fd, 0x00) }
pub fn encode_recip_fmt(fmt: u32, fd: u32, fs: u32) -> u32 { encode_cop1_arith(fmt, 0, fs, fd, 0x15) }
pub fn encode_c_eq_fmt(fmt: u32, fs: u32, ft: u32) -> u32 { encode_cop1_arith(fmt, ft, fs, 0, 0x32) }
pub fn encode_mtc1(rt: u32, fs: u32) -> u32 { encode_i_type(0x11, 0x04, rt, ((fs & 31) << 11) as u16) }
pub fn encode_bc1t(offset: i16) -> u32 { encode_i_type(0x11, 0x08, 0x01, offset as u16) }
pub fn encode_bc1tl(offset: i16) -> u32 { encode_i_type(0x11, 0x08, 0x03, offset as u16) }

/// COP1X `MADD.S fd, fr, fs, ft`
pub fn encode_madd_s(fd: u32, fr: u32, fs: u32, ft: u32) -> u32 {
    (0x13 << 26) | ((fr & 31) << 21) | ((ft & 31) << 16) | ((fs & 31) << 11) | ((fd & 31) << 6) | 0x20
}

pub fn encode_lwxc1(fd: u32, index: u32, base: u32) -> u32 {
    (0x13 << 26) | ((base & 31) << 21) | ((index & 31) << 16) | ((fd & 31) << 6)
}

/// IDT `MAD rs, rt`
pub fn encode_idt_mad(rs: u32, rt: u32) -> u32 { (0x1c << 26) | encode_r_type(rs, rt, 0, 0, 0x00) }
/// IDT `MUL rd, rs, rt`
pub fn encode_idt_mul(rd: u32, rs: u32, rt: u32) -> u32 { (0x1c << 26) | encode_r_type(rs, rt, rd, 0, 0x02) }
