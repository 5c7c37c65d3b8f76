//! Alpha AXP primary opcode constants (bits 31:26 of every instruction).

/// `CALL_PAL` — PALcode entry.
pub const CALL_PAL: u32 = 0x00;

/// Load address.
pub const LDA: u32 = 0x08;
/// Load address high.
pub const LDAH: u32 = 0x09;
/// Load zero-extended byte (BWX).
pub const LDBU: u32 = 0x0A;
/// Load quadword, unaligned.
pub const LDQ_U: u32 = 0x0B;
/// Load zero-extended word (BWX).
pub const LDWU: u32 = 0x0C;
/// Store word (BWX).
pub const STW: u32 = 0x0D;
/// Store byte (BWX).
pub const STB: u32 = 0x0E;
/// Store quadword, unaligned.
pub const STQ_U: u32 = 0x0F;

/// Integer arithmetic (Operate format): `ADDL`/`SUBL`/`CMPxx`/`S4ADDL`/etc.
pub const INTA: u32 = 0x10;
/// Integer logical (Operate format): `AND`/`BIS`/`XOR`/`CMOVxx`/etc.
pub const INTL: u32 = 0x11;
/// Integer shift (Operate format): `SLL`/`SRL`/`SRA`/`EXTxx`/`INSxx`/`MSKxx`.
pub const INTS: u32 = 0x12;
/// Integer multiply (Operate format): `MULL`/`MULQ`/`UMULH`.
pub const INTM: u32 = 0x13;
/// Integer/floating move and convert (Operate format): `ITOFS`/`ITOFT`/`SQRTx`.
pub const ITFP: u32 = 0x14;
/// VAX floating-point (Operate format).
pub const FLTV: u32 = 0x15;
/// IEEE floating-point (Operate format): `ADDx`/`SUBx`/`MULx`/`DIVx`/`CVTxx`.
pub const FLTI: u32 = 0x16;
/// Floating-point logical/move (Operate format): `CPYS`/`CPYSN`/`CPYSE`/`FCMOVxx`/`MF_FPCR`/`MT_FPCR`.
pub const FLTL: u32 = 0x17;

/// Miscellaneous memory-format ops: `TRAPB`/`EXCB`/`MB`/`WMB`/`FETCH`/`RPCC`/`RC`/`ECB`/`RS`/`WH64`.
pub const MISC: u32 = 0x18;
/// Privileged: move from internal processor register (PALcode only).
pub const HW_MFPR: u32 = 0x19;
/// Jump family: `JMP`/`JSR`/`RET`/`JSR_COROUTINE`, distinguished by the hint bits.
pub const JSR: u32 = 0x1A;
/// Privileged: physical-address load (PALcode only).
pub const HW_LD: u32 = 0x1B;
/// Sign-extend/count ops (`SEXTB`/`SEXTW`/`CTPOP`/`CTLZ`/`CTTZ`) and float-to-integer move.
pub const FPTI: u32 = 0x1C;
/// Privileged: move to internal processor register (PALcode only).
pub const HW_MTPR: u32 = 0x1D;
/// Privileged: return from PALcode (PALcode only).
pub const HW_RET: u32 = 0x1E;
/// Privileged: physical-address store (PALcode only).
pub const HW_ST: u32 = 0x1F;

/// Load F-format (VAX single) floating value.
pub const LDF: u32 = 0x20;
/// Load G-format (VAX double) floating value.
pub const LDG: u32 = 0x21;
/// Load S-format (IEEE single) floating value.
pub const LDS: u32 = 0x22;
/// Load T-format (IEEE double) floating value.
pub const LDT: u32 = 0x23;
/// Store F-format floating value.
pub const STF: u32 = 0x24;
/// Store G-format floating value.
pub const STG: u32 = 0x25;
/// Store S-format floating value.
pub const STS: u32 = 0x26;
/// Store T-format floating value.
pub const STT: u32 = 0x27;

/// Load sign-extended longword.
pub const LDL: u32 = 0x28;
/// Load quadword.
pub const LDQ: u32 = 0x29;
/// Load sign-extended longword, locked.
pub const LDL_L: u32 = 0x2A;
/// Load quadword, locked.
pub const LDQ_L: u32 = 0x2B;
/// Store longword.
pub const STL: u32 = 0x2C;
/// Store quadword.
pub const STQ: u32 = 0x2D;
/// Store longword, conditional.
pub const STL_C: u32 = 0x2E;
/// Store quadword, conditional.
pub const STQ_C: u32 = 0x2F;

/// Unconditional branch.
pub const BR: u32 = 0x30;
/// Floating branch if equal to zero.
pub const FBEQ: u32 = 0x31;
/// Floating branch if less than zero.
pub const FBLT: u32 = 0x32;
/// Floating branch if less than or equal to zero.
pub const FBLE: u32 = 0x33;
/// Branch to subroutine (writes `Ra` with the return address).
pub const BSR: u32 = 0x34;
/// Floating branch if not equal to zero.
pub const FBNE: u32 = 0x35;
/// Floating branch if greater than or equal to zero.
pub const FBGE: u32 = 0x36;
/// Floating branch if greater than zero.
pub const FBGT: u32 = 0x37;
/// Branch if low bit clear.
pub const BLBC: u32 = 0x38;
/// Branch if equal to zero.
pub const BEQ: u32 = 0x39;
/// Branch if less than zero.
pub const BLT: u32 = 0x3A;
/// Branch if less than or equal to zero.
pub const BLE: u32 = 0x3B;
/// Branch if low bit set.
pub const BLBS: u32 = 0x3C;
/// Branch if not equal to zero.
pub const BNE: u32 = 0x3D;
/// Branch if greater than or equal to zero.
pub const BGE: u32 = 0x3E;
/// Branch if greater than zero.
pub const BGT: u32 = 0x3F;
