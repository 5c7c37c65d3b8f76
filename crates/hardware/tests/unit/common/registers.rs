//! Architectural register file invariants: the hard-wired zero registers
//! and bank independence.

use axp21264_core::common::RegisterFile;

#[test]
fn r31_and_f31_read_zero_regardless_of_writes() {
    let mut rf = RegisterFile::new();
    rf.write(31, 0xDEAD_BEEF);
    rf.write_f(31, 0x3FF0_0000_0000_0000);
    assert_eq!(rf.read(31), 0);
    assert_eq!(rf.read_f(31), 0);
}

#[test]
fn integer_and_fp_banks_do_not_alias() {
    let mut rf = RegisterFile::new();
    rf.write(7, 0x1111);
    rf.write_f(7, 0x2222);
    assert_eq!(rf.read(7), 0x1111);
    assert_eq!(rf.read_f(7), 0x2222);
}

#[test]
fn fresh_file_reads_zero_everywhere() {
    let rf = RegisterFile::new();
    for i in 0..32 {
        assert_eq!(rf.read(i), 0);
        assert_eq!(rf.read_f(i), 0);
    }
}
