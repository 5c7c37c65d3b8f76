//! PALcode paths: privileged IPR access, `CALL_PAL` entry and return,
//! software translation-buffer fills, and interrupt delivery.

use axp21264_core::core::arch::ipr;

use crate::common::{asm, harness::TestContext};

#[test]
fn hw_mtpr_then_mfpr_round_trips_an_ipr() {
    let program = vec![
        asm::lda(1, 0x15, 31),
        asm::hw_mtpr(1, ipr::IPL),
        asm::hw_mfpr(2, ipr::IPL),
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    assert_eq!(ctx.reg(2), 0x15);
    assert_eq!(ctx.sim.cpu.ipr.ipl, 0x15);
}

#[test]
fn hw_ops_outside_pal_mode_decode_as_reserved() {
    // Leave PAL mode by filling the ITB for page zero and returning to a
    // virtual PC, then attempt a privileged read.
    let program = vec![
        asm::lda(1, 0, 31),                  // ITB tag: VA page 0
        asm::hw_mtpr(1, ipr::ITB_TAG),
        asm::lda(2, 0x10, 31),               // PTE: PFN 0, ASM
        asm::hw_mtpr(2, ipr::ITB_PTE),
        asm::lda(3, 0x18, 31),               // continue at VA 0x18
        asm::hw_ret(3),
        asm::hw_mfpr(4, ipr::IPL),           // word 6 (0x18): now illegal
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    assert_eq!(ctx.sim.cpu.ipr.exc_sum, 1 << 7, "OPCDEC cause bit");
    assert_eq!(ctx.reg(4), 0, "privileged read must not commit");
}

#[test]
fn hw_ret_leaves_pal_mode_and_fetches_through_the_itb() {
    let program = vec![
        asm::lda(1, 0, 31),
        asm::hw_mtpr(1, ipr::ITB_TAG),
        asm::lda(2, 0x10, 31), // PTE: PFN 0, ASM set, no fault bits
        asm::hw_mtpr(2, ipr::ITB_PTE),
        asm::lda(3, 0x18, 31),
        asm::hw_ret(3),
        asm::lda(4, 3, 31), // word 6 = VA 0x18, fetched via the ITB
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    assert!(!ctx.sim.cpu.pal_mode);
    assert_eq!(ctx.reg(4), 3);
}

#[test]
fn call_pal_enters_its_vector_and_hw_ret_resumes() {
    let program = vec![
        asm::call_pal(0x80),
        asm::lda(7, 0xEE, 31), // resumes here after the handler returns
        asm::halt(),
    ];
    // Handler at PAL_BASE + 0x2000 + (0x80 << 6) = 0x4000; its line is not
    // in the boot image, so fetching it exercises the Istream fill path.
    let handler = [
        asm::lda(5, 12, 31),
        asm::hw_mfpr(6, ipr::EXC_ADDR),
        asm::hw_ret(6),
    ];
    let mut ctx = TestContext::boot(&program);
    let mut bytes = Vec::new();
    for w in handler {
        bytes.extend_from_slice(&w.to_le_bytes());
    }
    ctx.sim.cpu.load_memory(0x4000, &bytes);

    ctx.run_to_halt();
    assert_eq!(ctx.reg(5), 12, "handler body ran");
    // EXC_ADDR holds the return PC with the caller's PALmode flag in bit 0.
    assert_eq!(ctx.reg(6), 4 | 1);
    assert_eq!(ctx.reg(7), 0xEE, "execution resumed after CALL_PAL");
    assert!(ctx.sim.cpu.stats.icache_misses >= 1, "handler line missed");
}

#[test]
fn posted_interrupt_is_delivered_at_a_retirement_boundary() {
    let program = vec![
        asm::lda(1, 0, 31),
        asm::hw_mtpr(1, ipr::ITB_TAG),
        asm::lda(2, 0x10, 31),
        asm::hw_mtpr(2, ipr::ITB_PTE),
        asm::lda(3, 0x18, 31),
        asm::hw_ret(3),
        asm::branch(0x30, 31, -1), // word 6: BR spin loop
    ];
    let mut ctx = TestContext::boot(&program);

    // Let the loop establish itself outside PAL mode, then interrupt.
    assert!(ctx.sim.cpu.run(2_000).is_none());
    assert!(!ctx.sim.cpu.pal_mode);
    ctx.sim.cpu.cbox.set_irq(0x4);
    let halted = ctx.sim.cpu.run(50_000);

    // The interrupt vector holds zeroed memory, which reads as CALL_PAL 0
    // and halts; reaching it proves delivery.
    assert!(halted.is_some(), "interrupt never delivered");
    assert_eq!(ctx.sim.cpu.ipr.exc_sum, 1 << 8, "interrupt cause bit");
    assert!(ctx.sim.cpu.ipr.sirr & 0x4 != 0, "request latched in SIRR");
}
