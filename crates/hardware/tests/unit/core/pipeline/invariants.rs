//! Property tests over the pipeline bookkeeping structures.
//!
//! Two of the machine's universal invariants live here: physical register
//! conservation (free + mapped + in-flight always accounts for the whole
//! file) and in-order retirement (an instruction never retires before an
//! older one, regardless of completion order).

use axp21264_core::common::constants::{ARCH_REGS, INT_PHYS_REGS};
use axp21264_core::core::pipeline::active_list::ActiveList;
use axp21264_core::core::pipeline::rename::{PhysReg, RenameUnit};
use axp21264_core::isa::instruction::decode;
use proptest::prelude::*;

const NOP: u32 = 0x47FF_041F;

proptest! {
    /// Free + mapped + in-flight-allocated = 80, across any interleaving
    /// of renames and releases.
    #[test]
    fn physical_register_conservation(ops in proptest::collection::vec((1usize..31, any::<bool>()), 0..200)) {
        let mut unit = RenameUnit::new();
        let mut in_flight: Vec<PhysReg> = Vec::new();

        for (arch, retire_one) in ops {
            if retire_one {
                if let Some(stale) = in_flight.pop() {
                    unit.release(stale, false);
                }
            } else if let Some((_new, old)) = unit.rename_dest(arch, false) {
                in_flight.push(old);
            }

            // The current map holds exactly ARCH_REGS entries (the zero
            // register's fixed mapping included); every other physical
            // register is either free or held by an in-flight stale ref.
            let total = unit.free_count(false) + ARCH_REGS + in_flight.len();
            prop_assert_eq!(total, INT_PHYS_REGS);
        }
    }

    /// Whatever order completions arrive in, retirement is oldest-first.
    #[test]
    fn retirement_is_in_program_order(completion_order in proptest::collection::vec(0usize..8, 8..32)) {
        let mut al = ActiveList::new(8);
        let d = decode(NOP);
        let mut tags = Vec::new();
        for i in 0..8u64 {
            tags.push(al.dispatch(i * 4, &d, 1, false, None, None, i * 4 + 4).unwrap());
        }

        let mut retired = Vec::new();
        for idx in completion_order {
            al.complete(tags[idx], idx as u64);
            while let Some(e) = al.retire_head() {
                retired.push(e.pc);
            }
        }
        // Retired PCs must be a strictly increasing prefix of the program.
        for pair in retired.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }
}
