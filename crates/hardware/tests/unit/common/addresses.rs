//! Address arithmetic: cache-line projection of physical and virtual
//! addresses.

use axp21264_core::common::{PhysAddr, VirtAddr};

#[test]
fn line_base_masks_the_low_six_bits() {
    assert_eq!(PhysAddr::new(0x12340047).line_base(), 0x12340040);
    assert_eq!(PhysAddr::new(0x12340040).line_base(), 0x12340040);
}

#[test]
fn line_offset_is_the_complement_of_line_base() {
    for addr in [0u64, 0x3F, 0x40, 0x12345678] {
        let pa = PhysAddr::new(addr);
        assert_eq!(pa.line_base() + pa.line_offset(), addr);
    }
}

#[test]
fn virtual_and_physical_offsets_agree() {
    assert_eq!(
        VirtAddr::new(0xABC7).line_offset(),
        PhysAddr::new(0xABC7).line_offset()
    );
}
