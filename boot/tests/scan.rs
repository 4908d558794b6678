//! Slot scanning against a simulated flash.

mod common;

use common::{install_core, install_junk, machine};
use megaflash::slot::Target;
use megaflash::{platform, CoreCaps, Hardware, Label, Platform, ScanRequest, SlotTable, Validity};
use simflash::delay::SimDelay;
use simflash::gen::{GenBuilder, HEADER_SIZE};
use simflash::regs::SimRegs;
use simflash::styles::{all_flashes, MEGA65_R3_QSPI, NEXYS4DDR_QSPI};
use simflash::SharedFlash;

const DEFAULT: u8 = 0x80;
const C64: u8 = 0x01;
const C128: u8 = 0x02;
const M65: u8 = 0x04;

#[test]
fn end_to_end_selection() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 0, "MEGA65 R3 FACTORY", 0);
    install_core(&flash, layout, 1, "MEGA65   R3", DEFAULT | C64);
    install_core(&flash, layout, 2, "M65 CART CORE", M65);

    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    assert_eq!(slots.len(), 8);
    assert_eq!(slots.scan(&mut hw, ScanRequest::search(CoreCaps::CART_M65)), Some(2));
    assert_eq!(slots.scan(&mut hw, ScanRequest::search(CoreCaps::CART_C64)), Some(1));
    assert_eq!(slots.scan(&mut hw, ScanRequest::full()), Some(1));
}

#[test]
fn validity_and_labels() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 0, "SOMETHING ELSE", 0);
    install_core(&flash, layout, 1, "MEGA65   R3", 0);
    install_junk(&flash, layout, 2);

    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    // No default flag anywhere, and nothing searched for.
    assert_eq!(slots.scan(&mut hw, ScanRequest::full()), None);

    let slot0 = slots.get(0).unwrap();
    assert_eq!(slot0.validity, Validity::Valid);
    assert_eq!(slot0.name, Label::from_ascii(b"MEGA65 FACTORY CORE"));

    let slot1 = slots.get(1).unwrap();
    assert_eq!(slot1.validity, Validity::Valid);
    assert_eq!(slot1.name, Label::from_ascii(b"MEGA65   R3"));
    assert_eq!(slot1.version, Label::from_ascii(b"v0.1.0"));

    let slot2 = slots.get(2).unwrap();
    assert_eq!(slot2.validity, Validity::Invalid);
    assert_eq!(slot2.name, Label::from_ascii(b"UNKNOWN CONTENT"));
    assert_eq!(slot2.flags, CoreCaps::empty());

    for slot in slots.iter().skip(3) {
        assert_eq!(slot.validity, Validity::Empty);
        assert_eq!(slot.name, Label::from_ascii(b"EMPTY SLOT"));
        assert_eq!(slot.version, Label::blank());
    }
}

#[test]
fn empty_factory_slot_keeps_factory_label() {
    let layout = &NEXYS4DDR_QSPI;
    let (mut hw, _flash) = machine(layout);
    let mut slots = SlotTable::new(&platform::NEXYS4DDR);
    slots.scan(&mut hw, ScanRequest::full());
    assert_eq!(slots.len(), 4);
    assert_eq!(slots.get(0).unwrap().validity, Validity::Empty);
    assert_eq!(slots.get(0).unwrap().name, Label::from_ascii(b"MEGA65 FACTORY CORE"));
}

#[test]
fn first_slot_claims_each_flag() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "FIRST", DEFAULT | C64);
    install_core(&flash, layout, 2, "SECOND", DEFAULT | C64 | C128);
    install_core(&flash, layout, 3, "THIRD", C128 | M65);

    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    assert_eq!(slots.scan(&mut hw, ScanRequest::full()), Some(1));

    assert_eq!(slots.get(1).unwrap().flags, CoreCaps::SLOT_DEFAULT | CoreCaps::CART_C64);
    assert_eq!(slots.get(2).unwrap().flags, CoreCaps::CART_C128);
    assert_eq!(slots.get(3).unwrap().flags, CoreCaps::CART_M65);

    // Every flag belongs to at most one slot.
    let mut seen = CoreCaps::empty();
    for slot in slots.iter() {
        assert!(!seen.intersects(slot.flags));
        seen |= slot.flags;
    }

    assert_eq!(slots.scan(&mut hw, ScanRequest::search(CoreCaps::CART_C128)), Some(2));
}

#[test]
fn search_leaves_names_alone() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "MEGA65   R3", DEFAULT);

    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    assert_eq!(slots.scan(&mut hw, ScanRequest::search(CoreCaps::CART_M65)), Some(1));
    assert_eq!(slots.get(1).unwrap().validity, Validity::Valid);
    assert_eq!(slots.get(1).unwrap().name, Label::blank());
}

#[test]
fn first_reads_after_power_up() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 0, "FACTORY", DEFAULT);
    flash.borrow_mut().garbage_first_reads(3);

    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    assert_eq!(slots.scan(&mut hw, ScanRequest::full()), Some(0));
    assert_eq!(slots.get(0).unwrap().validity, Validity::Valid);
    // Two retries, 50ms each.
    assert_eq!(hw.delay.total_ms(), 100);

    // Only done once.
    let reads = flash.borrow().reads();
    slots.scan(&mut hw, ScanRequest::full());
    assert_eq!(flash.borrow().reads(), reads + 8);
}

#[test]
fn garbage_forever_gives_up() {
    let layout = &NEXYS4DDR_QSPI;
    let (mut hw, flash) = machine(layout);
    flash.borrow_mut().garbage_first_reads(usize::MAX);

    let mut slots = SlotTable::new(&platform::NEXYS4DDR);
    slots.scan(&mut hw, ScanRequest::full());
    assert_eq!(hw.delay.total_ms(), 256 * 50);
    // Sectors full of garbage are not cores.
    assert!(slots.iter().all(|s| s.validity == Validity::Invalid));
}

#[test]
fn read_errors_mean_unknown_content() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 2, "MEGA65 CORE", DEFAULT);
    flash.borrow_mut().fail_reads_at(layout.slot_offset(2));

    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    assert_eq!(slots.scan(&mut hw, ScanRequest::full()), None);
    assert_eq!(slots.get(2).unwrap().validity, Validity::Invalid);
    assert_eq!(slots.get(2).unwrap().name, Label::from_ascii(b"UNKNOWN CONTENT"));
}

#[test]
fn refreshing_one_slot() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "ONE", DEFAULT | C64);
    install_core(&flash, layout, 2, "TWO", M65);

    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    slots.scan(&mut hw, ScanRequest::full());

    // A new core in slot 3 wants flags already taken by slot 1.
    let core = GenBuilder::default().name("THREE").flags(DEFAULT | C64 | C128).build().unwrap();
    flash.borrow_mut().install(&core.data, layout.slot_offset(3)).unwrap();

    let reads = flash.borrow().reads();
    slots.scan(&mut hw, ScanRequest::refresh(3));
    assert_eq!(flash.borrow().reads(), reads + 1);

    let slot3 = slots.get(3).unwrap();
    assert_eq!(slot3.name, Label::from_ascii(b"THREE"));
    assert_eq!(slot3.flags, CoreCaps::CART_C128);
    assert_eq!(slots.get(1).unwrap().flags, CoreCaps::SLOT_DEFAULT | CoreCaps::CART_C64);
    assert_eq!(slots.get(2).unwrap().flags, CoreCaps::CART_M65);

    // Slot 1 is erased, and the flags it gave up go to slot 3.
    flash.borrow_mut().install(&[0xff; 512], layout.slot_offset(1)).unwrap();
    let req = ScanRequest {
        search: CoreCaps::empty(),
        target: Target::OneSlot { index: 1, also_refresh_slot0: true },
    };
    assert_eq!(slots.scan(&mut hw, req), None);
    assert_eq!(flash.borrow().reads(), reads + 3);
    assert_eq!(slots.get(1).unwrap().validity, Validity::Empty);
    assert_eq!(slots.get(1).unwrap().flags, CoreCaps::empty());
    assert_eq!(
        slots.get(3).unwrap().flags,
        CoreCaps::SLOT_DEFAULT | CoreCaps::CART_C64 | CoreCaps::CART_C128
    );
    assert_eq!(slots.get(2).unwrap().flags, CoreCaps::CART_M65);
}

#[test]
fn refreshed_lower_slot_takes_the_flag() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "ONE", DEFAULT);
    install_core(&flash, layout, 5, "FIVE", C64);

    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    slots.scan(&mut hw, ScanRequest::full());
    assert_eq!(slots.get(5).unwrap().flags, CoreCaps::CART_C64);

    install_core(&flash, layout, 3, "THREE", C64);
    slots.scan(&mut hw, ScanRequest::refresh(3));
    assert_eq!(slots.get(3).unwrap().flags, CoreCaps::CART_C64);
    assert_eq!(slots.get(5).unwrap().flags, CoreCaps::empty());

    // A search finds the same owner, and moves nothing.
    assert_eq!(slots.scan(&mut hw, ScanRequest::search(CoreCaps::CART_C64)), Some(3));
    assert_eq!(slots.get(3).unwrap().flags, CoreCaps::CART_C64);
    assert_eq!(slots.get(5).unwrap().flags, CoreCaps::empty());
    assert_eq!(slots.get(1).unwrap().flags, CoreCaps::SLOT_DEFAULT);
}

#[test]
fn capabilities_are_masked() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    let core = GenBuilder::default().name("CAPS").caps(0xff).flags(0xff).build().unwrap();
    flash.borrow_mut().install(&core.data, layout.slot_offset(1)).unwrap();

    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    assert_eq!(slots.scan(&mut hw, ScanRequest::full()), Some(1));
    assert_eq!(slots.get(1).unwrap().capabilities, CoreCaps::USED);
    assert_eq!(slots.get(1).unwrap().flags, CoreCaps::USED);

    // The magic goes, and everything read from the header with it.
    install_junk(&flash, layout, 1);
    assert_eq!(slots.scan(&mut hw, ScanRequest::refresh(1)), None);
    let slot1 = slots.get(1).unwrap();
    assert_eq!(slot1.validity, Validity::Invalid);
    assert_eq!(slot1.capabilities, CoreCaps::empty());
    assert_eq!(slot1.flags, CoreCaps::empty());
}

#[test]
fn slot_0_read_errors_are_retried() {
    let layout = &NEXYS4DDR_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "MEGA65 CORE", DEFAULT);
    flash.borrow_mut().fail_reads_at(0);

    let mut slots = SlotTable::new(&platform::NEXYS4DDR);
    assert_eq!(slots.scan(&mut hw, ScanRequest::full()), Some(1));
    // A failed read is no answer, so it is waited out like garbage.
    assert_eq!(hw.delay.total_ms(), 256 * 50);
    assert_eq!(slots.get(0).unwrap().validity, Validity::Invalid);
}

#[test]
fn every_board() {
    for (layout, sim) in all_flashes() {
        let flash = SharedFlash::new(sim.unwrap());
        let mut hw = Hardware::new(SimRegs::new(layout.model_id), flash.clone(), SimDelay::new());
        let last = layout.slot_count() - 1;
        let core = GenBuilder::default()
            .name("LAST SLOT")
            .version("v9.9")
            .flags(DEFAULT)
            .size(2 * HEADER_SIZE)
            .build()
            .unwrap();
        flash.borrow_mut().install(&core.data, layout.slot_offset(last)).unwrap();

        let platform = Platform::probe(&mut hw.regs).unwrap();
        let mut slots = SlotTable::new(platform);
        assert_eq!(slots.len(), layout.slot_count());
        assert_eq!(platform.slot_size() as usize, layout.slot_size);
        assert_eq!(slots.scan(&mut hw, ScanRequest::full()), Some(last));

        let slot = slots.get(last).unwrap();
        assert_eq!(slot.name, Label::from_ascii(b"LAST SLOT"));
        assert_eq!(slot.version, Label::from_ascii(b"v9.9"));
        assert!(slots.iter().take(last).skip(1).all(|s| s.validity == Validity::Empty));
    }
}
