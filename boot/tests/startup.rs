//! Boot selection and the power up sequence.

mod common;

use common::{install_core, install_junk, machine, SimReflasher, SimScreen};
use megaflash::cart::{C128_MAGIC, C64_MAGIC, M65_MAGIC};
use megaflash::hw::{key, modifier, reg, DIP4};
use megaflash::select::select_boot_slot;
use megaflash::startup::{self, attic_ram_ok};
use megaflash::{platform, Cartridge, ControlLines, Exit, Notice, Options, SlotTable, Variant};
use simflash::regs::LINES_IDLE;
use simflash::styles::{MEGA65_R3_QSPI, NEXYS4DDR_QSPI};
use storage::RegisterFile;

const DEFAULT: u8 = 0x80;
const C64: u8 = 0x01;
const C128: u8 = 0x02;
const M65: u8 = 0x04;

const IDLE: ControlLines = ControlLines(LINES_IDLE);

#[test]
fn dip_switch_decides_without_flags() {
    for (dip, slot) in [(0x00, 1), (DIP4, 2), (0xff, 2), (0xf7, 1)] {
        let layout = &MEGA65_R3_QSPI;
        let (mut hw, flash) = machine(layout);
        install_core(&flash, layout, 1, "ONE", 0);
        install_core(&flash, layout, 2, "TWO", C64);
        hw.regs.set(reg::DIP_SWITCHES, dip);

        let mut slots = SlotTable::new(&platform::MEGA65_R3);
        let choice = select_boot_slot(&mut hw, &mut slots, IDLE);
        assert_eq!(choice.cartridge, Cartridge::None);
        assert_eq!(choice.slot, slot);
        assert!(choice.by_dip_switch);
    }
}

#[test]
fn cartridge_picks_its_core() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "DEFAULT", DEFAULT);
    install_core(&flash, layout, 3, "C128", C128);
    install_core(&flash, layout, 5, "NATIVE", M65);
    install_core(&flash, layout, 6, "C64", C64);
    let mut slots = SlotTable::new(&platform::MEGA65_R3);

    hw.regs.load(reg::CART_ROM_HI, &C128_MAGIC);
    let choice = select_boot_slot(&mut hw, &mut slots, IDLE);
    assert_eq!((choice.cartridge, choice.slot), (Cartridge::C128, 3));

    // A pulled line beats the C128 signature.
    let choice = select_boot_slot(&mut hw, &mut slots, ControlLines(0x20));
    assert_eq!((choice.cartridge, choice.slot), (Cartridge::C64, 6));

    // The native signature beats everything.
    hw.regs.load(reg::CART_ROM_LO, &C64_MAGIC);
    hw.regs.load(reg::CART_ROM_LO + 3, &M65_MAGIC);
    let choice = select_boot_slot(&mut hw, &mut slots, ControlLines(0x00));
    assert_eq!((choice.cartridge, choice.slot), (Cartridge::M65, 5));
    assert_eq!(choice.cart_id.window[3..6], M65_MAGIC);
    assert!(!choice.by_dip_switch);
}

#[test]
fn selection_is_repeatable() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 2, "C64", C64 | DEFAULT);
    let mut slots = SlotTable::new(&platform::MEGA65_R3);
    let lines = ControlLines(0x40);

    let first = select_boot_slot(&mut hw, &mut slots, lines);
    let second = select_boot_slot(&mut hw, &mut slots, lines);
    assert_eq!(first, second);
    assert_eq!(first.slot, 2);
}

#[test]
fn attic_ram_test() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, _flash) = machine(layout);
    assert!(attic_ram_ok(&mut hw.regs));
    let written: Vec<u8> = hw
        .regs
        .pokes()
        .iter()
        .filter(|(addr, _)| *addr == reg::ATTIC_RAM)
        .map(|(_, v)| *v)
        .collect();
    assert_eq!(written, [0x55, 0xaa, 0xff, 0x00]);

    let mut regs = simflash::regs::SimRegs::new(3).without_attic();
    assert!(!attic_ram_ok(&mut regs));
}

fn run(hw: &mut common::SimHardware, flash: &simflash::SharedFlash, options: Options) -> (Exit, SimScreen) {
    let mut screen = SimScreen::new();
    let mut flasher = SimReflasher::new(flash, &MEGA65_R3_QSPI);
    let lines = ControlLines::sample(&mut hw.regs);
    let exit = startup::run(hw, &mut screen, &mut flasher, options, lines).unwrap();
    (exit, screen)
}

#[test]
fn lines_sampled_at_power_up_decide() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "DEFAULT", DEFAULT);
    install_core(&flash, layout, 6, "C64", C64);

    // GAME pulled at power up, released by the time the session runs.
    hw.regs.set(reg::CART_LINES, 0x20);
    let lines = ControlLines::sample(&mut hw.regs);
    hw.regs.set(reg::CART_LINES, LINES_IDLE);

    let mut screen = SimScreen::new();
    let mut flasher = SimReflasher::new(&flash, layout);
    let exit = startup::run(&mut hw, &mut screen, &mut flasher, Options::default(), lines).unwrap();
    assert_eq!(exit, Exit::Launch(6 * 0x80_0000 + 4096));
}

#[test]
fn powers_up_into_the_default_core() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 3, "DEFAULT", DEFAULT);

    let (exit, screen) = run(&mut hw, &flash, Options::default());
    assert_eq!(exit, Exit::Launch(3 * 0x80_0000 + 4096));
    assert_eq!(screen.renders, 0);
    assert!(screen.notices.is_empty());
}

#[test]
fn empty_boot_slot_hands_back() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    let (exit, screen) = run(&mut hw, &flash, Options::default());
    assert_eq!(exit, Exit::HandOff);
    assert_eq!(screen.renders, 0);
}

#[test]
fn escape_hands_back_at_once() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "DEFAULT", DEFAULT);
    hw.regs.hold_key(key::ESC);

    let (exit, _) = run(&mut hw, &flash, Options::default());
    assert_eq!(exit, Exit::HandOff);
    assert_eq!(flash.borrow().reads(), 0);
}

#[test]
fn reconfigured_fpga_hands_back() {
    let layout = &MEGA65_R3_QSPI;
    let (hw, flash) = machine(layout);
    let mut hw = megaflash::Hardware::new(hw.regs.reconfigured(), hw.flash, hw.delay);
    install_core(&flash, layout, 1, "DEFAULT", DEFAULT);

    let (exit, _) = run(&mut hw, &flash, Options::default());
    assert_eq!(exit, Exit::HandOff);
    assert!(hw.regs.pokes().contains(&(reg::BOOTSTS_SELECT, 0x16)));
}

#[test]
fn no_scroll_shows_the_menu() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "DEFAULT", DEFAULT);
    hw.regs.hold_modifiers(modifier::NO_SCROLL);
    hw.regs.press(b'1');

    let (exit, screen) = run(&mut hw, &flash, Options::default());
    assert_eq!(exit, Exit::Launch(0x80_1000));
    assert_eq!(screen.renders, 1);
    assert_eq!(screen.rows.len(), 8);
    assert!(screen.rows[1].default_slot);
}

#[test]
fn tab_shows_the_menu_without_no_scroll() {
    let layout = &NEXYS4DDR_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "DEFAULT", DEFAULT);
    hw.regs.hold_key(key::TAB);
    hw.regs.press(key::ESC);

    let (exit, screen) = run(&mut hw, &flash, Options::default());
    assert_eq!(exit, Exit::HandOff);
    assert_eq!(screen.rows.len(), 4);

    // TAB means nothing on a MEGA65 keyboard.
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_core(&flash, layout, 1, "DEFAULT", DEFAULT);
    hw.regs.hold_key(key::TAB);
    let (exit, _) = run(&mut hw, &flash, Options::default());
    assert_eq!(exit, Exit::Launch(0x80_1000));
}

#[test]
fn damaged_boot_slot_warns() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    install_junk(&flash, layout, 1);
    hw.regs.press(b'x');
    hw.regs.press(key::RUN_STOP);

    let (exit, screen) = run(&mut hw, &flash, Options::default());
    assert_eq!(exit, Exit::HandOff);
    assert_eq!(screen.notices, [Notice::SlotDamaged(1), Notice::PressAnyKey]);
    assert_eq!(screen.renders, 1);
    assert_eq!(hw.regs.keys_left(), 0);
}

#[test]
fn missing_parts_are_reported() {
    let layout = &MEGA65_R3_QSPI;
    let (hw, flash) = machine(layout);
    let mut hw = megaflash::Hardware::new(hw.regs.without_attic(), hw.flash, hw.delay);
    hw.regs.set(reg::BOOTSTS_STATUS, 0xff);
    hw.regs.press(b' ');
    hw.regs.press(key::ESC);

    let options = Options { variant: Variant::Standalone, slot0_reflash: false };
    let (exit, screen) = run(&mut hw, &flash, options);
    assert_eq!(exit, Exit::HandOff);
    assert_eq!(screen.notices, [Notice::JtagBoot, Notice::NoAtticRam, Notice::PressAnyKey]);
}

#[test]
fn unknown_model() {
    let layout = &MEGA65_R3_QSPI;
    let (mut hw, flash) = machine(layout);
    hw.regs.set(reg::MODEL_ID, 0x77);

    let (exit, screen) = run(&mut hw, &flash, Options::default());
    assert_eq!(exit, Exit::HandOff);
    assert!(screen.notices.is_empty());

    hw.regs.press(b' ');
    let options = Options { variant: Variant::Standalone, slot0_reflash: false };
    let (exit, screen) = run(&mut hw, &flash, options);
    assert_eq!(exit, Exit::HandOff);
    assert_eq!(screen.notices, [Notice::UnknownModel(0x77), Notice::PressAnyKey]);
    assert_eq!(hw.regs.peek(reg::KEY), 0);
}
