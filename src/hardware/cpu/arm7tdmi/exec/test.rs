// License below.
#![allow(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;
use super::super::{Arm7Tdmi, Mode, State};
use super::super::super::super::bus::Bus;
use super::super::super::super::irq::IntCon;
use super::super::super::super::memory::IRAM_FIRST;

fn test_cpu() -> (Arm7Tdmi, Rc<RefCell<Bus>>) {
    let intcon = Rc::new(RefCell::new(IntCon::new()));
    let bus = Rc::new(RefCell::new(Bus::new(32 * 1024 * 1024, intcon)));
    let cpu = Arm7Tdmi::new(bus.clone());
    (cpu, bus)
}

fn load_arm(bus: &Rc<RefCell<Bus>>, base: u32, program: &[u32]) {
    let mut bus = bus.borrow_mut();
    for (i, &inst) in program.iter().enumerate() {
        bus.write32(base + 4 * (i as u32), inst);
    }
}

fn load_thumb(bus: &Rc<RefCell<Bus>>, base: u32, program: &[u16]) {
    let mut bus = bus.borrow_mut();
    for (i, &inst) in program.iter().enumerate() {
        bus.write16(base + 2 * (i as u32), inst as u32);
    }
}

#[test]
fn str_pc_observes_the_pipeline_offset() {
    let (mut cpu, bus) = test_cpu();
    load_arm(&bus, IRAM_FIRST, &[
        0xE3A00101, // mov r0, #0x40000000
        0xE3800C01, // orr r0, r0, #0x100
        0xE580F000, // str pc, [r0]
    ]);
    cpu.reset(IRAM_FIRST);
    for _ in 0..3 { cpu.step(); }
    // The store executes at 0x40000008, so PC reads as +8.
    assert_eq!(bus.borrow_mut().read32(0x40000100), 0x40000010);
}

#[test]
fn arithmetic_flags() {
    let (mut cpu, bus) = test_cpu();
    load_arm(&bus, IRAM_FIRST, &[
        0xE3A00005, // mov r0, #5
        0xE2500005, // subs r0, r0, #5
        0xE3E02000, // mvn r2, #0
        0xE0923002, // adds r3, r2, r2
        0xE2B24000, // adcs r4, r2, #0
    ]);
    cpu.reset(IRAM_FIRST);

    cpu.step();
    cpu.step();
    assert!(cpu.cpsr().Z(), "5 - 5 must set Z");
    assert!(cpu.cpsr().C(), "no borrow must set C");

    cpu.step();
    cpu.step();
    assert_eq!(cpu.reg(3), 0xFFFFFFFE);
    assert!(cpu.cpsr().C() && cpu.cpsr().N() && !cpu.cpsr().V());

    // 0xFFFFFFFF + 0 + carry-in rolls over to zero with carry out.
    cpu.step();
    assert_eq!(cpu.reg(4), 0);
    assert!(cpu.cpsr().Z() && cpu.cpsr().C());
}

#[test]
fn branch_with_link() {
    let (mut cpu, bus) = test_cpu();
    load_arm(&bus, IRAM_FIRST, &[
        0xEB000002, // bl +16 (to 0x40000010)
    ]);
    cpu.reset(IRAM_FIRST);
    cpu.step();
    assert_eq!(cpu.reg(15), 0x40000010);
    assert_eq!(cpu.reg(14), 0x40000004);
}

#[test]
fn bx_switches_to_thumb_and_fetches_halfwords() {
    let (mut cpu, bus) = test_cpu();
    load_arm(&bus, IRAM_FIRST, &[
        0xE3A00101, // mov r0, #0x40000000
        0xE3800011, // orr r0, r0, #0x11
        0xE12FFF10, // bx r0
    ]);
    load_thumb(&bus, IRAM_FIRST + 0x10, &[
        0x2012, // mov r0, #0x12
        0x3034, // add r0, #0x34
        0xE7FE, // b .
    ]);
    cpu.reset(IRAM_FIRST);
    for _ in 0..3 { cpu.step(); }
    assert_eq!(cpu.state(), State::THUMB);
    assert!(cpu.cpsr().state() == State::THUMB);
    assert_eq!(cpu.reg(15), 0x40000010);

    cpu.step();
    assert_eq!(cpu.reg(15), 0x40000012, "THUMB fetches must advance by 2");
    cpu.step();
    assert_eq!(cpu.reg(0), 0x46);
}

#[test]
fn block_transfer_round_trip() {
    let (mut cpu, bus) = test_cpu();
    load_arm(&bus, IRAM_FIRST, &[
        0xE3A00101, // mov r0, #0x40000000
        0xE3800C02, // orr r0, r0, #0x200
        0xE3A01001, // mov r1, #1
        0xE3A02002, // mov r2, #2
        0xE8A00006, // stmia r0!, {r1, r2}
        0xE9300018, // ldmdb r0!, {r3, r4}
    ]);
    cpu.reset(IRAM_FIRST);
    for _ in 0..5 { cpu.step(); }
    assert_eq!(cpu.reg(0), 0x40000208);
    assert_eq!(bus.borrow_mut().read32(0x40000200), 1);
    assert_eq!(bus.borrow_mut().read32(0x40000204), 2);

    cpu.step();
    assert_eq!(cpu.reg(0), 0x40000200);
    assert_eq!(cpu.reg(3), 1);
    assert_eq!(cpu.reg(4), 2);
}

#[test]
fn multiply_leaves_carry_and_overflow_alone() {
    let (mut cpu, bus) = test_cpu();
    load_arm(&bus, IRAM_FIRST, &[
        0xE3A00003, // mov r0, #3
        0xE3A01005, // mov r1, #5
        0xE0120190, // muls r2, r0, r1
    ]);
    cpu.reset(IRAM_FIRST);
    let raw = cpu.cpsr().0 | (1 << 29) | (1 << 28); // Seed C and V.
    cpu.set_cpsr(raw);
    for _ in 0..3 { cpu.step(); }
    assert_eq!(cpu.reg(2), 15);
    assert!(cpu.cpsr().C(), "MUL must not touch C");
    assert!(cpu.cpsr().V(), "MUL must not touch V");
    assert!(!cpu.cpsr().Z() && !cpu.cpsr().N());
}

#[test]
fn unaligned_word_load_rotates() {
    let (mut cpu, bus) = test_cpu();
    bus.borrow_mut().write32(0x40000100, 0x11223344);
    load_arm(&bus, IRAM_FIRST, &[
        0xE3A00101, // mov r0, #0x40000000
        0xE3800C01, // orr r0, r0, #0x100
        0xE3800001, // orr r0, r0, #1
        0xE5901000, // ldr r1, [r0]
    ]);
    cpu.reset(IRAM_FIRST);
    for _ in 0..4 { cpu.step(); }
    assert_eq!(cpu.reg(1), 0x44112233);
}

#[test]
fn swi_enters_the_supervisor_vector() {
    let (mut cpu, bus) = test_cpu();
    load_arm(&bus, IRAM_FIRST, &[
        0xEF000000, // swi #0
    ]);
    cpu.reset(IRAM_FIRST);
    let old_cpsr = cpu.cpsr();
    cpu.step();
    assert_eq!(cpu.mode(), Mode::Supervisor);
    assert_eq!(cpu.reg(15), 0x08);
    assert_eq!(cpu.reg(14), 0x40000004);
    assert_eq!(cpu.spsr(), old_cpsr);
    assert!(cpu.cpsr().irq_disabled());
}

#[test]
fn thumb_push_pop_round_trip() {
    let (mut cpu, bus) = test_cpu();
    load_arm(&bus, IRAM_FIRST, &[
        0xE3A00101, // mov r0, #0x40000000
        0xE3800011, // orr r0, r0, #0x11
        0xE12FFF10, // bx r0
    ]);
    load_thumb(&bus, IRAM_FIRST + 0x10, &[
        0x2107, // mov r1, #7
        0xB402, // push {r1}
        0x2100, // mov r1, #0
        0xBC04, // pop {r2}
    ]);
    cpu.reset(IRAM_FIRST);
    cpu.set_reg(13, (IRAM_FIRST + 0x1000) as u32);
    for _ in 0..3 { cpu.step(); }
    let sp = cpu.reg(13);

    cpu.step(); // mov r1, #7
    cpu.step(); // push
    assert_eq!(cpu.reg(13), sp - 4);
    cpu.step(); // mov r1, #0
    cpu.step(); // pop
    assert_eq!(cpu.reg(13), sp);
    assert_eq!(cpu.reg(2), 7);
}

#[test]
fn thumb_long_branch_links() {
    let (mut cpu, bus) = test_cpu();
    load_arm(&bus, IRAM_FIRST, &[
        0xE3A00101, // mov r0, #0x40000000
        0xE3800011, // orr r0, r0, #0x11
        0xE12FFF10, // bx r0
    ]);
    load_thumb(&bus, IRAM_FIRST + 0x10, &[
        0xF000, // bl (high part, offset 0)
        0xF802, // bl (low part, +4)
        0x46C0, // nop (skipped)
        0x46C0, // nop (branch target)
    ]);
    cpu.reset(IRAM_FIRST);
    for _ in 0..3 { cpu.step(); }

    cpu.step(); // high part
    cpu.step(); // low part
    assert_eq!(cpu.reg(15), 0x40000018);
    assert_eq!(cpu.reg(14), 0x40000015, "return address must point behind the BL pair, with bit 0 set");
}


/*
Licensed to the Apache Software Foundation (ASF) under one
or more contributor license agreements.  See the NOTICE file
distributed with this work for additional information
regarding copyright ownership.  The ASF licenses this file
to you under the Apache License, Version 2.0 (the
"License"); you may not use this file except in compliance
with the License.  You may obtain a copy of the License at

  http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing,
software distributed under the License is distributed on an
"AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
KIND, either express or implied.  See the License for the
specific language governing permissions and limitations
under the License.
*/
