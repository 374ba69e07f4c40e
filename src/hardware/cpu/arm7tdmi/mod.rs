// License below.
//! Implements emulation utilities for the PP5020's main CPU core,
//! the ARM7TDMI.
//!
//! The CPU keeps its program counter "logical" instead of modelling
//! the three-stage fetch/decode/execute pipeline: while an
//! instruction executes, `R15` reads as the instruction's address
//! plus 8 (ARM state) or plus 4 (THUMB state), which is exactly the
//! value the real pipeline exposes. An instruction that writes `R15`
//! flushes the imaginary pipeline, so the next fetch comes straight
//! from the new address.
#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;
use super::arminstruction::ArmInstruction;
use super::thumbinstruction::ThumbInstruction;
use super::super::bus::Bus;

pub use self::exception::*;
pub use self::psr::*;
pub use self::exec::{ArmDPOP, ArmBSOP};

pub mod exception;
pub mod psr;
pub mod exec;

/// Decides what the CPU should do after executing an instruction.
pub enum CpuAction {
    #[doc = "Continue execution normally."]                         None,
    #[doc = "PC has changed, don't modify it, flush the pipeline."] FlushPipeline,
}

/// Implements the logic needed to emulate an ARM7TDMI CPU.
pub struct Arm7Tdmi {
    // Main register set.
    gpr: [i32; 16],
    cpsr: PSR,
    spsr: [PSR; 7],

    // Register backups for mode changes.
    gpr_r8_r12_fiq: [i32; 5],
    gpr_r8_r12_other: [i32; 5],
    gpr_r13_all: [i32; 7],
    gpr_r14_all: [i32; 7],

    // Settings.
    mode: Mode,
    state: State,

    // Connected devices.
    bus: Rc<RefCell<Bus>>,
}

impl Arm7Tdmi {
    /// Register index for the stack pointer.
    ///
    /// May be used as GPR in ARM state.
    pub const SP: usize = 13;

    /// Register index for the link register.
    ///
    /// This register usually holds the returns address
    /// of a running function. In ARM state, this might
    /// be used as GPR.
    pub const LR: usize = 14;

    /// Register index for the program counter.
    ///
    /// When reading PC, this will usually return an
    /// address beyond the read instruction's address,
    /// due to pipelining and other things.
    pub const PC: usize = 15;

    /// Creates a new CPU where all registers are zeroed.
    pub fn new(bus: Rc<RefCell<Bus>>) -> Arm7Tdmi {
        Arm7Tdmi {
            gpr: [0; 16],
            cpsr: PSR::default(),
            spsr: [PSR::default(); 7],

            gpr_r8_r12_fiq: [0; 5],
            gpr_r8_r12_other: [0; 5],
            gpr_r13_all: [0; 7],
            gpr_r14_all: [0; 7],

            mode: Mode::Supervisor,
            state: State::ARM,

            bus: bus,
        }
    }

    /// Gets the assembly name of a general purpose register.
    pub fn register_name(i: usize) -> &'static str {
        const NAMES: [&'static str; 16] = [
            "R0", "R1", "R2",  "R3",  "R4",  "R5", "R6", "R7",
            "R8", "R9", "R10", "R11", "R12", "SP", "LR", "PC",
        ];
        NAMES[i & 0xF]
    }

    /// Resets the CPU.
    ///
    /// The CPU starts over in ARM state and Supervisor mode
    /// with both interrupt sources masked and PC at the given
    /// reset vector.
    pub fn reset(&mut self, entry: u32) {
        self.gpr = [0; 16];
        self.gpr_r8_r12_fiq = [0; 5];
        self.gpr_r8_r12_other = [0; 5];
        self.gpr_r13_all = [0; 7];
        self.gpr_r14_all = [0; 7];

        self.cpsr = PSR::default();
        self.spsr = [PSR::default(); 7];
        self.mode = Mode::Supervisor;
        self.state = State::ARM;

        self.gpr[Arm7Tdmi::PC] = entry as i32;
    }

    /// Fetches, decodes, and executes a single instruction.
    ///
    /// An undecodable fetch enters the Undefined exception
    /// instead of surfacing an error, as the real core would.
    pub fn step(&mut self) {
        if self.state == State::ARM {
            let addr = (self.gpr[Arm7Tdmi::PC] as u32) & !0b11;
            let raw = self.bus.borrow_mut().read32(addr);
            self.gpr[Arm7Tdmi::PC] = addr.wrapping_add(8) as i32;

            let action = match ArmInstruction::decode(raw) {
                Ok(inst) => {
                    if inst.condition().check(&self.cpsr) { self.execute_arm(inst) }
                    else { CpuAction::None }
                },
                Err(_) => {
                    debug!("Undefined ARM instruction {:#010X} at {:#010X}.", raw, addr);
                    self.enter_exception(Exception::UndefinedInstruction, addr.wrapping_add(4));
                    CpuAction::FlushPipeline
                },
            };

            if let CpuAction::None = action {
                self.gpr[Arm7Tdmi::PC] = addr.wrapping_add(4) as i32;
            }
        } else {
            let addr = (self.gpr[Arm7Tdmi::PC] as u32) & !0b1;
            let raw = self.bus.borrow_mut().read16(addr) as u16;
            self.gpr[Arm7Tdmi::PC] = addr.wrapping_add(4) as i32;

            let action = match ThumbInstruction::decode(raw) {
                Ok(inst) => self.execute_thumb(inst),
                Err(_) => {
                    debug!("Undefined THUMB instruction {:#06X} at {:#010X}.", raw, addr);
                    self.enter_exception(Exception::UndefinedInstruction, addr.wrapping_add(2));
                    CpuAction::FlushPipeline
                },
            };

            if let CpuAction::None = action {
                self.gpr[Arm7Tdmi::PC] = addr.wrapping_add(2) as i32;
            }
        }
    }

    /// Samples the interrupt input lines at an instruction boundary.
    ///
    /// FIQ beats IRQ; a masked line is ignored. At the time of the
    /// call, PC holds the address of the next instruction, so the
    /// banked return address is that address plus 4 — the handler
    /// comes back with `subs pc, lr, #4`.
    ///
    /// # Returns
    /// `true` if an exception was entered.
    pub fn poll_interrupts(&mut self, irq: bool, fiq: bool) -> bool {
        if fiq && !self.cpsr.fiq_disabled() {
            let ret = (self.gpr[Arm7Tdmi::PC] as u32).wrapping_add(4);
            self.enter_exception(Exception::FastInterrupt, ret);
            true
        } else if irq && !self.cpsr.irq_disabled() {
            let ret = (self.gpr[Arm7Tdmi::PC] as u32).wrapping_add(4);
            self.enter_exception(Exception::NormalInterrupt, ret);
            true
        } else {
            false
        }
    }

    /// Causes an exception, switching execution modes and states.
    ///
    /// # Params
    /// - `ex`: The exception to enter.
    /// - `ret_addr`: The return address to bank into the target
    ///   mode's `R14`; it differs by exception kind.
    pub fn enter_exception(&mut self, ex: Exception, ret_addr: u32) {
        let old_cpsr = self.cpsr;
        let new_mode = ex.mode_on_entry();
        self.bank_switch(new_mode);
        self.spsr[new_mode.bank_index()] = old_cpsr;
        self.gpr[Arm7Tdmi::LR] = ret_addr as i32;

        self.cpsr.set_mode(new_mode);
        self.cpsr.set_state(State::ARM);
        self.state = State::ARM;
        self.cpsr.disable_irq();
        if ex.disable_fiq_on_entry() { self.cpsr.disable_fiq(); }
        self.gpr[Arm7Tdmi::PC] = ex.vector_address() as i32;
    }

    /// Swaps the banked registers R13/R14 (and R8..R12 for FIQ)
    /// when changing into a mode with a different register bank.
    pub(crate) fn bank_switch(&mut self, new_mode: Mode) {
        if new_mode.bank_index() == self.mode.bank_index() {
            self.mode = new_mode;
            return;
        }

        // Save banked registers R13, R14.
        let cmi = self.mode.bank_index();
        let nmi = new_mode.bank_index();
        self.gpr_r13_all[cmi] = self.gpr[13];
        self.gpr_r14_all[cmi] = self.gpr[14];
        self.gpr[13] = self.gpr_r13_all[nmi];
        self.gpr[14] = self.gpr_r14_all[nmi];

        // Now the banked registers R8..R12.
        if (new_mode == Mode::FIQ) ^ (self.mode == Mode::FIQ) {
            if new_mode == Mode::FIQ {
                for i in 0..5 { self.gpr_r8_r12_other[i] = self.gpr[i+8]; }
                for i in 0..5 { self.gpr[i+8] = self.gpr_r8_r12_fiq[i]; }
            }
            else {
                for i in 0..5 { self.gpr_r8_r12_fiq[i] = self.gpr[i+8]; }
                for i in 0..5 { self.gpr[i+8] = self.gpr_r8_r12_other[i]; }
            }
        }

        self.mode = new_mode;
    }

    /// Restores CPSR from the current mode's SPSR, switching
    /// register banks if the saved mode differs.
    ///
    /// This is the tail of every exception return.
    pub(crate) fn restore_cpsr_from_spsr(&mut self) {
        let spsr = self.spsr[self.mode.bank_index()];
        let new_mode = spsr.mode();
        self.bank_switch(new_mode);
        self.cpsr = spsr;
        self.state = spsr.state();
    }

    /// Gets the current execution state.
    pub fn state(&self) -> State { self.state }

    /// Gets the current execution mode.
    pub fn mode(&self) -> Mode { self.mode }

    /// Reads a general purpose register of the active bank.
    pub fn reg(&self, i: usize) -> u32 { self.gpr[i & 0xF] as u32 }

    /// Writes a general purpose register of the active bank.
    pub fn set_reg(&mut self, i: usize, data: u32) { self.gpr[i & 0xF] = data as i32; }

    /// Reads the CPSR.
    pub fn cpsr(&self) -> PSR { self.cpsr }

    /// Overrides the CPSR, switching banks if the mode changed.
    ///
    /// Reserved bits are preserved. This is the debugger's entry
    /// point, so it applies the same bank bookkeeping as `MSR`.
    pub fn set_cpsr(&mut self, raw: u32) {
        let mut psr = self.cpsr;
        psr.override_non_reserved(raw);
        self.bank_switch(psr.mode());
        self.cpsr = psr;
        self.state = psr.state();
    }

    /// Reads the current mode's SPSR.
    pub fn spsr(&self) -> PSR { self.spsr[self.mode.bank_index()] }

    /// Overrides the current mode's SPSR.
    pub fn set_spsr(&mut self, raw: u32) {
        let i = self.mode.bank_index();
        self.spsr[i].override_non_reserved(raw);
    }
}


#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use super::*;
    use super::super::super::bus::Bus;
    use super::super::super::irq::IntCon;

    fn test_cpu() -> Arm7Tdmi {
        let intcon = Rc::new(RefCell::new(IntCon::new()));
        let bus = Rc::new(RefCell::new(Bus::new(32 * 1024 * 1024, intcon)));
        Arm7Tdmi::new(bus)
    }

    #[test]
    fn exception_entry_banks_and_masks() {
        let mut cpu = test_cpu();
        cpu.reset(0x40000000);
        cpu.set_cpsr(cpu.cpsr().0 & !(1 << 7)); // Unmask IRQ.
        cpu.set_reg(13, 0x4000F000);
        cpu.set_reg(14, 0x12345678);
        let old_cpsr = cpu.cpsr();

        assert!(cpu.poll_interrupts(true, false));
        assert_eq!(cpu.mode(), Mode::IRQ);
        assert_eq!(cpu.reg(15), 0x18);
        assert_eq!(cpu.reg(14), 0x40000004);
        assert_eq!(cpu.spsr(), old_cpsr);
        assert!(cpu.cpsr().irq_disabled());
        assert!(!cpu.cpsr().fiq_disabled() || old_cpsr.fiq_disabled());

        // Returning restores the Supervisor bank.
        cpu.restore_cpsr_from_spsr();
        assert_eq!(cpu.mode(), Mode::Supervisor);
        assert_eq!(cpu.reg(13), 0x4000F000);
        assert_eq!(cpu.reg(14), 0x12345678);
    }

    #[test]
    fn masked_irq_is_not_taken() {
        let mut cpu = test_cpu();
        cpu.reset(0x40000000);
        assert!(!cpu.poll_interrupts(true, false));
        assert_eq!(cpu.mode(), Mode::Supervisor);
        assert_eq!(cpu.reg(15), 0x40000000);
    }

    #[test]
    fn fiq_beats_irq_and_banks_r8_r12() {
        let mut cpu = test_cpu();
        cpu.reset(0x40000000);
        cpu.set_cpsr(cpu.cpsr().0 & !0xC0); // Unmask both.
        cpu.set_reg(8, 0xAAAA);

        assert!(cpu.poll_interrupts(true, true));
        assert_eq!(cpu.mode(), Mode::FIQ);
        assert_eq!(cpu.reg(15), 0x1C);
        assert_eq!(cpu.reg(8), 0); // FIQ's own R8.
        assert!(cpu.cpsr().fiq_disabled());

        cpu.restore_cpsr_from_spsr();
        assert_eq!(cpu.reg(8), 0xAAAA);
    }
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
