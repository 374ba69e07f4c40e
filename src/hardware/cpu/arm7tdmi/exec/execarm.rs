// License below.
//! Implements the execution logic of 32-bit ARM state instructions.
#![warn(missing_docs)]

use super::*;
use super::super::super::arminstruction::{ArmInstruction, ArmOpcode, ArmLdrhStrhOP};

impl Arm7Tdmi {
    /// Immediately executes a single ARM state instruction
    /// whose condition check already passed.
    pub(crate) fn execute_arm(&mut self, inst: ArmInstruction) -> CpuAction {
        match inst.opcode() {
            ArmOpcode::BX             => self.execute_bx(inst),
            ArmOpcode::B_BL           => self.execute_b_bl(inst),
            ArmOpcode::MUL_MLA        => self.execute_mul_mla(inst),
            ArmOpcode::MULL_MLAL      => self.execute_mull_mlal(inst),
            ArmOpcode::DataProcessing => self.execute_data_processing(inst),
            ArmOpcode::MRS            => self.execute_mrs(inst),
            ArmOpcode::MSR_Reg        => self.execute_msr_reg(inst),
            ArmOpcode::MSR_Flags      => self.execute_msr_flags(inst),
            ArmOpcode::LDR_STR        => self.execute_ldr_str(inst),
            ArmOpcode::LDRH_STRH_Reg  => self.execute_ldrh_strh(inst, false),
            ArmOpcode::LDRH_STRH_Imm  => self.execute_ldrh_strh(inst, true),
            ArmOpcode::LDM_STM        => self.execute_ldm_stm(inst),
            ArmOpcode::SWP            => self.execute_swp(inst),
            ArmOpcode::SWI            => self.execute_swi(inst),

            // The PP5020's ARM7TDMI has no coprocessors attached,
            // so every coprocessor encoding traps as undefined.
            ArmOpcode::CDP     |
            ArmOpcode::MRC_MCR |
            ArmOpcode::LDC_STC |
            ArmOpcode::Unknown => self.execute_undefined(inst),
        }
    }

    fn execute_bx(&mut self, inst: ArmInstruction) -> CpuAction {
        let rm = inst.Rm();
        if rm == Arm7Tdmi::PC { warn!("Executing `bx PC`!"); }
        let addr = self.gpr[rm] as u32;
        self.state = if (addr & 0b1) == 0 { State::ARM } else { State::THUMB };
        self.cpsr.set_state(self.state);
        self.gpr[Arm7Tdmi::PC] = (addr & !0b1) as i32;
        CpuAction::FlushPipeline
    }

    fn execute_b_bl(&mut self, inst: ArmInstruction) -> CpuAction {
        if inst.is_branch_with_link() { self.gpr[Arm7Tdmi::LR] = self.gpr[Arm7Tdmi::PC].wrapping_sub(4); }
        self.gpr[Arm7Tdmi::PC] = self.gpr[Arm7Tdmi::PC].wrapping_add(inst.branch_offset());
        CpuAction::FlushPipeline
    }

    fn execute_mul_mla(&mut self, inst: ArmInstruction) -> CpuAction {
        // The manual's Rd sits in the Rn field here.
        let mut res = self.gpr[inst.Rs()].wrapping_mul(self.gpr[inst.Rm()]);
        if inst.is_accumulating() { res = res.wrapping_add(self.gpr[inst.Rd()]); }
        self.gpr[inst.Rn()] = res;
        if inst.is_setting_flags() {
            // C and V are architecturally meaningless after a
            // multiply; they stay untouched here.
            self.cpsr.set_N(res < 0);
            self.cpsr.set_Z(res == 0);
        }
        CpuAction::None
    }

    fn execute_mull_mlal(&mut self, inst: ArmInstruction) -> CpuAction {
        let mut res: u64 = if inst.is_signed() {
            (self.gpr[inst.Rs()] as i64).wrapping_mul(self.gpr[inst.Rm()] as i64) as u64
        } else {
            (self.gpr[inst.Rs()] as u32 as u64).wrapping_mul(self.gpr[inst.Rm()] as u32 as u64)
        };
        if inst.is_accumulating() {
            res = res.wrapping_add(((self.gpr[inst.Rn()] as u32 as u64) << 32) | (self.gpr[inst.Rd()] as u32 as u64));
        }
        self.gpr[inst.Rn()] = (res >> 32) as u32 as i32;
        self.gpr[inst.Rd()] = res as u32 as i32;

        if inst.is_setting_flags() {
            self.cpsr.set_N((res as i64) < 0);
            self.cpsr.set_Z(res == 0);
        }
        CpuAction::None
    }

    fn execute_data_processing(&mut self, inst: ArmInstruction) -> CpuAction {
        let op = inst.dpop();
        let rn = self.gpr[inst.Rn()];
        let rd = inst.Rd();

        if !inst.is_setting_flags() {
            if op.is_test() {
                // A test opcode without the S bit is a hole in the
                // MRS/MSR encoding space; UNPREDICTABLE, so no-op.
                warn!("Flag-less test instruction {:#010X} ignored.", inst.raw());
                return CpuAction::None;
            }
            let op2 = if inst.is_shift_field_immediate() { inst.rotated_immediate() }
                      else { self.alu_barrel_shifter(inst.bsop(), self.gpr[inst.Rm()]) };
            self.gpr[rd] = self.alu_data_processing(op, rn, op2);
            return if rd == Arm7Tdmi::PC {
                self.gpr[Arm7Tdmi::PC] &= !0b11;
                CpuAction::FlushPipeline
            } else {
                CpuAction::None
            };
        }

        let (op2, shift_carry) = if inst.is_shift_field_immediate() {
            inst.rotated_immediate_with_carry(self.cpsr.C())
        } else {
            self.alu_barrel_shifter_carry(inst.bsop(), self.gpr[inst.Rm()])
        };

        if rd == Arm7Tdmi::PC && !op.is_test() {
            // S with Rd = PC is the mode return idiom: the result
            // goes to PC and CPSR comes back from SPSR instead of
            // the flags being recomputed.
            let res = self.alu_data_processing(op, rn, op2);
            if self.mode == Mode::User || self.mode == Mode::System {
                warn!("Flag-setting PC write without an SPSR; CPSR unchanged.");
            } else {
                self.restore_cpsr_from_spsr();
            }
            let mask = if self.state == State::THUMB { !0b1 } else { !0b11 };
            self.gpr[Arm7Tdmi::PC] = res & mask;
            return CpuAction::FlushPipeline;
        }

        if let Some(res) = self.alu_data_processing_flags(op, rn, op2, shift_carry) {
            self.gpr[rd] = res;
        }
        CpuAction::None
    }

    fn execute_mrs(&mut self, inst: ArmInstruction) -> CpuAction {
        self.gpr[inst.Rd()] = if inst.is_accessing_spsr() {
            if self.mode == Mode::User || self.mode == Mode::System {
                warn!("{} mode has no SPSR; MRS reads CPSR.", self.mode);
                self.cpsr.0 as i32
            } else {
                self.spsr[self.mode.bank_index()].0 as i32
            }
        } else {
            self.cpsr.0 as i32
        };
        CpuAction::None
    }

    fn execute_msr_reg(&mut self, inst: ArmInstruction) -> CpuAction {
        let val = self.gpr[inst.Rm()] as u32;
        if inst.is_accessing_spsr() {
            if self.mode == Mode::User || self.mode == Mode::System {
                warn!("{} mode has no SPSR; MSR dropped.", self.mode);
            } else {
                let i = self.mode.bank_index();
                self.spsr[i].override_non_reserved(val);
            }
        } else if self.mode == Mode::User {
            // User mode can only set the flag bits of CPSR.
            self.cpsr.override_flags(val);
        } else {
            let old_state = self.cpsr.state();
            let mut psr = self.cpsr;
            psr.override_non_reserved(val);
            self.bank_switch(psr.mode());
            self.cpsr = psr;
            self.state = psr.state();
            if psr.state() != old_state { warn!("MSR changed the T bit!"); }
        }
        CpuAction::None
    }

    fn execute_msr_flags(&mut self, inst: ArmInstruction) -> CpuAction {
        let op = if inst.is_shift_field_immediate() { inst.rotated_immediate() as u32 }
                 else { self.gpr[inst.Rm()] as u32 };
        if inst.is_accessing_spsr() {
            if self.mode == Mode::User || self.mode == Mode::System {
                warn!("{} mode has no SPSR; MSR dropped.", self.mode);
            } else {
                let i = self.mode.bank_index();
                self.spsr[i].override_flags(op);
            }
        } else {
            self.cpsr.override_flags(op);
        }
        CpuAction::None
    }

    fn execute_ldr_str(&mut self, inst: ArmInstruction) -> CpuAction {
        let base = self.gpr[inst.Rn()] as u32;
        let offs = if inst.is_offset_field_immediate() { inst.offset12() }
                   else {
                       let shifted = self.alu_barrel_shifter(inst.bsop(), self.gpr[inst.Rm()]);
                       if inst.is_offset_added() { shifted } else { shifted.wrapping_neg() }
                   };
        let addr = if inst.is_pre_indexed() { base.wrapping_add(offs as u32) } else { base };
        let written_back = base.wrapping_add(offs as u32) as i32;

        if inst.is_load() {
            let data = if inst.is_transfering_bytes() {
                self.bus.borrow_mut().read8(addr) as i32
            } else {
                self.bus.borrow_mut().read32(addr) as i32
            };
            // Write back first; a loaded Rd wins over the write-back.
            if !inst.is_pre_indexed()           { self.gpr[inst.Rn()] = written_back; }
            else if inst.is_auto_incrementing() { self.gpr[inst.Rn()] = addr as i32; }
            self.gpr[inst.Rd()] = data;
            if inst.Rd() == Arm7Tdmi::PC {
                self.gpr[Arm7Tdmi::PC] &= !0b11;
                return CpuAction::FlushPipeline;
            }
        } else {
            let data = self.gpr[inst.Rd()] as u32;
            if inst.is_transfering_bytes() { self.bus.borrow_mut().write8(addr, data); }
            else                           { self.bus.borrow_mut().write32(addr, data); }
            if !inst.is_pre_indexed()           { self.gpr[inst.Rn()] = written_back; }
            else if inst.is_auto_incrementing() { self.gpr[inst.Rn()] = addr as i32; }
        }
        CpuAction::None
    }

    fn execute_ldrh_strh(&mut self, inst: ArmInstruction, imm: bool) -> CpuAction {
        let base = self.gpr[inst.Rn()] as u32;
        let offs = if imm { inst.split_offset8() }
                   else if inst.is_offset_added() { self.gpr[inst.Rm()] }
                   else { self.gpr[inst.Rm()].wrapping_neg() };
        let addr = if inst.is_pre_indexed() { base.wrapping_add(offs as u32) } else { base };
        let written_back = base.wrapping_add(offs as u32) as i32;

        if inst.is_load() {
            let data = match inst.ldrh_strh_op() {
                ArmLdrhStrhOP::UH => self.bus.borrow_mut().read16(addr) as i32,
                ArmLdrhStrhOP::SB => self.bus.borrow_mut().read8(addr) as u8 as i8 as i32,
                ArmLdrhStrhOP::SH => self.bus.borrow_mut().read16(addr) as u16 as i16 as i32,
                ArmLdrhStrhOP::InvalidSWP => { warn!("LDRH that should be SWP."); 0 },
            };
            if !inst.is_pre_indexed()           { self.gpr[inst.Rn()] = written_back; }
            else if inst.is_auto_incrementing() { self.gpr[inst.Rn()] = addr as i32; }
            self.gpr[inst.Rd()] = data;
        } else {
            let data = self.gpr[inst.Rd()] as u32;
            match inst.ldrh_strh_op() {
                ArmLdrhStrhOP::UH => self.bus.borrow_mut().write16(addr, data),
                ArmLdrhStrhOP::SB => { warn!("Signed store."); self.bus.borrow_mut().write8(addr, data); },
                ArmLdrhStrhOP::SH => { warn!("Signed store."); self.bus.borrow_mut().write16(addr, data); },
                ArmLdrhStrhOP::InvalidSWP => warn!("STRH that should be SWP."),
            }
            if !inst.is_pre_indexed()           { self.gpr[inst.Rn()] = written_back; }
            else if inst.is_auto_incrementing() { self.gpr[inst.Rn()] = addr as i32; }
        }
        CpuAction::None
    }

    fn execute_ldm_stm(&mut self, inst: ArmInstruction) -> CpuAction {
        let rmap = inst.register_map();
        if rmap == 0 {
            // UNPREDICTABLE on hardware; a no-op here.
            warn!("LDM/STM with an empty register list.");
            return CpuAction::None;
        }

        let base = self.gpr[inst.Rn()] as u32;
        let bytes = 4 * rmap.count_ones();
        let has_pc = 0 != (rmap & 0x8000);
        let user_bank = inst.is_enforcing_user_mode();
        let offs = if inst.is_pre_indexed() == inst.is_offset_added() { (4_u32, 0_u32) } else { (0_u32, 4_u32) };
        let mut addr = (if inst.is_offset_added() { base } else { base.wrapping_sub(bytes) }) & !0b11;

        // Write back Rn now to avoid special cases with loading Rn.
        if inst.is_auto_incrementing() {
            self.gpr[inst.Rn()] = if inst.is_offset_added() { base.wrapping_add(bytes) as i32 }
                                  else { base.wrapping_sub(bytes) as i32 };
        }

        if user_bank && !(has_pc && inst.is_load()) {
            // S bit without loading PC: transfer the User bank.
            if self.mode == Mode::User || self.mode == Mode::System {
                warn!("User-bank LDM/STM from the User bank itself.");
            }
            self.execute_ldm_stm_user_bank(rmap, addr, offs, inst.is_load());
            return CpuAction::None;
        }

        for i in 0_u32..16 { if 0 != (rmap & (1 << i)) {
            addr = addr.wrapping_add(offs.0);
            if inst.is_load() {
                self.gpr[i as usize] = self.bus.borrow_mut().read32(addr) as i32;
            } else {
                let v = self.gpr[i as usize] as u32;
                self.bus.borrow_mut().write32(addr, v);
            }
            addr = addr.wrapping_add(offs.1);
        }}

        if has_pc && inst.is_load() {
            if user_bank {
                // S bit with a loaded PC: exception return.
                if self.mode == Mode::User || self.mode == Mode::System {
                    warn!("{} mode has no SPSR; CPSR unchanged.", self.mode);
                } else {
                    self.restore_cpsr_from_spsr();
                }
            }
            let mask = if self.state == State::THUMB { !0b1 } else { !0b11 };
            self.gpr[Arm7Tdmi::PC] &= mask;
            return CpuAction::FlushPipeline;
        }
        CpuAction::None
    }

    fn execute_ldm_stm_user_bank(&mut self, rmap: u16, mut addr: u32, offs: (u32, u32), load: bool) {
        for i in 0_usize..16 { if 0 != (rmap & (1 << i)) {
            addr = addr.wrapping_add(offs.0);
            if load {
                let v = self.bus.borrow_mut().read32(addr) as i32;
                self.set_user_reg(i, v);
            } else {
                let v = self.user_reg(i) as u32;
                self.bus.borrow_mut().write32(addr, v);
            }
            addr = addr.wrapping_add(offs.1);
        }}
    }

    fn user_reg(&self, i: usize) -> i32 {
        let user = Mode::User.bank_index();
        match i {
            8..=12 if self.mode == Mode::FIQ => self.gpr_r8_r12_other[i - 8],
            13 if self.mode.bank_index() != user => self.gpr_r13_all[user],
            14 if self.mode.bank_index() != user => self.gpr_r14_all[user],
            _ => self.gpr[i],
        }
    }

    fn set_user_reg(&mut self, i: usize, data: i32) {
        let user = Mode::User.bank_index();
        match i {
            8..=12 if self.mode == Mode::FIQ => self.gpr_r8_r12_other[i - 8] = data,
            13 if self.mode.bank_index() != user => self.gpr_r13_all[user] = data,
            14 if self.mode.bank_index() != user => self.gpr_r14_all[user] = data,
            _ => self.gpr[i] = data,
        }
    }

    fn execute_swp(&mut self, inst: ArmInstruction) -> CpuAction {
        let base = self.gpr[inst.Rn()] as u32;
        if inst.is_transfering_bytes() {
            let temp = self.bus.borrow_mut().read8(base) as i32;
            let v = self.gpr[inst.Rm()] as u32;
            self.bus.borrow_mut().write8(base, v);
            self.gpr[inst.Rd()] = temp;
        } else {
            let temp = self.bus.borrow_mut().read32(base) as i32;
            let v = self.gpr[inst.Rm()] as u32;
            self.bus.borrow_mut().write32(base, v);
            self.gpr[inst.Rd()] = temp;
        }
        CpuAction::None
    }

    fn execute_swi(&mut self, inst: ArmInstruction) -> CpuAction {
        debug!("{}", inst);
        let ret = (self.gpr[Arm7Tdmi::PC] as u32).wrapping_sub(4);
        self.enter_exception(Exception::SoftwareInterrupt, ret);
        CpuAction::FlushPipeline
    }

    fn execute_undefined(&mut self, inst: ArmInstruction) -> CpuAction {
        debug!("{}", inst);
        let ret = (self.gpr[Arm7Tdmi::PC] as u32).wrapping_sub(4);
        self.enter_exception(Exception::UndefinedInstruction, ret);
        CpuAction::FlushPipeline
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
