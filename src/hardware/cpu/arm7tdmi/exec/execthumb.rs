// License below.
//! Implements the execution logic of 16-bit THUMB state instructions.
//!
//! Most THUMB formats are compact encodings of ARM semantics, so
//! execution funnels through the same ALU helpers as ARM state,
//! driven by the `ArmDPOP`/`ArmBSOP` opcodes the decoder extracts.
#![warn(missing_docs)]

use super::*;
use super::super::super::thumbinstruction::{ThumbInstruction, ThumbOpcode, HiRegisterOp, ThumbLsOp};

impl Arm7Tdmi {
    /// Immediately executes a single THUMB state instruction.
    pub(crate) fn execute_thumb(&mut self, inst: ThumbInstruction) -> CpuAction {
        match inst.opcode() {
            ThumbOpcode::AddSub              => self.execute_thumb_add_sub(inst),
            ThumbOpcode::MoveShiftedReg      => self.execute_thumb_move_shifted(inst),
            ThumbOpcode::DataProcessingFlags => self.execute_thumb_dp_imm8(inst),
            ThumbOpcode::AluMul              => self.execute_thumb_mul(inst),
            ThumbOpcode::AluOperation        => self.execute_thumb_alu(inst),
            ThumbOpcode::HiRegOpBx           => self.execute_thumb_hireg_bx(inst),
            ThumbOpcode::LdrPcImm            => self.execute_thumb_ldr_pc(inst),
            ThumbOpcode::LdrStrReg           => self.execute_thumb_ldr_str_reg(inst),
            ThumbOpcode::LdrhStrhReg         => self.execute_thumb_ldrh_strh_reg(inst),
            ThumbOpcode::LdrStrImm           => self.execute_thumb_ldr_str_imm(inst),
            ThumbOpcode::LdrhStrhImm         => self.execute_thumb_ldrh_strh_imm(inst),
            ThumbOpcode::LdrStrSpImm         => self.execute_thumb_ldr_str_sp(inst),
            ThumbOpcode::CalcAddrImm         => self.execute_thumb_calc_addr(inst),
            ThumbOpcode::AddSpOffs           => { self.gpr[Arm7Tdmi::SP] = self.gpr[Arm7Tdmi::SP].wrapping_add(inst.sp_offset()); CpuAction::None },
            ThumbOpcode::PushPopRegs         => self.execute_thumb_push_pop(inst),
            ThumbOpcode::LdmStmRegs          => self.execute_thumb_ldm_stm(inst),
            ThumbOpcode::SoftwareInterrupt   => {
                let ret = (self.gpr[Arm7Tdmi::PC] as u32).wrapping_sub(2);
                self.enter_exception(Exception::SoftwareInterrupt, ret);
                CpuAction::FlushPipeline
            },
            ThumbOpcode::BranchConditionOffs => {
                if inst.condition().check(&self.cpsr) {
                    self.gpr[Arm7Tdmi::PC] = self.gpr[Arm7Tdmi::PC].wrapping_add(inst.offs9());
                    CpuAction::FlushPipeline
                } else { CpuAction::None }
            },
            ThumbOpcode::BranchOffs => {
                self.gpr[Arm7Tdmi::PC] = self.gpr[Arm7Tdmi::PC].wrapping_add(inst.offs12());
                CpuAction::FlushPipeline
            },
            ThumbOpcode::BranchLongOffs => self.execute_thumb_branch_long(inst),
        }
    }

    fn execute_thumb_add_sub(&mut self, inst: ThumbInstruction) -> CpuAction {
        let op1 = self.gpr[inst.Rs()];
        let op2 = if inst.is_Rn_immediate() { inst.Rn() as i32 } else { self.gpr[inst.Rn()] };
        let c = self.cpsr.C();
        if let Some(res) = self.alu_data_processing_flags(inst.dpop_AddSub(), op1, op2, c) {
            self.gpr[inst.Rd()] = res;
        }
        CpuAction::None
    }

    fn execute_thumb_move_shifted(&mut self, inst: ThumbInstruction) -> CpuAction {
        let bsop = inst.bsop_MoveShiftedReg();
        let (shifted, carry) = self.alu_barrel_shifter_carry(bsop, self.gpr[inst.Rs()]);
        if let Some(res) = self.alu_data_processing_flags(ArmDPOP::MOV, 0, shifted, carry) {
            self.gpr[inst.Rd()] = res;
        }
        CpuAction::None
    }

    fn execute_thumb_dp_imm8(&mut self, inst: ThumbInstruction) -> CpuAction {
        let op = inst.dpop_DataProcessingFlags();
        let op1 = self.gpr[inst.Rm()];
        let c = self.cpsr.C();
        if let Some(res) = self.alu_data_processing_flags(op, op1, inst.imm8(), c) {
            self.gpr[inst.Rm()] = res;
        }
        CpuAction::None
    }

    fn execute_thumb_mul(&mut self, inst: ThumbInstruction) -> CpuAction {
        let res = self.gpr[inst.Rd()].wrapping_mul(self.gpr[inst.Rs()]);
        self.gpr[inst.Rd()] = res;
        // C and V stay untouched, as after ARM state multiplies.
        self.cpsr.set_N(res < 0);
        self.cpsr.set_Z(res == 0);
        CpuAction::None
    }

    fn execute_thumb_alu(&mut self, inst: ThumbInstruction) -> CpuAction {
        let (dpop, bsop) = inst.dpop_bsop_AluOperation();
        match bsop {
            ArmBSOP::NOP => {
                // NEG encodes as RSB with a zero second operand.
                let (op1, op2) = if dpop == ArmDPOP::RSB { (self.gpr[inst.Rs()], 0) }
                                 else { (self.gpr[inst.Rd()], self.gpr[inst.Rs()]) };
                let c = self.cpsr.C();
                if let Some(res) = self.alu_data_processing_flags(dpop, op1, op2, c) {
                    self.gpr[inst.Rd()] = res;
                }
            },
            _ => {
                let (shifted, carry) = self.alu_barrel_shifter_carry(bsop, self.gpr[inst.Rd()]);
                if let Some(res) = self.alu_data_processing_flags(ArmDPOP::MOV, 0, shifted, carry) {
                    self.gpr[inst.Rd()] = res;
                }
            },
        }
        CpuAction::None
    }

    fn execute_thumb_hireg_bx(&mut self, inst: ThumbInstruction) -> CpuAction {
        match inst.op_HiRegOpBx() {
            HiRegisterOp::AddNoFlags => {
                let hd = inst.Hd();
                let res = self.gpr[hd].wrapping_add(self.gpr[inst.Hs()]);
                self.gpr[hd] = res;
                if hd == Arm7Tdmi::PC {
                    self.gpr[Arm7Tdmi::PC] &= !0b1;
                    return CpuAction::FlushPipeline;
                }
            },
            HiRegisterOp::CmpFlags => {
                let op1 = self.gpr[inst.Hd()];
                let op2 = self.gpr[inst.Hs()];
                let c = self.cpsr.C();
                let _ = self.alu_data_processing_flags(ArmDPOP::CMP, op1, op2, c);
            },
            HiRegisterOp::MovNoFlags => {
                let hd = inst.Hd();
                self.gpr[hd] = self.gpr[inst.Hs()];
                if hd == Arm7Tdmi::PC {
                    self.gpr[Arm7Tdmi::PC] &= !0b1;
                    return CpuAction::FlushPipeline;
                }
            },
            HiRegisterOp::BxRsHs => {
                let addr = self.gpr[inst.Hs()] as u32;
                self.state = if (addr & 0b1) == 0 { State::ARM } else { State::THUMB };
                self.cpsr.set_state(self.state);
                self.gpr[Arm7Tdmi::PC] = (addr & !0b1) as i32;
                return CpuAction::FlushPipeline;
            },
        }
        CpuAction::None
    }

    fn execute_thumb_ldr_pc(&mut self, inst: ThumbInstruction) -> CpuAction {
        let base = (self.gpr[Arm7Tdmi::PC] as u32) & !0b11;
        let addr = base.wrapping_add(inst.imm10() as u32);
        self.gpr[inst.Rm()] = self.bus.borrow_mut().read32(addr) as i32;
        CpuAction::None
    }

    fn execute_thumb_ldr_str_reg(&mut self, inst: ThumbInstruction) -> CpuAction {
        let addr = (self.gpr[inst.Rs()] as u32).wrapping_add(self.gpr[inst.Rn()] as u32);
        if inst.is_load() {
            self.gpr[inst.Rd()] = if inst.is_transfering_bytes() {
                self.bus.borrow_mut().read8(addr) as i32
            } else {
                self.bus.borrow_mut().read32(addr) as i32
            };
        } else {
            let data = self.gpr[inst.Rd()] as u32;
            if inst.is_transfering_bytes() { self.bus.borrow_mut().write8(addr, data); }
            else                           { self.bus.borrow_mut().write32(addr, data); }
        }
        CpuAction::None
    }

    fn execute_thumb_ldrh_strh_reg(&mut self, inst: ThumbInstruction) -> CpuAction {
        let addr = (self.gpr[inst.Rs()] as u32).wrapping_add(self.gpr[inst.Rn()] as u32);
        match inst.op_LdrhStrhReg() {
            ThumbLsOp::STRH => { let v = self.gpr[inst.Rd()] as u32; self.bus.borrow_mut().write16(addr, v); },
            ThumbLsOp::LDSB => { self.gpr[inst.Rd()] = self.bus.borrow_mut().read8(addr) as u8 as i8 as i32; },
            ThumbLsOp::LDRH => { self.gpr[inst.Rd()] = self.bus.borrow_mut().read16(addr) as i32; },
            ThumbLsOp::LDSH => { self.gpr[inst.Rd()] = self.bus.borrow_mut().read16(addr) as u16 as i16 as i32; },
        }
        CpuAction::None
    }

    fn execute_thumb_ldr_str_imm(&mut self, inst: ThumbInstruction) -> CpuAction {
        let bytes = inst.is_transfering_bytes_imm();
        let offs = if bytes { inst.imm5() } else { inst.imm7() };
        let addr = (self.gpr[inst.Rs()] as u32).wrapping_add(offs as u32);
        if inst.is_load() {
            self.gpr[inst.Rd()] = if bytes { self.bus.borrow_mut().read8(addr) as i32 }
                                  else     { self.bus.borrow_mut().read32(addr) as i32 };
        } else {
            let data = self.gpr[inst.Rd()] as u32;
            if bytes { self.bus.borrow_mut().write8(addr, data); }
            else     { self.bus.borrow_mut().write32(addr, data); }
        }
        CpuAction::None
    }

    fn execute_thumb_ldrh_strh_imm(&mut self, inst: ThumbInstruction) -> CpuAction {
        let addr = (self.gpr[inst.Rs()] as u32).wrapping_add(inst.imm6() as u32);
        if inst.is_load() {
            self.gpr[inst.Rd()] = self.bus.borrow_mut().read16(addr) as i32;
        } else {
            let data = self.gpr[inst.Rd()] as u32;
            self.bus.borrow_mut().write16(addr, data);
        }
        CpuAction::None
    }

    fn execute_thumb_ldr_str_sp(&mut self, inst: ThumbInstruction) -> CpuAction {
        let addr = (self.gpr[Arm7Tdmi::SP] as u32).wrapping_add(inst.imm10() as u32);
        if inst.is_load() {
            self.gpr[inst.Rm()] = self.bus.borrow_mut().read32(addr) as i32;
        } else {
            let data = self.gpr[inst.Rm()] as u32;
            self.bus.borrow_mut().write32(addr, data);
        }
        CpuAction::None
    }

    fn execute_thumb_calc_addr(&mut self, inst: ThumbInstruction) -> CpuAction {
        let base = if inst.is_base_SP() { self.gpr[Arm7Tdmi::SP] as u32 }
                   else { (self.gpr[Arm7Tdmi::PC] as u32) & !0b11 };
        self.gpr[inst.Rm()] = base.wrapping_add(inst.imm10() as u32) as i32;
        CpuAction::None
    }

    fn execute_thumb_push_pop(&mut self, inst: ThumbInstruction) -> CpuAction {
        let list = inst.register_list();
        let extra = inst.is_storing_LR_loading_PC();
        let bytes = 4 * ((list.count_ones() as u32) + (extra as u32));

        if inst.is_load() {
            // POP: ascending from SP.
            let mut addr = self.gpr[Arm7Tdmi::SP] as u32;
            for i in 0_usize..8 { if 0 != (list & (1 << i)) {
                self.gpr[i] = self.bus.borrow_mut().read32(addr) as i32;
                addr = addr.wrapping_add(4);
            }}
            let mut action = CpuAction::None;
            if extra {
                let v = self.bus.borrow_mut().read32(addr);
                addr = addr.wrapping_add(4);
                self.gpr[Arm7Tdmi::PC] = (v & !0b1) as i32;
                action = CpuAction::FlushPipeline;
            }
            self.gpr[Arm7Tdmi::SP] = addr as i32;
            action
        } else {
            // PUSH: full descending.
            let mut addr = (self.gpr[Arm7Tdmi::SP] as u32).wrapping_sub(bytes);
            self.gpr[Arm7Tdmi::SP] = addr as i32;
            for i in 0_usize..8 { if 0 != (list & (1 << i)) {
                let v = self.gpr[i] as u32;
                self.bus.borrow_mut().write32(addr, v);
                addr = addr.wrapping_add(4);
            }}
            if extra {
                let v = self.gpr[Arm7Tdmi::LR] as u32;
                self.bus.borrow_mut().write32(addr, v);
            }
            CpuAction::None
        }
    }

    fn execute_thumb_ldm_stm(&mut self, inst: ThumbInstruction) -> CpuAction {
        let list = inst.register_list();
        if list == 0 {
            warn!("THUMB LDM/STM with an empty register list.");
            return CpuAction::None;
        }
        let rb = inst.Rm();
        let mut addr = self.gpr[rb] as u32;

        // Write back Rb first; a loaded Rb wins.
        self.gpr[rb] = addr.wrapping_add(4 * list.count_ones()) as i32;

        for i in 0_usize..8 { if 0 != (list & (1 << i)) {
            if inst.is_load() {
                self.gpr[i] = self.bus.borrow_mut().read32(addr) as i32;
            } else {
                let v = self.gpr[i] as u32;
                self.bus.borrow_mut().write32(addr, v);
            }
            addr = addr.wrapping_add(4);
        }}
        CpuAction::None
    }

    fn execute_thumb_branch_long(&mut self, inst: ThumbInstruction) -> CpuAction {
        if inst.is_low_offset_and_branch() {
            // Second half: jump and write the return address.
            let target = (self.gpr[Arm7Tdmi::LR] as u32).wrapping_add((inst.long_offs_part() << 1) as u32);
            let ret = ((self.gpr[Arm7Tdmi::PC] as u32).wrapping_sub(2)) | 0b1;
            self.gpr[Arm7Tdmi::LR] = ret as i32;
            self.gpr[Arm7Tdmi::PC] = (target & !0b1) as i32;
            CpuAction::FlushPipeline
        } else {
            // First half: latch the upper offset bits into LR.
            let upper = ((inst.long_offs_part() << 21) >> 21) << 12;
            self.gpr[Arm7Tdmi::LR] = self.gpr[Arm7Tdmi::PC].wrapping_add(upper);
            CpuAction::None
        }
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
