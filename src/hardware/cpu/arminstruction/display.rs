// License below.
//! Implements a disassembler for 32-bit ARM state instructions.
#![warn(missing_docs)]

use std::fmt;
use super::*;
use super::super::arm7tdmi::Arm7Tdmi;
use super::super::arm7tdmi::exec::armbsop::ArmBSOP;

fn reg(i: usize) -> &'static str { Arm7Tdmi::register_name(i) }

impl ArmInstruction {
    fn fmt_shift_operand(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_shift_field_immediate() {
            write!(f, "#{}", self.rotated_immediate())
        } else {
            match self.bsop() {
                ArmBSOP::NOP => write!(f, "{}", reg(self.Rm())),
                bsop         => write!(f, "{}, {}", reg(self.Rm()), bsop),
            }
        }
    }

    fn fmt_addressing(&self, f: &mut fmt::Formatter, offs_is_imm: bool) -> fmt::Result {
        let rn = reg(self.Rn());
        if offs_is_imm {
            let off = if self.opcode() == ArmOpcode::LDR_STR { self.offset12() } else { self.split_offset8() };
            if self.is_pre_indexed() {
                if off == 0 { write!(f, "[{}]", rn) }
                else { write!(f, "[{}, #{}]{}", rn, off, if self.is_auto_incrementing() { "!" } else { "" }) }
            } else {
                write!(f, "[{}], #{}", rn, off)
            }
        } else {
            let sign = if self.is_offset_added() { "" } else { "-" };
            if self.is_pre_indexed() {
                write!(f, "[{}, {}{}]{}", rn, sign, reg(self.Rm()), if self.is_auto_incrementing() { "!" } else { "" })
            } else {
                write!(f, "[{}], {}{}", rn, sign, reg(self.Rm()))
            }
        }
    }
}

impl fmt::Display for ArmInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cond = self.condition().suffix();
        let s = if self.is_setting_flags() { "s" } else { "" };
        write!(f, "{:#010X}\t", self.raw())?;

        match self.opcode() {
            ArmOpcode::BX => write!(f, "bx{}\t{}", cond, reg(self.Rm())),
            ArmOpcode::B_BL => {
                let link = if self.is_branch_with_link() { "l" } else { "" };
                write!(f, "b{}{}\t#{}", link, cond, self.branch_offset())
            },
            ArmOpcode::MUL_MLA => {
                // The manual's Rd sits in the Rn field here.
                if self.is_accumulating() {
                    write!(f, "mla{}{}\t{}, {}, {}, {}", s, cond, reg(self.Rn()), reg(self.Rm()), reg(self.Rs()), reg(self.Rd()))
                } else {
                    write!(f, "mul{}{}\t{}, {}, {}", s, cond, reg(self.Rn()), reg(self.Rm()), reg(self.Rs()))
                }
            },
            ArmOpcode::MULL_MLAL => {
                let u = if self.is_signed() { "s" } else { "u" };
                let op = if self.is_accumulating() { "mlal" } else { "mull" };
                write!(f, "{}{}{}{}\t{}, {}, {}, {}", u, op, s, cond, reg(self.Rd()), reg(self.Rn()), reg(self.Rm()), reg(self.Rs()))
            },
            ArmOpcode::DataProcessing => {
                let op = self.dpop();
                write!(f, "{}{}{}\t", op.name(), if op.is_test() { "" } else { s }, cond)?;
                if op.is_test() { write!(f, "{}, ", reg(self.Rn()))?; }
                else if op.is_move() { write!(f, "{}, ", reg(self.Rd()))?; }
                else { write!(f, "{}, {}, ", reg(self.Rd()), reg(self.Rn()))?; }
                self.fmt_shift_operand(f)
            },
            ArmOpcode::MRS => {
                write!(f, "mrs{}\t{}, {}", cond, reg(self.Rd()), if self.is_accessing_spsr() { "SPSR" } else { "CPSR" })
            },
            ArmOpcode::MSR_Reg => {
                write!(f, "msr{}\t{}, {}", cond, if self.is_accessing_spsr() { "SPSR" } else { "CPSR" }, reg(self.Rm()))
            },
            ArmOpcode::MSR_Flags => {
                write!(f, "msr{}\t{}_flg, ", cond, if self.is_accessing_spsr() { "SPSR" } else { "CPSR" })?;
                if self.is_shift_field_immediate() { write!(f, "#{:#010X}", self.rotated_immediate() as u32) }
                else { write!(f, "{}", reg(self.Rm())) }
            },
            ArmOpcode::LDR_STR => {
                let op = if self.is_load() { "ldr" } else { "str" };
                let b = if self.is_transfering_bytes() { "b" } else { "" };
                write!(f, "{}{}{}\t{}, ", op, cond, b, reg(self.Rd()))?;
                self.fmt_addressing(f, self.is_offset_field_immediate())
            },
            ArmOpcode::LDRH_STRH_Reg | ArmOpcode::LDRH_STRH_Imm => {
                let op = if self.is_load() { "ldr" } else { "str" };
                let kind = match self.ldrh_strh_op() {
                    ArmLdrhStrhOP::UH => "h",
                    ArmLdrhStrhOP::SB => "sb",
                    ArmLdrhStrhOP::SH => "sh",
                    ArmLdrhStrhOP::InvalidSWP => "?",
                };
                write!(f, "{}{}{}\t{}, ", op, cond, kind, reg(self.Rd()))?;
                self.fmt_addressing(f, self.opcode() == ArmOpcode::LDRH_STRH_Imm)
            },
            ArmOpcode::LDM_STM => {
                let op = if self.is_load() { "ldm" } else { "stm" };
                let dir = match (self.is_offset_added(), self.is_pre_indexed()) {
                    (true,  false) => "ia", (true,  true) => "ib",
                    (false, false) => "da", (false, true) => "db",
                };
                write!(f, "{}{}{}\t{}{}, {{", op, cond, dir, reg(self.Rn()),
                       if self.is_auto_incrementing() { "!" } else { "" })?;
                let map = self.register_map();
                let mut first = true;
                for i in 0..16 { if 0 != (map & (1 << i)) {
                    if !first { write!(f, ", ")?; }
                    write!(f, "{}", reg(i))?;
                    first = false;
                }}
                write!(f, "}}{}", if self.is_enforcing_user_mode() { "^" } else { "" })
            },
            ArmOpcode::SWP => {
                let b = if self.is_transfering_bytes() { "b" } else { "" };
                write!(f, "swp{}{}\t{}, {}, [{}]", cond, b, reg(self.Rd()), reg(self.Rm()), reg(self.Rn()))
            },
            ArmOpcode::SWI => write!(f, "swi{}\t#{:#08X}", cond, self.comment()),
            ArmOpcode::CDP     => write!(f, "cdp{}\t<coprocessor>", cond),
            ArmOpcode::MRC_MCR => write!(f, "{}{}\t<coprocessor>", if self.is_load() { "mrc" } else { "mcr" }, cond),
            ArmOpcode::LDC_STC => write!(f, "{}{}\t<coprocessor>", if self.is_load() { "ldc" } else { "stc" }, cond),
            ArmOpcode::Unknown => write!(f, "<unknown>"),
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
