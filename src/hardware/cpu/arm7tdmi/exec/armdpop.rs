// License below.
//! Implements data processing opcodes for the ARM CPU.
#![warn(missing_docs)]

use std::fmt;

/// A data processing opcode.
#[derive(Debug, PartialEq, Clone, Copy)]
#[repr(u8)]
pub enum ArmDPOP {
    #[doc = "Bitwise AND"]                   AND = 0,
    #[doc = "Bitwise XOR"]                   EOR,
    #[doc = "Subtraction"]                   SUB,
    #[doc = "Reverse subtraction"]           RSB,
    #[doc = "Addition"]                      ADD,
    #[doc = "Add with carry"]                ADC,
    #[doc = "Subtract with carry"]           SBC,
    #[doc = "Reverse subtract with carry"]   RSC,
    #[doc = "Test bits by AND"]              TST,
    #[doc = "Test bits by XOR"]              TEQ,
    #[doc = "Compare by subtraction"]        CMP,
    #[doc = "Compare by addition"]           CMN,
    #[doc = "Bitwise OR"]                    ORR,
    #[doc = "Move value"]                    MOV,
    #[doc = "Bit clear, i.e. AND NOT"]       BIC,
    #[doc = "Move negated value"]            MVN,
}

impl ArmDPOP {
    /// Checks whether this is a test opcode.
    ///
    /// Test opcodes do not write any results to `Rd`,
    /// they only update the CPSR flags.
    pub fn is_test(self) -> bool {
        match self {
            ArmDPOP::TST | ArmDPOP::TEQ | ArmDPOP::CMP | ArmDPOP::CMN => true,
            _ => false,
        }
    }

    /// Checks whether this is a logical operation.
    ///
    /// Logical operations take the carry flag from the barrel
    /// shifter; arithmetic ones compute carry and overflow.
    pub fn is_logical(self) -> bool {
        match self {
            ArmDPOP::AND | ArmDPOP::EOR | ArmDPOP::TST | ArmDPOP::TEQ |
            ArmDPOP::ORR | ArmDPOP::MOV | ArmDPOP::BIC | ArmDPOP::MVN => true,
            _ => false,
        }
    }

    /// Checks whether this operation ignores the `Rn` operand.
    pub fn is_move(self) -> bool {
        (self == ArmDPOP::MOV) | (self == ArmDPOP::MVN)
    }

    /// Gets the assembly name of the opcode.
    pub fn name(self) -> &'static str {
        match self {
            ArmDPOP::AND => "and", ArmDPOP::EOR => "eor",
            ArmDPOP::SUB => "sub", ArmDPOP::RSB => "rsb",
            ArmDPOP::ADD => "add", ArmDPOP::ADC => "adc",
            ArmDPOP::SBC => "sbc", ArmDPOP::RSC => "rsc",
            ArmDPOP::TST => "tst", ArmDPOP::TEQ => "teq",
            ArmDPOP::CMP => "cmp", ArmDPOP::CMN => "cmn",
            ArmDPOP::ORR => "orr", ArmDPOP::MOV => "mov",
            ArmDPOP::BIC => "bic", ArmDPOP::MVN => "mvn",
        }
    }
}

impl fmt::Display for ArmDPOP {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
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
