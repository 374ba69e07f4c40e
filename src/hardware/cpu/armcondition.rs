// License below.
//! Implements the 4-bit condition field of an ARM/THUMB instruction.
#![warn(missing_docs)]

use super::arm7tdmi::PSR;

/// The condition field of an ARM instruction.
#[derive(Debug, PartialEq, Clone, Copy)]
#[repr(u8)]
pub enum ArmCondition {
    #[doc = "Z set. EQual."]                                       EQ = 0b0000,
    #[doc = "Z clear. Not Equal."]                                 NE = 0b0001,
    #[doc = "C set. Unsigned Higher or Same."]                     HS = 0b0010,
    #[doc = "C clear. Unsigned LOwer."]                            LO = 0b0011,
    #[doc = "N set. MInus, i.e. negative."]                        MI = 0b0100,
    #[doc = "N clear. PLus, i.e. positive or zero."]               PL = 0b0101,
    #[doc = "V Set. Overflow."]                                    VS = 0b0110,
    #[doc = "V Clear. No Overflow."]                               VC = 0b0111,
    #[doc = "C set and Z clear. Unsigned HIgher."]                 HI = 0b1000,
    #[doc = "C clear or Z set. Unsigned Lower or Same."]           LS = 0b1001,
    #[doc = "N equals V. Greater than or Equal to."]               GE = 0b1010,
    #[doc = "N distinct from V. Less Than."]                       LT = 0b1011,
    #[doc = "Z clear and N equals V. Greater Than."]               GT = 0b1100,
    #[doc = "Z set or N distinct from V.  Less than or Equal to."] LE = 0b1101,
    #[doc = "ALways execute this instruction, i.e. no condition."] AL = 0b1110,
    #[doc = "Reserved. Never executes on ARM7TDMI."]               NV = 0b1111,
}

impl ArmCondition {
    /// Evaluates the condition field depending on the CPSR's state.
    ///
    /// The reserved `NV` condition is UNPREDICTABLE on this core.
    /// Real PP5020 firmware never emits it; it evaluates to "do
    /// not execute" here so a stray encoding cannot escalate into
    /// a host error.
    ///
    /// # Params
    /// - `cpsr`: The CPSR to inspect.
    ///
    /// # Returns
    /// `true` if the corresponding instruction should be executed.
    pub fn check(self, cpsr: &PSR) -> bool {
        match self {
            ArmCondition::EQ =>  cpsr.Z(),
            ArmCondition::NE => !cpsr.Z(),
            ArmCondition::HS =>  cpsr.C(),
            ArmCondition::LO => !cpsr.C(),
            ArmCondition::MI =>  cpsr.N(),
            ArmCondition::PL => !cpsr.N(),
            ArmCondition::VS =>  cpsr.V(),
            ArmCondition::VC => !cpsr.V(),
            ArmCondition::HI =>  cpsr.C() & !cpsr.Z(),
            ArmCondition::LS => !cpsr.C() |  cpsr.Z(),
            ArmCondition::GE =>  cpsr.N() == cpsr.V(),
            ArmCondition::LT =>  cpsr.N() != cpsr.V(),
            ArmCondition::GT => !cpsr.Z() & (cpsr.N() == cpsr.V()),
            ArmCondition::LE =>  cpsr.Z() | (cpsr.N() != cpsr.V()),
            ArmCondition::AL =>  true,
            ArmCondition::NV => { warn!("Reserved condition NV treated as never."); false },
        }
    }

    /// Gets the assembly suffix of the condition.
    pub fn suffix(self) -> &'static str {
        match self {
            ArmCondition::EQ => "eq", ArmCondition::NE => "ne",
            ArmCondition::HS => "hs", ArmCondition::LO => "lo",
            ArmCondition::MI => "mi", ArmCondition::PL => "pl",
            ArmCondition::VS => "vs", ArmCondition::VC => "vc",
            ArmCondition::HI => "hi", ArmCondition::LS => "ls",
            ArmCondition::GE => "ge", ArmCondition::LT => "lt",
            ArmCondition::GT => "gt", ArmCondition::LE => "le",
            ArmCondition::AL => "",   ArmCondition::NV => "nv",
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use super::super::arm7tdmi::PSR;

    #[test]
    fn conditions_follow_the_flags() {
        let mut cpsr = PSR::default();
        cpsr.set_Z(true);
        assert!( ArmCondition::EQ.check(&cpsr));
        assert!(!ArmCondition::NE.check(&cpsr));
        assert!( ArmCondition::LE.check(&cpsr));
        assert!(!ArmCondition::GT.check(&cpsr));
        cpsr.set_Z(false);
        cpsr.set_N(true);
        cpsr.set_V(false);
        assert!( ArmCondition::LT.check(&cpsr));
        assert!(!ArmCondition::GE.check(&cpsr));
        assert!( ArmCondition::AL.check(&cpsr));
        assert!(!ArmCondition::NV.check(&cpsr));
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
