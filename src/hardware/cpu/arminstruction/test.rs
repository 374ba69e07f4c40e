// License below.
#![allow(missing_docs)]

use super::{ArmInstruction, ArmOpcode};

const CLASSIFICATION: &[(u32, ArmOpcode)] = &[
    (0xE12FFF13, ArmOpcode::BX),
    (0xEA000001, ArmOpcode::B_BL),
    (0xEBFFFFFD, ArmOpcode::B_BL),
    (0xE0010392, ArmOpcode::MUL_MLA),
    (0xE0210392, ArmOpcode::MUL_MLA),
    (0xE0832194, ArmOpcode::MULL_MLAL),
    (0xE0E32194, ArmOpcode::MULL_MLAL),
    (0xE10F1000, ArmOpcode::MRS),
    (0xE14F1000, ArmOpcode::MRS),
    (0xE129F002, ArmOpcode::MSR_Reg),
    (0xE328F20F, ArmOpcode::MSR_Flags),
    (0xE3A00101, ArmOpcode::DataProcessing),
    (0xE0423003, ArmOpcode::DataProcessing),
    (0xE1A02233, ArmOpcode::DataProcessing),
    (0xE5801000, ArmOpcode::LDR_STR),
    (0xE4D13001, ArmOpcode::LDR_STR),
    (0xE19030B2, ArmOpcode::LDRH_STRH_Reg),
    (0xE1D030B2, ArmOpcode::LDRH_STRH_Imm),
    (0xE8BD8000, ArmOpcode::LDM_STM),
    (0xE92D4010, ArmOpcode::LDM_STM),
    (0xE1010092, ArmOpcode::SWP),
    (0xEF000042, ArmOpcode::SWI),
    (0xE6000010, ArmOpcode::Unknown),
    (0xEE000000, ArmOpcode::CDP),
    (0xEE000010, ArmOpcode::MRC_MCR),
    (0xEC000000, ArmOpcode::LDC_STC),
];

#[test]
fn opcode_classification() {
    for &(raw, op) in CLASSIFICATION {
        let inst = ArmInstruction::decode(raw).unwrap();
        assert_eq!(inst.opcode(), op, "misclassified {:#010X}", raw);
    }
}

#[test]
fn field_extraction() {
    // str r1, [r0]
    let inst = ArmInstruction::decode(0xE5801000).unwrap();
    assert_eq!(inst.Rn(), 0);
    assert_eq!(inst.Rd(), 1);
    assert!(!inst.is_load());
    assert!(inst.is_pre_indexed());

    // mov r0, #0x40000000
    let inst = ArmInstruction::decode(0xE3A00101).unwrap();
    assert_eq!(inst.rotated_immediate() as u32, 0x40000000);

    // b #-8 (branch-to-self)
    let inst = ArmInstruction::decode(0xEAFFFFFE).unwrap();
    assert_eq!(inst.branch_offset(), -8);

    // ldmfd sp!, {pc}
    let inst = ArmInstruction::decode(0xE8BD8000).unwrap();
    assert_eq!(inst.Rn(), 13);
    assert_eq!(inst.register_map(), 0x8000);
    assert!(inst.is_auto_incrementing());
}

#[test]
fn disassembly_spot_checks() {
    let dis = |raw: u32| format!("{}", ArmInstruction::decode(raw).unwrap());
    assert_eq!(dis(0xE12FFF13), "0xE12FFF13\tbx\tR3");
    assert_eq!(dis(0xE3A00101), "0xE3A00101\tmov\tR0, #1073741824");
    assert_eq!(dis(0xEF000042), "0xEF000042\tswi\t#0x000042");
    assert_eq!(dis(0x112FFF11), "0x112FFF11\tbxne\tR1");
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
