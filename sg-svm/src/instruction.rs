//! SVM instruction stream model: a flat sequence of 4-word instructions,
//! one enum-of-structs variant per opcode, mirroring the fixed
//! `Int4`-per-node encoding the original compiler emits.

use sg_graph::{MathOp, MixOp, VectorMathOp};

use crate::flags::CompiledFlags;
use crate::stack::StackOffset;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderType {
    Surface,
    Volume,
    Displacement,
    Bump,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction {
    Math {
        op: MathOp,
        in1: StackOffset,
        in2: StackOffset,
        out: StackOffset,
    },
    VectorMath {
        op: VectorMathOp,
        in1: StackOffset,
        in2: StackOffset,
        out: StackOffset,
    },
    Mix {
        op: MixOp,
        fac: StackOffset,
        in1: StackOffset,
        in2: StackOffset,
        out: StackOffset,
    },
    Value {
        value: StackOffset,
        out: StackOffset,
    },
    /// Emits a weighted closure (BSDF/Emission/Background/...) onto the
    /// shading-point closure accumulator.
    Closure {
        kind_tag: u32,
        weight: StackOffset,
    },
    /// Conditional skip used by `generate_multi_closure`: jump forward
    /// `offset` instructions if the value at `cond` is exactly zero.
    JumpIfZero { cond: StackOffset, offset: i32 },
    /// Jump forward if the value at `cond` is exactly one.
    JumpIfOne { cond: StackOffset, offset: i32 },
    Bump {
        height: StackOffset,
        sample_x: StackOffset,
        sample_y: StackOffset,
        strength: StackOffset,
        distance: StackOffset,
        normal_in: StackOffset,
        normal_out: StackOffset,
    },
    SetNormal {
        direction: StackOffset,
        out: StackOffset,
    },
    Gamma {
        color: StackOffset,
        gamma: StackOffset,
        out: StackOffset,
    },
    Invert {
        fac: StackOffset,
        color: StackOffset,
        out: StackOffset,
    },
    BrightContrast {
        color: StackOffset,
        bright: StackOffset,
        contrast: StackOffset,
        out: StackOffset,
    },
    RgbToBw {
        color: StackOffset,
        out: StackOffset,
    },
    /// Packs three scalar slots into one float3-width slot (CombineXyz,
    /// CombineRgb, CombineHsv).
    Combine {
        a: StackOffset,
        b: StackOffset,
        c: StackOffset,
        out: StackOffset,
    },
    /// Unpacks one float3-width slot into three scalar slots (SeparateXyz,
    /// SeparateRgb, SeparateHsv).
    Separate {
        vector: StackOffset,
        a_out: StackOffset,
        b_out: StackOffset,
        c_out: StackOffset,
    },
    Blackbody {
        temperature: StackOffset,
        out: StackOffset,
    },
    End,
}

impl Instruction {
    /// Packs the instruction into the 4-word `Int4`-analogue the device
    /// array format uses. Opcodes are assigned densely by declaration order
    /// here; a real device backend would define a stable numeric ABI, which
    /// is out of scope for this compiler core (see spec's External
    /// Interfaces: "no persisted state").
    pub fn encode(&self) -> [i32; 4] {
        match *self {
            Instruction::Math { in1, in2, out, .. } => [0, in1.0 as i32, in2.0 as i32, out.0 as i32],
            Instruction::VectorMath { in1, in2, out, .. } => [1, in1.0 as i32, in2.0 as i32, out.0 as i32],
            Instruction::Mix { fac, in1, in2, out, .. } => {
                [2, fac.0 as i32, (in1.0 as i32) | ((in2.0 as i32) << 16), out.0 as i32]
            }
            Instruction::Value { value, out } => [3, value.0 as i32, 0, out.0 as i32],
            Instruction::Closure { kind_tag, weight } => [4, kind_tag as i32, weight.0 as i32, 0],
            Instruction::JumpIfZero { cond, offset } => [5, cond.0 as i32, offset, 0],
            Instruction::JumpIfOne { cond, offset } => [6, cond.0 as i32, offset, 0],
            Instruction::Bump {
                height,
                sample_x,
                sample_y,
                strength,
                distance,
                normal_in,
                ..
            } => [
                7,
                (height.0 as i32) | ((sample_x.0 as i32) << 16),
                (sample_y.0 as i32) | ((strength.0 as i32) << 16),
                (distance.0 as i32) | ((normal_in.0 as i32) << 16),
            ],
            Instruction::SetNormal { direction, out } => [8, direction.0 as i32, out.0 as i32, 0],
            Instruction::Gamma { color, gamma, out } => [9, color.0 as i32, gamma.0 as i32, out.0 as i32],
            Instruction::Invert { fac, color, out } => [10, fac.0 as i32, color.0 as i32, out.0 as i32],
            Instruction::BrightContrast {
                color,
                bright,
                contrast,
                out,
            } => [11, color.0 as i32, (bright.0 as i32) | ((contrast.0 as i32) << 16), out.0 as i32],
            Instruction::RgbToBw { color, out } => [12, color.0 as i32, out.0 as i32, 0],
            Instruction::Combine { a, b, c, out } => {
                [13, (a.0 as i32) | ((b.0 as i32) << 16), c.0 as i32, out.0 as i32]
            }
            Instruction::Separate {
                vector,
                a_out,
                b_out,
                c_out,
            } => [14, vector.0 as i32, (a_out.0 as i32) | ((b_out.0 as i32) << 16), c_out.0 as i32],
            Instruction::Blackbody { temperature, out } => [15, temperature.0 as i32, out.0 as i32, 0],
            Instruction::End => [16, 0, 0, 0],
        }
    }
}

/// A compiled shader program: one instruction stream holding all four
/// shader-type passes back to back, plus the per-pass entry offsets needed
/// to start execution at the right point for a given `ShaderType`.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub entry_points: std::collections::HashMap<ShaderTypeKey, usize>,
    pub flags: CompiledFlags,
}

/// Hashable wrapper since `ShaderType` doesn't need `Hash` anywhere else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderTypeKey(pub u8);

impl From<ShaderType> for ShaderTypeKey {
    fn from(t: ShaderType) -> Self {
        ShaderTypeKey(match t {
            ShaderType::Bump => 0,
            ShaderType::Surface => 1,
            ShaderType::Volume => 2,
            ShaderType::Displacement => 3,
        })
    }
}
