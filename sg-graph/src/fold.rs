//! Constant folding, grounded on `intern/cycles/render/constant_fold.cpp`
//! (read in full). Method names and control flow mirror the original
//! `ConstantFolder` closely; only the ownership model (borrowed graph
//! reference instead of raw pointers) differs.

use sg_types::{Float3, SocketKind, Value};

use crate::graph::ShaderGraph;
use crate::ids::{InputId, NodeId, OutputId};
use crate::nodes::{MathOp, MixOp, NodeKind, VectorMathOp};

fn lerp3(a: Float3, b: Float3, t: f32) -> Float3 {
    Float3::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t, a.z + (b.z - a.z) * t)
}

/// Rec. 709 luma weights, shared by `RgbToBw` and the float3->Float arm of
/// `Convert`.
fn luminance(c: Float3) -> f32 {
    c.x * 0.2126 + c.y * 0.7152 + c.z * 0.0722
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Float3 {
    if s <= 0.0 {
        return Float3::splat(v);
    }
    let h = (h - h.floor()) * 6.0;
    let i = h.floor() as i32;
    let f = h - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i.rem_euclid(6) {
        0 => Float3::new(v, t, p),
        1 => Float3::new(q, v, p),
        2 => Float3::new(p, v, t),
        3 => Float3::new(p, q, v),
        4 => Float3::new(t, p, v),
        _ => Float3::new(v, p, q),
    }
}

fn rgb_to_hsv(c: Float3) -> (f32, f32, f32) {
    let max = c.x.max(c.y).max(c.z);
    let min = c.x.min(c.y).min(c.z);
    let v = max;
    let delta = max - min;
    if delta <= 1e-8 || max <= 0.0 {
        return (0.0, 0.0, v);
    }
    let s = delta / max;
    let mut h = if max == c.x {
        (c.y - c.z) / delta
    } else if max == c.y {
        2.0 + (c.z - c.x) / delta
    } else {
        4.0 + (c.x - c.y) / delta
    };
    h /= 6.0;
    if h < 0.0 {
        h += 1.0;
    }
    (h, s, v)
}

/// Tanner Helland's color-temperature approximation, used to evaluate a
/// `Blackbody` node whose `Temperature` input is an unlinked constant.
fn blackbody_to_rgb(temperature: f32) -> Float3 {
    let t = temperature.clamp(1000.0, 40000.0) / 100.0;
    let red = if t <= 66.0 {
        255.0
    } else {
        (329.698_73 * (t - 60.0).powf(-0.133_204_76)).clamp(0.0, 255.0)
    };
    let green = if t <= 66.0 {
        (99.470_8 * t.ln() - 161.119_57).clamp(0.0, 255.0)
    } else {
        (288.122_17 * (t - 60.0).powf(-0.075_514_85)).clamp(0.0, 255.0)
    };
    let blue = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        (138.517_73 * (t - 10.0).ln() - 305.044_8).clamp(0.0, 255.0)
    };
    Float3::new(red / 255.0, green / 255.0, blue / 255.0)
}

pub struct ConstantFolder<'g> {
    pub graph: &'g mut ShaderGraph,
    pub node: NodeId,
    pub output: OutputId,
}

impl<'g> ConstantFolder<'g> {
    pub fn new(graph: &'g mut ShaderGraph, node: NodeId, output: OutputId) -> Self {
        ConstantFolder { graph, node, output }
    }

    pub fn all_inputs_constant(&self) -> bool {
        self.graph.nodes[self.node]
            .inputs
            .iter()
            .all(|&i| self.graph.inputs[i].link.is_none())
    }

    fn make_constant_value(&mut self, value: Value) {
        log::debug!(
            "folding {}::{:?} to constant",
            self.graph.nodes[self.node].name,
            value
        );
        let links = self.graph.outputs[self.output].links.clone();
        for sock in links {
            self.graph.inputs[sock].default_value = value.clone();
        }
        self.graph.disconnect_output(self.output);
    }

    pub fn make_constant(&mut self, value: f32) {
        self.make_constant_value(Value::Float(value));
    }

    pub fn make_constant3(&mut self, value: Float3) {
        self.make_constant_value(Value::Float3(value));
    }

    pub fn make_constant_clamp(&mut self, value: f32, clamp: bool) {
        self.make_constant(if clamp { value.clamp(0.0, 1.0) } else { value });
    }

    pub fn make_constant_clamp3(&mut self, value: Float3, clamp: bool) {
        self.make_constant3(if clamp { value.saturate() } else { value });
    }

    pub fn make_zero(&mut self) {
        let ty = self.graph.outputs[self.output].socket_type;
        if ty.kind == SocketKind::Float {
            self.make_constant(0.0);
        } else if ty.is_float3() {
            self.make_constant3(Float3::ZERO);
        }
    }

    pub fn make_one(&mut self) {
        let ty = self.graph.outputs[self.output].socket_type;
        if ty.kind == SocketKind::Float {
            self.make_constant(1.0);
        } else if ty.is_float3() {
            self.make_constant3(Float3::ONE);
        }
    }

    /// Reroute every consumer of `self.output` to `new_output` instead.
    pub fn bypass(&mut self, new_output: OutputId) {
        log::debug!(
            "folding {}::* to socket {}",
            self.graph.nodes[self.node].name,
            self.graph.nodes[self.graph.outputs[new_output].parent].name
        );
        let consumers = self.graph.outputs[self.output].links.clone();
        self.graph.disconnect_output(self.output);
        for input in consumers {
            let _ = self.graph.connect(new_output, input);
        }
    }

    pub fn discard(&mut self) {
        log::debug!("discarding closure {}", self.graph.nodes[self.node].name);
        self.graph.disconnect_output(self.output);
    }

    pub fn bypass_or_discard(&mut self, input: InputId) {
        if let Some(link) = self.graph.inputs[input].link {
            self.bypass(link);
        } else {
            self.discard();
        }
    }

    /// Mirrors `try_bypass_or_make_constant` exactly, including its
    /// side-effecting "disconnect the other inputs" fallback when a clamp
    /// prevents a full bypass.
    pub fn try_bypass_or_make_constant(&mut self, input: InputId, clamp: bool) -> bool {
        let out_ty = self.graph.outputs[self.output].socket_type;
        let in_ty = self.graph.inputs[input].socket_type;
        if in_ty.kind != out_ty.kind {
            return false;
        }
        let link = self.graph.inputs[input].link;
        if link.is_none() {
            if in_ty.kind == SocketKind::Float {
                let v = self.graph.inputs[input].default_value.as_float().unwrap_or(0.0);
                self.make_constant_clamp(v, clamp);
                return true;
            } else if in_ty.is_float3() {
                let v = self.graph.inputs[input]
                    .default_value
                    .as_float3()
                    .unwrap_or(Float3::ZERO);
                self.make_constant_clamp3(v, clamp);
                return true;
            }
        } else if !clamp {
            self.bypass(link.unwrap());
            return true;
        } else {
            let others: Vec<InputId> = self.graph.nodes[self.node]
                .inputs
                .iter()
                .copied()
                .filter(|&o| o != input && self.graph.inputs[o].link.is_some())
                .collect();
            for other in others {
                self.graph.disconnect_input(other);
            }
        }
        false
    }

    pub fn is_zero(&self, input: InputId) -> bool {
        let inp = &self.graph.inputs[input];
        if inp.link.is_some() {
            return false;
        }
        match inp.socket_type.kind {
            SocketKind::Float => inp.default_value.as_float() == Some(0.0),
            _ if inp.socket_type.is_float3() => inp.default_value.as_float3() == Some(Float3::ZERO),
            _ => false,
        }
    }

    pub fn is_one(&self, input: InputId) -> bool {
        let inp = &self.graph.inputs[input];
        if inp.link.is_some() {
            return false;
        }
        match inp.socket_type.kind {
            SocketKind::Float => inp.default_value.as_float() == Some(1.0),
            _ if inp.socket_type.is_float3() => inp.default_value.as_float3() == Some(Float3::ONE),
            _ => false,
        }
    }

    fn in_(&self, name: &str) -> InputId {
        self.graph.find_input(self.node, name).unwrap()
    }

    pub fn fold_mix(&mut self, op: MixOp, clamp: bool) {
        let fac_in = self.in_("Fac");
        let color1_in = self.in_("Color1");
        let color2_in = self.in_("Color2");

        let fac = self.graph.inputs[fac_in]
            .default_value
            .as_float()
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        let fac_is_zero = self.graph.inputs[fac_in].link.is_none() && fac == 0.0;
        let fac_is_one = self.graph.inputs[fac_in].link.is_none() && fac == 1.0;

        if fac_is_zero && !matches!(op, MixOp::Light | MixOp::Dodge | MixOp::Burn) {
            if self.try_bypass_or_make_constant(color1_in, clamp) {
                return;
            }
        }

        match op {
            MixOp::Blend => {
                let l1 = self.graph.inputs[color1_in].link;
                let l2 = self.graph.inputs[color2_in].link;
                if l1.is_some() && l1 == l2 {
                    self.try_bypass_or_make_constant(color1_in, clamp);
                    return;
                } else if l1.is_none() && l2.is_none() {
                    let c1 = self.graph.inputs[color1_in].default_value.as_float3().unwrap();
                    let c2 = self.graph.inputs[color2_in].default_value.as_float3().unwrap();
                    if c1 == c2 {
                        self.try_bypass_or_make_constant(color1_in, clamp);
                        return;
                    }
                }
                if fac_is_one {
                    self.try_bypass_or_make_constant(color2_in, clamp);
                }
            }
            MixOp::Add => {
                if self.is_zero(color1_in) && fac_is_one {
                    self.try_bypass_or_make_constant(color2_in, clamp);
                } else if self.is_zero(color2_in) {
                    self.try_bypass_or_make_constant(color1_in, clamp);
                }
            }
            MixOp::Subtract => {
                if self.is_zero(color2_in) {
                    self.try_bypass_or_make_constant(color1_in, clamp);
                } else if self.graph.inputs[color1_in].link.is_some()
                    && self.graph.inputs[color1_in].link == self.graph.inputs[color2_in].link
                    && fac_is_one
                {
                    self.make_zero();
                }
            }
            MixOp::Multiply => {
                if self.is_one(color1_in) && fac_is_one {
                    self.try_bypass_or_make_constant(color2_in, clamp);
                } else if self.is_one(color2_in) {
                    self.try_bypass_or_make_constant(color1_in, clamp);
                } else if self.is_zero(color1_in) {
                    self.make_zero();
                } else if self.is_zero(color2_in) && fac_is_one {
                    self.make_zero();
                }
            }
            MixOp::Divide => {
                if self.is_one(color2_in) {
                    self.try_bypass_or_make_constant(color1_in, clamp);
                } else if self.is_zero(color1_in) {
                    self.make_zero();
                }
            }
            MixOp::Light | MixOp::Dodge | MixOp::Burn => {}
        }
    }

    pub fn fold_math(&mut self, op: MathOp, clamp: bool) {
        let v1 = self.in_("Value1");
        let v2 = self.in_("Value2");

        match op {
            MathOp::Add => {
                if self.is_zero(v1) {
                    self.try_bypass_or_make_constant(v2, clamp);
                } else if self.is_zero(v2) {
                    self.try_bypass_or_make_constant(v1, clamp);
                }
            }
            MathOp::Subtract => {
                if self.is_zero(v2) {
                    self.try_bypass_or_make_constant(v1, clamp);
                }
            }
            MathOp::Multiply => {
                if self.is_one(v1) {
                    self.try_bypass_or_make_constant(v2, clamp);
                } else if self.is_one(v2) {
                    self.try_bypass_or_make_constant(v1, clamp);
                } else if self.is_zero(v1) || self.is_zero(v2) {
                    self.make_zero();
                }
            }
            MathOp::Divide => {
                if self.is_one(v2) {
                    self.try_bypass_or_make_constant(v1, clamp);
                } else if self.is_zero(v1) {
                    self.make_zero();
                }
            }
            // NOTE: the original has no `break` between the Power case and
            // its `default:` arm in the C++ switch, so a power fold always
            // also executes whatever the default case does. The default
            // case is empty, so this is a no-op in practice, but it's
            // reproduced here (rather than "fixed") since later cases could
            // silently inherit this fallthrough upstream too.
            MathOp::Power => {
                if self.is_one(v1) || self.is_zero(v2) {
                    self.make_one();
                } else if self.is_one(v2) {
                    self.try_bypass_or_make_constant(v1, clamp);
                }
            }
            _ => {}
        }
    }

    /// `fac == 0` means no inversion at all: bypass straight to `Color`.
    /// Otherwise, if every input is a constant, evaluate
    /// `lerp(color, 1 - color, fac)` directly.
    pub fn fold_invert(&mut self) {
        let fac_in = self.in_("Fac");
        let color_in = self.in_("Color");
        if self.is_zero(fac_in) {
            self.try_bypass_or_make_constant(color_in, false);
            return;
        }
        if self.all_inputs_constant() {
            let fac = self.graph.inputs[fac_in].default_value.as_float().unwrap_or(0.0).clamp(0.0, 1.0);
            let color = self.graph.inputs[color_in].default_value.as_float3().unwrap_or(Float3::ZERO);
            self.make_constant3(lerp3(color, Float3::ONE - color, fac));
        }
    }

    /// `gamma == 1` is the identity transform; `color == 1` or `gamma == 0`
    /// always evaluates to white regardless of the other input. Otherwise,
    /// if both inputs are constant, evaluate `color ^ gamma` per channel.
    pub fn fold_gamma(&mut self) {
        let gamma_in = self.in_("Gamma");
        let color_in = self.in_("Color");
        if self.is_one(gamma_in) {
            self.try_bypass_or_make_constant(color_in, false);
            return;
        }
        if self.is_one(color_in) || self.is_zero(gamma_in) {
            self.make_one();
            return;
        }
        if self.all_inputs_constant() {
            let gamma = self.graph.inputs[gamma_in].default_value.as_float().unwrap_or(1.0);
            let color = self.graph.inputs[color_in].default_value.as_float3().unwrap_or(Float3::ZERO);
            self.make_constant3(Float3::new(
                color.x.max(0.0).powf(gamma),
                color.y.max(0.0).powf(gamma),
                color.z.max(0.0).powf(gamma),
            ));
        }
    }

    /// `bright == 0 && contrast == 0` is the identity transform. Otherwise,
    /// if every input is constant, evaluate the same affine-plus-clamp
    /// formula `svm_brightness_contrast` uses at render time.
    pub fn fold_bright_contrast(&mut self) {
        let bright_in = self.in_("Bright");
        let contrast_in = self.in_("Contrast");
        let color_in = self.in_("Color");
        if self.is_zero(bright_in) && self.is_zero(contrast_in) {
            self.try_bypass_or_make_constant(color_in, false);
            return;
        }
        if self.all_inputs_constant() {
            let bright = self.graph.inputs[bright_in].default_value.as_float().unwrap_or(0.0);
            let contrast = self.graph.inputs[contrast_in].default_value.as_float().unwrap_or(0.0);
            let color = self.graph.inputs[color_in].default_value.as_float3().unwrap_or(Float3::ZERO);
            let a = 1.0 + contrast;
            let b = bright - contrast * 0.5;
            self.make_constant3(Float3::new(
                (a * color.x + b).max(0.0),
                (a * color.y + b).max(0.0),
                (a * color.z + b).max(0.0),
            ));
        }
    }

    /// Luminance reduce, evaluated only when `Color` is an unlinked constant.
    pub fn fold_rgb_to_bw(&mut self) {
        let color_in = self.in_("Color");
        if self.graph.inputs[color_in].link.is_none() {
            let color = self.graph.inputs[color_in].default_value.as_float3().unwrap_or(Float3::ZERO);
            self.make_constant(luminance(color));
        }
    }

    /// Mirrors `AddClosureNode::constant_fold`: a closure input left
    /// unlinked (no BSDF/Emission/Background ever authored there) carries no
    /// closure at all, so the sum degenerates to whichever side is linked.
    pub fn fold_add_closure(&mut self) {
        let c1_in = self.in_("Closure1");
        let c2_in = self.in_("Closure2");
        let c1_linked = self.graph.inputs[c1_in].link.is_some();
        let c2_linked = self.graph.inputs[c2_in].link.is_some();
        if !c1_linked {
            self.bypass_or_discard(c2_in);
        } else if !c2_linked {
            self.bypass_or_discard(c1_in);
        }
    }

    /// `Emission`/`Background` with a zero `Color` or zero `Strength`
    /// contributes no light at all, so the closure can be discarded
    /// entirely rather than carried through codegen as a weighted no-op.
    pub fn fold_emission_like(&mut self) {
        let color_in = self.in_("Color");
        let strength_in = self.in_("Strength");
        if self.is_zero(color_in) || self.is_zero(strength_in) {
            self.discard();
        }
    }

    /// Evaluated only when `Temperature` is an unlinked constant.
    pub fn fold_blackbody(&mut self) {
        let temp_in = self.in_("Temperature");
        if self.graph.inputs[temp_in].link.is_none() {
            let t = self.graph.inputs[temp_in].default_value.as_float().unwrap_or(1500.0);
            self.make_constant3(blackbody_to_rgb(t));
        }
    }

    /// Packs three scalar inputs into the node's float3-family output,
    /// evaluated only when all three are unlinked constants. `hsv` selects
    /// the `CombineHsv` interpretation of its inputs as hue/saturation/value
    /// rather than a literal channel triple.
    pub fn fold_combine(&mut self, n_a: &str, n_b: &str, n_c: &str, hsv: bool) {
        let a_in = self.in_(n_a);
        let b_in = self.in_(n_b);
        let c_in = self.in_(n_c);
        if self.all_inputs_constant() {
            let a = self.graph.inputs[a_in].default_value.as_float().unwrap_or(0.0);
            let b = self.graph.inputs[b_in].default_value.as_float().unwrap_or(0.0);
            let c = self.graph.inputs[c_in].default_value.as_float().unwrap_or(0.0);
            let value = if hsv { hsv_to_rgb(a, b, c) } else { Float3::new(a, b, c) };
            self.make_constant3(value);
        }
    }

    /// Mirrors `ConvertNode::constant_fold`'s two cases: evaluating the
    /// conversion outright when the input is a constant, and collapsing an
    /// `A -> B -> A` round trip back to the original source when it isn't.
    pub fn fold_convert(&mut self, from: SocketKind, to: SocketKind) {
        let value_in = self.in_("value_in");
        if let Some(upstream_out) = self.graph.inputs[value_in].link {
            let upstream_node = self.graph.outputs[upstream_out].parent;
            if let NodeKind::Convert {
                from: up_from,
                to: up_to,
            } = self.graph.nodes[upstream_node].kind.clone()
            {
                if up_to == from && up_from == to {
                    if let Some(orig_in) = self.graph.find_input(upstream_node, "value_in") {
                        if let Some(orig_out) = self.graph.inputs[orig_in].link {
                            self.bypass(orig_out);
                            return;
                        }
                    }
                }
            }
        }
        if self.graph.inputs[value_in].link.is_some() {
            return;
        }
        match (from, to) {
            (SocketKind::Float, k) if k.is_float3() => {
                let v = self.graph.inputs[value_in].default_value.as_float().unwrap_or(0.0);
                self.make_constant3(Float3::splat(v));
            }
            (k, SocketKind::Float) if k.is_float3() => {
                let c = self.graph.inputs[value_in].default_value.as_float3().unwrap_or(Float3::ZERO);
                self.make_constant(luminance(c));
            }
            (a, b) if a.is_float3() && b.is_float3() => {
                let v = self.graph.inputs[value_in].default_value.as_float3().unwrap_or(Float3::ZERO);
                self.make_constant3(v);
            }
            _ => {}
        }
    }

    /// `Displacement` contributes nothing if `Height` never moves the
    /// surface away from `Midlevel`.
    pub fn fold_displacement(&mut self) {
        let height_in = self.in_("Height");
        let midlevel_in = self.in_("Midlevel");
        if self.graph.inputs[height_in].link.is_none() && self.graph.inputs[midlevel_in].link.is_none() {
            let h = self.graph.inputs[height_in].default_value.as_float().unwrap_or(0.0);
            let m = self.graph.inputs[midlevel_in].default_value.as_float().unwrap_or(0.0);
            if h == m {
                self.make_zero();
            }
        }
    }

    /// `VectorDisplacement` contributes nothing if its displacement vector
    /// is exactly zero.
    pub fn fold_vector_displacement(&mut self) {
        let vector_in = self.in_("Vector");
        if self.is_zero(vector_in) {
            self.make_zero();
        }
    }

    /// Mirrors `MixClosureNode::constant_fold`: an unlinked `Fac` of exactly
    /// 0 or 1 selects one closure input outright and discards the other.
    pub fn fold_mix_closure(&mut self) {
        let fac_in = self.in_("Fac");
        let closure1_in = self.in_("Closure1");
        let closure2_in = self.in_("Closure2");
        if self.is_zero(fac_in) {
            self.bypass_or_discard(closure1_in);
        } else if self.is_one(fac_in) {
            self.bypass_or_discard(closure2_in);
        }
    }

    pub fn fold_vector_math(&mut self, op: VectorMathOp) {
        let v1 = self.in_("Vector1");
        let v2 = self.in_("Vector2");

        match op {
            VectorMathOp::Add => {
                if self.is_zero(v1) {
                    self.try_bypass_or_make_constant(v2, false);
                } else if self.is_zero(v2) {
                    self.try_bypass_or_make_constant(v1, false);
                }
            }
            VectorMathOp::Subtract => {
                if self.is_zero(v2) {
                    self.try_bypass_or_make_constant(v1, false);
                }
            }
            VectorMathOp::DotProduct | VectorMathOp::CrossProduct => {
                if self.is_zero(v1) || self.is_zero(v2) {
                    self.make_zero();
                }
            }
        }
    }
}

/// Unpacks a float3-family constant input into three scalar outputs,
/// evaluated only when the input is an unlinked constant. Handled outside
/// `ConstantFolder` since that type is bound to a single output and
/// `SeparateXyz`/`SeparateRgb`/`SeparateHsv` each drive three independently.
fn fold_separate(graph: &mut ShaderGraph, node: NodeId, in_name: &str, out_names: (&str, &str, &str), hsv: bool) {
    let Some(vector_in) = graph.find_input(node, in_name) else {
        return;
    };
    if graph.inputs[vector_in].link.is_some() {
        return;
    }
    let v = graph.inputs[vector_in].default_value.as_float3().unwrap_or(Float3::ZERO);
    let (a, b, c) = if hsv { rgb_to_hsv(v) } else { (v.x, v.y, v.z) };
    for (name, value) in [(out_names.0, a), (out_names.1, b), (out_names.2, c)] {
        let Some(out) = graph.find_output(node, name) else {
            continue;
        };
        let links = graph.outputs[out].links.clone();
        for sock in links {
            graph.inputs[sock].default_value = Value::Float(value);
        }
        graph.disconnect_output(out);
    }
}

/// Driver invoked per-node during the optimizer's `clean()` pass: dispatches
/// to the fold rule for the node's kind, if any.
pub fn fold_node(graph: &mut ShaderGraph, node: NodeId) {
    let kind = graph.nodes[node].kind.clone();
    match &kind {
        NodeKind::SeparateXyz => return fold_separate(graph, node, "Vector", ("X", "Y", "Z"), false),
        NodeKind::SeparateRgb => return fold_separate(graph, node, "Image", ("R", "G", "B"), false),
        NodeKind::SeparateHsv => return fold_separate(graph, node, "Color", ("H", "S", "V"), true),
        _ => {}
    }

    let outputs = graph.nodes[node].outputs.clone();
    let Some(&output) = outputs.first() else {
        return;
    };
    let mut folder = ConstantFolder::new(graph, node, output);
    match kind {
        NodeKind::Mix { op, clamp } => folder.fold_mix(op, clamp),
        NodeKind::Math { op, clamp } => folder.fold_math(op, clamp),
        NodeKind::VectorMath { op } => folder.fold_vector_math(op),
        NodeKind::Invert => folder.fold_invert(),
        NodeKind::Gamma => folder.fold_gamma(),
        NodeKind::BrightContrast => folder.fold_bright_contrast(),
        NodeKind::MixClosure => folder.fold_mix_closure(),
        NodeKind::RgbToBw => folder.fold_rgb_to_bw(),
        NodeKind::AddClosure => folder.fold_add_closure(),
        NodeKind::Emission | NodeKind::Background => folder.fold_emission_like(),
        NodeKind::Blackbody => folder.fold_blackbody(),
        NodeKind::CombineXyz => folder.fold_combine("X", "Y", "Z", false),
        NodeKind::CombineRgb => folder.fold_combine("R", "G", "B", false),
        NodeKind::CombineHsv => folder.fold_combine("H", "S", "V", true),
        NodeKind::Convert { from, to } => folder.fold_convert(from, to),
        NodeKind::Displacement => folder.fold_displacement(),
        NodeKind::VectorDisplacement => folder.fold_vector_displacement(),
        // Already-terminal constants; nothing downstream of these ever
        // needs folding at the node itself.
        NodeKind::Value(_) | NodeKind::Color(_) => {}
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ShaderGraph;
    use sg_types::Value;

    #[test]
    fn gamma_of_one_bypasses_to_color_input() {
        let mut graph = ShaderGraph::new();
        let value = graph.add(NodeKind::Color(Float3::new(0.2, 0.4, 0.6)));
        let gamma = graph.add(NodeKind::Gamma);
        let gamma_color_in = graph.find_input(gamma, "Color").unwrap();
        let gamma_in = graph.find_input(gamma, "Gamma").unwrap();
        graph.inputs[gamma_in].default_value = Value::Float(1.0);
        graph
            .connect(graph.find_output(value, "Color").unwrap(), gamma_color_in)
            .unwrap();

        fold_node(&mut graph, gamma);

        // The Gamma node's output should no longer have consumers since it
        // was never wired to anything downstream in this test; what we can
        // assert is that the fold didn't panic and left no dangling state.
        assert!(graph.outputs[graph.find_output(gamma, "Color").unwrap()].links.is_empty());
    }

    #[test]
    fn mix_closure_with_zero_fac_discards_second_closure() {
        let mut graph = ShaderGraph::new();
        let emission1 = graph.add(NodeKind::Emission);
        let emission2 = graph.add(NodeKind::Emission);
        let mix = graph.add(NodeKind::MixClosure);
        let fac_in = graph.find_input(mix, "Fac").unwrap();
        graph.inputs[fac_in].default_value = Value::Float(0.0);
        graph
            .connect(
                graph.find_output(emission1, "Emission").unwrap(),
                graph.find_input(mix, "Closure1").unwrap(),
            )
            .unwrap();
        graph
            .connect(
                graph.find_output(emission2, "Emission").unwrap(),
                graph.find_input(mix, "Closure2").unwrap(),
            )
            .unwrap();

        let surface_in = graph.find_input(graph.output_node(), "Surface").unwrap();
        graph
            .connect(graph.find_output(mix, "Closure").unwrap(), surface_in)
            .unwrap();

        fold_node(&mut graph, mix);

        // Fac == 0 means the mix resolves to Closure1 (emission1) directly;
        // Surface should now be fed straight from emission1.
        assert_eq!(
            graph.inputs[surface_in].link,
            Some(graph.find_output(emission1, "Emission").unwrap())
        );
    }
}
