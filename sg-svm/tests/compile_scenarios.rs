use sg_graph::{optimize, NodeKind, ShaderGraph};
use sg_svm::{Compiler, Instruction, ShaderType, ShaderTypeKey};
use sg_types::Float3;

fn init() {
    let _ = env_logger::try_init();
}

#[test]
fn single_emission_compiles_to_one_closure_instruction_plus_end() {
    init();
    let mut graph = ShaderGraph::new();
    let emission = graph.add(NodeKind::Emission);
    let surface_in = graph.find_input(graph.output_node(), "Surface").unwrap();
    graph
        .connect(graph.find_output(emission, "Emission").unwrap(), surface_in)
        .unwrap();

    optimize::finalize(&mut graph);
    let program = Compiler::compile(&graph);

    let surface_entry = program.entry_points[&ShaderTypeKey::from(ShaderType::Surface)];
    let pass = &program.instructions[surface_entry..];
    assert!(pass.iter().any(|i| matches!(i, Instruction::Closure { .. })));
    assert!(matches!(pass.last(), Some(Instruction::End)));
}

#[test]
fn bump_pass_has_no_trailing_end_before_surface() {
    init();
    let mut graph = ShaderGraph::new();
    let emission = graph.add(NodeKind::Emission);
    let surface_in = graph.find_input(graph.output_node(), "Surface").unwrap();
    graph
        .connect(graph.find_output(emission, "Emission").unwrap(), surface_in)
        .unwrap();

    optimize::finalize(&mut graph);
    let program = Compiler::compile(&graph);

    let bump_entry = program.entry_points[&ShaderTypeKey::from(ShaderType::Bump)];
    let surface_entry = program.entry_points[&ShaderTypeKey::from(ShaderType::Surface)];
    // Bump falls through into Surface: nothing in between is an `End`.
    for inst in &program.instructions[bump_entry..surface_entry] {
        assert!(!matches!(inst, Instruction::End));
    }
}

#[test]
fn gamma_and_combine_xyz_emit_their_dedicated_opcodes() {
    init();
    let mut graph = ShaderGraph::new();

    let color = graph.add(NodeKind::Color(Float3::new(0.8, 0.2, 0.2)));
    let gamma_value = graph.add(NodeKind::Value(2.2));
    let gamma = graph.add(NodeKind::Gamma);
    graph
        .connect(graph.find_output(color, "Color").unwrap(), graph.find_input(gamma, "Color").unwrap())
        .unwrap();
    graph
        .connect(
            graph.find_output(gamma_value, "Value").unwrap(),
            graph.find_input(gamma, "Gamma").unwrap(),
        )
        .unwrap();

    let x = graph.add(NodeKind::Value(1.0));
    let y = graph.add(NodeKind::Value(0.5));
    let z = graph.add(NodeKind::Value(0.0));
    let combine = graph.add(NodeKind::CombineXyz);
    graph
        .connect(graph.find_output(x, "Value").unwrap(), graph.find_input(combine, "X").unwrap())
        .unwrap();
    graph
        .connect(graph.find_output(y, "Value").unwrap(), graph.find_input(combine, "Y").unwrap())
        .unwrap();
    graph
        .connect(graph.find_output(z, "Value").unwrap(), graph.find_input(combine, "Z").unwrap())
        .unwrap();

    let diffuse = graph.add(NodeKind::DiffuseBsdf);
    graph
        .connect(graph.find_output(gamma, "Color").unwrap(), graph.find_input(diffuse, "Color").unwrap())
        .unwrap();
    graph
        .connect(
            graph.find_output(combine, "Vector").unwrap(),
            graph.find_input(diffuse, "Normal").unwrap(),
        )
        .unwrap();
    let surface_in = graph.find_input(graph.output_node(), "Surface").unwrap();
    graph
        .connect(graph.find_output(diffuse, "BSDF").unwrap(), surface_in)
        .unwrap();

    optimize::finalize(&mut graph);
    let program = Compiler::compile(&graph);

    assert!(program.instructions.iter().any(|i| matches!(i, Instruction::Gamma { .. })));
    assert!(program.instructions.iter().any(|i| matches!(i, Instruction::Combine { .. })));
}

#[test]
fn empty_volume_pass_is_just_end() {
    init();
    let mut graph = ShaderGraph::new();
    optimize::finalize(&mut graph);
    let program = Compiler::compile(&graph);

    let volume_entry = program.entry_points[&ShaderTypeKey::from(ShaderType::Volume)];
    let displacement_entry = program.entry_points[&ShaderTypeKey::from(ShaderType::Displacement)];
    let pass = &program.instructions[volume_entry..displacement_entry];
    assert_eq!(pass.len(), 1);
    assert!(matches!(pass[0], Instruction::End));
}
