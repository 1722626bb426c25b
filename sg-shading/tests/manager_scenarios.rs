use sg_graph::{NodeKind, ShaderGraph};
use sg_shading::{BeckmannTable, Shader, ShaderManager, ShadingConfig};

fn init() {
    let _ = env_logger::try_init();
}

#[test]
fn manager_with_no_shaders_added_falls_back_to_the_default_on_compile() {
    init();
    let mut manager = ShaderManager::new(ShadingConfig::default());
    let idx = manager.add_default();
    assert_eq!(idx, 0);
    assert_eq!(manager.shaders.len(), 1);
    manager.compile_all().unwrap();
    assert!(manager.shaders[0].program.is_some());
}

#[test]
fn multiple_shaders_each_get_their_own_compiled_program() {
    init();
    let mut manager = ShaderManager::new(ShadingConfig::default());

    let mut emissive_graph = ShaderGraph::new();
    let emission = emissive_graph.add(NodeKind::Emission);
    let surface_in = emissive_graph.find_input(emissive_graph.output_node(), "Surface").unwrap();
    emissive_graph
        .connect(emissive_graph.find_output(emission, "Emission").unwrap(), surface_in)
        .unwrap();
    manager.add(Shader::new("glow", emissive_graph));

    let mut glass_like_graph = ShaderGraph::new();
    let glossy = glass_like_graph.add(NodeKind::GlossyBsdf {
        distribution: sg_graph::GlossyDistribution::Ggx,
    });
    let surface_in = glass_like_graph.find_input(glass_like_graph.output_node(), "Surface").unwrap();
    glass_like_graph
        .connect(glass_like_graph.find_output(glossy, "BSDF").unwrap(), surface_in)
        .unwrap();
    manager.add(Shader::new("metal", glass_like_graph));

    manager.compile_all().unwrap();

    assert_eq!(manager.shaders.len(), 2);
    assert!(manager.shaders[0].program.is_some());
    assert!(manager.shaders[1].program.is_some());
    assert!(manager.shaders[0].graph.is_finalized());
    assert!(manager.shaders[1].graph.is_finalized());
}

#[test]
fn beckmann_table_builds_without_panicking_and_stays_in_unit_range() {
    init();
    let table = BeckmannTable::build();
    for roughness_step in 0..8 {
        let roughness = (roughness_step as f32 + 1.0) / 8.0;
        for cos_step in 0..8 {
            let cos_theta = (cos_step as f32 + 1.0) / 8.0;
            let v = table.sample(roughness, cos_theta);
            assert!(v.is_finite());
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
