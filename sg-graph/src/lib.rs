//! Shader graph intermediate representation, constant folding, and the
//! optimizer pipeline that lowers an authored node graph into a finalized,
//! SVM-codegen-ready form.

pub mod error;
pub mod fold;
pub mod graph;
pub mod ids;
pub mod nodes;
pub mod optimize;

pub use error::{Error, Result};
pub use graph::{ShaderGraph, ShaderInput, ShaderNode, ShaderOutput};
pub use ids::{InputId, NodeId, OutputId};
pub use nodes::{BumpTag, GlossyDistribution, MathOp, MixOp, NodeKind, VectorMathOp, VOLUME_STACK_SIZE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_graph_has_only_output_node() {
        let graph = ShaderGraph::new();
        assert_eq!(graph.node_ids().len(), 1);
        assert!(matches!(graph.node(graph.output_node()).kind, NodeKind::Output));
    }

    #[test]
    fn connecting_already_linked_input_is_refused() {
        let mut graph = ShaderGraph::new();
        let a = graph.add(NodeKind::Value(1.0));
        let b = graph.add(NodeKind::Value(2.0));
        let a_out = graph.find_output(a, "Value").unwrap();
        let b_out = graph.find_output(b, "Value").unwrap();
        let surface_in = graph.find_input(graph.output_node(), "Displacement").unwrap();

        // Route through a Math node input so the socket types line up.
        let math = graph.add(NodeKind::Math {
            op: nodes::MathOp::Add,
            clamp: false,
        });
        let v1 = graph.find_input(math, "Value1").unwrap();
        graph.connect(a_out, v1).expect("first connect succeeds");
        assert!(graph.connect(b_out, v1).is_err());
        let _ = surface_in;
    }

    #[test]
    fn get_num_closures_sums_leaf_costs() {
        let mut graph = ShaderGraph::new();
        let e1 = graph.add(NodeKind::Emission);
        let e2 = graph.add(NodeKind::Emission);
        let add = graph.add(NodeKind::AddClosure);
        let c1 = graph.find_input(add, "Closure1").unwrap();
        let c2 = graph.find_input(add, "Closure2").unwrap();
        graph.connect(graph.find_output(e1, "Emission").unwrap(), c1).unwrap();
        graph.connect(graph.find_output(e2, "Emission").unwrap(), c2).unwrap();
        let surface_in = graph.find_input(graph.output_node(), "Surface").unwrap();
        graph
            .connect(graph.find_output(add, "Closure").unwrap(), surface_in)
            .unwrap();

        // AddClosure itself costs 0 (it's a combinator, not a leaf type),
        // each Emission leaf costs 1.
        assert_eq!(graph.get_num_closures(), 2);
    }
}
