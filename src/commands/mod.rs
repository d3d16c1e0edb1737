pub mod codegen;
pub mod node_graph;
