//! Audio graph model, codegen wire format, and the bridge to the external
//! code generator.

pub mod bridge;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod palette;
pub mod params;
pub mod serializer;

pub use bridge::{generate_code, invoke_codegen, CodegenBridge, CodegenState};
pub use config::{BridgeConfig, GeneratorCommand};
pub use error::{CodegenError, GenerateError, GraphError, SerializeError};
pub use graph::AudioGraph;
pub use model::*;
pub use params::ParamPatch;
pub use serializer::{
    parse_wire, serialize, serialize_snapshot, serialize_to_json, EditorSnapshot, WireGraph,
};
