use log::debug;

use crate::error::GraphError;
use crate::model::{
    Connection, ConnectionId, GraphView, Node, NodeId, NodeKind, NodeParams, Position,
};
use crate::palette::{self, PortDirection};
use crate::params::ParamPatch;

/// Authoritative in-session graph state.
///
/// Ids come from counters owned by the graph and are never reused, even after
/// removal or [`AudioGraph::clear`]. Every mutation keeps the invariants the
/// serializer relies on: connection endpoints name existing nodes, and port
/// ids match the direction required by the node type's port table.
#[derive(Debug, Clone)]
pub struct AudioGraph {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    next_node_id: NodeId,
    next_connection_id: ConnectionId,
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            next_node_id: 1,
            next_connection_id: 1,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    fn node_mut(&mut self, node_id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .iter_mut()
            .find(|node| node.id == node_id)
            .ok_or(GraphError::NodeNotFound(node_id))
    }

    fn kind_of(&self, node_id: NodeId) -> Result<NodeKind, GraphError> {
        self.node(node_id)
            .map(Node::kind)
            .ok_or(GraphError::NodeNotFound(node_id))
    }

    pub fn view(&self) -> GraphView {
        GraphView {
            nodes: self.nodes.clone(),
            connections: self.connections.clone(),
        }
    }

    /// Adds a node of the palette type `tag` with default parameters.
    pub fn add_node(&mut self, tag: &str, position: Position) -> Result<NodeId, GraphError> {
        let kind = NodeKind::from_tag(tag).ok_or_else(|| GraphError::InvalidType(tag.to_string()))?;
        Ok(self.add_node_of_kind(kind, position))
    }

    pub fn add_node_of_kind(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes.push(Node {
            id,
            position,
            params: NodeParams::default_for(kind),
        });
        debug!("[graph] added {} node {}", kind, id);
        id
    }

    pub fn move_node(&mut self, node_id: NodeId, position: Position) -> Result<(), GraphError> {
        self.node_mut(node_id)?.position = position;
        Ok(())
    }

    pub fn update_node_parameters(
        &mut self,
        node_id: NodeId,
        patch: &ParamPatch,
    ) -> Result<&Node, GraphError> {
        let node = self.node_mut(node_id)?;
        node.params.apply_patch(patch)?;
        debug!("[graph] updated parameters of node {}", node_id);
        Ok(&*node)
    }

    /// Removes the node and every connection that references it.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node, GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|node| node.id == node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let node = self.nodes.remove(index);

        let before = self.connections.len();
        self.connections.retain(|conn| !conn.touches(node_id));
        debug!(
            "[graph] removed node {} and {} connection(s)",
            node_id,
            before - self.connections.len()
        );
        Ok(node)
    }

    /// Connects `from_node.from_port` to `to_node.to_port`.
    ///
    /// Ports are optional because the editor can report an edge without
    /// handles; a missing port is rejected. Adding an existing link returns
    /// the existing connection unchanged.
    pub fn add_connection(
        &mut self,
        from_node: NodeId,
        from_port: Option<&str>,
        to_node: NodeId,
        to_port: Option<&str>,
    ) -> Result<Connection, GraphError> {
        let from_kind = self.kind_of(from_node)?;
        let to_kind = self.kind_of(to_node)?;
        let from_port = check_port(from_node, from_kind, from_port, PortDirection::Source)?;
        let to_port = check_port(to_node, to_kind, to_port, PortDirection::Target)?;

        if let Some(existing) = self
            .connections
            .iter()
            .find(|conn| conn.links(from_node, from_port, to_node, to_port))
        {
            return Ok(existing.clone());
        }

        let connection = Connection {
            id: self.next_connection_id,
            from_node,
            from_port: from_port.to_string(),
            to_node,
            to_port: to_port.to_string(),
        };
        self.next_connection_id += 1;
        self.connections.push(connection.clone());
        debug!(
            "[graph] connected {}.{} -> {}.{}",
            from_node, from_port, to_node, to_port
        );
        Ok(connection)
    }

    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Result<Connection, GraphError> {
        let index = self
            .connections
            .iter()
            .position(|conn| conn.id == connection_id)
            .ok_or(GraphError::ConnectionNotFound(connection_id))?;
        Ok(self.connections.remove(index))
    }

    /// Removes the link between the given endpoints, if present.
    pub fn disconnect(
        &mut self,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> Option<Connection> {
        let index = self
            .connections
            .iter()
            .position(|conn| conn.links(from_node, from_port, to_node, to_port))?;
        Some(self.connections.remove(index))
    }

    /// Empties the graph. Id counters keep running.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }
}

fn check_port<'a>(
    node_id: NodeId,
    kind: NodeKind,
    port: Option<&'a str>,
    direction: PortDirection,
) -> Result<&'a str, GraphError> {
    let invalid = |port: &str, reason: String| GraphError::InvalidPort {
        node_id,
        port: port.to_string(),
        reason,
    };

    let port = match port {
        Some(port) if !port.is_empty() => port,
        _ => return Err(invalid("", "no port handle given".into())),
    };

    match palette::find_port(kind, port) {
        None => Err(invalid(port, format!("{} has no such port", kind))),
        Some(spec) if spec.direction != direction => Err(invalid(
            port,
            format!("expected a {:?} port, found {:?}", direction, spec.direction),
        )),
        Some(_) => Ok(port),
    }
}
