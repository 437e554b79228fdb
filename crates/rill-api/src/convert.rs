//! Proto ↔ domain conversions for `ServerNode`.

use rill_cluster::ServerNode;

use crate::pb;

pub fn node_to_proto(node: &ServerNode) -> pb::ServerNodeProto {
    pb::ServerNodeProto {
        id: node.id,
        host: node.host.clone(),
        port: node.port as u32,
        internal_port: node.internal_port as u32,
    }
}

pub fn node_from_proto(proto: &pb::ServerNodeProto) -> ServerNode {
    ServerNode::new(
        proto.id,
        proto.host.clone(),
        proto.port as u16,
        proto.internal_port as u16,
    )
}
