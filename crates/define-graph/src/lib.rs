//! Node/edge view of the cross-references in a Define-XML document.
//!
//! Nodes are keyed by OID; edges are labelled by the attribute that holds
//! the reference (`CommentOID`, `CodeListOID`, `MethodOID`, `ItemOID`).

mod graph;

pub use graph::{GraphLink, GraphNode, NodeKind, Relationship, RelationshipGraph, build_graph};
