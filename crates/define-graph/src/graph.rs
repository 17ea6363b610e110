use define_model::ParsedDefineXml;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Entity kind of a node, serialized as its group number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Referenced but never declared in the document.
    Unresolved,
    ItemGroup,
    ItemDef,
    Method,
    Comment,
    CodeList,
    Standard,
    ValueList,
    WhereClause,
}

impl NodeKind {
    pub fn group(self) -> u32 {
        match self {
            Self::Unresolved => 0,
            Self::ItemGroup => 1,
            Self::ItemDef => 2,
            Self::Method => 3,
            Self::Comment => 4,
            Self::CodeList => 5,
            Self::Standard => 6,
            Self::ValueList => 7,
            Self::WhereClause => 8,
        }
    }
}

/// Reference attribute an edge was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    #[serde(rename = "CommentOID")]
    CommentOid,
    #[serde(rename = "CodeListOID")]
    CodeListOid,
    #[serde(rename = "MethodOID")]
    MethodOid,
    #[serde(rename = "ItemOID")]
    ItemOid,
}

impl Relationship {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommentOid => "CommentOID",
            Self::CodeListOid => "CodeListOID",
            Self::MethodOid => "MethodOID",
            Self::ItemOid => "ItemOID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub group: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub value: u32,
    pub relationship: Relationship,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl RelationshipGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn links_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphLink> {
        self.links.iter().filter(move |link| link.source == id)
    }
}

#[derive(Default)]
struct GraphBuilder {
    nodes: IndexMap<String, GraphNode>,
    links: Vec<GraphLink>,
}

impl GraphBuilder {
    /// First insertion wins; later ones never relabel a node.
    fn node(&mut self, id: &str, kind: NodeKind, label: Option<&str>) {
        if self.nodes.contains_key(id) {
            return;
        }
        self.nodes.insert(
            id.to_string(),
            GraphNode {
                id: id.to_string(),
                group: kind.group(),
                label: label.unwrap_or(id).to_string(),
            },
        );
    }

    fn link(&mut self, source: (&str, NodeKind), target: Option<&str>, relationship: Relationship) {
        let Some(target) = target else {
            return;
        };
        self.node(source.0, source.1, None);
        self.node(target, NodeKind::Unresolved, None);
        self.links.push(GraphLink {
            source: source.0.to_string(),
            target: target.to_string(),
            value: 1,
            relationship,
        });
    }

    fn finish(self) -> RelationshipGraph {
        RelationshipGraph {
            nodes: self.nodes.into_values().collect(),
            links: self.links,
        }
    }
}

/// Build the cross-reference graph of `define`.
///
/// Declared entities become nodes first, labelled by name. Every
/// reference attribute then becomes an edge; a referenced OID that is not
/// declared is added as an [`NodeKind::Unresolved`] node.
pub fn build_graph(define: &ParsedDefineXml) -> RelationshipGraph {
    let mut graph = GraphBuilder::default();

    for group in &define.item_groups {
        if let Some(oid) = group.oid.as_deref() {
            graph.node(oid, NodeKind::ItemGroup, group.name.as_deref());
        }
    }
    for item in &define.item_defs {
        if let Some(oid) = item.oid.as_deref() {
            graph.node(oid, NodeKind::ItemDef, item.name.as_deref());
        }
    }
    for method in &define.methods {
        if let Some(oid) = method.oid.as_deref() {
            graph.node(oid, NodeKind::Method, method.name.as_deref());
        }
    }
    for comment in &define.comments {
        if let Some(oid) = comment.oid.as_deref() {
            graph.node(oid, NodeKind::Comment, None);
        }
    }
    for code_list in &define.code_lists {
        if let Some(oid) = code_list.oid.as_deref() {
            graph.node(oid, NodeKind::CodeList, code_list.name.as_deref());
        }
    }

    for standard in &define.standards {
        if let Some(oid) = standard.oid.as_deref() {
            graph.link(
                (oid, NodeKind::Standard),
                standard.comment_oid.as_deref(),
                Relationship::CommentOid,
            );
        }
    }
    for group in &define.item_groups {
        let Some(oid) = group.oid.as_deref() else {
            continue;
        };
        graph.link(
            (oid, NodeKind::ItemGroup),
            group.comment_oid.as_deref(),
            Relationship::CommentOid,
        );
        for item_ref in &group.item_refs {
            if let Some(item_oid) = item_ref.oid.as_deref() {
                graph.link(
                    (item_oid, NodeKind::ItemDef),
                    item_ref.method_oid.as_deref(),
                    Relationship::MethodOid,
                );
            }
        }
    }
    for item in &define.item_defs {
        let Some(oid) = item.oid.as_deref() else {
            continue;
        };
        graph.link(
            (oid, NodeKind::ItemDef),
            item.code_list_oid.as_deref(),
            Relationship::CodeListOid,
        );
        graph.link(
            (oid, NodeKind::ItemDef),
            item.comment_oid.as_deref(),
            Relationship::CommentOid,
        );
    }
    for value_list in &define.value_list_defs {
        let Some(oid) = value_list.oid.as_deref() else {
            continue;
        };
        for item_ref in &value_list.item_refs {
            graph.link(
                (oid, NodeKind::ValueList),
                item_ref.oid.as_deref(),
                Relationship::ItemOid,
            );
            graph.link(
                (oid, NodeKind::ValueList),
                item_ref.method_oid.as_deref(),
                Relationship::MethodOid,
            );
        }
    }
    for where_clause in &define.where_clause_defs {
        for check in &where_clause.range_checks {
            let target = Some(check.item_oid.as_str()).filter(|oid| !oid.is_empty());
            graph.link(
                (&where_clause.oid, NodeKind::WhereClause),
                target,
                Relationship::ItemOid,
            );
        }
    }

    let graph = graph.finish();
    tracing::debug!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        "Built relationship graph"
    );
    graph
}
