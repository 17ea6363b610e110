//! Namespace-aware accessors over a parsed XML tree.
//!
//! Core ODM elements are matched by local name only. Elements and attributes
//! that live in the Define-XML extension namespace are matched against the
//! URI bound to the `def` prefix on the document root, resolved once per
//! document into [`Namespaces`].

use roxmltree::Node;

pub const DEF_PREFIX: &str = "def";
pub const ARM_PREFIX: &str = "arm";

/// Default ARM namespace when the document does not bind the `arm` prefix.
pub const ARM_NS: &str = "http://www.cdisc.org/ns/arm/v1.0";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Extension namespace URIs declared by the document.
#[derive(Debug, Clone, Copy)]
pub struct Namespaces<'a> {
    pub def: &'a str,
    pub arm: &'a str,
}

impl<'a> Namespaces<'a> {
    /// `None` when the root does not declare the `def` prefix.
    pub fn from_root(root: Node<'a, '_>) -> Option<Self> {
        let def = root.lookup_namespace_uri(Some(DEF_PREFIX))?;
        let arm = root.lookup_namespace_uri(Some(ARM_PREFIX)).unwrap_or(ARM_NS);
        Some(Self { def, arm })
    }

    /// `def:<name>` attribute.
    pub fn def_attr(&self, node: Node<'_, '_>, name: &str) -> Option<String> {
        non_empty(node.attribute((self.def, name)))
    }

    pub fn def_children<'n, 'i>(
        &self,
        node: Node<'n, 'i>,
        local: &'static str,
    ) -> impl Iterator<Item = Node<'n, 'i>> + use<'n, 'i, 'a> {
        let ns = self.def;
        node.children()
            .filter(move |child| is_ns_element(*child, ns, local))
    }

    pub fn def_descendants<'n, 'i>(
        &self,
        node: Node<'n, 'i>,
        local: &'static str,
    ) -> impl Iterator<Item = Node<'n, 'i>> + use<'n, 'i, 'a> {
        let ns = self.def;
        node.descendants()
            .skip(1)
            .filter(move |child| is_ns_element(*child, ns, local))
    }
}

/// Unqualified attribute, `None` when absent or empty.
pub fn attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    non_empty(node.attribute(name))
}

pub fn is_element(node: Node<'_, '_>, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local
}

pub fn is_ns_element(node: Node<'_, '_>, ns: &str, local: &str) -> bool {
    is_element(node, local) && node.tag_name().namespace() == Some(ns)
}

/// Child elements with the given local name, any namespace.
pub fn children<'n, 'i>(
    node: Node<'n, 'i>,
    local: &'static str,
) -> impl Iterator<Item = Node<'n, 'i>> {
    node.children().filter(move |child| is_element(*child, local))
}

/// Descendant elements (excluding `node`) with the given local name, any namespace.
pub fn descendants<'n, 'i>(
    node: Node<'n, 'i>,
    local: &'static str,
) -> impl Iterator<Item = Node<'n, 'i>> {
    node.descendants()
        .skip(1)
        .filter(move |child| is_element(*child, local))
}

pub fn first_descendant<'n, 'i>(node: Node<'n, 'i>, local: &'static str) -> Option<Node<'n, 'i>> {
    descendants(node, local).next()
}

/// Follows a chain of descendant selectors, e.g. `["Origin", "Description", "TranslatedText"]`.
pub fn select<'n, 'i>(node: Node<'n, 'i>, path: &[&'static str]) -> Option<Node<'n, 'i>> {
    path.iter().copied().try_fold(node, first_descendant)
}

/// Concatenated text of all descendant text nodes, trimmed.
pub fn text_content(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|child| child.text())
        .collect();
    non_empty(Some(text.trim()))
}

pub fn select_text(node: Node<'_, '_>, path: &[&'static str]) -> Option<String> {
    select(node, path).and_then(text_content)
}

/// `Description/TranslatedText` directly under `node`.
pub fn translated_description(node: Node<'_, '_>) -> Option<String> {
    children(node, "Description")
        .next()
        .and_then(|description| first_descendant(description, "TranslatedText"))
        .and_then(text_content)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    const SAMPLE: &str = r#"<ODM xmlns="http://www.cdisc.org/ns/odm/v1.3" xmlns:def="http://www.cdisc.org/ns/def/v2.1">
  <ItemDef OID="IT.ADLB.AVAL" def:CommentOID="COM.AVAL" Name="">
    <Description><TranslatedText xml:lang="en"> Analysis Value </TranslatedText></Description>
    <Origin Type="Derived"><Description><TranslatedText>From LBSTRESN</TranslatedText></Description></Origin>
  </ItemDef>
</ODM>"#;

    #[test]
    fn resolves_def_namespace_once() {
        let doc = Document::parse(SAMPLE).expect("parse sample");
        let root = doc.root_element();
        let ns = Namespaces::from_root(root).expect("def namespace");
        assert_eq!(ns.def, "http://www.cdisc.org/ns/def/v2.1");
        assert_eq!(ns.arm, ARM_NS);

        let item = first_descendant(root, "ItemDef").expect("item def");
        assert_eq!(ns.def_attr(item, "CommentOID").as_deref(), Some("COM.AVAL"));
        assert_eq!(attr(item, "CommentOID"), None);
        assert_eq!(attr(item, "Name"), None);
    }

    #[test]
    fn description_is_scoped_to_direct_child() {
        let doc = Document::parse(SAMPLE).expect("parse sample");
        let item = first_descendant(doc.root_element(), "ItemDef").expect("item def");
        assert_eq!(
            translated_description(item).as_deref(),
            Some("Analysis Value")
        );
        assert_eq!(
            select_text(item, &["Origin", "Description", "TranslatedText"]).as_deref(),
            Some("From LBSTRESN")
        );
    }

    #[test]
    fn missing_def_prefix_is_detected() {
        let doc = Document::parse("<ODM/>").expect("parse");
        assert!(Namespaces::from_root(doc.root_element()).is_none());
    }
}
