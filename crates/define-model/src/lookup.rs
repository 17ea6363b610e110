use std::collections::HashMap;

use crate::document::{CodeList, Comment, ItemDef, Method, ParsedDefineXml, WhereClauseDef};

/// OID-keyed view over a parsed document.
///
/// Built once per document and dropped with it; the first definition wins
/// when an OID is declared twice.
#[derive(Debug, Clone)]
pub struct DefineIndex<'a> {
    item_defs: HashMap<&'a str, &'a ItemDef>,
    code_lists: HashMap<&'a str, &'a CodeList>,
    comments: HashMap<&'a str, &'a Comment>,
    methods: HashMap<&'a str, &'a Method>,
    where_clauses: HashMap<&'a str, &'a WhereClauseDef>,
}

impl<'a> DefineIndex<'a> {
    pub fn new(define: &'a ParsedDefineXml) -> Self {
        Self {
            item_defs: index_by(&define.item_defs, |def| def.oid.as_deref()),
            code_lists: index_by(&define.code_lists, |list| list.oid.as_deref()),
            comments: index_by(&define.comments, |comment| comment.oid.as_deref()),
            methods: index_by(&define.methods, |method| method.oid.as_deref()),
            where_clauses: index_by(&define.where_clause_defs, |def| Some(def.oid.as_str())),
        }
    }

    pub fn item_def(&self, oid: &str) -> Option<&'a ItemDef> {
        self.item_defs.get(oid).copied()
    }

    pub fn code_list(&self, oid: &str) -> Option<&'a CodeList> {
        self.code_lists.get(oid).copied()
    }

    pub fn comment(&self, oid: &str) -> Option<&'a Comment> {
        self.comments.get(oid).copied()
    }

    pub fn method(&self, oid: &str) -> Option<&'a Method> {
        self.methods.get(oid).copied()
    }

    pub fn where_clause_def(&self, oid: &str) -> Option<&'a WhereClauseDef> {
        self.where_clauses.get(oid).copied()
    }
}

fn index_by<'a, T>(
    items: &'a [T],
    key: impl Fn(&'a T) -> Option<&'a str>,
) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        if let Some(oid) = key(item) {
            map.entry(oid).or_insert(item);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_declaration_wins() {
        let define = ParsedDefineXml {
            comments: vec![
                Comment {
                    oid: Some("COM.1".to_string()),
                    description: Some("first".to_string()),
                },
                Comment {
                    oid: Some("COM.1".to_string()),
                    description: Some("second".to_string()),
                },
            ],
            ..ParsedDefineXml::default()
        };
        let index = DefineIndex::new(&define);
        assert_eq!(
            index.comment("COM.1").and_then(|c| c.description.as_deref()),
            Some("first")
        );
        assert!(index.comment("COM.2").is_none());
    }

    #[test]
    fn where_clauses_are_indexed_by_oid() {
        let define = ParsedDefineXml {
            where_clause_defs: vec![
                WhereClauseDef {
                    oid: "WC.ADLB.PARAMCD.EQ.ALB".to_string(),
                    ..WhereClauseDef::default()
                },
                WhereClauseDef {
                    oid: "WC.ADLB.PARAMCD.EQ.ALT".to_string(),
                    comment_oid: Some("COM.ALT".to_string()),
                    ..WhereClauseDef::default()
                },
            ],
            ..ParsedDefineXml::default()
        };
        let index = DefineIndex::new(&define);
        assert_eq!(
            index
                .where_clause_def("WC.ADLB.PARAMCD.EQ.ALT")
                .and_then(|def| def.comment_oid.as_deref()),
            Some("COM.ALT")
        );
        assert!(index.where_clause_def("WC.ADLB.PARAMCD.EQ.GLUC").is_none());
    }
}
