//! Define-XML document parser.
//!
//! Walks the `MetaDataVersion` subtree once per entity kind and produces a
//! [`ParsedDefineXml`]. Structural failures abort the parse; missing optional
//! attributes and malformed range checks are logged and defaulted.

use define_model::{
    Alias, AnalysisResult, CodeList, CodeListItem, Comment, Comparator, Decode, Dictionary,
    Document, EnumeratedItem, ItemDef, ItemGroup, ItemRef, MetaData, Method, ParsedDefineXml,
    RangeCheck, Standard, Study, ValueListDef, WhereClauseDef, YES,
};
use roxmltree::Node;

use crate::error::{ParseError, Result};
use crate::where_clause::{OidTerms, infer_check_values};
use crate::xml::{
    DEF_PREFIX, Namespaces, XLINK_NS, XML_NS, attr, children, descendants, first_descendant,
    is_element, is_ns_element, select_text, text_content, translated_description,
};

const META_DATA_VERSION: &str = "MetaDataVersion";

/// Parse Define-XML text into the typed document graph.
///
/// # Errors
///
/// Fails when the input is empty, is not well-formed XML, the root does not
/// declare the `def` prefix, there is no `MetaDataVersion`, or a
/// `def:WhereClauseDef` has no `OID`.
pub fn parse_define_xml(xml: &str) -> Result<ParsedDefineXml> {
    if xml.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    let ns = Namespaces::from_root(root).ok_or_else(|| ParseError::MissingNamespace {
        prefix: DEF_PREFIX.to_string(),
    })?;

    let _span = tracing::info_span!("parse").entered();

    let mdv = root
        .descendants()
        .find(|node| is_element(*node, META_DATA_VERSION))
        .ok_or_else(|| ParseError::missing_element(META_DATA_VERSION))?;

    let item_groups: Vec<ItemGroup> = descendants(mdv, "ItemGroupDef")
        .map(|group| parse_item_group(group, &ns))
        .collect();
    let item_refs = item_groups
        .iter()
        .flat_map(|group| group.item_refs.iter().cloned())
        .collect();
    let (code_lists, dictionaries) = parse_code_lists(mdv, &ns);
    let where_clause_defs = ns
        .def_descendants(mdv, "WhereClauseDef")
        .map(|def| parse_where_clause_def(def, &ns))
        .collect::<Result<Vec<_>>>()?;

    let parsed = ParsedDefineXml {
        study: parse_study(root),
        meta_data: parse_meta_data(mdv, &ns),
        standards: ns
            .def_descendants(mdv, "Standard")
            .map(|standard| parse_standard(standard, &ns))
            .collect(),
        item_groups,
        item_defs: descendants(mdv, "ItemDef")
            .map(|item| parse_item_def(item, &ns))
            .collect(),
        methods: descendants(mdv, "MethodDef")
            .map(|method| parse_method(method, &ns))
            .collect(),
        comments: descendants(mdv, "CommentDef")
            .map(|comment| Comment {
                oid: attr(comment, "OID"),
                description: translated_description(comment),
            })
            .collect(),
        item_refs,
        code_lists,
        dictionaries,
        where_clause_defs,
        value_list_defs: ns
            .def_descendants(mdv, "ValueListDef")
            .map(|vld| ValueListDef {
                oid: attr(vld, "OID"),
                item_refs: children(vld, "ItemRef")
                    .map(|item| parse_item_ref(item, &ns))
                    .collect(),
                description: translated_description(vld),
            })
            .collect(),
        documents: ns
            .def_children(mdv, "leaf")
            .map(|leaf| Document {
                id: attr(leaf, "ID"),
                title: ns.def_descendants(leaf, "title").next().and_then(text_content),
                href: leaf
                    .attribute((XLINK_NS, "href"))
                    .filter(|href| !href.is_empty())
                    .map(str::to_string),
            })
            .collect(),
        analysis_results: mdv
            .descendants()
            .filter(|node| is_ns_element(*node, ns.arm, "AnalysisResult"))
            .map(|result| parse_analysis_result(result, &ns))
            .collect(),
    };

    tracing::info!(
        datasets = parsed.item_groups.len(),
        variables = parsed.item_defs.len(),
        codelists = parsed.code_lists.len(),
        dictionaries = parsed.dictionaries.len(),
        where_clauses = parsed.where_clause_defs.len(),
        value_lists = parsed.value_list_defs.len(),
        analysis_results = parsed.analysis_results.len(),
        "Parsed Define-XML"
    );
    Ok(parsed)
}

fn parse_study(root: Node<'_, '_>) -> Study {
    let study = root.descendants().find(|node| is_element(*node, "Study"));
    let text = |local| first_descendant(root, local).and_then(text_content);
    Study {
        oid: study.and_then(|node| attr(node, "OID")),
        name: text("StudyName"),
        description: text("StudyDescription"),
        protocol_name: text("ProtocolName"),
    }
}

fn parse_meta_data(mdv: Node<'_, '_>, ns: &Namespaces<'_>) -> MetaData {
    MetaData {
        oid: attr(mdv, "OID"),
        name: attr(mdv, "Name"),
        description: attr(mdv, "Description"),
        define_version: ns.def_attr(mdv, "DefineVersion"),
    }
}

fn parse_standard(node: Node<'_, '_>, ns: &Namespaces<'_>) -> Standard {
    Standard {
        oid: attr(node, "OID"),
        name: attr(node, "Name"),
        standard_type: attr(node, "Type"),
        status: attr(node, "Status"),
        version: attr(node, "Version"),
        publishing_set: attr(node, "PublishingSet"),
        comment_oid: ns.def_attr(node, "CommentOID"),
    }
}

fn parse_item_group(node: Node<'_, '_>, ns: &Namespaces<'_>) -> ItemGroup {
    ItemGroup {
        oid: attr(node, "OID"),
        name: attr(node, "Name"),
        sas_dataset_name: attr(node, "SASDatasetName"),
        repeating: attr(node, "Repeating"),
        purpose: attr(node, "Purpose"),
        is_reference_data: attr(node, "IsReferenceData"),
        standard_oid: ns.def_attr(node, "StandardOID"),
        structure: ns.def_attr(node, "Structure"),
        archive_location_id: ns.def_attr(node, "ArchiveLocationID"),
        comment_oid: ns.def_attr(node, "CommentOID"),
        description: translated_description(node),
        // Define 2.0 carries the class as an attribute, 2.1 as a child element.
        class: ns
            .def_attr(node, "Class")
            .or_else(|| first_descendant(node, "Class").and_then(|class| attr(class, "Name"))),
        item_refs: children(node, "ItemRef")
            .map(|item| parse_item_ref(item, ns))
            .collect(),
    }
}

fn parse_item_ref(node: Node<'_, '_>, ns: &Namespaces<'_>) -> ItemRef {
    ItemRef {
        oid: attr(node, "ItemOID"),
        mandatory: attr(node, "Mandatory"),
        order_number: attr(node, "OrderNumber"),
        method_oid: attr(node, "MethodOID"),
        role: attr(node, "Role"),
        where_clause_oid: ns
            .def_children(node, "WhereClauseRef")
            .next()
            .and_then(|wc| attr(wc, "WhereClauseOID")),
        key_sequence: attr(node, "KeySequence"),
        role_code_list_oid: attr(node, "RoleCodeListOID"),
    }
}

fn parse_item_def(node: Node<'_, '_>, ns: &Namespaces<'_>) -> ItemDef {
    let oid = attr(node, "OID");
    let origin = first_descendant(node, "Origin");
    let origin_pages = || {
        origin
            .and_then(|origin| first_descendant(origin, "PDFPageRef"))
            .and_then(|page| attr(page, "PageRefs"))
    };
    ItemDef {
        dataset: oid.as_deref().and_then(ItemDef::dataset_from_oid),
        oid,
        name: attr(node, "Name"),
        sas_field_name: attr(node, "SASFieldName"),
        data_type: attr(node, "DataType"),
        length: attr(node, "Length"),
        description: translated_description(node),
        origin_type: origin.and_then(|origin| attr(origin, "Type")),
        origin: origin.and_then(translated_description),
        origin_source: origin.and_then(|origin| attr(origin, "Source")),
        code_list_oid: first_descendant(node, "CodeListRef")
            .and_then(|code_list| attr(code_list, "CodeListOID")),
        significant_digits: attr(node, "SignificantDigits"),
        format: ns.def_attr(node, "DisplayFormat"),
        has_no_data: attr(node, "HasNoData"),
        comment_oid: ns.def_attr(node, "CommentOID"),
        assigned_value: ns.def_attr(node, "AssignedValue"),
        common: (ns.def_attr(node, "Common").as_deref() == Some(YES)).then_some(true),
        pages: ns.def_attr(node, "Pages").or_else(origin_pages),
        developer_notes: ns
            .def_descendants(node, "DeveloperNotes")
            .next()
            .and_then(text_content),
    }
}

fn parse_method(node: Node<'_, '_>, ns: &Namespaces<'_>) -> Method {
    let document = ns.def_descendants(node, "DocumentRef").next();
    Method {
        oid: attr(node, "OID"),
        name: attr(node, "Name"),
        method_type: attr(node, "Type"),
        description: translated_description(node),
        document: document.and_then(|doc| attr(doc, "leafID")),
        pages: document
            .and_then(|doc| ns.def_descendants(doc, "PDFPageRef").next())
            .and_then(|page| attr(page, "PageRefs")),
    }
}

fn parse_aliases<'n, 'i: 'n>(aliases: impl Iterator<Item = Node<'n, 'i>>) -> Vec<Alias> {
    aliases
        .map(|alias| Alias {
            name: attr(alias, "Name"),
            context: attr(alias, "Context"),
        })
        .collect()
}

/// Splits `CodeList` elements into inline codelists and external dictionaries.
fn parse_code_lists(mdv: Node<'_, '_>, ns: &Namespaces<'_>) -> (Vec<CodeList>, Vec<Dictionary>) {
    let mut code_lists = Vec::new();
    let mut dictionaries = Vec::new();
    for node in descendants(mdv, "CodeList") {
        if let Some(external) = first_descendant(node, "ExternalCodeList") {
            dictionaries.push(Dictionary {
                oid: attr(node, "OID"),
                name: attr(node, "Name"),
                data_type: attr(node, "DataType"),
                dictionary: attr(external, "Dictionary"),
                version: attr(external, "Version"),
            });
        } else {
            code_lists.push(parse_code_list(node, ns));
        }
    }
    tracing::debug!(
        code_lists = code_lists.len(),
        dictionaries = dictionaries.len(),
        "Partitioned codelists"
    );
    (code_lists, dictionaries)
}

fn parse_code_list(node: Node<'_, '_>, ns: &Namespaces<'_>) -> CodeList {
    let is_extended = |item: Node<'_, '_>| ns.def_attr(item, "ExtendedValue").as_deref() == Some(YES);
    CodeList {
        oid: attr(node, "OID"),
        name: attr(node, "Name"),
        data_type: attr(node, "DataType"),
        sas_format_name: attr(node, "SASFormatName"),
        standard_oid: ns.def_attr(node, "StandardOID"),
        is_non_standard: ns.def_attr(node, "IsNonStandard"),
        extended_value: is_extended(node).then_some(true),
        code_list_items: descendants(node, "CodeListItem")
            .map(|item| CodeListItem {
                coded_value: attr(item, "CodedValue"),
                order_number: attr(item, "OrderNumber"),
                rank: attr(item, "Rank"),
                extended_value: is_extended(item),
                decode: first_descendant(item, "Decode").map(|decode| {
                    let text = first_descendant(decode, "TranslatedText");
                    Decode {
                        translated_text: text.and_then(text_content),
                        lang: text
                            .and_then(|text| text.attribute((XML_NS, "lang")))
                            .map(str::to_string),
                    }
                }),
                aliases: parse_aliases(descendants(item, "Alias")),
            })
            .collect(),
        enumerated_items: descendants(node, "EnumeratedItem")
            .map(|item| EnumeratedItem {
                coded_value: attr(item, "CodedValue"),
                order_number: attr(item, "OrderNumber"),
                aliases: parse_aliases(descendants(item, "Alias")),
            })
            .collect(),
        aliases: parse_aliases(children(node, "Alias")),
    }
}

fn parse_where_clause_def(node: Node<'_, '_>, ns: &Namespaces<'_>) -> Result<WhereClauseDef> {
    let oid = attr(node, "OID").ok_or(ParseError::WhereClauseWithoutOid)?;
    let terms = OidTerms::parse(&oid);
    tracing::debug!(oid = %oid, variables = ?terms.variables, "Processing where clause");

    let range_checks = descendants(node, "RangeCheck")
        .map(|check| parse_range_check(check, ns, &oid, &terms))
        .collect();
    Ok(WhereClauseDef {
        comment_oid: ns.def_attr(node, "CommentOID"),
        oid,
        range_checks,
    })
}

fn parse_range_check(
    node: Node<'_, '_>,
    ns: &Namespaces<'_>,
    oid: &str,
    terms: &OidTerms,
) -> RangeCheck {
    let item_oid = ns.def_attr(node, "ItemOID");
    let (Some(raw_comparator), Some(item_oid)) = (attr(node, "Comparator"), item_oid.clone())
    else {
        tracing::warn!(oid, "RangeCheck is missing Comparator or def:ItemOID");
        return RangeCheck {
            item_oid: item_oid.unwrap_or_default(),
            ..RangeCheck::default()
        };
    };

    let comparator = raw_comparator.parse::<Comparator>().unwrap_or_else(|_| {
        tracing::warn!(oid, comparator = %raw_comparator, "Invalid comparator, using EQ");
        Comparator::Eq
    });
    let soft_hard = attr(node, "SoftHard")
        .and_then(|value| value.parse().ok())
        .unwrap_or_default();

    let mut check_values: Vec<String> = descendants(node, "CheckValue")
        .filter_map(text_content)
        .collect();
    if check_values.is_empty() {
        check_values = infer_check_values(terms);
        if check_values.is_empty() {
            tracing::warn!(oid, "Unable to infer check values");
        } else {
            tracing::debug!(oid, values = ?check_values, "Inferred check values from OID");
        }
    }

    RangeCheck {
        comparator,
        soft_hard,
        item_oid,
        check_values,
    }
}

fn parse_analysis_result(node: Node<'_, '_>, ns: &Namespaces<'_>) -> AnalysisResult {
    let documentation = first_descendant(node, "Documentation");
    let programming = first_descendant(node, "ProgrammingCode");
    let display = node
        .ancestors()
        .skip(1)
        .find(|ancestor| is_element(*ancestor, "ResultDisplay"));

    AnalysisResult {
        display: display.and_then(|display| attr(display, "Name")),
        id: attr(node, "OID"),
        description: select_text(node, &["Description", "TranslatedText"]),
        variables: join_non_empty(
            descendants(node, "AnalysisVariable").filter_map(|var| attr(var, "ItemOID")),
        ),
        reason: attr(node, "AnalysisReason"),
        purpose: attr(node, "AnalysisPurpose"),
        selection_criteria: join_non_empty(
            descendants(node, "WhereClauseRef").filter_map(|wc| attr(wc, "WhereClauseOID")),
        ),
        documentation: documentation
            .and_then(|doc| first_descendant(doc, "TranslatedText"))
            .and_then(text_content),
        documentation_refs: documentation.and_then(|doc| {
            join_non_empty(
                ns.def_descendants(doc, "DocumentRef")
                    .filter_map(|doc_ref| attr(doc_ref, "leafID")),
            )
        }),
        programming_context: programming.and_then(|code| attr(code, "Context")),
        programming_document: programming
            .and_then(|code| ns.def_descendants(code, "DocumentRef").next())
            .and_then(|doc_ref| attr(doc_ref, "leafID")),
        pages: display.and_then(|display| {
            join_non_empty(
                descendants(display, "PDFPageRef").filter_map(|page| attr(page, "PageRefs")),
            )
        }),
    }
}

fn join_non_empty(values: impl Iterator<Item = String>) -> Option<String> {
    let values: Vec<String> = values.collect();
    (!values.is_empty()).then(|| values.join(", "))
}
