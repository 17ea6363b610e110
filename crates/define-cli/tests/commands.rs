#![allow(missing_docs)]

use std::io::Write;

use define_cli::commands::{dataset_rows, document_summary, load_define, load_options, run_vlm};
use tempfile::NamedTempFile;

const DEFINE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ODM xmlns="http://www.cdisc.org/ns/odm/v1.3"
     xmlns:def="http://www.cdisc.org/ns/def/v2.1">
  <Study OID="STUDY03">
    <GlobalVariables>
      <StudyName>STUDY03</StudyName>
      <ProtocolName>PROT-03</ProtocolName>
    </GlobalVariables>
    <MetaDataVersion OID="MDV.STUDY03.ADaMIG.1.1" Name="Study 03" def:DefineVersion="2.0.0">
      <def:ValueListDef OID="VL.ADVS.AVAL">
        <ItemRef ItemOID="IT.ADVS.AVAL.SYSBP" Mandatory="No" OrderNumber="1">
          <def:WhereClauseRef WhereClauseOID="WC.ADVS.PARAMCD.EQ.SYSBP"/>
        </ItemRef>
      </def:ValueListDef>
      <def:WhereClauseDef OID="WC.ADVS.PARAMCD.EQ.SYSBP">
        <RangeCheck Comparator="EQ" SoftHard="Soft" def:ItemOID="IT.ADVS.PARAMCD">
          <CheckValue>SYSBP</CheckValue>
        </RangeCheck>
      </def:WhereClauseDef>
      <ItemGroupDef OID="IG.ADSL" Name="ADSL" Repeating="No" def:Class="SUBJECT LEVEL ANALYSIS DATASET">
        <ItemRef ItemOID="IT.ADSL.USUBJID" Mandatory="Yes"/>
      </ItemGroupDef>
      <ItemGroupDef OID="IG.ADVS" Name="ADVS" Repeating="Yes" def:Class="BASIC DATA STRUCTURE" def:Structure="One record per subject per parameter per visit">
        <ItemRef ItemOID="IT.ADVS.USUBJID" Mandatory="Yes"/>
        <ItemRef ItemOID="IT.ADVS.PARAMCD" Mandatory="Yes"/>
        <ItemRef ItemOID="IT.ADVS.AVAL" Mandatory="No"/>
      </ItemGroupDef>
      <ItemDef OID="IT.ADSL.USUBJID" Name="USUBJID" DataType="text"/>
      <ItemDef OID="IT.ADVS.USUBJID" Name="USUBJID" DataType="text"/>
      <ItemDef OID="IT.ADVS.PARAMCD" Name="PARAMCD" DataType="text"/>
      <ItemDef OID="IT.ADVS.AVAL" Name="AVAL" DataType="float">
        <def:Origin Type="Derived"/>
      </ItemDef>
      <ItemDef OID="IT.ADVS.AVAL.SYSBP" Name="AVAL" DataType="float">
        <Description><TranslatedText>Systolic value</TranslatedText></Description>
      </ItemDef>
    </MetaDataVersion>
  </Study>
</ODM>
"#;

fn define_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".xml")
        .tempfile()
        .expect("temp file");
    file.write_all(DEFINE.as_bytes()).expect("write define");
    file
}

#[test]
fn test_summary_counts() {
    let file = define_file();
    let import = load_define(file.path()).expect("load define");
    let summary = document_summary("define.xml", &import);
    assert_eq!(summary.study.as_deref(), Some("STUDY03"));
    assert_eq!(summary.protocol.as_deref(), Some("PROT-03"));
    assert_eq!(summary.define_version.as_deref(), Some("2.0.0"));
    assert!(summary.is_adam);
    assert_eq!(summary.count("Datasets"), Some(2));
    assert_eq!(summary.count("Variables"), Some(5));
    assert_eq!(summary.count("Value lists"), Some(1));
    assert_eq!(summary.count("Unknown"), None);
}

#[test]
fn test_dataset_rows() {
    let file = define_file();
    let import = load_define(file.path()).expect("load define");
    let rows = dataset_rows(&import.define);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "ADSL");
    assert!(!rows[0].vlm_eligible);
    assert_eq!(rows[0].value_lists, 0);
    assert_eq!(rows[0].derived, 0);
    assert_eq!(rows[1].name, "ADVS");
    assert!(rows[1].vlm_eligible);
    assert_eq!(rows[1].variables, 3);
    assert_eq!(rows[1].derived, 1);
    assert_eq!(rows[1].value_lists, 1);
}

#[test]
fn test_vlm_defaults_to_eligible_datasets() {
    let file = define_file();
    let import = load_define(file.path()).expect("load define");
    let outputs = run_vlm(&import.define, None, &load_options(None).expect("options"))
        .expect("run vlm");
    assert_eq!(outputs.len(), 1);
    let vlm = &outputs[0].vlm;
    assert_eq!(vlm.dataset, "ADVS");
    let aval = vlm.variable("AVAL").expect("AVAL");
    assert_eq!(aval.item_refs()[0].paramcd, "SYSBP");
    // Mapping came from the where clause, so PARAMCD is synthesized.
    assert!(vlm.variable("PARAMCD").is_some());
}

#[test]
fn test_vlm_unknown_dataset_fails() {
    let file = define_file();
    let import = load_define(file.path()).expect("load define");
    let error = run_vlm(&import.define, Some("ADXX"), &load_options(None).expect("options"))
        .expect_err("unknown dataset");
    assert!(error.to_string().contains("ADXX"));
}

#[test]
fn test_load_errors_carry_context() {
    let mut file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .expect("temp file");
    file.write_all(DEFINE.as_bytes()).expect("write define");
    let error = load_define(file.path()).expect_err("wrong extension");
    assert!(format!("{error:#}").starts_with("load define-xml"));

    let mut options = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(options, "missing_detail_limit = \"five\"").expect("write options");
    assert!(load_options(Some(options.path())).is_err());
}
