pub mod dataset;
pub mod document;
pub mod error;
pub mod lookup;
pub mod vlm;

pub use dataset::{normalize_dataset_id, same_dataset};
pub use document::{
    Alias, AnalysisResult, BASIC_DATA_STRUCTURE, CodeList, CodeListItem, Comment, Comparator,
    DataTypeClass, Decode, Dictionary, Document, EnumeratedItem, ItemDef, ItemGroup, ItemRef,
    MetaData, Method, ParsedDefineXml, RangeCheck, SoftHard, Standard, Study, ValueListDef,
    WhereClauseDef, YES,
};
pub use error::{ModelError, Result};
pub use lookup::DefineIndex;
pub use vlm::{
    CodelistEntry, CodelistInfo, CommentInfo, MethodInfo, NON_PARAMETERIZED, OriginInfo, PARAM,
    PARAMCD, ParamInfo, ProcessedVlm, Stratification, VlmItemRef, VlmValueList, VlmVariable,
    VlmWhereClause, WhereClauseResult, WhereClauseSource, WhereCondition,
};
