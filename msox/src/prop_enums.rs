use from_to_repr::from_to_other;


/// Identifiers of the tagged properties whose values this crate decodes.
#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = u16, derive_compare = "as_int")]
pub enum PropTag {
    TagExtendedRuleMessageActions = 0x0E99,
    TagSourceKey = 0x65E0,
    TagParentSourceKey = 0x65E1,
    TagChangeKey = 0x65E2,
    TagPredecessorChangeList = 0x65E3,
    TagRuleActions = 0x6680,
    TagSearchFolderTemplateId = 0x6841,
    TagSearchFolderId = 0x6842,
    TagSearchFolderDefinition = 0x6845,
    Other(u16),
}
