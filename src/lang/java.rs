//! Node-kind classification for Java (tree-sitter-java grammar).

use super::NodeCatalog;

pub static CATALOG: NodeCatalog = NodeCatalog {
    statement_kinds: &[
        "local_variable_declaration",
        "expression_statement",
        "labeled_statement",
        "if_statement",
        "while_statement",
        "do_statement",
        "for_statement",
        "enhanced_for_statement",
        "break_statement",
        "continue_statement",
        "return_statement",
        "switch_expression",
        "throw_statement",
        "try_statement",
        "try_with_resources_statement",
        "synchronized_statement",
    ],
    non_control_stmt: &["local_variable_declaration", "expression_statement"],
    control_stmt: &[
        "labeled_statement",
        "if_statement",
        "while_statement",
        "do_statement",
        "for_statement",
        "enhanced_for_statement",
        "break_statement",
        "continue_statement",
        "return_statement",
        "switch_expression",
        "throw_statement",
        "try_statement",
        "try_with_resources_statement",
        "synchronized_statement",
    ],
    loop_stmt: &[
        "while_statement",
        "do_statement",
        "for_statement",
        "enhanced_for_statement",
    ],
    jump_stmt: &["break_statement", "continue_statement", "return_statement"],
    block_holders: &[
        "program",
        "block",
        "class_body",
        "interface_body",
        "enum_body",
        "constructor_body",
        "switch_block",
        "switch_block_statement_group",
    ],
    definition_kinds: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "annotation_type_declaration",
        "method_declaration",
        "constructor_declaration",
        "field_declaration",
    ],
    scope_introducing_kinds: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "annotation_type_declaration",
        "class_body",
        "interface_body",
        "enum_body",
        "method_declaration",
        "constructor_declaration",
        "constructor_body",
        "block",
        "lambda_expression",
        "catch_clause",
        "for_statement",
        "enhanced_for_statement",
        "try_with_resources_statement",
        "switch_block",
        "switch_block_statement_group",
    ],
    declarator_parents: &[
        "variable_declarator",
        "formal_parameter",
        "spread_parameter",
        "catch_formal_parameter",
        "resource",
        "enhanced_for_statement",
    ],
    type_kinds: &[
        "type_identifier",
        "integral_type",
        "floating_point_type",
        "boolean_type",
        "void_type",
        "generic_type",
        "array_type",
        "scoped_type_identifier",
    ],
    method_parents: &["method_declaration", "constructor_declaration", "method_invocation"],
    argument_list_kind: "argument_list",
    identifier_kinds: &["identifier", "type_identifier"],
    atomic_leaf_kinds: &["string_literal", "character_literal"],
    comment_kinds: &["line_comment", "block_comment"],
    function_kinds: &["method_declaration", "constructor_declaration"],
};
