//! Node-kind classification for C (tree-sitter-c grammar).

use super::NodeCatalog;

pub static CATALOG: NodeCatalog = NodeCatalog {
    statement_kinds: &[
        "declaration",
        "expression_statement",
        "labeled_statement",
        "if_statement",
        "while_statement",
        "for_statement",
        "do_statement",
        "break_statement",
        "continue_statement",
        "return_statement",
        "switch_statement",
        "goto_statement",
        "case_statement",
    ],
    non_control_stmt: &["declaration", "expression_statement"],
    control_stmt: &[
        "labeled_statement",
        "if_statement",
        "while_statement",
        "for_statement",
        "do_statement",
        "break_statement",
        "continue_statement",
        "return_statement",
        "switch_statement",
        "goto_statement",
        "case_statement",
    ],
    loop_stmt: &["while_statement", "for_statement", "do_statement"],
    jump_stmt: &[
        "break_statement",
        "continue_statement",
        "return_statement",
        "goto_statement",
    ],
    block_holders: &[
        "compound_statement",
        "translation_unit",
        "case_statement",
        "function_definition",
        "else_clause",
    ],
    definition_kinds: &[
        "function_definition",
        "declaration",
        "struct_specifier",
        "union_specifier",
        "enum_specifier",
        "type_definition",
    ],
    scope_introducing_kinds: &[
        "compound_statement",
        "if_statement",
        "while_statement",
        "for_statement",
        "do_statement",
        "switch_statement",
        "case_statement",
        "function_definition",
    ],
    declarator_parents: &[
        "init_declarator",
        "declaration",
        "parameter_declaration",
        "pointer_declarator",
        "array_declarator",
        "function_declarator",
    ],
    type_kinds: &[
        "primitive_type",
        "type_identifier",
        "sized_type_specifier",
        "struct_specifier",
        "union_specifier",
        "enum_specifier",
    ],
    method_parents: &["function_declarator", "call_expression"],
    argument_list_kind: "argument_list",
    identifier_kinds: &["identifier", "field_identifier", "type_identifier"],
    atomic_leaf_kinds: &["string_literal", "char_literal", "variadic_parameter"],
    comment_kinds: &["comment"],
    function_kinds: &["function_definition"],
};
