//! The compiled query tree handed to the execution engine.
//!
//! Node and field names follow the Elasticsearch query DSL so that the tree
//! serializes to something an engine speaking that DSL already understands.

use serde::Serialize;

/// A node of the compiled query tree. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryNode {
    Bool(BoolNode),
    Term(TermNode),
    Wildcard(WildcardNode),
    Match(MatchNode),
    Range(RangeNode),
    Exists(ExistsNode),
    MultiMatch(MultiMatchNode),
    QueryString(QueryStringNode),
    MatchAll {},
    /// No field matched: matches no document.
    MatchNone {},
}

/// Boolean combination of sub-queries. An empty node matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BoolNode {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<QueryNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<QueryNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<QueryNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<u32>,
}

/// Exact match on a keyword field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermNode {
    pub field: String,
    pub value: String,
    pub case_insensitive: bool,
}

/// Pattern match where `*` stands for any sequence of characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WildcardNode {
    pub field: String,
    pub pattern: String,
    pub case_insensitive: bool,
}

/// Analyzed match of free text against one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchNode {
    pub field: String,
    pub text: String,
}

/// Bounded range. An absent bound is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeNode {
    pub field: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub include_lower: bool,
    pub include_upper: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// The field holds a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistsNode {
    pub field: String,
}

/// Free text with no field, matched across the default fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiMatchNode {
    pub query: String,
    /// Match the words as a phrase rather than independently.
    pub phrase: bool,
    /// Ignore type errors from fields the text cannot be parsed for.
    pub lenient: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,
}

/// Lucene query-string syntax, used for field-less wildcard queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryStringNode {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,
}

impl QueryNode {
    /// `must` over the operands; a single operand stands for itself.
    pub fn conjunction(mut clauses: Vec<QueryNode>) -> Self {
        if clauses.len() == 1 {
            if let Some(only) = clauses.pop() {
                return only;
            }
        }
        QueryNode::Bool(BoolNode {
            must: clauses,
            ..Default::default()
        })
    }

    /// `should` over the operands with one required match.
    pub fn disjunction(clauses: Vec<QueryNode>) -> Self {
        QueryNode::Bool(BoolNode {
            should: clauses,
            minimum_should_match: Some(1),
            ..Default::default()
        })
    }

    /// Like [`QueryNode::disjunction`], but nothing becomes `MatchNone` and a
    /// single clause stands for itself.
    pub fn any_of(mut clauses: Vec<QueryNode>) -> Self {
        match clauses.len() {
            0 => QueryNode::MatchNone {},
            1 => clauses.pop().unwrap_or(QueryNode::MatchNone {}),
            _ => Self::disjunction(clauses),
        }
    }

    pub fn negation(clause: QueryNode) -> Self {
        QueryNode::Bool(BoolNode {
            must_not: vec![clause],
            ..Default::default()
        })
    }

    /// Depth of the tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            QueryNode::Bool(node) => {
                1 + node
                    .must
                    .iter()
                    .chain(&node.should)
                    .chain(&node.must_not)
                    .map(QueryNode::depth)
                    .max()
                    .unwrap_or(0)
            }
            _ => 1,
        }
    }
}
