//! Compiles a parse tree into a [`QueryNode`] tree against a field schema.
//!
//! Boolean nodes are reduced bottom-up. Each run of the same operator, as
//! grouped by the parser, becomes one `bool` node. `NOT` becomes a
//! `must_not` clause and parentheses vanish.
//! Field queries fan out over every field the field name resolves to, one
//! clause per field, chosen by the field's declared type.

use tracing::{debug, trace};

use crate::ast::{BoolOp, FieldName, FieldValue, NodeKind, ParseNode, RangeOp};
use crate::config::CompilerConfig;
use crate::error::{ParsingError, Result};
use crate::escape;
use crate::extract::{extract_text, has_wildcard};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::query::{
    ExistsNode, MatchNode, MultiMatchNode, QueryNode, QueryStringNode, RangeNode, TermNode,
    WildcardNode,
};
use crate::schema::{FieldSchemaProvider, FieldType, ResolvedField};
use crate::token::TokenKind;

/// Turns query text into a query tree.
pub struct QueryCompiler<S> {
    schema: S,
    config: CompilerConfig,
}

impl<S: FieldSchemaProvider> QueryCompiler<S> {
    pub fn new(schema: S) -> Self {
        Self {
            schema,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(schema: S, config: CompilerConfig) -> Self {
        Self { schema, config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles one query. Input without any query matches everything.
    pub fn compile(&self, input: &str) -> Result<QueryNode> {
        debug!(query = input, "compiling query");

        let tokens = Lexer::tokenize(input);
        let mut parser = Parser::new(&tokens);
        let tree = match parser.parse()? {
            Some(node) => self.compile_node(&node)?,
            None => QueryNode::MatchAll {},
        };

        debug!(depth = tree.depth(), "compiled query");
        Ok(tree)
    }

    /// Compiles one parse node and everything below it.
    pub fn compile_node(&self, node: &ParseNode<'_>) -> Result<QueryNode> {
        match &node.kind {
            NodeKind::Boolean { op, operands } => {
                let clauses = operands
                    .iter()
                    .map(|operand| self.compile_node(operand))
                    .collect::<Result<Vec<_>>>()?;

                Ok(match op {
                    BoolOp::And => QueryNode::conjunction(clauses),
                    BoolOp::Or => QueryNode::disjunction(clauses),
                })
            }
            NodeKind::Not(inner) => Ok(QueryNode::negation(self.compile_node(inner)?)),
            NodeKind::Parenthesized(inner) => self.compile_node(inner),
            NodeKind::MatchAll => Ok(QueryNode::MatchAll {}),
            NodeKind::Exists { field } => self.compile_exists(field),
            NodeKind::Range { field, op, value } => self.compile_range(field, *op, value),
            NodeKind::Field { field, value } => self.compile_field(field, value),
            NodeKind::FieldLess { value } => self.compile_field_less(value),
        }
    }

    fn compile_field(&self, field: &FieldName<'_>, value: &FieldValue<'_>) -> Result<QueryNode> {
        let text = extract_text(&value.tokens)?;
        let wildcard = has_wildcard(&value.tokens);

        let clauses = self
            .resolve_fields(field)?
            .into_iter()
            .map(|resolved| match resolved.field_type {
                FieldType::Keyword if wildcard => QueryNode::Wildcard(WildcardNode {
                    field: resolved.name,
                    pattern: text.clone(),
                    case_insensitive: self.config.case_insensitive,
                }),
                FieldType::Keyword => QueryNode::Term(TermNode {
                    field: resolved.name,
                    value: text.clone(),
                    case_insensitive: self.config.case_insensitive,
                }),
                // a point in time is the range covering the value's precision
                FieldType::Date => QueryNode::Range(RangeNode {
                    field: resolved.name,
                    from: Some(text.clone()),
                    to: Some(text.clone()),
                    include_lower: true,
                    include_upper: true,
                    time_zone: self.config.time_zone.clone(),
                }),
                FieldType::Text | FieldType::Numeric => QueryNode::Match(MatchNode {
                    field: resolved.name,
                    text: text.clone(),
                }),
            })
            .collect();

        Ok(QueryNode::any_of(clauses))
    }

    fn compile_range(
        &self,
        field: &FieldName<'_>,
        op: RangeOp,
        value: &FieldValue<'_>,
    ) -> Result<QueryNode> {
        let text = extract_text(&value.tokens)?;

        let clauses = self
            .resolve_fields(field)?
            .into_iter()
            .map(|resolved| {
                let time_zone = match resolved.field_type {
                    FieldType::Date => self.config.time_zone.clone(),
                    _ => None,
                };
                let (from, to, include_lower, include_upper) = match op {
                    RangeOp::Lt => (None, Some(text.clone()), true, false),
                    RangeOp::Lte => (None, Some(text.clone()), true, true),
                    RangeOp::Gt => (Some(text.clone()), None, false, true),
                    RangeOp::Gte => (Some(text.clone()), None, true, true),
                };
                QueryNode::Range(RangeNode {
                    field: resolved.name,
                    from,
                    to,
                    include_lower,
                    include_upper,
                    time_zone,
                })
            })
            .collect();

        Ok(QueryNode::any_of(clauses))
    }

    fn compile_exists(&self, field: &FieldName<'_>) -> Result<QueryNode> {
        let clauses = self
            .resolve_fields(field)?
            .into_iter()
            .map(|resolved| QueryNode::Exists(ExistsNode {
                field: resolved.name,
            }))
            .collect();

        Ok(QueryNode::any_of(clauses))
    }

    fn compile_field_less(&self, value: &FieldValue<'_>) -> Result<QueryNode> {
        let text = extract_text(&value.tokens)?;
        let default_field = self.config.default_field.clone();

        if has_wildcard(&value.tokens) {
            return Ok(QueryNode::QueryString(QueryStringNode {
                query: escape::escape_query_string(&text, true),
                default_field,
            }));
        }

        Ok(QueryNode::MultiMatch(MultiMatchNode {
            query: text,
            phrase: value.is_quoted(),
            lenient: true,
            default_field,
        }))
    }

    /// Looks the field name up in the schema. Quoted names are exact names.
    fn resolve_fields(&self, field: &FieldName<'_>) -> Result<Vec<ResolvedField>> {
        let token = &field.token;
        let name = match token.kind {
            TokenKind::Wildcard => token.text.to_string(),
            TokenKind::QuotedLiteral | TokenKind::UnquotedLiteral => escape::decode(token)?,
            other => {
                return Err(ParsingError::type_mismatch(
                    format!(
                        "Invalid field name [{}]: expected a literal but found {}",
                        token.text,
                        other.describe()
                    ),
                    token.position,
                ))
            }
        };

        let resolved = self.schema.resolve(&name, field.is_literal());
        trace!(
            pattern = %name,
            literal = field.is_literal(),
            fields = resolved.len(),
            "resolved field pattern"
        );
        Ok(resolved)
    }
}
