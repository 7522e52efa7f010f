//! Compiler from KQL query text to a structured search query tree.
//!
//! ```text
//! text ──Lexer──▶ tokens ──Parser──▶ ParseNode ──QueryCompiler──▶ QueryNode
//!                                                   ▲
//!                                       FieldSchemaProvider
//! ```

pub mod ast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod escape;
pub mod extract;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod schema;
pub mod token;

pub use compiler::QueryCompiler;
pub use config::CompilerConfig;
pub use error::{ConfigError, ErrorKind, ParsingError, Result};
pub use query::QueryNode;
pub use schema::{FieldSchemaProvider, FieldType, ResolvedField, StaticSchema};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compiles `input` against `schema` with the default configuration.
pub fn compile(input: &str, schema: &dyn FieldSchemaProvider) -> Result<QueryNode> {
    QueryCompiler::new(schema).compile(input)
}

/// Compiles `input` against `schema` with an explicit configuration.
pub fn compile_with_config(
    input: &str,
    schema: &dyn FieldSchemaProvider,
    config: CompilerConfig,
) -> Result<QueryNode> {
    QueryCompiler::with_config(schema, config).compile(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_entry_point() {
        let schema = StaticSchema::new().with_field("status", FieldType::Keyword);

        assert_eq!(compile("", &schema).unwrap(), QueryNode::MatchAll {});
        assert_eq!(
            compile("status:open", &schema).unwrap(),
            QueryNode::Term(query::TermNode {
                field: "status".to_string(),
                value: "open".to_string(),
                case_insensitive: true,
            })
        );

        let err = compile("status:(open", &schema).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_compile_with_config() {
        let schema = StaticSchema::new().with_field("status", FieldType::Keyword);
        let config = CompilerConfig::default().with_case_insensitive(false);

        let QueryNode::Term(term) = compile_with_config("status:Open", &schema, config).unwrap()
        else {
            panic!("Expected term node");
        };
        assert!(!term.case_insensitive);
    }
}
