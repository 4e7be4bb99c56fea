//! Selector interpreter.
//!
//! Site templates address page content with XPath 1.0 expressions, the
//! notation their authors already use in browser dev tools. `dom_query` only
//! speaks CSS, so this module compiles the XPath subset templates need into
//! an expression tree and evaluates it over the `dom_query` node tree.
//!
//! Supported:
//! - absolute and relative paths: `/`, `//`, `.`, `..`, `./`, `.//`
//! - axes: `child`, `descendant`, `descendant-or-self`, `parent`, `ancestor`,
//!   `ancestor-or-self`, `self`, `following-sibling`, `preceding-sibling`,
//!   `attribute` (also `@name`)
//! - node tests: names, `*`, `text()`, `node()`
//! - predicates: positions, `=`, `!=`, `<`, `<=`, `>`, `>=`, `and`, `or`
//! - functions: `contains`, `starts-with`, `normalize-space`, `not`,
//!   `position`, `last`, `string`, `string-length`, `concat`, `count`,
//!   `true`, `false`
//! - unions (`|`) and filter expressions (`(//a)[1]/@href`)
//!
//! Absolute paths search the whole document even when evaluated from a
//! root element, like lxml does. A `table/tr` step also reaches rows inside
//! the `tbody` html5ever inserts around bare rows, since lxml keeps them
//! directly under the table.

mod eval;
mod lexer;
mod syntax;

use dom_query::NodeRef;

use eval::{Evaluator, Item, Value};

pub use eval::DocumentIndex;
use syntax::{Expr, Parser};

/// Why a selector expression could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The expression is blank.
    #[error("empty expression")]
    Empty,

    /// A character that starts no token.
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Char offset in the expression.
        position: usize,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string literal starting at {position}")]
    UnterminatedLiteral {
        /// Char offset of the opening quote.
        position: usize,
    },

    /// A token that does not fit the grammar here.
    #[error("unexpected {found} at {position}")]
    UnexpectedToken {
        /// Description of the token.
        found: String,
        /// Char offset in the expression.
        position: usize,
    },

    /// The expression stops mid-construct.
    #[error("unexpected end of expression at {position}")]
    UnexpectedEnd {
        /// Char offset (the expression length).
        position: usize,
    },

    /// A function outside the supported set.
    #[error("unsupported function '{name}' at {position}")]
    UnknownFunction {
        /// Function name.
        name: String,
        /// Char offset in the expression.
        position: usize,
    },

    /// A supported function called with the wrong number of arguments.
    #[error("function '{name}' does not take {found} argument(s)")]
    WrongArity {
        /// Function name.
        name: String,
        /// Number of arguments given.
        found: usize,
    },

    /// An axis outside the supported set.
    #[error("unsupported axis '{name}' at {position}")]
    UnknownAxis {
        /// Axis name.
        name: String,
        /// Char offset in the expression.
        position: usize,
    },
}

/// A compiled selector expression.
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    source: String,
    expr: Expr,
}

impl XPath {
    /// Compiles an expression.
    ///
    /// # Example
    ///
    /// ```rust
    /// use calendar_extract::xpath::XPath;
    ///
    /// let doc = calendar_extract::dom::parse("<ul><li>a</li><li>b</li></ul>");
    /// let items = XPath::compile("//li[last()]")?;
    /// assert_eq!(items.select_strings(doc.root()), vec!["b".to_string()]);
    /// # Ok::<(), calendar_extract::xpath::SelectorError>(())
    /// ```
    pub fn compile(source: &str) -> Result<Self, SelectorError> {
        let tokens = lexer::tokenize(source)?;
        let expr = Parser::new(&tokens, source.chars().count()).parse()?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The expression as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates against `context` and returns the string value of every
    /// result: attribute values, text node contents, element text.
    ///
    /// Scalar results (`count(...)`, `string(...)`) come back as one string.
    /// Indexes the document on every call; use
    /// [`XPath::select_strings_in`] when evaluating many times.
    #[must_use]
    pub fn select_strings(&self, context: NodeRef<'_>) -> Vec<String> {
        self.select_strings_in(&DocumentIndex::new(context), context)
    }

    /// [`XPath::select_strings`] over a prebuilt index of `context`'s document.
    #[must_use]
    pub fn select_strings_in<'a>(&self, index: &DocumentIndex<'a>, context: NodeRef<'a>) -> Vec<String> {
        match Evaluator::new(index).evaluate(&self.expr, context) {
            Value::Nodes(items) => items.iter().map(Item::string_value).collect(),
            Value::Str(s) => vec![s],
            Value::Num(n) => vec![eval::format_number(n)],
            Value::Bool(b) => vec![b.to_string()],
        }
    }

    /// Evaluates against `context` and keeps only tree nodes (elements,
    /// text), dropping attributes and scalar results.
    #[must_use]
    pub fn select_nodes<'a>(&self, context: NodeRef<'a>) -> Vec<NodeRef<'a>> {
        self.select_nodes_in(&DocumentIndex::new(context), context)
    }

    /// [`XPath::select_nodes`] over a prebuilt index of `context`'s document.
    #[must_use]
    pub fn select_nodes_in<'a>(&self, index: &DocumentIndex<'a>, context: NodeRef<'a>) -> Vec<NodeRef<'a>> {
        match Evaluator::new(index).evaluate(&self.expr, context) {
            Value::Nodes(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Item::Node(node) => Some(node),
                    Item::Attribute { .. } => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl std::str::FromStr for XPath {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}
