//! Expression tree and recursive-descent parser for selector expressions.
//!
//! Precedence, loosest first: `or`, `and`, `=`/`!=`, `<`/`<=`/`>`/`>=`,
//! `|`, then path and filter expressions.

use super::lexer::{Spanned, Token};
use super::SelectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfNode,
    FollowingSibling,
    PrecedingSibling,
    Attribute,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Self::Child,
            "descendant" => Self::Descendant,
            "descendant-or-self" => Self::DescendantOrSelf,
            "parent" => Self::Parent,
            "ancestor" => Self::Ancestor,
            "ancestor-or-self" => Self::AncestorOrSelf,
            "self" => Self::SelfNode,
            "following-sibling" => Self::FollowingSibling,
            "preceding-sibling" => Self::PrecedingSibling,
            "attribute" => Self::Attribute,
            _ => return None,
        })
    }

    /// Reverse axes number their nodes nearest-first.
    pub(crate) const fn is_reverse(self) -> bool {
        matches!(self, Self::Parent | Self::Ancestor | Self::AncestorOrSelf | Self::PrecedingSibling)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    /// Element (or attribute, on the attribute axis) with this name.
    Name(String),
    /// `*`
    Any,
    /// `text()`
    Text,
    /// `node()`
    Node,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn abbreviated(axis: Axis) -> Self {
        Self {
            axis,
            test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Contains,
    StartsWith,
    NormalizeSpace,
    Not,
    Position,
    Last,
    String,
    StringLength,
    Concat,
    Count,
    True,
    False,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "contains" => Self::Contains,
            "starts-with" => Self::StartsWith,
            "normalize-space" => Self::NormalizeSpace,
            "not" => Self::Not,
            "position" => Self::Position,
            "last" => Self::Last,
            "string" => Self::String,
            "string-length" => Self::StringLength,
            "concat" => Self::Concat,
            "count" => Self::Count,
            "true" => Self::True,
            "false" => Self::False,
            _ => return None,
        })
    }

    /// Accepted argument counts, inclusive.
    const fn arity(self) -> (usize, usize) {
        match self {
            Self::Contains | Self::StartsWith => (2, 2),
            Self::NormalizeSpace | Self::String | Self::StringLength => (0, 1),
            Self::Not | Self::Count => (1, 1),
            Self::Position | Self::Last | Self::True | Self::False => (0, 0),
            Self::Concat => (2, usize::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Union(Vec<Expr>),
    Path { absolute: bool, steps: Vec<Step> },
    /// `(expr)[predicate]/steps`
    Filter {
        base: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
    Literal(String),
    Number(f64),
    Call(Function, Vec<Expr>),
}

pub(crate) struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    source_len: usize,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Spanned], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, SelectorError> {
        if self.tokens.is_empty() {
            return Err(SelectorError::Empty);
        }
        let expr = self.or_expr()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some((token, position)) => Err(SelectorError::UnexpectedToken {
                found: token.describe(),
                position: *position,
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), SelectorError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> SelectorError {
        match self.tokens.get(self.pos) {
            Some((token, position)) => SelectorError::UnexpectedToken {
                found: token.describe(),
                position: *position,
            },
            None => SelectorError::UnexpectedEnd {
                position: self.source_len,
            },
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(name)) if name == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.and_expr()?;
        while self.eat_keyword("or") {
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.equality_expr()?;
        while self.eat_keyword("and") {
            let rhs = self.equality_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn equality_expr(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::Neq) => CompareOp::Neq,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.relational_expr()?;
            lhs = Expr::Compare(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn relational_expr(&mut self) -> Result<Expr, SelectorError> {
        let mut lhs = self.union_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.union_expr()?;
            lhs = Expr::Compare(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn union_expr(&mut self) -> Result<Expr, SelectorError> {
        let first = self.path_expr()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }
        let mut branches = vec![first];
        while self.eat(&Token::Pipe) {
            branches.push(self.path_expr()?);
        }
        Ok(Expr::Union(branches))
    }

    fn path_expr(&mut self) -> Result<Expr, SelectorError> {
        match self.peek() {
            Some(Token::Literal(text)) => {
                let expr = Expr::Literal(text.clone());
                self.pos += 1;
                Ok(expr)
            }
            Some(Token::Number(n)) => {
                let expr = Expr::Number(*n);
                self.pos += 1;
                Ok(expr)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.or_expr()?;
                self.expect(&Token::RParen)?;
                self.filter_tail(inner)
            }
            Some(Token::Name(name))
                if self.peek_at(1) == Some(&Token::LParen) && !is_node_type(name) =>
            {
                let call = self.function_call()?;
                self.filter_tail(call)
            }
            Some(Token::Slash) => {
                self.pos += 1;
                let steps = if self.at_step_start() {
                    self.relative_steps()?
                } else {
                    Vec::new()
                };
                Ok(Expr::Path {
                    absolute: true,
                    steps,
                })
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let mut steps = vec![Step::abbreviated(Axis::DescendantOrSelf)];
                steps.extend(self.relative_steps()?);
                Ok(Expr::Path {
                    absolute: true,
                    steps,
                })
            }
            _ if self.at_step_start() => Ok(Expr::Path {
                absolute: false,
                steps: self.relative_steps()?,
            }),
            _ => Err(self.unexpected()),
        }
    }

    /// Predicates and a trailing relative path after a primary expression.
    fn filter_tail(&mut self, base: Expr) -> Result<Expr, SelectorError> {
        let predicates = self.predicates()?;
        let steps = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                self.relative_steps()?
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let mut steps = vec![Step::abbreviated(Axis::DescendantOrSelf)];
                steps.extend(self.relative_steps()?);
                steps
            }
            _ => Vec::new(),
        };

        if predicates.is_empty() && steps.is_empty() {
            return Ok(base);
        }
        Ok(Expr::Filter {
            base: Box::new(base),
            predicates,
            steps,
        })
    }

    fn function_call(&mut self) -> Result<Expr, SelectorError> {
        let Some((Token::Name(name), position)) = self.tokens.get(self.pos).cloned() else {
            return Err(self.unexpected());
        };
        let function = Function::from_name(&name).ok_or_else(|| SelectorError::UnknownFunction {
            name: name.clone(),
            position,
        })?;
        self.pos += 1;
        self.expect(&Token::LParen)?;

        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.or_expr()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma)?;
            }
        }

        let (min, max) = function.arity();
        if args.len() < min || args.len() > max {
            return Err(SelectorError::WrongArity {
                name,
                found: args.len(),
            });
        }
        Ok(Expr::Call(function, args))
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn relative_steps(&mut self) -> Result<Vec<Step>, SelectorError> {
        let mut steps = vec![self.step()?];
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.pos += 1;
                    steps.push(self.step()?);
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step::abbreviated(Axis::DescendantOrSelf));
                    steps.push(self.step()?);
                }
                _ => return Ok(steps),
            }
        }
    }

    fn step(&mut self) -> Result<Step, SelectorError> {
        if self.eat(&Token::Dot) {
            return Ok(Step::abbreviated(Axis::SelfNode));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::abbreviated(Axis::Parent));
        }

        let axis = if self.eat(&Token::At) {
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::DoubleColon)) = (self.peek(), self.peek_at(1)) {
            let position = self.tokens[self.pos].1;
            let axis = Axis::from_name(name).ok_or_else(|| SelectorError::UnknownAxis {
                name: name.clone(),
                position,
            })?;
            self.pos += 2;
            axis
        } else {
            Axis::Child
        };

        let test = self.node_test()?;
        let predicates = self.predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn node_test(&mut self) -> Result<NodeTest, SelectorError> {
        match self.peek().cloned() {
            Some(Token::Star) => {
                self.pos += 1;
                Ok(NodeTest::Any)
            }
            Some(Token::Name(name)) if is_node_type(&name) && self.peek_at(1) == Some(&Token::LParen) => {
                self.pos += 1;
                self.expect(&Token::LParen)?;
                self.expect(&Token::RParen)?;
                Ok(if name == "text" { NodeTest::Text } else { NodeTest::Node })
            }
            Some(Token::Name(name)) => {
                self.pos += 1;
                Ok(NodeTest::Name(name.to_ascii_lowercase()))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn predicates(&mut self) -> Result<Vec<Expr>, SelectorError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.or_expr()?);
            self.expect(&Token::RBracket)?;
        }
        Ok(predicates)
    }
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "text" | "node")
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse(source: &str) -> Result<Expr, SelectorError> {
        let tokens = tokenize(source)?;
        Parser::new(&tokens, source.chars().count()).parse()
    }

    #[test]
    fn test_descendant_shorthand_expands() {
        let Expr::Path { absolute, steps } = parse("//h1").unwrap() else {
            panic!("expected a path");
        };
        assert!(absolute);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].axis, Axis::DescendantOrSelf);
        assert_eq!(steps[1].test, NodeTest::Name("h1".into()));
    }

    #[test]
    fn test_relative_attribute_path() {
        let Expr::Path { absolute, steps } = parse(".//a/@href").unwrap() else {
            panic!("expected a path");
        };
        assert!(!absolute);
        let axes: Vec<Axis> = steps.iter().map(|s| s.axis).collect();
        assert_eq!(
            axes,
            [Axis::SelfNode, Axis::DescendantOrSelf, Axis::Child, Axis::Attribute]
        );
    }

    #[test]
    fn test_predicate_with_function() {
        let Expr::Path { steps, .. } = parse("//div[contains(@class, 'event') and position() = 1]").unwrap() else {
            panic!("expected a path");
        };
        assert!(matches!(steps[1].predicates[0], Expr::And(_, _)));
    }

    #[test]
    fn test_text_node_test() {
        let Expr::Path { steps, .. } = parse("p/text()").unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(steps[1].test, NodeTest::Text);
    }

    #[test]
    fn test_filter_expression() {
        assert!(matches!(parse("(//a)[1]/@href").unwrap(), Expr::Filter { .. }));
    }

    #[test]
    fn test_union() {
        assert!(matches!(parse("//h1 | //h2").unwrap(), Expr::Union(ref b) if b.len() == 2));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse(""), Err(SelectorError::Empty)));
        assert!(matches!(parse("//a["), Err(SelectorError::UnexpectedEnd { .. })));
        assert!(matches!(parse("//a[foo(1)]"), Err(SelectorError::UnknownFunction { .. })));
        assert!(matches!(parse("//a[contains(@x)]"), Err(SelectorError::WrongArity { .. })));
        assert!(matches!(parse("sideways::a"), Err(SelectorError::UnknownAxis { .. })));
        assert!(matches!(parse("//a]"), Err(SelectorError::UnexpectedToken { .. })));
    }
}
