//! Evaluation of compiled selector expressions over a `dom_query` tree.

use std::collections::HashMap;

use dom_query::{NodeId, NodeRef};

use super::syntax::{Axis, CompareOp, Expr, Function, NodeTest, Step};

/// A node in a result set. Attributes are not tree nodes in `dom_query`, so
/// they carry their owner and value.
#[derive(Clone)]
pub(crate) enum Item<'a> {
    Node(NodeRef<'a>),
    Attribute {
        owner: NodeRef<'a>,
        slot: usize,
        name: String,
        value: String,
    },
}

impl Item<'_> {
    pub(crate) fn string_value(&self) -> String {
        match self {
            Self::Node(node) => node.text().to_string(),
            Self::Attribute { value, .. } => value.clone(),
        }
    }
}

pub(crate) enum Value<'a> {
    Nodes(Vec<Item<'a>>),
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Value<'_> {
    fn to_bool(&self) -> bool {
        match self {
            Self::Nodes(items) => !items.is_empty(),
            Self::Str(s) => !s.is_empty(),
            Self::Num(n) => *n != 0.0 && !n.is_nan(),
            Self::Bool(b) => *b,
        }
    }

    fn to_text(&self) -> String {
        match self {
            Self::Nodes(items) => items.first().map(Item::string_value).unwrap_or_default(),
            Self::Str(s) => s.clone(),
            Self::Num(n) => format_number(*n),
            Self::Bool(b) => b.to_string(),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Self::Num(n) => *n,
            Self::Bool(b) => f64::from(u8::from(*b)),
            other => parse_number(&other.to_text()),
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let whole = n as i64;
        whole.to_string()
    } else {
        n.to_string()
    }
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(f64::NAN)
}

/// Context item with its position in the current node list (1-based).
struct Focus<'a> {
    item: Item<'a>,
    position: usize,
    size: usize,
}

/// Document order of every node in one tree.
///
/// Building it walks the whole tree, so build it once per document and pass
/// it to [`XPath::select_strings_in`](super::XPath::select_strings_in) for
/// every root and selector evaluated over that document.
pub struct DocumentIndex<'a> {
    root: NodeRef<'a>,
    order: HashMap<NodeId, usize>,
}

impl<'a> DocumentIndex<'a> {
    /// Indexes the tree `node` belongs to.
    #[must_use]
    pub fn new(node: NodeRef<'a>) -> Self {
        let mut root = node;
        while let Some(parent) = root.parent() {
            root = parent;
        }

        let mut order = HashMap::new();
        order.insert(root.id, 0);
        for node in root.descendants() {
            let next = order.len();
            order.entry(node.id).or_insert(next);
        }

        Self { root, order }
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub(crate) struct Evaluator<'i, 'a> {
    index: &'i DocumentIndex<'a>,
}

impl<'i, 'a> Evaluator<'i, 'a> {
    pub(crate) fn new(index: &'i DocumentIndex<'a>) -> Self {
        Self { index }
    }

    pub(crate) fn evaluate(&self, expr: &Expr, context: NodeRef<'a>) -> Value<'a> {
        let focus = Focus {
            item: Item::Node(context),
            position: 1,
            size: 1,
        };
        self.eval(expr, &focus)
    }

    fn eval(&self, expr: &Expr, focus: &Focus<'a>) -> Value<'a> {
        match expr {
            Expr::Or(lhs, rhs) => {
                Value::Bool(self.eval(lhs, focus).to_bool() || self.eval(rhs, focus).to_bool())
            }
            Expr::And(lhs, rhs) => {
                Value::Bool(self.eval(lhs, focus).to_bool() && self.eval(rhs, focus).to_bool())
            }
            Expr::Compare(op, lhs, rhs) => {
                Value::Bool(compare(*op, &self.eval(lhs, focus), &self.eval(rhs, focus)))
            }
            Expr::Union(branches) => {
                let mut items = Vec::new();
                for branch in branches {
                    if let Value::Nodes(found) = self.eval(branch, focus) {
                        items.extend(found);
                    }
                }
                Value::Nodes(self.in_document_order(items))
            }
            Expr::Path { absolute, steps } => {
                let start = if *absolute {
                    Item::Node(self.index.root)
                } else {
                    focus.item.clone()
                };
                Value::Nodes(self.apply_steps(vec![start], steps))
            }
            Expr::Filter {
                base,
                predicates,
                steps,
            } => match self.eval(base, focus) {
                Value::Nodes(items) => {
                    let items = self.apply_predicates(items, predicates);
                    Value::Nodes(self.apply_steps(items, steps))
                }
                _ => Value::Nodes(Vec::new()),
            },
            Expr::Literal(text) => Value::Str(text.clone()),
            Expr::Number(n) => Value::Num(*n),
            Expr::Call(function, args) => self.call(*function, args, focus),
        }
    }

    fn call(&self, function: Function, args: &[Expr], focus: &Focus<'a>) -> Value<'a> {
        let text_arg = |index: usize| -> String {
            args.get(index)
                .map_or_else(|| focus.item.string_value(), |arg| self.eval(arg, focus).to_text())
        };

        match function {
            Function::Contains => Value::Bool(text_arg(0).contains(&text_arg(1))),
            Function::StartsWith => Value::Bool(text_arg(0).starts_with(&text_arg(1))),
            Function::NormalizeSpace => {
                Value::Str(text_arg(0).split_whitespace().collect::<Vec<_>>().join(" "))
            }
            Function::Not => Value::Bool(!self.eval(&args[0], focus).to_bool()),
            #[allow(clippy::cast_precision_loss)]
            Function::Position => Value::Num(focus.position as f64),
            #[allow(clippy::cast_precision_loss)]
            Function::Last => Value::Num(focus.size as f64),
            Function::String => Value::Str(text_arg(0)),
            #[allow(clippy::cast_precision_loss)]
            Function::StringLength => Value::Num(text_arg(0).chars().count() as f64),
            Function::Concat => Value::Str((0..args.len()).map(text_arg).collect()),
            #[allow(clippy::cast_precision_loss)]
            Function::Count => match self.eval(&args[0], focus) {
                Value::Nodes(items) => Value::Num(items.len() as f64),
                _ => Value::Num(0.0),
            },
            Function::True => Value::Bool(true),
            Function::False => Value::Bool(false),
        }
    }

    fn apply_steps(&self, start: Vec<Item<'a>>, steps: &[Step]) -> Vec<Item<'a>> {
        let mut current = start;
        for step in steps {
            let mut next = Vec::new();
            for item in &current {
                let mut candidates: Vec<Item<'a>> = axis_items(item, step.axis)
                    .into_iter()
                    .filter(|candidate| matches_test(candidate, step.axis, &step.test))
                    .collect();
                if let Some(rows) = implied_rows(item, step) {
                    candidates.extend(rows);
                    candidates = self.in_document_order(candidates);
                }
                next.extend(self.apply_predicates(candidates, &step.predicates));
            }
            current = self.in_document_order(next);
        }
        current
    }

    /// Filters `items` (in axis order) through each predicate in turn.
    fn apply_predicates(&self, mut items: Vec<Item<'a>>, predicates: &[Expr]) -> Vec<Item<'a>> {
        for predicate in predicates {
            let size = items.len();
            items = items
                .into_iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    let focus = Focus {
                        item,
                        position: index + 1,
                        size,
                    };
                    let keep = match self.eval(predicate, &focus) {
                        #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
                        Value::Num(n) => n == focus.position as f64,
                        other => other.to_bool(),
                    };
                    keep.then_some(focus.item)
                })
                .collect();
        }
        items
    }

    fn sort_key(&self, item: &Item<'a>) -> (usize, usize) {
        match item {
            Item::Node(node) => (self.position_of(node.id), 0),
            Item::Attribute { owner, slot, .. } => (self.position_of(owner.id), slot + 1),
        }
    }

    fn position_of(&self, id: NodeId) -> usize {
        self.index.order.get(&id).copied().unwrap_or(usize::MAX)
    }

    fn in_document_order(&self, mut items: Vec<Item<'a>>) -> Vec<Item<'a>> {
        items.sort_by_key(|item| self.sort_key(item));
        items.dedup_by_key(|item| self.sort_key(item));
        items
    }
}

fn axis_items<'a>(item: &Item<'a>, axis: Axis) -> Vec<Item<'a>> {
    let node = match item {
        Item::Node(node) => *node,
        Item::Attribute { owner, .. } => {
            return match axis {
                Axis::SelfNode => vec![item.clone()],
                Axis::Parent => vec![Item::Node(*owner)],
                Axis::Ancestor | Axis::AncestorOrSelf => {
                    let mut out = if axis == Axis::AncestorOrSelf {
                        vec![item.clone()]
                    } else {
                        Vec::new()
                    };
                    out.push(Item::Node(*owner));
                    out.extend(ancestors(*owner).into_iter().map(Item::Node));
                    out
                }
                _ => Vec::new(),
            };
        }
    };

    let nodes: Vec<NodeRef<'a>> = match axis {
        Axis::Child => node.children().into_iter().collect(),
        Axis::Descendant => descendants(node),
        Axis::DescendantOrSelf => {
            let mut out = vec![node];
            out.extend(descendants(node));
            out
        }
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Ancestor => ancestors(node),
        Axis::AncestorOrSelf => {
            let mut out = vec![node];
            out.extend(ancestors(node));
            out
        }
        Axis::SelfNode => vec![node],
        Axis::FollowingSibling => {
            let mut out = Vec::new();
            let mut current = node.next_sibling();
            while let Some(sibling) = current {
                current = sibling.next_sibling();
                out.push(sibling);
            }
            out
        }
        Axis::PrecedingSibling => {
            let mut out = Vec::new();
            let mut current = node.prev_sibling();
            while let Some(sibling) = current {
                current = sibling.prev_sibling();
                out.push(sibling);
            }
            out
        }
        Axis::Attribute => {
            if !node.is_element() {
                return Vec::new();
            }
            return node
                .attrs()
                .iter()
                .enumerate()
                .map(|(slot, attr)| Item::Attribute {
                    owner: node,
                    slot,
                    name: attr.name.local.to_string(),
                    value: attr.value.to_string(),
                })
                .collect();
        }
    };

    nodes.into_iter().map(Item::Node).collect()
}

/// Rows html5ever moved into a `tbody` it inserted itself.
///
/// Templates are written against parsers that keep `<tr>` directly under
/// `<table>`, so `table/tr` also reaches rows one `tbody` level down.
fn implied_rows<'a>(item: &Item<'a>, step: &Step) -> Option<Vec<Item<'a>>> {
    let Item::Node(table) = item else {
        return None;
    };
    let NodeTest::Name(name) = &step.test else {
        return None;
    };
    if step.axis != Axis::Child || !name.eq_ignore_ascii_case("tr") || !has_tag(*table, "table") {
        return None;
    }

    let rows: Vec<Item<'a>> = table
        .children()
        .into_iter()
        .filter(|child| has_tag(*child, "tbody"))
        .flat_map(|tbody| tbody.children())
        .filter(|row| has_tag(*row, "tr"))
        .map(Item::Node)
        .collect();
    (!rows.is_empty()).then_some(rows)
}

fn has_tag(node: NodeRef<'_>, tag: &str) -> bool {
    node.is_element() && node.node_name().is_some_and(|name| name.eq_ignore_ascii_case(tag))
}

fn descendants(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    node.descendants()
        .into_iter()
        .filter(|descendant| descendant.id != node.id)
        .collect()
}

/// Ancestors, nearest first.
fn ancestors(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    let mut out = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        current = parent.parent();
        out.push(parent);
    }
    out
}

fn matches_test(item: &Item<'_>, axis: Axis, test: &NodeTest) -> bool {
    match item {
        Item::Attribute { name: attr, .. } => match test {
            NodeTest::Name(name) => axis == Axis::Attribute && attr.eq_ignore_ascii_case(name),
            NodeTest::Any => axis == Axis::Attribute,
            NodeTest::Node => true,
            NodeTest::Text => false,
        },
        Item::Node(node) => match test {
            NodeTest::Name(name) => has_tag(*node, name),
            NodeTest::Any => node.is_element(),
            NodeTest::Text => node.is_text(),
            NodeTest::Node => true,
        },
    }
}

enum Atom {
    Str(String),
    Num(f64),
}

fn atoms(value: &Value<'_>) -> Vec<Atom> {
    match value {
        Value::Nodes(items) => items.iter().map(|item| Atom::Str(item.string_value())).collect(),
        Value::Str(s) => vec![Atom::Str(s.clone())],
        Value::Num(n) => vec![Atom::Num(*n)],
        Value::Bool(b) => vec![Atom::Num(f64::from(u8::from(*b)))],
    }
}

fn compare(op: CompareOp, lhs: &Value<'_>, rhs: &Value<'_>) -> bool {
    if let (Value::Bool(_), _) | (_, Value::Bool(_)) = (lhs, rhs) {
        let (a, b) = (f64::from(u8::from(lhs.to_bool())), f64::from(u8::from(rhs.to_bool())));
        return compare_numbers(op, a, b);
    }

    let left = atoms(lhs);
    let right = atoms(rhs);
    left.iter()
        .any(|a| right.iter().any(|b| compare_atoms(op, a, b)))
}

fn compare_atoms(op: CompareOp, lhs: &Atom, rhs: &Atom) -> bool {
    match (op, lhs, rhs) {
        (CompareOp::Eq, Atom::Str(a), Atom::Str(b)) => a == b,
        (CompareOp::Neq, Atom::Str(a), Atom::Str(b)) => a != b,
        _ => compare_numbers(op, atom_number(lhs), atom_number(rhs)),
    }
}

fn atom_number(atom: &Atom) -> f64 {
    match atom {
        Atom::Str(s) => parse_number(s),
        Atom::Num(n) => *n,
    }
}

#[allow(clippy::float_cmp)]
fn compare_numbers(op: CompareOp, a: f64, b: f64) -> bool {
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Neq => a != b,
        CompareOp::Lt => a < b,
        CompareOp::Le => a <= b,
        CompareOp::Gt => a > b,
        CompareOp::Ge => a >= b,
    }
}
