//! Query abstract syntax tree.
//!
//! Every node renders in a fully parenthesized canonical form, so
//! `a or b and c` prints as `(a or (b and c))`.

use std::fmt;

/// Kind of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomKind {
    /// A tag name, or a bare literal.
    Tag,
    /// `date`, `money` or `currency`.
    Keyword,
    /// A quoted literal.
    String,
}

/// A leaf of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// What kind of atom this is.
    pub kind: AtomKind,
    /// The atom text as written in the query.
    pub value: String,
}

impl Atom {
    /// Create an atom.
    pub fn new(kind: AtomKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `^=`: left starts with right.
    StartsWith,
    /// `*=`: left contains right.
    Contains,
    /// `$=`: left ends with right.
    EndsWith,
}

impl Relation {
    /// The operator as written in a query.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::StartsWith => "^=",
            Self::Contains => "*=",
            Self::EndsWith => "$=",
        }
    }

    /// Check whether the operator only applies to text.
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::StartsWith | Self::Contains | Self::EndsWith)
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Logical `and`.
    And,
    /// Logical `or`.
    Or,
    /// A comparison.
    Relation(Relation),
}

impl BinaryOp {
    const ALL: [Self; 11] = [
        Self::Or,
        Self::And,
        Self::Relation(Relation::Lt),
        Self::Relation(Relation::Le),
        Self::Relation(Relation::Eq),
        Self::Relation(Relation::Ne),
        Self::Relation(Relation::Ge),
        Self::Relation(Relation::Gt),
        Self::Relation(Relation::StartsWith),
        Self::Relation(Relation::Contains),
        Self::Relation(Relation::EndsWith),
    ];

    /// Look up an operator by its symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// The operator as written in a query.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Relation(relation) => relation.symbol(),
        }
    }

    /// Binding strength; higher binds tighter.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 2,
            Self::And => 3,
            Self::Relation(_) => 7,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// A tag, keyword or literal.
    Atom(Atom),
    /// `not <operand>`.
    Not(Box<Ast>),
    /// `<left> <op> <right>`.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Ast>,
        /// Right operand.
        right: Box<Ast>,
    },
}

impl Ast {
    /// Build a binary node.
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The atom, if this node is one.
    pub const fn as_atom(&self) -> Option<&Atom> {
        match self {
            Self::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    /// Number of nodes on the longest path from this node to an atom.
    pub fn height(&self) -> usize {
        match self {
            Self::Atom(_) => 1,
            Self::Not(operand) => 1 + operand.height(),
            Self::Binary { left, right, .. } => 1 + left.height().max(right.height()),
        }
    }

    /// The kind of this node when it is an atom.
    pub fn atom_kind(&self) -> Option<AtomKind> {
        self.as_atom().map(|atom| atom.kind)
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atom) => f.write_str(&atom.value),
            Self::Not(operand) => write!(f, "(not {operand})"),
            Self::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
        }
    }
}
