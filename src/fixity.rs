//! Operator precedence resolution.
//!
//! The parser leaves operator chains flat (`InfixExp`) because fixities can
//! be declared anywhere in a module, including after their first use. This
//! pass re-associates each chain with a [`FixityTable`] following the
//! resolution algorithm of the Haskell 2010 report (section 10.6).

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::cst::nodes::{AstNode, Exp, FixityDecl, InfixElement, InfixExp, Op};
use crate::cst::{SyntaxToken, SyntaxTree};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::parser::Parse;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fixity {
    pub assoc: Assoc,
    pub precedence: u8,
}

impl Fixity {
    /// Operators without a fixity declaration are `infixl 9`.
    pub const DEFAULT: Fixity = Fixity::new(Assoc::Left, 9);

    /// Prefix negation binds like binary `-`.
    pub const NEGATE: Fixity = Fixity::new(Assoc::Left, 6);

    pub const fn new(assoc: Assoc, precedence: u8) -> Self {
        Self { assoc, precedence }
    }
}

impl fmt::Display for Fixity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.assoc {
            Assoc::Left => "infixl",
            Assoc::Right => "infixr",
            Assoc::None => "infix",
        };
        write!(f, "{} {}", keyword, self.precedence)
    }
}

static PRELUDE: Lazy<FixityTable> = Lazy::new(|| {
    use Assoc::*;
    let groups: &[(Assoc, u8, &[&str])] = &[
        (Right, 9, &["."]),
        (Left, 9, &["!!"]),
        (Right, 8, &["^", "^^", "**"]),
        (Left, 7, &["*", "/", "quot", "rem", "div", "mod"]),
        (Left, 6, &["+", "-"]),
        (Right, 6, &["<>"]),
        (Right, 5, &[":", "++", ":|"]),
        (None, 4, &["==", "/=", "<", "<=", ">=", ">", "elem", "notElem"]),
        (Left, 4, &["<$>", "<$", "$>", "<*>", "<*", "*>"]),
        (Left, 3, &["<|>"]),
        (Right, 3, &["&&"]),
        (Right, 2, &["||"]),
        (Left, 1, &[">>", ">>=", "&", "<&>"]),
        (Right, 1, &["=<<", "<=<", ">=>"]),
        (Left, 0, &["on"]),
        (Right, 0, &["$", "$!", "seq"]),
    ];
    let mut table = FixityTable::empty();
    for &(assoc, precedence, operators) in groups {
        for &op in operators {
            table.insert(op, Fixity::new(assoc, precedence));
        }
    }
    table
});

/// Operator name to fixity. Qualification is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixityTable {
    fixities: HashMap<String, Fixity>,
}

impl FixityTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fixities of the Prelude and the common `base` operators.
    pub fn prelude() -> Self {
        PRELUDE.clone()
    }

    /// The Prelude table overridden by every fixity declaration in `tree`.
    pub fn for_tree(tree: &SyntaxTree) -> Self {
        let mut table = Self::prelude();
        table.declare_from(tree);
        table
    }

    pub fn insert(&mut self, operator: &str, fixity: Fixity) {
        self.fixities.insert(operator.to_string(), fixity);
    }

    pub fn get(&self, operator: &str) -> Fixity {
        self.fixities.get(operator).copied().unwrap_or(Fixity::DEFAULT)
    }

    pub fn contains(&self, operator: &str) -> bool {
        self.fixities.contains_key(operator)
    }

    /// Add the `infix`, `infixl` and `infixr` declarations found in `tree`.
    pub fn declare_from(&mut self, tree: &SyntaxTree) {
        for decl in tree.root().descendants().filter_map(FixityDecl::cast) {
            let Some(keyword) = decl.keyword() else {
                continue;
            };
            let assoc = match keyword.text() {
                "infixl" => Assoc::Left,
                "infixr" => Assoc::Right,
                _ => Assoc::None,
            };
            let precedence = decl.precedence_value().unwrap_or(9).min(9);
            for op in decl.operators() {
                if let Some(name) = op.name() {
                    log::trace!("fixity {} {} {}", keyword.text(), precedence, name);
                    self.insert(name, Fixity::new(assoc, precedence));
                }
            }
        }
    }
}

/// An operator chain after precedence resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpTree<'t> {
    Operand(Exp<'t>),
    Negate {
        minus: SyntaxToken<'t>,
        operand: Box<OpTree<'t>>,
    },
    Binary {
        op: Op<'t>,
        lhs: Box<OpTree<'t>>,
        rhs: Box<OpTree<'t>>,
    },
}

impl OpTree<'_> {
    pub fn span(&self) -> Span {
        match self {
            OpTree::Operand(exp) => exp.span(),
            OpTree::Negate { minus, operand } => minus.span().merge(operand.span()),
            OpTree::Binary { lhs, rhs, .. } => lhs.span().merge(rhs.span()),
        }
    }
}

/// Fully parenthesised form: `(1 + (2 * 3))`, `(-x)`.
impl fmt::Display for OpTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpTree::Operand(exp) => f.write_str(exp.text()),
            OpTree::Negate { operand, .. } => write!(f, "(-{})", operand),
            OpTree::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.text(), rhs),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixityError {
    #[error("cannot mix `{left}` [{left_fixity}] and `{right}` [{right_fixity}] in the same infix expression")]
    Conflict {
        left: String,
        left_fixity: Fixity,
        right: String,
        right_fixity: Fixity,
        span: Span,
    },

    #[error("cannot mix `{op}` [{fixity}] and prefix `-` [infixl 6] in the same infix expression")]
    Negation { op: String, fixity: Fixity, span: Span },
}

impl FixityError {
    pub fn span(&self) -> Span {
        match self {
            FixityError::Conflict { span, .. } | FixityError::Negation { span, .. } => *span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(DiagnosticKind::Fixity, self.to_string(), self.span())
    }
}

#[derive(Debug, Clone, Copy)]
enum Item<'t> {
    Operand(Exp<'t>),
    Operator(Op<'t>),
    Negate(SyntaxToken<'t>),
}

/// The operator being completed while resolving a chain.
#[derive(Debug, Clone, Copy)]
struct Pending<'t> {
    name: &'t str,
    fixity: Fixity,
}

/// Outer context of a chain: binds looser than any operator.
const OUTER_PRECEDENCE: i16 = -1;

struct Resolver<'a, 't> {
    items: Vec<Item<'t>>,
    pos: usize,
    table: &'a FixityTable,
}

/// Ran out of operands: the chain is malformed and a syntax error has
/// already been reported for it.
struct Incomplete;

enum Failure {
    Fixity(FixityError),
    Incomplete,
}

impl From<Incomplete> for Failure {
    fn from(_: Incomplete) -> Self {
        Failure::Incomplete
    }
}

impl<'a, 't> Resolver<'a, 't> {
    fn fixity_of(&self, op: &Op<'t>) -> (&'t str, Fixity) {
        let name = op.name().unwrap_or("");
        (name, self.table.get(name))
    }

    /// `parseNeg`: an operand, possibly negated.
    fn operand(&mut self, outer: Option<Pending<'t>>) -> Result<OpTree<'t>, Failure> {
        match self.items.get(self.pos).copied() {
            Some(Item::Operand(exp)) => {
                self.pos += 1;
                self.continue_chain(outer, OpTree::Operand(exp))
            }
            Some(Item::Negate(minus)) => {
                if let Some(outer) = outer {
                    if outer.fixity.precedence >= Fixity::NEGATE.precedence {
                        return Err(Failure::Fixity(FixityError::Negation {
                            op: outer.name.to_string(),
                            fixity: outer.fixity,
                            span: minus.span(),
                        }));
                    }
                }
                self.pos += 1;
                let negation = Pending {
                    name: "-",
                    fixity: Fixity::NEGATE,
                };
                let operand = self.operand(Some(negation))?;
                let negated = OpTree::Negate {
                    minus,
                    operand: Box::new(operand),
                };
                self.continue_chain(outer, negated)
            }
            _ => Err(Incomplete.into()),
        }
    }

    /// `parse1`: extend `lhs` with operators that bind tighter than `outer`.
    fn continue_chain(
        &mut self,
        outer: Option<Pending<'t>>,
        mut lhs: OpTree<'t>,
    ) -> Result<OpTree<'t>, Failure> {
        loop {
            let Some(Item::Operator(op)) = self.items.get(self.pos).copied() else {
                return Ok(lhs);
            };
            let (name, fixity) = self.fixity_of(&op);
            let outer_precedence = outer.map_or(OUTER_PRECEDENCE, |o| o.fixity.precedence as i16);
            if let Some(outer) = outer {
                if outer.fixity.precedence == fixity.precedence
                    && (outer.fixity.assoc != fixity.assoc || fixity.assoc == Assoc::None)
                {
                    return Err(Failure::Fixity(FixityError::Conflict {
                        left: outer.name.to_string(),
                        left_fixity: outer.fixity,
                        right: name.to_string(),
                        right_fixity: fixity,
                        span: op.span(),
                    }));
                }
            }
            let binds_left = outer_precedence > fixity.precedence as i16
                || (outer_precedence == fixity.precedence as i16 && fixity.assoc == Assoc::Left);
            if binds_left {
                return Ok(lhs);
            }
            self.pos += 1;
            let rhs = self.operand(Some(Pending { name, fixity }))?;
            lhs = OpTree::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }
}

/// Resolve one chain. `Ok(None)` for chains broken by syntax errors.
pub fn resolve_chain<'t>(
    chain: InfixExp<'t>,
    table: &FixityTable,
) -> Result<Option<OpTree<'t>>, FixityError> {
    let items = chain
        .elements()
        .map(|element| match element {
            InfixElement::Operand(exp) => Item::Operand(exp),
            InfixElement::Operator(op) => Item::Operator(op),
            InfixElement::Negate(minus) => Item::Negate(minus),
        })
        .collect();
    let mut resolver = Resolver {
        items,
        pos: 0,
        table,
    };
    match resolver.operand(None) {
        Ok(tree) if resolver.pos == resolver.items.len() => Ok(Some(tree)),
        Ok(_) | Err(Failure::Incomplete) => Ok(None),
        Err(Failure::Fixity(error)) => Err(error),
    }
}

/// Every chain of a tree with its resolution.
#[derive(Debug, Clone)]
pub struct Resolution<'t> {
    pub chains: Vec<(InfixExp<'t>, OpTree<'t>)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'t> Resolution<'t> {
    /// The resolved tree of the chain spanning exactly `span`.
    pub fn chain_at(&self, span: Span) -> Option<&OpTree<'t>> {
        self.chains
            .iter()
            .find(|(chain, _)| chain.span() == span)
            .map(|(_, tree)| tree)
    }
}

pub fn resolve<'t>(tree: &'t SyntaxTree, table: &FixityTable) -> Resolution<'t> {
    let mut chains = Vec::new();
    let mut diagnostics = Vec::new();
    for chain in tree.root().descendants().filter_map(InfixExp::cast) {
        match resolve_chain(chain, table) {
            Ok(Some(resolved)) => chains.push((chain, resolved)),
            Ok(None) => {}
            Err(error) => {
                log::debug!("fixity error at {}: {}", error.span(), error);
                diagnostics.push(error.to_diagnostic().with_node(chain.syntax().id()));
            }
        }
    }
    Resolution {
        chains,
        diagnostics,
    }
}

impl Parse {
    /// Resolve operator chains with the Prelude fixities and the module's
    /// own declarations.
    pub fn resolve_fixities(&self) -> Resolution<'_> {
        let table = FixityTable::for_tree(self.tree());
        resolve(self.tree(), &table)
    }

    pub fn resolve_fixities_with(&self, table: &FixityTable) -> Resolution<'_> {
        resolve(self.tree(), table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_with, EntryPoint, ParseOptions};

    fn resolve_expression(source: &str) -> Vec<String> {
        let options = ParseOptions {
            entry_point: EntryPoint::Expression,
            ..ParseOptions::default()
        };
        let parse = parse_with(source, &options).unwrap();
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
        let resolution = parse.resolve_fixities();
        assert!(resolution.diagnostics.is_empty(), "{:?}", resolution.diagnostics);
        resolution.chains.iter().map(|(_, tree)| tree.to_string()).collect()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(resolve_expression("1 + 2 * 3"), vec!["(1 + (2 * 3))"]);
        assert_eq!(resolve_expression("1 * 2 + 3"), vec!["((1 * 2) + 3)"]);
    }

    #[test]
    fn test_associativity() {
        assert_eq!(resolve_expression("a - b - c"), vec!["((a - b) - c)"]);
        assert_eq!(resolve_expression("xs ++ ys ++ zs"), vec!["(xs ++ (ys ++ zs))"]);
        assert_eq!(resolve_expression("f . g $ x"), vec!["((f . g) $ x)"]);
    }

    #[test]
    fn test_backtick_and_unknown_operators() {
        assert_eq!(resolve_expression("x `div` 2 + 1"), vec!["((x `div` 2) + 1)"]);
        // No declaration: infixl 9
        assert_eq!(resolve_expression("a |> b * c"), vec!["((a |> b) * c)"]);
    }

    #[test]
    fn test_negation() {
        assert_eq!(resolve_expression("- x * y"), vec!["(-(x * y))"]);
        assert_eq!(resolve_expression("a == - b"), vec!["(a == (-b))"]);
    }

    #[test]
    fn test_negation_after_tighter_operator() {
        let options = ParseOptions {
            entry_point: EntryPoint::Expression,
            ..ParseOptions::default()
        };
        let parse = parse_with("a * - b", &options).unwrap();
        let resolution = parse.resolve_fixities();
        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(resolution.diagnostics[0].span, Span::new(4, 5));
    }

    #[test]
    fn test_non_associative_conflict() {
        let options = ParseOptions {
            entry_point: EntryPoint::Expression,
            ..ParseOptions::default()
        };
        let parse = parse_with("a == b == c", &options).unwrap();
        let resolution = parse.resolve_fixities();
        assert!(resolution.chains.is_empty());
        assert_eq!(resolution.diagnostics.len(), 1);
        let diagnostic = &resolution.diagnostics[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::Fixity);
        assert_eq!(diagnostic.span, Span::new(7, 9));
        assert!(diagnostic.message.contains("cannot mix `==` [infix 4]"));
    }

    #[test]
    fn test_module_fixity_declaration() {
        let source = "infixr 5 +++\nx = a +++ b +++ c\ninfixl 1 |>\ny = a |> f |> g\n";
        let parse = crate::parse(source).unwrap();
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
        let resolution = parse.resolve_fixities();
        let rendered: Vec<String> = resolution.chains.iter().map(|(_, t)| t.to_string()).collect();
        assert_eq!(rendered, vec!["(a +++ (b +++ c))", "((a |> f) |> g)"]);
    }

    #[test]
    fn test_custom_table() {
        let options = ParseOptions {
            entry_point: EntryPoint::Expression,
            ..ParseOptions::default()
        };
        let parse = parse_with("a + b * c", &options).unwrap();
        let mut table = FixityTable::empty();
        table.insert("+", Fixity::new(Assoc::Left, 8));
        table.insert("*", Fixity::new(Assoc::Left, 7));
        let resolution = parse.resolve_fixities_with(&table);
        assert_eq!(resolution.chains[0].1.to_string(), "((a + b) * c)");
        assert_eq!(resolution.chains[0].1.span(), Span::new(0, 9));
    }

    #[test]
    fn test_prelude_defaults() {
        let table = FixityTable::prelude();
        assert_eq!(table.get("$"), Fixity::new(Assoc::Right, 0));
        assert_eq!(table.get("=="), Fixity::new(Assoc::None, 4));
        assert_eq!(table.get("<+>"), Fixity::DEFAULT);
        assert!(!table.contains("<+>"));
    }
}
