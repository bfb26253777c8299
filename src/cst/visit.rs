//! Kind-dispatched traversal.
//!
//! [`Visitor`] has one method per production. Every method defaults to
//! [`Visitor::visit_node`], which walks the children, so an implementation
//! only overrides the productions it cares about and calls
//! [`walk_children`] when it wants to keep descending.

use crate::cst::nodes::*;
use crate::cst::{SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree};

macro_rules! visitor {
    ($($method:ident => $view:ident),* $(,)?) => {
        pub trait Visitor<'t> {
            /// Fallback for every production: visit the children in order.
            fn visit_node(&mut self, node: SyntaxNode<'t>) {
                walk_children(self, node);
            }

            fn visit_token(&mut self, _token: SyntaxToken<'t>) {}

            $(
                fn $method(&mut self, node: $view<'t>) {
                    self.visit_node(node.syntax());
                }
            )*
        }

        /// Call the visitor method matching `node`'s kind.
        pub fn dispatch<'t, V: Visitor<'t> + ?Sized>(visitor: &mut V, node: SyntaxNode<'t>) {
            match node.kind() {
                $(
                    SyntaxKind::$view => match $view::cast(node) {
                        Some(view) => visitor.$method(view),
                        None => visitor.visit_node(node),
                    },
                )*
                _ => visitor.visit_node(node),
            }
        }
    };
}

visitor! {
    visit_module => Module,
    visit_module_header => ModuleHeader,
    visit_module_name => ModuleName,
    visit_export_list => ExportList,
    visit_export => Export,
    visit_member_list => MemberList,
    visit_module_body => ModuleBody,
    visit_import_decl => ImportDecl,
    visit_import_list => ImportList,
    visit_import_item => ImportItem,
    visit_type_sig => TypeSig,
    visit_fixity_decl => FixityDecl,
    visit_fun_or_pat_decl => FunOrPatDecl,
    visit_fun_lhs => FunLhs,
    visit_rhs => Rhs,
    visit_guarded_rhs => GuardedRhs,
    visit_where_clause => WhereClause,
    visit_decl_block => DeclBlock,
    visit_data_decl => DataDecl,
    visit_newtype_decl => NewtypeDecl,
    visit_constr => Constr,
    visit_record_fields => RecordFields,
    visit_field_decl => FieldDecl,
    visit_gadt_constr => GadtConstr,
    visit_deriving => Deriving,
    visit_type_decl => TypeDecl,
    visit_type_eqn => TypeEqn,
    visit_class_decl => ClassDecl,
    visit_fun_deps => FunDeps,
    visit_fun_dep => FunDep,
    visit_instance_decl => InstanceDecl,
    visit_deriving_decl => DerivingDecl,
    visit_default_decl => DefaultDecl,
    visit_foreign_decl => ForeignDecl,
    visit_pragma => Pragma,
    visit_ctype => CType,
    visit_context => Context,
    visit_tv_bndr => TvBndr,
    visit_fun_type => FunType,
    visit_app_type => AppType,
    visit_infix_type => InfixType,
    visit_ty_con => TyCon,
    visit_ty_var => TyVar,
    visit_tuple_type => TupleType,
    visit_list_type => ListType,
    visit_paren_type => ParenType,
    visit_kind_sig => KindSig,
    visit_bang_type => BangType,
    visit_lazy_type => LazyType,
    visit_promoted_type => PromotedType,
    visit_type_lit => TypeLit,
    visit_wildcard_type => WildcardType,
    visit_infix_exp => InfixExp,
    visit_lambda_exp => LambdaExp,
    visit_lambda_case_exp => LambdaCaseExp,
    visit_let_exp => LetExp,
    visit_if_exp => IfExp,
    visit_case_exp => CaseExp,
    visit_do_exp => DoExp,
    visit_app_exp => AppExp,
    visit_type_app => TypeApp,
    visit_typed_exp => TypedExp,
    visit_left_section => LeftSection,
    visit_right_section => RightSection,
    visit_paren_exp => ParenExp,
    visit_tuple_exp => TupleExp,
    visit_list_exp => ListExp,
    visit_arith_seq => ArithSeq,
    visit_list_comp => ListComp,
    visit_record_exp => RecordExp,
    visit_field_bind => FieldBind,
    visit_hole_exp => HoleExp,
    visit_pragma_exp => PragmaExp,
    visit_literal => Literal,
    visit_alt_block => AltBlock,
    visit_alt => Alt,
    visit_stmt_block => StmtBlock,
    visit_bind_stmt => BindStmt,
    visit_let_stmt => LetStmt,
    visit_exp_stmt => ExpStmt,
    visit_var_pat => VarPat,
    visit_as_pat => AsPat,
    visit_lazy_pat => LazyPat,
    visit_bang_pat => BangPat,
    visit_con_pat => ConPat,
    visit_infix_pat => InfixPat,
    visit_lit_pat => LitPat,
    visit_tuple_pat => TuplePat,
    visit_list_pat => ListPat,
    visit_record_pat => RecordPat,
    visit_field_pat => FieldPat,
    visit_wild_pat => WildPat,
    visit_paren_pat => ParenPat,
    visit_typed_pat => TypedPat,
    visit_qvar => QVar,
    visit_qcon => QCon,
    visit_qvar_op => QVarOp,
    visit_qcon_op => QConOp,
    visit_qvar_id => QVarId,
    visit_qcon_id => QConId,
    visit_qvar_sym => QVarSym,
    visit_qcon_sym => QConSym,
    visit_special_con => SpecialCon,
    visit_cabal_file => CabalFile,
    visit_cabal_field => CabalField,
    visit_cabal_field_value => CabalFieldValue,
    visit_cabal_section => CabalSection,
    visit_cabal_section_args => CabalSectionArgs,
    visit_cabal_conditional => CabalConditional,
    visit_cabal_condition => CabalCondition,
    visit_cabal_else => CabalElse,
    visit_cabal_block => CabalBlock,
}

pub fn walk_children<'t, V: Visitor<'t> + ?Sized>(visitor: &mut V, node: SyntaxNode<'t>) {
    for child in node.children() {
        match child {
            crate::cst::SyntaxElement::Node(child) => dispatch(visitor, child),
            crate::cst::SyntaxElement::Token(token) => visitor.visit_token(token),
        }
    }
}

/// Visit the whole tree from the root.
pub fn walk<'t, V: Visitor<'t> + ?Sized>(tree: &'t SyntaxTree, visitor: &mut V) {
    dispatch(visitor, tree.root());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[derive(Default)]
    struct Counter {
        lets: usize,
        names: Vec<String>,
        tokens: usize,
    }

    impl<'t> Visitor<'t> for Counter {
        fn visit_let_exp(&mut self, node: LetExp<'t>) {
            self.lets += 1;
            walk_children(self, node.syntax());
        }

        fn visit_type_sig(&mut self, node: TypeSig<'t>) {
            self.names
                .extend(node.names().filter_map(|n| n.name()).map(str::to_string));
        }

        fn visit_token(&mut self, _token: SyntaxToken<'t>) {
            self.tokens += 1;
        }
    }

    #[test]
    fn test_visitor_dispatch_and_fallback() {
        let source = "f, g :: Int\nf = let x = let y = 1 in y in x\n";
        let parse = parse(source).unwrap();
        let mut counter = Counter::default();
        walk(parse.tree(), &mut counter);
        assert_eq!(counter.lets, 2);
        assert_eq!(counter.names, vec!["f", "g"]);
        assert!(counter.tokens > 0);
    }

    #[test]
    fn test_overridden_method_stops_descent() {
        let source = "f :: Int\n";
        let parse = parse(source).unwrap();
        let mut counter = Counter::default();
        walk(parse.tree(), &mut counter);
        let sig_tokens = parse
            .tree()
            .root()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::TypeSig)
            .map(|n| n.descendant_tokens().count())
            .unwrap();
        assert_eq!(counter.tokens, parse.tree().token_count() - sig_tokens);
    }
}
