//! Translation driver: module top-level traversal and document assembly.
//!
//! Top-level statements outside any function only contribute start-call
//! discovery: a lone call expression (possibly under a `__main__`-style
//! guard) names the document's entry point; everything else at the top
//! level is either a function definition or ignored.

use tracing::{debug, info};

use crate::features::lambda_gen::domain::LambdaSink;
use crate::features::lowering::domain::{Fragment, TraversalContext};
use crate::features::lowering::infrastructure::expression_lowering::callee_name;
use crate::features::lowering::infrastructure::statement_lowering::StatementLowering;
use crate::shared::models::{Expr, Module, PgmDocument, Result, Stmt};
use crate::shared::utils::NameRegistry;

/// The result of one translation run: the assembled document plus the
/// lambda stream accumulated while lowering.
#[derive(Debug)]
pub struct Translation {
    pub document: PgmDocument,
    pub lambdas: LambdaSink,
}

/// Lower a forest of modules (one per source file) into a single PGM
/// document. Nothing is produced on error: either the whole forest lowers
/// or the translation aborts.
pub fn translate_modules(modules: &[Module], doc_name: &str) -> Result<Translation> {
    let mut names = NameRegistry::new();
    let mut sink = LambdaSink::new();
    let mut fragment = Fragment::new();
    let mut start: Option<String> = None;

    for module in modules {
        let mut ctx = TraversalContext::root();
        let mut lowering = StatementLowering::new(&mut names, &mut sink);
        let lowered = lower_top_level(&mut lowering, &module.body, &mut ctx, &mut start)?;
        fragment.merge(lowered);
    }

    let document = PgmDocument {
        start: start.unwrap_or_default(),
        name: doc_name.to_string(),
        date_created: chrono::Local::now().format("%Y-%m-%d").to_string(),
        functions: fragment.functions,
        body: fragment.body,
    };
    info!(
        name = doc_name,
        functions = document.functions.len(),
        lambdas = sink.len(),
        "assembled PGM document"
    );
    Ok(Translation {
        document,
        lambdas: sink,
    })
}

fn lower_top_level(
    lowering: &mut StatementLowering<'_>,
    stmts: &[Stmt],
    ctx: &mut TraversalContext,
    start: &mut Option<String>,
) -> Result<Fragment> {
    let mut fragment = Fragment::new();
    for stmt in stmts {
        match stmt {
            Stmt::FunctionDef { .. } => fragment.merge(lowering.lower_stmt(stmt, ctx)?),

            Stmt::Expr {
                value: Expr::Call { func, .. },
                line,
            } => {
                let callee = callee_name(func, *line)?;
                if start.is_none() {
                    *start = Some(callee);
                }
            }

            // A top-level `if` is only a guard around the entry call.
            Stmt::If { body, .. } => {
                fragment.merge(lower_top_level(lowering, body, ctx, start)?);
            }

            other => {
                debug!(line = other.line(), "ignoring top-level statement");
            }
        }
    }
    Ok(fragment)
}
