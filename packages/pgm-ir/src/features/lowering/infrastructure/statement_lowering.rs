//! Statement lowering — the tree-to-graph pass.
//!
//! Each statement lowers to a fragment of (functions, body records);
//! sequences merge their children's fragments in order. Conditionals
//! synthesize a condition variable plus one decision merge per diverging
//! variable; bounded loops reify as loop plates; function definitions
//! become containers with their nested functions hoisted to the flat
//! document list.

use tracing::debug;

use crate::features::lambda_gen::domain::LambdaSink;
use crate::features::lambda_gen::infrastructure::renderer::render_lambda;
use crate::features::lowering::domain::{Fragment, TraversalContext};
use crate::features::lowering::infrastructure::expression_lowering::lower_expr;
use crate::shared::models::{
    AssignBody, BodyEntry, Domain, Expr, IterationRange, NamedSource, Param, PgmError,
    PgmFunction, Result, SourceDescriptor, Stmt, TypedVariable, VariableReference,
};
use crate::shared::utils::NameRegistry;

pub struct StatementLowering<'a> {
    names: &'a mut NameRegistry,
    sink: &'a mut LambdaSink,
}

impl<'a> StatementLowering<'a> {
    pub fn new(names: &'a mut NameRegistry, sink: &'a mut LambdaSink) -> Self {
        Self { names, sink }
    }

    /// Lower a statement sequence, merging sibling fragments in order.
    pub fn lower_stmts(&mut self, stmts: &[Stmt], ctx: &mut TraversalContext) -> Result<Fragment> {
        let mut fragment = Fragment::new();
        for stmt in stmts {
            fragment.merge(self.lower_stmt(stmt, ctx)?);
        }
        Ok(fragment)
    }

    pub fn lower_stmt(&mut self, stmt: &Stmt, ctx: &mut TraversalContext) -> Result<Fragment> {
        match stmt {
            Stmt::FunctionDef {
                name, params, body, ..
            } => self.lower_function_def(name, params, body),

            Stmt::Assign {
                targets,
                value,
                line,
            } => self.lower_assign(targets, value, *line, ctx),

            Stmt::AnnAssign {
                target,
                annotation,
                value,
                line,
            } => self.lower_ann_assign(target, annotation, value.as_ref(), *line, ctx),

            Stmt::If {
                test,
                body,
                orelse,
                line,
            } => self.lower_if(test, body, orelse, *line, ctx),

            Stmt::For {
                targets,
                iter,
                body,
                orelse,
                line,
            } => self.lower_for(targets, iter, body, orelse, *line, ctx),

            Stmt::Expr { value, line } => self.lower_expr_stmt(value, *line, ctx),

            Stmt::Unsupported { construct, line } => {
                Err(PgmError::unsupported(construct.clone(), *line))
            }
        }
    }

    /// Assignment: one `assign` function and body record per target.
    fn lower_assign(
        &mut self,
        targets: &[Expr],
        value: &Expr,
        line: u32,
        ctx: &mut TraversalContext,
    ) -> Result<Fragment> {
        let scope = scope_name(ctx);
        // Sources first: `x = x + 1` must read the old version of x.
        let sources = lower_expr(value, line, ctx)?;

        let mut fragment = Fragment::new();
        for target in targets {
            let output = lower_target(target, line, ctx)?;
            infer_target_domain(&output.variable, &sources, ctx);

            let fn_name = self
                .names
                .fresh(&format!("{}__assign__{}", scope, output.variable));
            let body = self.assign_body(&scope, &output.variable, value, &sources, line);

            fragment.push_function(PgmFunction::Assign {
                name: fn_name.clone(),
                target: output.variable.clone(),
                sources: named_sources(&sources),
                body,
            });
            fragment.push_body(BodyEntry::new(
                fn_name,
                variable_refs(&sources),
                Some(output),
            ));
        }
        Ok(fragment)
    }

    /// The function payload: a direct literal when the right-hand side is a
    /// lone constant, otherwise a rendered lambda.
    fn assign_body(
        &mut self,
        scope: &str,
        target: &str,
        value: &Expr,
        sources: &[SourceDescriptor],
        line: u32,
    ) -> AssignBody {
        if let [SourceDescriptor::Literal { dtype, value }] = sources {
            return AssignBody::Literal {
                dtype: *dtype,
                value: value.clone(),
            };
        }
        let lambda_name = self.names.fresh(&format!("{}__lambda__{}", scope, target));
        let params = param_names(sources);
        self.sink
            .emit(lambda_name.clone(), line, render_lambda(&lambda_name, &params, value));
        AssignBody::Lambda {
            name: lambda_name,
            reference: line,
        }
    }

    fn lower_ann_assign(
        &mut self,
        target: &Expr,
        annotation: &str,
        value: Option<&Expr>,
        line: u32,
        ctx: &mut TraversalContext,
    ) -> Result<Fragment> {
        let domain =
            Domain::from_annotation(annotation).ok_or_else(|| PgmError::UnsupportedType {
                annotation: annotation.to_string(),
            })?;
        let name = target_name(target, line)?;

        match value {
            // A declaration without a scalar initializer only registers the
            // type; no graph nodes are emitted.
            None | Some(Expr::List { .. }) => {
                ctx.write_version(&name);
                ctx.register_type(&name, domain);
                Ok(Fragment::new())
            }
            Some(value) => {
                ctx.register_type(&name, domain);
                self.lower_assign(std::slice::from_ref(target), value, line, ctx)
            }
        }
    }

    /// If/else: condition assign + both branch fragments + one decision
    /// merge per variable whose version diverges from the baseline.
    fn lower_if(
        &mut self,
        test: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        line: u32,
        ctx: &mut TraversalContext,
    ) -> Result<Fragment> {
        let scope = scope_name(ctx);
        let mut fragment = Fragment::new();

        // 1. Condition variable, always lambda-backed.
        let cond_sources = lower_expr(test, line, ctx)?;
        let cond_var = format!("IF_{}", ctx.next_condition_index());
        ctx.register_type(&cond_var, Domain::Boolean);
        ctx.seed_version(&cond_var, 0);
        let cond_output = VariableReference::new(cond_var.clone(), 0);

        let fn_name = self
            .names
            .fresh(&format!("{}__condition__{}", scope, cond_var));
        let lambda_name = self.names.fresh(&format!("{}__lambda__{}", scope, cond_var));
        let params = param_names(&cond_sources);
        self.sink
            .emit(lambda_name.clone(), line, render_lambda(&lambda_name, &params, test));

        fragment.push_function(PgmFunction::Assign {
            name: fn_name.clone(),
            target: cond_var.clone(),
            sources: named_sources(&cond_sources),
            body: AssignBody::Lambda {
                name: lambda_name,
                reference: line,
            },
        });
        fragment.push_body(BodyEntry::new(
            fn_name,
            variable_refs(&cond_sources),
            Some(cond_output.clone()),
        ));

        // 2. Branches under independent contexts. The else arm continues
        //    the then arm's version numbering so candidates stay distinct.
        let mut then_ctx = ctx.branch_scope();
        let then_fragment = self.lower_stmts(body, &mut then_ctx)?;

        let mut else_ctx = ctx.branch_scope();
        else_ctx.adopt_next_defs(&then_ctx);
        let else_fragment = self.lower_stmts(orelse, &mut else_ctx)?;

        fragment.merge(then_fragment);
        fragment.merge(else_fragment);

        ctx.adopt_next_defs(&else_ctx);
        ctx.adopt_types(&then_ctx);
        ctx.adopt_types(&else_ctx);

        // 3. Decision merges, in deterministic first-touch order.
        for variable in touched_union(ctx, &then_ctx, &else_ctx) {
            let baseline = ctx.version_of(&variable);
            let then_version = then_ctx.version_of(&variable);
            let else_version = else_ctx.version_of(&variable);

            let candidates = merge_candidates(baseline, then_version, else_version);
            if candidates.is_empty() {
                continue;
            }

            let merged = ctx.write_version(&variable);
            let decision_name = self
                .names
                .fresh(&format!("{}__decision__{}", scope, variable));

            // The condition output is always the first input: it is the
            // discriminator downstream consumers use to pick a candidate.
            let mut inputs = vec![cond_output.clone()];
            inputs.extend(
                candidates
                    .iter()
                    .map(|&version| VariableReference::new(variable.clone(), version)),
            );
            let sources = inputs
                .iter()
                .map(|reference| NamedSource::variable(reference.versioned_name()))
                .collect();

            fragment.push_function(PgmFunction::Decision {
                name: decision_name.clone(),
                target: variable.clone(),
                sources,
            });
            fragment.push_body(BodyEntry::new(
                decision_name,
                inputs,
                Some(VariableReference::new(variable, merged)),
            ));
        }

        Ok(fragment)
    }

    /// Bounded range loop, reified as a loop plate.
    fn lower_for(
        &mut self,
        targets: &[Expr],
        iter: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        line: u32,
        ctx: &mut TraversalContext,
    ) -> Result<Fragment> {
        if !orelse.is_empty() {
            return Err(PgmError::unsupported("for/else", line));
        }
        if targets.len() != 1 {
            return Err(PgmError::MultipleLoopIndices {
                count: targets.len(),
            });
        }
        let index = match &targets[0] {
            Expr::Name { id, .. } => id.clone(),
            other => return Err(PgmError::unsupported(other.kind_name(), line)),
        };

        let scope = scope_name(ctx);
        ctx.write_version(&index);
        if ctx.domain_of(&index).is_none() {
            ctx.register_type(&index, Domain::Integer);
        }

        let range = lower_range_header(iter, line, ctx)?;

        let mut loop_ctx = ctx.loop_scope();
        let loop_fragment = self.lower_stmts(body, &mut loop_ctx)?;

        let input: Vec<String> = loop_ctx
            .written_variables()
            .into_iter()
            .filter(|variable| variable != &index)
            .collect();
        let plate_name = self
            .names
            .fresh(&format!("{}__loop_plate__{}", scope, index));
        debug!(plate = %plate_name, inputs = input.len(), "lowered loop plate");

        let call_inputs = input
            .iter()
            .map(|variable| VariableReference::new(variable.clone(), ctx.peek_version(variable)))
            .collect();

        let mut fragment = Fragment::new();
        fragment.functions = loop_fragment.functions;
        fragment.push_function(PgmFunction::LoopPlate {
            name: plate_name.clone(),
            input,
            index_variable: index,
            index_iteration_range: range,
            body: loop_fragment.body,
        });
        fragment.push_body(BodyEntry::new(plate_name, call_inputs, None));
        Ok(fragment)
    }

    /// Expression statement: only bare calls are meaningful, lowered to a
    /// body record with no output.
    fn lower_expr_stmt(
        &mut self,
        value: &Expr,
        line: u32,
        ctx: &mut TraversalContext,
    ) -> Result<Fragment> {
        let descriptors = lower_expr(value, line, ctx)?;
        let mut fragment = Fragment::new();
        for descriptor in descriptors {
            let call = match descriptor {
                SourceDescriptor::Call(call) => call,
                _ => return Err(PgmError::unsupported("expression statement", line)),
            };
            let mut input = Vec::new();
            for argument in &call.inputs {
                if argument.len() != 1 {
                    return Err(PgmError::unsupported("multi-valued call argument", line));
                }
                if let Some(reference) = argument[0].as_variable() {
                    input.push(reference.clone());
                }
            }
            fragment.push_body(BodyEntry::new(call.function, input, None));
        }
        Ok(fragment)
    }

    /// Function definition: isolated scope, typed parameters, container
    /// function with nested functions hoisted alongside it.
    fn lower_function_def(
        &mut self,
        name: &str,
        params: &[Param],
        body: &[Stmt],
    ) -> Result<Fragment> {
        debug!(function = name, "lowering function definition");
        let mut fn_ctx = TraversalContext::for_function(name);

        let mut input = Vec::with_capacity(params.len());
        for param in params {
            let domain = Domain::from_annotation(&param.annotation).ok_or_else(|| {
                PgmError::UnsupportedType {
                    annotation: param.annotation.clone(),
                }
            })?;
            fn_ctx.register_type(&param.name, domain);
            input.push(TypedVariable {
                name: param.name.clone(),
                domain,
            });
        }

        let body_fragment = self.lower_stmts(body, &mut fn_ctx)?;

        let mut variables = Vec::new();
        for variable in fn_ctx.defined_variables() {
            let domain = fn_ctx.domain_of(variable).ok_or_else(|| {
                PgmError::MissingDomain {
                    variable: variable.clone(),
                }
            })?;
            variables.push(TypedVariable {
                name: variable.clone(),
                domain,
            });
        }

        let mut fragment = Fragment::new();
        fragment.functions = body_fragment.functions;
        fragment.push_function(PgmFunction::Container {
            name: name.to_string(),
            input,
            variables,
            body: body_fragment.body,
        });
        Ok(fragment)
    }
}

fn scope_name(ctx: &TraversalContext) -> String {
    ctx.function_name().unwrap_or("module").to_string()
}

/// Lower an assignment target to its versioned write reference.
fn lower_target(target: &Expr, line: u32, ctx: &mut TraversalContext) -> Result<VariableReference> {
    let descriptors = lower_expr(target, line, ctx)?;
    match descriptors.as_slice() {
        [SourceDescriptor::Variable(reference)] => Ok(reference.clone()),
        _ => Err(PgmError::unsupported(target.kind_name(), line)),
    }
}

fn target_name(target: &Expr, line: u32) -> Result<String> {
    match target {
        Expr::Name { id, .. } => Ok(id.clone()),
        Expr::Subscript { value, .. } => match &**value {
            Expr::Name { id, .. } => Ok(id.clone()),
            other => Err(PgmError::unsupported(other.kind_name(), line)),
        },
        other => Err(PgmError::unsupported(other.kind_name(), line)),
    }
}

/// When the target carries no annotation, infer its domain from a lone
/// literal source, else inherit from the first typed variable source.
fn infer_target_domain(target: &str, sources: &[SourceDescriptor], ctx: &mut TraversalContext) {
    if ctx.domain_of(target).is_some() {
        return;
    }
    if let [SourceDescriptor::Literal { dtype, .. }] = sources {
        ctx.register_type(target, *dtype);
        return;
    }
    let inherited = collect_references(sources)
        .into_iter()
        .find_map(|reference| ctx.domain_of(&reference.variable));
    if let Some(domain) = inherited {
        ctx.register_type(target, domain);
    }
}

/// Validate a loop header: a call to `range` with exactly two
/// single-descriptor scalar bounds.
fn lower_range_header(
    iter: &Expr,
    line: u32,
    ctx: &mut TraversalContext,
) -> Result<IterationRange> {
    let descriptors = lower_expr(iter, line, ctx)?;
    let call = match descriptors.as_slice() {
        [SourceDescriptor::Call(call)] if call.function == "range" => call,
        _ => return Err(PgmError::range("can only iterate over a range call")),
    };
    if call.inputs.len() != 2 {
        return Err(PgmError::range(format!(
            "range takes exactly two bounds, found {}",
            call.inputs.len()
        )));
    }
    let mut bounds = call.inputs.iter().map(|argument| match argument.as_slice() {
        [SourceDescriptor::Call(_)] => Err(PgmError::range("range bounds must be scalar")),
        [bound] => Ok(bound.clone()),
        _ => Err(PgmError::range("range bounds must be single-valued")),
    });
    let start = bounds.next().unwrap()?;
    let end = bounds.next().unwrap()?;
    Ok(IterationRange { start, end })
}

/// Union of variables touched by the enclosing scope and both branch
/// scopes, in first-touch order.
fn touched_union(
    ctx: &TraversalContext,
    then_ctx: &TraversalContext,
    else_ctx: &TraversalContext,
) -> Vec<String> {
    let mut union = Vec::new();
    for variable in ctx
        .defined_variables()
        .iter()
        .chain(then_ctx.defined_variables())
        .chain(else_ctx.defined_variables())
    {
        if !union.contains(variable) {
            union.push(variable.clone());
        }
    }
    union
}

/// Candidate versions for a decision merge, condition excluded. Empty when
/// neither branch diverged from the baseline.
fn merge_candidates(
    baseline: Option<i64>,
    then_version: Option<i64>,
    else_version: Option<i64>,
) -> Vec<i64> {
    let then_updated = then_version.is_some() && then_version != baseline;
    let else_updated = else_version.is_some() && else_version != baseline;
    match (then_updated, else_updated) {
        (true, true) => vec![then_version.unwrap(), else_version.unwrap()],
        (true, false) => match baseline {
            Some(baseline) => vec![then_version.unwrap(), baseline],
            None => vec![then_version.unwrap()],
        },
        (false, true) => match baseline {
            Some(baseline) => vec![else_version.unwrap(), baseline],
            None => vec![else_version.unwrap()],
        },
        (false, false) => Vec::new(),
    }
}

/// Flatten descriptors to variable references, depth-first, duplicates
/// removed.
fn collect_references(sources: &[SourceDescriptor]) -> Vec<VariableReference> {
    fn walk(sources: &[SourceDescriptor], out: &mut Vec<VariableReference>) {
        for source in sources {
            match source {
                SourceDescriptor::Variable(reference) => {
                    if !out.contains(reference) {
                        out.push(reference.clone());
                    }
                }
                SourceDescriptor::Call(call) => {
                    for argument in &call.inputs {
                        walk(argument, out);
                    }
                }
                SourceDescriptor::Literal { .. } => {}
            }
        }
    }
    let mut out = Vec::new();
    walk(sources, &mut out);
    out
}

fn variable_refs(sources: &[SourceDescriptor]) -> Vec<VariableReference> {
    collect_references(sources)
}

/// Named sources of an assign function: each called function at its
/// first-mentioned position, then every variable it reads.
fn named_sources(sources: &[SourceDescriptor]) -> Vec<NamedSource> {
    fn push_unique(out: &mut Vec<NamedSource>, entry: NamedSource) {
        if !out.contains(&entry) {
            out.push(entry);
        }
    }
    let mut out = Vec::new();
    for source in sources {
        match source {
            SourceDescriptor::Variable(reference) => {
                push_unique(&mut out, NamedSource::variable(&reference.variable));
            }
            SourceDescriptor::Call(call) => {
                push_unique(&mut out, NamedSource::function(&call.function));
                for reference in collect_references(std::slice::from_ref(source)) {
                    push_unique(&mut out, NamedSource::variable(&reference.variable));
                }
            }
            SourceDescriptor::Literal { .. } => {}
        }
    }
    out
}

fn param_names(sources: &[SourceDescriptor]) -> Vec<String> {
    collect_references(sources)
        .into_iter()
        .map(|reference| reference.variable)
        .fold(Vec::new(), |mut acc, name| {
            if !acc.contains(&name) {
                acc.push(name);
            }
            acc
        })
}
