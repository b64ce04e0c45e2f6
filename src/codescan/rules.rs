//! Individual scan rules plus the small AST traversal they share.
//!
//! Each rule is a pure function `(&[Stmt]) -> Vec<Issue>` with no shared
//! visitor state. Traversal is split into two helpers: `stmt_blocks` (nested
//! statement lists) and `stmt_exprs` (immediate child expressions), so each
//! rule walks exactly as deep as it needs.

use std::collections::HashSet;

use rustpython_parser::ast::{self, Expr, ExprContext, Stmt};

use super::{Issue, Severity};

/// `unused-arg`: a positional parameter never loaded by name anywhere inside
/// the function. Stops at function boundaries: a nested `def` is covered by
/// the outer function's name scan but not reported on its own, matching the
/// reference checker.
pub fn unused_args(body: &[Stmt]) -> Vec<Issue> {
    let mut issues = Vec::new();
    collect_function_defs(body, &mut issues);
    issues
}

fn collect_function_defs(stmts: &[Stmt], issues: &mut Vec<Issue>) {
    for stmt in stmts {
        match stmt {
            Stmt::FunctionDef(def) => check_args(&def.args, &def.body, issues),
            Stmt::AsyncFunctionDef(def) => check_args(&def.args, &def.body, issues),
            _ => {
                for block in stmt_blocks(stmt) {
                    collect_function_defs(block, issues);
                }
            }
        }
    }
}

fn check_args(args: &ast::Arguments, body: &[Stmt], issues: &mut Vec<Issue>) {
    let mut used: HashSet<String> = HashSet::new();
    for_each_expr(body, &mut |expr| {
        if let Expr::Name(name) = expr {
            if matches!(name.ctx, ExprContext::Load) {
                used.insert(name.id.to_string());
            }
        }
    });
    for arg in &args.args {
        let arg_name = arg.def.arg.as_str();
        if !used.contains(arg_name) {
            issues.push(Issue::new(
                "unused-arg",
                format!("Function arg \"{arg_name}\" appears unused."),
                Severity::Info,
            ));
        }
    }
}

/// `bare-except`: an exception handler with no exception type.
pub fn bare_excepts(body: &[Stmt]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for_each_stmt(body, &mut |stmt| {
        let handlers = match stmt {
            Stmt::Try(t) => &t.handlers,
            Stmt::TryStar(t) => &t.handlers,
            _ => return,
        };
        for handler in handlers {
            let ast::ExceptHandler::ExceptHandler(h) = handler;
            if h.type_.is_none() {
                issues.push(Issue::new(
                    "bare-except",
                    "Avoid bare except; catch specific exceptions.",
                    Severity::Warn,
                ));
            }
        }
    });
    issues
}

/// `print-call`: any call whose callee is the bare name `print`.
pub fn print_calls(body: &[Stmt]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for_each_expr(body, &mut |expr| {
        if let Expr::Call(call) = expr {
            if let Expr::Name(name) = call.func.as_ref() {
                if name.id.as_str() == "print" {
                    issues.push(Issue::new(
                        "print-call",
                        "Avoid print statements; use logging.",
                        Severity::Info,
                    ));
                }
            }
        }
    });
    issues
}

// ---- traversal helpers ----

fn for_each_stmt<'a>(stmts: &'a [Stmt], f: &mut dyn FnMut(&'a Stmt)) {
    for stmt in stmts {
        f(stmt);
        for block in stmt_blocks(stmt) {
            for_each_stmt(block, f);
        }
    }
}

fn for_each_expr<'a>(stmts: &'a [Stmt], f: &mut dyn FnMut(&'a Expr)) {
    for stmt in stmts {
        for expr in stmt_exprs(stmt) {
            walk_expr(expr, f);
        }
        for block in stmt_blocks(stmt) {
            for_each_expr(block, f);
        }
    }
}

fn walk_expr<'a>(expr: &'a Expr, f: &mut dyn FnMut(&'a Expr)) {
    f(expr);
    for child in expr_children(expr) {
        walk_expr(child, f);
    }
}

/// Nested statement lists of one statement.
fn stmt_blocks(stmt: &Stmt) -> Vec<&[Stmt]> {
    match stmt {
        Stmt::FunctionDef(d) => vec![&d.body],
        Stmt::AsyncFunctionDef(d) => vec![&d.body],
        Stmt::ClassDef(d) => vec![&d.body],
        Stmt::For(d) => vec![&d.body, &d.orelse],
        Stmt::AsyncFor(d) => vec![&d.body, &d.orelse],
        Stmt::While(d) => vec![&d.body, &d.orelse],
        Stmt::If(d) => vec![&d.body, &d.orelse],
        Stmt::With(d) => vec![&d.body],
        Stmt::AsyncWith(d) => vec![&d.body],
        Stmt::Try(d) => {
            let mut blocks: Vec<&[Stmt]> = vec![&d.body];
            for handler in &d.handlers {
                let ast::ExceptHandler::ExceptHandler(h) = handler;
                blocks.push(&h.body);
            }
            blocks.push(&d.orelse);
            blocks.push(&d.finalbody);
            blocks
        }
        Stmt::TryStar(d) => {
            let mut blocks: Vec<&[Stmt]> = vec![&d.body];
            for handler in &d.handlers {
                let ast::ExceptHandler::ExceptHandler(h) = handler;
                blocks.push(&h.body);
            }
            blocks.push(&d.orelse);
            blocks.push(&d.finalbody);
            blocks
        }
        Stmt::Match(d) => d.cases.iter().map(|c| c.body.as_slice()).collect(),
        _ => Vec::new(),
    }
}

/// Immediate child expressions of one statement (not descending into nested
/// statement lists; `stmt_blocks` covers those).
fn stmt_exprs(stmt: &Stmt) -> Vec<&Expr> {
    match stmt {
        Stmt::FunctionDef(d) => {
            let mut exprs: Vec<&Expr> = d.decorator_list.iter().collect();
            exprs.extend(argument_defaults(&d.args));
            exprs.extend(d.returns.as_deref());
            exprs
        }
        Stmt::AsyncFunctionDef(d) => {
            let mut exprs: Vec<&Expr> = d.decorator_list.iter().collect();
            exprs.extend(argument_defaults(&d.args));
            exprs.extend(d.returns.as_deref());
            exprs
        }
        Stmt::ClassDef(d) => {
            let mut exprs: Vec<&Expr> = d.bases.iter().collect();
            exprs.extend(d.keywords.iter().map(|k| &k.value));
            exprs.extend(d.decorator_list.iter());
            exprs
        }
        Stmt::Return(d) => d.value.as_deref().into_iter().collect(),
        Stmt::Delete(d) => d.targets.iter().collect(),
        Stmt::Assign(d) => {
            let mut exprs: Vec<&Expr> = d.targets.iter().collect();
            exprs.push(&d.value);
            exprs
        }
        Stmt::AugAssign(d) => vec![&d.target, &d.value],
        Stmt::AnnAssign(d) => {
            let mut exprs: Vec<&Expr> = vec![&d.target, &d.annotation];
            exprs.extend(d.value.as_deref());
            exprs
        }
        Stmt::For(d) => vec![&d.target, &d.iter],
        Stmt::AsyncFor(d) => vec![&d.target, &d.iter],
        Stmt::While(d) => vec![&d.test],
        Stmt::If(d) => vec![&d.test],
        Stmt::With(d) => with_item_exprs(&d.items),
        Stmt::AsyncWith(d) => with_item_exprs(&d.items),
        Stmt::Raise(d) => {
            let mut exprs: Vec<&Expr> = Vec::new();
            exprs.extend(d.exc.as_deref());
            exprs.extend(d.cause.as_deref());
            exprs
        }
        Stmt::Try(d) => handler_type_exprs(&d.handlers),
        Stmt::TryStar(d) => handler_type_exprs(&d.handlers),
        Stmt::Assert(d) => {
            let mut exprs: Vec<&Expr> = vec![&d.test];
            exprs.extend(d.msg.as_deref());
            exprs
        }
        Stmt::Expr(d) => vec![&d.value],
        Stmt::Match(d) => {
            let mut exprs: Vec<&Expr> = vec![&d.subject];
            exprs.extend(d.cases.iter().filter_map(|c| c.guard.as_deref()));
            exprs
        }
        _ => Vec::new(),
    }
}

fn argument_defaults(args: &ast::Arguments) -> Vec<&Expr> {
    args.posonlyargs
        .iter()
        .chain(&args.args)
        .chain(&args.kwonlyargs)
        .filter_map(|a| a.default.as_deref())
        .collect()
}

fn with_item_exprs(items: &[ast::WithItem]) -> Vec<&Expr> {
    let mut exprs = Vec::new();
    for item in items {
        exprs.push(&item.context_expr);
        exprs.extend(item.optional_vars.as_deref());
    }
    exprs
}

fn handler_type_exprs(handlers: &[ast::ExceptHandler]) -> Vec<&Expr> {
    handlers
        .iter()
        .filter_map(|handler| {
            let ast::ExceptHandler::ExceptHandler(h) = handler;
            h.type_.as_deref()
        })
        .collect()
}

/// Direct child expressions of one expression.
fn expr_children(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::BoolOp(e) => e.values.iter().collect(),
        Expr::NamedExpr(e) => vec![&e.target, &e.value],
        Expr::BinOp(e) => vec![&e.left, &e.right],
        Expr::UnaryOp(e) => vec![&e.operand],
        Expr::Lambda(e) => {
            let mut exprs = argument_defaults(&e.args);
            exprs.push(&e.body);
            exprs
        }
        Expr::IfExp(e) => vec![&e.test, &e.body, &e.orelse],
        Expr::Dict(e) => e
            .keys
            .iter()
            .flatten()
            .chain(e.values.iter())
            .collect(),
        Expr::Set(e) => e.elts.iter().collect(),
        Expr::ListComp(e) => comprehension_exprs(&e.elt, None, &e.generators),
        Expr::SetComp(e) => comprehension_exprs(&e.elt, None, &e.generators),
        Expr::GeneratorExp(e) => comprehension_exprs(&e.elt, None, &e.generators),
        Expr::DictComp(e) => comprehension_exprs(&e.key, Some(&e.value), &e.generators),
        Expr::Await(e) => vec![&e.value],
        Expr::Yield(e) => e.value.as_deref().into_iter().collect(),
        Expr::YieldFrom(e) => vec![&e.value],
        Expr::Compare(e) => {
            let mut exprs: Vec<&Expr> = vec![&e.left];
            exprs.extend(e.comparators.iter());
            exprs
        }
        Expr::Call(e) => {
            let mut exprs: Vec<&Expr> = vec![&e.func];
            exprs.extend(e.args.iter());
            exprs.extend(e.keywords.iter().map(|k| &k.value));
            exprs
        }
        Expr::FormattedValue(e) => {
            let mut exprs: Vec<&Expr> = vec![&e.value];
            exprs.extend(e.format_spec.as_deref());
            exprs
        }
        Expr::JoinedStr(e) => e.values.iter().collect(),
        Expr::Attribute(e) => vec![&e.value],
        Expr::Subscript(e) => vec![&e.value, &e.slice],
        Expr::Starred(e) => vec![&e.value],
        Expr::List(e) => e.elts.iter().collect(),
        Expr::Tuple(e) => e.elts.iter().collect(),
        Expr::Slice(e) => {
            let mut exprs: Vec<&Expr> = Vec::new();
            exprs.extend(e.lower.as_deref());
            exprs.extend(e.upper.as_deref());
            exprs.extend(e.step.as_deref());
            exprs
        }
        _ => Vec::new(),
    }
}

fn comprehension_exprs<'a>(
    elt: &'a Expr,
    value: Option<&'a Expr>,
    generators: &'a [ast::Comprehension],
) -> Vec<&'a Expr> {
    let mut exprs: Vec<&Expr> = vec![elt];
    exprs.extend(value);
    for generator in generators {
        exprs.push(&generator.target);
        exprs.push(&generator.iter);
        exprs.extend(generator.ifs.iter());
    }
    exprs
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustpython_parser::{parse, Mode};

    fn module_body(code: &str) -> Vec<Stmt> {
        match parse(code, Mode::Module, "<test>").expect("valid test code") {
            ast::Mod::Module(m) => m.body,
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn unused_arg_is_flagged_by_name() {
        let body = module_body("def f(used, ghost):\n    return used\n");
        let issues = unused_args(&body);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Function arg \"ghost\" appears unused.");
        assert_eq!(issues[0].severity, Severity::Info);
    }

    #[test]
    fn arg_used_in_nested_scope_counts_as_used() {
        let code = "def outer(x):\n    def inner():\n        return x\n    return inner\n";
        assert!(unused_args(&module_body(code)).is_empty());
    }

    #[test]
    fn methods_inside_classes_are_checked() {
        let code = "class C:\n    def m(self, unused):\n        return self\n";
        let issues = unused_args(&module_body(code));
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("unused"));
    }

    #[test]
    fn bare_except_flagged_typed_except_not() {
        let code = "try:\n    pass\nexcept ValueError:\n    pass\nexcept:\n    pass\n";
        let issues = bare_excepts(&module_body(code));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "bare-except");
        assert_eq!(issues[0].severity, Severity::Warn);
    }

    #[test]
    fn bare_except_found_inside_function_body() {
        let code = "def f():\n    try:\n        pass\n    except:\n        pass\n";
        assert_eq!(bare_excepts(&module_body(code)).len(), 1);
    }

    #[test]
    fn print_call_found_in_nested_expression() {
        let code = "def f(x):\n    if x:\n        y = [print(i) for i in range(3)]\n    return x\n";
        let issues = print_calls(&module_body(code));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "print-call");
    }

    #[test]
    fn attribute_print_is_not_the_builtin() {
        let code = "logger.print('x')\n";
        assert!(print_calls(&module_body(code)).is_empty());
    }
}
