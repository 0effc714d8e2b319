//! Renders the generated syntax-tree fragment to source text. Only the
//! shapes the support-file builder emits are supported; the host
//! formatter owns everything else.

use crate::source_files::Source;
use crate::syntax_tree::*;
use crate::type_renderer;
use crate::visibility::Visibility;
use itertools::Itertools;

pub fn render_items(items: &[Item<Source>]) -> String {
    let mut out = String::new();

    for item in items {
        render_item(item, 0, &mut out);
    }

    out
}

fn indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str("    ");
    }
}

fn render_item(item: &Item<Source>, level: usize, out: &mut String) {
    match item {
        Item::Import(import) => {
            indent(level, out);
            if let Some(keyword) = visibility_keyword(import.visibility) {
                out.push_str(keyword);
                out.push(' ');
            }
            out.push_str("import ");
            out.push_str(&import.module.join("."));
            out.push('\n');
        }
        Item::Extension(extension) => {
            out.push('\n');
            indent(level, out);
            if let Some(keyword) = visibility_keyword(extension.visibility) {
                out.push_str(keyword);
                out.push(' ');
            }
            out.push_str("extension ");
            out.push_str(&render_type(&extension.extended_type));
            out.push_str(" {\n");
            for member in &extension.members {
                if let MemberItem::Declaration(decl) = member {
                    render_decl(decl, level + 1, out);
                }
            }
            indent(level, out);
            out.push_str("}\n");
        }
        Item::Declaration(decl) => {
            out.push('\n');
            render_decl(decl, level, out);
        }
        Item::IfConfig(if_config) => {
            for (position, clause) in if_config.clauses.iter().enumerate() {
                indent(level, out);
                match (&clause.condition, position) {
                    (Some(condition), 0) => {
                        out.push_str("#if ");
                        out.push_str(&condition.description());
                    }
                    (Some(condition), _) => {
                        out.push_str("#elseif ");
                        out.push_str(&condition.description());
                    }
                    (None, _) => out.push_str("#else"),
                }
                out.push('\n');
                for item in &clause.body {
                    render_item(item, level, out);
                }
            }
            indent(level, out);
            out.push_str("#endif\n");
        }
    }
}

fn render_decl(decl: &Decl<Source>, level: usize, out: &mut String) {
    match decl {
        Decl::Type(type_decl) => {
            indent(level, out);
            if let Some(keyword) = visibility_keyword(type_decl.visibility) {
                out.push_str(keyword);
                out.push(' ');
            }
            out.push_str(match type_decl.kind {
                TypeDeclKind::Struct => "struct",
                TypeDeclKind::Class => "class",
                TypeDeclKind::Enum => "enum",
                TypeDeclKind::Actor => "actor",
            });
            out.push(' ');
            out.push_str(&type_decl.name);
            out.push_str(" {}\n");
        }
        Decl::Function(function) => render_function(function, level, out),
        Decl::Variable(variable) => render_variable(variable, level, out),
        Decl::MemberBlock(decls) => {
            for decl in decls {
                render_decl(decl, level, out);
            }
        }
        Decl::Protocol(_) => {}
    }
}

fn render_function(function: &FunctionDecl<Source>, level: usize, out: &mut String) {
    indent(level, out);

    for attribute in &function.attributes {
        out.push('@');
        out.push_str(&attribute.name);
        out.push(' ');
    }

    if let Some(keyword) = visibility_keyword(function.visibility) {
        out.push_str(keyword);
        out.push(' ');
    }

    if function.affiliation.is_static() {
        out.push_str("static ");
    }

    match &function.name {
        FunctionName::Initializer { optional } => {
            out.push_str("init");
            if *optional {
                out.push('?');
            }
        }
        FunctionName::Named(name) => {
            out.push_str("func ");
            out.push_str(name);
        }
    }

    if !function.generic_parameters.is_empty() {
        out.push('<');
        out.push_str(&function.generic_parameters.join(", "));
        out.push('>');
    }

    out.push('(');
    out.push_str(
        &function
            .parameters
            .iter()
            .map(render_parameter)
            .join(", "),
    );
    out.push(')');

    if let Some(return_type) = &function.return_type {
        out.push_str(" -> ");
        out.push_str(&render_type(return_type));
    }

    match &function.body {
        Some(body) => {
            out.push_str(" {\n");
            render_code_block(body, level + 1, function.return_type.is_some(), out);
            indent(level, out);
            out.push_str("}\n");
        }
        None => out.push('\n'),
    }
}

fn render_parameter(parameter: &FunctionParameter<Source>) -> String {
    let mut rendered = parameter.first_name.clone();

    if let Some(second) = &parameter.second_name {
        rendered.push(' ');
        rendered.push_str(second);
    }

    rendered.push_str(": ");
    rendered.push_str(&render_type(&parameter.ty));
    rendered
}

fn render_variable(variable: &VariableDecl<Source>, level: usize, out: &mut String) {
    for binding in &variable.bindings {
        indent(level, out);

        for attribute in &variable.attributes {
            out.push('@');
            out.push_str(&attribute.name);
            if let Some(argument) = &attribute.argument {
                out.push('(');
                if let Some(label) = &argument.label {
                    out.push_str(label);
                    out.push_str(": ");
                }
                out.push_str(&render_expr(&argument.value));
                out.push(')');
            }
            out.push(' ');
        }

        if let Some(keyword) = visibility_keyword(variable.visibility) {
            out.push_str(keyword);
            out.push(' ');
        }

        out.push_str(match variable.specifier {
            BindingSpecifier::Let => "let",
            BindingSpecifier::Var => "var",
        });
        out.push(' ');

        match &binding.pattern.kind {
            PatternKind::Identifier(name) => out.push_str(name),
            PatternKind::Wildcard => out.push('_'),
            _ => out.push_str("<pattern>"),
        }

        if let Some(ty) = &binding.ty {
            out.push_str(": ");
            out.push_str(&render_type(ty));
        }

        if let Some(initializer) = &binding.initializer {
            out.push_str(" = ");
            out.push_str(&render_expr(initializer));
        }

        if let Some(accessors) = &binding.accessors {
            out.push_str(" {\n");
            render_code_block(&accessors.items, level + 1, true, out);
            indent(level, out);
            out.push('}');
        }

        out.push('\n');
    }
}

fn render_code_block(
    items: &[CodeBlockItem<Source>],
    level: usize,
    return_last: bool,
    out: &mut String,
) {
    for (position, item) in items.iter().enumerate() {
        let is_last = position + 1 == items.len();

        match item {
            CodeBlockItem::Declaration(decl) => render_decl(decl, level, out),
            CodeBlockItem::Statement(stmt) => render_stmt(stmt, level, out),
            CodeBlockItem::Expression(expr) => {
                indent(level, out);
                if return_last && is_last {
                    out.push_str("return ");
                }
                out.push_str(&render_expr(expr));
                out.push('\n');
            }
        }
    }
}

fn render_stmt(stmt: &Stmt<Source>, level: usize, out: &mut String) {
    match &stmt.kind {
        StmtKind::Defer(body) => {
            indent(level, out);
            out.push_str("defer {\n");
            render_code_block(body, level + 1, false, out);
            indent(level, out);
            out.push_str("}\n");
        }
        StmtKind::Do { body, .. } | StmtKind::Other(body) => {
            render_code_block(body, level, false, out);
        }
        StmtKind::IfConfig(_) => {}
    }
}

fn render_expr(expr: &Expr<Source>) -> String {
    match &expr.kind {
        ExprKind::DeclRef { name, .. } => name.clone(),
        ExprKind::MemberAccess { base, name } => match base {
            Some(base) => format!("{}.{}", render_expr(base), name),
            None => format!(".{}", name),
        },
        ExprKind::KeyPath { components } => format!("\\.{}", components.join(".")),
        ExprKind::FunctionCall(call) => {
            let arguments = call
                .arguments
                .iter()
                .map(|argument| match &argument.label {
                    Some(label) => format!("{}: {}", label, render_expr(&argument.value)),
                    None => render_expr(&argument.value),
                })
                .join(", ");

            let mut rendered = format!("{}({})", render_expr(&call.callee), arguments);

            if let Some(closure) = &call.trailing_closure {
                rendered.push(' ');
                rendered.push_str(&render_closure(closure));
            }

            rendered
        }
        ExprKind::Closure(closure) => render_closure(closure),
        ExprKind::MacroExpansion { name } => format!("#{}", name),
        ExprKind::Try(inner) => format!("try {}", render_expr(inner)),
        ExprKind::Await(inner) => format!("await {}", render_expr(inner)),
        ExprKind::Other(_) => String::from("<expression>"),
    }
}

fn render_closure(closure: &Closure<Source>) -> String {
    let mut out = String::from("{ ");

    if !closure.captures.is_empty() {
        out.push('[');
        out.push_str(
            &closure
                .captures
                .iter()
                .map(|capture| capture.name.as_str())
                .join(", "),
        );
        out.push_str("] ");
    }

    if !closure.parameters.is_empty() {
        out.push_str(&closure.parameters.join(", "));
        out.push_str(" in");
    }

    out.push('\n');

    let mut body = String::new();
    render_code_block(&closure.body, 2, true, &mut body);
    out.push_str(&body);
    out.push_str("    }");
    out
}

fn render_type(ty: &TypeExpr<Source>) -> String {
    match &ty.kind {
        TypeExprKind::Attributed { attributes, base } => {
            let rendered = attributes
                .iter()
                .map(|attribute| format!("@{}", attribute.name))
                .join(" ");
            format!("{} {}", rendered, render_type(base))
        }
        _ => type_renderer::canonical(ty),
    }
}

fn visibility_keyword(visibility: Visibility) -> Option<&'static str> {
    match visibility {
        Visibility::Default => None,
        Visibility::Private => Some("private"),
        Visibility::FilePrivate => Some("fileprivate"),
        Visibility::Internal => Some("internal"),
        Visibility::Package => Some("package"),
        Visibility::Public => Some("public"),
        Visibility::Open => Some("open"),
    }
}
