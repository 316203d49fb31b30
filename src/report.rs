//! Reporting adapters over a finished parse: the `{label, children}`
//! rendering of the AST, the JSON report consumed by external tooling,
//! and the plain-text summary the CLI prints by default.

use serde::Serialize;
use serde_json::{Value, json};

use crate::ast::{Expression, Program, Statement};
use crate::parser::Parser;

/// One node of the rendered AST. `children` is omitted from the JSON
/// when empty, so leaves serialize as bare `{"label": ...}` objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    fn branch(label: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }
}

pub fn ast_tree(program: &Program) -> TreeNode {
    let children = program
        .declarations
        .iter()
        .chain(&program.statements)
        .map(statement_node)
        .collect();
    TreeNode::branch("PROGRAM", children)
}

fn statement_node(statement: &Statement) -> TreeNode {
    match statement {
        Statement::Declaration {
            data_type,
            identifiers,
            initializers,
        } => {
            let children = identifiers
                .iter()
                .zip(initializers)
                .map(|(name, initializer)| {
                    TreeNode::branch(
                        format!("VAR_DECL({data_type} {name})"),
                        initializer.iter().map(expression_node).collect(),
                    )
                })
                .collect();
            TreeNode::branch("DECL", children)
        }
        Statement::Assignment {
            identifier,
            expression,
        } => TreeNode::branch(
            format!("ASSIGN({identifier})"),
            expression.iter().map(expression_node).collect(),
        ),
        Statement::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let mut children: Vec<TreeNode> = condition.iter().map(expression_node).collect();
            children.push(TreeNode::branch(
                "THEN",
                then_branch.iter().map(statement_node).collect(),
            ));
            if !else_branch.is_empty() {
                children.push(TreeNode::branch(
                    "ELSE",
                    else_branch.iter().map(statement_node).collect(),
                ));
            }
            TreeNode::branch("IF", children)
        }
        Statement::While { condition, body } => {
            let mut children: Vec<TreeNode> = condition.iter().map(expression_node).collect();
            children.push(TreeNode::branch(
                "BODY",
                body.iter().map(statement_node).collect(),
            ));
            TreeNode::branch("WHILE", children)
        }
        Statement::For {
            initialization,
            condition,
            increment,
            body,
        } => {
            let mut children = Vec::new();
            if let Some(initialization) = initialization {
                children.push(statement_node(initialization));
            }
            children.extend(condition.iter().map(expression_node));
            children.extend(increment.iter().map(expression_node));
            children.push(TreeNode::branch(
                "BODY",
                body.iter().map(statement_node).collect(),
            ));
            TreeNode::branch("FOR", children)
        }
        Statement::Return { expression } => TreeNode::branch(
            "RETURN",
            expression.iter().map(expression_node).collect(),
        ),
        Statement::Call {
            function,
            arguments,
        } => TreeNode::branch(
            format!("CALL({function})"),
            arguments.iter().map(expression_node).collect(),
        ),
        Statement::Function { name, body, .. } => TreeNode::branch(
            format!("FUNC({name})"),
            body.iter().map(statement_node).collect(),
        ),
    }
}

fn expression_node(expression: &Expression) -> TreeNode {
    match expression {
        Expression::Literal { value, .. } => TreeNode::leaf(value.clone()),
        Expression::Identifier(name) => TreeNode::leaf(name.clone()),
        Expression::Binary { op, left, right } => TreeNode::branch(
            format!("EXPR({op})"),
            vec![expression_node(left), expression_node(right)],
        ),
        Expression::Unary { op, operand } => {
            TreeNode::branch(format!("UNARY({op})"), vec![expression_node(operand)])
        }
    }
}

/// The full JSON report. The symbol table object is emitted with
/// name-sorted keys; the table itself carries no order.
pub fn json_report(parser: &Parser, program: Option<&Program>) -> Value {
    let mut symbols: Vec<_> = parser.symbol_table().symbols().collect();
    symbols.sort_by(|a, b| a.name.cmp(&b.name));
    let symbol_table: serde_json::Map<String, Value> = symbols
        .into_iter()
        .map(|symbol| (symbol.name.clone(), json!(symbol)))
        .collect();

    let tokens: Vec<Value> = parser
        .tokens()
        .iter()
        .map(|token| {
            json!({
                "type": token.kind.name(),
                "value": token.lexeme,
                "line": token.line,
                "column": token.column,
            })
        })
        .collect();

    json!({
        "errors": parser.errors(),
        "symbolTable": symbol_table,
        "hasErrors": parser.has_errors(),
        "errorCount": parser.errors().len(),
        "tokens": tokens,
        "ast": program.map(ast_tree),
    })
}

pub fn text_summary(parser: &Parser) -> String {
    let mut out = String::new();
    if parser.has_errors() {
        out.push_str(&format!(
            "Parsing completed with {} error(s):\n",
            parser.errors().len()
        ));
        for diagnostic in parser.errors() {
            out.push_str(&format!("  {diagnostic}\n"));
        }
    } else {
        out.push_str("Parsing successful!\n");
        out.push_str("Symbol Table:\n");
        let mut symbols: Vec<_> = parser.symbol_table().symbols().collect();
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        for symbol in symbols {
            out.push_str(&format!("  {} : {}\n", symbol.name, symbol.ty));
        }
    }
    out
}
