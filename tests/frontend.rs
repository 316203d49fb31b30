use indoc::indoc;

use nexparse::ast::{BinaryOp, Builtin, DataType, Expression, Statement};
use nexparse::diagnostics::Category;
use nexparse::lexer::Lexer;
use nexparse::parser::Parser;
use nexparse::token::TokenKind;

fn parse(source: &str) -> (Option<nexparse::ast::Program>, Parser) {
    let mut parser = Parser::new(source);
    let program = parser.parse();
    (program, parser)
}

#[test]
fn canonical_and_alternate_lexicons_build_identical_trees() {
    let canonical = indoc! {"
        main {
            var int i, n = 2;
            var float f = 1.5;
            var bool flag = true;
            var string s = \"hi\";
            input n;
            if (flag and n > 0 or not flag) {
                output s;
            } else {
                output 0 - 1;
            }
            while (i < n) {
                i = i + 1;
            }
            for (i = 0; i < n; i = i + 1) {
                output i;
            }
        }
    "};
    let alternate = indoc! {"
        nexus {
            shard core i, n = 2;
            shard flux f = 1.5;
            shard sig flag = true;
            shard glyph s = \"hi\";
            listen n;
            probe (flag join n > 0 either void flag) {
                broadcast s;
            } fallback {
                broadcast 0 - 1;
            }
            pulse (i < n) {
                i = i + 1;
            }
            cycle (i = 0; i < n; i = i + 1) {
                broadcast i;
            }
        }
    "};

    let (canonical_program, canonical_parser) = parse(canonical);
    let (alternate_program, alternate_parser) = parse(alternate);

    assert!(!canonical_parser.has_errors(), "{:?}", canonical_parser.errors());
    assert!(!alternate_parser.has_errors(), "{:?}", alternate_parser.errors());
    assert_eq!(canonical_program, alternate_program);

    // Symbol positions shift with the spelling lengths; names, types and
    // declaration lines agree.
    let snapshot = |parser: &Parser| {
        let mut symbols: Vec<_> = parser
            .symbol_table()
            .symbols()
            .map(|s| (s.name.clone(), s.ty, s.line))
            .collect();
        symbols.sort_by(|a, b| a.0.cmp(&b.0));
        symbols
    };
    assert_eq!(snapshot(&canonical_parser), snapshot(&alternate_parser));
    assert_eq!(canonical_parser.symbol_table().len(), 5);
}

#[test]
fn keywords_are_case_insensitive_identifiers_are_not() {
    let (program, parser) = parse("MAIN { Var INT foo; var int Foo; FOO = 1; }");
    let semantic: Vec<_> = parser
        .errors()
        .iter()
        .filter(|d| d.category == Category::Semantic)
        .collect();
    // FOO matches neither declared spelling.
    assert_eq!(semantic.len(), 1);
    assert_eq!(semantic[0].message, "Symbol 'FOO' not declared");

    assert!(parser.symbol_table().exists("foo"));
    assert!(parser.symbol_table().exists("Foo"));
    assert!(program.is_some());
}

#[test]
fn token_positions_are_monotonic() {
    let source = indoc! {"
        main {
            var int x = 1;
            % comment line
            x = x ** 2;
            output \"done\";
        }
    "};
    let (_, parser) = parse(source);
    let positions: Vec<_> = parser
        .tokens()
        .iter()
        .map(|t| (t.line, t.column))
        .collect();
    for pair in positions.windows(2) {
        assert!(pair[0] <= pair[1], "positions went backwards: {pair:?}");
    }
}

#[test]
fn any_input_terminates_with_a_consistent_error_flag() {
    let inputs = [
        "",
        "main",
        "}{)(",
        "main { var int x; output x },",
        "\"",
        "main { \"\\",
        "nexus { shard }",
        "\u{1F600}\u{1F600}",
        "main { if (1 { } }",
        "main { while } ",
        "main { return ; }",
        "main { var int x = ; }",
    ];
    for source in inputs {
        let (_, parser) = parse(source);
        assert_eq!(
            parser.has_errors(),
            !parser.errors().is_empty(),
            "inconsistent error flag for {source:?}"
        );
        assert_eq!(
            parser.tokens().last().map(|t| t.kind),
            Some(TokenKind::EndOfFile)
        );
    }
}

#[test]
fn scenario_declaration_then_assignment() {
    let (program, parser) = parse("main { var int x; x = 5; }");
    assert!(parser.errors().is_empty());

    let table = parser.symbol_table();
    assert_eq!(table.len(), 1);
    assert_eq!(table.lookup("x").map(|s| s.ty), Some(DataType::Int));

    let program = program.expect("program root");
    assert_eq!(
        program.declarations,
        vec![Statement::Declaration {
            data_type: DataType::Int,
            identifiers: vec!["x".to_string()],
            initializers: vec![None],
        }]
    );
    assert_eq!(
        program.statements,
        vec![Statement::Assignment {
            identifier: "x".to_string(),
            expression: Some(Expression::literal("5", DataType::Int)),
        }]
    );
}

#[test]
fn scenario_alternate_declaration_and_broadcast() {
    let (program, parser) = parse("nexus { shard core x = 1, y; broadcast x + y; }");
    assert!(parser.errors().is_empty());

    let table = parser.symbol_table();
    assert_eq!(table.lookup("x").map(|s| s.ty), Some(DataType::Int));
    assert_eq!(table.lookup("y").map(|s| s.ty), Some(DataType::Int));

    let program = program.expect("program root");
    assert_eq!(
        program.statements,
        vec![Statement::Call {
            function: Builtin::Output,
            arguments: vec![Expression::binary(
                BinaryOp::Add,
                Expression::Identifier("x".to_string()),
                Expression::Identifier("y".to_string()),
            )],
        }]
    );
}

#[test]
fn scenario_redeclaration() {
    let (_, parser) = parse("main { var int x; var int x; }");
    let semantic: Vec<_> = parser
        .errors()
        .iter()
        .filter(|d| d.category == Category::Semantic)
        .collect();
    assert_eq!(semantic.len(), 1);
    assert!(semantic[0].message.contains("'x'"));
    assert_eq!(parser.symbol_table().len(), 1);
    assert_eq!(
        parser.symbol_table().lookup("x").map(|s| s.ty),
        Some(DataType::Int)
    );
}

#[test]
fn scenario_undeclared_assignment_keeps_the_node() {
    let (program, parser) = parse("main { x = 1; }");
    let semantic_count = parser
        .errors()
        .iter()
        .filter(|d| d.category == Category::Semantic)
        .count();
    assert!(semantic_count >= 1);

    let program = program.expect("program root");
    assert!(matches!(
        program.statements.as_slice(),
        [Statement::Assignment { identifier, .. }] if identifier == "x"
    ));
}

#[test]
fn scenario_unterminated_string_and_missing_semicolon() {
    let (_, parser) = parse("main { var int a; a = \"oops }");
    assert!(parser.has_errors());

    let messages: Vec<_> = parser
        .errors()
        .iter()
        .map(|d| (d.category, d.message.as_str()))
        .collect();
    assert!(messages.contains(&(Category::Lex, "Unterminated string literal")));
    assert!(messages.contains(&(Category::Parse, "Expected ';' after assignment")));
}

#[test]
fn scenario_probe_fallback_branches() {
    let source = indoc! {"
        main {
            var int a;
            probe (a == 0) { broadcast a; } fallback { broadcast 1; }
        }
    "};
    let (program, parser) = parse(source);
    assert!(parser.errors().is_empty(), "{:?}", parser.errors());

    let program = program.expect("program root");
    match &program.statements[0] {
        Statement::If {
            condition,
            then_branch,
            else_branch,
        } => {
            assert!(condition.is_some());
            assert_eq!(
                then_branch,
                &vec![Statement::Call {
                    function: Builtin::Output,
                    arguments: vec![Expression::Identifier("a".to_string())],
                }]
            );
            assert_eq!(
                else_branch,
                &vec![Statement::Call {
                    function: Builtin::Output,
                    arguments: vec![Expression::literal("1", DataType::Int)],
                }]
            );
        }
        other => panic!("expected an if statement, got {other:?}"),
    }
}

#[test]
fn newlines_are_lexer_observable_but_not_parser_visible() {
    let source = "main {\n}\n";
    let mut lexer = Lexer::new(source);
    let mut newline_positions = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Newline {
            newline_positions.push((token.line, token.column));
        }
        if token.kind == TokenKind::EndOfFile {
            break;
        }
    }
    assert_eq!(newline_positions, vec![(1, 7), (2, 2)]);

    let (_, parser) = parse(source);
    assert!(parser.tokens().iter().all(|t| t.kind != TokenKind::Newline));
}

#[test]
fn reserved_keywords_without_grammar_rules_are_rejected_in_statements() {
    let (_, parser) = parse("main { break; }");
    assert_eq!(parser.tokens()[2].kind, TokenKind::Break);
    let messages: Vec<_> = parser.errors().iter().map(|d| d.message.as_str()).collect();
    assert!(messages.contains(&"Unexpected token in statement"));
}

#[test]
fn percent_comments_out_the_rest_of_the_line_even_mid_expression() {
    let (_, parser) = parse("main { var int x; x = 5 % 2; }");
    // Everything after the % is gone, so the assignment loses its
    // semicolon and the program its closing brace.
    let messages: Vec<_> = parser.errors().iter().map(|d| d.message.as_str()).collect();
    assert!(messages.contains(&"Expected ';' after assignment"));
    assert!(messages.contains(&"Expected '}' at end of program"));
    assert!(parser.tokens().iter().all(|t| t.kind != TokenKind::Modulo));
}

#[test]
fn two_parsers_over_the_same_source_are_independent() {
    let source = "main { var int x; x = x + 1; }";
    let (first_program, first_parser) = parse(source);
    let (second_program, second_parser) = parse(source);
    assert_eq!(first_program, second_program);
    assert_eq!(first_parser.errors(), second_parser.errors());
}
