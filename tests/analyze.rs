//! End-to-end scenarios: host trees in, diagnostics, interface, and
//! support file out.

mod common;

use common::*;
use implicits::analyze::{analyze_module, AnalyzeOptions};
use implicits::conditional::Configuration;
use implicits::diagnostics::Severity;
use implicits::host::*;
use implicits::implicit_key::ImplicitKey;
use implicits::serialize::to_bytes;
use implicits::source_files::SourceFiles;
use implicits::support_file::SupportFileOptions;

fn empty_config() -> Configuration {
    Configuration::enabled(Vec::<String>::new())
}

fn without_exporting() -> AnalyzeOptions {
    AnalyzeOptions {
        enable_exporting: false,
        support_file: SupportFileOptions::default(),
    }
}

#[test]
fn unresolved_requirement_is_reported_at_the_scope_begin() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 5);

    let host = HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![
                let_scope(at(key, 2)),
                defer_end(at(key, 3)),
                implicit_get(Some("v"), "UInt8", at(key, 4)),
            ],
            at(key, 1),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[(Severity::Error, 2, "Unresolved requirement: UInt8")],
    );
}

#[test]
fn writing_inside_a_branch_needs_its_own_local_scope() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 7);

    let host = HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![
                let_scope(at(key, 2)),
                defer_end(at(key, 3)),
                implicit_set(Some("v"), "UInt8", at(key, 4)),
                if_branch(
                    vec![vec![implicit_set(Some("v"), "UInt16", at(key, 5))]],
                    at(key, 5),
                ),
            ],
            at(key, 1),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[(
            Severity::Error,
            5,
            "Writing to implicit scope without local 'ImplicitScope'",
        )],
    );
}

fn conditional_body(key: implicits::source_files::SourceFileKey, flag: &str, else_ty: &str) -> HostFile {
    HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![
                let_scope(at(key, 2)),
                defer_end(at(key, 3)),
                if_config_stmt(
                    vec![
                        (
                            Some(cond_ident(flag, at(key, 4))),
                            vec![implicit_get(None, "UInt8", at(key, 5))],
                        ),
                        (None, vec![implicit_get(None, else_ty, at(key, 7))]),
                    ],
                    at(key, 4),
                ),
            ],
            at(key, 1),
        )],
    }
}

#[test]
fn conditional_compilation_activates_the_true_branch() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 9);

    let analysis = analyze_module(
        "Main",
        vec![conditional_body(key, "A", "UInt16")],
        &files,
        &[],
        &Configuration::enabled(["A", "B", "C"]),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[(Severity::Error, 2, "Unresolved requirement: UInt8")],
    );
}

#[test]
fn conditional_compilation_falls_through_to_else() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 9);

    let analysis = analyze_module(
        "Main",
        vec![conditional_body(key, "D", "UInt64")],
        &files,
        &[],
        &Configuration::enabled(["A", "B", "C"]),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[(Severity::Error, 2, "Unresolved requirement: UInt64")],
    );
}

#[test]
fn requirements_propagate_across_module_interfaces() {
    let files = SourceFiles::new();
    let key_a = add_file(&files, "a.swift", 4);

    let module_a = HostFile {
        items: vec![public_func(
            "fetch",
            vec![scope_param(at(key_a, 2))],
            vec![implicit_get(Some("service"), "NetworkService", at(key_a, 3))],
            at(key_a, 2),
        )],
    };

    let analysis_a = analyze_module(
        "A",
        vec![module_a],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(&analysis_a, &[]);
    assert_eq!(analysis_a.interface.symbols.len(), 1);
    assert_eq!(
        analysis_a.interface.symbols[0].requirements,
        Some([ImplicitKey::of_type("NetworkService")].into_iter().collect())
    );

    let key_b = add_file(&files, "b.swift", 4);

    let module_b = HostFile {
        items: vec![public_func(
            "load",
            vec![scope_param(at(key_b, 2))],
            vec![call_passing_scope("fetch", at(key_b, 3))],
            at(key_b, 2),
        )],
    };

    let analysis_b = analyze_module(
        "B",
        vec![module_b],
        &files,
        &[analysis_a.interface.clone()],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(&analysis_b, &[]);

    let load = analysis_b
        .interface
        .symbols
        .iter()
        .find(|symbol| symbol.info.signature.kind.basename() == "load")
        .expect("load exported");

    assert_eq!(
        load.requirements,
        Some([ImplicitKey::of_type("NetworkService")].into_iter().collect())
    );
}

#[test]
fn support_file_synthesises_adapters_and_key_tags() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 8);

    let host = HostFile {
        items: vec![
            keys_extension("supportFileKey2", array_type("Int", at(key, 2)), at(key, 2)),
            public_func(
                "f",
                vec![param("arg", "Int", at(key, 4)), scope_param(at(key, 4))],
                vec![
                    implicit_get(Some("b"), "Bool", at(key, 5)),
                    implicit_get_keyed(
                        "k",
                        "supportFileKey2",
                        array_type("Int", at(key, 6)),
                        at(key, 6),
                    ),
                ],
                at(key, 4),
            ),
        ],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(&analysis, &[]);

    let rendered = analysis.support_file.render();

    assert!(
        rendered.contains(
            "public func f(arg: Int, bool: @autoclosure () -> Bool, supportFileKey2: @autoclosure () -> [Int]) {"
        ),
        "adapter signature missing:\n{}",
        rendered
    );
    assert!(rendered.contains("    let scope = ImplicitScope()"));
    assert!(rendered.contains("    defer {"));
    assert!(rendered.contains("        scope.end()"));
    assert!(rendered.contains("    @Implicit var bool: Bool = bool()"));
    assert!(rendered
        .contains("    @Implicit(\\.supportFileKey2) var supportFileKey2: [Int] = supportFileKey2()"));
    assert!(rendered.contains("    f(arg: arg, scope)"));

    assert!(rendered.contains("extension ImplicitsKeys {"));
    assert!(rendered.contains("    public enum _SupportFileKey2Tag {}"));
    assert!(rendered.contains(
        "    @inlinable public var supportFileKey2: ImplicitKeyPath<_SupportFileKey2Tag, [Int]> {"
    ));

    // Byte-determinism of both artifacts.
    assert_eq!(rendered, analysis.support_file.render());
    assert_eq!(
        to_bytes(&analysis.interface).unwrap(),
        to_bytes(&analysis.interface).unwrap()
    );
}

#[test]
fn scope_end_outside_defer_is_rejected() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 4);

    let host = HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![let_scope(at(key, 2)), scope_end(at(key, 3))],
            at(key, 1),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[
            (Severity::Error, 3, "'scope.end()' must appear in a 'defer' block"),
            (Severity::Error, 2, "Implicit scope must be ended in a 'defer' block"),
        ],
    );
}

#[test]
fn a_local_scope_must_be_ended() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 4);

    let host = HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![
                let_scope(at(key, 2)),
                implicit_get(Some("v"), "UInt8", at(key, 3)),
            ],
            at(key, 1),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[
            (Severity::Error, 2, "Implicit scope must be ended in a 'defer' block"),
            (Severity::Error, 2, "Unresolved requirement: UInt8"),
        ],
    );
}

#[test]
fn multiple_local_scopes_note_the_first() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 6);

    let host = HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![
                let_scope(at(key, 2)),
                defer_end(at(key, 3)),
                let_scope(at(key, 4)),
                defer_end(at(key, 5)),
            ],
            at(key, 1),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[
            (Severity::Error, 4, "Multiple local implicit scopes"),
            (Severity::Note, 2, "First implicit scope declared here"),
        ],
    );
}

#[test]
fn nested_functions_cannot_take_a_scope() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 6);

    let host = HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![
                let_scope(at(key, 2)),
                defer_end(at(key, 3)),
                HostCodeItem::Declaration(Box::new(func(
                    "helper",
                    vec![scope_param(at(key, 4))],
                    Vec::new(),
                    at(key, 4),
                ))),
            ],
            at(key, 1),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[(
            Severity::Error,
            4,
            "Nested functions with a scope parameter are not supported",
        )],
    );
}

#[test]
fn exported_scope_taking_functions_need_the_spi_attribute() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 3);

    let host = HostFile {
        items: vec![public_func(
            "fetch",
            vec![scope_param(at(key, 2))],
            Vec::new(),
            at(key, 2),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &AnalyzeOptions::default(),
    );

    expect_diagnostics(
        &analysis,
        &[(
            Severity::Error,
            2,
            "Public functions taking an implicit scope must be marked '@_spi(Implicits)'",
        )],
    );
}

#[test]
fn protocol_requirements_cannot_take_a_scope() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 4);

    let host = HostFile {
        items: vec![HostItem::Protocol(HostProtocolDecl {
            attributes: Vec::new(),
            modifiers: Vec::new(),
            name: "Fetching".into(),
            members: vec![HostItem::Function(HostFuncDecl {
                attributes: Vec::new(),
                modifiers: Vec::new(),
                name: HostFuncName::Named("fetch".into()),
                generic_parameters: Vec::new(),
                parameters: vec![scope_param(at(key, 2))],
                return_type: None,
                body: None,
                source: at(key, 2),
            })],
            source: at(key, 1),
        })],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[(
            Severity::Error,
            2,
            "Protocol requirements cannot take an implicit scope; there is no dynamic dispatch",
        )],
    );
}

#[test]
fn ambiguous_calls_note_every_candidate() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 8);

    let host = HostFile {
        items: vec![
            func(
                "target",
                vec![scope_param(at(key, 1))],
                Vec::new(),
                at(key, 1),
            ),
            func(
                "target",
                vec![scope_param(at(key, 2))],
                Vec::new(),
                at(key, 2),
            ),
            func(
                "caller",
                vec![scope_param(at(key, 4))],
                vec![call_passing_scope("target", at(key, 5))],
                at(key, 4),
            ),
        ],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[
            (Severity::Error, 5, "Ambiguous use of 'target'"),
            (Severity::Note, 1, "Found candidate 'target(_:)'"),
            (Severity::Note, 2, "Found candidate 'target(_:)'"),
        ],
    );
}

#[test]
fn with_scope_bodies_are_writable_and_report_their_own_requirements() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 6);

    let with_scope_call = HostCodeItem::Expression(HostExpr::Call(HostCall {
        callee: Box::new(HostExpr::reference("withScope", at(key, 2))),
        arguments: Vec::new(),
        trailing_closure: Some(Box::new(HostClosure {
            captures: Vec::new(),
            parameters: vec!["scope".into()],
            body: vec![
                implicit_set(Some("v"), "UInt8", at(key, 3)),
                implicit_get(Some("w"), "UInt16", at(key, 4)),
            ],
            source: at(key, 2),
        })),
        source: at(key, 2),
    }));

    let host = HostFile {
        items: vec![func("f", Vec::new(), vec![with_scope_call], at(key, 1))],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[(Severity::Error, 2, "Unresolved requirement: UInt16")],
    );
}

#[test]
fn capturing_a_bag_without_using_it_is_flagged() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 4);

    let closure = HostCodeItem::Expression(HostExpr::Closure(HostClosure {
        captures: vec![HostClosureCapture {
            name: "implicits".into(),
            source: at(key, 2),
        }],
        parameters: Vec::new(),
        body: Vec::new(),
        source: at(key, 2),
    }));

    let host = HostFile {
        items: vec![func("f", Vec::new(), vec![closure], at(key, 1))],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(&analysis, &[(Severity::Error, 2, "Unused implicits bag")]);
}

#[test]
fn bag_seeded_scopes_route_requirements_to_the_capture_site() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 10);

    let closure = HostCodeItem::Expression(HostExpr::Closure(HostClosure {
        captures: vec![HostClosureCapture {
            name: "implicits".into(),
            source: at(key, 5),
        }],
        parameters: Vec::new(),
        body: vec![
            let_scope_with_bag(at(key, 6)),
            defer_end(at(key, 7)),
            implicit_get(Some("v"), "UInt8", at(key, 8)),
        ],
        source: at(key, 5),
    }));

    let host = HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![
                let_scope(at(key, 2)),
                defer_end(at(key, 3)),
                implicit_set(Some("v"), "UInt8", at(key, 4)),
                closure,
            ],
            at(key, 1),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(&analysis, &[]);
}

#[test]
fn anonymous_implicit_with_an_initializer_warns() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 5);

    let host = HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![
                let_scope(at(key, 2)),
                defer_end(at(key, 3)),
                implicit_set(None, "UInt8", at(key, 4)),
            ],
            at(key, 1),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[(Severity::Warning, 4, "Anonymous implicit will not be saved")],
    );
}

#[test]
fn implicit_map_requires_a_source_for_the_mapped_key() {
    let files = SourceFiles::new();
    let key = add_file(&files, "main.swift", 5);

    let map_call = HostCodeItem::Expression(HostExpr::Call(HostCall {
        callee: Box::new(HostExpr::member(
            HostExpr::reference("Implicit", at(key, 4)),
            "map",
            at(key, 4),
        )),
        arguments: vec![
            HostCallArgument {
                label: None,
                value: HostExpr::KeyPath {
                    components: vec!["a".into()],
                    source: at(key, 4),
                },
            },
            HostCallArgument {
                label: None,
                value: HostExpr::KeyPath {
                    components: vec!["b".into()],
                    source: at(key, 4),
                },
            },
        ],
        trailing_closure: None,
        source: at(key, 4),
    }));

    let host = HostFile {
        items: vec![func(
            "f",
            Vec::new(),
            vec![let_scope(at(key, 2)), defer_end(at(key, 3)), map_call],
            at(key, 1),
        )],
    };

    let analysis = analyze_module(
        "Main",
        vec![host],
        &files,
        &[],
        &empty_config(),
        &without_exporting(),
    );

    expect_diagnostics(
        &analysis,
        &[(Severity::Error, 2, "Unresolved requirement: a")],
    );
}
