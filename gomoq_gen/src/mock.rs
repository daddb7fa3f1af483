use crate::context::Context;
use crate::imports::Imports;
use crate::method::Method;
use crate::symbols::{MARKER, MOCK, OPTION, OPTIONS, RUNTIME, TIME};
use crate::writer::{align, go, GoWriter, ToGo};

/// The complete mock file of one interface.
#[derive(Debug)]
pub struct Mock {
    source: String,
    interface: String,
    package_name: String,
    imports: Imports,
    interface_ref: Option<String>,
    mock_ident: String,
    verifier_ident: String,
    methods: Vec<Method>,
}

impl Mock {
    pub fn from_context(cx: &Context<'_>) -> Self {
        let methods = cx
            .model
            .methods
            .iter()
            .map(|sig| Method::from_context(cx, sig))
            .collect();

        Self {
            source: cx.model.package.clone(),
            interface: cx.model.name.clone(),
            package_name: cx.options.package_name.clone(),
            imports: cx.imports.clone(),
            interface_ref: cx.interface_ref.clone(),
            mock_ident: cx.mock_ident.clone(),
            verifier_ident: cx.verifier_ident.clone(),
            methods,
        }
    }

    fn constructor(&self, dst: &mut GoWriter) {
        let mock_ident = &self.mock_ident;

        dst.block(format!("type {mock_ident} struct {{"), "}", |dst| {
            dst.line("fail func(message string, callerSkip ...int)");
        });
        dst.blank();

        let header =
            format!("func New{mock_ident}({OPTIONS} ...{RUNTIME}.Option) *{mock_ident} {{");
        dst.block(header, "}", |dst| {
            go!(dst, "{MOCK} := &{mock_ident}{{}}");
            dst.block(format!("for _, {OPTION} := range {OPTIONS} {{"), "}", |dst| {
                go!(dst, "{OPTION}.Apply({MOCK})");
            });
            go!(dst, "return {MOCK}");
        });
        dst.blank();

        let header =
            format!("func ({MOCK} *{mock_ident}) SetFailHandler(fh {RUNTIME}.FailHandler) {{");
        dst.block(header, "}", |dst| go!(dst, "{MOCK}.fail = fh"));
        dst.blank();

        let header = format!("func ({MOCK} *{mock_ident}) FailHandler() {RUNTIME}.FailHandler {{");
        dst.block(header, "}", |dst| go!(dst, "return {MOCK}.fail"));
        dst.blank();
    }

    fn verify_funcs(&self, dst: &mut GoWriter) {
        let mock_ident = &self.mock_ident;
        let verifier = &self.verifier_ident;
        let count_matcher = format!("invocationCountMatcher {RUNTIME}.InvocationCountMatcher");

        let funcs = [
            ("VerifyWasCalledOnce", String::new(), vec![("invocationCountMatcher", format!("{RUNTIME}.Times(1)"))]),
            (
                "VerifyWasCalled",
                count_matcher.clone(),
                vec![("invocationCountMatcher", "invocationCountMatcher".to_string())],
            ),
            (
                "VerifyWasCalledInOrder",
                format!("{count_matcher}, inOrderContext *{RUNTIME}.InOrderContext"),
                vec![
                    ("invocationCountMatcher", "invocationCountMatcher".to_string()),
                    ("inOrderContext", "inOrderContext".to_string()),
                ],
            ),
            (
                "VerifyWasCalledEventually",
                format!("{count_matcher}, timeout {TIME}.Duration"),
                vec![
                    ("invocationCountMatcher", "invocationCountMatcher".to_string()),
                    ("timeout", "timeout".to_string()),
                ],
            ),
        ];

        for (name, params, fields) in funcs {
            let header = format!("func ({MOCK} *{mock_ident}) {name}({params}) *{verifier} {{");
            dst.block(header, "}", |dst| {
                dst.block(format!("return &{verifier}{{"), "}", |dst| {
                    let rows = std::iter::once(("mock:".to_string(), format!("{MOCK},")))
                        .chain(
                            fields
                                .iter()
                                .map(|(key, value)| (format!("{key}:"), format!("{value},"))),
                        )
                        .collect::<Vec<_>>();
                    for row in align(&rows) {
                        dst.line(row);
                    }
                });
            });
            dst.blank();
        }

        dst.block(format!("type {verifier} struct {{"), "}", |dst| {
            let rows = vec![
                ("mock".to_string(), format!("*{mock_ident}")),
                (
                    "invocationCountMatcher".to_string(),
                    format!("{RUNTIME}.InvocationCountMatcher"),
                ),
                ("inOrderContext".to_string(), format!("*{RUNTIME}.InOrderContext")),
                ("timeout".to_string(), format!("{TIME}.Duration")),
            ];
            for row in align(&rows) {
                dst.line(row);
            }
        });
        dst.blank();
    }
}

impl ToGo for Mock {
    fn to_go(&self, dst: &mut GoWriter) {
        dst.line(MARKER);
        go!(
            dst,
            "// Source: {} (interfaces: {})",
            self.source,
            self.interface
        );
        dst.blank();
        go!(dst, "package {}", self.package_name);
        dst.blank();
        self.imports.to_go(dst);
        dst.blank();

        if let Some(interface) = &self.interface_ref {
            go!(dst, "var _ {interface} = (*{})(nil)", self.mock_ident);
            dst.blank();
        }

        self.constructor(dst);
        self.methods.to_go(dst);
        self.verify_funcs(dst);
        for method in &self.methods {
            method.verification().to_go(dst);
        }
    }
}

