use gomoq_model::MethodSignature;
use itertools::Itertools;

use crate::context::Context;
use crate::render::{render_reflect_type, render_type};
use crate::symbols::{
    INDEX, INVOCATIONS, MOCK, ONGOING, PARAM, PARAMS, REFLECT, RESULT, RUNTIME, VERIFIER,
};
use crate::utils;
use crate::writer::{align, go, GoWriter, ToGo};

#[derive(Debug)]
struct Param {
    name: String,
    /// As declared, `...T` for a variadic parameter.
    ty: String,
    /// As stored in the call log, `[]T` for a variadic parameter.
    storage_ty: String,
}

#[derive(Debug)]
struct Return {
    ident: String,
    ty: String,
    reflect_ty: String,
}

/// One interface method with everything its mock and verifier need.
#[derive(Debug)]
pub struct Method {
    name: String,
    mock_ident: String,
    verifier_ident: String,
    ongoing_ident: String,
    params: Vec<Param>,
    results: Vec<Return>,
}

impl Method {
    pub fn from_context(cx: &Context<'_>, sig: &MethodSignature) -> Self {
        let names =
            utils::dedupe_param_names(sig.params.iter().map(|p| p.name.as_str()), &cx.imports);
        let params = sig
            .params
            .iter()
            .zip(names)
            .map(|(param, name)| Param {
                name,
                ty: render_type(&param.ty, &cx.imports),
                storage_ty: render_type(&param.ty.storage_type(), &cx.imports),
            })
            .collect();
        let results = sig
            .results
            .iter()
            .enumerate()
            .map(|(i, ty)| Return {
                ident: utils::format_result_ident(i),
                ty: render_type(ty, &cx.imports),
                reflect_ty: render_reflect_type(ty, &cx.imports),
            })
            .collect();

        Self {
            name: sig.name.clone(),
            mock_ident: cx.mock_ident.clone(),
            verifier_ident: cx.verifier_ident.clone(),
            ongoing_ident: utils::format_ongoing_verification_ident(&cx.model.name, &sig.name),
            params,
            results,
        }
    }

    fn params_decl(&self) -> String {
        self.params
            .iter()
            .map(|p| format!("{} {}", p.name, p.ty))
            .join(", ")
    }

    fn params_record(&self, dst: &mut GoWriter) {
        go!(
            dst,
            "{PARAMS} := []{RUNTIME}.Param{{{}}}",
            self.params.iter().map(|p| &p.name).join(", ")
        );
    }

    fn results_decl(&self) -> String {
        match self.results.as_slice() {
            [] => String::new(),
            [single] => format!(" {}", single.ty),
            many => format!(" ({})", many.iter().map(|r| &r.ty).join(", ")),
        }
    }

    /// Renders the verifier method and the ongoing verification type.
    pub fn verification(&self) -> Verification<'_> {
        Verification(self)
    }
}

impl ToGo for Method {
    fn to_go(&self, dst: &mut GoWriter) {
        let header = format!(
            "func ({MOCK} *{}) {}({}){} {{",
            self.mock_ident,
            self.name,
            self.params_decl(),
            self.results_decl()
        );
        dst.block(header, "}", |dst| {
            dst.block(format!("if {MOCK} == nil {{"), "}", |dst| {
                go!(
                    dst,
                    "panic(\"mock must not be nil. Use myMock := New{}().\")",
                    self.mock_ident
                );
            });
            self.params_record(dst);

            let result_types = self.results.iter().map(|r| &r.reflect_ty).join(", ");
            let invoke = format!(
                "{RUNTIME}.GetGenericMockFrom({MOCK}).Invoke(\"{}\", {PARAMS}, []{REFLECT}.Type{{{result_types}}})",
                self.name
            );
            if self.results.is_empty() {
                dst.line(invoke);
                return;
            }

            go!(dst, "{RESULT} := {invoke}");
            for ret in &self.results {
                go!(dst, "var {} {}", ret.ident, ret.ty);
            }
            dst.block(format!("if len({RESULT}) != 0 {{"), "}", |dst| {
                for (i, ret) in self.results.iter().enumerate() {
                    dst.block(format!("if {RESULT}[{i}] != nil {{"), "}", |dst| {
                        go!(dst, "{} = {RESULT}[{i}].({})", ret.ident, ret.ty);
                    });
                }
            });
            go!(
                dst,
                "return {}",
                self.results.iter().map(|r| &r.ident).join(", ")
            );
        });
        dst.blank();
    }
}

pub struct Verification<'m>(&'m Method);

impl ToGo for Verification<'_> {
    fn to_go(&self, dst: &mut GoWriter) {
        let method = self.0;
        let ongoing = &method.ongoing_ident;

        let header = format!(
            "func ({VERIFIER} *{}) {}({}) *{ongoing} {{",
            method.verifier_ident,
            method.name,
            method.params_decl()
        );
        dst.block(header, "}", |dst| {
            method.params_record(dst);
            go!(
                dst,
                "{INVOCATIONS} := {RUNTIME}.GetGenericMockFrom({VERIFIER}.mock).Verify({VERIFIER}.inOrderContext, {VERIFIER}.invocationCountMatcher, \"{}\", {PARAMS}, {VERIFIER}.timeout)",
                method.name
            );
            go!(
                dst,
                "return &{ongoing}{{mock: {VERIFIER}.mock, {INVOCATIONS}: {INVOCATIONS}}}"
            );
        });
        dst.blank();

        dst.block(format!("type {ongoing} struct {{"), "}", |dst| {
            let fields = vec![
                ("mock".to_string(), format!("*{}", method.mock_ident)),
                (INVOCATIONS.to_string(), format!("[]{RUNTIME}.MethodInvocation")),
            ];
            for field in align(&fields) {
                dst.line(field);
            }
        });
        dst.blank();

        if method.params.is_empty() {
            return;
        }

        let names = method.params.iter().map(|p| &p.name).join(", ");
        let types = method.params.iter().map(|p| &p.storage_ty).join(", ");
        let header = if method.params.len() == 1 {
            format!("func ({ONGOING} *{ongoing}) GetCapturedArguments() {types} {{")
        } else {
            format!("func ({ONGOING} *{ongoing}) GetCapturedArguments() ({types}) {{")
        };
        dst.block(header, "}", |dst| {
            go!(dst, "{names} := {ONGOING}.GetAllCapturedArguments()");
            go!(
                dst,
                "return {}",
                method
                    .params
                    .iter()
                    .map(|p| format!("{0}[len({0})-1]", p.name))
                    .join(", ")
            );
        });
        dst.blank();

        let captured = method
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} []{}", utils::format_captured_ident(i), p.storage_ty))
            .join(", ");
        let header =
            format!("func ({ONGOING} *{ongoing}) GetAllCapturedArguments() ({captured}) {{");
        dst.block(header, "}", |dst| {
            go!(
                dst,
                "{PARAMS} := {RUNTIME}.GetGenericMockFrom({ONGOING}.mock).GetInvocationParams({ONGOING}.{INVOCATIONS})"
            );
            dst.block(format!("if len({PARAMS}) > 0 {{"), "}", |dst| {
                for (i, param) in method.params.iter().enumerate() {
                    let ident = utils::format_captured_ident(i);
                    let ty = &param.storage_ty;
                    go!(dst, "{ident} = make([]{ty}, len({ONGOING}.{INVOCATIONS}))");
                    dst.block(
                        format!("for {INDEX}, {PARAM} := range {PARAMS}[{i}] {{"),
                        "}",
                        |dst| {
                            dst.block(format!("if {PARAM} != nil {{"), "}", |dst| {
                                go!(dst, "{ident}[{INDEX}] = {PARAM}.({ty})");
                            });
                        },
                    );
                }
            });
            dst.line("return");
        });
        dst.blank();
    }
}
