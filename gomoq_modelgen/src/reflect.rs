//! Extraction through the Go toolchain: a generated program imports the
//! target package and describes the requested interfaces with `reflect`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use gomoq_model::{is_exported, ChanDir, FuncType, InterfaceModel, MethodSignature, Parameter, StructField, TypeRef};
use itertools::Itertools;
use log::debug;
use serde::Deserialize;

use crate::error::ExtractionError;
use crate::locator::PackageLocator;
use crate::{Extractor, SourceRequest};

const PROGRAM_FILE: &str = "main.go";
const TARGET_ALIAS: &str = "target_";

const PROGRAM: &str = r#"package main

import (
	"encoding/json"
	"fmt"
	"os"
	"reflect"

	target_ "$IMPORT"
)

type typeRef struct {
	Kind     string     `json:"kind"`
	Package  string     `json:"package,omitempty"`
	Name     string     `json:"name,omitempty"`
	Len      int        `json:"len,omitempty"`
	Dir      string     `json:"dir,omitempty"`
	Key      *typeRef   `json:"key,omitempty"`
	Elem     *typeRef   `json:"elem,omitempty"`
	Params   []*typeRef `json:"params,omitempty"`
	Results  []*typeRef `json:"results,omitempty"`
	Variadic bool       `json:"variadic,omitempty"`
	Methods  []method   `json:"methods,omitempty"`
	Fields   []field    `json:"fields,omitempty"`
}

type method struct {
	Name     string     `json:"name"`
	Params   []*typeRef `json:"params"`
	Results  []*typeRef `json:"results"`
	Variadic bool       `json:"variadic"`
}

type field struct {
	Name     string   `json:"name"`
	Embedded bool     `json:"embedded"`
	Type     *typeRef `json:"type"`
}

type iface struct {
	Name    string   `json:"name"`
	Package string   `json:"package"`
	Methods []method `json:"methods"`
}

func describeFunc(t reflect.Type, skip int) ([]*typeRef, []*typeRef) {
	params := []*typeRef{}
	for i := skip; i < t.NumIn(); i++ {
		params = append(params, describe(t.In(i)))
	}
	results := []*typeRef{}
	for i := 0; i < t.NumOut(); i++ {
		results = append(results, describe(t.Out(i)))
	}
	return params, results
}

func describeMethods(t reflect.Type) []method {
	methods := []method{}
	for i := 0; i < t.NumMethod(); i++ {
		m := t.Method(i)
		params, results := describeFunc(m.Type, 0)
		methods = append(methods, method{m.Name, params, results, m.Type.IsVariadic()})
	}
	return methods
}

func describe(t reflect.Type) *typeRef {
	if t.Name() != "" {
		return &typeRef{Kind: "named", Package: t.PkgPath(), Name: t.Name()}
	}
	switch t.Kind() {
	case reflect.Ptr:
		return &typeRef{Kind: "pointer", Elem: describe(t.Elem())}
	case reflect.Slice:
		return &typeRef{Kind: "slice", Elem: describe(t.Elem())}
	case reflect.Array:
		return &typeRef{Kind: "array", Len: t.Len(), Elem: describe(t.Elem())}
	case reflect.Map:
		return &typeRef{Kind: "map", Key: describe(t.Key()), Elem: describe(t.Elem())}
	case reflect.Chan:
		dir := "both"
		switch t.ChanDir() {
		case reflect.SendDir:
			dir = "send"
		case reflect.RecvDir:
			dir = "recv"
		}
		return &typeRef{Kind: "chan", Dir: dir, Elem: describe(t.Elem())}
	case reflect.Func:
		params, results := describeFunc(t, 0)
		return &typeRef{Kind: "func", Params: params, Results: results, Variadic: t.IsVariadic()}
	case reflect.Interface:
		return &typeRef{Kind: "interface", Methods: describeMethods(t)}
	case reflect.Struct:
		fields := []field{}
		for i := 0; i < t.NumField(); i++ {
			f := t.Field(i)
			fields = append(fields, field{f.Name, f.Anonymous, describe(f.Type)})
		}
		return &typeRef{Kind: "struct", Fields: fields}
	}
	fmt.Fprintf(os.Stderr, "unsupported type %v\n", t)
	os.Exit(1)
	return nil
}

func main() {
	its := []reflect.Type{
$TYPES	}
	out := []iface{}
	for _, it := range its {
		out = append(out, iface{it.Name(), it.PkgPath(), describeMethods(it)})
	}
	if err := json.NewEncoder(os.Stdout).Encode(out); err != nil {
		fmt.Fprintln(os.Stderr, err)
		os.Exit(1)
	}
}
"#;

/// Runs a generated Go program and hands back its standard output.
pub trait ProgramRunner {
    fn run(&self, work_dir: &Path, program: &Path) -> Result<Vec<u8>, ExtractionError>;
}

/// `go run` with the configured Go binary.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    go_binary: String,
}

impl GoToolchain {
    pub fn new(go_binary: impl Into<String>) -> Self {
        Self {
            go_binary: go_binary.into(),
        }
    }
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl ProgramRunner for GoToolchain {
    fn run(&self, work_dir: &Path, program: &Path) -> Result<Vec<u8>, ExtractionError> {
        debug!("{} run {}", self.go_binary, program.display());
        let output = Command::new(&self.go_binary)
            .arg("run")
            .arg(program)
            .current_dir(work_dir)
            .output()
            .map_err(|err| ExtractionError::io(&self.go_binary, err))?;

        if !output.status.success() {
            return Err(ExtractionError::Toolchain {
                program: format!("{} run", self.go_binary),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// The reflect-based model generator.
///
/// Parameter names are not visible through `reflect`, so they are
/// synthesized. Methods come out sorted by name.
#[derive(Debug, Clone)]
pub struct ReflectExtractor<R = GoToolchain> {
    work_dir: PathBuf,
    runner: R,
}

impl ReflectExtractor<GoToolchain> {
    pub fn new(work_dir: impl Into<PathBuf>, go_binary: &str) -> Self {
        Self::with_runner(work_dir, GoToolchain::new(go_binary))
    }
}

impl<R: ProgramRunner> ReflectExtractor<R> {
    pub fn with_runner(work_dir: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            work_dir: work_dir.into(),
            runner,
        }
    }

    fn import_path(&self, path: &str) -> Result<String, ExtractionError> {
        if !(path == "." || path.starts_with("./") || path.starts_with("../")) {
            return Ok(path.to_string());
        }
        PackageLocator::new(&self.work_dir)
            .import_path_of(&self.work_dir.join(path))
            .ok_or_else(|| ExtractionError::UnresolvedImport {
                import: path.to_string(),
            })
    }

    fn extract_package(
        &self,
        path: &str,
        interfaces: &[String],
    ) -> Result<Vec<InterfaceModel>, ExtractionError> {
        if let Some(name) = interfaces.iter().find(|name| !is_exported(name)) {
            return Err(ExtractionError::Unsupported {
                name: name.clone(),
                reason: "reflection only sees exported interfaces, try the source model generator"
                    .to_string(),
            });
        }

        let import_path = self.import_path(path)?;
        let program = render_program(&import_path, interfaces);

        // Inside the working directory, so the program builds in its module.
        let dir = tempfile::Builder::new()
            .prefix("gomoq_reflect")
            .tempdir_in(&self.work_dir)
            .map_err(|err| ExtractionError::io(&self.work_dir, err))?;
        let main = dir.path().join(PROGRAM_FILE);
        fs::write(&main, program).map_err(|err| ExtractionError::io(&main, err))?;

        let stdout = self.runner.run(&self.work_dir, &main)?;
        let models = decode(&stdout)?;
        for model in &models {
            gomoq_model::validate(model)?;
        }
        Ok(models)
    }
}

impl<R: ProgramRunner> Extractor for ReflectExtractor<R> {
    fn extract(&self, request: &SourceRequest) -> Result<Vec<InterfaceModel>, ExtractionError> {
        match request {
            SourceRequest::Package { path, interfaces } => self.extract_package(path, interfaces),
            SourceRequest::File { path } => {
                Err(ExtractionError::SourceFileUnsupported { path: path.clone() })
            }
        }
    }
}

fn render_program(import_path: &str, interfaces: &[String]) -> String {
    let types = interfaces
        .iter()
        .map(|name| format!("\t\treflect.TypeOf((*{TARGET_ALIAS}.{name})(nil)).Elem(),\n"))
        .join("");
    PROGRAM
        .replace("$IMPORT", import_path)
        .replace("$TYPES", &types)
}

#[derive(Debug, Deserialize)]
struct ReflectInterface {
    name: String,
    package: String,
    methods: Vec<ReflectMethod>,
}

#[derive(Debug, Deserialize)]
struct ReflectMethod {
    name: String,
    params: Vec<ReflectType>,
    results: Vec<ReflectType>,
    variadic: bool,
}

#[derive(Debug, Deserialize)]
struct ReflectField {
    name: String,
    embedded: bool,
    #[serde(rename = "type")]
    ty: ReflectType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ReflectChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ReflectType {
    Named {
        #[serde(default)]
        package: String,
        name: String,
    },
    Pointer {
        elem: Box<ReflectType>,
    },
    Slice {
        elem: Box<ReflectType>,
    },
    Array {
        #[serde(default)]
        len: u64,
        elem: Box<ReflectType>,
    },
    Map {
        key: Box<ReflectType>,
        elem: Box<ReflectType>,
    },
    Chan {
        dir: ReflectChanDir,
        elem: Box<ReflectType>,
    },
    Func {
        #[serde(default)]
        params: Vec<ReflectType>,
        #[serde(default)]
        results: Vec<ReflectType>,
        #[serde(default)]
        variadic: bool,
    },
    Interface {
        #[serde(default)]
        methods: Vec<ReflectMethod>,
    },
    Struct {
        #[serde(default)]
        fields: Vec<ReflectField>,
    },
}

/// Decodes the program's output into interface models.
pub fn decode(json: &[u8]) -> Result<Vec<InterfaceModel>, ExtractionError> {
    let interfaces: Vec<ReflectInterface> =
        serde_json::from_slice(json).map_err(ExtractionError::Decode)?;

    Ok(interfaces
        .into_iter()
        .map(|iface| {
            let methods = iface
                .methods
                .into_iter()
                .map(ReflectMethod::into_signature)
                .sorted_by(|a, b| a.name.cmp(&b.name))
                .collect();
            InterfaceModel::new(iface.name, iface.package, methods)
        })
        .collect())
}

impl ReflectMethod {
    fn into_signature(self) -> MethodSignature {
        let params = variadic_params(self.params, self.variadic)
            .into_iter()
            .enumerate()
            .map(|(i, ty)| Parameter::new(format!("_param{i}"), ty))
            .collect();
        let results = self.results.into_iter().map(ReflectType::into_type_ref).collect();
        MethodSignature::new(self.name, params, results)
    }
}

/// `reflect` reports the last input of a variadic function as `[]T`.
fn variadic_params(params: Vec<ReflectType>, variadic: bool) -> Vec<TypeRef> {
    let mut params = params
        .into_iter()
        .map(ReflectType::into_type_ref)
        .collect::<Vec<_>>();
    if variadic {
        if let Some(TypeRef::Slice(elem)) = params.pop() {
            params.push(TypeRef::Variadic(elem));
        }
    }
    params
}

impl ReflectType {
    fn into_type_ref(self) -> TypeRef {
        match self {
            ReflectType::Named { package, name } => TypeRef::named(package, name),
            ReflectType::Pointer { elem } => TypeRef::pointer(elem.into_type_ref()),
            ReflectType::Slice { elem } => TypeRef::slice(elem.into_type_ref()),
            ReflectType::Array { len, elem } => {
                TypeRef::Array(len.to_string(), Box::new(elem.into_type_ref()))
            }
            ReflectType::Map { key, elem } => {
                TypeRef::map(key.into_type_ref(), elem.into_type_ref())
            }
            ReflectType::Chan { dir, elem } => {
                let dir = match dir {
                    ReflectChanDir::Both => ChanDir::Both,
                    ReflectChanDir::Send => ChanDir::Send,
                    ReflectChanDir::Recv => ChanDir::Recv,
                };
                TypeRef::chan(dir, elem.into_type_ref())
            }
            ReflectType::Func {
                params,
                results,
                variadic,
            } => TypeRef::Func(FuncType {
                params: variadic_params(params, variadic),
                results: results.into_iter().map(ReflectType::into_type_ref).collect(),
            }),
            ReflectType::Interface { methods } => TypeRef::Interface(
                methods
                    .into_iter()
                    .map(ReflectMethod::into_signature)
                    .collect(),
            ),
            ReflectType::Struct { fields } => TypeRef::Struct(
                fields
                    .into_iter()
                    .map(|field| StructField {
                        name: (!field.embedded).then_some(field.name),
                        ty: field.ty.into_type_ref(),
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    struct FakeRunner {
        stdout: &'static str,
        programs: RefCell<Vec<String>>,
    }

    impl ProgramRunner for FakeRunner {
        fn run(&self, work_dir: &Path, program: &Path) -> Result<Vec<u8>, ExtractionError> {
            assert!(program.starts_with(work_dir));
            self.programs
                .borrow_mut()
                .push(fs::read_to_string(program).unwrap());
            Ok(self.stdout.as_bytes().to_vec())
        }
    }

    const STORE_JSON: &str = r#"[{"name":"Store","package":"example.com/app/store","methods":[
        {"name":"Put","params":[{"kind":"named","name":"string"},{"kind":"slice","elem":{"kind":"named","name":"uint8"}}],"results":[{"kind":"named","name":"error"}],"variadic":false},
        {"name":"Log","params":[{"kind":"named","name":"string"},{"kind":"slice","elem":{"kind":"interface"}}],"results":[],"variadic":true},
        {"name":"Watch","params":[{"kind":"func","params":[{"kind":"pointer","elem":{"kind":"named","package":"example.com/app/store","name":"Event"}}]}],"results":[{"kind":"chan","dir":"recv","elem":{"kind":"struct"}}],"variadic":false}
    ]}]"#;

    #[test]
    fn decodes_and_sorts_methods() {
        let models = decode(STORE_JSON.as_bytes()).unwrap();
        let model = &models[0];
        assert_eq!(model.name, "Store");
        assert_eq!(model.package, "example.com/app/store");
        assert_eq!(
            model.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            vec!["Log", "Put", "Watch"]
        );

        let log = &model.methods[0];
        assert_eq!(log.params[0].name, "_param0");
        assert_eq!(
            log.params[1].ty,
            TypeRef::variadic(TypeRef::empty_interface())
        );
        assert!(log.is_variadic());

        let watch = &model.methods[2];
        assert_eq!(
            watch.params[0].ty,
            TypeRef::Func(FuncType {
                params: vec![TypeRef::pointer(TypeRef::named(
                    "example.com/app/store",
                    "Event"
                ))],
                results: vec![],
            })
        );
        assert_eq!(
            watch.results[0],
            TypeRef::chan(ChanDir::Recv, TypeRef::Struct(vec![]))
        );
    }

    #[test]
    fn runs_the_program_in_the_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner {
            stdout: STORE_JSON,
            programs: RefCell::new(Vec::new()),
        };
        let extractor = ReflectExtractor::with_runner(dir.path(), runner);
        let request = SourceRequest::Package {
            path: "example.com/app/store".to_string(),
            interfaces: vec!["Store".to_string(), "Reader".to_string()],
        };

        let models = extractor.extract(&request).unwrap();
        assert_eq!(models.len(), 1);

        let programs = extractor.runner.programs.borrow();
        let program = &programs[0];
        assert!(program.contains("\ttarget_ \"example.com/app/store\"\n"));
        assert!(program.contains("reflect.TypeOf((*target_.Store)(nil)).Elem(),"));
        assert!(program.contains("reflect.TypeOf((*target_.Reader)(nil)).Elem(),"));
        // the temporary program is gone
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn rejects_source_files_and_unexported_interfaces() {
        let runner = FakeRunner {
            stdout: "[]",
            programs: RefCell::new(Vec::new()),
        };
        let extractor = ReflectExtractor::with_runner(".", runner);

        let err = extractor
            .extract(&SourceRequest::File {
                path: PathBuf::from("store.go"),
            })
            .unwrap_err();
        assert!(matches!(err, ExtractionError::SourceFileUnsupported { .. }));

        let err = extractor
            .extract(&SourceRequest::Package {
                path: "example.com/app".to_string(),
                interfaces: vec!["store".to_string()],
            })
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported { .. }));
    }

    #[test]
    fn bad_output_is_a_decode_error() {
        let err = decode(b"exit status 2").unwrap_err();
        assert!(matches!(err, ExtractionError::Decode(_)));
    }
}
