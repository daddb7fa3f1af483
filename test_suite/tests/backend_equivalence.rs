mod common;

use gomoq_modelgen::{decode_reflection, Extractor, SourceExtractor, SourceRequest};
use pretty_assertions::assert_eq;

use common::module;

const STORE: &str = r#"package store

type Key string

type Store interface {
	Put(key Key, value []byte, tags ...string) error
	Get(Key) ([]byte, bool)
	Watch(prefix string) <-chan map[Key]any
	Each(fn func(Key, []byte) bool)
}
"#;

// What the reflection program prints for STORE, methods in reflect order.
const STORE_JSON: &str = r#"[{
  "name": "Store",
  "package": "example.com/app/store",
  "methods": [
    {
      "name": "Each",
      "params": [{"kind": "func", "params": [
        {"kind": "named", "package": "example.com/app/store", "name": "Key"},
        {"kind": "slice", "elem": {"kind": "named", "name": "uint8"}}
      ], "results": [{"kind": "named", "name": "bool"}]}],
      "results": [],
      "variadic": false
    },
    {
      "name": "Get",
      "params": [{"kind": "named", "package": "example.com/app/store", "name": "Key"}],
      "results": [
        {"kind": "slice", "elem": {"kind": "named", "name": "uint8"}},
        {"kind": "named", "name": "bool"}
      ],
      "variadic": false
    },
    {
      "name": "Put",
      "params": [
        {"kind": "named", "package": "example.com/app/store", "name": "Key"},
        {"kind": "slice", "elem": {"kind": "named", "name": "uint8"}},
        {"kind": "slice", "elem": {"kind": "named", "name": "string"}}
      ],
      "results": [{"kind": "named", "name": "error"}],
      "variadic": true
    },
    {
      "name": "Watch",
      "params": [{"kind": "named", "name": "string"}],
      "results": [{"kind": "chan", "dir": "recv", "elem": {"kind": "map",
        "key": {"kind": "named", "package": "example.com/app/store", "name": "Key"},
        "elem": {"kind": "interface"}}}],
      "variadic": false
    }
  ]
}]"#;

#[test]
fn test1() {
    let dir = module(&[("store/store.go", STORE)]);
    let syntactic = SourceExtractor::new(dir.path())
        .extract(&SourceRequest::Package {
            path: "example.com/app/store".to_string(),
            interfaces: vec!["Store".to_string()],
        })
        .unwrap();
    let reflective = decode_reflection(STORE_JSON.as_bytes()).unwrap();

    assert_eq!(syntactic.len(), 1);
    assert_eq!(reflective.len(), 1);
    assert_eq!(syntactic[0].shape(), reflective[0].shape());
}

#[test]
fn test2() {
    // same interface through a source file request
    let dir = module(&[("store/store.go", STORE)]);
    let syntactic = SourceExtractor::new(dir.path())
        .extract(&SourceRequest::File {
            path: dir.path().join("store/store.go"),
        })
        .unwrap();
    let reflective = decode_reflection(STORE_JSON.as_bytes()).unwrap();

    assert_eq!(syntactic[0].shape(), reflective[0].shape());
    // only the syntactic model knows parameter names
    assert_eq!(syntactic[0].method("Put").unwrap().params[0].name, "key");
    assert_eq!(reflective[0].method("Put").unwrap().params[0].name, "_param0");
}
