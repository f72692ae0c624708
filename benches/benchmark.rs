use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use modelang::{compiler::MemoryLoader, Compiler, Engine};
use serde_json::json;

const SOURCE: &str = r#"
@clean

def Username {
  type String
  gte 3
  lte 15
  match /^[a-z0-9_]+$/
}

Username account.login { required }
String account.email "Invalid email" {
  match /^[^@\s]+@[^@\s]+$/
  required
}
Number account.age { gte 18 }
Boolean account.terms { eq true }
Date account.created { lte now }
Array tags { lte 5 }
"#;

fn compiler() -> Compiler {
    Compiler::new(Box::new(MemoryLoader::new()))
}

fn bench_compile(c: &mut Criterion) {
    let compiler = compiler();
    c.bench_function("compile account model", |b| {
        b.iter(|| compiler.compile(black_box(SOURCE), Path::new("/")))
    });
}

fn bench_validate(c: &mut Criterion) {
    let model = match compiler().compile(SOURCE, Path::new("/")) {
        Ok(model) => model,
        Err(e) => panic!("{}", e),
    };
    let engine = Engine::default();
    let valid = json!({
        "account": {
            "login": "ada_l",
            "email": "ada@example.com",
            "age": 36,
            "terms": true,
            "created": "2020-01-01T00:00:00Z"
        },
        "tags": ["math", "engines"]
    });
    let invalid = json!({
        "account": { "login": "A!", "age": "young", "terms": false },
        "tags": [1, 2, 3, 4, 5, 6],
        "extra": { "dropped": true }
    });

    c.bench_function("validate valid document", |b| {
        b.iter(|| engine.validate(black_box(&valid), &model))
    });
    c.bench_function("validate invalid document", |b| {
        b.iter(|| engine.validate(black_box(&invalid), &model))
    });
}

criterion_group!(benches, bench_compile, bench_validate);
criterion_main!(benches);
