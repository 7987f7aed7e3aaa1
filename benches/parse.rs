//! Benchmark: parse a synthetic document with many classes, PODs and enums,
//! and the same document after a canonical dump.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use repidl::dump::to_source;
use repidl::parse;

fn synthetic_document(classes: usize) -> String {
    let mut src = String::from("#include \"types.h\"\n\n");
    for i in 0..classes {
        src.push_str(&format!(
            "ENUM Mode{i} {{Off, On, Auto = 0x10, Broken = -1}}\n\
             POD Preset{i}(int number, QMap<QString, QVector<int> > table)\n\
             // class {i}\n\
             class Device{i}\n\
             {{\n\
             \x20   PROP(double target = 21.5)\n\
             \x20   PROP(Mode{i} mode READONLY)\n\
             \x20   PROP(QString label = \"dev/*{i}*/\" CONSTANT)\n\
             \x20   SLOT(void apply(const QVector<Preset{i}> &presets, int))\n\
             \x20   SLOT(reset())\n\
             \x20   SIGNAL(changed(QMap<QString,int> values))\n\
             }};\n\n"
        ));
    }
    src
}

fn bench_parse(c: &mut Criterion) {
    let src = synthetic_document(200);
    let canonical = to_source(&parse(&src).expect("bench document parses"));

    c.bench_function("parse_200_classes", |b| {
        b.iter(|| parse(black_box(&src)).expect("parse"))
    });

    c.bench_function("parse_200_classes_canonical", |b| {
        b.iter(|| parse(black_box(&canonical)).expect("parse"))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
