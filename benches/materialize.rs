//! Benchmarks for symbol materialization.
//!
//! Measures:
//! - Full materialization of a unit with many generic types, sequential and with rayon
//! - Cache hits for constructed types and member lists
//! - Custom attribute decoding
//! - Forwarder chains

extern crate symgraph;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use symgraph::prelude::*;

const TYPES: usize = 200;

fn method_sig(return_type: TypeSignature, params: Vec<TypeSignature>) -> SignatureMethod {
    SignatureMethod {
        has_this: true,
        explicit_this: false,
        vararg: false,
        generic_param_count: 0,
        return_type: SignatureParameter::plain(return_type),
        params: params.into_iter().map(SignatureParameter::plain).collect(),
        varargs: Vec::new(),
    }
}

/// `TYPES` generic classes, each with a field, a getter, a property, a constructor taking
/// the previous class instantiated over `int` and one attribute
fn wide_unit() -> InMemoryMetadata {
    let mut lib = MetadataBuilder::new("Wide");
    let mut previous: Option<Token> = None;
    let mut first_ctor: Option<Token> = None;

    for index in 0..TYPES {
        let class = lib.type_def(
            "Bench",
            &format!("Node{index}`1"),
            TypeAttributes::PUBLIC,
            None,
        );
        lib.generic_param(class, "T");
        lib.field(
            class,
            "value",
            FieldAttributes::PUBLIC,
            &SignatureField {
                field_type: SignatureParameter::plain(TypeSignature::GenericParamType(0)),
            },
        )
        .unwrap();
        let getter = lib
            .method(
                class,
                "get_Value",
                MethodAttributes::PUBLIC | MethodAttributes::SPECIAL_NAME,
                &method_sig(TypeSignature::GenericParamType(0), vec![]),
            )
            .unwrap();
        lib.property(
            class,
            "Value",
            &SignatureProperty {
                has_this: true,
                property_type: SignatureParameter::plain(TypeSignature::GenericParamType(0)),
                params: Vec::new(),
            },
            Some(getter),
            None,
        )
        .unwrap();

        let params = match previous {
            Some(previous) => vec![TypeSignature::GenericInst(
                Box::new(TypeSignature::Class(previous)),
                vec![TypeSignature::I4.element()],
            )],
            None => vec![],
        };
        let ctor = lib
            .method(
                class,
                ".ctor",
                MethodAttributes::PUBLIC
                    | MethodAttributes::SPECIAL_NAME
                    | MethodAttributes::RT_SPECIAL_NAME,
                &method_sig(TypeSignature::Void, params),
            )
            .unwrap();
        let marker = *first_ctor.get_or_insert(ctor);
        lib.custom_attribute(class, marker, vec![0x01, 0x00, 0x00, 0x00]);
        previous = Some(class);
    }

    lib.build()
}

fn bench_materialize_all_sequential(c: &mut Criterion) {
    c.bench_function("materialize_all_sequential", |b| {
        b.iter_batched(
            || {
                ResolutionContext::builder()
                    .unit(wide_unit())
                    .options(ImportOptions::default().with_parallel(false))
                    .build()
                    .unwrap()
            },
            |ctx| black_box(ctx.materialize_all("Wide").unwrap()),
            BatchSize::LargeInput,
        );
    });
}

fn bench_materialize_all_parallel(c: &mut Criterion) {
    c.bench_function("materialize_all_parallel", |b| {
        b.iter_batched(
            || {
                ResolutionContext::builder()
                    .unit(wide_unit())
                    .build()
                    .unwrap()
            },
            |ctx| black_box(ctx.materialize_all("Wide").unwrap()),
            BatchSize::LargeInput,
        );
    });
}

/// Repeated requests after the first one only hit the caches
fn bench_cached_construct_and_members(c: &mut Criterion) {
    let ctx = ResolutionContext::builder().unit(wide_unit()).build().unwrap();
    let token = ctx.unit("Wide").unwrap().lookup("Bench.Node0`1").unwrap();
    let definition = ctx.type_def("Wide", token).unwrap();
    let named = definition.as_named().unwrap().clone();
    let int = ctx.primitive(PrimitiveKind::I4).plain();
    let _ = ctx.members(&ctx.construct(&named, vec![int.clone()]));

    c.bench_function("cached_construct_members", |b| {
        b.iter(|| {
            let constructed = ctx.construct(black_box(&named), vec![int.clone()]);
            black_box(ctx.members(&constructed))
        });
    });
}

fn bench_attribute_blob(c: &mut Criterion) {
    let blob = [0x01, 0x00, 0x04, b'0', b'a', b'1', b'b', 0x00, 0x00];

    c.bench_function("attribute_string_arguments", |b| {
        b.iter(|| {
            let args = symgraph::metadata::customattributes::decode_string_arguments(
                black_box(&blob),
                1,
            )
            .unwrap();
            black_box(args)
        });
    });
}

/// A chain of 16 forwarders, resolved in a fresh context every iteration
fn bench_forwarder_chain(c: &mut Criterion) {
    let build = || {
        let mut builder = ResolutionContext::builder();
        for index in 0..16 {
            let mut unit = MetadataBuilder::new(&format!("F{index}"));
            unit.forward("Bench", "Target", &format!("F{}", index + 1));
            builder = builder.unit(unit.build());
        }
        let mut end = MetadataBuilder::new("F16");
        end.type_def("Bench", "Target", TypeAttributes::PUBLIC, None);
        builder.unit(end.build()).build().unwrap()
    };

    c.bench_function("forwarder_chain_16", |b| {
        b.iter_batched(
            build,
            |ctx| black_box(ctx.resolve_forwarded("F0", "Bench.Target").unwrap()),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_materialize_all_sequential,
    bench_materialize_all_parallel,
    bench_cached_construct_and_members,
    bench_attribute_blob,
    bench_forwarder_chain,
);
criterion_main!(benches);
