//! Symbol identity within one resolution context, across contexts and across threads.

mod common;

use std::{sync::Arc, thread};

use common::{core_ref, core_unit, field_sig, method_sig};
use symgraph::{metadata::members::TypeMembersRc, prelude::*};

/// `Acme.Box<T>` with a field and a method, and `Acme.User` holding a `Box<string>`
fn lib() -> Result<InMemoryMetadata> {
    let mut lib = MetadataBuilder::new("Lib");
    let object = core_ref(&mut lib, "System", "Object");

    let boxed = lib.type_def("Acme", "Box`1", TypeAttributes::PUBLIC, Some(object));
    lib.generic_param(boxed, "T");
    lib.field(
        boxed,
        "item",
        FieldAttributes::PUBLIC,
        &field_sig(TypeSignature::GenericParamType(0)),
    )?;
    lib.method(
        boxed,
        "Get",
        MethodAttributes::PUBLIC,
        &method_sig(true, TypeSignature::GenericParamType(0), vec![]),
    )?;

    let user = lib.type_def("Acme", "User", TypeAttributes::PUBLIC, Some(object));
    lib.field(
        user,
        "names",
        FieldAttributes::PUBLIC,
        &field_sig(TypeSignature::GenericInst(
            Box::new(TypeSignature::Class(boxed)),
            vec![TypeSignature::String.element()],
        )),
    )?;
    lib.field(
        user,
        "counts",
        FieldAttributes::PUBLIC,
        &field_sig(TypeSignature::SzArray(TypeSignature::I4.element())),
    )?;

    Ok(lib.build())
}

fn context(options: ImportOptions) -> Result<ResolutionContext> {
    ResolutionContext::builder()
        .unit(lib()?)
        .unit(core_unit())
        .options(options)
        .build()
}

fn user_fields(ctx: &ResolutionContext) -> Result<(Symbol, Symbol)> {
    let token = ctx.unit("Lib")?.lookup("Acme.User").unwrap();
    let members = ctx.members(&ctx.type_def("Lib", token)?);
    Ok((
        members.field("names").unwrap().ty.symbol.clone(),
        members.field("counts").unwrap().ty.symbol.clone(),
    ))
}

/// Importing the same units twice yields equivalent but distinct symbols.
#[test]
fn test_reimport_is_equivalent_not_identical() -> Result<()> {
    let first = context(ImportOptions::default())?;
    let second = context(ImportOptions::default())?;

    let (names_a, counts_a) = user_fields(&first)?;
    let (names_b, counts_b) = user_fields(&second)?;

    assert!(names_a.is_structurally_equivalent(&names_b));
    assert!(counts_a.is_structurally_equivalent(&counts_b));
    assert_ne!(names_a, names_b);
    assert_eq!(names_a.to_string(), names_b.to_string());

    let (names_again, _) = user_fields(&first)?;
    assert_eq!(names_a, names_again);
    Ok(())
}

/// Symbols from different units never compare equal, even with the same name.
#[test]
fn test_same_name_in_two_units() -> Result<()> {
    let mut a = MetadataBuilder::new("A");
    let in_a = a.type_def("Acme", "Thing", TypeAttributes::PUBLIC, None);
    let mut b = MetadataBuilder::new("B");
    let in_b = b.type_def("Acme", "Thing", TypeAttributes::PUBLIC, None);

    let ctx = ResolutionContext::builder()
        .unit(a.build())
        .unit(b.build())
        .build()?;
    let in_a = ctx.type_def("A", in_a)?;
    let in_b = ctx.type_def("B", in_b)?;

    assert_ne!(in_a, in_b);
    assert!(!in_a.is_structurally_equivalent(&in_b));
    Ok(())
}

/// Threads racing on the same requests all observe the published instances.
#[test]
fn test_concurrent_requests_share_instances() -> Result<()> {
    let ctx = context(ImportOptions::default())?;
    let token = ctx.unit("Lib")?.lookup("Acme.Box`1").unwrap();

    let results: Vec<(Symbol, Symbol, TypeMembersRc)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let definition = ctx.type_def("Lib", token).unwrap();
                    let string = ctx.primitive(PrimitiveKind::String).plain();
                    let constructed = ctx.construct(definition.as_named().unwrap(), vec![string]);
                    let members = ctx.members(&constructed);
                    (definition, constructed, members)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let (definition, constructed, members) = &results[0];
    for (other_definition, other_constructed, other_members) in &results[1..] {
        assert_eq!(definition, other_definition);
        assert_eq!(constructed, other_constructed);
        assert!(Arc::ptr_eq(members, other_members));
    }

    let (names, _) = user_fields(&ctx)?;
    assert_eq!(&names, constructed);
    Ok(())
}

/// Parallel and sequential bulk materialization agree.
#[test]
fn test_materialize_all() -> Result<()> {
    for parallel in [true, false] {
        let ctx = context(ImportOptions::default().with_parallel(parallel))?;
        let symbols = ctx.materialize_all("Lib")?;

        let names: Vec<String> = symbols.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["Acme.Box<T>", "Acme.User"]);

        let token = ctx.unit("Lib")?.lookup("Acme.User").unwrap();
        assert_eq!(symbols[1], ctx.type_def("Lib", token)?);
        assert!(ctx.unit("Lib")?.diagnostics().is_empty());
    }
    Ok(())
}
