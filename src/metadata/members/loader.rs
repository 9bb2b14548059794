//! Materialization of member lists.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use tracing::debug;

use crate::metadata::{
    context::ResolutionContext,
    decoder::{DecodedParameter, SignatureDecoder},
    flags::{MethodAttributes, ParamAttributes},
    members::{
        accessors::{
            event_requires_direct_calls, property_parameter_names, property_requires_direct_calls,
            PropertyShape,
        },
        classify_virtualness,
        modifiers::{has_required, unsupported_modifier_error, unsupported_required},
        Event, EventRc, Field, FieldRc, Member, Method, MethodKind, MethodRc, Parameter, Property,
        PropertyRc, RefKind, TypeMembers, TypeMembersRc, UseSiteDiagnostic, Virtualness,
        IN_ATTRIBUTE, IS_EXTERNAL_INIT, IS_VOLATILE,
    },
    reader::{EventRow, FieldRow, MemberRow, MethodRow, ParamRow, PropertyRow},
    signatures::{SignatureParameter, SignatureParser},
    token::Token,
    typesystem::{
        ConstructedTypeRc, ErrorKind, Modifier, NamedTypeRc, Symbol, SymbolId, TypeMap,
        TypeParameterKind, TypeParameterRef, TypeWithModifiers,
    },
    unit::CompiledUnit,
};

/// Keeps the first problem found while importing one member
#[derive(Default)]
struct Problems(Option<ErrorKind>);

impl Problems {
    fn note(&mut self, error: ErrorKind) {
        if self.0.is_none() {
            self.0 = Some(error);
        }
    }

    fn check_type(&mut self, ty: &TypeWithModifiers) {
        if let Some(kind) = ty.symbol.find_error().and_then(|e| e.as_error().cloned()) {
            self.note(kind);
        }
    }

    fn check_modifiers(&mut self, modifiers: &[Modifier], accepted: &[&str]) {
        if let Some(modifier) = unsupported_required(modifiers, accepted) {
            self.note(unsupported_modifier_error(modifier));
        }
    }
}

fn by_ref_kind(decoded: &DecodedParameter) -> RefKind {
    if !decoded.by_ref {
        RefKind::None
    } else if has_required(&decoded.ref_modifiers, IN_ATTRIBUTE) {
        RefKind::In
    } else {
        RefKind::Ref
    }
}

fn param_row(rows: &[ParamRow], sequence: u32) -> Option<&ParamRow> {
    rows.iter().find(|row| row.sequence == sequence)
}

struct MemberLoader<'a> {
    ctx: &'a ResolutionContext,
    unit: &'a CompiledUnit,
    owner: &'a NamedTypeRc,
    declaring_type: Symbol,
    overrides: HashMap<Token, Vec<Token>>,
}

impl<'a> MemberLoader<'a> {
    fn new(ctx: &'a ResolutionContext, unit: &'a CompiledUnit, owner: &'a NamedTypeRc) -> Self {
        let mut overrides: HashMap<Token, Vec<Token>> = HashMap::new();
        for row in unit.reader().method_impls(owner.token) {
            overrides.entry(row.body).or_default().push(row.declaration);
        }

        MemberLoader {
            ctx,
            unit,
            owner,
            declaring_type: Symbol::Named(owner.clone()),
            overrides,
        }
    }

    fn diagnostic(&self, member: &str, error: ErrorKind) -> UseSiteDiagnostic {
        UseSiteDiagnostic {
            member: format!("{}.{}", self.owner.full_name(), member),
            unit: self.unit.name().to_string(),
            error,
        }
    }

    fn max_depth(&self) -> usize {
        self.ctx.options.max_signature_depth
    }

    fn load(&self) -> TypeMembers {
        let Some(row) = self.unit.reader().type_def(self.owner.token) else {
            return TypeMembers::default();
        };
        let scope = self.ctx.options.scope;
        let rows: Vec<&MemberRow> = row
            .members
            .iter()
            .filter_map(|token| self.unit.reader().member(*token))
            .collect();

        let mut built: HashMap<Token, Member> = HashMap::new();
        let mut methods: HashMap<Token, MethodRc> = HashMap::new();

        for row in &rows {
            match row {
                MemberRow::Method(method) if scope.includes(method.flags.accessibility()) => {
                    let method = Arc::new(self.load_method(method));
                    methods.insert(method.token, method.clone());
                    built.insert(method.token, Member::Method(method));
                }
                MemberRow::Field(field) if scope.includes(field.flags.accessibility()) => {
                    built.insert(field.token, Member::Field(Arc::new(self.load_field(field))));
                }
                _ => {}
            }
        }

        for row in &rows {
            match row {
                MemberRow::Property(property) => {
                    if let Some(property) = self.load_property(property, &methods) {
                        built.insert(property.token, Member::Property(property));
                    }
                }
                MemberRow::Event(event) => {
                    if let Some(event) = self.load_event(event, &methods) {
                        built.insert(event.token, Member::Event(event));
                    }
                }
                _ => {}
            }
        }

        for method in methods.values() {
            if method.is_init_only() && method.kind() != MethodKind::PropertySet {
                let _ = method.use_site.set(self.diagnostic(
                    &method.name,
                    ErrorKind::UnsupportedMetadata(
                        "init-only return on a method that is not a property setter".to_string(),
                    ),
                ));
            }
        }

        let members: Vec<Member> = rows
            .iter()
            .filter_map(|row| built.remove(&row.token()))
            .collect();

        for member in &members {
            if let Some(diagnostic) = member.use_site() {
                self.unit.report(diagnostic.clone());
            }
        }

        debug!(
            unit = self.unit.name(),
            owner = %self.owner,
            members = members.len(),
            "materialized members"
        );
        TypeMembers::new(members)
    }

    fn load_parameters(
        &self,
        decoder: &mut SignatureDecoder<'_>,
        signature: &[SignatureParameter],
        rows: &[ParamRow],
        problems: &mut Problems,
    ) -> Vec<Parameter> {
        signature
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let decoded = decoder.decode_parameter(param);
                let row = param_row(rows, index as u32 + 1);
                let flags = row.map_or(ParamAttributes::empty(), |row| row.flags);

                let ref_kind = if decoded.by_ref
                    && flags.contains(ParamAttributes::OUT)
                    && !flags.contains(ParamAttributes::IN)
                {
                    RefKind::Out
                } else {
                    by_ref_kind(&decoded)
                };

                problems.check_modifiers(&decoded.ref_modifiers, &[IN_ATTRIBUTE]);
                problems.check_modifiers(&decoded.ty.modifiers, &[]);
                problems.check_type(&decoded.ty);

                Parameter {
                    name: row.map(|row| row.name.clone()).unwrap_or_default(),
                    ordinal: index as u32,
                    ref_kind,
                    ref_modifiers: decoded.ref_modifiers,
                    ty: decoded.ty,
                }
            })
            .collect()
    }

    fn load_method(&self, row: &MethodRow) -> Method {
        let method_id = SymbolId::next();
        let type_parameters: Vec<TypeParameterRef> = self
            .unit
            .reader()
            .generic_params(row.token)
            .iter()
            .enumerate()
            .map(|(position, param)| TypeParameterRef {
                kind: TypeParameterKind::Method,
                owner: method_id,
                position: position as u32,
                name: param.name.clone(),
            })
            .collect();

        let mut problems = Problems::default();
        let mut is_init_only = false;
        let mut return_ref_kind = RefKind::None;
        let mut return_ref_modifiers = Vec::new();
        let mut parameters = Vec::new();

        let return_type = match SignatureParser::new(&row.signature)
            .with_max_depth(self.max_depth())
            .parse_method_signature()
        {
            Ok(signature) => {
                if signature.generic_param_count as usize != type_parameters.len() {
                    problems.note(ErrorKind::UnsupportedMetadata(format!(
                        "signature declares {} type parameters, metadata {}",
                        signature.generic_param_count,
                        type_parameters.len()
                    )));
                }

                let mut decoder = SignatureDecoder::new(
                    self.ctx,
                    self.unit,
                    self.owner.generic_context(),
                    &type_parameters,
                );

                let returned = decoder.decode_parameter(&signature.return_type);
                return_ref_kind = by_ref_kind(&returned);
                problems.check_modifiers(&returned.ref_modifiers, &[IN_ATTRIBUTE]);
                problems.check_modifiers(&returned.ty.modifiers, &[IS_EXTERNAL_INIT]);
                problems.check_type(&returned.ty);
                is_init_only = has_required(&returned.ty.modifiers, IS_EXTERNAL_INIT);

                parameters =
                    self.load_parameters(
                        &mut decoder,
                        &signature.params,
                        &row.params,
                        &mut problems,
                    );
                return_ref_modifiers = returned.ref_modifiers;
                returned.ty
            }
            Err(error) => {
                let kind = ErrorKind::UnsupportedMetadata(format!(
                    "method signature of '{}': {}",
                    row.name, error
                ));
                problems.note(kind.clone());
                Symbol::error(kind).plain()
            }
        };

        let explicit_overrides = self.overrides.get(&row.token).cloned().unwrap_or_default();
        let virtualness = classify_virtualness(
            row.flags.contains(MethodAttributes::NEW_SLOT),
            row.flags.contains(MethodAttributes::VIRTUAL),
            row.flags.contains(MethodAttributes::ABSTRACT),
            row.flags.contains(MethodAttributes::FINAL),
            !explicit_overrides.is_empty(),
        );

        let kind = OnceLock::new();
        match row.name.as_str() {
            ".ctor" => {
                let _ = kind.set(MethodKind::Constructor);
            }
            ".cctor" => {
                let _ = kind.set(MethodKind::StaticConstructor);
            }
            _ => {}
        }

        let use_site = OnceLock::new();
        if let Some(error) = problems.0 {
            let _ = use_site.set(self.diagnostic(&row.name, error));
        }

        Method {
            token: row.token,
            name: row.name.clone(),
            declaring_type: self.declaring_type.clone(),
            flags: row.flags,
            type_parameters,
            return_ref_kind,
            return_ref_modifiers,
            return_type,
            parameters,
            virtualness,
            explicit_overrides,
            is_init_only,
            kind,
            use_site,
        }
    }

    fn load_field(&self, row: &FieldRow) -> Field {
        let mut problems = Problems::default();

        let (ref_kind, ref_modifiers, ty, is_volatile) = match SignatureParser::new(&row.signature)
            .with_max_depth(self.max_depth())
            .parse_field_signature()
        {
            Ok(signature) => {
                let mut decoder =
                    SignatureDecoder::new(self.ctx, self.unit, self.owner.generic_context(), &[]);
                let decoded = decoder.decode_parameter(&signature.field_type);
                problems.check_modifiers(&decoded.ref_modifiers, &[IN_ATTRIBUTE]);
                problems.check_modifiers(&decoded.ty.modifiers, &[IS_VOLATILE]);
                problems.check_type(&decoded.ty);

                let is_volatile = has_required(&decoded.ty.modifiers, IS_VOLATILE);
                (by_ref_kind(&decoded), decoded.ref_modifiers, decoded.ty, is_volatile)
            }
            Err(error) => {
                let kind = ErrorKind::UnsupportedMetadata(format!(
                    "field signature of '{}': {}",
                    row.name, error
                ));
                problems.note(kind.clone());
                (RefKind::None, Vec::new(), Symbol::error(kind).plain(), false)
            }
        };

        Field {
            token: row.token,
            name: row.name.clone(),
            declaring_type: self.declaring_type.clone(),
            flags: row.flags,
            ref_kind,
            ref_modifiers,
            ty,
            is_volatile,
            use_site: problems.0.map(|error| self.diagnostic(&row.name, error)),
        }
    }

    fn load_property(
        &self,
        row: &PropertyRow,
        methods: &HashMap<Token, MethodRc>,
    ) -> Option<PropertyRc> {
        let getter = row.getter.and_then(|token| methods.get(&token)).cloned();
        let setter = row.setter.and_then(|token| methods.get(&token)).cloned();
        if getter.is_none() && setter.is_none() {
            return None;
        }

        let mut problems = Problems::default();
        let (is_static, ref_kind, ref_modifiers, ty, mut parameters) =
            match SignatureParser::new(&row.signature)
                .with_max_depth(self.max_depth())
                .parse_property_signature()
            {
                Ok(signature) => {
                    let mut decoder = SignatureDecoder::new(
                        self.ctx,
                        self.unit,
                        self.owner.generic_context(),
                        &[],
                    );
                    let value = decoder.decode_parameter(&signature.property_type);
                    problems.check_modifiers(&value.ref_modifiers, &[IN_ATTRIBUTE]);
                    problems.check_modifiers(&value.ty.modifiers, &[]);
                    problems.check_type(&value.ty);

                    let parameters =
                        self.load_parameters(&mut decoder, &signature.params, &[], &mut problems);
                    (
                        !signature.has_this,
                        by_ref_kind(&value),
                        value.ref_modifiers,
                        value.ty,
                        parameters,
                    )
                }
                Err(error) => {
                    let kind = ErrorKind::UnsupportedMetadata(format!(
                        "property signature of '{}': {}",
                        row.name, error
                    ));
                    problems.note(kind.clone());
                    let is_static = getter
                        .as_ref()
                        .or(setter.as_ref())
                        .is_some_and(|m| m.is_static());
                    (is_static, RefKind::None, Vec::new(), Symbol::error(kind).plain(), Vec::new())
                }
            };

        let names =
            property_parameter_names(parameters.len(), getter.as_deref(), setter.as_deref());
        for (parameter, name) in parameters.iter_mut().zip(names) {
            parameter.name = name;
        }

        let must_call_methods_directly = property_requires_direct_calls(
            &PropertyShape {
                is_static,
                ref_kind,
                ref_modifiers: &ref_modifiers,
                ty: &ty,
                parameters: &parameters,
            },
            getter.as_deref(),
            setter.as_deref(),
        );

        if !must_call_methods_directly {
            if let Some(getter) = &getter {
                getter.claim(MethodKind::PropertyGet);
            }
            if let Some(setter) = &setter {
                setter.claim(MethodKind::PropertySet);
            }
        }

        let virtualness = getter
            .as_ref()
            .or(setter.as_ref())
            .map_or(Virtualness::NonVirtual, |accessor| accessor.virtualness);

        Some(Arc::new(Property {
            token: row.token,
            name: row.name.clone(),
            declaring_type: self.declaring_type.clone(),
            is_static,
            ref_kind,
            ref_modifiers,
            ty,
            parameters,
            getter,
            setter,
            must_call_methods_directly,
            virtualness,
            use_site: problems.0.map(|error| self.diagnostic(&row.name, error)),
        }))
    }

    fn load_event(&self, row: &EventRow, methods: &HashMap<Token, MethodRc>) -> Option<EventRc> {
        let accessor = |token: Option<Token>| token.and_then(|token| methods.get(&token)).cloned();
        let adder = accessor(row.adder);
        let remover = accessor(row.remover);
        let raiser = accessor(row.raiser);
        if adder.is_none() && remover.is_none() && raiser.is_none() {
            return None;
        }

        let mut decoder =
            SignatureDecoder::new(self.ctx, self.unit, self.owner.generic_context(), &[]);
        let event_type = decoder.resolve_token(row.event_type);

        let mut problems = Problems::default();
        problems.check_type(&event_type.clone().plain());

        let must_call_methods_directly =
            event_requires_direct_calls(&event_type, adder.as_deref(), remover.as_deref());
        if !must_call_methods_directly {
            if let Some(adder) = &adder {
                adder.claim(MethodKind::EventAdd);
            }
            if let Some(remover) = &remover {
                remover.claim(MethodKind::EventRemove);
            }
        }

        let virtualness = adder
            .as_ref()
            .or(remover.as_ref())
            .or(raiser.as_ref())
            .map_or(Virtualness::NonVirtual, |accessor| accessor.virtualness);

        Some(Arc::new(Event {
            token: row.token,
            name: row.name.clone(),
            declaring_type: self.declaring_type.clone(),
            event_type,
            adder,
            remover,
            raiser,
            must_call_methods_directly,
            virtualness,
            use_site: problems.0.map(|error| self.diagnostic(&row.name, error)),
        }))
    }
}

/// Rewrites a definition's members for one constructed type
struct MemberSubstitution<'a> {
    ctx: &'a ResolutionContext,
    map: TypeMap<'a>,
    declaring_type: Symbol,
}

impl MemberSubstitution<'_> {
    fn ty(&self, ty: &TypeWithModifiers) -> TypeWithModifiers {
        self.map.substitute(self.ctx, ty)
    }

    fn parameters(&self, parameters: &[Parameter]) -> Vec<Parameter> {
        parameters
            .iter()
            .map(|parameter| Parameter {
                ty: self.ty(&parameter.ty),
                ..parameter.clone()
            })
            .collect()
    }

    fn method(&self, method: &Method) -> Method {
        let kind = OnceLock::new();
        if let Some(existing) = method.kind.get() {
            let _ = kind.set(*existing);
        }
        let use_site = OnceLock::new();
        if let Some(existing) = method.use_site.get() {
            let _ = use_site.set(existing.clone());
        }

        Method {
            token: method.token,
            name: method.name.clone(),
            declaring_type: self.declaring_type.clone(),
            flags: method.flags,
            type_parameters: method.type_parameters.clone(),
            return_ref_kind: method.return_ref_kind,
            return_ref_modifiers: method.return_ref_modifiers.clone(),
            return_type: self.ty(&method.return_type),
            parameters: self.parameters(&method.parameters),
            virtualness: method.virtualness,
            explicit_overrides: method.explicit_overrides.clone(),
            is_init_only: method.is_init_only,
            kind,
            use_site,
        }
    }

    fn field(&self, field: &Field) -> FieldRc {
        Arc::new(Field {
            token: field.token,
            name: field.name.clone(),
            declaring_type: self.declaring_type.clone(),
            flags: field.flags,
            ref_kind: field.ref_kind,
            ref_modifiers: field.ref_modifiers.clone(),
            ty: self.ty(&field.ty),
            is_volatile: field.is_volatile,
            use_site: field.use_site.clone(),
        })
    }

    fn apply(&self, definition: &TypeMembers) -> TypeMembers {
        let methods: HashMap<Token, MethodRc> = definition
            .methods()
            .map(|method| (method.token, Arc::new(self.method(method))))
            .collect();
        let accessor = |method: &Option<MethodRc>| {
            method
                .as_ref()
                .and_then(|method| methods.get(&method.token))
                .cloned()
        };

        let members = definition
            .iter()
            .filter_map(|member| {
                Some(match member {
                    Member::Method(method) => Member::Method(methods.get(&method.token)?.clone()),
                    Member::Field(field) => Member::Field(self.field(field)),
                    Member::Property(property) => Member::Property(Arc::new(Property {
                        token: property.token,
                        name: property.name.clone(),
                        declaring_type: self.declaring_type.clone(),
                        is_static: property.is_static,
                        ref_kind: property.ref_kind,
                        ref_modifiers: property.ref_modifiers.clone(),
                        ty: self.ty(&property.ty),
                        parameters: self.parameters(&property.parameters),
                        getter: accessor(&property.getter),
                        setter: accessor(&property.setter),
                        must_call_methods_directly: property.must_call_methods_directly,
                        virtualness: property.virtualness,
                        use_site: property.use_site.clone(),
                    })),
                    Member::Event(event) => Member::Event(Arc::new(Event {
                        token: event.token,
                        name: event.name.clone(),
                        declaring_type: self.declaring_type.clone(),
                        event_type: self.ty(&event.event_type.clone().plain()).symbol,
                        adder: accessor(&event.adder),
                        remover: accessor(&event.remover),
                        raiser: accessor(&event.raiser),
                        must_call_methods_directly: event.must_call_methods_directly,
                        virtualness: event.virtualness,
                        use_site: event.use_site.clone(),
                    })),
                })
            })
            .collect();

        TypeMembers::new(members)
    }
}

impl ResolutionContext {
    /// The imported members of a named or constructed type.
    ///
    /// The list is built on first request and shared afterwards. Members of a constructed type
    /// are the definition's members with every type parameter of the definition substituted.
    /// Other symbols have no members.
    #[must_use]
    pub fn members(&self, symbol: &Symbol) -> TypeMembersRc {
        match symbol {
            Symbol::Named(named) => match self.unit_at(named.unit) {
                Some(unit) => unit.members.get_or_compute(named.token, || {
                    Arc::new(MemberLoader::new(self, unit, named).load())
                }),
                None => TypeMembersRc::default(),
            },
            Symbol::Constructed(constructed) => self.constructed_members(symbol, constructed),
            _ => TypeMembersRc::default(),
        }
    }

    fn constructed_members(
        &self,
        symbol: &Symbol,
        constructed: &ConstructedTypeRc,
    ) -> TypeMembersRc {
        let Some(unit) = self.unit_at(constructed.definition.unit) else {
            return TypeMembersRc::default();
        };

        unit.constructed_members.get_or_compute(constructed.id, || {
            let definition = self.members(&Symbol::Named(constructed.definition.clone()));
            let substitution = MemberSubstitution {
                ctx: self,
                map: TypeMap::new(&constructed.args),
                declaring_type: symbol.clone(),
            };
            Arc::new(substitution.apply(&definition))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        metadata::{
            config::{ImportOptions, ImportScope},
            context::ResolutionContext,
            flags::{FieldAttributes, MethodAttributes, TypeAttributes},
            members::MethodKind,
            reader::{InMemoryMetadata, MetadataBuilder},
            signatures::{SignatureField, SignatureParameter, SignatureProperty, TypeSignature},
            token::Token,
        },
        test::factories::metadata::{int_getter, void_method},
    };

    fn unit_with_private_getter() -> (InMemoryMetadata, Token) {
        let mut builder = MetadataBuilder::new("Lib");
        let class = builder.type_def("N", "C", TypeAttributes::PUBLIC, None);
        let getter = int_getter(&mut builder, class, "get_P", MethodAttributes::PRIVATE);
        builder
            .property(
                class,
                "P",
                &SignatureProperty {
                    has_this: true,
                    property_type: SignatureParameter::plain(TypeSignature::I4),
                    params: vec![],
                },
                Some(getter),
                None,
            )
            .unwrap();
        (builder.build(), class)
    }

    #[test]
    fn scope_filters_rows_before_creation() {
        let mut builder = MetadataBuilder::new("Lib");
        let class = builder.type_def("N", "C", TypeAttributes::PUBLIC, None);
        void_method(&mut builder, class, "Visible", MethodAttributes::PUBLIC);
        void_method(&mut builder, class, "Hidden", MethodAttributes::PRIVATE);
        void_method(&mut builder, class, "Friend", MethodAttributes::ASSEMBLY);
        builder
            .field(
                class,
                "secret",
                FieldAttributes::PRIVATE,
                &SignatureField {
                    field_type: SignatureParameter::plain(TypeSignature::I4),
                },
            )
            .unwrap();

        let ctx = ResolutionContext::builder()
            .unit(builder.build())
            .options(ImportOptions::default().with_scope(ImportScope::PublicOnly))
            .build()
            .unwrap();
        let symbol = ctx.type_def("Lib", class).unwrap();
        let members = ctx.members(&symbol);

        let names: Vec<&str> = members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Visible"]);
        assert!(Arc::ptr_eq(&members, &ctx.members(&symbol)));
    }

    #[test]
    fn property_follows_its_accessors_into_scope() {
        let (metadata, class) = unit_with_private_getter();
        let ctx = ResolutionContext::builder()
            .unit(metadata)
            .options(ImportOptions::public_and_internal())
            .build()
            .unwrap();
        assert!(ctx.members(&ctx.type_def("Lib", class).unwrap()).is_empty());

        let (metadata, class) = unit_with_private_getter();
        let ctx = ResolutionContext::builder().unit(metadata).build().unwrap();
        let members = ctx.members(&ctx.type_def("Lib", class).unwrap());
        let property = members.property("P").unwrap();
        assert!(!property.must_call_methods_directly);
        assert_eq!(
            property.getter.as_ref().map(|getter| getter.kind()),
            Some(MethodKind::PropertyGet)
        );
    }
}
