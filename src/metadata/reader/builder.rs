use std::collections::HashMap;

use crate::{
    metadata::{
        flags::{FieldAttributes, MethodAttributes, ParamAttributes, TypeAttributes},
        reader::{
            CustomAttributeRow, EventRow, ExportedTypeRow, FieldRow, GenericParamRow,
            MemberRefRow, MemberRow, MetadataReader, MethodImplRow, MethodRow, ParamRow,
            PropertyRow, ResolutionScope, TypeDefRow, TypeRefRow,
        },
        signatures::{
            encode_field_signature, encode_method_signature, encode_property_signature,
            encode_typespec_signature, SignatureElement, SignatureField, SignatureMethod,
            SignatureProperty,
        },
        token::{TableId, Token},
    },
    Result,
};

/// A [`MetadataReader`] over rows held in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetadata {
    name: String,
    assembly_refs: Vec<String>,
    type_defs: Vec<TypeDefRow>,
    type_refs: Vec<TypeRefRow>,
    type_specs: Vec<Vec<u8>>,
    members: HashMap<Token, MemberRow>,
    generic_params: HashMap<Token, Vec<GenericParamRow>>,
    member_refs: Vec<MemberRefRow>,
    custom_attributes: HashMap<Token, Vec<CustomAttributeRow>>,
    exported_types: Vec<ExportedTypeRow>,
    method_impls: HashMap<Token, Vec<MethodImplRow>>,
}

fn row_of<T>(rows: &[T], token: Token, table: u8) -> Option<&T> {
    if !token.is_table(table) {
        return None;
    }
    rows.get(token.row() as usize - 1)
}

impl MetadataReader for InMemoryMetadata {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn assembly_refs(&self) -> &[String] {
        &self.assembly_refs
    }

    fn type_defs(&self) -> &[TypeDefRow] {
        &self.type_defs
    }

    fn type_def(&self, token: Token) -> Option<&TypeDefRow> {
        row_of(&self.type_defs, token, TableId::TYPE_DEF)
    }

    fn type_ref(&self, token: Token) -> Option<&TypeRefRow> {
        row_of(&self.type_refs, token, TableId::TYPE_REF)
    }

    fn type_spec(&self, token: Token) -> Option<&[u8]> {
        row_of(&self.type_specs, token, TableId::TYPE_SPEC).map(Vec::as_slice)
    }

    fn member(&self, token: Token) -> Option<&MemberRow> {
        self.members.get(&token)
    }

    fn generic_params(&self, owner: Token) -> &[GenericParamRow] {
        self.generic_params.get(&owner).map_or(&[], Vec::as_slice)
    }

    fn member_ref(&self, token: Token) -> Option<&MemberRefRow> {
        row_of(&self.member_refs, token, TableId::MEMBER_REF)
    }

    fn custom_attributes(&self, parent: Token) -> &[CustomAttributeRow] {
        self.custom_attributes.get(&parent).map_or(&[], Vec::as_slice)
    }

    fn exported_types(&self) -> &[ExportedTypeRow] {
        &self.exported_types
    }

    fn method_impls(&self, class: Token) -> &[MethodImplRow] {
        self.method_impls.get(&class).map_or(&[], Vec::as_slice)
    }
}

/// Incrementally assembles an [`InMemoryMetadata`], allocating tokens the way a compiler lays
/// out its tables.
///
/// Signatures are passed in structured form and encoded to blobs; the `*_blob` variants store
/// raw bytes unchanged, which allows feeding deliberately malformed input.
///
/// # Examples
///
/// ```rust
/// use symgraph::metadata::reader::{MetadataBuilder, MetadataReader, MemberRow};
/// use symgraph::metadata::flags::{MethodAttributes, TypeAttributes};
/// use symgraph::metadata::signatures::{SignatureMethod, SignatureParameter, TypeSignature};
///
/// let mut builder = MetadataBuilder::new("Lib");
/// let class = builder.type_def("Acme", "Widget", TypeAttributes::from_bits_retain(0x1), None);
/// let method = builder.method(
///     class,
///     "Run",
///     MethodAttributes::from_bits_retain(0x0006),
///     &SignatureMethod {
///         has_this: true,
///         explicit_this: false,
///         vararg: false,
///         generic_param_count: 0,
///         return_type: SignatureParameter::plain(TypeSignature::Void),
///         params: vec![],
///         varargs: vec![],
///     },
/// )?;
///
/// let metadata = builder.build();
/// assert!(matches!(metadata.member(method), Some(MemberRow::Method(_))));
/// # Ok::<(), symgraph::Error>(())
/// ```
pub struct MetadataBuilder {
    metadata: InMemoryMetadata,
    next_method: u32,
    next_field: u32,
    next_property: u32,
    next_event: u32,
}

impl MetadataBuilder {
    /// Starts a new unit called `name`
    #[must_use]
    pub fn new(name: &str) -> Self {
        MetadataBuilder {
            metadata: InMemoryMetadata {
                name: name.to_string(),
                ..InMemoryMetadata::default()
            },
            next_method: 1,
            next_field: 1,
            next_property: 1,
            next_event: 1,
        }
    }

    /// Records a reference to another unit. Duplicates are ignored.
    pub fn assembly_ref(&mut self, unit: &str) -> &mut Self {
        if !self.metadata.assembly_refs.iter().any(|r| r == unit) {
            self.metadata.assembly_refs.push(unit.to_string());
        }
        self
    }

    /// Adds a `TypeRef` row. A reference into another unit also records the unit reference.
    pub fn type_ref(&mut self, scope: ResolutionScope, namespace: &str, name: &str) -> Token {
        if let ResolutionScope::Unit(unit) = &scope {
            let unit = unit.clone();
            self.assembly_ref(&unit);
        }

        let token = Token::from_parts(
            TableId::TYPE_REF,
            self.metadata.type_refs.len() as u32 + 1,
        );
        self.metadata.type_refs.push(TypeRefRow {
            token,
            scope,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        token
    }

    /// Adds a top-level `TypeDef` row
    pub fn type_def(
        &mut self,
        namespace: &str,
        name: &str,
        flags: TypeAttributes,
        extends: Option<Token>,
    ) -> Token {
        self.push_type_def(namespace, name, flags, extends, None)
    }

    /// Adds a `TypeDef` row nested inside `enclosing`
    pub fn nested_type_def(
        &mut self,
        enclosing: Token,
        name: &str,
        flags: TypeAttributes,
        extends: Option<Token>,
    ) -> Token {
        self.push_type_def("", name, flags, extends, Some(enclosing))
    }

    fn push_type_def(
        &mut self,
        namespace: &str,
        name: &str,
        flags: TypeAttributes,
        extends: Option<Token>,
        enclosing: Option<Token>,
    ) -> Token {
        let token = Token::from_parts(
            TableId::TYPE_DEF,
            self.metadata.type_defs.len() as u32 + 1,
        );
        self.metadata.type_defs.push(TypeDefRow {
            token,
            flags,
            namespace: namespace.to_string(),
            name: name.to_string(),
            extends,
            enclosing,
            members: Vec::new(),
        });
        token
    }

    /// Sets or replaces the base type of a type definition
    pub fn set_extends(&mut self, type_def: Token, extends: Token) -> &mut Self {
        if let Some(row) = self.type_def_mut(type_def) {
            row.extends = Some(extends);
        }
        self
    }

    /// Appends a generic parameter to a type or method definition
    pub fn generic_param(&mut self, owner: Token, name: &str) -> &mut Self {
        let params = self.metadata.generic_params.entry(owner).or_default();
        params.push(GenericParamRow {
            number: params.len() as u32,
            name: name.to_string(),
        });
        self
    }

    /// Adds a `TypeSpec` row
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the signature holds a token that cannot be encoded.
    pub fn type_spec(&mut self, signature: &SignatureElement) -> Result<Token> {
        let blob = encode_typespec_signature(signature)?;
        Ok(self.type_spec_blob(blob))
    }

    /// Adds a `TypeSpec` row from raw bytes
    pub fn type_spec_blob(&mut self, blob: Vec<u8>) -> Token {
        self.metadata.type_specs.push(blob);
        Token::from_parts(TableId::TYPE_SPEC, self.metadata.type_specs.len() as u32)
    }

    /// Adds a method to `owner`
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the signature holds a token that cannot be encoded.
    pub fn method(
        &mut self,
        owner: Token,
        name: &str,
        flags: MethodAttributes,
        signature: &SignatureMethod,
    ) -> Result<Token> {
        let blob = encode_method_signature(signature)?;
        Ok(self.method_blob(owner, name, flags, blob))
    }

    /// Adds a method to `owner` from a raw signature blob
    pub fn method_blob(
        &mut self,
        owner: Token,
        name: &str,
        flags: MethodAttributes,
        signature: Vec<u8>,
    ) -> Token {
        let token = Token::from_parts(TableId::METHOD_DEF, self.next_method);
        self.next_method += 1;
        self.push_member(
            owner,
            MemberRow::Method(MethodRow {
                token,
                name: name.to_string(),
                flags,
                signature,
                params: Vec::new(),
            }),
        );
        token
    }

    /// Adds a `Param` row to a method. Sequence 0 names the return slot.
    pub fn param(&mut self, method: Token, sequence: u32, name: &str) -> &mut Self {
        self.param_with_flags(method, sequence, name, ParamAttributes::empty())
    }

    /// Adds a `Param` row carrying `[In]`, `[Out]` or other parameter attributes
    pub fn param_with_flags(
        &mut self,
        method: Token,
        sequence: u32,
        name: &str,
        flags: ParamAttributes,
    ) -> &mut Self {
        if let Some(MemberRow::Method(row)) = self.metadata.members.get_mut(&method) {
            row.params.push(ParamRow {
                sequence,
                name: name.to_string(),
                flags,
            });
        }
        self
    }

    /// Adds a field to `owner`
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the signature holds a token that cannot be encoded.
    pub fn field(
        &mut self,
        owner: Token,
        name: &str,
        flags: FieldAttributes,
        signature: &SignatureField,
    ) -> Result<Token> {
        let blob = encode_field_signature(signature)?;
        Ok(self.field_blob(owner, name, flags, blob))
    }

    /// Adds a field to `owner` from a raw signature blob
    pub fn field_blob(
        &mut self,
        owner: Token,
        name: &str,
        flags: FieldAttributes,
        signature: Vec<u8>,
    ) -> Token {
        let token = Token::from_parts(TableId::FIELD, self.next_field);
        self.next_field += 1;
        self.push_member(
            owner,
            MemberRow::Field(FieldRow {
                token,
                name: name.to_string(),
                flags,
                signature,
            }),
        );
        token
    }

    /// Adds a property to `owner`
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the signature holds a token that cannot be encoded.
    pub fn property(
        &mut self,
        owner: Token,
        name: &str,
        signature: &SignatureProperty,
        getter: Option<Token>,
        setter: Option<Token>,
    ) -> Result<Token> {
        let blob = encode_property_signature(signature)?;
        Ok(self.property_blob(owner, name, blob, getter, setter))
    }

    /// Adds a property to `owner` from a raw signature blob
    pub fn property_blob(
        &mut self,
        owner: Token,
        name: &str,
        signature: Vec<u8>,
        getter: Option<Token>,
        setter: Option<Token>,
    ) -> Token {
        let token = Token::from_parts(TableId::PROPERTY, self.next_property);
        self.next_property += 1;
        self.push_member(
            owner,
            MemberRow::Property(PropertyRow {
                token,
                name: name.to_string(),
                signature,
                getter,
                setter,
            }),
        );
        token
    }

    /// Adds an event to `owner`
    pub fn event(
        &mut self,
        owner: Token,
        name: &str,
        event_type: Token,
        adder: Option<Token>,
        remover: Option<Token>,
    ) -> Token {
        let token = Token::from_parts(TableId::EVENT, self.next_event);
        self.next_event += 1;
        self.push_member(
            owner,
            MemberRow::Event(EventRow {
                token,
                name: name.to_string(),
                event_type,
                adder,
                remover,
                raiser: None,
            }),
        );
        token
    }

    /// Adds a `MemberRef` row for a method
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the signature holds a token that cannot be encoded.
    pub fn member_ref(
        &mut self,
        parent: Token,
        name: &str,
        signature: &SignatureMethod,
    ) -> Result<Token> {
        let blob = encode_method_signature(signature)?;
        Ok(self.member_ref_blob(parent, name, blob))
    }

    /// Adds a `MemberRef` row from a raw signature blob
    pub fn member_ref_blob(&mut self, parent: Token, name: &str, signature: Vec<u8>) -> Token {
        let token = Token::from_parts(
            TableId::MEMBER_REF,
            self.metadata.member_refs.len() as u32 + 1,
        );
        self.metadata.member_refs.push(MemberRefRow {
            token,
            parent,
            name: name.to_string(),
            signature,
        });
        token
    }

    /// Applies an attribute to `parent`
    pub fn custom_attribute(
        &mut self,
        parent: Token,
        constructor: Token,
        value: Vec<u8>,
    ) -> &mut Self {
        self.metadata
            .custom_attributes
            .entry(parent)
            .or_default()
            .push(CustomAttributeRow {
                parent,
                constructor,
                value,
            });
        self
    }

    /// Forwards `namespace.name` to the unit `target`
    pub fn forward(&mut self, namespace: &str, name: &str, target: &str) -> &mut Self {
        self.assembly_ref(target);
        self.metadata.exported_types.push(ExportedTypeRow {
            namespace: namespace.to_string(),
            name: name.to_string(),
            forwarded_to: target.to_string(),
        });
        self
    }

    /// Records that `body` implements `declaration` on `class`
    pub fn method_impl(&mut self, class: Token, body: Token, declaration: Token) -> &mut Self {
        self.metadata
            .method_impls
            .entry(class)
            .or_default()
            .push(MethodImplRow {
                class,
                body,
                declaration,
            });
        self
    }

    /// Finishes the unit
    #[must_use]
    pub fn build(self) -> InMemoryMetadata {
        self.metadata
    }

    fn type_def_mut(&mut self, token: Token) -> Option<&mut TypeDefRow> {
        if !token.is_table(TableId::TYPE_DEF) {
            return None;
        }
        self.metadata.type_defs.get_mut(token.row() as usize - 1)
    }

    fn push_member(&mut self, owner: Token, row: MemberRow) {
        let token = row.token();
        if let Some(type_def) = self.type_def_mut(owner) {
            type_def.members.push(token);
        }
        self.metadata.members.insert(token, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::signatures::{SignatureParameter, TypeSignature};

    #[test]
    fn tokens_are_allocated_per_table() {
        let mut builder = MetadataBuilder::new("Lib");
        let first = builder.type_def("N", "A", TypeAttributes::empty(), None);
        let second = builder.type_def("N", "B", TypeAttributes::empty(), None);
        let reference = builder.type_ref(ResolutionScope::Unit("Core".into()), "System", "Object");
        let field = builder.field_blob(first, "f", FieldAttributes::empty(), vec![0x06, 0x08]);

        assert_eq!(first, Token(0x02000001));
        assert_eq!(second, Token(0x02000002));
        assert_eq!(reference, Token(0x01000001));
        assert_eq!(field, Token(0x04000001));

        let metadata = builder.build();
        assert_eq!(metadata.assembly_refs(), &["Core".to_string()]);
        assert_eq!(metadata.type_def(first).unwrap().members, vec![field]);
        assert!(metadata.type_def(Token(0x02000003)).is_none());
        assert!(metadata.type_def(Token(0x01000001)).is_none());
    }

    #[test]
    fn members_keep_declaration_order() {
        let mut builder = MetadataBuilder::new("Lib");
        let class = builder.type_def("N", "C", TypeAttributes::empty(), None);
        let getter =
            builder.method_blob(class, "get_P", MethodAttributes::empty(), vec![0x20, 0x00, 0x08]);
        let property = builder
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
        let field = builder.field_blob(class, "f", FieldAttributes::empty(), vec![0x06, 0x08]);

        let metadata = builder.build();
        assert_eq!(
            metadata.type_def(class).unwrap().members,
            vec![getter, property, field]
        );
        match metadata.member(property) {
            Some(MemberRow::Property(row)) => {
                assert_eq!(row.getter, Some(getter));
                assert_eq!(row.signature, vec![0x28, 0x00, 0x08]);
            }
            other => panic!("unexpected row {:?}", other),
        }
    }

    #[test]
    fn lookups_by_parent() {
        let mut builder = MetadataBuilder::new("Lib");
        let class = builder.type_def("N", "C`1", TypeAttributes::empty(), None);
        builder.generic_param(class, "T").generic_param(class, "U");
        builder.custom_attribute(class, Token(0x0A000001), vec![0x01, 0x00, 0x00, 0x00]);
        builder.forward("N", "Moved", "Other");

        let metadata = builder.build();
        let params = metadata.generic_params(class);
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].number, 1);
        assert_eq!(params[1].name, "U");
        assert_eq!(metadata.custom_attributes(class).len(), 1);
        assert!(metadata.custom_attributes(Token(0x02000009)).is_empty());
        assert_eq!(metadata.exported_types()[0].forwarded_to, "Other");
        assert_eq!(metadata.assembly_refs(), &["Other".to_string()]);
    }
}
