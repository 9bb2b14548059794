//! Custom attribute blob parsing.
//!
//! The layout follows ECMA-335 II.23.3:
//!
//! ```text
//! Prolog(0x0001) FixedArg* NumNamed(u16) NamedArg*
//! NamedArg  := (0x53 | 0x54) FieldOrPropType SerString FixedArg
//! ```
//!
//! Fixed arguments are untagged; their encoding follows from the constructor's parameter
//! types. Only `object` parameters and named arguments carry a type tag. Enum arguments are
//! stored as their underlying integral type, so decoding needs a way to learn that type: the
//! parser asks an [`AttributeTypes`] implementation for every type it cannot interpret by
//! itself.
//!
//! Nesting (arrays of boxed arrays and so on) is bounded by a depth limit.

use std::sync::Arc;

use crate::{
    file::parser::Parser,
    metadata::{
        customattributes::types::{
            ConstantValue, NamedArgument, NamedArgumentKind, TypedConstant, SERIALIZATION_TYPE,
        },
        typesystem::{ArrayType, PrimitiveKind, Symbol},
    },
    Error, Result,
};

/// Type lookups the blob parser delegates to its caller
pub(crate) trait AttributeTypes {
    /// The symbol for a built-in type
    fn primitive(&self, kind: PrimitiveKind) -> Symbol;

    /// `System.Type`
    fn system_type(&self) -> Symbol;

    /// Resolves a serialized type name (`Namespace.Name+Nested, Assembly`)
    fn named(&self, serialized: &str) -> Symbol;

    /// The underlying type of an enum, `None` if `ty` is not an enum
    fn enum_underlying(&self, ty: &Symbol) -> Option<PrimitiveKind>;
}

/// Positional and named arguments of one blob
#[derive(Debug, Default)]
pub(crate) struct DecodedArguments {
    pub positional: Vec<TypedConstant>,
    pub named: Vec<NamedArgument>,
}

/// How a value of a given type is encoded
enum Encoding {
    Primitive(PrimitiveKind),
    Enum(PrimitiveKind),
    Type,
    Boxed,
    SzArray(Symbol),
}

const PROLOG: u16 = 0x0001;
const NULL_ARRAY: u32 = 0xFFFF_FFFF;

pub(crate) struct AttributeBlobParser<'a> {
    parser: Parser<'a>,
    types: &'a dyn AttributeTypes,
    depth: usize,
    max_depth: usize,
}

impl<'a> AttributeBlobParser<'a> {
    pub(crate) fn new(data: &'a [u8], types: &'a dyn AttributeTypes, max_depth: usize) -> Self {
        AttributeBlobParser {
            parser: Parser::new(data),
            types,
            depth: 0,
            max_depth,
        }
    }

    /// Decodes a blob for a constructor taking `parameters`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] or [`Error::OutOfBounds`] for invalid blobs, and
    /// [`Error::RecursionLimit`] if values nest deeper than the configured limit.
    pub(crate) fn parse(&mut self, parameters: &[Symbol]) -> Result<DecodedArguments> {
        read_prolog(&mut self.parser)?;

        let positional = parameters
            .iter()
            .map(|parameter| self.parse_value(parameter))
            .collect::<Result<Vec<_>>>()?;

        let count = self.parser.read_le::<u16>()?;
        let mut named = Vec::with_capacity(count as usize);
        for _ in 0..count {
            named.push(self.parse_named_argument()?);
        }

        Ok(DecodedArguments { positional, named })
    }

    fn parse_named_argument(&mut self) -> Result<NamedArgument> {
        let kind = match self.parser.read_le::<u8>()? {
            SERIALIZATION_TYPE::FIELD => NamedArgumentKind::Field,
            SERIALIZATION_TYPE::PROPERTY => NamedArgumentKind::Property,
            other => {
                return Err(malformed_error!(
                    "Invalid field/property indicator: 0x{:02X}",
                    other
                ))
            }
        };

        let tag = self.parser.read_le::<u8>()?;
        let ty = self.parse_field_or_prop_type(tag)?;
        let Some(name) = self.parser.read_ser_string()? else {
            return Err(malformed_error!("Named argument without a name"));
        };
        let value = self.parse_value(&ty)?;

        Ok(NamedArgument { name, kind, value })
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::RecursionLimit(self.max_depth));
        }
        Ok(())
    }

    fn parse_field_or_prop_type(&mut self, tag: u8) -> Result<Symbol> {
        self.enter()?;
        let ty = match tag {
            SERIALIZATION_TYPE::TYPE => self.types.system_type(),
            SERIALIZATION_TYPE::TAGGED_OBJECT => self.types.primitive(PrimitiveKind::Object),
            SERIALIZATION_TYPE::ENUM => match self.parser.read_ser_string()? {
                Some(name) => self.types.named(&name),
                None => return Err(malformed_error!("Enum argument without a type name")),
            },
            SERIALIZATION_TYPE::SZARRAY => {
                let element_tag = self.parser.read_le::<u8>()?;
                let element = self.parse_field_or_prop_type(element_tag)?;
                Symbol::Array(Arc::new(ArrayType::sz(element.plain())))
            }
            SERIALIZATION_TYPE::BOOLEAN..=SERIALIZATION_TYPE::STRING => {
                match PrimitiveKind::from_element_type(tag) {
                    Some(kind) => self.types.primitive(kind),
                    None => {
                        return Err(malformed_error!("Invalid serialization type 0x{:02X}", tag))
                    }
                }
            }
            other => {
                return Err(malformed_error!(
                    "Unsupported serialization type: 0x{:02X}",
                    other
                ))
            }
        };
        self.depth -= 1;
        Ok(ty)
    }

    fn encoding_of(&self, ty: &Symbol) -> Option<Encoding> {
        if let Symbol::Array(array) = ty {
            return array
                .is_sz
                .then(|| Encoding::SzArray(array.element.symbol.clone()));
        }

        if let Some(full_name) = ty.full_name() {
            if full_name == "System.Type" {
                return Some(Encoding::Type);
            }
            if let Some(kind) = PrimitiveKind::from_full_name(&full_name) {
                return match kind {
                    PrimitiveKind::Object => Some(Encoding::Boxed),
                    PrimitiveKind::Void
                    | PrimitiveKind::I
                    | PrimitiveKind::U
                    | PrimitiveKind::TypedReference => None,
                    kind => Some(Encoding::Primitive(kind)),
                };
            }
        }

        self.types.enum_underlying(ty).map(Encoding::Enum)
    }

    fn parse_value(&mut self, ty: &Symbol) -> Result<TypedConstant> {
        self.enter()?;

        let Some(encoding) = self.encoding_of(ty) else {
            return Err(malformed_error!(
                "Type '{}' cannot be used as an attribute argument",
                ty
            ));
        };

        let value = match encoding {
            Encoding::Primitive(kind) => TypedConstant::Primitive {
                ty: ty.clone(),
                value: self.read_constant(kind)?,
            },
            Encoding::Enum(kind) => TypedConstant::Enum {
                ty: ty.clone(),
                value: self.read_constant(kind)?,
            },
            Encoding::Type => TypedConstant::Type {
                ty: ty.clone(),
                value: self
                    .parser
                    .read_ser_string()?
                    .map(|name| self.types.named(&name)),
            },
            Encoding::Boxed => {
                let tag = self.parser.read_le::<u8>()?;
                let actual = self.parse_field_or_prop_type(tag)?;
                if matches!(self.encoding_of(&actual), Some(Encoding::Boxed)) {
                    return Err(malformed_error!("Boxed value of type object"));
                }
                self.parse_value(&actual)?
            }
            Encoding::SzArray(element) => {
                let count = self.parser.read_le::<u32>()?;
                if count == NULL_ARRAY {
                    TypedConstant::Array {
                        ty: ty.clone(),
                        values: None,
                    }
                } else {
                    if count as usize > self.parser.remaining() {
                        return Err(malformed_error!(
                            "Array of {} elements exceeds the remaining {} bytes",
                            count,
                            self.parser.remaining()
                        ));
                    }
                    let values = (0..count)
                        .map(|_| self.parse_value(&element))
                        .collect::<Result<Vec<_>>>()?;
                    TypedConstant::Array {
                        ty: ty.clone(),
                        values: Some(values),
                    }
                }
            }
        };

        self.depth -= 1;
        Ok(value)
    }

    fn read_constant(&mut self, kind: PrimitiveKind) -> Result<ConstantValue> {
        Ok(match kind {
            PrimitiveKind::Boolean => ConstantValue::Boolean(self.parser.read_le::<u8>()? != 0),
            PrimitiveKind::Char => ConstantValue::Char(self.parser.read_le::<u16>()?),
            PrimitiveKind::I1 => ConstantValue::I1(self.parser.read_le::<i8>()?),
            PrimitiveKind::U1 => ConstantValue::U1(self.parser.read_le::<u8>()?),
            PrimitiveKind::I2 => ConstantValue::I2(self.parser.read_le::<i16>()?),
            PrimitiveKind::U2 => ConstantValue::U2(self.parser.read_le::<u16>()?),
            PrimitiveKind::I4 => ConstantValue::I4(self.parser.read_le::<i32>()?),
            PrimitiveKind::U4 => ConstantValue::U4(self.parser.read_le::<u32>()?),
            PrimitiveKind::I8 => ConstantValue::I8(self.parser.read_le::<i64>()?),
            PrimitiveKind::U8 => ConstantValue::U8(self.parser.read_le::<u64>()?),
            PrimitiveKind::R4 => ConstantValue::R4(self.parser.read_le::<f32>()?),
            PrimitiveKind::R8 => ConstantValue::R8(self.parser.read_le::<f64>()?),
            PrimitiveKind::String => ConstantValue::String(self.parser.read_ser_string()?),
            other => {
                return Err(malformed_error!(
                    "{} values cannot be stored in an attribute blob",
                    other
                ))
            }
        })
    }
}

fn read_prolog(parser: &mut Parser<'_>) -> Result<()> {
    let prolog = parser.read_le::<u16>()?;
    if prolog != PROLOG {
        return Err(malformed_error!(
            "Invalid custom attribute prolog - expected 0x0001, found 0x{:04X}",
            prolog
        ));
    }
    Ok(())
}

/// Decodes a blob whose constructor takes `count` strings, ignoring named arguments.
///
/// Works without any type information, which is what identifying embedded interop types and
/// GUIDs needs before symbols exist.
///
/// # Errors
/// Returns [`Error::Malformed`] or [`Error::OutOfBounds`] for invalid blobs.
pub fn decode_string_arguments(blob: &[u8], count: usize) -> Result<Vec<Option<String>>> {
    let mut parser = Parser::new(blob);
    read_prolog(&mut parser)?;
    (0..count).map(|_| parser.read_ser_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::ErrorKind;

    /// Resolves names without a context: `Acme.Color` is an `int` enum, everything else missing
    struct FixedTypes;

    impl AttributeTypes for FixedTypes {
        fn primitive(&self, kind: PrimitiveKind) -> Symbol {
            Symbol::Primitive(kind)
        }

        fn system_type(&self) -> Symbol {
            self.named("System.Type")
        }

        fn named(&self, serialized: &str) -> Symbol {
            Symbol::error(ErrorKind::Missing {
                name: serialized.to_string(),
                unit: "test".to_string(),
            })
        }

        fn enum_underlying(&self, ty: &Symbol) -> Option<PrimitiveKind> {
            match ty.as_error() {
                Some(ErrorKind::Missing { name, .. }) if name == "Acme.Color" => {
                    Some(PrimitiveKind::I4)
                }
                _ => None,
            }
        }
    }

    fn parse(blob: &[u8], parameters: &[Symbol]) -> Result<DecodedArguments> {
        AttributeBlobParser::new(blob, &FixedTypes, 16).parse(parameters)
    }

    fn int_array() -> Symbol {
        Symbol::Array(Arc::new(ArrayType::sz(
            Symbol::Primitive(PrimitiveKind::I4).plain(),
        )))
    }

    #[test]
    fn primitive_and_string_arguments() {
        let blob = [
            0x01, 0x00, // prolog
            0x2A, 0x00, 0x00, 0x00, // 42
            0x02, b'h', b'i', // "hi"
            0xFF, // null string
            0x00, 0x00, // no named arguments
        ];
        let string = Symbol::Primitive(PrimitiveKind::String);
        let decoded = parse(
            &blob,
            &[Symbol::Primitive(PrimitiveKind::I4), string.clone(), string],
        )
        .unwrap();

        assert_eq!(decoded.positional.len(), 3);
        assert!(matches!(
            decoded.positional[0],
            TypedConstant::Primitive {
                value: ConstantValue::I4(42),
                ..
            }
        ));
        assert!(matches!(
            &decoded.positional[1],
            TypedConstant::Primitive { value: ConstantValue::String(Some(s)), .. } if s == "hi"
        ));
        assert!(decoded.positional[2].is_null());
        assert!(decoded.named.is_empty());
    }

    #[test]
    fn null_and_empty_arrays_differ() {
        let null = [0x01, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00];
        let empty = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

        let decoded = parse(&null, &[int_array()]).unwrap();
        assert!(matches!(
            decoded.positional[0],
            TypedConstant::Array { values: None, .. }
        ));

        let decoded = parse(&empty, &[int_array()]).unwrap();
        assert!(matches!(
            &decoded.positional[0],
            TypedConstant::Array { values: Some(v), .. } if v.is_empty()
        ));
    }

    #[test]
    fn boxed_values_carry_their_own_type() {
        let blob = [
            0x01, 0x00, // prolog
            0x55, 0x0A, b'A', b'c', b'm', b'e', b'.', b'C', b'o', b'l', b'o', b'r', // enum tag
            0x02, 0x00, 0x00, 0x00, // 2
            0x00, 0x00,
        ];
        let decoded = parse(&blob, &[Symbol::Primitive(PrimitiveKind::Object)]).unwrap();

        match &decoded.positional[0] {
            TypedConstant::Enum { ty, value } => {
                assert_eq!(*value, ConstantValue::I4(2));
                assert!(matches!(
                    ty.as_error(),
                    Some(ErrorKind::Missing { name, .. }) if name == "Acme.Color"
                ));
            }
            other => panic!("unexpected constant {:?}", other),
        }
    }

    #[test]
    fn named_arguments() {
        let blob = [
            0x01, 0x00, // prolog
            0x02, 0x00, // two named arguments
            0x54, 0x08, 0x05, b'C', b'o', b'u', b'n', b't', 0x07, 0x00, 0x00, 0x00, // Count = 7
            0x53, 0x1D, 0x0E, 0x04, b'T', b'a', b'g', b's', // string[] Tags
            0x02, 0x00, 0x00, 0x00, 0x01, b'a', 0xFF, // { "a", null }
        ];
        let decoded = parse(&blob, &[]).unwrap();

        assert_eq!(decoded.named.len(), 2);
        assert_eq!(decoded.named[0].name, "Count");
        assert_eq!(decoded.named[0].kind, NamedArgumentKind::Property);
        assert_eq!(decoded.named[1].kind, NamedArgumentKind::Field);
        match &decoded.named[1].value {
            TypedConstant::Array {
                values: Some(values),
                ..
            } => {
                assert_eq!(values.len(), 2);
                assert!(values[1].is_null());
            }
            other => panic!("unexpected constant {:?}", other),
        }
    }

    #[test]
    fn malformed_blobs() {
        assert!(parse(&[0x02, 0x00, 0x00, 0x00], &[]).is_err());
        assert!(parse(&[0x01, 0x00, 0x2A], &[Symbol::Primitive(PrimitiveKind::I4)]).is_err());
        assert!(parse(&[0x01, 0x00, 0x01, 0x00, 0x99], &[]).is_err());
        assert!(parse(
            &[0x01, 0x00, 0x00, 0x00],
            &[Symbol::Primitive(PrimitiveKind::I)]
        )
        .is_err());
        // one million elements announced, two bytes present
        assert!(parse(&[0x01, 0x00, 0x40, 0x42, 0x0F, 0x00, 0x00, 0x00], &[int_array()]).is_err());
    }

    #[test]
    fn depth_is_limited() {
        // object holding an object[] holding an object ... seventeen levels deep
        let mut blob = vec![0x01, 0x00];
        for _ in 0..17 {
            blob.extend_from_slice(&[0x1D, 0x51, 0x01, 0x00, 0x00, 0x00]);
        }
        let result = AttributeBlobParser::new(&blob, &FixedTypes, 16)
            .parse(&[Symbol::Primitive(PrimitiveKind::Object)]);
        assert!(matches!(result, Err(Error::RecursionLimit(16))));
    }

    #[test]
    fn string_arguments_without_types() {
        let blob = [0x01, 0x00, 0x03, b'a', b'b', b'c', 0xFF, 0x00, 0x00];
        assert_eq!(
            decode_string_arguments(&blob, 2).unwrap(),
            vec![Some("abc".to_string()), None]
        );
        assert!(decode_string_arguments(&blob[..4], 1).is_err());
    }
}
