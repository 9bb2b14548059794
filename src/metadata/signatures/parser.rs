use crate::{
    file::parser::Parser,
    metadata::signatures::{
        CustomModifier, SignatureArray, SignatureElement, SignatureField, SignatureMethod,
        SignatureParameter, SignatureProperty, TypeSignature, CALLING_CONVENTION, ELEMENT_TYPE,
    },
    Error::RecursionLimit,
    Result,
};

/// Default maximum nesting depth for signature parsing
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Signature parser for the blob formats of ECMA-335 II.23.2
///
/// # Example
///
/// ```rust
/// use symgraph::metadata::signatures::SignatureParser;
///
/// // instance string M(string)
/// let data = &[0x20, 0x01, 0x0E, 0x0E];
/// let mut parser = SignatureParser::new(data);
/// let sig = parser.parse_method_signature()?;
/// assert!(sig.has_this);
/// assert_eq!(sig.params.len(), 1);
/// # Ok::<(), symgraph::Error>(())
/// ```
///
/// ## Notes:
/// - Custom modifiers are accepted in front of every type position, including array elements
///   and generic arguments, and are reported with their optional/required flag intact.
/// - A parser instance is meant for a single signature.
pub struct SignatureParser<'a> {
    parser: Parser<'a>,
    depth: usize,
    max_depth: usize,
}

impl<'a> SignatureParser<'a> {
    /// Create a new `SignatureParser` from a byte slice
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replaces the nesting limit
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn parse_type(&mut self) -> Result<TypeSignature> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(RecursionLimit(self.max_depth));
        }

        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeSignature> {
        let current_byte = self.parser.read_le::<u8>()?;
        match current_byte {
            ELEMENT_TYPE::VOID => Ok(TypeSignature::Void),
            ELEMENT_TYPE::BOOLEAN => Ok(TypeSignature::Boolean),
            ELEMENT_TYPE::CHAR => Ok(TypeSignature::Char),
            ELEMENT_TYPE::I1 => Ok(TypeSignature::I1),
            ELEMENT_TYPE::U1 => Ok(TypeSignature::U1),
            ELEMENT_TYPE::I2 => Ok(TypeSignature::I2),
            ELEMENT_TYPE::U2 => Ok(TypeSignature::U2),
            ELEMENT_TYPE::I4 => Ok(TypeSignature::I4),
            ELEMENT_TYPE::U4 => Ok(TypeSignature::U4),
            ELEMENT_TYPE::I8 => Ok(TypeSignature::I8),
            ELEMENT_TYPE::U8 => Ok(TypeSignature::U8),
            ELEMENT_TYPE::R4 => Ok(TypeSignature::R4),
            ELEMENT_TYPE::R8 => Ok(TypeSignature::R8),
            ELEMENT_TYPE::STRING => Ok(TypeSignature::String),
            ELEMENT_TYPE::OBJECT => Ok(TypeSignature::Object),
            ELEMENT_TYPE::I => Ok(TypeSignature::I),
            ELEMENT_TYPE::U => Ok(TypeSignature::U),
            ELEMENT_TYPE::TYPEDBYREF => Ok(TypeSignature::TypedByRef),
            ELEMENT_TYPE::PTR => Ok(TypeSignature::Ptr(self.parse_element()?)),
            ELEMENT_TYPE::SZARRAY => Ok(TypeSignature::SzArray(self.parse_element()?)),
            ELEMENT_TYPE::BYREF => Ok(TypeSignature::ByRef(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::VALUETYPE => Ok(TypeSignature::ValueType(
                self.parser.read_compressed_token()?,
            )),
            ELEMENT_TYPE::CLASS => Ok(TypeSignature::Class(self.parser.read_compressed_token()?)),
            ELEMENT_TYPE::VAR => Ok(TypeSignature::GenericParamType(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::MVAR => Ok(TypeSignature::GenericParamMethod(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::ARRAY => {
                let element = self.parse_element()?;
                let rank = self.parser.read_compressed_uint()?;
                if rank == 0 {
                    return Err(malformed_error!("ARRAY - rank must be at least 1"));
                }

                let num_sizes = self.parser.read_compressed_uint()?;
                if num_sizes > rank {
                    return Err(malformed_error!(
                        "ARRAY - {} sizes for rank {}",
                        num_sizes,
                        rank
                    ));
                }
                let mut sizes = Vec::with_capacity(num_sizes as usize);
                for _ in 0..num_sizes {
                    sizes.push(self.parser.read_compressed_uint()?);
                }

                let num_lo_bounds = self.parser.read_compressed_uint()?;
                if num_lo_bounds > rank {
                    return Err(malformed_error!(
                        "ARRAY - {} lower bounds for rank {}",
                        num_lo_bounds,
                        rank
                    ));
                }
                let mut lower_bounds = Vec::with_capacity(num_lo_bounds as usize);
                for _ in 0..num_lo_bounds {
                    lower_bounds.push(self.parser.read_compressed_int()?);
                }

                Ok(TypeSignature::Array(SignatureArray {
                    element,
                    rank,
                    sizes,
                    lower_bounds,
                }))
            }
            ELEMENT_TYPE::GENERICINST => {
                let peek_byte = self.parser.peek_byte()?;
                if peek_byte != ELEMENT_TYPE::CLASS && peek_byte != ELEMENT_TYPE::VALUETYPE {
                    return Err(malformed_error!(
                        "GENERICINST - Next byte is not TYPE_CLASS or TYPE_VALUE - {}",
                        peek_byte
                    ));
                }

                let base_type = self.parse_type()?;
                let arg_count = self.parser.read_compressed_uint()?;
                if arg_count == 0 {
                    return Err(malformed_error!("GENERICINST - zero type arguments"));
                }

                let mut type_args = Vec::with_capacity(arg_count.min(64) as usize);
                for _ in 0..arg_count {
                    type_args.push(self.parse_element()?);
                }

                Ok(TypeSignature::GenericInst(Box::new(base_type), type_args))
            }
            ELEMENT_TYPE::FNPTR => Ok(TypeSignature::FnPtr(Box::new(
                self.parse_method_signature()?,
            ))),
            _ => Err(malformed_error!(
                "Unsupported ELEMENT_TYPE - {}",
                current_byte
            )),
        }
    }

    /// Parse custom modifiers (`CMOD_OPT` or `CMOD_REQD`) preserving order and duplicates
    fn parse_custom_mods(&mut self) -> Result<Vec<CustomModifier>> {
        let mut mods = Vec::new();

        while self.parser.has_more_data() {
            let is_required = match self.parser.peek_byte()? {
                ELEMENT_TYPE::CMOD_REQD => true,
                ELEMENT_TYPE::CMOD_OPT => false,
                _ => break,
            };

            self.parser.advance()?;
            mods.push(CustomModifier {
                is_required,
                modifier_type: self.parser.read_compressed_token()?,
            });
        }

        Ok(mods)
    }

    fn parse_element(&mut self) -> Result<SignatureElement> {
        let modifiers = self.parse_custom_mods()?;
        Ok(SignatureElement {
            modifiers,
            base: Box::new(self.parse_type()?),
        })
    }

    /// Parse a parameter or return slot.
    ///
    /// Modifiers in front of `BYREF` become ref modifiers; a second modifier run after it
    /// belongs to the type.
    fn parse_param(&mut self) -> Result<SignatureParameter> {
        let leading = self.parse_custom_mods()?;

        if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
            self.parser.advance()?;
            let modifiers = self.parse_custom_mods()?;
            return Ok(SignatureParameter {
                ref_modifiers: leading,
                by_ref: true,
                modifiers,
                base: self.parse_type()?,
            });
        }

        Ok(SignatureParameter {
            ref_modifiers: Vec::new(),
            by_ref: false,
            modifiers: leading,
            base: self.parse_type()?,
        })
    }

    /// Parse a method signature from the blob - `MethodDefSig`, `MethodRefSig`
    ///
    /// # Errors
    /// Returns an error if the signature data is malformed or if reading beyond the buffer bounds.
    pub fn parse_method_signature(&mut self) -> Result<SignatureMethod> {
        let convention_byte = self.parser.read_le::<u8>()?;
        let kind = convention_byte & CALLING_CONVENTION::KIND_MASK;
        if kind == CALLING_CONVENTION::FIELD || kind == CALLING_CONVENTION::PROPERTY {
            return Err(malformed_error!(
                "SignatureMethod - invalid calling convention - {}",
                convention_byte
            ));
        }

        let generic_param_count = if convention_byte & CALLING_CONVENTION::GENERIC != 0 {
            self.parser.read_compressed_uint()?
        } else {
            0
        };
        let param_count = self.parser.read_compressed_uint()?;
        let return_type = self.parse_param()?;

        let mut params = Vec::with_capacity(param_count.min(64) as usize);
        let mut varargs = Vec::new();
        let mut after_sentinel = false;
        for _ in 0..param_count {
            if !after_sentinel && self.parser.peek_byte()? == ELEMENT_TYPE::SENTINEL {
                self.parser.advance()?;
                after_sentinel = true;
            }

            let param = self.parse_param()?;
            if after_sentinel {
                varargs.push(param);
            } else {
                params.push(param);
            }
        }

        Ok(SignatureMethod {
            has_this: convention_byte & CALLING_CONVENTION::HAS_THIS != 0,
            explicit_this: convention_byte & CALLING_CONVENTION::EXPLICIT_THIS != 0,
            vararg: kind == CALLING_CONVENTION::VARARG,
            generic_param_count,
            return_type,
            params,
            varargs,
        })
    }

    /// Parse a field signature from the blob (II.23.2.4)
    ///
    /// # Errors
    /// Returns an error if the signature header is invalid or if the field type cannot be parsed.
    pub fn parse_field_signature(&mut self) -> Result<SignatureField> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != CALLING_CONVENTION::FIELD {
            return Err(malformed_error!(
                "SignatureField - invalid start - {}",
                head_byte
            ));
        }

        Ok(SignatureField {
            field_type: self.parse_param()?,
        })
    }

    /// Parse a property signature from the blob (II.23.2.5)
    ///
    /// # Errors
    /// Returns an error if the signature header is invalid or a type cannot be parsed.
    pub fn parse_property_signature(&mut self) -> Result<SignatureProperty> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte & CALLING_CONVENTION::KIND_MASK != CALLING_CONVENTION::PROPERTY {
            return Err(malformed_error!(
                "SignatureProperty - invalid start - {}",
                head_byte
            ));
        }

        let param_count = self.parser.read_compressed_uint()?;
        let property_type = self.parse_param()?;

        let mut params = Vec::with_capacity(param_count.min(64) as usize);
        for _ in 0..param_count {
            params.push(self.parse_param()?);
        }

        Ok(SignatureProperty {
            has_this: head_byte & CALLING_CONVENTION::HAS_THIS != 0,
            property_type,
            params,
        })
    }

    /// Parse a type specification blob (II.23.2.14)
    ///
    /// # Errors
    /// Returns an error if the blob does not hold exactly one type.
    pub fn parse_type_spec_signature(&mut self) -> Result<SignatureElement> {
        let element = self.parse_element()?;
        if self.parser.has_more_data() {
            return Err(malformed_error!(
                "TypeSpec - {} trailing bytes",
                self.parser.remaining()
            ));
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::Token;
    use crate::Error;

    #[test]
    fn test_parse_primitive_types() {
        let cases = [
            (0x02, TypeSignature::Boolean),
            (0x03, TypeSignature::Char),
            (0x08, TypeSignature::I4),
            (0x0B, TypeSignature::U8),
            (0x0E, TypeSignature::String),
            (0x18, TypeSignature::I),
            (0x1C, TypeSignature::Object),
        ];

        for (byte, expected) in cases {
            let data = [0x06, byte];
            let field = SignatureParser::new(&data).parse_field_signature().unwrap();
            assert_eq!(field.field_type.base, expected);
        }
    }

    #[test]
    fn test_parse_modifiers_keep_kind_and_order() {
        // FIELD, modopt(TypeRef 1), modreq(TypeRef 2), modopt(TypeRef 1), I4
        let data = [0x06, 0x20, 0x05, 0x1F, 0x09, 0x20, 0x05, 0x08];
        let field = SignatureParser::new(&data).parse_field_signature().unwrap();

        assert_eq!(
            field.field_type.modifiers,
            vec![
                CustomModifier::optional(Token(0x01000001)),
                CustomModifier::required(Token(0x01000002)),
                CustomModifier::optional(Token(0x01000001)),
            ]
        );
        assert!(field.field_type.ref_modifiers.is_empty());
        assert_eq!(field.field_type.base, TypeSignature::I4);
    }

    #[test]
    fn test_parse_byref_splits_modifiers() {
        // DEFAULT, 1 param, VOID, modreq(TypeRef 3) BYREF modopt(TypeRef 1) I4
        let data = [0x00, 0x01, 0x01, 0x1F, 0x0D, 0x10, 0x20, 0x05, 0x08];
        let method = SignatureParser::new(&data)
            .parse_method_signature()
            .unwrap();

        let param = &method.params[0];
        assert!(param.by_ref);
        assert_eq!(
            param.ref_modifiers,
            vec![CustomModifier::required(Token(0x01000003))]
        );
        assert_eq!(
            param.modifiers,
            vec![CustomModifier::optional(Token(0x01000001))]
        );
        assert_eq!(param.base, TypeSignature::I4);
    }

    #[test]
    fn test_parse_generic_method() {
        // HASTHIS|GENERIC, 1 generic, 2 params, !!0, !0, class TypeDef 2
        let data = [0x30, 0x01, 0x02, 0x1E, 0x00, 0x13, 0x00, 0x12, 0x08];
        let method = SignatureParser::new(&data)
            .parse_method_signature()
            .unwrap();

        assert!(method.has_this);
        assert_eq!(method.generic_param_count, 1);
        assert_eq!(method.return_type.base, TypeSignature::GenericParamMethod(0));
        assert_eq!(method.params[0].base, TypeSignature::GenericParamType(0));
        assert_eq!(method.params[1].base, TypeSignature::Class(Token(0x02000002)));
    }

    #[test]
    fn test_parse_arrays() {
        // FIELD, SZARRAY modopt(TypeRef 1) I4
        let data = [0x06, 0x1D, 0x20, 0x05, 0x08];
        let field = SignatureParser::new(&data).parse_field_signature().unwrap();
        match &field.field_type.base {
            TypeSignature::SzArray(element) => {
                assert_eq!(element.modifiers.len(), 1);
                assert_eq!(*element.base, TypeSignature::I4);
            }
            other => panic!("expected SzArray, got {:?}", other),
        }

        // FIELD, ARRAY I4 rank 2, 1 size (3), 2 lower bounds (0, -1)
        let data = [0x06, 0x14, 0x08, 0x02, 0x01, 0x03, 0x02, 0x00, 0x7F];
        let field = SignatureParser::new(&data).parse_field_signature().unwrap();
        match &field.field_type.base {
            TypeSignature::Array(array) => {
                assert_eq!(array.rank, 2);
                assert_eq!(array.sizes, vec![3]);
                assert_eq!(array.lower_bounds, vec![0, -1]);
            }
            other => panic!("expected Array, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_generic_instance() {
        // FIELD, GENERICINST CLASS TypeRef 1, 2 args: I4, modopt(TypeRef 2) STRING
        let data = [0x06, 0x15, 0x12, 0x05, 0x02, 0x08, 0x20, 0x09, 0x0E];
        let field = SignatureParser::new(&data).parse_field_signature().unwrap();
        match &field.field_type.base {
            TypeSignature::GenericInst(def, args) => {
                assert_eq!(**def, TypeSignature::Class(Token(0x01000001)));
                assert_eq!(args.len(), 2);
                assert!(args[0].modifiers.is_empty());
                assert_eq!(
                    args[1].modifiers,
                    vec![CustomModifier::optional(Token(0x01000002))]
                );
                assert_eq!(*args[1].base, TypeSignature::String);
            }
            other => panic!("expected GenericInst, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_property_signature() {
        // PROPERTY|HASTHIS, 1 param, I4, STRING
        let data = [0x28, 0x01, 0x08, 0x0E];
        let property = SignatureParser::new(&data)
            .parse_property_signature()
            .unwrap();
        assert!(property.has_this);
        assert_eq!(property.property_type.base, TypeSignature::I4);
        assert_eq!(property.params.len(), 1);
        assert_eq!(property.params[0].base, TypeSignature::String);
    }

    #[test]
    fn test_parse_vararg_method() {
        // VARARG, 2 params, VOID, I4, SENTINEL, STRING
        let data = [0x05, 0x02, 0x01, 0x08, 0x41, 0x0E];
        let method = SignatureParser::new(&data)
            .parse_method_signature()
            .unwrap();
        assert!(method.vararg);
        assert_eq!(method.params.len(), 1);
        assert_eq!(method.varargs.len(), 1);
        assert_eq!(method.varargs[0].base, TypeSignature::String);
    }

    #[test]
    fn test_depth_limit() {
        // FIELD followed by 10 nested SZARRAY markers and I4
        let mut data = vec![0x06];
        data.extend(std::iter::repeat(0x1D).take(10));
        data.push(0x08);

        let result = SignatureParser::new(&data)
            .with_max_depth(5)
            .parse_field_signature();
        assert!(matches!(result, Err(Error::RecursionLimit(5))));

        let result = SignatureParser::new(&data)
            .with_max_depth(11)
            .parse_field_signature();
        assert!(result.is_ok());
    }

    #[test]
    fn test_error_handling() {
        // Wrong header for a field signature
        assert!(SignatureParser::new(&[0x07, 0x08])
            .parse_field_signature()
            .is_err());
        // Truncated method signature
        assert!(SignatureParser::new(&[0x00, 0x02, 0x01, 0x08])
            .parse_method_signature()
            .is_err());
        // GENERICINST not followed by CLASS / VALUETYPE
        assert!(SignatureParser::new(&[0x06, 0x15, 0x08])
            .parse_field_signature()
            .is_err());
        // TypeSpec with trailing data
        assert!(SignatureParser::new(&[0x08, 0x08])
            .parse_type_spec_signature()
            .is_err());
    }
}
